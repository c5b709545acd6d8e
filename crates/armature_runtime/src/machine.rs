//! The state machine: a mutable active-state pointer over an immutable graph.
//!
//! One machine tracks one component instance. Lifecycle events
//! (initialization, termination) fire the active state's triggers in
//! document order against the managed object; explicit transition requests
//! are validated against the active state (including transitions inherited
//! from enclosing states) and move the pointer on success.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use tracing::{debug, trace};
use url::Url;

use armature_state::graph::{StateGraph, StatePath};
use armature_state::state::{Action, Operation, State, Transition, TriggerEvent};

/// Errors raised by a component while its methods are invoked.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    /// The component does not expose the requested method.
    #[error("method '{method}' is not exposed by the component")]
    UnknownMethod {
        /// The missing method name.
        method: String,
    },

    /// The method ran and failed.
    #[error("method '{method}' failed: {message}")]
    Failed {
        /// The invoked method.
        method: String,
        /// Human-readable cause.
        message: String,
    },
}

/// A managed component instance.
///
/// This is the closed-dispatch seam replacing reflective invocation:
/// implementations match on their known method names and perform the
/// corresponding work.
pub trait Managed: Send {
    /// Invokes a lifecycle method by name.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::UnknownMethod`] for an unrecognized name,
    /// or [`InvocationError::Failed`] when the method itself fails.
    fn invoke(&mut self, method: &str) -> Result<(), InvocationError>;
}

/// Failure reported by a foreign transition handler.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct DelegationFault {
    /// Human-readable cause reported by the handler.
    pub message: String,
}

impl DelegationFault {
    /// Creates a fault from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A foreign handler a transition may delegate to, identified by URI.
pub trait TransitionHandler: Send + Sync {
    /// Applies the transition on behalf of the machine.
    ///
    /// # Errors
    ///
    /// Returns a [`DelegationFault`] describing the causal failure; the
    /// machine wraps it with the handler's identifying URI.
    fn handle(
        &self,
        target: &mut dyn Managed,
        transition: &Transition,
    ) -> Result<(), DelegationFault>;
}

/// Errors raised while driving a state machine.
#[derive(Debug, thiserror::Error)]
pub enum MachineError {
    /// The requested transition is not available from the active state.
    #[error("transition '{transition}' is not available from state '{state}'")]
    UnknownTransition {
        /// The active state when the request was made.
        state: String,
        /// The requested transition name.
        transition: String,
    },

    /// An operation invocation failed.
    #[error("operation '{operation}' failed in state '{state}': {source}")]
    Invocation {
        /// The state owning the operation.
        state: String,
        /// The operation name.
        operation: String,
        /// The component's report.
        #[source]
        source: InvocationError,
    },

    /// A trigger's action failed; remaining triggers for the event were skipped.
    #[error("{event} trigger {index} in state '{state}' failed: {source}")]
    TriggerFailed {
        /// The state whose trigger failed.
        state: String,
        /// The lifecycle event being handled.
        event: TriggerEvent,
        /// Position of the trigger among the event's triggers, in document order.
        index: usize,
        /// The underlying failure.
        #[source]
        source: Box<MachineError>,
    },

    /// A delegated handler raised a causal failure.
    #[error("delegation to handler '{handler}' failed: {source}")]
    Delegation {
        /// The handler's identifying URI.
        handler: Url,
        /// The handler's report.
        #[source]
        source: DelegationFault,
    },

    /// A transition names a handler URI with no registered handler.
    #[error("no handler registered for '{handler}'")]
    UnknownHandler {
        /// The unregistered handler URI.
        handler: Url,
    },

    /// Trigger-driven transitions revisited a state during one event.
    #[error("{event} triggers cycled back into state '{state}'")]
    TriggerCycle {
        /// The revisited state.
        state: String,
        /// The lifecycle event being handled.
        event: TriggerEvent,
    },

    /// A transition target did not resolve at runtime.
    ///
    /// Targets are validated at graph build time, so this indicates a
    /// machine driven against a graph it was not built from.
    #[error("transition '{transition}' targets unresolved state '{target}'")]
    UnresolvedTarget {
        /// The applied transition.
        transition: String,
        /// The unresolved target name.
        target: String,
    },
}

/// Walks a [`StateGraph`] for one component instance.
pub struct StateMachine {
    graph: Arc<StateGraph>,
    active: StatePath,
    handlers: HashMap<Url, Arc<dyn TransitionHandler>>,
}

impl StateMachine {
    /// Creates a machine positioned at the graph root.
    #[must_use]
    pub fn new(graph: Arc<StateGraph>) -> Self {
        Self {
            graph,
            active: StatePath::root(),
            handlers: HashMap::new(),
        }
    }

    /// Registers a foreign handler under its identifying URI.
    #[must_use]
    pub fn with_handler(mut self, uri: Url, handler: Arc<dyn TransitionHandler>) -> Self {
        self.handlers.insert(uri, handler);
        self
    }

    /// Returns the graph this machine walks.
    #[must_use]
    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    /// Returns the path of the active state.
    #[must_use]
    pub fn path(&self) -> &StatePath {
        &self.active
    }

    /// Returns the active state.
    ///
    /// # Panics
    ///
    /// Panics if the active path no longer addresses a state; the machine
    /// only ever moves along validated resolutions, so this indicates
    /// memory corruption or a swapped graph.
    #[must_use]
    pub fn state(&self) -> &State {
        self.graph
            .state_at(&self.active)
            .expect("active state path addresses a state of the owning graph")
    }

    /// Fires the initialization triggers of the active state, in document
    /// order, against the managed object.
    ///
    /// A trigger that applies a transition moves the machine and the new
    /// state's initialization triggers are evaluated in turn.
    ///
    /// # Errors
    ///
    /// The first failing trigger aborts the remaining ones; the error wraps
    /// the owning state, event, and trigger position.
    pub fn initialize(&mut self, target: &mut dyn Managed) -> Result<(), MachineError> {
        self.fire(TriggerEvent::Initialization, target)
    }

    /// Fires the termination triggers of the active state, with the same
    /// protocol as [`initialize`](Self::initialize).
    ///
    /// # Errors
    ///
    /// See [`initialize`](Self::initialize).
    pub fn terminate(&mut self, target: &mut dyn Managed) -> Result<(), MachineError> {
        self.fire(TriggerEvent::Termination, target)
    }

    /// Applies a named transition from the active state.
    ///
    /// The transition must be declared on the active state or inherited
    /// from an enclosing state; unknown names fail and never silently
    /// no-op. On success the active-state pointer moves to the resolved
    /// target and the newly applicable transitions can be observed via
    /// [`active_transitions`](Self::active_transitions).
    ///
    /// # Errors
    ///
    /// [`MachineError::UnknownTransition`] when the name is not available,
    /// or the failure raised by the transition's operation or delegated
    /// handler.
    pub fn apply(&mut self, name: &str, target: &mut dyn Managed) -> Result<&State, MachineError> {
        let Some((transition, owner)) = self.graph.lookup_transition(&self.active, name) else {
            return Err(MachineError::UnknownTransition {
                state: self.state().name.clone(),
                transition: name.to_string(),
            });
        };
        let transition = transition.clone();
        self.execute_transition(&transition, &owner, target)?;
        Ok(self.state())
    }

    /// Returns the transitions applicable from the active state, including
    /// inherited ones, nearest declaration first.
    #[must_use]
    pub fn active_transitions(&self) -> Vec<&Transition> {
        self.graph.active_transitions(&self.active)
    }

    /// Returns the operations exposed by the applicable transitions.
    #[must_use]
    pub fn active_operations(&self) -> Vec<&Operation> {
        self.graph.active_operations(&self.active)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn fire(&mut self, event: TriggerEvent, target: &mut dyn Managed) -> Result<(), MachineError> {
        let mut visited: HashSet<StatePath> = HashSet::new();
        loop {
            if !visited.insert(self.active.clone()) {
                return Err(MachineError::TriggerCycle {
                    state: self.state().name.clone(),
                    event,
                });
            }
            // The active state is cloned so trigger actions may move the
            // pointer while we iterate its triggers.
            let state = self.state().clone();
            let before = self.active.clone();
            let mut moved = false;
            for (index, trigger) in state.triggers_for(event).enumerate() {
                trace!(state = %state.name, %event, index, "firing trigger");
                if let Err(source) = self.run_action(&state, &trigger.action, target) {
                    return Err(MachineError::TriggerFailed {
                        state: state.name.clone(),
                        event,
                        index,
                        source: Box::new(source),
                    });
                }
                if self.active != before {
                    moved = true;
                    break;
                }
            }
            if !moved {
                return Ok(());
            }
        }
    }

    fn run_action(
        &mut self,
        owner: &State,
        action: &Action,
        target: &mut dyn Managed,
    ) -> Result<(), MachineError> {
        match action {
            Action::Operation(op) => self.invoke_operation(&owner.name, op, target),
            Action::Transition(inline) => {
                let owner_path = self.active.clone();
                self.execute_transition(inline, &owner_path, target)
            }
            Action::Apply { transition } => {
                let Some(declared) = owner.transition(transition) else {
                    return Err(MachineError::UnknownTransition {
                        state: owner.name.clone(),
                        transition: transition.clone(),
                    });
                };
                let declared = declared.clone();
                let owner_path = self.active.clone();
                self.execute_transition(&declared, &owner_path, target)
            }
            Action::Exec { operation } => {
                let Some(op) = owner.operation(operation) else {
                    return Err(MachineError::Invocation {
                        state: owner.name.clone(),
                        operation: operation.clone(),
                        source: InvocationError::UnknownMethod {
                            method: operation.clone(),
                        },
                    });
                };
                let op = op.clone();
                self.invoke_operation(&owner.name, &op, target)
            }
        }
    }

    fn execute_transition(
        &mut self,
        transition: &Transition,
        owner: &StatePath,
        target: &mut dyn Managed,
    ) -> Result<(), MachineError> {
        if let Some(uri) = &transition.handler {
            let handler =
                self.handlers
                    .get(uri)
                    .cloned()
                    .ok_or_else(|| MachineError::UnknownHandler {
                        handler: uri.clone(),
                    })?;
            handler
                .handle(target, transition)
                .map_err(|source| MachineError::Delegation {
                    handler: uri.clone(),
                    source,
                })?;
        } else if let Some(op) = &transition.operation {
            let state_name = self.state().name.clone();
            self.invoke_operation(&state_name, op, target)?;
        }

        let next = self
            .graph
            .resolve_target(owner, &transition.target)
            .ok_or_else(|| MachineError::UnresolvedTarget {
                transition: transition.name.clone(),
                target: transition.target.clone(),
            })?;
        debug!(
            transition = %transition.name,
            from = %self.active,
            to = %next,
            "transition applied"
        );
        self.active = next;
        Ok(())
    }

    fn invoke_operation(
        &self,
        state: &str,
        operation: &Operation,
        target: &mut dyn Managed,
    ) -> Result<(), MachineError> {
        let method = operation.method_name();
        trace!(state, operation = %operation.name, method = %method, "invoking operation");
        target
            .invoke(&method)
            .map_err(|source| MachineError::Invocation {
                state: state.to_string(),
                operation: operation.name.clone(),
                source,
            })
    }
}

impl core::fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StateMachine")
            .field("active", &self.active)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
