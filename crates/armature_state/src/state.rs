//! State, transition, and trigger types for lifecycle graphs.
//!
//! These are the vertices and edges of a component's declarative lifecycle:
//! a tree of named [`State`]s, each carrying the [`Transition`]s that may be
//! applied while it is active and the [`Trigger`]s fired when it is entered
//! through a lifecycle event.

use core::fmt;

use url::Url;

/// A lifecycle event that can fire triggers on a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEvent {
    /// Fired once when a fresh instance is commissioned.
    Initialization,
    /// Fired when an instance is decommissioned.
    Termination,
}

impl TriggerEvent {
    /// Returns the canonical lowercase name used in graph documents.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerEvent::Initialization => "initialization",
            TriggerEvent::Termination => "termination",
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named method invocation descriptor.
///
/// Operations name a method on the managed object. When no explicit method
/// is declared, the invocation method is derived from the operation name by
/// convention (the lowercased name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Declared operation name.
    pub name: String,
    /// Explicit method override, if any.
    pub method: Option<String>,
}

impl Operation {
    /// Creates an operation whose method is derived from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: None,
        }
    }

    /// Creates an operation with an explicit method name.
    #[must_use]
    pub fn with_method(name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: Some(method.into()),
        }
    }

    /// Returns the method to invoke on the managed object.
    ///
    /// Falls back to the convention-derived accessor name (the lowercased
    /// operation name) when no explicit method was declared.
    #[must_use]
    pub fn method_name(&self) -> String {
        self.method
            .clone()
            .unwrap_or_else(|| self.name.to_ascii_lowercase())
    }
}

/// A named edge from its owning state to a target state.
///
/// The target names a state reachable from the owning state (a child,
/// sibling, or ancestor — see [`crate::graph::StateGraph`] for the exact
/// resolution order). Transitions may carry an operation invoked while the
/// transition is applied, or a handler URI delegating the application to a
/// foreign handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Declared transition name.
    pub name: String,
    /// Name of the target state.
    pub target: String,
    /// Operation invoked when the transition is applied.
    pub operation: Option<Operation>,
    /// URI of a foreign handler the application is delegated to.
    pub handler: Option<Url>,
}

impl Transition {
    /// Creates a transition from name to target with no operation.
    #[must_use]
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            operation: None,
            handler: None,
        }
    }

    /// Attaches an operation invoked when the transition is applied.
    #[must_use]
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Delegates the transition to a foreign handler identified by URI.
    #[must_use]
    pub fn with_handler(mut self, handler: Url) -> Self {
        self.handler = Some(handler);
        self
    }
}

/// The action fired by a trigger.
///
/// A closed tagged union: triggers either invoke an operation inline, apply
/// an inline anonymous transition, or reference a named transition or
/// operation declared on the owning state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Invoke an inline operation on the managed object.
    Operation(Operation),
    /// Apply an inline anonymous transition.
    Transition(Transition),
    /// Apply a transition declared on the owning state, by name.
    Apply {
        /// Name of the declared transition.
        transition: String,
    },
    /// Invoke an operation declared by a transition of the owning state.
    Exec {
        /// Name of the declared operation.
        operation: String,
    },
}

impl Action {
    /// Returns the action kind name for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Operation(_) => "operation",
            Action::Transition(_) => "transition",
            Action::Apply { .. } => "apply",
            Action::Exec { .. } => "exec",
        }
    }
}

/// Binds a lifecycle event to an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// The event this trigger fires on.
    pub event: TriggerEvent,
    /// The action fired.
    pub action: Action,
}

impl Trigger {
    /// Creates a trigger binding an event to an action.
    #[must_use]
    pub fn new(event: TriggerEvent, action: Action) -> Self {
        Self { event, action }
    }
}

/// A named node in a lifecycle state graph.
///
/// States own their child states, the transitions applicable while they are
/// active, and the triggers fired on lifecycle events. The tree is immutable
/// once wrapped in a [`crate::graph::StateGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Declared state name.
    pub name: String,
    /// Whether this state ends the lifecycle (no further transitions expected).
    pub terminal: bool,
    /// Triggers fired when this state handles a lifecycle event.
    pub triggers: Vec<Trigger>,
    /// Transitions applicable while this state is active.
    pub transitions: Vec<Transition>,
    /// Child states.
    pub states: Vec<State>,
}

impl State {
    /// Creates an empty, non-terminal state.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            terminal: false,
            triggers: Vec::new(),
            transitions: Vec::new(),
            states: Vec::new(),
        }
    }

    /// Returns the declared transition with the given name, if any.
    #[must_use]
    pub fn transition(&self, name: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.name == name)
    }

    /// Returns the operation with the given name declared by one of this
    /// state's transitions, if any.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.transitions
            .iter()
            .filter_map(|t| t.operation.as_ref())
            .find(|op| op.name == name)
    }

    /// Returns the child state with the given name, if any.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|s| s.name == name)
    }

    /// Returns the triggers declared for the given event, in document order.
    pub fn triggers_for(&self, event: TriggerEvent) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter().filter(move |t| t.event == event)
    }
}

/// Fluent builder for [`State`] trees.
///
/// # Example
///
/// ```
/// use armature_state::state::{Operation, StateBuilder, Transition, Trigger, TriggerEvent};
/// use armature_state::state::Action;
///
/// let root = StateBuilder::new("root")
///     .trigger(Trigger::new(
///         TriggerEvent::Initialization,
///         Action::Operation(Operation::new("Init")),
///     ))
///     .transition(Transition::new("start", "started"))
///     .state(StateBuilder::new("started").transition(Transition::new("stop", "root")))
///     .build();
/// assert_eq!(root.states.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct StateBuilder {
    name: String,
    terminal: bool,
    triggers: Vec<Trigger>,
    transitions: Vec<Transition>,
    states: Vec<State>,
}

impl StateBuilder {
    /// Starts a builder for a state with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Marks the state as terminal.
    #[must_use]
    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    /// Adds a trigger.
    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Adds a transition.
    #[must_use]
    pub fn transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Adds a child state.
    #[must_use]
    pub fn state(mut self, child: StateBuilder) -> Self {
        self.states.push(child.build());
        self
    }

    /// Builds the state tree.
    ///
    /// The result is not yet validated; wrap it in a
    /// [`crate::graph::StateGraph`] to enforce graph integrity.
    #[must_use]
    pub fn build(self) -> State {
        State {
            name: self.name,
            terminal: self.terminal,
            triggers: self.triggers,
            transitions: self.transitions,
            states: self.states,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_event_display() {
        assert_eq!(format!("{}", TriggerEvent::Initialization), "initialization");
        assert_eq!(format!("{}", TriggerEvent::Termination), "termination");
    }

    #[test]
    fn operation_method_derived_from_name() {
        let op = Operation::new("Start");
        assert_eq!(op.method_name(), "start");
    }

    #[test]
    fn operation_explicit_method_wins() {
        let op = Operation::with_method("Start", "start_service");
        assert_eq!(op.method_name(), "start_service");
    }

    #[test]
    fn state_lookup_helpers() {
        let state = StateBuilder::new("root")
            .transition(Transition::new("start", "started").with_operation(Operation::new("Go")))
            .state(StateBuilder::new("started"))
            .build();

        assert!(state.transition("start").is_some());
        assert!(state.transition("stop").is_none());
        assert!(state.operation("Go").is_some());
        assert!(state.child("started").is_some());
        assert!(state.child("stopped").is_none());
    }

    #[test]
    fn triggers_filtered_by_event() {
        let state = StateBuilder::new("root")
            .trigger(Trigger::new(
                TriggerEvent::Initialization,
                Action::Operation(Operation::new("Init")),
            ))
            .trigger(Trigger::new(
                TriggerEvent::Termination,
                Action::Operation(Operation::new("Shutdown")),
            ))
            .build();

        let init: Vec<_> = state.triggers_for(TriggerEvent::Initialization).collect();
        assert_eq!(init.len(), 1);
        assert_eq!(init[0].action.kind(), "operation");
    }
}
