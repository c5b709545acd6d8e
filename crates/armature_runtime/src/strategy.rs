//! Component strategy: context wiring, commissioning, and lifestyles.
//!
//! A [`ComponentStrategy`] binds a component model (state graph, context
//! profile, lifestyle policy) to a factory producing managed objects.
//! Commissioning resolves the declared context, constructs the object, and
//! runs the initialization triggers on a fresh machine; the lifestyle
//! provider decides when commissioning happens and who shares the result.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{Mutex, MutexGuard};
use tracing::debug;
use url::Url;

use armature_context::resolver::{IsolationPolicy, ResolutionError, Resolver};
use armature_context::registry::PartsRegistry;
use armature_context::schema::ContextProfile;
use armature_context::value::ResolvedContext;
use armature_state::graph::{StateGraph, StatePath};
use armature_state::state::{Operation, State, Transition};

use crate::machine::{MachineError, Managed, StateMachine, TransitionHandler};
use crate::provider::{Commission, Provider, provider_for};

/// Instance-sharing policy for a component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifestyle {
    /// One shared instance for all callers.
    Singleton,
    /// One instance per calling thread.
    Thread,
    /// A fresh instance per request.
    Transient,
}

impl Lifestyle {
    /// Returns the lowercase policy name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifestyle::Singleton => "singleton",
            Lifestyle::Thread => "thread",
            Lifestyle::Transient => "transient",
        }
    }
}

impl fmt::Display for Lifestyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a component factory.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ConstructionFault {
    /// Human-readable cause.
    pub message: String,
}

impl ConstructionFault {
    /// Creates a fault from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Factory producing managed objects from a resolved context.
pub type ManagedFactory =
    Arc<dyn Fn(&ResolvedContext) -> Result<Box<dyn Managed>, ConstructionFault> + Send + Sync>;

/// Errors raised while commissioning or driving a component.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// A declared context entry failed to resolve.
    #[error("component '{component}': context resolution failed: {source}")]
    Resolution {
        /// The component name.
        component: String,
        /// The resolution failure, carrying the entry key.
        #[source]
        source: ResolutionError,
    },

    /// The state machine reported a lifecycle failure.
    #[error("component '{component}': lifecycle failed: {source}")]
    Machine {
        /// The component name.
        component: String,
        /// The machine failure, carrying state and transition context.
        #[source]
        source: MachineError,
    },

    /// The component factory failed.
    #[error("component '{component}': construction failed: {source}")]
    Construction {
        /// The component name.
        component: String,
        /// The factory's report.
        #[source]
        source: ConstructionFault,
    },
}

/// The declarative model of a component type.
#[derive(Debug, Clone)]
pub struct ComponentModel {
    /// Component name, carried by every strategy error.
    pub name: String,
    /// Instance-sharing policy.
    pub lifestyle: Lifestyle,
    /// The lifecycle graph instances walk.
    pub graph: Arc<StateGraph>,
    /// Declared context entries and their deployment bindings.
    pub profile: ContextProfile,
    /// Isolation policy applied during context resolution.
    pub policy: IsolationPolicy,
}

impl ComponentModel {
    /// Creates a model with the default (isolated) resolution policy.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        lifestyle: Lifestyle,
        graph: Arc<StateGraph>,
        profile: ContextProfile,
    ) -> Self {
        Self {
            name: name.into(),
            lifestyle,
            graph,
            profile,
            policy: IsolationPolicy::default(),
        }
    }

    /// Overrides the isolation policy.
    #[must_use]
    pub fn with_policy(mut self, policy: IsolationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// A commissioned component: the managed object and its machine.
pub struct Instance {
    machine: StateMachine,
    object: Box<dyn Managed>,
}

impl Instance {
    /// Returns the active state.
    #[must_use]
    pub fn state(&self) -> &State {
        self.machine.state()
    }

    /// Returns the path of the active state.
    #[must_use]
    pub fn path(&self) -> &StatePath {
        self.machine.path()
    }

    /// Applies a named transition against the managed object.
    ///
    /// # Errors
    ///
    /// See [`StateMachine::apply`].
    pub fn apply(&mut self, name: &str) -> Result<(), MachineError> {
        self.machine.apply(name, self.object.as_mut())?;
        Ok(())
    }

    /// Runs the termination triggers against the managed object.
    ///
    /// # Errors
    ///
    /// See [`StateMachine::terminate`].
    pub fn terminate(&mut self) -> Result<(), MachineError> {
        self.machine.terminate(self.object.as_mut())
    }

    /// Returns the transitions applicable from the active state.
    #[must_use]
    pub fn active_transitions(&self) -> Vec<&Transition> {
        self.machine.active_transitions()
    }

    /// Returns the operations exposed by the applicable transitions.
    #[must_use]
    pub fn active_operations(&self) -> Vec<&Operation> {
        self.machine.active_operations()
    }

    /// Returns the managed object.
    #[must_use]
    pub fn object(&self) -> &dyn Managed {
        self.object.as_ref()
    }

    /// Returns the managed object mutably.
    pub fn object_mut(&mut self) -> &mut dyn Managed {
        self.object.as_mut()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("machine", &self.machine)
            .finish()
    }
}

/// Shared handle to a commissioned instance.
///
/// The handle is the unit of sharing between callers; whether two `get`
/// calls return the same handle is the lifestyle policy's decision.
#[derive(Clone)]
pub struct ComponentHandle {
    inner: Arc<Mutex<Instance>>,
}

impl ComponentHandle {
    /// Commissions an instance and wraps it in a fresh handle.
    pub(crate) fn commission(commission: Commission<'_>) -> Result<Self, StrategyError> {
        Ok(Self {
            inner: Arc::new(Mutex::new(commission()?)),
        })
    }

    /// Locks the instance for exclusive use.
    pub fn lock(&self) -> MutexGuard<'_, Instance> {
        self.inner.lock()
    }

    /// Returns true when both handles share the identical instance.
    #[must_use]
    pub fn shares_instance(&self, other: &ComponentHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle").finish_non_exhaustive()
    }
}

/// Produces and manages instances of one component type.
pub struct ComponentStrategy {
    model: ComponentModel,
    registry: Arc<PartsRegistry>,
    factory: ManagedFactory,
    handlers: HashMap<Url, Arc<dyn TransitionHandler>>,
    provider: Box<dyn Provider>,
}

impl ComponentStrategy {
    /// Creates a strategy for the model, selecting the provider matching
    /// the model's lifestyle.
    #[must_use]
    pub fn new(model: ComponentModel, registry: Arc<PartsRegistry>, factory: ManagedFactory) -> Self {
        let provider = provider_for(model.lifestyle);
        Self {
            model,
            registry,
            factory,
            handlers: HashMap::new(),
            provider,
        }
    }

    /// Registers a foreign transition handler forwarded to every machine.
    #[must_use]
    pub fn with_handler(mut self, uri: Url, handler: Arc<dyn TransitionHandler>) -> Self {
        self.handlers.insert(uri, handler);
        self
    }

    /// Returns the component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.model.name
    }

    /// Returns the lifestyle policy.
    #[must_use]
    pub fn lifestyle(&self) -> Lifestyle {
        self.model.lifestyle
    }

    /// Returns an instance handle per the lifestyle policy, commissioning
    /// when the policy requires a new instance.
    ///
    /// # Errors
    ///
    /// Propagates resolution, construction, or lifecycle failures wrapped
    /// with the component name.
    pub fn get(&self) -> Result<ComponentHandle, StrategyError> {
        self.provider.get(&|| self.commission())
    }

    /// Runs termination on the instance and drops any cached handles so a
    /// later [`get`](Self::get) commissions afresh.
    ///
    /// # Errors
    ///
    /// Propagates the termination failure wrapped with the component name.
    pub fn decommission(&self, handle: &ComponentHandle) -> Result<(), StrategyError> {
        handle
            .lock()
            .terminate()
            .map_err(|source| StrategyError::Machine {
                component: self.model.name.clone(),
                source,
            })?;
        self.provider.evict();
        debug!(component = %self.model.name, "component decommissioned");
        Ok(())
    }

    fn commission(&self) -> Result<Instance, StrategyError> {
        let resolver = Resolver::new(
            &self.model.profile.descriptor,
            &self.model.profile.bindings,
            &self.registry,
        )
        .with_policy(self.model.policy);
        let resolved = resolver
            .resolve_all()
            .map_err(|source| StrategyError::Resolution {
                component: self.model.name.clone(),
                source,
            })?;

        let mut object =
            (self.factory)(&resolved).map_err(|source| StrategyError::Construction {
                component: self.model.name.clone(),
                source,
            })?;

        let mut machine = StateMachine::new(self.model.graph.clone());
        for (uri, handler) in &self.handlers {
            machine = machine.with_handler(uri.clone(), handler.clone());
        }
        machine
            .initialize(object.as_mut())
            .map_err(|source| StrategyError::Machine {
                component: self.model.name.clone(),
                source,
            })?;

        debug!(
            component = %self.model.name,
            lifestyle = %self.model.lifestyle,
            state = %machine.path(),
            "component commissioned"
        );
        Ok(Instance { machine, object })
    }
}

impl fmt::Debug for ComponentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentStrategy")
            .field("name", &self.model.name)
            .field("lifestyle", &self.model.lifestyle)
            .finish_non_exhaustive()
    }
}
