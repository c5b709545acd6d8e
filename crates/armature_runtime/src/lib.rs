//! State machine runtime, component strategy, and lifestyle providers for
//! Armature (Layer 2).
//!
//! `armature_runtime` drives the Layer 1 models: a
//! [`StateMachine`](machine::StateMachine) walks a lifecycle graph for one
//! instance, a [`ComponentStrategy`](strategy::ComponentStrategy) wires
//! context resolution into instance construction, and lifestyle
//! [providers](provider) decide who shares which instance.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use armature_context::registry::PartsRegistry;
//! use armature_context::schema::ContextProfile;
//! use armature_runtime::machine::{InvocationError, Managed};
//! use armature_runtime::strategy::{ComponentModel, ComponentStrategy, Lifestyle};
//! use armature_state::graph::StateGraph;
//! use armature_state::state::State;
//!
//! struct Widget;
//!
//! impl Managed for Widget {
//!     fn invoke(&mut self, method: &str) -> Result<(), InvocationError> {
//!         match method {
//!             "start" | "stop" => Ok(()),
//!             other => Err(InvocationError::UnknownMethod { method: other.to_string() }),
//!         }
//!     }
//! }
//!
//! let graph = Arc::new(StateGraph::new(State::new("root")).unwrap());
//! let model = ComponentModel::new("widget", Lifestyle::Transient, graph, ContextProfile::default());
//! let strategy = ComponentStrategy::new(
//!     model,
//!     Arc::new(PartsRegistry::new()),
//!     Arc::new(|_| Ok(Box::new(Widget))),
//! );
//! let handle = strategy.get().expect("commissioning succeeds");
//! assert_eq!(handle.lock().state().name, "root");
//! ```
//!
//! # Architecture
//!
//! This crate is Layer 2 of the Armature architecture:
//!
//! - **Layer 1** (`armature_state`): lifecycle graph model
//! - **Layer 1** (`armature_context`): context descriptors and resolution
//! - **Layer 2** (`armature_runtime`): machine, strategy, lifestyle (this crate)

/// Artifact resolution seam for loading documents by URI.
pub mod artifact;

/// The per-instance state machine.
pub mod machine;

/// Lifestyle providers.
pub mod provider;

/// Component strategy and commissioning.
pub mod strategy;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::artifact::{
        ArtifactError, ArtifactResolver, FileResolver, LoadError, load_graph, load_profile,
    };
    pub use crate::machine::{
        DelegationFault, InvocationError, MachineError, Managed, StateMachine, TransitionHandler,
    };
    pub use crate::provider::{Provider, SingletonProvider, ThreadProvider, TransientProvider};
    pub use crate::strategy::{
        ComponentHandle, ComponentModel, ComponentStrategy, ConstructionFault, Instance, Lifestyle,
        ManagedFactory, StrategyError,
    };
}

// Re-export key types at crate root for convenience
pub use machine::{MachineError, Managed, StateMachine};
pub use strategy::{ComponentHandle, ComponentModel, ComponentStrategy, Lifestyle, StrategyError};
