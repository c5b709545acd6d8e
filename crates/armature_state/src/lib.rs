//! Declarative lifecycle state graphs for Armature (Layer 1).
//!
//! `armature_state` provides the immutable model for a component's
//! lifecycle: a tree of named states with transitions, triggers, and
//! operations, validated once at construction and decoded from (or encoded
//! to) a TOML document form.
//!
//! # Core Concepts
//!
//! - [`State`](state::State) - Named node owning child states, transitions, and triggers
//! - [`Transition`](state::Transition) - Named edge to a target state, optionally invoking an operation
//! - [`Trigger`](state::Trigger) - Binding of a lifecycle event to an [`Action`](state::Action)
//! - [`StateGraph`](graph::StateGraph) - Validated, immutable graph with target resolution
//!
//! # Example
//!
//! ```
//! use armature_state::graph::StateGraph;
//! use armature_state::state::{StateBuilder, Transition};
//!
//! let root = StateBuilder::new("root")
//!     .transition(Transition::new("start", "started"))
//!     .state(StateBuilder::new("started").transition(Transition::new("stop", "root")))
//!     .build();
//!
//! let graph = StateGraph::new(root).expect("valid graph");
//! assert_eq!(graph.root().name, "root");
//! ```
//!
//! # Architecture
//!
//! This crate is Layer 1 of the Armature architecture:
//!
//! - **Layer 1** (`armature_state`): lifecycle graph model (this crate)
//! - **Layer 1** (`armature_context`): context descriptors and resolution
//! - **Layer 2** (`armature_runtime`): state machine, strategy, lifestyle

/// Validated graph structure and target resolution.
pub mod graph;

/// TOML document schema for graph documents.
pub mod schema;

/// State, transition, and trigger types.
pub mod state;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::graph::{GraphError, StateGraph, StatePath};
    pub use crate::state::{
        Action, Operation, State, StateBuilder, Transition, Trigger, TriggerEvent,
    };
}

// Re-export key types at crate root for convenience
pub use graph::{GraphError, StateGraph, StatePath};
pub use state::{Action, Operation, State, StateBuilder, Transition, Trigger, TriggerEvent};
