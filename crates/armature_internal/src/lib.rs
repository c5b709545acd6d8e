//! # Armature Internal Library
//!
//! Re-exports the core Armature crates for convenience.

/// Layer 1: lifecycle state graph model.
pub use armature_state;

/// Layer 1: context descriptors and directive resolution.
pub use armature_context;

/// Layer 2: state machine runtime, strategy, and lifestyle providers.
pub use armature_runtime;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use armature_context::prelude::*;
    pub use armature_runtime::prelude::*;
    pub use armature_state::prelude::*;
}
