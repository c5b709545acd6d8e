//! A declarative component-lifecycle runtime for Rust.
//!

pub use armature_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use armature_internal::prelude::*;
}
