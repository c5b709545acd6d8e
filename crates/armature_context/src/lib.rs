//! Context descriptors and directive resolution for Armature (Layer 1).
//!
//! `armature_context` answers how a component's declared dependencies are
//! produced: entries are declared in a [`ContextDescriptor`](entry::ContextDescriptor),
//! a deployment supplies [`Directive`](directive::Directive)s for them, and a
//! [`Resolver`](resolver::Resolver) turns each into a concrete
//! [`ContextValue`](value::ContextValue) — coercing literals, expanding
//! `${key}` references under an isolation policy, looking up services and
//! parts in a [`PartsRegistry`](registry::PartsRegistry), and dispatching
//! constructed values through registered factories.
//!
//! # Example
//!
//! ```
//! use armature_context::directive::ContextMap;
//! use armature_context::entry::{ContextDescriptor, EntryDescriptor};
//! use armature_context::registry::PartsRegistry;
//! use armature_context::resolver::Resolver;
//! use armature_context::value::{ContextValue, ValueKind};
//!
//! let descriptor = ContextDescriptor::new(vec![
//!     EntryDescriptor::new("port", ValueKind::Int).optional(),
//! ]).unwrap();
//! let supplied = ContextMap::new().with_int("port", 8080);
//! let registry = PartsRegistry::new();
//!
//! let resolver = Resolver::new(&descriptor, &supplied, &registry);
//! assert_eq!(resolver.resolve("port").unwrap(), ContextValue::Int(8080));
//! ```

/// Directive model and the supplied context map.
pub mod directive;

/// Entry declarations and descriptor-level validation.
pub mod entry;

/// Parts, services, and value factories.
pub mod registry;

/// Directive resolution against a supplied context.
pub mod resolver;

/// TOML document schema for context profiles.
pub mod schema;

/// Resolved values and part handles.
pub mod value;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::directive::{ContextMap, Directive, DirectiveKind, ValueDirective};
    pub use crate::entry::{ContextDescriptor, DirectiveError, EntryDescriptor};
    pub use crate::registry::{FactoryError, PartsRegistry, ValueFactory};
    pub use crate::resolver::{IsolationPolicy, ResolutionError, Resolver};
    pub use crate::schema::ContextProfile;
    pub use crate::value::{ContextValue, PartHandle, PartInstance, ResolvedContext, ValueKind};
}

// Re-export key types at crate root for convenience
pub use directive::{ContextMap, Directive, DirectiveKind, ValueDirective};
pub use entry::{ContextDescriptor, DirectiveError, EntryDescriptor};
pub use registry::{FactoryError, PartsRegistry, ValueFactory};
pub use resolver::{IsolationPolicy, ResolutionError, Resolver};
pub use schema::ContextProfile;
pub use value::{ContextValue, PartHandle, PartInstance, ResolvedContext, ValueKind};
