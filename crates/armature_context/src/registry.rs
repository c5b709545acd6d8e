//! The parts registry: named parts, service implementations, and value
//! factories.
//!
//! The registry is the service-lookup collaborator consumed by directive
//! resolution. It uses interior mutability so registration does not require
//! exclusive access, mirroring how plugins populate shared registries
//! during a build phase.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::value::{ContextValue, PartHandle};

/// Errors reported by a [`ValueFactory`].
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    /// The factory does not provide the requested method.
    #[error("factory method '{method}' is not provided")]
    UnknownMethod {
        /// The missing method name.
        method: String,
    },

    /// The factory rejected its arguments.
    #[error("factory method '{method}' rejected its arguments: {message}")]
    Invalid {
        /// The invoked method.
        method: String,
        /// Human-readable cause.
        message: String,
    },
}

/// A named constructor for context values.
///
/// Factories are the closed-dispatch replacement for reflective factory
/// methods: a `Construct` directive names a registered factory and one of
/// its methods, and the factory builds the value from resolved arguments.
pub trait ValueFactory: Send + Sync {
    /// Constructs a value from resolved arguments.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError::UnknownMethod`] for an unrecognized method
    /// name, or [`FactoryError::Invalid`] when the arguments are rejected.
    fn construct(&self, method: &str, args: &[ContextValue]) -> Result<ContextValue, FactoryError>;
}

/// Registry of available parts, services, and value factories.
#[derive(Default)]
pub struct PartsRegistry {
    parts: RwLock<HashMap<String, PartHandle>>,
    services: RwLock<HashMap<String, PartHandle>>,
    factories: RwLock<HashMap<String, Arc<dyn ValueFactory>>>,
}

impl PartsRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a part under a key, replacing any previous registration.
    pub fn register_part(&self, key: impl Into<String>, part: PartHandle) {
        self.parts.write().insert(key.into(), part);
    }

    /// Returns the part registered under `key`, if any.
    #[must_use]
    pub fn part(&self, key: &str) -> Option<PartHandle> {
        self.parts.read().get(key).cloned()
    }

    /// Registers a service implementation under a service name.
    pub fn register_service(&self, service: impl Into<String>, part: PartHandle) {
        self.services.write().insert(service.into(), part);
    }

    /// Returns the implementation registered for a service name, if any.
    #[must_use]
    pub fn service(&self, service: &str) -> Option<PartHandle> {
        self.services.read().get(service).cloned()
    }

    /// Registers a value factory under a name.
    pub fn register_factory(&self, name: impl Into<String>, factory: Arc<dyn ValueFactory>) {
        self.factories.write().insert(name.into(), factory);
    }

    /// Returns the value factory registered under `name`, if any.
    #[must_use]
    pub fn factory(&self, name: &str) -> Option<Arc<dyn ValueFactory>> {
        self.factories.read().get(name).cloned()
    }
}

impl fmt::Debug for PartsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartsRegistry")
            .field("parts", &self.parts.read().len())
            .field("services", &self.services.read().len())
            .field("factories", &self.factories.read().len())
            .finish()
    }
}
