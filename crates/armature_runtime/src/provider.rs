//! Lifestyle providers: instance-sharing strategies behind one interface.
//!
//! The lifestyle policy decides how many instances back a component and who
//! shares them. Only the singleton variant guards its shared handle with a
//! lock; thread and transient instances are owned by their logical caller
//! and need no shared-state locking.

use core::fmt;
use std::thread::{self, ThreadId};

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::strategy::{ComponentHandle, Instance, Lifestyle, StrategyError};

/// Commissioning callback handed to providers by the owning strategy.
pub type Commission<'a> = &'a dyn Fn() -> Result<Instance, StrategyError>;

/// An instance provider implementing one lifestyle policy.
pub trait Provider: Send + Sync {
    /// The lifestyle this provider implements.
    fn lifestyle(&self) -> Lifestyle;

    /// Returns a handle per the policy, commissioning an instance when the
    /// policy requires a new one.
    ///
    /// # Errors
    ///
    /// Propagates the commissioning failure, if any.
    fn get(&self, commission: Commission<'_>) -> Result<ComponentHandle, StrategyError>;

    /// Drops any cached handles so the next `get` commissions afresh.
    fn evict(&self);
}

impl fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("lifestyle", &self.lifestyle())
            .finish()
    }
}

/// One shared instance for all callers.
#[derive(Default)]
pub struct SingletonProvider {
    // Guards both the commissioning race and the shared slot.
    slot: Mutex<Option<ComponentHandle>>,
}

impl Provider for SingletonProvider {
    fn lifestyle(&self) -> Lifestyle {
        Lifestyle::Singleton
    }

    fn get(&self, commission: Commission<'_>) -> Result<ComponentHandle, StrategyError> {
        let mut slot = self.slot.lock();
        if let Some(handle) = slot.as_ref() {
            return Ok(handle.clone());
        }
        debug!("commissioning singleton instance");
        let handle = ComponentHandle::commission(commission)?;
        *slot = Some(handle.clone());
        Ok(handle)
    }

    fn evict(&self) {
        self.slot.lock().take();
    }
}

/// One instance per calling thread.
#[derive(Default)]
pub struct ThreadProvider {
    slots: RwLock<HashMap<ThreadId, ComponentHandle>>,
}

impl Provider for ThreadProvider {
    fn lifestyle(&self) -> Lifestyle {
        Lifestyle::Thread
    }

    fn get(&self, commission: Commission<'_>) -> Result<ComponentHandle, StrategyError> {
        let id = thread::current().id();
        if let Some(handle) = self.slots.read().get(&id) {
            return Ok(handle.clone());
        }
        // A thread cannot race itself between the read and the write.
        debug!(thread = ?id, "commissioning per-thread instance");
        let handle = ComponentHandle::commission(commission)?;
        self.slots.write().insert(id, handle.clone());
        Ok(handle)
    }

    fn evict(&self) {
        self.slots.write().clear();
    }
}

/// A fresh instance for every request.
#[derive(Debug, Default)]
pub struct TransientProvider;

impl Provider for TransientProvider {
    fn lifestyle(&self) -> Lifestyle {
        Lifestyle::Transient
    }

    fn get(&self, commission: Commission<'_>) -> Result<ComponentHandle, StrategyError> {
        ComponentHandle::commission(commission)
    }

    fn evict(&self) {}
}

/// Builds the provider implementing a lifestyle policy.
#[must_use]
pub fn provider_for(lifestyle: Lifestyle) -> Box<dyn Provider> {
    match lifestyle {
        Lifestyle::Singleton => Box::new(SingletonProvider::default()),
        Lifestyle::Thread => Box::new(ThreadProvider::default()),
        Lifestyle::Transient => Box::new(TransientProvider),
    }
}
