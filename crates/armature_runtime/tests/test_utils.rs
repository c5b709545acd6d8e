//! Shared test utilities for `armature_runtime` integration tests.
//!
//! This module provides common fixtures, components, and graph documents
//! used across multiple test files. Import via `mod test_utils;`.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities — not all items used in every test binary"
)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use armature_runtime::machine::{InvocationError, Managed};
use armature_state::graph::StateGraph;

// ═══════════════════════════════════════════════════════════════════════════════
// GRAPH FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

/// Start/stop lifecycle: initialization applies "start", termination applies
/// "stop" from the started state.
pub const LIFECYCLE_DOC: &str = r#"
name = "root"

[[trigger]]
event = "initialization"
[trigger.action]
apply = "start"

[[transition]]
name = "start"
target = "started"
[transition.operation]
name = "Start"

[[state]]
name = "started"

[[state.trigger]]
event = "termination"
[state.trigger.action]
apply = "stop"

[[state.transition]]
name = "stop"
target = "stopped"
[state.transition.operation]
name = "Stop"

[[state]]
name = "stopped"
terminal = true
"#;

/// Loads a graph fixture, panicking on an invalid document.
pub fn load_fixture(document: &str) -> Arc<StateGraph> {
    Arc::new(StateGraph::from_toml(document).expect("fixture graph should be valid"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEST COMPONENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Records every invoked method, optionally failing on a configured one.
pub struct Recorder {
    invoked: Arc<Mutex<Vec<String>>>,
    failing: Option<String>,
}

impl Recorder {
    /// Creates a recorder appending into the shared log.
    pub fn new(invoked: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            invoked,
            failing: None,
        }
    }

    /// Makes the given method fail when invoked.
    pub fn failing_on(mut self, method: impl Into<String>) -> Self {
        self.failing = Some(method.into());
        self
    }
}

impl Managed for Recorder {
    fn invoke(&mut self, method: &str) -> Result<(), InvocationError> {
        self.invoked.lock().unwrap().push(method.to_string());
        if self.failing.as_deref() == Some(method) {
            return Err(InvocationError::Failed {
                method: method.to_string(),
                message: "intentional failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Returns a fresh shared invocation log.
pub fn invocation_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

/// Snapshot of the invocation log.
pub fn invoked(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Component that counts how many instances were constructed.
pub struct Counted;

impl Managed for Counted {
    fn invoke(&mut self, _method: &str) -> Result<(), InvocationError> {
        Ok(())
    }
}

/// Shared construction counter for lifestyle tests.
#[derive(Clone, Default)]
pub struct Constructions(Arc<AtomicUsize>);

impl Constructions {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
