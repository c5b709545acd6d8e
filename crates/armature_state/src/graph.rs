//! Validated lifecycle state graphs.
//!
//! A [`StateGraph`] wraps a [`State`] tree after whole-tree validation:
//! every transition target must resolve, names must be unique within their
//! owning scope, and trigger references must name declared transitions or
//! operations. Validation happens once at construction; a graph that fails
//! validation is never returned, even partially.

use core::fmt;

use hashbrown::HashSet;

use crate::state::{Action, Operation, State, Transition};

/// Errors raised while building or decoding a state graph.
///
/// All variants are fatal: no partially constructed graph escapes.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Two child states under one parent share a name.
    #[error("state '{state}' declares duplicate child state '{child}'")]
    DuplicateState {
        /// The parent state.
        state: String,
        /// The repeated child name.
        child: String,
    },

    /// Two transitions on one state share a name.
    #[error("state '{state}' declares duplicate transition '{transition}'")]
    DuplicateTransition {
        /// The owning state.
        state: String,
        /// The repeated transition name.
        transition: String,
    },

    /// A transition target does not resolve to any reachable state.
    #[error("transition '{transition}' on state '{state}' targets unknown state '{target}'")]
    NoSuchState {
        /// The owning state.
        state: String,
        /// The offending transition.
        transition: String,
        /// The unresolvable target name.
        target: String,
    },

    /// A trigger applies a transition the owning state does not declare.
    #[error("trigger on state '{state}' applies unknown transition '{transition}'")]
    UnknownTransition {
        /// The owning state.
        state: String,
        /// The missing transition name.
        transition: String,
    },

    /// A trigger executes an operation no transition of the owning state declares.
    #[error("trigger on state '{state}' executes unknown operation '{operation}'")]
    UnknownOperation {
        /// The owning state.
        state: String,
        /// The missing operation name.
        operation: String,
    },

    /// The graph document could not be decoded.
    #[error("malformed state graph document: {0}")]
    Malformed(#[from] toml::de::Error),

    /// The graph could not be encoded back to document form.
    #[error("failed to encode state graph document: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Absolute address of a state within a graph, as the sequence of state
/// names from the root (exclusive) down to the addressed state.
///
/// The empty path addresses the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StatePath(Vec<String>);

impl StatePath {
    /// The root path.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns the path segments below the root.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns the path of the enclosing state, or `None` at the root.
    #[must_use]
    pub fn parent(&self) -> Option<StatePath> {
        let mut segments = self.0.clone();
        segments.pop().map(|_| StatePath(segments))
    }

    /// Returns the path extended by one child name.
    #[must_use]
    pub fn join(&self, child: impl Into<String>) -> StatePath {
        let mut segments = self.0.clone();
        segments.push(child.into());
        StatePath(segments)
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// An immutable, validated lifecycle state graph.
///
/// # Target resolution
///
/// A transition target is resolved relative to its owning state, searching:
///
/// 1. the owning state's own children,
/// 2. the owning state itself,
/// 3. each enclosing state's children (the owner's siblings) and the
///    enclosing state itself, outward to the root.
///
/// The nearest match wins. Transition cycles between states are legal; only
/// reference integrity is enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateGraph {
    root: State,
}

impl StateGraph {
    /// Validates a state tree and wraps it as a graph.
    ///
    /// # Errors
    ///
    /// Returns the first [`GraphError`] encountered while walking the tree
    /// in document order; no usable graph is returned on failure.
    pub fn new(root: State) -> Result<Self, GraphError> {
        let mut ancestors: Vec<&State> = Vec::new();
        Self::validate(&root, &mut ancestors)?;
        Ok(Self { root })
    }

    /// Returns the root state.
    #[must_use]
    pub fn root(&self) -> &State {
        &self.root
    }

    /// Returns the state addressed by `path`, if it exists.
    #[must_use]
    pub fn state_at(&self, path: &StatePath) -> Option<&State> {
        let mut current = &self.root;
        for segment in path.segments() {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Resolves a transition target name relative to the state at `from`.
    ///
    /// Returns the path of the nearest matching state per the resolution
    /// order documented on [`StateGraph`].
    #[must_use]
    pub fn resolve_target(&self, from: &StatePath, target: &str) -> Option<StatePath> {
        let mut scope = Some(from.clone());
        while let Some(path) = scope {
            let state = self.state_at(&path)?;
            if state.child(target).is_some() {
                return Some(path.join(target));
            }
            if state.name == target {
                return Some(path);
            }
            scope = path.parent();
        }
        None
    }

    /// Finds the named transition on the state at `from` or on one of its
    /// ancestors (states inherit the transitions of their enclosing states).
    ///
    /// Returns the transition together with the path of the state that
    /// declares it.
    #[must_use]
    pub fn lookup_transition(
        &self,
        from: &StatePath,
        name: &str,
    ) -> Option<(&Transition, StatePath)> {
        let mut scope = Some(from.clone());
        while let Some(path) = scope {
            let state = self.state_at(&path)?;
            if let Some(transition) = state.transition(name) {
                return Some((transition, path));
            }
            scope = path.parent();
        }
        None
    }

    /// Returns the transitions applicable from the state at `from`,
    /// including inherited ones, nearest declaration first. A transition
    /// shadowed by a nearer one of the same name is omitted.
    #[must_use]
    pub fn active_transitions(&self, from: &StatePath) -> Vec<&Transition> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();
        let mut scope = Some(from.clone());
        while let Some(path) = scope {
            let Some(state) = self.state_at(&path) else {
                break;
            };
            for transition in &state.transitions {
                if seen.insert(transition.name.as_str()) {
                    out.push(transition);
                }
            }
            scope = path.parent();
        }
        out
    }

    /// Returns the operations exposed by the transitions applicable from
    /// the state at `from`, in the same order as
    /// [`active_transitions`](Self::active_transitions).
    #[must_use]
    pub fn active_operations(&self, from: &StatePath) -> Vec<&Operation> {
        self.active_transitions(from)
            .into_iter()
            .filter_map(|t| t.operation.as_ref())
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────

    fn validate<'a>(state: &'a State, ancestors: &mut Vec<&'a State>) -> Result<(), GraphError> {
        let mut child_names: HashSet<&str> = HashSet::new();
        for child in &state.states {
            if !child_names.insert(child.name.as_str()) {
                return Err(GraphError::DuplicateState {
                    state: state.name.clone(),
                    child: child.name.clone(),
                });
            }
        }

        let mut transition_names: HashSet<&str> = HashSet::new();
        for transition in &state.transitions {
            if !transition_names.insert(transition.name.as_str()) {
                return Err(GraphError::DuplicateTransition {
                    state: state.name.clone(),
                    transition: transition.name.clone(),
                });
            }
            Self::validate_target(state, ancestors, transition)?;
        }

        for trigger in &state.triggers {
            match &trigger.action {
                Action::Operation(_) => {}
                Action::Transition(inline) => {
                    Self::validate_target(state, ancestors, inline)?;
                }
                Action::Apply { transition } => {
                    if state.transition(transition).is_none() {
                        return Err(GraphError::UnknownTransition {
                            state: state.name.clone(),
                            transition: transition.clone(),
                        });
                    }
                }
                Action::Exec { operation } => {
                    if state.operation(operation).is_none() {
                        return Err(GraphError::UnknownOperation {
                            state: state.name.clone(),
                            operation: operation.clone(),
                        });
                    }
                }
            }
        }

        ancestors.push(state);
        for child in &state.states {
            Self::validate(child, ancestors)?;
        }
        ancestors.pop();
        Ok(())
    }

    /// Checks that a transition target resolves per the documented order:
    /// the owner's children, the owner itself, then each ancestor's
    /// children and the ancestor itself.
    fn validate_target(
        owner: &State,
        ancestors: &[&State],
        transition: &Transition,
    ) -> Result<(), GraphError> {
        let target = transition.target.as_str();
        if owner.child(target).is_some() || owner.name == target {
            return Ok(());
        }
        for ancestor in ancestors.iter().rev() {
            if ancestor.child(target).is_some() || ancestor.name == target {
                return Ok(());
            }
        }
        Err(GraphError::NoSuchState {
            state: owner.name.clone(),
            transition: transition.name.clone(),
            target: transition.target.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{StateBuilder, Trigger, TriggerEvent};

    fn sample() -> State {
        StateBuilder::new("root")
            .transition(Transition::new("start", "started"))
            .state(
                StateBuilder::new("started")
                    .transition(Transition::new("stop", "stopped"))
                    .state(StateBuilder::new("running")),
            )
            .state(StateBuilder::new("stopped").terminal())
            .build()
    }

    #[test]
    fn valid_graph_builds() {
        let graph = StateGraph::new(sample()).expect("graph should validate");
        assert_eq!(graph.root().name, "root");
    }

    #[test]
    fn empty_root_is_valid() {
        assert!(StateGraph::new(State::new("root")).is_ok());
    }

    #[test]
    fn duplicate_child_state_rejected() {
        let root = StateBuilder::new("root")
            .state(StateBuilder::new("a"))
            .state(StateBuilder::new("a"))
            .build();
        let err = StateGraph::new(root).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateState { child, .. } if child == "a"));
    }

    #[test]
    fn duplicate_transition_rejected() {
        let root = StateBuilder::new("root")
            .transition(Transition::new("go", "root"))
            .transition(Transition::new("go", "root"))
            .build();
        let err = StateGraph::new(root).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateTransition { transition, .. } if transition == "go"));
    }

    #[test]
    fn dangling_target_rejected() {
        let root = StateBuilder::new("root")
            .transition(Transition::new("go", "nowhere"))
            .build();
        let err = StateGraph::new(root).unwrap_err();
        assert!(matches!(err, GraphError::NoSuchState { target, .. } if target == "nowhere"));
    }

    #[test]
    fn nested_dangling_target_rejected() {
        let root = StateBuilder::new("root")
            .state(StateBuilder::new("a").transition(Transition::new("jump", "ghost")))
            .build();
        let err = StateGraph::new(root).unwrap_err();
        assert!(
            matches!(err, GraphError::NoSuchState { state, target, .. } if state == "a" && target == "ghost")
        );
    }

    #[test]
    fn sibling_target_is_valid() {
        // "stop" on started targets its sibling "stopped" via the parent scope.
        assert!(StateGraph::new(sample()).is_ok());
    }

    #[test]
    fn ancestor_target_is_valid() {
        let root = StateBuilder::new("root")
            .state(StateBuilder::new("a").transition(Transition::new("reset", "root")))
            .build();
        assert!(StateGraph::new(root).is_ok());
    }

    #[test]
    fn apply_trigger_must_name_declared_transition() {
        let root = StateBuilder::new("root")
            .trigger(Trigger::new(
                TriggerEvent::Initialization,
                Action::Apply {
                    transition: "missing".into(),
                },
            ))
            .build();
        let err = StateGraph::new(root).unwrap_err();
        assert!(matches!(err, GraphError::UnknownTransition { transition, .. } if transition == "missing"));
    }

    #[test]
    fn exec_trigger_must_name_declared_operation() {
        let root = StateBuilder::new("root")
            .trigger(Trigger::new(
                TriggerEvent::Termination,
                Action::Exec {
                    operation: "missing".into(),
                },
            ))
            .build();
        let err = StateGraph::new(root).unwrap_err();
        assert!(matches!(err, GraphError::UnknownOperation { operation, .. } if operation == "missing"));
    }

    #[test]
    fn state_at_resolves_paths() {
        let graph = StateGraph::new(sample()).unwrap();
        let path = StatePath::root().join("started").join("running");
        assert_eq!(graph.state_at(&path).unwrap().name, "running");
        assert!(graph.state_at(&StatePath::root().join("ghost")).is_none());
    }

    #[test]
    fn resolve_target_prefers_children_over_ancestors() {
        // "started" declared both as a child of root and addressable from root.
        let graph = StateGraph::new(sample()).unwrap();
        let resolved = graph.resolve_target(&StatePath::root(), "started").unwrap();
        assert_eq!(resolved, StatePath::root().join("started"));
    }

    #[test]
    fn resolve_target_walks_up_to_siblings() {
        let graph = StateGraph::new(sample()).unwrap();
        let from = StatePath::root().join("started");
        let resolved = graph.resolve_target(&from, "stopped").unwrap();
        assert_eq!(resolved, StatePath::root().join("stopped"));
    }

    #[test]
    fn lookup_transition_inherits_from_ancestors() {
        let graph = StateGraph::new(sample()).unwrap();
        let from = StatePath::root().join("started").join("running");
        // "stop" is declared on "started", an ancestor of "running".
        let (transition, owner) = graph.lookup_transition(&from, "stop").unwrap();
        assert_eq!(transition.target, "stopped");
        assert_eq!(owner, StatePath::root().join("started"));
        assert!(graph.lookup_transition(&from, "launch").is_none());
    }

    #[test]
    fn active_transitions_dedupe_by_name() {
        let root = StateBuilder::new("root")
            .transition(Transition::new("go", "root"))
            .state(StateBuilder::new("a").transition(Transition::new("go", "a")))
            .build();
        let graph = StateGraph::new(root).unwrap();
        let active = graph.active_transitions(&StatePath::root().join("a"));
        assert_eq!(active.len(), 1);
        // The nearer declaration shadows the inherited one.
        assert_eq!(active[0].target, "a");
    }

    #[test]
    fn state_path_display() {
        assert_eq!(format!("{}", StatePath::root()), "/");
        assert_eq!(format!("{}", StatePath::root().join("a").join("b")), "/a/b");
    }
}
