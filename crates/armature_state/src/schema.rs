//! TOML document schema for state graphs.
//!
//! Graph documents are deserialized into raw document structs first and
//! only then converted into the validated model, so a malformed or
//! inconsistent document can never yield a usable graph. Encoding walks the
//! model back into document form; load → encode → reload yields a
//! structurally equal graph.
//!
//! # Document form
//!
//! ```toml
//! name = "root"
//!
//! [[trigger]]
//! event = "initialization"
//! [trigger.action.operation]
//! name = "Init"
//!
//! [[transition]]
//! name = "start"
//! target = "started"
//!
//! [[state]]
//! name = "started"
//! [[state.transition]]
//! name = "stop"
//! target = "root"
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::graph::{GraphError, StateGraph};
use crate::state::{Action, Operation, State, Transition, Trigger, TriggerEvent};

/// Document form of a state node.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateDoc {
    name: String,

    #[serde(default, skip_serializing_if = "is_false")]
    terminal: bool,

    #[serde(default, rename = "trigger", skip_serializing_if = "Vec::is_empty")]
    triggers: Vec<TriggerDoc>,

    #[serde(default, rename = "transition", skip_serializing_if = "Vec::is_empty")]
    transitions: Vec<TransitionDoc>,

    #[serde(default, rename = "state", skip_serializing_if = "Vec::is_empty")]
    states: Vec<StateDoc>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TriggerDoc {
    event: EventDoc,
    action: ActionDoc,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum EventDoc {
    Initialization,
    Termination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ActionDoc {
    Operation(OperationDoc),
    Transition(Box<TransitionDoc>),
    Apply(String),
    Exec(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TransitionDoc {
    name: String,
    target: String,

    // Plain values must precede tables in the emitted TOML, so `handler`
    // sits above `operation` here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    handler: Option<Url>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    operation: Option<OperationDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OperationDoc {
    name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Document ↔ model conversion
// ─────────────────────────────────────────────────────────────────────────────

impl From<StateDoc> for State {
    fn from(doc: StateDoc) -> Self {
        State {
            name: doc.name,
            terminal: doc.terminal,
            triggers: doc.triggers.into_iter().map(Trigger::from).collect(),
            transitions: doc.transitions.into_iter().map(Transition::from).collect(),
            states: doc.states.into_iter().map(State::from).collect(),
        }
    }
}

impl From<TriggerDoc> for Trigger {
    fn from(doc: TriggerDoc) -> Self {
        let event = match doc.event {
            EventDoc::Initialization => TriggerEvent::Initialization,
            EventDoc::Termination => TriggerEvent::Termination,
        };
        let action = match doc.action {
            ActionDoc::Operation(op) => Action::Operation(op.into()),
            ActionDoc::Transition(t) => Action::Transition((*t).into()),
            ActionDoc::Apply(transition) => Action::Apply { transition },
            ActionDoc::Exec(operation) => Action::Exec { operation },
        };
        Trigger { event, action }
    }
}

impl From<TransitionDoc> for Transition {
    fn from(doc: TransitionDoc) -> Self {
        Transition {
            name: doc.name,
            target: doc.target,
            operation: doc.operation.map(Operation::from),
            handler: doc.handler,
        }
    }
}

impl From<OperationDoc> for Operation {
    fn from(doc: OperationDoc) -> Self {
        Operation {
            name: doc.name,
            method: doc.method,
        }
    }
}

impl From<&State> for StateDoc {
    fn from(state: &State) -> Self {
        StateDoc {
            name: state.name.clone(),
            terminal: state.terminal,
            triggers: state.triggers.iter().map(TriggerDoc::from).collect(),
            transitions: state.transitions.iter().map(TransitionDoc::from).collect(),
            states: state.states.iter().map(StateDoc::from).collect(),
        }
    }
}

impl From<&Trigger> for TriggerDoc {
    fn from(trigger: &Trigger) -> Self {
        let event = match trigger.event {
            TriggerEvent::Initialization => EventDoc::Initialization,
            TriggerEvent::Termination => EventDoc::Termination,
        };
        let action = match &trigger.action {
            Action::Operation(op) => ActionDoc::Operation(op.into()),
            Action::Transition(t) => ActionDoc::Transition(Box::new(t.into())),
            Action::Apply { transition } => ActionDoc::Apply(transition.clone()),
            Action::Exec { operation } => ActionDoc::Exec(operation.clone()),
        };
        TriggerDoc { event, action }
    }
}

impl From<&Transition> for TransitionDoc {
    fn from(transition: &Transition) -> Self {
        TransitionDoc {
            name: transition.name.clone(),
            target: transition.target.clone(),
            operation: transition.operation.as_ref().map(OperationDoc::from),
            handler: transition.handler.clone(),
        }
    }
}

impl From<&Operation> for OperationDoc {
    fn from(operation: &Operation) -> Self {
        OperationDoc {
            name: operation.name.clone(),
            method: operation.method.clone(),
        }
    }
}

impl StateGraph {
    /// Decodes and validates a state graph from its TOML document form.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Malformed`] when the document does not parse,
    /// or the validation error for the first integrity violation. No
    /// partial graph is returned.
    pub fn from_toml(document: &str) -> Result<Self, GraphError> {
        let doc: StateDoc = toml::from_str(document)?;
        StateGraph::new(doc.into())
    }

    /// Encodes the graph back into its TOML document form.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Encode`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, GraphError> {
        Ok(toml::to_string_pretty(&StateDoc::from(self.root()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
name = "root"

[[trigger]]
event = "initialization"
[trigger.action.operation]
name = "Init"

[[transition]]
name = "start"
target = "started"
[transition.operation]
name = "Start"
method = "start_service"

[[state]]
name = "started"

[[state.transition]]
name = "stop"
target = "stopped"

[[state]]
name = "stopped"
terminal = true
"#;

    #[test]
    fn decodes_document() {
        let graph = StateGraph::from_toml(DOC).expect("document should decode");
        assert_eq!(graph.root().name, "root");
        assert_eq!(graph.root().states.len(), 2);
        let start = graph.root().transition("start").unwrap();
        assert_eq!(
            start.operation.as_ref().unwrap().method_name(),
            "start_service"
        );
    }

    #[test]
    fn apply_action_decodes_as_string() {
        let doc = r#"
name = "root"

[[transition]]
name = "go"
target = "root"

[[trigger]]
event = "initialization"
[trigger.action]
apply = "go"
"#;
        let graph = StateGraph::from_toml(doc).unwrap();
        assert!(matches!(
            &graph.root().triggers[0].action,
            Action::Apply { transition } if transition == "go"
        ));
    }

    #[test]
    fn malformed_document_is_rejected() {
        let err = StateGraph::from_toml("name = ").unwrap_err();
        assert!(matches!(err, GraphError::Malformed(_)));
    }

    #[test]
    fn inconsistent_document_is_rejected() {
        let doc = r#"
name = "root"

[[transition]]
name = "go"
target = "ghost"
"#;
        let err = StateGraph::from_toml(doc).unwrap_err();
        assert!(matches!(err, GraphError::NoSuchState { .. }));
    }
}
