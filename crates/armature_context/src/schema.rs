//! TOML document schema for context profiles.
//!
//! A context document carries both sides of the contract: the entry
//! declarations and the deployment-supplied bindings. As with graph
//! documents, raw document structs are decoded first and converted into the
//! validated model, so duplicate keys never survive loading.
//!
//! # Document form
//!
//! ```toml
//! [[entry]]
//! key = "port"
//! kind = "int"
//! optional = true
//! [entry.default.literal]
//! text = "0"
//!
//! [bindings.port.literal]
//! text = "8080"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::directive::{ContextMap, Directive, ValueDirective};
use crate::entry::{ContextDescriptor, DirectiveError, EntryDescriptor};
use crate::value::ValueKind;

/// A context descriptor together with its deployment bindings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextProfile {
    /// The declared entries.
    pub descriptor: ContextDescriptor,
    /// The supplied directives, keyed by entry.
    pub bindings: ContextMap,
}

impl ContextProfile {
    /// Creates a profile from a descriptor and its bindings.
    #[must_use]
    pub fn new(descriptor: ContextDescriptor, bindings: ContextMap) -> Self {
        Self {
            descriptor,
            bindings,
        }
    }

    /// Decodes a context profile from its TOML document form.
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError::Malformed`] when the document does not
    /// parse, or [`DirectiveError::DuplicateKey`] when two entries share a
    /// key.
    pub fn from_toml(document: &str) -> Result<Self, DirectiveError> {
        let doc: ContextDoc = toml::from_str(document)?;
        doc.try_into()
    }

    /// Encodes the profile back into its TOML document form.
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError::Encode`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, DirectiveError> {
        Ok(toml::to_string_pretty(&ContextDoc::from(self))?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Document structs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ContextDoc {
    #[serde(default, rename = "entry", skip_serializing_if = "Vec::is_empty")]
    entries: Vec<EntryDoc>,

    // BTreeMap keeps the encoded binding order stable.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    bindings: BTreeMap<String, DirectiveDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryDoc {
    key: String,

    #[serde(default = "default_kind")]
    kind: ValueKind,

    #[serde(default, skip_serializing_if = "is_false")]
    optional: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<ValueDoc>,
}

fn default_kind() -> ValueKind {
    ValueKind::Str
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

// The binding union is flattened for document ergonomics: the value forms
// (literal/symbol/construct) appear directly alongside lookup/part/null.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DirectiveDoc {
    Literal(LiteralDoc),
    Symbol { key: String },
    Construct(ConstructDoc),
    Lookup { service: String },
    Part { key: String },
    Null,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ValueDoc {
    Literal(LiteralDoc),
    Symbol { key: String },
    Construct(ConstructDoc),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LiteralDoc {
    text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<ValueKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConstructDoc {
    factory: String,
    method: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    args: Vec<ValueDoc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Document ↔ model conversion
// ─────────────────────────────────────────────────────────────────────────────

impl TryFrom<ContextDoc> for ContextProfile {
    type Error = DirectiveError;

    fn try_from(doc: ContextDoc) -> Result<Self, Self::Error> {
        let entries = doc.entries.into_iter().map(EntryDescriptor::from).collect();
        let descriptor = ContextDescriptor::new(entries)?;
        let mut bindings = ContextMap::new();
        for (key, directive) in doc.bindings {
            bindings.insert(key, directive.into());
        }
        Ok(ContextProfile {
            descriptor,
            bindings,
        })
    }
}

impl From<EntryDoc> for EntryDescriptor {
    fn from(doc: EntryDoc) -> Self {
        EntryDescriptor {
            key: doc.key,
            kind: doc.kind,
            optional: doc.optional,
            default: doc.default.map(ValueDirective::from),
        }
    }
}

impl From<DirectiveDoc> for Directive {
    fn from(doc: DirectiveDoc) -> Self {
        match doc {
            DirectiveDoc::Literal(lit) => Directive::Value(ValueDoc::Literal(lit).into()),
            DirectiveDoc::Symbol { key } => Directive::Value(ValueDirective::Symbol { key }),
            DirectiveDoc::Construct(c) => Directive::Value(ValueDoc::Construct(c).into()),
            DirectiveDoc::Lookup { service } => Directive::Lookup { service },
            DirectiveDoc::Part { key } => Directive::Part { key },
            DirectiveDoc::Null => Directive::Null,
        }
    }
}

impl From<ValueDoc> for ValueDirective {
    fn from(doc: ValueDoc) -> Self {
        match doc {
            ValueDoc::Literal(lit) => ValueDirective::Literal {
                text: lit.text,
                kind: lit.kind,
            },
            ValueDoc::Symbol { key } => ValueDirective::Symbol { key },
            ValueDoc::Construct(c) => ValueDirective::Construct {
                factory: c.factory,
                method: c.method,
                args: c.args.into_iter().map(ValueDirective::from).collect(),
            },
        }
    }
}

impl From<&ContextProfile> for ContextDoc {
    fn from(profile: &ContextProfile) -> Self {
        ContextDoc {
            entries: profile
                .descriptor
                .entries()
                .iter()
                .map(EntryDoc::from)
                .collect(),
            bindings: profile
                .bindings
                .iter()
                .map(|(key, directive)| (key.to_string(), DirectiveDoc::from(directive)))
                .collect(),
        }
    }
}

impl From<&EntryDescriptor> for EntryDoc {
    fn from(entry: &EntryDescriptor) -> Self {
        EntryDoc {
            key: entry.key.clone(),
            kind: entry.kind,
            optional: entry.optional,
            default: entry.default.as_ref().map(ValueDoc::from),
        }
    }
}

impl From<&Directive> for DirectiveDoc {
    fn from(directive: &Directive) -> Self {
        match directive {
            Directive::Value(value) => match ValueDoc::from(value) {
                ValueDoc::Literal(lit) => DirectiveDoc::Literal(lit),
                ValueDoc::Symbol { key } => DirectiveDoc::Symbol { key },
                ValueDoc::Construct(c) => DirectiveDoc::Construct(c),
            },
            Directive::Lookup { service } => DirectiveDoc::Lookup {
                service: service.clone(),
            },
            Directive::Part { key } => DirectiveDoc::Part { key: key.clone() },
            Directive::Null => DirectiveDoc::Null,
        }
    }
}

impl From<&ValueDirective> for ValueDoc {
    fn from(value: &ValueDirective) -> Self {
        match value {
            ValueDirective::Literal { text, kind } => ValueDoc::Literal(LiteralDoc {
                text: text.clone(),
                kind: *kind,
            }),
            ValueDirective::Symbol { key } => ValueDoc::Symbol { key: key.clone() },
            ValueDirective::Construct {
                factory,
                method,
                args,
            } => ValueDoc::Construct(ConstructDoc {
                factory: factory.clone(),
                method: method.clone(),
                args: args.iter().map(ValueDoc::from).collect(),
            }),
        }
    }
}
