//! Resolved context values and part handles.

use core::fmt;
use std::sync::Arc;

use downcast_rs::{DowncastSync, impl_downcast};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// A live part (service or nested component) held behind a type-erased,
/// downcastable handle.
///
/// Implement this marker for any concrete part a registry should hand out;
/// consumers recover the concrete type via `downcast_ref`.
pub trait PartInstance: DowncastSync {}
impl_downcast!(sync PartInstance);

/// Shared handle to a registered part.
pub type PartHandle = Arc<dyn PartInstance>;

/// The primitive kinds a literal can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// UTF-8 text.
    Str,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
    /// Absolute URI.
    Uri,
}

impl ValueKind {
    /// Returns the lowercase name used in documents and diagnostics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Str => "str",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::Uri => "uri",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved context value.
#[derive(Clone)]
pub enum ContextValue {
    /// Declared absent (optional entry with no value, or a null directive).
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// Text.
    Str(String),
    /// URI.
    Uri(Url),
    /// Ordered collection of values.
    List(Vec<ContextValue>),
    /// A live part handle.
    Part(PartHandle),
}

impl ContextValue {
    /// Returns true for [`ContextValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, ContextValue::Null)
    }

    /// Returns the boolean value, if this is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ContextValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value, if this is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ContextValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float value, if this is one.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ContextValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the text value, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContextValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the URI value, if this is one.
    #[must_use]
    pub fn as_uri(&self) -> Option<&Url> {
        match self {
            ContextValue::Uri(u) => Some(u),
            _ => None,
        }
    }

    /// Returns the list items, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[ContextValue]> {
        match self {
            ContextValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the part handle, if this is a part.
    #[must_use]
    pub fn as_part(&self) -> Option<&PartHandle> {
        match self {
            ContextValue::Part(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Null => f.write_str("Null"),
            ContextValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            ContextValue::Int(i) => f.debug_tuple("Int").field(i).finish(),
            ContextValue::Float(v) => f.debug_tuple("Float").field(v).finish(),
            ContextValue::Str(s) => f.debug_tuple("Str").field(s).finish(),
            ContextValue::Uri(u) => f.debug_tuple("Uri").field(&u.as_str()).finish(),
            ContextValue::List(items) => f.debug_tuple("List").field(items).finish(),
            ContextValue::Part(_) => f.write_str("Part(..)"),
        }
    }
}

impl PartialEq for ContextValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ContextValue::Null, ContextValue::Null) => true,
            (ContextValue::Bool(a), ContextValue::Bool(b)) => a == b,
            (ContextValue::Int(a), ContextValue::Int(b)) => a == b,
            (ContextValue::Float(a), ContextValue::Float(b)) => a == b,
            (ContextValue::Str(a), ContextValue::Str(b)) => a == b,
            (ContextValue::Uri(a), ContextValue::Uri(b)) => a == b,
            (ContextValue::List(a), ContextValue::List(b)) => a == b,
            // Parts compare by identity: two handles are equal only when
            // they point at the same instance.
            (ContextValue::Part(a), ContextValue::Part(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// The resolved values for a component's declared context entries.
///
/// Produced by a full resolution pass and consumed by component factories.
#[derive(Debug, Clone, Default)]
pub struct ResolvedContext {
    values: HashMap<String, ContextValue>,
}

impl ResolvedContext {
    /// Creates an empty resolved context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a resolved value under its entry key.
    pub fn insert(&mut self, key: impl Into<String>, value: ContextValue) {
        self.values.insert(key.into(), value);
    }

    /// Returns the value for an entry key, if resolved.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    /// Returns the integer value for an entry key, if resolved as one.
    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(ContextValue::as_int)
    }

    /// Returns the text value for an entry key, if resolved as one.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ContextValue::as_str)
    }

    /// Returns the boolean value for an entry key, if resolved as one.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ContextValue::as_bool)
    }

    /// Returns the URI value for an entry key, if resolved as one.
    #[must_use]
    pub fn get_uri(&self, key: &str) -> Option<&Url> {
        self.get(key).and_then(ContextValue::as_uri)
    }

    /// Returns the number of resolved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over resolved entry keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}
