//! Directives: declarative descriptions of how to produce a context value.
//!
//! A [`Directive`] is the closed tagged union replacing the original deep
//! interface hierarchy: a value is produced from a literal/symbolic/
//! constructed description, looked up by service name, taken from a named
//! part, or declared managed-elsewhere (`Null`).

use core::fmt;

use hashbrown::HashMap;
use url::Url;

use crate::value::ValueKind;

/// How a single context value is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Produce the value from a literal/symbolic/constructed description.
    Value(ValueDirective),
    /// Resolve a live part by service name against the parts registry.
    Lookup {
        /// The service name to look up.
        service: String,
    },
    /// Resolve a named part registered under the given key.
    Part {
        /// The part key.
        key: String,
    },
    /// The value is managed elsewhere; resolves to null.
    Null,
}

impl Directive {
    /// Shorthand for a plain literal value directive.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Directive::Value(ValueDirective::literal(text))
    }

    /// Returns the directive kind for diagnostics.
    #[must_use]
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::Value(_) => DirectiveKind::Value,
            Directive::Lookup { .. } => DirectiveKind::Lookup,
            Directive::Part { .. } => DirectiveKind::Part,
            Directive::Null => DirectiveKind::Null,
        }
    }
}

/// Discriminant of a [`Directive`], carried by resolution errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// A value directive.
    Value,
    /// A service lookup.
    Lookup,
    /// A named part reference.
    Part,
    /// A null marker.
    Null,
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DirectiveKind::Value => "value",
            DirectiveKind::Lookup => "lookup",
            DirectiveKind::Part => "part",
            DirectiveKind::Null => "null",
        };
        f.write_str(name)
    }
}

/// How a plain (non-part) value is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueDirective {
    /// A literal, coerced to its own declared kind or to the entry's kind.
    ///
    /// Literal text may embed `${key}` references; each is resolved per the
    /// isolation policy before coercion.
    Literal {
        /// The literal text.
        text: String,
        /// Coercion target; defaults to the declaring entry's kind.
        kind: Option<ValueKind>,
    },
    /// A `${key}`-style reference to another context entry.
    Symbol {
        /// The referenced entry key.
        key: String,
    },
    /// A named factory invocation with resolved arguments.
    Construct {
        /// Name of the registered value factory.
        factory: String,
        /// Factory method to invoke.
        method: String,
        /// Argument directives, resolved before invocation.
        args: Vec<ValueDirective>,
    },
}

impl ValueDirective {
    /// A plain literal with no explicit kind.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        ValueDirective::Literal {
            text: text.into(),
            kind: None,
        }
    }

    /// A literal with an explicit coercion kind.
    #[must_use]
    pub fn literal_of(kind: ValueKind, text: impl Into<String>) -> Self {
        ValueDirective::Literal {
            text: text.into(),
            kind: Some(kind),
        }
    }

    /// A symbolic reference to another entry.
    #[must_use]
    pub fn symbol(key: impl Into<String>) -> Self {
        ValueDirective::Symbol { key: key.into() }
    }
}

/// The supplied context map: entry key to directive.
///
/// This is the deployment-side input to resolution; entries not present
/// here fall back to their declared defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextMap {
    entries: HashMap<String, Directive>,
}

impl ContextMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a directive for an entry key, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, directive: Directive) {
        self.entries.insert(key.into(), directive);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, directive: Directive) -> Self {
        self.insert(key, directive);
        self
    }

    /// Supplies a literal text value for an entry key.
    #[must_use]
    pub fn with_str(self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.with(key, Directive::literal(text))
    }

    /// Supplies an integer value for an entry key.
    #[must_use]
    pub fn with_int(self, key: impl Into<String>, value: i64) -> Self {
        self.with(
            key,
            Directive::Value(ValueDirective::literal_of(ValueKind::Int, value.to_string())),
        )
    }

    /// Supplies a boolean value for an entry key.
    #[must_use]
    pub fn with_bool(self, key: impl Into<String>, value: bool) -> Self {
        self.with(
            key,
            Directive::Value(ValueDirective::literal_of(
                ValueKind::Bool,
                value.to_string(),
            )),
        )
    }

    /// Supplies a URI value for an entry key.
    #[must_use]
    pub fn with_uri(self, key: impl Into<String>, uri: &Url) -> Self {
        self.with(
            key,
            Directive::Value(ValueDirective::literal_of(ValueKind::Uri, uri.as_str())),
        )
    }

    /// Returns the directive supplied for an entry key, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Directive> {
        self.entries.get(key)
    }

    /// Returns true when a directive was supplied for the key.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates over supplied keys and directives.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Directive)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of supplied directives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_kinds() {
        assert_eq!(Directive::literal("x").kind(), DirectiveKind::Value);
        assert_eq!(
            Directive::Lookup {
                service: "svc".into()
            }
            .kind(),
            DirectiveKind::Lookup
        );
        assert_eq!(Directive::Null.kind(), DirectiveKind::Null);
        assert_eq!(format!("{}", DirectiveKind::Lookup), "lookup");
    }

    #[test]
    fn context_map_conveniences() {
        let map = ContextMap::new().with_int("port", 8080).with_str("host", "localhost");
        assert!(map.contains("port"));
        assert_eq!(map.len(), 2);
        let Some(Directive::Value(ValueDirective::Literal { text, kind })) = map.get("port") else {
            panic!("expected literal directive");
        };
        assert_eq!(text, "8080");
        assert_eq!(*kind, Some(ValueKind::Int));
    }
}
