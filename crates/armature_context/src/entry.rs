//! Context entry declarations.
//!
//! A [`ContextDescriptor`] is the component-type side of the contract: the
//! entries a component declares, each with a kind, an optionality flag, and
//! an optional default. Duplicate keys are a build-time error — they are
//! never deferred to resolution time.

use crate::directive::ValueDirective;
use crate::value::ValueKind;

use hashbrown::HashSet;

/// Errors raised while building or decoding a context descriptor.
#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    /// Two entries in one descriptor share a key.
    #[error("duplicate context entry key '{key}'")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },

    /// The context document could not be decoded.
    #[error("malformed context document: {0}")]
    Malformed(#[from] toml::de::Error),

    /// The context could not be encoded back to document form.
    #[error("failed to encode context document: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Declaration of a single context entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    /// The entry key.
    pub key: String,
    /// The kind literal values coerce to.
    pub kind: ValueKind,
    /// Whether the entry may be left unsupplied.
    pub optional: bool,
    /// Default value used when the entry is optional and unsupplied.
    pub default: Option<ValueDirective>,
}

impl EntryDescriptor {
    /// Declares a required entry of the given kind.
    #[must_use]
    pub fn new(key: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            key: key.into(),
            kind,
            optional: false,
            default: None,
        }
    }

    /// Marks the entry optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Declares a default, used only when no override is supplied.
    #[must_use]
    pub fn with_default(mut self, default: ValueDirective) -> Self {
        self.default = Some(default);
        self
    }
}

/// The ordered set of entries a component declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextDescriptor {
    entries: Vec<EntryDescriptor>,
}

impl ContextDescriptor {
    /// Builds a descriptor, rejecting duplicate keys.
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError::DuplicateKey`] naming the first repeated
    /// key.
    pub fn new(entries: Vec<EntryDescriptor>) -> Result<Self, DirectiveError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.key.as_str()) {
                return Err(DirectiveError::DuplicateKey {
                    key: entry.key.clone(),
                });
            }
        }
        drop(seen);
        Ok(Self { entries })
    }

    /// Returns the declared entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[EntryDescriptor] {
        &self.entries
    }

    /// Returns the declaration for a key, if any.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&EntryDescriptor> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Returns true when the key is declared.
    #[must_use]
    pub fn is_declared(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keys_rejected_at_build_time() {
        let err = ContextDescriptor::new(vec![
            EntryDescriptor::new("port", ValueKind::Int),
            EntryDescriptor::new("port", ValueKind::Str),
        ])
        .unwrap_err();
        assert!(matches!(err, DirectiveError::DuplicateKey { key } if key == "port"));
    }

    #[test]
    fn lookup_by_key() {
        let descriptor = ContextDescriptor::new(vec![
            EntryDescriptor::new("host", ValueKind::Str),
            EntryDescriptor::new("port", ValueKind::Int).optional(),
        ])
        .unwrap();
        assert!(descriptor.is_declared("host"));
        assert!(descriptor.entry("port").unwrap().optional);
        assert!(!descriptor.is_declared("ghost"));
    }
}
