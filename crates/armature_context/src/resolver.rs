//! Directive resolution against a supplied context map.
//!
//! Resolution answers: for a declared entry, what concrete value does this
//! deployment produce? The supplied [`ContextMap`] wins, the declared
//! default is used otherwise, and an optional entry with neither resolves
//! to null. Required entries with neither fail — nothing defaults silently.

use url::Url;

use crate::directive::{ContextMap, Directive, ValueDirective};
use crate::entry::ContextDescriptor;
use crate::registry::{FactoryError, PartsRegistry};
use crate::value::{ContextValue, ResolvedContext, ValueKind};

/// Whether symbolic resolution may escape the declared entry set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IsolationPolicy {
    /// `${key}` references must name declared entries.
    #[default]
    Isolated,
    /// `${key}` references may also name keys supplied only at deployment.
    Open,
}

/// Errors raised during directive resolution.
///
/// Every variant carries the entry key under resolution; the variant
/// itself identifies the attempted directive kind.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    /// The key names no declared entry.
    #[error("context entry '{key}' is not declared")]
    Undeclared {
        /// The unknown key.
        key: String,
    },

    /// A required entry has neither a supplied value nor a default.
    #[error("no value supplied for required context entry '{key}'")]
    Missing {
        /// The unsatisfied key.
        key: String,
    },

    /// Literal text did not coerce to the target kind.
    #[error("cannot coerce '{text}' into {kind} for context entry '{key}'")]
    Coercion {
        /// The entry under resolution.
        key: String,
        /// The coercion target.
        kind: ValueKind,
        /// The offending text.
        text: String,
    },

    /// An isolated context rejected a symbolic reference to an undeclared key.
    #[error("symbolic reference '${{{symbol}}}' in entry '{key}' escapes the declared context")]
    IsolationBreach {
        /// The entry under resolution.
        key: String,
        /// The escaping symbol.
        symbol: String,
    },

    /// A referenced value cannot be rendered into literal text.
    #[error("value of '${{{symbol}}}' cannot be rendered into text for entry '{key}'")]
    Unrenderable {
        /// The entry under resolution.
        key: String,
        /// The referenced symbol.
        symbol: String,
    },

    /// A lookup directive named a service with no registered implementation.
    #[error("lookup directive on entry '{key}' names unknown service '{service}'")]
    UnknownService {
        /// The entry under resolution.
        key: String,
        /// The unknown service name.
        service: String,
    },

    /// A part directive named an unregistered part.
    #[error("part directive on entry '{key}' names unknown part '{part}'")]
    UnknownPart {
        /// The entry under resolution.
        key: String,
        /// The unknown part key.
        part: String,
    },

    /// A construct directive named an unregistered factory.
    #[error("construct directive on entry '{key}' names unknown factory '{factory}'")]
    UnknownFactory {
        /// The entry under resolution.
        key: String,
        /// The unknown factory name.
        factory: String,
    },

    /// A value factory failed.
    #[error("factory '{factory}' failed for entry '{key}': {source}")]
    Factory {
        /// The entry under resolution.
        key: String,
        /// The invoked factory.
        factory: String,
        /// The factory's report.
        #[source]
        source: FactoryError,
    },

    /// Symbolic references form a cycle.
    #[error("directive cycle detected while resolving entry '{key}'")]
    Cycle {
        /// The key closing the cycle.
        key: String,
    },
}

/// Resolves declared entries against a supplied context map, a parts
/// registry, and an isolation policy.
#[derive(Debug)]
pub struct Resolver<'a> {
    descriptor: &'a ContextDescriptor,
    supplied: &'a ContextMap,
    registry: &'a PartsRegistry,
    policy: IsolationPolicy,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver with the default (isolated) policy.
    #[must_use]
    pub fn new(
        descriptor: &'a ContextDescriptor,
        supplied: &'a ContextMap,
        registry: &'a PartsRegistry,
    ) -> Self {
        Self {
            descriptor,
            supplied,
            registry,
            policy: IsolationPolicy::default(),
        }
    }

    /// Overrides the isolation policy.
    #[must_use]
    pub fn with_policy(mut self, policy: IsolationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolves one declared entry.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] carrying the entry key and the
    /// attempted directive kind.
    pub fn resolve(&self, key: &str) -> Result<ContextValue, ResolutionError> {
        let mut stack = Vec::new();
        self.resolve_entry(key, &mut stack)
    }

    /// Resolves every declared entry, in declaration order.
    ///
    /// # Errors
    ///
    /// Fails on the first entry that does not resolve.
    pub fn resolve_all(&self) -> Result<ResolvedContext, ResolutionError> {
        let mut resolved = ResolvedContext::new();
        for entry in self.descriptor.entries() {
            let value = self.resolve(&entry.key)?;
            resolved.insert(entry.key.clone(), value);
        }
        Ok(resolved)
    }

    fn resolve_entry(
        &self,
        key: &str,
        stack: &mut Vec<String>,
    ) -> Result<ContextValue, ResolutionError> {
        let entry = self
            .descriptor
            .entry(key)
            .ok_or_else(|| ResolutionError::Undeclared { key: key.into() })?;
        if stack.iter().any(|frame| frame == key) {
            return Err(ResolutionError::Cycle { key: key.into() });
        }
        stack.push(key.to_string());

        let result = if let Some(directive) = self.supplied.get(key) {
            self.resolve_directive(key, directive, entry.kind, stack)
        } else if let Some(default) = &entry.default {
            self.resolve_value(key, default, entry.kind, stack)
        } else if entry.optional {
            Ok(ContextValue::Null)
        } else {
            Err(ResolutionError::Missing { key: key.into() })
        };

        stack.pop();
        result
    }

    fn resolve_directive(
        &self,
        key: &str,
        directive: &Directive,
        target: ValueKind,
        stack: &mut Vec<String>,
    ) -> Result<ContextValue, ResolutionError> {
        match directive {
            Directive::Null => Ok(ContextValue::Null),
            Directive::Value(value) => self.resolve_value(key, value, target, stack),
            Directive::Lookup { service } => self
                .registry
                .service(service)
                .map(ContextValue::Part)
                .ok_or_else(|| ResolutionError::UnknownService {
                    key: key.into(),
                    service: service.clone(),
                }),
            Directive::Part { key: part } => self
                .registry
                .part(part)
                .map(ContextValue::Part)
                .ok_or_else(|| ResolutionError::UnknownPart {
                    key: key.into(),
                    part: part.clone(),
                }),
        }
    }

    fn resolve_value(
        &self,
        key: &str,
        value: &ValueDirective,
        target: ValueKind,
        stack: &mut Vec<String>,
    ) -> Result<ContextValue, ResolutionError> {
        match value {
            ValueDirective::Literal { text, kind } => {
                let kind = kind.unwrap_or(target);
                let text = self.interpolate(key, text, stack)?;
                coerce(key, kind, &text)
            }
            ValueDirective::Symbol { key: symbol } => self.resolve_symbol(key, symbol, stack),
            ValueDirective::Construct {
                factory,
                method,
                args,
            } => {
                let Some(instance) = self.registry.factory(factory) else {
                    return Err(ResolutionError::UnknownFactory {
                        key: key.into(),
                        factory: factory.clone(),
                    });
                };
                let mut resolved = Vec::with_capacity(args.len());
                for arg in args {
                    // Arguments without an explicit kind stay textual.
                    resolved.push(self.resolve_value(key, arg, ValueKind::Str, stack)?);
                }
                instance
                    .construct(method, &resolved)
                    .map_err(|source| ResolutionError::Factory {
                        key: key.into(),
                        factory: factory.clone(),
                        source,
                    })
            }
        }
    }

    fn resolve_symbol(
        &self,
        key: &str,
        symbol: &str,
        stack: &mut Vec<String>,
    ) -> Result<ContextValue, ResolutionError> {
        if self.descriptor.is_declared(symbol) {
            return self.resolve_entry(symbol, stack);
        }
        match self.policy {
            IsolationPolicy::Isolated => Err(ResolutionError::IsolationBreach {
                key: key.into(),
                symbol: symbol.into(),
            }),
            IsolationPolicy::Open => {
                let Some(directive) = self.supplied.get(symbol) else {
                    return Err(ResolutionError::Missing { key: symbol.into() });
                };
                if stack.iter().any(|frame| frame == symbol) {
                    return Err(ResolutionError::Cycle { key: symbol.into() });
                }
                stack.push(symbol.to_string());
                let result = self.resolve_directive(symbol, directive, ValueKind::Str, stack);
                stack.pop();
                result
            }
        }
    }

    /// Expands `${name}` occurrences in literal text.
    fn interpolate(
        &self,
        key: &str,
        text: &str,
        stack: &mut Vec<String>,
    ) -> Result<String, ResolutionError> {
        if !text.contains("${") {
            return Ok(text.to_string());
        }
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let tail = &rest[start + 2..];
            let Some(end) = tail.find('}') else {
                // No closing brace: keep the remainder verbatim.
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            let symbol = &tail[..end];
            let value = self.resolve_symbol(key, symbol, stack)?;
            out.push_str(&render(key, symbol, &value)?);
            rest = &tail[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Renders a resolved value back into literal text for interpolation.
fn render(key: &str, symbol: &str, value: &ContextValue) -> Result<String, ResolutionError> {
    match value {
        ContextValue::Bool(b) => Ok(b.to_string()),
        ContextValue::Int(i) => Ok(i.to_string()),
        ContextValue::Float(f) => Ok(f.to_string()),
        ContextValue::Str(s) => Ok(s.clone()),
        ContextValue::Uri(u) => Ok(u.as_str().to_string()),
        ContextValue::Null | ContextValue::List(_) | ContextValue::Part(_) => {
            Err(ResolutionError::Unrenderable {
                key: key.into(),
                symbol: symbol.into(),
            })
        }
    }
}

/// Coerces literal text into the target kind.
fn coerce(key: &str, kind: ValueKind, text: &str) -> Result<ContextValue, ResolutionError> {
    let fail = || ResolutionError::Coercion {
        key: key.into(),
        kind,
        text: text.into(),
    };
    match kind {
        ValueKind::Str => Ok(ContextValue::Str(text.to_string())),
        ValueKind::Int => text
            .trim()
            .parse::<i64>()
            .map(ContextValue::Int)
            .map_err(|_| fail()),
        ValueKind::Float => text
            .trim()
            .parse::<f64>()
            .map(ContextValue::Float)
            .map_err(|_| fail()),
        ValueKind::Bool => text
            .trim()
            .parse::<bool>()
            .map(ContextValue::Bool)
            .map_err(|_| fail()),
        ValueKind::Uri => Url::parse(text.trim())
            .map(ContextValue::Uri)
            .map_err(|_| fail()),
    }
}
