//! Integration tests for directive resolution.
//!
//! These cover the contract-level behaviors: defaults versus overrides,
//! isolation policies, service lookup, and factory-constructed values.

use std::sync::Arc;

use armature_context::directive::{ContextMap, Directive, ValueDirective};
use armature_context::entry::{ContextDescriptor, EntryDescriptor};
use armature_context::registry::{FactoryError, PartsRegistry, ValueFactory};
use armature_context::resolver::{IsolationPolicy, ResolutionError, Resolver};
use armature_context::value::{ContextValue, PartInstance, ValueKind};

// ─────────────────────────────────────────────────────────────────────────────
// Test parts and factories
// ─────────────────────────────────────────────────────────────────────────────

struct Clock {
    tick: u64,
}
impl PartInstance for Clock {}

/// Builds socket-address strings from host/port arguments.
struct AddressFactory;

impl ValueFactory for AddressFactory {
    fn construct(&self, method: &str, args: &[ContextValue]) -> Result<ContextValue, FactoryError> {
        match method {
            "join" => {
                let host = args
                    .first()
                    .and_then(ContextValue::as_str)
                    .ok_or_else(|| FactoryError::Invalid {
                        method: method.to_string(),
                        message: "first argument must be a host string".to_string(),
                    })?;
                let port = args
                    .get(1)
                    .and_then(ContextValue::as_str)
                    .ok_or_else(|| FactoryError::Invalid {
                        method: method.to_string(),
                        message: "second argument must be a port string".to_string(),
                    })?;
                Ok(ContextValue::Str(format!("{host}:{port}")))
            }
            other => Err(FactoryError::UnknownMethod {
                method: other.to_string(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults and overrides
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn optional_entry_resolves_default_then_override() {
    let descriptor = ContextDescriptor::new(vec![
        EntryDescriptor::new("port", ValueKind::Int)
            .optional()
            .with_default(ValueDirective::literal("0")),
    ])
    .unwrap();
    let registry = PartsRegistry::new();

    let unsupplied = ContextMap::new();
    let resolver = Resolver::new(&descriptor, &unsupplied, &registry);
    assert_eq!(resolver.resolve("port").unwrap(), ContextValue::Int(0));

    let supplied = ContextMap::new().with_int("port", 8080);
    let resolver = Resolver::new(&descriptor, &supplied, &registry);
    assert_eq!(resolver.resolve("port").unwrap(), ContextValue::Int(8080));
}

#[test]
fn optional_entry_without_default_resolves_null() {
    let descriptor =
        ContextDescriptor::new(vec![EntryDescriptor::new("tag", ValueKind::Str).optional()])
            .unwrap();
    let registry = PartsRegistry::new();
    let supplied = ContextMap::new();
    let resolver = Resolver::new(&descriptor, &supplied, &registry);
    assert!(resolver.resolve("tag").unwrap().is_null());
}

#[test]
fn resolve_all_visits_every_declared_entry() {
    let descriptor = ContextDescriptor::new(vec![
        EntryDescriptor::new("host", ValueKind::Str),
        EntryDescriptor::new("port", ValueKind::Int)
            .optional()
            .with_default(ValueDirective::literal("0")),
    ])
    .unwrap();
    let registry = PartsRegistry::new();
    let supplied = ContextMap::new().with_str("host", "localhost");
    let resolver = Resolver::new(&descriptor, &supplied, &registry);

    let resolved = resolver.resolve_all().unwrap();
    assert_eq!(resolved.get_str("host"), Some("localhost"));
    assert_eq!(resolved.get_int("port"), Some(0));
}

// ─────────────────────────────────────────────────────────────────────────────
// Isolation policy
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn isolated_policy_rejects_undeclared_symbols() {
    let descriptor =
        ContextDescriptor::new(vec![EntryDescriptor::new("greeting", ValueKind::Str)]).unwrap();
    let registry = PartsRegistry::new();
    let supplied = ContextMap::new()
        .with_str("greeting", "hello ${name}")
        .with_str("name", "world");

    let resolver = Resolver::new(&descriptor, &supplied, &registry);
    assert!(matches!(
        resolver.resolve("greeting"),
        Err(ResolutionError::IsolationBreach { symbol, .. }) if symbol == "name"
    ));
}

#[test]
fn open_policy_admits_supplied_symbols() {
    let descriptor =
        ContextDescriptor::new(vec![EntryDescriptor::new("greeting", ValueKind::Str)]).unwrap();
    let registry = PartsRegistry::new();
    let supplied = ContextMap::new()
        .with_str("greeting", "hello ${name}")
        .with_str("name", "world");

    let resolver =
        Resolver::new(&descriptor, &supplied, &registry).with_policy(IsolationPolicy::Open);
    assert_eq!(
        resolver.resolve("greeting").unwrap(),
        ContextValue::Str("hello world".to_string())
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Lookup and part directives
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn lookup_resolves_registered_service() {
    let descriptor =
        ContextDescriptor::new(vec![EntryDescriptor::new("clock", ValueKind::Str)]).unwrap();
    let registry = PartsRegistry::new();
    registry.register_service("armature.clock", Arc::new(Clock { tick: 9 }));
    let supplied = ContextMap::new().with(
        "clock",
        Directive::Lookup {
            service: "armature.clock".to_string(),
        },
    );

    let resolver = Resolver::new(&descriptor, &supplied, &registry);
    let value = resolver.resolve("clock").unwrap();
    let clock = value
        .as_part()
        .and_then(|p| p.downcast_ref::<Clock>())
        .expect("part should downcast");
    assert_eq!(clock.tick, 9);
}

#[test]
fn lookup_of_unknown_service_fails_with_key_and_service() {
    let descriptor =
        ContextDescriptor::new(vec![EntryDescriptor::new("clock", ValueKind::Str)]).unwrap();
    let registry = PartsRegistry::new();
    let supplied = ContextMap::new().with(
        "clock",
        Directive::Lookup {
            service: "armature.clock".to_string(),
        },
    );

    let resolver = Resolver::new(&descriptor, &supplied, &registry);
    assert!(matches!(
        resolver.resolve("clock"),
        Err(ResolutionError::UnknownService { key, service })
            if key == "clock" && service == "armature.clock"
    ));
}

#[test]
fn null_directive_resolves_null() {
    let descriptor =
        ContextDescriptor::new(vec![EntryDescriptor::new("managed", ValueKind::Str)]).unwrap();
    let registry = PartsRegistry::new();
    let supplied = ContextMap::new().with("managed", Directive::Null);
    let resolver = Resolver::new(&descriptor, &supplied, &registry);
    assert!(resolver.resolve("managed").unwrap().is_null());
}

// ─────────────────────────────────────────────────────────────────────────────
// Constructed values
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn construct_dispatches_registered_factory() {
    let descriptor = ContextDescriptor::new(vec![
        EntryDescriptor::new("host", ValueKind::Str),
        EntryDescriptor::new("address", ValueKind::Str),
    ])
    .unwrap();
    let registry = PartsRegistry::new();
    registry.register_factory("address", Arc::new(AddressFactory));

    let supplied = ContextMap::new().with_str("host", "example.org").with(
        "address",
        Directive::Value(ValueDirective::Construct {
            factory: "address".to_string(),
            method: "join".to_string(),
            args: vec![ValueDirective::symbol("host"), ValueDirective::literal("80")],
        }),
    );

    let resolver = Resolver::new(&descriptor, &supplied, &registry);
    assert_eq!(
        resolver.resolve("address").unwrap(),
        ContextValue::Str("example.org:80".to_string())
    );
}

#[test]
fn construct_with_unknown_method_reports_factory_error() {
    let descriptor =
        ContextDescriptor::new(vec![EntryDescriptor::new("address", ValueKind::Str)]).unwrap();
    let registry = PartsRegistry::new();
    registry.register_factory("address", Arc::new(AddressFactory));

    let supplied = ContextMap::new().with(
        "address",
        Directive::Value(ValueDirective::Construct {
            factory: "address".to_string(),
            method: "split".to_string(),
            args: vec![],
        }),
    );

    let resolver = Resolver::new(&descriptor, &supplied, &registry);
    assert!(matches!(
        resolver.resolve("address"),
        Err(ResolutionError::Factory { factory, .. }) if factory == "address"
    ));
}
