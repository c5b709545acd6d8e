//! Tests for component strategies and lifestyle providers.
//!
//! These verify the instance-sharing contracts: singleton identity,
//! transient freshness, per-thread isolation, and context-wired
//! construction.

mod test_utils;

use std::sync::Arc;

use armature_context::directive::{ContextMap, ValueDirective};
use armature_context::entry::{ContextDescriptor, EntryDescriptor};
use armature_context::registry::PartsRegistry;
use armature_context::schema::ContextProfile;
use armature_context::value::ValueKind;
use armature_runtime::strategy::{
    ComponentModel, ComponentStrategy, ConstructionFault, Lifestyle, StrategyError,
};
use armature_state::graph::StateGraph;
use armature_state::state::State;

use test_utils::{Constructions, Counted, LIFECYCLE_DOC, Recorder, invocation_log, invoked, load_fixture};

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

fn empty_graph() -> Arc<StateGraph> {
    Arc::new(StateGraph::new(State::new("root")).unwrap())
}

fn counting_strategy(lifestyle: Lifestyle) -> (ComponentStrategy, Constructions) {
    let constructions = Constructions::default();
    let counter = constructions.clone();
    let model = ComponentModel::new("counted", lifestyle, empty_graph(), ContextProfile::default());
    let strategy = ComponentStrategy::new(
        model,
        Arc::new(PartsRegistry::new()),
        Arc::new(move |_| {
            counter.bump();
            Ok(Box::new(Counted))
        }),
    );
    (strategy, constructions)
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifestyle contracts
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn singleton_shares_one_instance() {
    let (strategy, constructions) = counting_strategy(Lifestyle::Singleton);

    let first = strategy.get().unwrap();
    let second = strategy.get().unwrap();

    assert!(first.shares_instance(&second));
    assert_eq!(constructions.count(), 1);
}

#[test]
fn transient_commissions_fresh_instances() {
    let (strategy, constructions) = counting_strategy(Lifestyle::Transient);

    let first = strategy.get().unwrap();
    let second = strategy.get().unwrap();

    assert!(!first.shares_instance(&second));
    assert_eq!(constructions.count(), 2);
}

#[test]
fn thread_lifestyle_isolates_per_thread() {
    let (strategy, constructions) = counting_strategy(Lifestyle::Thread);
    let strategy = Arc::new(strategy);

    let local_a = strategy.get().unwrap();
    let local_b = strategy.get().unwrap();
    assert!(local_a.shares_instance(&local_b));
    assert_eq!(constructions.count(), 1);

    let remote_strategy = Arc::clone(&strategy);
    let shared_with_remote = std::thread::spawn(move || {
        let remote = remote_strategy.get().unwrap();
        remote.shares_instance(&local_b)
    })
    .join()
    .unwrap();

    assert!(!shared_with_remote);
    assert_eq!(constructions.count(), 2);
}

#[test]
fn decommission_evicts_the_singleton() {
    let (strategy, constructions) = counting_strategy(Lifestyle::Singleton);

    let first = strategy.get().unwrap();
    strategy.decommission(&first).unwrap();

    let second = strategy.get().unwrap();
    assert!(!first.shares_instance(&second));
    assert_eq!(constructions.count(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Commissioning
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn commissioning_runs_initialization_triggers() {
    let log = invocation_log();
    let factory_log = log.clone();
    let model = ComponentModel::new(
        "widget",
        Lifestyle::Singleton,
        load_fixture(LIFECYCLE_DOC),
        ContextProfile::default(),
    );
    let strategy = ComponentStrategy::new(
        model,
        Arc::new(PartsRegistry::new()),
        Arc::new(move |_| Ok(Box::new(Recorder::new(factory_log.clone())))),
    );

    let handle = strategy.get().unwrap();

    assert_eq!(invoked(&log), vec!["start"]);
    assert_eq!(handle.lock().state().name, "started");
}

#[test]
fn decommission_runs_termination_triggers() {
    let log = invocation_log();
    let factory_log = log.clone();
    let model = ComponentModel::new(
        "widget",
        Lifestyle::Singleton,
        load_fixture(LIFECYCLE_DOC),
        ContextProfile::default(),
    );
    let strategy = ComponentStrategy::new(
        model,
        Arc::new(PartsRegistry::new()),
        Arc::new(move |_| Ok(Box::new(Recorder::new(factory_log.clone())))),
    );

    let handle = strategy.get().unwrap();
    strategy.decommission(&handle).unwrap();

    assert_eq!(invoked(&log), vec!["start", "stop"]);
    assert_eq!(handle.lock().state().name, "stopped");
}

#[test]
fn context_values_reach_the_factory() {
    let descriptor = ContextDescriptor::new(vec![
        EntryDescriptor::new("port", ValueKind::Int)
            .optional()
            .with_default(ValueDirective::literal("0")),
    ])
    .unwrap();
    let bindings = ContextMap::new().with_int("port", 8080);
    let profile = ContextProfile::new(descriptor, bindings);

    let model = ComponentModel::new("server", Lifestyle::Transient, empty_graph(), profile);
    let strategy = ComponentStrategy::new(
        model,
        Arc::new(PartsRegistry::new()),
        Arc::new(|resolved| {
            let port = resolved
                .get_int("port")
                .ok_or_else(|| ConstructionFault::new("port must resolve to an int"))?;
            assert_eq!(port, 8080);
            Ok(Box::new(Counted))
        }),
    );

    strategy.get().expect("context-wired commissioning succeeds");
}

#[test]
fn missing_required_entry_surfaces_component_name() {
    let descriptor =
        ContextDescriptor::new(vec![EntryDescriptor::new("host", ValueKind::Str)]).unwrap();
    let profile = ContextProfile::new(descriptor, ContextMap::new());

    let model = ComponentModel::new("server", Lifestyle::Transient, empty_graph(), profile);
    let strategy = ComponentStrategy::new(
        model,
        Arc::new(PartsRegistry::new()),
        Arc::new(|_| Ok(Box::new(Counted))),
    );

    let err = strategy.get().unwrap_err();
    let StrategyError::Resolution { component, .. } = err else {
        panic!("expected Resolution, got {err:?}");
    };
    assert_eq!(component, "server");
}

#[test]
fn construction_failure_is_wrapped() {
    let model = ComponentModel::new(
        "flaky",
        Lifestyle::Transient,
        empty_graph(),
        ContextProfile::default(),
    );
    let strategy = ComponentStrategy::new(
        model,
        Arc::new(PartsRegistry::new()),
        Arc::new(|_| Err(ConstructionFault::new("no capacity"))),
    );

    let err = strategy.get().unwrap_err();
    assert!(matches!(
        err,
        StrategyError::Construction { component, .. } if component == "flaky"
    ));
}
