//! Integration tests for the strategy-forge system
//!
//! Exercise the extraction engine and lifecycle engine together against
//! the in-memory store and the deterministic chain double.

use approx::assert_relative_eq;
use std::collections::HashSet;
use std::sync::Arc;

use strategy_forge::chain::StaticChainClient;
use strategy_forge::composer::{compose_with, BacktestFigures};
use strategy_forge::extract;
use strategy_forge::lifecycle::{LifecycleEngine, PerformanceSample};
use strategy_forge::store::MemoryKvStore;
use strategy_forge::{StrategyResult, StrategyStatus, StrategyType};

// =============================================================================
// Test Utilities
// =============================================================================

fn figures() -> BacktestFigures {
    BacktestFigures {
        trade_count: 25,
        roi_pct: 7.5,
    }
}

fn engine_with_chain() -> (LifecycleEngine, Arc<StaticChainClient>) {
    let chain = Arc::new(StaticChainClient::with_wallet("0xintegration"));
    let engine = LifecycleEngine::new(Arc::new(MemoryKvStore::new()), chain.clone());
    (engine, chain)
}

fn sample() -> PerformanceSample {
    PerformanceSample {
        roi: -4.0,
        trade_delta: 1,
        volume_delta: 250.0,
        win_rate: 45.0,
    }
}

// =============================================================================
// Extraction
// =============================================================================

#[test]
fn test_composition_is_total_over_arbitrary_text() {
    let max_length_input = "x".repeat(500);
    let inputs = [
        "",
        "create a grid bot for BTC/USDT from $50000 to $70000 with 25 grids",
        "dca 200 usdt weekly into eth/usdt for 90 days",
        "momentum trading with $5000, sell at +15%",
        "completely unrelated sentence about the weather",
        max_length_input.as_str(),
    ];

    for text in inputs {
        let result = compose_with(text, figures());
        assert!(result.parameters.total_investment > 0.0);
        assert!(result.parameters.duration_days > 0);
        if result.parameters.strategy_type == StrategyType::Grid {
            assert!(
                result.parameters.lower_bound.unwrap() < result.parameters.upper_bound.unwrap()
            );
            assert!(result.parameters.grid_count.unwrap() >= 1);
        }
    }
}

#[test]
fn test_documented_extraction_answers() {
    assert_eq!(
        extract::extract_pair("Create a BTC/usdt grid strategy"),
        "BTC/USDT"
    );
    assert_eq!(extract::extract_pair("something with no pair"), "INJ/USDT");
    assert_eq!(
        extract::extract_investment("invest 1500 in a strategy"),
        1500.0
    );
    assert_eq!(extract::extract_investment("just trade for me"), 1000.0);
}

#[test]
fn test_full_draft_shape() {
    let draft = compose_with(
        "grid for INJ/USDT from $15 to $25, 10 grids, 1000 usdt, 30 days",
        figures(),
    );
    assert_eq!(draft.parameters.pair, "INJ/USDT");
    assert_eq!(draft.parameters.token_invested, "USDT");
    assert_eq!(draft.parameters.amount_per_order, Some(100.0));
    assert_eq!(draft.ui_layout.sections.len(), 8);
    assert_eq!(draft.contract_call.contract_name, "StrategyExecutor");
    assert_eq!(draft.follow_up_suggestions.len(), 3);
    assert!(draft.id.is_none());
    assert!(draft.status.is_none());
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_full_lifecycle_compose_deploy_refresh_stop() {
    let (engine, _) = engine_with_chain();
    let draft = compose_with("grid with 2000 usdt", figures());

    let deployed = engine.deploy(&draft).await.unwrap();
    let id = deployed.id.clone().unwrap();
    assert_eq!(deployed.status, Some(StrategyStatus::Active));
    assert_eq!(deployed.performance.as_ref().unwrap().current_value, 2000.0);

    let refreshed = engine.refresh_performance(&id, sample()).unwrap().unwrap();
    let perf = refreshed.performance.unwrap();
    assert_relative_eq!(perf.roi, -4.0);
    assert_relative_eq!(perf.pnl, -80.0);
    assert_relative_eq!(perf.current_value, 1920.0);

    engine.stop(&id).await.unwrap();
    let stored = engine
        .saved_strategies()
        .into_iter()
        .find(|s| s.id.as_deref() == Some(id.as_str()))
        .unwrap();
    assert_eq!(stored.status, Some(StrategyStatus::Stopped));

    // terminal: refresh after stop leaves performance untouched
    let after = engine.refresh_performance(&id, sample()).unwrap().unwrap();
    assert_relative_eq!(after.performance.unwrap().current_value, 1920.0);
}

#[tokio::test]
async fn test_saved_draft_reaches_active_through_activation() {
    let (engine, _) = engine_with_chain();
    let saved = engine
        .save(&compose_with("grid with 1500 usdt", figures()))
        .unwrap();

    // Plain deploy of a draft-marked record only re-enrolls it
    let enrolled = engine.deploy(&saved).await.unwrap();
    assert_eq!(enrolled.status, Some(StrategyStatus::Draft));
    assert!(enrolled.performance.is_none());

    // Activation clears the marker and performs the real deployment
    let activated = engine.activate(&saved).await.unwrap();
    assert_eq!(activated.status, Some(StrategyStatus::Active));
    let id = activated.id.clone().unwrap();
    assert!(!id.starts_with("draft-"));
    assert_relative_eq!(
        activated.performance.as_ref().unwrap().current_value,
        1500.0
    );

    // The activated record responds to refresh and stop
    let refreshed = engine.refresh_performance(&id, sample()).unwrap().unwrap();
    assert_eq!(refreshed.performance.unwrap().trade_count, 1);
    engine.stop(&id).await.unwrap();
    let stored = engine
        .saved_strategies()
        .into_iter()
        .find(|s| s.id.as_deref() == Some(id.as_str()))
        .unwrap();
    assert_eq!(stored.status, Some(StrategyStatus::Stopped));
}

#[tokio::test]
async fn test_save_delete_round_trip_preserves_length() {
    let (engine, _) = engine_with_chain();
    engine.deploy(&compose_with("grid", figures())).await.unwrap();
    let before = engine.saved_strategies().len();

    engine.save(&compose_with("dca 500 usdt", figures())).unwrap();
    assert_eq!(engine.saved_strategies().len(), before + 1);
    engine.delete(before).unwrap();
    assert_eq!(engine.saved_strategies().len(), before);
}

#[tokio::test]
async fn test_publish_and_subscribe_round_trip() {
    let (engine, _) = engine_with_chain();
    let saved = engine.save(&compose_with("rsi with $3000", figures())).unwrap();
    let id = saved.id.unwrap();

    let published = engine.publish(&id).unwrap();
    assert_eq!(published.subscribers, Some(0));
    assert_eq!(engine.published_strategies().len(), 1);

    // Another user enrolls a copy; deploy keeps it a draft
    let feed_entry = engine.published_strategies().remove(0);
    let enrolled = engine.subscribe(&feed_entry);
    let deployed = engine.deploy(&enrolled).await.unwrap();
    assert_eq!(deployed.status, Some(StrategyStatus::Draft));
    assert!(deployed.performance.is_none());
    assert!(deployed.id.unwrap().starts_with("draft-"));
}

#[tokio::test]
async fn test_failed_deploy_leaves_collection_unchanged() {
    let (engine, chain) = engine_with_chain();
    engine.save(&compose_with("grid", figures())).unwrap();
    let before = engine.saved_strategies();

    chain.fail_next_deploy();
    let result = engine.deploy(&compose_with("grid", figures())).await;
    assert!(result.is_err());
    assert_eq!(engine.saved_strategies().len(), before.len());
}

// =============================================================================
// Caller-side concurrency contract
// =============================================================================

/// The engine does not deduplicate re-entrant deploys; the calling
/// layer must keep a per-record in-flight flag. This models that guard
/// and verifies both that the guard rejects the second invocation and
/// that the engine, by design, would not.
#[tokio::test]
async fn test_double_deploy_guard_is_caller_responsibility() {
    let (engine, _) = engine_with_chain();
    let draft = compose_with("grid with 1000 usdt", figures());

    let mut in_flight: HashSet<String> = HashSet::new();
    let guard_key = "draft-being-deployed".to_string();

    // First deploy takes the guard
    assert!(in_flight.insert(guard_key.clone()));
    let first = engine.deploy(&draft).await.unwrap();

    // Re-entrant invocation while still in flight: rejected by the
    // guard before the engine is ever reached
    assert!(!in_flight.insert(guard_key.clone()));
    in_flight.remove(&guard_key);

    // Without the guard the engine happily creates a second record.
    let second = engine.deploy(&draft).await.unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(engine.saved_strategies().len(), 2);
}

// =============================================================================
// Persistence format
// =============================================================================

#[test]
fn test_persisted_records_use_camel_case_wire_format() {
    let draft = compose_with("grid", figures());
    let json = serde_json::to_value(&draft).unwrap();
    assert!(json.get("uiLayout").is_some());
    assert!(json.get("contractCall").is_some());
    assert!(json.get("deploymentWarning").is_some());
    assert!(json.get("followUpSuggestions").is_some());
    // draft-only fields stay absent rather than null
    assert!(json.get("status").is_none());
    assert!(json.get("id").is_none());
}

#[test]
fn test_records_survive_a_store_round_trip() {
    let draft = compose_with("grid from $10 to $20 with 5 grids", figures());
    let json = serde_json::to_string(&vec![draft.clone()]).unwrap();
    let back: Vec<StrategyResult> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].parameters.pair, draft.parameters.pair);
    assert_eq!(back[0].parameters.grid_count, draft.parameters.grid_count);
    assert_eq!(back[0].summary, draft.summary);
}
