//! Strategy composer
//!
//! Combines the field extractors into a complete, internally consistent
//! draft `StrategyResult`: normalized parameters, derived fields, the
//! human summary, the confirmation-screen layout, and the execution
//! call descriptor. Composition is total; it cannot fail for any input
//! text. The result is advisory and is not validated against live
//! market data.

use rand::Rng;
use serde_json::json;
use std::collections::BTreeMap;

use crate::extract::{self, PercentTriggers};
use crate::types::{
    ContractCall, RiskLevel, StrategyParameters, StrategyResult, StrategyType, UiAction,
    UiLayout, UiSection,
};

/// Simulated backtest figures woven into the feedback text.
///
/// The production path draws them from a thread rng; tests pass fixed
/// values through [`compose_with`].
#[derive(Debug, Clone, Copy)]
pub struct BacktestFigures {
    pub trade_count: u32,
    pub roi_pct: f64,
}

impl BacktestFigures {
    pub fn simulate<R: Rng>(rng: &mut R) -> Self {
        Self {
            trade_count: rng.gen_range(20..60),
            roi_pct: rng.gen_range(5.0..15.0),
        }
    }
}

/// Compose a draft strategy from free-form text
pub fn compose(text: &str) -> StrategyResult {
    let figures = BacktestFigures::simulate(&mut rand::thread_rng());
    compose_with(text, figures)
}

/// Compose with explicit backtest figures (deterministic)
pub fn compose_with(text: &str, figures: BacktestFigures) -> StrategyResult {
    let strategy_type = extract::extract_strategy_type(text);
    let pair = extract::extract_pair(text);
    let total_investment = extract::extract_investment(text);
    let triggers = extract::extract_triggers(text);
    let (lower_bound, upper_bound) = normalize_bounds(
        extract::extract_lower_bound(text),
        extract::extract_upper_bound(text),
    );
    let grid_count = extract::extract_grid_count(text);
    let duration_days = extract::extract_duration_days(text);

    // Quote side of the pair is the token actually invested
    let token_invested = pair
        .split('/')
        .nth(1)
        .unwrap_or("USDT")
        .to_string();

    let amount_per_order = (total_investment / grid_count as f64).round();
    let risk_level = classify_risk(lower_bound, upper_bound);

    let parameters = StrategyParameters {
        strategy_name: strategy_type.display_name().to_string(),
        strategy_type,
        pair,
        lower_bound: Some(lower_bound),
        upper_bound: Some(upper_bound),
        grid_count: Some(grid_count),
        total_investment,
        amount_per_order: Some(amount_per_order),
        token_invested,
        duration_days,
        risk_level,
        deploy_to_chain: true,
    };

    let summary = build_summary(&parameters, &triggers);
    let ui_layout = build_ui_layout(&parameters);
    let contract_call = build_contract_call(&parameters);
    let backtesting_feedback = build_backtest_feedback(&parameters, figures);

    StrategyResult {
        id: None,
        parameters,
        summary,
        ui_layout,
        contract_call,
        backtesting_feedback: Some(backtesting_feedback),
        deployment_warning: DEPLOYMENT_WARNING.to_string(),
        follow_up_suggestions: FOLLOW_UP_SUGGESTIONS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        status: None,
        deployed_at: None,
        tx_hash: None,
        performance: None,
        is_published: None,
        published_at: None,
        subscribers: None,
        creator: None,
    }
}

/// Bounds must satisfy lower < upper for grid strategies. Inverted
/// bounds are swapped; degenerate equal bounds fall back to the
/// documented defaults.
fn normalize_bounds(lower: f64, upper: f64) -> (f64, f64) {
    if lower < upper {
        (lower, upper)
    } else if lower > upper {
        (upper, lower)
    } else {
        (extract::DEFAULT_LOWER_BOUND, extract::DEFAULT_UPPER_BOUND)
    }
}

/// Range-width heuristic: narrow ranges stay mostly in position, wide
/// ranges expose more of the capital to price swings. A proxy for
/// volatility exposure, not a risk model.
pub fn classify_risk(lower_bound: f64, upper_bound: f64) -> RiskLevel {
    // A zero lower bound is an unbounded-downside range
    if lower_bound <= 0.0 {
        return RiskLevel::High;
    }
    let range_pct = (upper_bound - lower_bound) / lower_bound * 100.0;
    if range_pct < 20.0 {
        RiskLevel::Low
    } else if range_pct > 50.0 {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    }
}

const DEPLOYMENT_WARNING: &str = "⚠️ Once deployed, your strategy will run automatically on-chain using your wallet's authorized funds. Please double-check your parameters. Use at your own risk.";

const FOLLOW_UP_SUGGESTIONS: [&str; 3] = [
    "Save this strategy as a template?",
    "Make this strategy public for others to subscribe to?",
    "Auto-close the strategy when ROI hits a threshold?",
];

fn build_summary(params: &StrategyParameters, triggers: &PercentTriggers) -> String {
    let lower = params.lower_bound.unwrap_or_default();
    let upper = params.upper_bound.unwrap_or_default();
    let grids = params.grid_count.unwrap_or_default();
    let per_order = params.amount_per_order.unwrap_or_default();

    match params.strategy_type {
        StrategyType::Grid => {
            let mut summary = format!(
                "You're creating a grid trading strategy for {}. It will split the {}-{} range into {} equal price levels. When the price drops or rises by one level, the strategy will automatically place a buy or sell order of {} {}. The strategy will manage a total of {} {} over {} days.",
                params.pair,
                lower,
                upper,
                grids,
                per_order,
                params.token_invested,
                params.total_investment,
                params.token_invested,
                params.duration_days,
            );
            if let Some(clause) = trigger_clause(triggers) {
                summary.push_str(&format!(" Additional triggers: {clause}."));
            }
            summary
        }
        StrategyType::Dca => format!(
            "You're creating a Dollar-Cost Averaging strategy for {}. It will automatically invest {} {} at regular intervals over {} days, for a total investment of {} {}.",
            params.pair,
            per_order,
            params.token_invested,
            params.duration_days,
            params.total_investment,
            params.token_invested,
        ),
        _ => {
            let mut summary = format!(
                "You're creating a {} for {} with a total investment of {} {} over {} days.",
                params.strategy_name,
                params.pair,
                params.total_investment,
                params.token_invested,
                params.duration_days,
            );
            if let Some(clause) = trigger_clause(triggers) {
                summary.push_str(&format!(" Triggers: {clause}."));
            }
            summary
        }
    }
}

fn trigger_clause(triggers: &PercentTriggers) -> Option<String> {
    match (triggers.buy, triggers.sell) {
        (Some(buy), Some(sell)) => Some(format!(
            "Buy when price drops {buy}%, Sell when price rises {sell}%"
        )),
        (Some(buy), None) => Some(format!("Buy when price drops {buy}%")),
        (None, Some(sell)) => Some(format!("Sell when price rises {sell}%")),
        (None, None) => None,
    }
}

fn build_ui_layout(params: &StrategyParameters) -> UiLayout {
    let section = |title: &str, value: String| UiSection {
        title: title.to_string(),
        value,
    };

    UiLayout {
        page_title: "Confirm Strategy Deployment".to_string(),
        sections: vec![
            section("Pair", params.pair.clone()),
            section("Type", params.strategy_name.clone()),
            section(
                "Range",
                format!(
                    "${} - ${}",
                    params.lower_bound.unwrap_or_default(),
                    params.upper_bound.unwrap_or_default()
                ),
            ),
            section("Grids", params.grid_count.unwrap_or_default().to_string()),
            section(
                "Amount Per Order",
                format!(
                    "{} {}",
                    params.amount_per_order.unwrap_or_default(),
                    params.token_invested
                ),
            ),
            section(
                "Total Investment",
                format!("{} {}", params.total_investment, params.token_invested),
            ),
            section("Duration", format!("{} days", params.duration_days)),
            section("Risk Level", params.risk_level.label().to_string()),
        ],
        actions: vec![
            UiAction {
                label: "Deploy Strategy".to_string(),
                action: "send_transaction".to_string(),
            },
            UiAction {
                label: "Edit".to_string(),
                action: "go_back".to_string(),
            },
        ],
    }
}

fn build_contract_call(params: &StrategyParameters) -> ContractCall {
    let mut call_params = BTreeMap::new();
    call_params.insert("pair".to_string(), json!(params.pair));
    call_params.insert("type".to_string(), json!(params.strategy_type.wire_name()));
    call_params.insert("low".to_string(), json!(params.lower_bound));
    call_params.insert("high".to_string(), json!(params.upper_bound));
    call_params.insert("grids".to_string(), json!(params.grid_count));
    call_params.insert("totalCapital".to_string(), json!(params.total_investment));
    call_params.insert("orderSize".to_string(), json!(params.amount_per_order));
    call_params.insert("duration".to_string(), json!(params.duration_days));

    ContractCall {
        contract_name: "StrategyExecutor".to_string(),
        method: "deployStrategy".to_string(),
        params: call_params,
    }
}

fn build_backtest_feedback(params: &StrategyParameters, figures: BacktestFigures) -> String {
    let lower = params.lower_bound.unwrap_or_default();
    let upper = params.upper_bound.unwrap_or_default();
    format!(
        "Simulated over the past 30 days, {} ranged between ${:.1} and ${:.1}. This {} strategy would have executed {} trades and yielded an estimated ROI of +{:.1}%. Note: Past performance is not indicative of future results.",
        params.pair,
        lower * 1.08,
        upper * 0.99,
        params.strategy_type.wire_name(),
        figures.trade_count,
        figures.roi_pct,
    )
}
