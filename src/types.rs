//! Core data types used across the strategy system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by lifecycle operations.
///
/// Extraction and composition never fail; everything here originates
/// from the persistence or chain collaborators, or from a caller
/// referencing a record that does not exist.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Strategy not found")]
    StrategyNotFound,

    #[error("deployment failed: {0}")]
    DeploymentFailed(String),

    #[error("stop failed: {0}")]
    StopFailed(String),

    #[error("persistence failure: {0}")]
    Store(#[from] StoreError),
}

/// Supported strategy families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    Grid,
    Dca,
    MaCross,
    Rsi,
    Momentum,
}

impl StrategyType {
    /// Human-readable strategy name shown in summaries and the UI
    pub fn display_name(&self) -> &'static str {
        match self {
            StrategyType::Grid => "Grid Trading",
            StrategyType::Dca => "Dollar-Cost Averaging",
            StrategyType::MaCross => "Moving Average Crossover",
            StrategyType::Rsi => "RSI Strategy",
            StrategyType::Momentum => "Momentum Strategy",
        }
    }

    /// Wire name used in contract call params
    pub fn wire_name(&self) -> &'static str {
        match self {
            StrategyType::Grid => "grid",
            StrategyType::Dca => "dca",
            StrategyType::MaCross => "ma_cross",
            StrategyType::Rsi => "rsi",
            StrategyType::Momentum => "momentum",
        }
    }
}

/// Risk classification derived from the configured price range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Lifecycle status of a persisted strategy.
///
/// `Paused` is a declared status value with no producing transition in
/// the current engine; it exists only so that persisted records using
/// it remain deserializable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyStatus {
    Draft,
    Active,
    Paused,
    Stopped,
}

/// Normalized configuration of a strategy, produced by the composer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyParameters {
    pub strategy_name: String,
    pub strategy_type: StrategyType,
    /// Trading pair in `BASE/QUOTE` form, upper case
    pub pair: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_count: Option<u32>,
    pub total_investment: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_per_order: Option<f64>,
    /// Quote asset of the pair; the token actually committed
    pub token_invested: String,
    pub duration_days: u32,
    pub risk_level: RiskLevel,
    pub deploy_to_chain: bool,
}

/// One labeled row in the confirmation screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSection {
    pub title: String,
    pub value: String,
}

/// One actionable button in the confirmation screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiAction {
    pub label: String,
    pub action: String,
}

/// Declarative description of the strategy confirmation screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiLayout {
    pub page_title: String,
    pub sections: Vec<UiSection>,
    pub actions: Vec<UiAction>,
}

/// Execution-call descriptor handed to the chain backend.
///
/// Params keep the contract ABI's camelCase key names; a BTreeMap keeps
/// serialization order deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractCall {
    pub contract_name: String,
    pub method: String,
    pub params: BTreeMap<String, serde_json::Value>,
}

/// Mutable performance snapshot of an active strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyPerformance {
    /// Return on investment, percent
    pub roi: f64,
    /// Cumulative executed trades, monotonically non-decreasing
    pub trade_count: u64,
    /// Cumulative traded volume, monotonically non-decreasing
    pub total_volume: f64,
    /// Winning trade ratio, percent
    pub win_rate: f64,
    pub current_value: f64,
    pub pnl: f64,
    pub last_updated: DateTime<Utc>,
}

impl StrategyPerformance {
    /// Baseline snapshot initialized at deployment time
    pub fn zeroed(total_investment: f64, now: DateTime<Utc>) -> Self {
        Self {
            roi: 0.0,
            trade_count: 0,
            total_volume: 0.0,
            win_rate: 0.0,
            current_value: total_investment,
            pnl: 0.0,
            last_updated: now,
        }
    }
}

/// The full artifact produced for a single user request.
///
/// Field names serialize in camelCase to stay wire-compatible with the
/// persisted collection format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResult {
    /// Assigned on save or deploy, never at draft time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub parameters: StrategyParameters,
    pub summary: String,
    pub ui_layout: UiLayout,
    pub contract_call: ContractCall,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtesting_feedback: Option<String>,
    pub deployment_warning: String,
    pub follow_up_suggestions: Vec<String>,
    /// Absent means draft
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StrategyStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<StrategyPerformance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
}

impl StrategyResult {
    /// Effective lifecycle status; an absent status means draft
    pub fn status_or_draft(&self) -> StrategyStatus {
        self.status.unwrap_or(StrategyStatus::Draft)
    }

    /// True when the record explicitly carries draft status, which is
    /// how strategies subscribed from the marketplace arrive at deploy
    pub fn is_marked_draft(&self) -> bool {
        self.status == Some(StrategyStatus::Draft)
    }

    pub fn is_published(&self) -> bool {
        self.is_published.unwrap_or(false)
    }
}

/// Per-wallet profile, persisted alongside the strategy collections
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub wallet_address: String,
    pub total_strategies: u64,
    pub active_strategies: u64,
    pub total_returns: f64,
    pub total_volume: f64,
    pub joined_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(wallet_address: String, now: DateTime<Utc>) -> Self {
        Self {
            wallet_address,
            total_strategies: 0,
            active_strategies: 0,
            total_returns: 0.0,
            total_volume: 0.0,
            joined_at: now,
            last_active: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_draft() {
        let json = r#"{
            "parameters": {
                "strategy_name": "Grid Trading",
                "strategy_type": "grid",
                "pair": "INJ/USDT",
                "total_investment": 1000.0,
                "token_invested": "USDT",
                "duration_days": 30,
                "risk_level": "medium",
                "deploy_to_chain": true
            },
            "summary": "",
            "uiLayout": {"page_title": "", "sections": [], "actions": []},
            "contractCall": {"contract_name": "StrategyExecutor", "method": "deployStrategy", "params": {}},
            "deploymentWarning": "",
            "followUpSuggestions": []
        }"#;
        let result: StrategyResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.status_or_draft(), StrategyStatus::Draft);
        assert!(!result.is_marked_draft());
        assert!(result.id.is_none());
    }

    #[test]
    fn strategy_type_round_trips_snake_case() {
        let json = serde_json::to_string(&StrategyType::MaCross).unwrap();
        assert_eq!(json, "\"ma_cross\"");
        let back: StrategyType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StrategyType::MaCross);
    }

    #[test]
    fn zeroed_performance_starts_at_investment() {
        let perf = StrategyPerformance::zeroed(2500.0, Utc::now());
        assert_eq!(perf.current_value, 2500.0);
        assert_eq!(perf.trade_count, 0);
        assert_eq!(perf.pnl, 0.0);
    }
}
