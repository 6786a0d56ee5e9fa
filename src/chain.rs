//! Chain deployment collaborator
//!
//! Abstracts the wallet/chain backend behind an object-safe async
//! trait. The default implementation simulates network latency and a
//! small failure rate; `StaticChainClient` is a deterministic double
//! for tests. Either way a call may fail but never partially applies.

use async_trait::async_trait;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ChainConfig;
use crate::types::StrategyResult;

/// Outcome of a deploy or stop call, mirroring the backend contract
#[derive(Debug, Clone)]
pub struct ChainCallResult {
    pub success: bool,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
}

impl ChainCallResult {
    pub fn ok(tx_hash: String) -> Self {
        Self {
            success: true,
            tx_hash: Some(tx_hash),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            tx_hash: None,
            error: Some(error.into()),
        }
    }
}

/// Wallet and execution backend consumed by the lifecycle engine
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn connect_wallet(&self) -> bool;
    async fn wallet_address(&self) -> Option<String>;
    fn is_connected(&self) -> bool;

    /// Submit a strategy for execution. Draft-status input must behave
    /// as a lightweight local-save acknowledgment with no chain write.
    async fn deploy_strategy(&self, strategy: &StrategyResult) -> ChainCallResult;

    async fn stop_strategy(&self, strategy_id: &str) -> ChainCallResult;
}

/// Simulated backend with artificial latency and random failures
pub struct SimulatedChainClient {
    config: ChainConfig,
    wallet: Mutex<Option<String>>,
}

impl SimulatedChainClient {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            wallet: Mutex::new(None),
        }
    }

    fn random_hex(len: usize) -> String {
        let mut rng = rand::thread_rng();
        let digits: String = (0..len)
            .map(|_| std::char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
            .collect();
        format!("0x{digits}")
    }
}

#[async_trait]
impl ChainClient for SimulatedChainClient {
    async fn connect_wallet(&self) -> bool {
        info!("connecting wallet");
        tokio::time::sleep(Duration::from_millis(self.config.connect_delay_ms)).await;
        let address = Self::random_hex(40);
        debug!(%address, "wallet connected");
        *self.wallet.lock().expect("wallet mutex poisoned") = Some(address);
        true
    }

    async fn wallet_address(&self) -> Option<String> {
        self.wallet.lock().expect("wallet mutex poisoned").clone()
    }

    fn is_connected(&self) -> bool {
        self.wallet
            .lock()
            .expect("wallet mutex poisoned")
            .is_some()
    }

    async fn deploy_strategy(&self, strategy: &StrategyResult) -> ChainCallResult {
        // Subscribed drafts are only enrolled locally, no chain write
        if strategy.is_marked_draft() {
            debug!(
                name = %strategy.parameters.strategy_name,
                "saving draft strategy"
            );
            tokio::time::sleep(Duration::from_millis(self.config.draft_save_delay_ms)).await;
            return ChainCallResult::ok(format!(
                "draft-{}",
                chrono::Utc::now().timestamp_millis()
            ));
        }

        if !self.is_connected() {
            return ChainCallResult::fail("Wallet not connected");
        }

        info!(
            contract = %strategy.contract_call.contract_name,
            method = %strategy.contract_call.method,
            "deploying strategy"
        );
        tokio::time::sleep(Duration::from_millis(self.config.deploy_delay_ms)).await;

        if rand::thread_rng().gen::<f64>() < self.config.failure_rate {
            return ChainCallResult::fail(
                "Transaction failed - insufficient gas or network congestion",
            );
        }

        let tx_hash = Self::random_hex(64);
        info!(%tx_hash, "strategy deployed");
        ChainCallResult::ok(tx_hash)
    }

    async fn stop_strategy(&self, strategy_id: &str) -> ChainCallResult {
        if !self.is_connected() {
            return ChainCallResult::fail("Wallet not connected");
        }

        info!(strategy_id, "stopping strategy");
        tokio::time::sleep(Duration::from_millis(self.config.stop_delay_ms)).await;
        ChainCallResult::ok(Self::random_hex(64))
    }
}

/// Deterministic, zero-latency backend for tests.
///
/// Deploys yield `tx-1`, `tx-2`, ... in call order; the next deploy can
/// be scripted to fail.
pub struct StaticChainClient {
    wallet: Mutex<Option<String>>,
    fail_next_deploy: AtomicBool,
    calls: AtomicU64,
}

impl Default for StaticChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticChainClient {
    pub fn new() -> Self {
        Self {
            wallet: Mutex::new(None),
            fail_next_deploy: AtomicBool::new(false),
            calls: AtomicU64::new(0),
        }
    }

    pub fn with_wallet(address: &str) -> Self {
        let client = Self::new();
        *client.wallet.lock().expect("wallet mutex poisoned") = Some(address.to_string());
        client
    }

    pub fn fail_next_deploy(&self) {
        self.fail_next_deploy.store(true, Ordering::SeqCst);
    }

    /// Total deploy/stop calls issued against this double
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for StaticChainClient {
    async fn connect_wallet(&self) -> bool {
        let mut wallet = self.wallet.lock().expect("wallet mutex poisoned");
        if wallet.is_none() {
            *wallet = Some("0xtestwallet".to_string());
        }
        true
    }

    async fn wallet_address(&self) -> Option<String> {
        self.wallet.lock().expect("wallet mutex poisoned").clone()
    }

    fn is_connected(&self) -> bool {
        self.wallet
            .lock()
            .expect("wallet mutex poisoned")
            .is_some()
    }

    async fn deploy_strategy(&self, strategy: &StrategyResult) -> ChainCallResult {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_next_deploy.swap(false, Ordering::SeqCst) {
            return ChainCallResult::fail("scripted deploy failure");
        }
        if strategy.is_marked_draft() {
            return ChainCallResult::ok(format!("draft-{call}"));
        }
        ChainCallResult::ok(format!("tx-{call}"))
    }

    async fn stop_strategy(&self, _strategy_id: &str) -> ChainCallResult {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        ChainCallResult::ok(format!("stop-{call}"))
    }
}
