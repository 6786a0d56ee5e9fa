//! Strategy lifecycle engine
//!
//! Owns every status transition and performance mutation over the
//! persisted strategy collections. Constructed explicitly with its two
//! collaborators (persistence and chain backend) and passed by
//! reference to callers; there is no ambient global state.
//!
//! All collection updates are read-modify-write over the entire
//! collection: the engine re-reads the latest snapshot before every
//! mutation and the later write wins. Callers must serialize mutations
//! against the same store and must guard against re-entrant deploy or
//! stop calls on the same record while one is in flight; the engine
//! itself does not deduplicate them.

use chrono::Utc;
use rand::Rng;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chain::ChainClient;
use crate::store::{
    self, KvStore, PUBLISHED_STRATEGIES_KEY, SAVED_STRATEGIES_KEY,
};
use crate::types::{
    LifecycleError, StrategyPerformance, StrategyResult, StrategyStatus, UserProfile,
};

/// One observed market movement applied to an active strategy's
/// performance snapshot.
///
/// The engine applies samples; where they come from is the caller's
/// business. `simulate` reproduces the app's mock market feed.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceSample {
    /// New ROI percent, may be negative
    pub roi: f64,
    /// Trades executed since the last refresh
    pub trade_delta: u64,
    /// Volume traded since the last refresh
    pub volume_delta: f64,
    /// New winning-trade ratio, percent
    pub win_rate: f64,
}

impl PerformanceSample {
    /// Mock sample in the same ranges the app simulates: ROI in
    /// [-10%, +10%], up to 2 new trades, up to 10k volume
    pub fn simulate<R: Rng>(rng: &mut R) -> Self {
        Self {
            roi: (rng.gen::<f64>() - 0.5) * 20.0,
            trade_delta: rng.gen_range(0..3),
            volume_delta: rng.gen::<f64>() * 10_000.0,
            win_rate: rng.gen::<f64>() * 100.0,
        }
    }
}

/// The lifecycle state machine over persisted strategy records
pub struct LifecycleEngine {
    store: Arc<dyn KvStore>,
    chain: Arc<dyn ChainClient>,
    wallet: Mutex<Option<String>>,
}

impl LifecycleEngine {
    pub fn new(store: Arc<dyn KvStore>, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            store,
            chain,
            wallet: Mutex::new(None),
        }
    }

    // ---------------------------------------------------------------
    // Wallet and profile
    // ---------------------------------------------------------------

    /// Connect the wallet via the chain backend and load or create the
    /// per-wallet profile
    pub async fn connect_wallet(&self) -> Result<bool, LifecycleError> {
        if !self.chain.connect_wallet().await {
            return Ok(false);
        }
        let address = self.chain.wallet_address().await;
        *self.wallet.lock().expect("wallet mutex poisoned") = address.clone();
        if let Some(address) = address {
            self.load_or_create_profile(&address)?;
        }
        Ok(true)
    }

    pub fn disconnect_wallet(&self) {
        *self.wallet.lock().expect("wallet mutex poisoned") = None;
    }

    pub fn wallet_address(&self) -> Option<String> {
        self.wallet.lock().expect("wallet mutex poisoned").clone()
    }

    pub fn user_profile(&self) -> Option<UserProfile> {
        let address = self.wallet_address()?;
        store::read_json(self.store.as_ref(), &store::profile_key(&address))
    }

    fn load_or_create_profile(&self, address: &str) -> Result<UserProfile, LifecycleError> {
        let key = store::profile_key(address);
        let now = Utc::now();
        let profile = match store::read_json::<UserProfile>(self.store.as_ref(), &key) {
            Some(mut profile) => {
                profile.last_active = now;
                profile
            }
            None => {
                info!(address, "creating user profile");
                UserProfile::new(address.to_string(), now)
            }
        };
        store::write_json(self.store.as_ref(), &key, &profile)?;
        Ok(profile)
    }

    /// Best-effort profile counter bump after a successful deploy;
    /// failure to update stats never fails the deploy itself
    fn bump_profile_after_deploy(&self, activated: bool) {
        let Some(address) = self.wallet_address() else {
            return;
        };
        let key = store::profile_key(&address);
        let Some(mut profile) = store::read_json::<UserProfile>(self.store.as_ref(), &key) else {
            return;
        };
        profile.total_strategies += 1;
        if activated {
            profile.active_strategies += 1;
        }
        profile.last_active = Utc::now();
        if let Err(e) = store::write_json(self.store.as_ref(), &key, &profile) {
            warn!(error = %e, "failed to update profile stats");
        }
    }

    // ---------------------------------------------------------------
    // Collections
    // ---------------------------------------------------------------

    /// Latest snapshot of the user's strategies; read or parse failure
    /// degrades to an empty collection
    pub fn saved_strategies(&self) -> Vec<StrategyResult> {
        store::read_json(self.store.as_ref(), SAVED_STRATEGIES_KEY).unwrap_or_default()
    }

    /// Marketplace feed of published strategies
    pub fn published_strategies(&self) -> Vec<StrategyResult> {
        store::read_json(self.store.as_ref(), PUBLISHED_STRATEGIES_KEY).unwrap_or_default()
    }

    fn write_saved(&self, strategies: &[StrategyResult]) -> Result<(), LifecycleError> {
        store::write_json(self.store.as_ref(), SAVED_STRATEGIES_KEY, &strategies)?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------

    /// Persist a composed draft: assigns a fresh id, marks it draft,
    /// records the creator when a wallet is connected
    pub fn save(&self, draft: &StrategyResult) -> Result<StrategyResult, LifecycleError> {
        let mut saved = draft.clone();
        saved.id = Some(format!("strategy-{}", Uuid::new_v4()));
        saved.status = Some(StrategyStatus::Draft);
        saved.creator = self.wallet_address();

        let mut strategies = self.saved_strategies();
        strategies.push(saved.clone());
        self.write_saved(&strategies)?;

        info!(id = saved.id.as_deref().unwrap_or(""), "strategy saved as draft");
        Ok(saved)
    }

    /// Deploy a strategy via the chain backend.
    ///
    /// On success the returned transaction reference becomes the
    /// record's id. Input that already carries draft status (the
    /// subscribe flow) stays a draft: subscription enrolls the strategy
    /// without starting execution. Anything else becomes active with a
    /// zeroed performance snapshot. On failure nothing is mutated.
    pub async fn deploy(
        &self,
        strategy: &StrategyResult,
    ) -> Result<StrategyResult, LifecycleError> {
        let result = self.chain.deploy_strategy(strategy).await;
        if !result.success {
            let reason = result.error.unwrap_or_else(|| "Deployment failed".to_string());
            warn!(%reason, "deployment rejected by chain backend");
            return Err(LifecycleError::DeploymentFailed(reason));
        }
        let tx_hash = result
            .tx_hash
            .ok_or_else(|| LifecycleError::DeploymentFailed("missing transaction reference".to_string()))?;

        let stays_draft = strategy.is_marked_draft();
        let now = Utc::now();

        let mut deployed = strategy.clone();
        deployed.id = Some(tx_hash.clone());
        deployed.tx_hash = Some(tx_hash.clone());
        if stays_draft {
            deployed.deployed_at = None;
            deployed.performance = None;
        } else {
            deployed.status = Some(StrategyStatus::Active);
            deployed.deployed_at = Some(now);
            deployed.performance = Some(StrategyPerformance::zeroed(
                deployed.parameters.total_investment,
                now,
            ));
        }

        let mut strategies = self.saved_strategies();
        strategies.push(deployed.clone());
        self.write_saved(&strategies)?;

        self.bump_profile_after_deploy(!stays_draft);

        info!(
            %tx_hash,
            status = if stays_draft { "draft" } else { "active" },
            "strategy deployed"
        );
        Ok(deployed)
    }

    /// Deploy one of the user's own saved drafts as a live strategy.
    ///
    /// Saved and subscribed records both carry the draft marker, which
    /// [`deploy`] treats as an enrollment-only input. Activation is an
    /// explicit user action, so the marker is cleared here before the
    /// chain backend performs the real deployment and the record
    /// becomes active.
    ///
    /// [`deploy`]: LifecycleEngine::deploy
    pub async fn activate(
        &self,
        strategy: &StrategyResult,
    ) -> Result<StrategyResult, LifecycleError> {
        let mut record = strategy.clone();
        record.status = None;
        self.deploy(&record).await
    }

    /// Stop an active strategy. Terminal: nothing transitions out of
    /// stopped.
    pub async fn stop(&self, strategy_id: &str) -> Result<String, LifecycleError> {
        if !self
            .saved_strategies()
            .iter()
            .any(|s| s.id.as_deref() == Some(strategy_id))
        {
            return Err(LifecycleError::StrategyNotFound);
        }

        let result = self.chain.stop_strategy(strategy_id).await;
        if !result.success {
            let reason = result.error.unwrap_or_else(|| "Stop failed".to_string());
            return Err(LifecycleError::StopFailed(reason));
        }

        // Re-read after the suspension so a concurrent mutation is not
        // overwritten with a stale snapshot
        let mut strategies = self.saved_strategies();
        let index = strategies
            .iter()
            .position(|s| s.id.as_deref() == Some(strategy_id))
            .ok_or(LifecycleError::StrategyNotFound)?;
        strategies[index].status = Some(StrategyStatus::Stopped);
        self.write_saved(&strategies)?;

        info!(strategy_id, "strategy stopped");
        Ok(result.tx_hash.unwrap_or_default())
    }

    /// Publish a persisted strategy to the marketplace feed.
    ///
    /// Independent of lifecycle status. Subscribers always reset to 0,
    /// never a stale prior value.
    pub fn publish(&self, strategy_id: &str) -> Result<StrategyResult, LifecycleError> {
        let mut strategies = self.saved_strategies();
        let index = strategies
            .iter()
            .position(|s| s.id.as_deref() == Some(strategy_id))
            .ok_or(LifecycleError::StrategyNotFound)?;

        let entry = &mut strategies[index];
        entry.is_published = Some(true);
        entry.published_at = Some(Utc::now());
        entry.subscribers = Some(0);
        entry.creator = Some(
            self.wallet_address()
                .unwrap_or_else(|| "Unknown".to_string()),
        );
        let published = entry.clone();
        self.write_saved(&strategies)?;

        let mut feed = self.published_strategies();
        feed.push(published.clone());
        store::write_json(self.store.as_ref(), PUBLISHED_STRATEGIES_KEY, &feed)?;

        info!(strategy_id, "strategy published to marketplace");
        Ok(published)
    }

    /// Enroll a marketplace strategy as a fresh draft copy. The caller
    /// follows up with [`deploy`], which for draft input is only a
    /// local-save acknowledgment.
    ///
    /// [`deploy`]: LifecycleEngine::deploy
    pub fn subscribe(&self, published: &StrategyResult) -> StrategyResult {
        let mut copy = published.clone();
        copy.id = Some(format!("subscribed-{}", Uuid::new_v4()));
        copy.status = Some(StrategyStatus::Draft);
        copy.deployed_at = None;
        copy.tx_hash = None;
        copy.performance = None;
        copy
    }

    /// Apply a performance sample to an active strategy.
    ///
    /// Only applies when the record is active and already carries a
    /// snapshot; any other status is a silent no-op. Returns the
    /// record as persisted afterwards, `None` when the id is unknown.
    pub fn refresh_performance(
        &self,
        strategy_id: &str,
        sample: PerformanceSample,
    ) -> Result<Option<StrategyResult>, LifecycleError> {
        let mut strategies = self.saved_strategies();
        let Some(index) = strategies
            .iter()
            .position(|s| s.id.as_deref() == Some(strategy_id))
        else {
            return Ok(None);
        };

        let entry = &mut strategies[index];
        if entry.status_or_draft() != StrategyStatus::Active {
            debug!(strategy_id, "refresh skipped, strategy not active");
            return Ok(Some(entry.clone()));
        }
        let Some(perf) = entry.performance.as_mut() else {
            debug!(strategy_id, "refresh skipped, no performance snapshot");
            return Ok(Some(entry.clone()));
        };

        let total = entry.parameters.total_investment;
        perf.roi = sample.roi;
        perf.trade_count += sample.trade_delta;
        perf.pnl = total * sample.roi / 100.0;
        perf.current_value = total + perf.pnl;
        perf.win_rate = sample.win_rate;
        // Volume is cumulative and must never decrease
        perf.total_volume += sample.volume_delta.max(0.0);
        perf.last_updated = Utc::now();

        let updated = entry.clone();
        self.write_saved(&strategies)?;
        Ok(Some(updated))
    }

    /// Remove a record by position. No guard: deleting an active
    /// strategy does not stop it on the backend first.
    pub fn delete(&self, index: usize) -> Result<(), LifecycleError> {
        let mut strategies = self.saved_strategies();
        if index >= strategies.len() {
            return Ok(());
        }
        let removed = strategies.remove(index);
        self.write_saved(&strategies)?;
        info!(
            id = removed.id.as_deref().unwrap_or(""),
            "strategy deleted"
        );
        Ok(())
    }
}
