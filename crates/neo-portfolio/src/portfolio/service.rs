//! Application service composing the store, the normalizer, and the
//! valuation advisory. All state transitions are pure computations over
//! the in-memory snapshot; persistence is an explicit boundary written
//! after each mutation.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::advisory::{AdvisoryError, ValuationAdvisor, ValuationEstimate};

use super::domain::{Asset, Client, MilestoneStatus, PaymentPlanItem, ValuationEntry};
use super::metrics::{compute_metrics, flatten_assets, OwnedAsset, PortfolioMetrics};
use super::normalizer::{normalize_asset, normalize_client};
use super::reporting::{
    assets_csv, build_cashflow, build_community_pl, build_occupancy_breakdown, AssetTypeFilter,
    CashflowPoint, CommunityPnl, OccupancyRow, ProjectionAssumptions,
};
use super::seed::seed_clients;
use super::store::{
    load_clients, load_preferences, save_clients, save_preferences, PortfolioStore, Preferences,
    StoreError,
};

/// Error raised by the portfolio service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("client {0} not found")]
    ClientNotFound(String),
    #[error("asset {0} not found")]
    AssetNotFound(String),
    #[error("a valuation is already in flight for asset {0}")]
    ValuationInFlight(String),
    #[error("payment plan percentages sum to {sum:.1}, expected 100")]
    PaymentPlanPercent { sum: f64 },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Advisory(#[from] AdvisoryError),
    #[error("report export failed: {0}")]
    Export(#[from] csv::Error),
    #[error("state serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result of one valuation round trip. `applied == false` means the prior
/// value was left untouched, whether the advisory failed or returned an
/// unusable estimate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationOutcome {
    pub asset_id: String,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<ValuationEstimate>,
}

static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_record_id(prefix: &str, used: impl Fn(&str) -> bool) -> String {
    loop {
        let candidate = format!(
            "{prefix}-{:06}",
            RECORD_SEQUENCE.fetch_add(1, Ordering::Relaxed)
        );
        if !used(&candidate) {
            return candidate;
        }
    }
}

/// Single-consumer portfolio state machine over a key-value store and an
/// advisory gateway.
pub struct PortfolioService<S, V> {
    store: Arc<S>,
    advisor: Arc<V>,
    assumptions: ProjectionAssumptions,
    clients: Mutex<Vec<Client>>,
    valuating: Mutex<HashSet<String>>,
}

impl<S, V> PortfolioService<S, V>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    /// Read the store once and hold the normalized snapshot in memory.
    pub fn new(store: Arc<S>, advisor: Arc<V>, assumptions: ProjectionAssumptions) -> Self {
        let clients = load_clients(store.as_ref());
        Self {
            store,
            advisor,
            assumptions,
            clients: Mutex::new(clients),
            valuating: Mutex::new(HashSet::new()),
        }
    }

    pub fn clients(&self) -> Vec<Client> {
        self.lock_clients().clone()
    }

    pub fn client(&self, client_id: &str) -> Result<Client, ServiceError> {
        self.lock_clients()
            .iter()
            .find(|client| client.id == client_id)
            .cloned()
            .ok_or_else(|| ServiceError::ClientNotFound(client_id.to_string()))
    }

    /// The combined owner-annotated asset sequence.
    pub fn assets(&self) -> Vec<OwnedAsset> {
        flatten_assets(&self.lock_clients())
    }

    /// Case-insensitive search over asset name and community.
    pub fn search_assets(&self, query: &str) -> Vec<OwnedAsset> {
        let needle = query.trim().to_lowercase();
        self.assets()
            .into_iter()
            .filter(|owned| {
                needle.is_empty()
                    || owned.asset.name.to_lowercase().contains(&needle)
                    || owned.asset.area.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn metrics(&self) -> PortfolioMetrics {
        compute_metrics(&self.lock_clients())
    }

    pub fn cashflow_report(&self, filter: &AssetTypeFilter) -> Vec<CashflowPoint> {
        build_cashflow(&self.assets(), filter, &self.assumptions)
    }

    pub fn community_report(&self, filter: &AssetTypeFilter) -> Vec<CommunityPnl> {
        build_community_pl(&self.assets(), filter)
    }

    pub fn occupancy_report(&self, filter: &AssetTypeFilter) -> Vec<OccupancyRow> {
        build_occupancy_breakdown(&self.assets(), filter)
    }

    pub fn export_assets_csv(&self, filter: &AssetTypeFilter) -> Result<String, ServiceError> {
        Ok(assets_csv(&self.assets(), filter)?)
    }

    /// Normalize and store a client record; a blank id gets a generated
    /// one. Returns the canonical record.
    pub fn upsert_client(&self, raw: &Value) -> Result<Client, ServiceError> {
        let mut client = normalize_client(raw);
        {
            let mut clients = self.lock_clients();
            if client.id.trim().is_empty() {
                client.id =
                    next_record_id("c", |id| clients.iter().any(|existing| existing.id == id));
            }
            match clients.iter_mut().find(|existing| existing.id == client.id) {
                Some(existing) => *existing = client.clone(),
                None => clients.push(client.clone()),
            }
        }
        self.persist()?;
        Ok(client)
    }

    pub fn remove_client(&self, client_id: &str) -> Result<(), ServiceError> {
        {
            let mut clients = self.lock_clients();
            let before = clients.len();
            clients.retain(|client| client.id != client_id);
            if clients.len() == before {
                return Err(ServiceError::ClientNotFound(client_id.to_string()));
            }
        }
        self.persist()
    }

    /// Normalize and attach an asset to a client, regenerating the owned
    /// totals.
    pub fn upsert_asset(&self, client_id: &str, raw: &Value) -> Result<Asset, ServiceError> {
        let mut asset = normalize_asset(raw);
        {
            let mut clients = self.lock_clients();
            if asset.id.trim().is_empty() {
                asset.id = next_record_id("a", |id| {
                    clients
                        .iter()
                        .any(|client| client.assets.iter().any(|existing| existing.id == id))
                });
            }
            let client = clients
                .iter_mut()
                .find(|client| client.id == client_id)
                .ok_or_else(|| ServiceError::ClientNotFound(client_id.to_string()))?;
            match client
                .assets
                .iter_mut()
                .find(|existing| existing.id == asset.id)
            {
                Some(existing) => *existing = asset.clone(),
                None => client.assets.push(asset.clone()),
            }
            client.recompute_totals();
        }
        self.persist()?;
        Ok(asset)
    }

    pub fn remove_asset(&self, asset_id: &str) -> Result<(), ServiceError> {
        {
            let mut clients = self.lock_clients();
            let client = clients
                .iter_mut()
                .find(|client| client.assets.iter().any(|asset| asset.id == asset_id))
                .ok_or_else(|| ServiceError::AssetNotFound(asset_id.to_string()))?;
            client.assets.retain(|asset| asset.id != asset_id);
            client.recompute_totals();
        }
        self.persist()
    }

    /// Drop all persisted state and restore the factory seed dataset.
    pub fn reset(&self) -> Result<Vec<Client>, ServiceError> {
        self.store.clear()?;
        let seeded = seed_clients();
        *self.lock_clients() = seeded.clone();
        self.persist()?;
        info!("portfolio store reset to seed dataset");
        Ok(seeded)
    }

    pub fn preferences(&self) -> Preferences {
        load_preferences(self.store.as_ref())
    }

    pub fn update_preferences(&self, preferences: Preferences) -> Result<Preferences, ServiceError> {
        save_preferences(self.store.as_ref(), &preferences)?;
        Ok(preferences)
    }

    /// Ask the advisory for a fresh market value and, when the estimate is
    /// usable, route it back through the normalizer and persist it.
    ///
    /// Advisory failures are logged and reported as "no change applied";
    /// the stored value is never overwritten by a failed round trip. A
    /// second request for an asset whose valuation is still in flight is
    /// rejected.
    pub async fn request_valuation(&self, asset_id: &str) -> Result<ValuationOutcome, ServiceError> {
        let asset = self
            .find_asset(asset_id)
            .ok_or_else(|| ServiceError::AssetNotFound(asset_id.to_string()))?;
        let _marker = self.mark_valuating(asset_id)?;

        match self.advisor.estimate_valuation(&asset).await {
            Ok(estimate) if estimate.is_usable() => {
                self.apply_valuation(asset_id, &estimate)?;
                info!(
                    asset_id,
                    value = estimate.estimated_value,
                    "advisory valuation applied"
                );
                Ok(ValuationOutcome {
                    asset_id: asset_id.to_string(),
                    applied: true,
                    estimate: Some(estimate),
                })
            }
            Ok(estimate) => {
                warn!(
                    asset_id,
                    value = estimate.estimated_value,
                    "advisory returned an unusable estimate, keeping prior value"
                );
                Ok(ValuationOutcome {
                    asset_id: asset_id.to_string(),
                    applied: false,
                    estimate: Some(estimate),
                })
            }
            Err(err) => {
                warn!(asset_id, %err, "advisory valuation failed, keeping prior value");
                Ok(ValuationOutcome {
                    asset_id: asset_id.to_string(),
                    applied: false,
                    estimate: None,
                })
            }
        }
    }

    /// Request a milestone payment plan for an off-plan asset. The remote
    /// response is untrusted: the plan is accepted only when its
    /// percentages sum to 100 (±0.5).
    pub async fn generate_payment_plan(
        &self,
        asset_id: &str,
    ) -> Result<Vec<PaymentPlanItem>, ServiceError> {
        let asset = self
            .find_asset(asset_id)
            .ok_or_else(|| ServiceError::AssetNotFound(asset_id.to_string()))?;

        let draft = self
            .advisor
            .generate_payment_plan(&asset.name, asset.value)
            .await?;

        let sum: f64 = draft.iter().map(|milestone| milestone.percent).sum();
        if (sum - 100.0).abs() > 0.5 {
            return Err(ServiceError::PaymentPlanPercent { sum });
        }

        let plan: Vec<PaymentPlanItem> = draft
            .into_iter()
            .enumerate()
            .map(|(index, milestone)| PaymentPlanItem {
                id: format!("pp-{}", index + 1),
                amount: milestone.percent / 100.0 * asset.value,
                milestone: milestone.milestone,
                percent: milestone.percent,
                date: milestone.date,
                status: MilestoneStatus::Pending,
            })
            .collect();

        self.update_asset(asset_id, |asset| {
            asset.payment_plan = plan.clone();
        })?;

        Ok(plan)
    }

    fn apply_valuation(
        &self,
        asset_id: &str,
        estimate: &ValuationEstimate,
    ) -> Result<(), ServiceError> {
        let today = Local::now().date_naive().to_string();
        let value = estimate.estimated_value;
        self.update_asset(asset_id, move |asset| {
            asset.value = value;
            asset.valuation_history.push(ValuationEntry {
                date: today.clone(),
                value,
            });
        })
    }

    /// Mutate one asset, re-normalize it, refresh the owning client's
    /// totals, and persist.
    fn update_asset(
        &self,
        asset_id: &str,
        mutate: impl FnOnce(&mut Asset),
    ) -> Result<(), ServiceError> {
        {
            let mut clients = self.lock_clients();
            let client = clients
                .iter_mut()
                .find(|client| client.assets.iter().any(|asset| asset.id == asset_id))
                .ok_or_else(|| ServiceError::AssetNotFound(asset_id.to_string()))?;
            let asset = client
                .assets
                .iter_mut()
                .find(|asset| asset.id == asset_id)
                .ok_or_else(|| ServiceError::AssetNotFound(asset_id.to_string()))?;

            mutate(asset);
            *asset = normalize_asset(&serde_json::to_value(&*asset)?);
            client.recompute_totals();
        }
        self.persist()
    }

    fn find_asset(&self, asset_id: &str) -> Option<Asset> {
        self.lock_clients()
            .iter()
            .flat_map(|client| client.assets.iter())
            .find(|asset| asset.id == asset_id)
            .cloned()
    }

    fn mark_valuating(&self, asset_id: &str) -> Result<InFlightMarker<'_>, ServiceError> {
        let mut valuating = self.valuating.lock().expect("valuation marker mutex poisoned");
        if !valuating.insert(asset_id.to_string()) {
            return Err(ServiceError::ValuationInFlight(asset_id.to_string()));
        }
        Ok(InFlightMarker {
            registry: &self.valuating,
            asset_id: asset_id.to_string(),
        })
    }

    fn persist(&self) -> Result<(), ServiceError> {
        let clients = self.lock_clients().clone();
        save_clients(self.store.as_ref(), &clients)?;
        Ok(())
    }

    fn lock_clients(&self) -> std::sync::MutexGuard<'_, Vec<Client>> {
        self.clients.lock().expect("portfolio state mutex poisoned")
    }
}

/// Clears the per-asset in-flight valuation marker on every exit path.
struct InFlightMarker<'a> {
    registry: &'a Mutex<HashSet<String>>,
    asset_id: String,
}

impl Drop for InFlightMarker<'_> {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.lock() {
            registry.remove(&self.asset_id);
        }
    }
}
