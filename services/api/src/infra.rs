use metrics_exporter_prometheus::PrometheusHandle;
use neo_portfolio::advisory::{
    AdvisoryError, GeminiValuationClient, MilestoneDraft, ValuationAdvisor, ValuationEstimate,
};
use neo_portfolio::config::{AdvisoryConfig, StorageConfig};
use neo_portfolio::error::AppError;
use neo_portfolio::portfolio::domain::Asset;
use neo_portfolio::portfolio::store::StoreError;
use neo_portfolio::portfolio::{InMemoryStore, JsonFileStore, PortfolioStore, ServiceError};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Runtime-selected persistence backend. A configured data directory gets
/// file-per-key persistence; otherwise state lives only for the process.
pub(crate) enum StoreBackend {
    Memory(InMemoryStore),
    File(JsonFileStore),
}

impl PortfolioStore for StoreBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            StoreBackend::Memory(store) => store.get(key),
            StoreBackend::File(store) => store.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            StoreBackend::Memory(store) => store.set(key, value),
            StoreBackend::File(store) => store.set(key, value),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match self {
            StoreBackend::Memory(store) => store.clear(),
            StoreBackend::File(store) => store.clear(),
        }
    }
}

pub(crate) fn build_store(config: &StorageConfig) -> Result<StoreBackend, AppError> {
    match &config.data_dir {
        Some(dir) => {
            info!(path = %dir.display(), "using file-backed portfolio store");
            let store = JsonFileStore::new(dir)
                .map_err(|err| AppError::from(ServiceError::Store(err)))?;
            Ok(StoreBackend::File(store))
        }
        None => {
            info!("no data directory configured, portfolio state is in-memory only");
            Ok(StoreBackend::Memory(InMemoryStore::default()))
        }
    }
}

/// Runtime-selected advisory backend. Without an API key every advisory
/// call reports itself unavailable instead of failing the whole service.
pub(crate) enum AdvisoryBackend {
    Gemini(GeminiValuationClient),
    Offline,
}

#[async_trait::async_trait]
impl ValuationAdvisor for AdvisoryBackend {
    async fn estimate_valuation(&self, asset: &Asset) -> Result<ValuationEstimate, AdvisoryError> {
        match self {
            AdvisoryBackend::Gemini(client) => client.estimate_valuation(asset).await,
            AdvisoryBackend::Offline => Err(AdvisoryError::Unavailable(
                "no advisory API key configured".to_string(),
            )),
        }
    }

    async fn generate_payment_plan(
        &self,
        asset_name: &str,
        total_value: f64,
    ) -> Result<Vec<MilestoneDraft>, AdvisoryError> {
        match self {
            AdvisoryBackend::Gemini(client) => {
                client.generate_payment_plan(asset_name, total_value).await
            }
            AdvisoryBackend::Offline => Err(AdvisoryError::Unavailable(
                "no advisory API key configured".to_string(),
            )),
        }
    }
}

pub(crate) fn build_advisor(config: &AdvisoryConfig) -> AdvisoryBackend {
    if config.api_key.is_none() {
        warn!("GEMINI_API_KEY not set, valuation advisory runs offline");
        return AdvisoryBackend::Offline;
    }
    match GeminiValuationClient::from_config(config) {
        Ok(client) => AdvisoryBackend::Gemini(client),
        Err(err) => {
            warn!(%err, "advisory client unavailable, running offline");
            AdvisoryBackend::Offline
        }
    }
}
