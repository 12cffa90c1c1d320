//! Valuation Advisory Bridge: boundary adapter to an external generative
//! estimation service. One attempt per call, transport-default timeout, no
//! retries; every failure maps to "no change applied" at the service layer.

mod decoder;
mod gateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::portfolio::domain::Asset;

pub use gateway::GeminiValuationClient;

/// Structured valuation returned by the estimation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationEstimate {
    pub estimated_value: f64,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

impl ValuationEstimate {
    /// Whether the estimate may replace a stored valuation. Non-finite and
    /// non-positive values are rejected so they can never poison the
    /// aggregate.
    pub fn is_usable(&self) -> bool {
        self.estimated_value.is_finite() && self.estimated_value > 0.0
    }
}

/// One milestone of a generated construction-linked payment plan, as
/// received from the remote collaborator. Untrusted until the caller
/// validates the percent sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MilestoneDraft {
    pub milestone: String,
    pub percent: f64,
    pub date: String,
}

impl Default for MilestoneDraft {
    fn default() -> Self {
        Self {
            milestone: String::new(),
            percent: 0.0,
            date: String::new(),
        }
    }
}

/// Error enumeration for the advisory boundary.
#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    #[error("advisory transport failed: {0}")]
    Transport(String),
    #[error("advisory response was not a structured payload: {0}")]
    MalformedResponse(String),
    #[error("advisory unavailable: {0}")]
    Unavailable(String),
}

/// Gateway trait so the portfolio service can be exercised against stubs.
#[async_trait]
pub trait ValuationAdvisor: Send + Sync {
    /// Request a market-value estimate for a single asset.
    async fn estimate_valuation(&self, asset: &Asset) -> Result<ValuationEstimate, AdvisoryError>;

    /// Request a milestone payment plan for an off-plan asset.
    async fn generate_payment_plan(
        &self,
        asset_name: &str,
        total_value: f64,
    ) -> Result<Vec<MilestoneDraft>, AdvisoryError>;
}
