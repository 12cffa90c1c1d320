use serde::{Deserialize, Serialize};

use crate::portfolio::domain::Asset;
use crate::portfolio::metrics::OwnedAsset;

/// Restricts a report to a single asset type, or passes everything through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssetTypeFilter {
    #[default]
    All,
    Type(String),
}

impl AssetTypeFilter {
    /// Build a filter from an optional request value; absent or the literal
    /// `All` means pass-through.
    pub fn from_request(value: Option<String>) -> Self {
        match value {
            Some(raw) if !raw.trim().is_empty() && raw != "All" => Self::Type(raw),
            _ => Self::All,
        }
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        match self {
            Self::All => true,
            Self::Type(wanted) => asset.asset_type == *wanted,
        }
    }
}

/// Projection parameters for the simulated cash-flow report. The monthly
/// growth multiplier is an assumption, not derived from stored escalation
/// data, so it stays configurable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionAssumptions {
    pub monthly_growth: f64,
}

impl Default for ProjectionAssumptions {
    fn default() -> Self {
        Self {
            monthly_growth: 0.02,
        }
    }
}

/// One month of the 12-month cash-flow projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowPoint {
    pub month: &'static str,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

/// Profit-and-loss row for one community (`area`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPnl {
    pub area: String,
    pub income: f64,
    pub expenses: f64,
    pub profit: f64,
}

/// Occupancy split for one asset type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyRow {
    pub asset_type: String,
    pub rented: usize,
    pub vacant: usize,
    pub off_plan: usize,
    pub occupancy_pct: f64,
}

pub(crate) fn filtered<'a>(
    assets: &'a [OwnedAsset],
    filter: &'a AssetTypeFilter,
) -> impl Iterator<Item = &'a OwnedAsset> {
    assets.iter().filter(move |owned| filter.matches(&owned.asset))
}
