//! Portfolio-level aggregation over the normalized client set.

use serde::Serialize;

use super::domain::{Asset, AssetStatus, Client};

/// An asset annotated with its owning client, rebuilt on every flatten.
/// The back-reference is derived here and never read from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedAsset {
    pub owner_id: String,
    pub owner_name: String,
    #[serde(flatten)]
    pub asset: Asset,
}

/// Immutable snapshot of portfolio-wide derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetrics {
    pub total_aum: f64,
    pub total_rent: f64,
    pub total_expenses: f64,
    pub units: usize,
    pub rented_units: usize,
    pub vacant_units: usize,
    pub off_plan_units: usize,
    pub occupancy_rate: f64,
    pub net_margin_pct: f64,
}

/// One combined sequence of all assets across all clients.
pub fn flatten_assets(clients: &[Client]) -> Vec<OwnedAsset> {
    clients
        .iter()
        .flat_map(|client| {
            client.assets.iter().map(|asset| OwnedAsset {
                owner_id: client.id.clone(),
                owner_name: client.name.clone(),
                asset: asset.clone(),
            })
        })
        .collect()
}

/// Fold the full client set into a metrics snapshot. Linear in the total
/// asset count, cheap enough to run on every recompute.
pub fn compute_metrics(clients: &[Client]) -> PortfolioMetrics {
    let assets = flatten_assets(clients);
    aggregate(&assets)
}

/// Aggregate an already-flattened asset sequence.
pub fn aggregate(assets: &[OwnedAsset]) -> PortfolioMetrics {
    let mut total_aum = 0.0;
    let mut total_rent = 0.0;
    let mut total_expenses = 0.0;
    let mut rented_units = 0;
    let mut vacant_units = 0;
    let mut off_plan_units = 0;

    for owned in assets {
        let asset = &owned.asset;
        total_aum += asset.value;
        total_rent += asset.realized_rent();
        total_expenses += asset.annual_expenses();
        match asset.status {
            AssetStatus::Rented => rented_units += 1,
            AssetStatus::Vacant => vacant_units += 1,
            AssetStatus::OffPlan => off_plan_units += 1,
        }
    }

    let units = assets.len();
    let occupancy_rate = occupancy_rate(rented_units, units, off_plan_units);
    let net_margin_pct = if total_rent > 0.0 {
        (total_rent - total_expenses) / total_rent * 100.0
    } else {
        0.0
    };

    PortfolioMetrics {
        total_aum,
        total_rent,
        total_expenses,
        units,
        rented_units,
        vacant_units,
        off_plan_units,
        occupancy_rate,
        net_margin_pct,
    }
}

/// Occupancy excludes off-plan units from the denominator: a unit under
/// construction cannot be physically occupied. Zero eligible units yield 0
/// rather than a division error.
pub fn occupancy_rate(rented: usize, units: usize, off_plan: usize) -> f64 {
    let eligible = units.saturating_sub(off_plan);
    if eligible == 0 {
        return 0.0;
    }
    rented as f64 / eligible as f64 * 100.0
}
