use std::collections::HashMap;

use super::views::{filtered, AssetTypeFilter, CommunityPnl, OccupancyRow};
use crate::portfolio::domain::AssetStatus;
use crate::portfolio::metrics::{occupancy_rate, OwnedAsset};

/// Group filtered assets by community (`area`) into P&L rows. Row order is
/// the first-occurrence order of each area in the asset sequence.
pub fn build_community_pl(assets: &[OwnedAsset], filter: &AssetTypeFilter) -> Vec<CommunityPnl> {
    let mut order: Vec<String> = Vec::new();
    let mut rows: HashMap<String, CommunityPnl> = HashMap::new();

    for owned in filtered(assets, filter) {
        let asset = &owned.asset;
        let row = rows
            .entry(asset.area.clone())
            .or_insert_with(|| {
                order.push(asset.area.clone());
                CommunityPnl {
                    area: asset.area.clone(),
                    income: 0.0,
                    expenses: 0.0,
                    profit: 0.0,
                }
            });
        row.income += asset.realized_rent();
        row.expenses += asset.annual_expenses();
    }

    order
        .into_iter()
        .filter_map(|area| rows.remove(&area))
        .map(|mut row| {
            row.profit = row.income - row.expenses;
            row
        })
        .collect()
}

/// Occupancy split per asset type, first-occurrence ordered, using the same
/// off-plan-excluded ratio as the portfolio-wide metric.
pub fn build_occupancy_breakdown(
    assets: &[OwnedAsset],
    filter: &AssetTypeFilter,
) -> Vec<OccupancyRow> {
    let mut order: Vec<String> = Vec::new();
    let mut rows: HashMap<String, OccupancyRow> = HashMap::new();

    for owned in filtered(assets, filter) {
        let asset = &owned.asset;
        let row = rows
            .entry(asset.asset_type.clone())
            .or_insert_with(|| {
                order.push(asset.asset_type.clone());
                OccupancyRow {
                    asset_type: asset.asset_type.clone(),
                    rented: 0,
                    vacant: 0,
                    off_plan: 0,
                    occupancy_pct: 0.0,
                }
            });
        match asset.status {
            AssetStatus::Rented => row.rented += 1,
            AssetStatus::Vacant => row.vacant += 1,
            AssetStatus::OffPlan => row.off_plan += 1,
        }
    }

    order
        .into_iter()
        .filter_map(|asset_type| rows.remove(&asset_type))
        .map(|mut row| {
            let units = row.rented + row.vacant + row.off_plan;
            row.occupancy_pct = occupancy_rate(row.rented, units, row.off_plan);
            row
        })
        .collect()
}
