//! Derived report datasets: cash-flow projection, per-community P&L,
//! occupancy breakdown, and CSV export. All pure functions of the
//! flattened asset snapshot plus a type filter.

mod cashflow;
mod community;
mod export;
pub mod views;

pub use cashflow::{build_cashflow, MONTH_LABELS};
pub use community::{build_community_pl, build_occupancy_breakdown};
pub use export::{assets_csv, write_assets_csv};
pub use views::{
    AssetTypeFilter, CashflowPoint, CommunityPnl, OccupancyRow, ProjectionAssumptions,
};
