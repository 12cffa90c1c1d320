use super::views::{filtered, AssetTypeFilter, CashflowPoint, ProjectionAssumptions};
use crate::portfolio::metrics::OwnedAsset;

pub const MONTH_LABELS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Project twelve months of income versus operating expenses.
///
/// Income is the status-gated monthly rent scaled by the growth assumption
/// per month index; expenses are flat twelfths of the annual operating
/// costs of every filtered asset, occupied or not.
pub fn build_cashflow(
    assets: &[OwnedAsset],
    filter: &AssetTypeFilter,
    assumptions: &ProjectionAssumptions,
) -> Vec<CashflowPoint> {
    let mut monthly_rent = 0.0;
    let mut monthly_expenses = 0.0;
    for owned in filtered(assets, filter) {
        monthly_rent += owned.asset.realized_rent() / 12.0;
        monthly_expenses += owned.asset.annual_expenses() / 12.0;
    }

    MONTH_LABELS
        .iter()
        .enumerate()
        .map(|(index, month)| {
            let income = monthly_rent * (1.0 + assumptions.monthly_growth * index as f64);
            CashflowPoint {
                month,
                income,
                expenses: monthly_expenses,
                net: income - monthly_expenses,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::domain::{Asset, AssetStatus};

    fn owned(asset: Asset) -> OwnedAsset {
        OwnedAsset {
            owner_id: "c-001".to_string(),
            owner_name: "Owner".to_string(),
            asset,
        }
    }

    #[test]
    fn growth_applies_to_income_only() {
        let asset = Asset {
            id: "a-1".to_string(),
            status: AssetStatus::Rented,
            rent: 1_200_000.0,
            ..Asset::default()
        };
        let points = build_cashflow(
            &[owned(asset)],
            &AssetTypeFilter::All,
            &ProjectionAssumptions::default(),
        );

        assert_eq!(points.len(), 12);
        assert_eq!(points[0].month, "JAN");
        assert!((points[0].income - 100_000.0).abs() < 1e-6);
        assert!((points[11].income - 100_000.0 * 1.22).abs() < 1e-6);
        assert_eq!(points[0].expenses, 0.0);
        assert_eq!(points[11].net, points[11].income);
    }

    #[test]
    fn expenses_accrue_without_growth_and_regardless_of_occupancy() {
        let asset = Asset {
            id: "a-1".to_string(),
            status: AssetStatus::Vacant,
            rent: 600_000.0,
            service_charges: 120_000.0,
            ..Asset::default()
        };
        let points = build_cashflow(
            &[owned(asset)],
            &AssetTypeFilter::All,
            &ProjectionAssumptions::default(),
        );

        for point in &points {
            assert_eq!(point.income, 0.0);
            assert!((point.expenses - 10_000.0).abs() < 1e-9);
            assert!((point.net + 10_000.0).abs() < 1e-9);
        }
    }

    #[test]
    fn type_filter_restricts_the_asset_set() {
        let villa = Asset {
            id: "a-1".to_string(),
            asset_type: "Villa".to_string(),
            status: AssetStatus::Rented,
            rent: 240_000.0,
            ..Asset::default()
        };
        let apartment = Asset {
            id: "a-2".to_string(),
            status: AssetStatus::Rented,
            rent: 120_000.0,
            ..Asset::default()
        };
        let assets = vec![owned(villa), owned(apartment)];
        let points = build_cashflow(
            &assets,
            &AssetTypeFilter::Type("Villa".to_string()),
            &ProjectionAssumptions::default(),
        );
        assert!((points[0].income - 20_000.0).abs() < 1e-9);
    }
}
