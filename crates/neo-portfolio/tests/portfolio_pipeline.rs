use std::sync::Arc;

use serde_json::json;

use neo_portfolio::advisory::{
    AdvisoryError, MilestoneDraft, ValuationAdvisor, ValuationEstimate,
};
use neo_portfolio::portfolio::domain::{Asset, AssetStatus};
use neo_portfolio::portfolio::reporting::{AssetTypeFilter, ProjectionAssumptions};
use neo_portfolio::portfolio::{InMemoryStore, PortfolioService, ServiceError};

struct OfflineAdvisor;

#[async_trait::async_trait]
impl ValuationAdvisor for OfflineAdvisor {
    async fn estimate_valuation(&self, _asset: &Asset) -> Result<ValuationEstimate, AdvisoryError> {
        Err(AdvisoryError::Unavailable("offline".to_string()))
    }

    async fn generate_payment_plan(
        &self,
        _asset_name: &str,
        _total_value: f64,
    ) -> Result<Vec<MilestoneDraft>, AdvisoryError> {
        Err(AdvisoryError::Unavailable("offline".to_string()))
    }
}

fn service() -> PortfolioService<InMemoryStore, OfflineAdvisor> {
    PortfolioService::new(
        Arc::new(InMemoryStore::default()),
        Arc::new(OfflineAdvisor),
        ProjectionAssumptions::default(),
    )
}

#[test]
fn fresh_service_serves_the_seed_portfolio() {
    let svc = service();
    let metrics = svc.metrics();
    assert_eq!(metrics.units, 2);
    assert_eq!(metrics.total_aum, 63_500_000.0);
    assert_eq!(metrics.total_rent, 1_200_000.0);
    assert_eq!(metrics.occupancy_rate, 50.0);
}

#[test]
fn upserting_a_messy_client_normalizes_every_field() {
    let svc = service();
    let client = svc
        .upsert_client(&json!({
            "id": "c-777",
            "name": "Fatima Holdings",
            "totalValue": 1.0,
            "totalUnits": 99,
            "tags": "not-an-array",
            "assets": [{
                "id": "a-771",
                "name": "Marina Gate 1204",
                "area": "Dubai Marina",
                "value": "2400000",
                "rent": -5000,
                "status": "sold",
                "paymentPlan": "garbage"
            }]
        }))
        .expect("upsert succeeds");

    assert!(client.tags.is_empty());
    assert_eq!(client.total_units, 1);
    assert_eq!(client.total_value, 2_400_000.0);
    let asset = &client.assets[0];
    assert_eq!(asset.value, 2_400_000.0);
    assert_eq!(asset.rent, 0.0);
    assert_eq!(asset.status, AssetStatus::Vacant);
    assert!(asset.payment_plan.is_empty());
}

#[test]
fn blank_ids_are_generated_and_unique() {
    let svc = service();
    let first = svc
        .upsert_client(&json!({ "name": "Owner One" }))
        .expect("first upsert");
    let second = svc
        .upsert_client(&json!({ "name": "Owner Two" }))
        .expect("second upsert");
    assert!(!first.id.is_empty());
    assert!(!second.id.is_empty());
    assert_ne!(first.id, second.id);
}

#[test]
fn cashflow_projection_grows_income_but_not_expenses() {
    let svc = service();
    let points = svc.cashflow_report(&AssetTypeFilter::All);
    assert_eq!(points.len(), 12);
    assert_eq!(points[0].month, "JAN");
    assert!((points[0].income - 100_000.0).abs() < 1e-6);
    assert!((points[11].income - 122_000.0).abs() < 1e-6);
    assert!((points[0].expenses - points[11].expenses).abs() < 1e-9);
}

#[test]
fn community_report_preserves_first_occurrence_order() {
    let svc = service();
    let rows = svc.community_report(&AssetTypeFilter::All);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].area, "Downtown Dubai");
    assert_eq!(rows[1].area, "Palm Jumeirah");
    assert_eq!(rows[0].income, 1_200_000.0);
    assert_eq!(rows[0].profit, 1_200_000.0 - 230_000.0);
    assert_eq!(rows[1].income, 0.0);
    assert_eq!(rows[1].profit, -400_000.0);
}

#[test]
fn type_filter_narrows_reports() {
    let svc = service();
    let filter = AssetTypeFilter::from_request(Some("Villa".to_string()));
    let rows = svc.community_report(&filter);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].area, "Palm Jumeirah");

    let points = svc.cashflow_report(&filter);
    assert_eq!(points[0].income, 0.0);
}

#[test]
fn asset_search_matches_name_and_community() {
    let svc = service();
    assert_eq!(svc.search_assets("burj").len(), 1);
    assert_eq!(svc.search_assets("jumeirah").len(), 1);
    assert_eq!(svc.search_assets("").len(), 2);
    assert!(svc.search_assets("zzz").is_empty());
}

#[test]
fn removing_an_asset_refreshes_owner_totals() {
    let svc = service();
    svc.remove_asset("a-102").expect("removal succeeds");
    let client = svc.client("c-001").expect("client present");
    assert_eq!(client.total_units, 1);
    assert_eq!(client.total_value, 18_500_000.0);

    let err = svc.remove_asset("a-102").expect_err("already gone");
    assert!(matches!(err, ServiceError::AssetNotFound(_)));
}

#[test]
fn reset_restores_the_seed_after_mutations() {
    let svc = service();
    svc.remove_client("c-001").expect("removal succeeds");
    assert!(svc.clients().is_empty());

    let restored = svc.reset().expect("reset succeeds");
    assert_eq!(restored.len(), 1);
    assert_eq!(svc.metrics().total_aum, 63_500_000.0);
}

#[test]
fn csv_export_lists_filtered_assets() {
    let svc = service();
    let csv = svc
        .export_assets_csv(&AssetTypeFilter::All)
        .expect("export succeeds");
    let mut lines = csv.lines();
    let header = lines.next().expect("header row");
    assert!(header.starts_with("id,name,type,area,status"));
    assert_eq!(lines.count(), 2);
}

#[test]
fn state_survives_a_service_restart() {
    let store = Arc::new(InMemoryStore::default());
    {
        let svc = PortfolioService::new(
            Arc::clone(&store),
            Arc::new(OfflineAdvisor),
            ProjectionAssumptions::default(),
        );
        svc.upsert_client(&json!({ "id": "c-900", "name": "Persisted Owner" }))
            .expect("upsert succeeds");
    }

    let reopened = PortfolioService::new(
        store,
        Arc::new(OfflineAdvisor),
        ProjectionAssumptions::default(),
    );
    assert!(reopened
        .clients()
        .iter()
        .any(|client| client.id == "c-900"));
}
