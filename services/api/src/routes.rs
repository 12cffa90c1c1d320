use crate::infra::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use neo_portfolio::advisory::ValuationAdvisor;
use neo_portfolio::error::AppError;
use neo_portfolio::portfolio::domain::{Asset, Client, PaymentPlanItem};
use neo_portfolio::portfolio::reporting::{
    AssetTypeFilter, CashflowPoint, CommunityPnl, OccupancyRow,
};
use neo_portfolio::portfolio::{
    OwnedAsset, PortfolioMetrics, PortfolioService, PortfolioStore, Preferences, ValuationOutcome,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Optional filters shared by the asset listing and every report endpoint.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AssetQuery {
    #[serde(default)]
    pub(crate) q: Option<String>,
    #[serde(default)]
    pub(crate) asset_type: Option<String>,
}

impl AssetQuery {
    fn filter(&self) -> AssetTypeFilter {
        AssetTypeFilter::from_request(self.asset_type.clone())
    }
}

type Service<S, V> = Arc<PortfolioService<S, V>>;

pub(crate) fn with_portfolio_routes<S, V>(service: Service<S, V>) -> Router
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/portfolio/metrics", get(portfolio_metrics::<S, V>))
        .route("/api/v1/portfolio/reset", post(reset_portfolio::<S, V>))
        .route(
            "/api/v1/clients",
            get(list_clients::<S, V>).post(upsert_client::<S, V>),
        )
        .route(
            "/api/v1/clients/:id",
            get(get_client::<S, V>).delete(remove_client::<S, V>),
        )
        .route("/api/v1/clients/:id/assets", post(upsert_asset::<S, V>))
        .route("/api/v1/assets", get(list_assets::<S, V>))
        .route("/api/v1/assets/:id", delete(remove_asset::<S, V>))
        .route(
            "/api/v1/assets/:id/valuation",
            post(request_valuation::<S, V>),
        )
        .route(
            "/api/v1/assets/:id/payment-plan",
            post(generate_payment_plan::<S, V>),
        )
        .route("/api/v1/reports/cashflow", get(cashflow_report::<S, V>))
        .route(
            "/api/v1/reports/community-pl",
            get(community_report::<S, V>),
        )
        .route("/api/v1/reports/occupancy", get(occupancy_report::<S, V>))
        .route("/api/v1/reports/export", get(export_assets::<S, V>))
        .route(
            "/api/v1/preferences",
            get(get_preferences::<S, V>).put(update_preferences::<S, V>),
        )
        .with_state(service)
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn portfolio_metrics<S, V>(
    State(service): State<Service<S, V>>,
) -> Json<PortfolioMetrics>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Json(service.metrics())
}

pub(crate) async fn reset_portfolio<S, V>(
    State(service): State<Service<S, V>>,
) -> Result<Json<Vec<Client>>, AppError>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Ok(Json(service.reset()?))
}

pub(crate) async fn list_clients<S, V>(State(service): State<Service<S, V>>) -> Json<Vec<Client>>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Json(service.clients())
}

pub(crate) async fn upsert_client<S, V>(
    State(service): State<Service<S, V>>,
    Json(payload): Json<Value>,
) -> Result<Json<Client>, AppError>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Ok(Json(service.upsert_client(&payload)?))
}

pub(crate) async fn get_client<S, V>(
    State(service): State<Service<S, V>>,
    Path(client_id): Path<String>,
) -> Result<Json<Client>, AppError>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Ok(Json(service.client(&client_id)?))
}

pub(crate) async fn remove_client<S, V>(
    State(service): State<Service<S, V>>,
    Path(client_id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    service.remove_client(&client_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn upsert_asset<S, V>(
    State(service): State<Service<S, V>>,
    Path(client_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Asset>, AppError>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Ok(Json(service.upsert_asset(&client_id, &payload)?))
}

pub(crate) async fn list_assets<S, V>(
    State(service): State<Service<S, V>>,
    Query(query): Query<AssetQuery>,
) -> Json<Vec<OwnedAsset>>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    let filter = query.filter();
    let assets = match query.q.as_deref() {
        Some(needle) => service.search_assets(needle),
        None => service.assets(),
    };
    let filtered = assets
        .into_iter()
        .filter(|owned| filter.matches(&owned.asset))
        .collect();
    Json(filtered)
}

pub(crate) async fn remove_asset<S, V>(
    State(service): State<Service<S, V>>,
    Path(asset_id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    service.remove_asset(&asset_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn request_valuation<S, V>(
    State(service): State<Service<S, V>>,
    Path(asset_id): Path<String>,
) -> Result<Json<ValuationOutcome>, AppError>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Ok(Json(service.request_valuation(&asset_id).await?))
}

pub(crate) async fn generate_payment_plan<S, V>(
    State(service): State<Service<S, V>>,
    Path(asset_id): Path<String>,
) -> Result<Json<Vec<PaymentPlanItem>>, AppError>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Ok(Json(service.generate_payment_plan(&asset_id).await?))
}

pub(crate) async fn cashflow_report<S, V>(
    State(service): State<Service<S, V>>,
    Query(query): Query<AssetQuery>,
) -> Json<Vec<CashflowPoint>>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Json(service.cashflow_report(&query.filter()))
}

pub(crate) async fn community_report<S, V>(
    State(service): State<Service<S, V>>,
    Query(query): Query<AssetQuery>,
) -> Json<Vec<CommunityPnl>>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Json(service.community_report(&query.filter()))
}

pub(crate) async fn occupancy_report<S, V>(
    State(service): State<Service<S, V>>,
    Query(query): Query<AssetQuery>,
) -> Json<Vec<OccupancyRow>>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Json(service.occupancy_report(&query.filter()))
}

pub(crate) async fn export_assets<S, V>(
    State(service): State<Service<S, V>>,
    Query(query): Query<AssetQuery>,
) -> Result<impl IntoResponse, AppError>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    let csv = service.export_assets_csv(&query.filter())?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"portfolio-assets.csv\"",
            ),
        ],
        csv,
    ))
}

pub(crate) async fn get_preferences<S, V>(State(service): State<Service<S, V>>) -> Json<Preferences>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Json(service.preferences())
}

pub(crate) async fn update_preferences<S, V>(
    State(service): State<Service<S, V>>,
    Json(payload): Json<Preferences>,
) -> Result<Json<Preferences>, AppError>
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    Ok(Json(service.update_preferences(payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::AdvisoryBackend;
    use axum::body::Body;
    use axum::http::Request;
    use neo_portfolio::portfolio::reporting::ProjectionAssumptions;
    use neo_portfolio::portfolio::InMemoryStore;
    use tower::util::ServiceExt;

    fn seeded_service() -> Service<InMemoryStore, AdvisoryBackend> {
        Arc::new(PortfolioService::new(
            Arc::new(InMemoryStore::default()),
            Arc::new(AdvisoryBackend::Offline),
            ProjectionAssumptions::default(),
        ))
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_the_seeded_aggregate() {
        let Json(metrics) = portfolio_metrics(State(seeded_service())).await;
        assert_eq!(metrics.units, 2);
        assert_eq!(metrics.total_aum, 63_500_000.0);
    }

    #[tokio::test]
    async fn asset_listing_honors_query_and_type_filter() {
        let service = seeded_service();
        let query = AssetQuery {
            q: Some("frond".to_string()),
            asset_type: None,
        };
        let Json(assets) = list_assets(State(Arc::clone(&service)), Query(query)).await;
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].asset.id, "a-102");

        let query = AssetQuery {
            q: None,
            asset_type: Some("Apartment".to_string()),
        };
        let Json(assets) = list_assets(State(service), Query(query)).await;
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].asset.id, "a-101");
    }

    #[tokio::test]
    async fn offline_advisory_keeps_the_stored_value() {
        let service = seeded_service();
        let Json(outcome) =
            request_valuation(State(Arc::clone(&service)), Path("a-101".to_string()))
                .await
                .expect("offline advisory is not fatal");
        assert!(!outcome.applied);
        assert_eq!(service.metrics().total_aum, 63_500_000.0);
    }

    #[tokio::test]
    async fn router_serves_health_and_clients() {
        let app = with_portfolio_routes(seeded_service());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("request succeeds");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/clients")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("request succeeds");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_asset_removal_maps_to_not_found() {
        let app = with_portfolio_routes(seeded_service());
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/assets/a-404")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("request succeeds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
