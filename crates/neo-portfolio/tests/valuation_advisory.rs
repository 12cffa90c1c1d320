use std::sync::Arc;

use tokio::sync::Notify;

use neo_portfolio::advisory::{
    AdvisoryError, MilestoneDraft, ValuationAdvisor, ValuationEstimate,
};
use neo_portfolio::portfolio::domain::{Asset, MilestoneStatus};
use neo_portfolio::portfolio::reporting::ProjectionAssumptions;
use neo_portfolio::portfolio::{InMemoryStore, PortfolioService, ServiceError};

/// Advisor that replays a fixed script for every call.
struct ScriptedAdvisor {
    estimate: Result<f64, String>,
    plan: Result<Vec<MilestoneDraft>, String>,
}

impl ScriptedAdvisor {
    fn estimating(value: f64) -> Self {
        Self {
            estimate: Ok(value),
            plan: Err("no plan scripted".to_string()),
        }
    }

    fn planning(plan: Vec<MilestoneDraft>) -> Self {
        Self {
            estimate: Err("no estimate scripted".to_string()),
            plan: Ok(plan),
        }
    }

    fn failing(reason: &str) -> Self {
        Self {
            estimate: Err(reason.to_string()),
            plan: Err(reason.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl ValuationAdvisor for ScriptedAdvisor {
    async fn estimate_valuation(&self, _asset: &Asset) -> Result<ValuationEstimate, AdvisoryError> {
        match &self.estimate {
            Ok(value) => Ok(ValuationEstimate {
                estimated_value: *value,
                confidence: 0.9,
                reasoning: "comparable sales in the community".to_string(),
            }),
            Err(reason) => Err(AdvisoryError::Transport(reason.clone())),
        }
    }

    async fn generate_payment_plan(
        &self,
        _asset_name: &str,
        _total_value: f64,
    ) -> Result<Vec<MilestoneDraft>, AdvisoryError> {
        match &self.plan {
            Ok(plan) => Ok(plan.clone()),
            Err(reason) => Err(AdvisoryError::Transport(reason.clone())),
        }
    }
}

/// Advisor that parks inside the estimate call until released, so a test
/// can observe the in-flight window.
struct BlockingAdvisor {
    started: Notify,
    release: Notify,
}

#[async_trait::async_trait]
impl ValuationAdvisor for BlockingAdvisor {
    async fn estimate_valuation(&self, _asset: &Asset) -> Result<ValuationEstimate, AdvisoryError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(ValuationEstimate {
            estimated_value: 20_000_000.0,
            confidence: 0.8,
            reasoning: String::new(),
        })
    }

    async fn generate_payment_plan(
        &self,
        _asset_name: &str,
        _total_value: f64,
    ) -> Result<Vec<MilestoneDraft>, AdvisoryError> {
        Err(AdvisoryError::Unavailable("not scripted".to_string()))
    }
}

fn service_with<V: ValuationAdvisor + 'static>(
    advisor: Arc<V>,
) -> PortfolioService<InMemoryStore, V> {
    PortfolioService::new(
        Arc::new(InMemoryStore::default()),
        advisor,
        ProjectionAssumptions::default(),
    )
}

fn seed_asset(svc: &PortfolioService<InMemoryStore, impl ValuationAdvisor + 'static>) -> Asset {
    svc.clients()[0]
        .assets
        .iter()
        .find(|asset| asset.id == "a-101")
        .cloned()
        .expect("seed asset present")
}

#[tokio::test]
async fn accepted_estimate_updates_value_and_history() {
    let svc = service_with(Arc::new(ScriptedAdvisor::estimating(21_000_000.0)));
    let before = seed_asset(&svc);
    assert!(before.valuation_history.is_empty());

    let outcome = svc
        .request_valuation("a-101")
        .await
        .expect("valuation succeeds");
    assert!(outcome.applied);

    let after = seed_asset(&svc);
    assert_eq!(after.value, 21_000_000.0);
    assert_eq!(after.valuation_history.len(), 1);
    assert_eq!(after.valuation_history[0].value, 21_000_000.0);
}

#[tokio::test]
async fn failed_round_trip_never_touches_the_stored_value() {
    let svc = service_with(Arc::new(ScriptedAdvisor::failing("dns failure")));
    let outcome = svc
        .request_valuation("a-101")
        .await
        .expect("failure is not fatal");
    assert!(!outcome.applied);
    assert!(outcome.estimate.is_none());
    assert_eq!(seed_asset(&svc).value, 18_500_000.0);
    assert!(seed_asset(&svc).valuation_history.is_empty());
}

#[tokio::test]
async fn non_positive_estimate_is_reported_but_not_applied() {
    let svc = service_with(Arc::new(ScriptedAdvisor::estimating(0.0)));
    let outcome = svc
        .request_valuation("a-101")
        .await
        .expect("unusable estimate is not fatal");
    assert!(!outcome.applied);
    assert!(outcome.estimate.is_some());
    assert_eq!(seed_asset(&svc).value, 18_500_000.0);
}

#[tokio::test]
async fn unknown_asset_is_rejected_before_calling_the_advisor() {
    let svc = service_with(Arc::new(ScriptedAdvisor::estimating(1.0)));
    let err = svc
        .request_valuation("a-404")
        .await
        .expect_err("missing asset");
    assert!(matches!(err, ServiceError::AssetNotFound(_)));
}

#[tokio::test]
async fn concurrent_valuations_for_one_asset_are_rejected() {
    let advisor = Arc::new(BlockingAdvisor {
        started: Notify::new(),
        release: Notify::new(),
    });
    let svc = Arc::new(service_with(Arc::clone(&advisor)));

    let background = tokio::spawn({
        let svc = Arc::clone(&svc);
        async move { svc.request_valuation("a-101").await }
    });
    advisor.started.notified().await;

    let err = svc
        .request_valuation("a-101")
        .await
        .expect_err("second request rejected while first is in flight");
    assert!(matches!(err, ServiceError::ValuationInFlight(_)));

    advisor.release.notify_one();
    let outcome = background
        .await
        .expect("task completes")
        .expect("first request succeeds");
    assert!(outcome.applied);
    assert_eq!(seed_asset(&svc).value, 20_000_000.0);
}

#[tokio::test]
async fn generated_plan_is_priced_and_persisted() {
    let plan = vec![
        MilestoneDraft {
            milestone: "Booking".to_string(),
            percent: 20.0,
            date: "2026-09-01".to_string(),
        },
        MilestoneDraft {
            milestone: "Construction 50%".to_string(),
            percent: 40.0,
            date: "2027-03-01".to_string(),
        },
        MilestoneDraft {
            milestone: "Handover".to_string(),
            percent: 40.0,
            date: "2027-12-01".to_string(),
        },
    ];
    let svc = service_with(Arc::new(ScriptedAdvisor::planning(plan)));

    let items = svc
        .generate_payment_plan("a-101")
        .await
        .expect("plan accepted");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].amount, 0.2 * 18_500_000.0);
    assert!(items
        .iter()
        .all(|item| item.status == MilestoneStatus::Pending));

    let stored = seed_asset(&svc);
    assert_eq!(stored.payment_plan.len(), 3);
}

#[tokio::test]
async fn plan_with_bad_percent_sum_is_rejected() {
    let plan = vec![MilestoneDraft {
        milestone: "Booking".to_string(),
        percent: 60.0,
        date: "2026-09-01".to_string(),
    }];
    let svc = service_with(Arc::new(ScriptedAdvisor::planning(plan)));

    let err = svc
        .generate_payment_plan("a-101")
        .await
        .expect_err("sum far from 100");
    assert!(matches!(err, ServiceError::PaymentPlanPercent { .. }));
    assert!(seed_asset(&svc).payment_plan.is_empty());
}

#[tokio::test]
async fn plan_transport_failure_propagates() {
    let svc = service_with(Arc::new(ScriptedAdvisor::failing("gateway timeout")));
    let err = svc
        .generate_payment_plan("a-101")
        .await
        .expect_err("transport error surfaces");
    assert!(matches!(err, ServiceError::Advisory(_)));
}
