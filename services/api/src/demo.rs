use crate::infra::{build_store, AdvisoryBackend};
use chrono::Local;
use clap::Args;
use neo_portfolio::advisory::{
    AdvisoryError, MilestoneDraft, ValuationAdvisor, ValuationEstimate,
};
use neo_portfolio::config::AppConfig;
use neo_portfolio::error::AppError;
use neo_portfolio::portfolio::domain::Asset;
use neo_portfolio::portfolio::reporting::AssetTypeFilter;
use neo_portfolio::portfolio::{InMemoryStore, PortfolioService, PortfolioStore};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Restrict the report to one asset type (e.g. Apartment, Villa)
    #[arg(long)]
    pub(crate) asset_type: Option<String>,
    /// Print the asset CSV export instead of the report tables
    #[arg(long)]
    pub(crate) export_csv: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the payment plan portion of the demo
    #[arg(long)]
    pub(crate) skip_payment_plan: bool,
}

/// Print metrics and reports for whatever dataset the configured store
/// currently holds.
pub(crate) fn run_portfolio_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = Arc::new(build_store(&config.storage)?);
    let service = Arc::new(PortfolioService::new(
        store,
        Arc::new(AdvisoryBackend::Offline),
        config.projection,
    ));

    let filter = AssetTypeFilter::from_request(args.asset_type);
    if args.export_csv {
        print!("{}", service.export_assets_csv(&filter)?);
        return Ok(());
    }

    render_report(service.as_ref(), &filter);
    Ok(())
}

/// End-to-end walkthrough over the seed portfolio, including a scripted
/// advisory round trip. Nothing is persisted beyond the process.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = Arc::new(PortfolioService::new(
        Arc::new(InMemoryStore::default()),
        Arc::new(ScriptedDemoAdvisor),
        Default::default(),
    ));

    println!("Portfolio dashboard demo ({})", Local::now().date_naive());
    render_report(service.as_ref(), &AssetTypeFilter::All);

    println!("\nAdvisory valuation (scripted)");
    let outcome = service.request_valuation("a-101").await?;
    match &outcome.estimate {
        Some(estimate) if outcome.applied => {
            println!(
                "- a-101 revalued to AED {:.0} (confidence {:.0}%)",
                estimate.estimated_value,
                estimate.confidence * 100.0
            );
            println!("  {}", estimate.reasoning);
        }
        _ => println!("- a-101 valuation not applied, stored value unchanged"),
    }
    println!(
        "- portfolio AUM after valuation: AED {:.0}",
        service.metrics().total_aum
    );

    if !args.skip_payment_plan {
        println!("\nGenerated payment plan for a-102 (scripted)");
        let plan = service.generate_payment_plan("a-102").await?;
        for item in &plan {
            println!(
                "- {} | {:.0}% | AED {:.0} | due {}",
                item.milestone, item.percent, item.amount, item.date
            );
        }
    }

    Ok(())
}

fn render_report<S, V>(service: &PortfolioService<S, V>, filter: &AssetTypeFilter)
where
    S: PortfolioStore + 'static,
    V: ValuationAdvisor + 'static,
{
    let metrics = service.metrics();
    println!("Portfolio metrics");
    println!("- AUM: AED {:.0}", metrics.total_aum);
    println!("- annual rent (realized): AED {:.0}", metrics.total_rent);
    println!("- annual expenses: AED {:.0}", metrics.total_expenses);
    println!(
        "- units: {} ({} rented, {} vacant, {} off-plan) | occupancy {:.1}%",
        metrics.units,
        metrics.rented_units,
        metrics.vacant_units,
        metrics.off_plan_units,
        metrics.occupancy_rate
    );

    println!("\n12-month cash-flow projection");
    for point in service.cashflow_report(filter) {
        println!(
            "- {} | income {:>12.0} | expenses {:>12.0} | net {:>12.0}",
            point.month, point.income, point.expenses, point.net
        );
    }

    println!("\nCommunity P&L");
    for row in service.community_report(filter) {
        println!(
            "- {} | income {:.0} | expenses {:.0} | profit {:.0}",
            row.area, row.income, row.expenses, row.profit
        );
    }

    println!("\nOccupancy by asset type");
    for row in service.occupancy_report(filter) {
        println!(
            "- {} | {} rented / {} vacant / {} off-plan | {:.1}%",
            row.asset_type, row.rented, row.vacant, row.off_plan, row.occupancy_pct
        );
    }
}

/// Deterministic advisor so the demo works without network access or an
/// API key.
struct ScriptedDemoAdvisor;

#[async_trait::async_trait]
impl ValuationAdvisor for ScriptedDemoAdvisor {
    async fn estimate_valuation(&self, asset: &Asset) -> Result<ValuationEstimate, AdvisoryError> {
        Ok(ValuationEstimate {
            estimated_value: asset.value * 1.06,
            confidence: 0.82,
            reasoning: format!(
                "Comparable {} sales in {} closed about 6% above the stored value.",
                asset.asset_type, asset.area
            ),
        })
    }

    async fn generate_payment_plan(
        &self,
        _asset_name: &str,
        _total_value: f64,
    ) -> Result<Vec<MilestoneDraft>, AdvisoryError> {
        Ok(vec![
            MilestoneDraft {
                milestone: "Booking".to_string(),
                percent: 10.0,
                date: "2026-10-01".to_string(),
            },
            MilestoneDraft {
                milestone: "Construction 30%".to_string(),
                percent: 20.0,
                date: "2027-02-01".to_string(),
            },
            MilestoneDraft {
                milestone: "Construction 60%".to_string(),
                percent: 30.0,
                date: "2027-07-01".to_string(),
            },
            MilestoneDraft {
                milestone: "Handover".to_string(),
                percent: 40.0,
                date: "2028-01-01".to_string(),
            },
        ])
    }
}
