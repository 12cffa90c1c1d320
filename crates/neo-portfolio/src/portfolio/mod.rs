//! Portfolio core: canonical records, normalization, aggregation,
//! reporting, persistence, and the application service tying them
//! together.

pub mod domain;
pub mod metrics;
pub mod normalizer;
pub mod reporting;
pub mod seed;
pub mod service;
pub mod store;

pub use domain::{Asset, AssetStatus, Client};
pub use metrics::{OwnedAsset, PortfolioMetrics};
pub use service::{PortfolioService, ServiceError, ValuationOutcome};
pub use store::{InMemoryStore, JsonFileStore, PortfolioStore, Preferences};
