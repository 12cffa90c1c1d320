use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Occupancy state of a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum AssetStatus {
    Rented,
    Vacant,
    #[serde(rename = "Off-Plan")]
    OffPlan,
}

impl AssetStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Rented => "Rented",
            Self::Vacant => "Vacant",
            Self::OffPlan => "Off-Plan",
        }
    }
}

impl From<String> for AssetStatus {
    fn from(value: String) -> Self {
        match value.trim() {
            "Rented" => Self::Rented,
            "Off-Plan" => Self::OffPlan,
            // Unknown strings fall back to the template default.
            _ => Self::Vacant,
        }
    }
}

impl Default for AssetStatus {
    fn default() -> Self {
        Self::Vacant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum MilestoneStatus {
    Pending,
    Paid,
}

impl From<String> for MilestoneStatus {
    fn from(value: String) -> Self {
        match value.trim() {
            "Paid" => Self::Paid,
            _ => Self::Pending,
        }
    }
}

impl Default for MilestoneStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ChequeStatus {
    Pending,
    Cleared,
}

impl From<String> for ChequeStatus {
    fn from(value: String) -> Self {
        match value.trim() {
            "Cleared" => Self::Cleared,
            _ => Self::Pending,
        }
    }
}

impl Default for ChequeStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum MaintenanceStatus {
    Pending,
    Resolved,
}

impl From<String> for MaintenanceStatus {
    fn from(value: String) -> Self {
        match value.trim() {
            "Resolved" => Self::Resolved,
            _ => Self::Pending,
        }
    }
}

impl Default for MaintenanceStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum RentalStatus {
    Active,
    Completed,
    Terminated,
}

impl From<String> for RentalStatus {
    fn from(value: String) -> Self {
        match value.trim() {
            "Completed" => Self::Completed,
            "Terminated" => Self::Terminated,
            _ => Self::Active,
        }
    }
}

impl Default for RentalStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// One payment-plan milestone on an off-plan unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentPlanItem {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    pub milestone: String,
    pub percent: f64,
    pub amount: f64,
    pub date: String,
    pub status: MilestoneStatus,
}

/// Point in an asset's valuation history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValuationEntry {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChequeRecord {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    pub date: String,
    pub amount: f64,
    pub status: ChequeStatus,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MaintenanceRecord {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    pub date: String,
    pub issue: String,
    pub cost: f64,
    pub status: MaintenanceStatus,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RentalRecord {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    pub tenant_name: String,
    pub start_date: String,
    pub end_date: String,
    pub rent_amount: f64,
    pub status: RentalStatus,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentRecord {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub date: String,
}

/// A single real-estate unit in canonical, fully-typed shape.
///
/// Every field of the default template is guaranteed present after
/// normalization; unrecognized persisted fields survive round trips in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub area: String,
    pub status: AssetStatus,
    pub master_community: String,
    pub sub_community: String,
    pub building_name: String,
    pub developer: String,
    pub public_unit_no: String,
    pub size: f64,
    pub bedrooms: String,
    pub bathrooms: String,
    pub floor: String,
    pub parking: String,
    pub furniture: String,
    pub source_of_asset: String,
    pub value: f64,
    pub rent: f64,
    pub expiry: String,
    pub service_charges: f64,
    pub management_fee: f64,
    pub other_expenses: f64,
    pub purchase_price: f64,
    pub purchase_date: String,
    pub acquisition_costs: f64,
    pub lease_start_date: String,
    pub lease_end_date: String,
    pub rent_frequency: String,
    pub is_mortgaged: bool,
    pub mortgage_balance: f64,
    pub annual_mortgage_payment: f64,
    pub vacant_since: String,
    pub construction_status: String,
    pub handover_status: String,
    pub baseline_construction_progress_percent: f64,
    pub actual_construction_progress_percent: f64,
    pub expected_handover_date: String,
    pub spa_signed_date: String,
    pub payment_plan: Vec<PaymentPlanItem>,
    pub valuation_history: Vec<ValuationEntry>,
    pub cheques: Vec<ChequeRecord>,
    pub maintenance: Vec<MaintenanceRecord>,
    pub documents: Vec<DocumentRecord>,
    pub rental_history: Vec<RentalRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Asset {
    /// Annual operating cost regardless of occupancy.
    pub fn annual_expenses(&self) -> f64 {
        self.service_charges + self.management_fee + self.other_expenses
    }

    /// Rent the unit actually realizes; vacant and off-plan units earn 0.
    pub fn realized_rent(&self) -> f64 {
        match self.status {
            AssetStatus::Rented => self.rent,
            AssetStatus::Vacant | AssetStatus::OffPlan => 0.0,
        }
    }
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            asset_type: "Apartment".to_string(),
            area: String::new(),
            status: AssetStatus::Vacant,
            master_community: String::new(),
            sub_community: String::new(),
            building_name: String::new(),
            developer: String::new(),
            public_unit_no: String::new(),
            size: 0.0,
            bedrooms: String::new(),
            bathrooms: String::new(),
            floor: String::new(),
            parking: String::new(),
            furniture: "N/A".to_string(),
            source_of_asset: "Other".to_string(),
            value: 0.0,
            rent: 0.0,
            expiry: String::new(),
            service_charges: 0.0,
            management_fee: 0.0,
            other_expenses: 0.0,
            purchase_price: 0.0,
            purchase_date: String::new(),
            acquisition_costs: 0.0,
            lease_start_date: String::new(),
            lease_end_date: String::new(),
            rent_frequency: String::new(),
            is_mortgaged: false,
            mortgage_balance: 0.0,
            annual_mortgage_payment: 0.0,
            vacant_since: String::new(),
            construction_status: "In Progress".to_string(),
            handover_status: "Not Handed Over".to_string(),
            baseline_construction_progress_percent: 0.0,
            actual_construction_progress_percent: 0.0,
            expected_handover_date: String::new(),
            spa_signed_date: String::new(),
            payment_plan: Vec::new(),
            valuation_history: Vec::new(),
            cheques: Vec::new(),
            maintenance: Vec::new(),
            documents: Vec::new(),
            rental_history: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// A portfolio owner and the units they hold.
///
/// `total_value` and `total_units` are derived: normalization recomputes
/// them from the asset collection and discards whatever was persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub nationality: String,
    pub passport: String,
    pub emirates_id: String,
    #[serde(rename = "type")]
    pub client_type: String,
    pub tags: Vec<String>,
    pub assets: Vec<Asset>,
    pub total_value: f64,
    pub total_units: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Client {
    /// Re-derive the owned totals from the current asset collection.
    pub fn recompute_totals(&mut self) {
        self.total_value = self.assets.iter().map(|asset| asset.value).sum();
        self.total_units = self.assets.len();
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    })
}
