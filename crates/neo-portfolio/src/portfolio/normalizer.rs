//! Canonicalizes loosely-typed persisted records.
//!
//! Anything read from or written to the store passes through here. The
//! policy is deliberately permissive: the data comes from a single trusted
//! local store, so malformed fields degrade silently to template defaults
//! instead of raising errors.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::domain::{Asset, AssetStatus, Client};

/// Fields coerced to a finite, non-negative number during normalization.
const NUMERIC_ASSET_FIELDS: [&str; 10] = [
    "size",
    "value",
    "rent",
    "serviceCharges",
    "managementFee",
    "otherExpenses",
    "purchasePrice",
    "acquisitionCosts",
    "mortgageBalance",
    "annualMortgagePayment",
];

/// Canonical asset fields. Raw keys outside this set pass through into the
/// asset's `extra` map unchanged, keeping older or newer persisted shapes
/// loadable.
const ASSET_FIELDS: [&str; 45] = [
    "id",
    "name",
    "type",
    "area",
    "status",
    "masterCommunity",
    "subCommunity",
    "buildingName",
    "developer",
    "publicUnitNo",
    "size",
    "bedrooms",
    "bathrooms",
    "floor",
    "parking",
    "furniture",
    "sourceOfAsset",
    "value",
    "rent",
    "expiry",
    "serviceCharges",
    "managementFee",
    "otherExpenses",
    "purchasePrice",
    "purchaseDate",
    "acquisitionCosts",
    "leaseStartDate",
    "leaseEndDate",
    "rentFrequency",
    "isMortgaged",
    "mortgageBalance",
    "annualMortgagePayment",
    "vacantSince",
    "constructionStatus",
    "handoverStatus",
    "baselineConstructionProgressPercent",
    "actualConstructionProgressPercent",
    "expectedHandoverDate",
    "spaSignedDate",
    "paymentPlan",
    "valuationHistory",
    "cheques",
    "maintenance",
    "documents",
    "rentalHistory",
];

/// Owner back-references are derived at aggregation time, never trusted
/// from storage; they are stripped here rather than carried into `extra`.
const DERIVED_ASSET_FIELDS: [&str; 2] = ["clientName", "ownerId"];

const CLIENT_FIELDS: [&str; 12] = [
    "id",
    "name",
    "email",
    "phone",
    "nationality",
    "passport",
    "emiratesId",
    "type",
    "tags",
    "assets",
    "totalValue",
    "totalUnits",
];

/// Produce a canonical [`Asset`] from an arbitrary raw record.
///
/// Pure and idempotent: normalizing an already-normalized asset yields an
/// identical asset.
pub fn normalize_asset(raw: &Value) -> Asset {
    let empty = Map::new();
    let map = raw.as_object().unwrap_or(&empty);
    let template = Asset::default();

    let mut asset = Asset {
        id: text(map, "id", &template.id),
        name: text(map, "name", &template.name),
        asset_type: text(map, "type", &template.asset_type),
        area: text(map, "area", &template.area),
        status: status(map),
        master_community: text(map, "masterCommunity", &template.master_community),
        sub_community: text(map, "subCommunity", &template.sub_community),
        building_name: text(map, "buildingName", &template.building_name),
        developer: text(map, "developer", &template.developer),
        public_unit_no: text(map, "publicUnitNo", &template.public_unit_no),
        size: numeric(map, "size"),
        bedrooms: text(map, "bedrooms", &template.bedrooms),
        bathrooms: text(map, "bathrooms", &template.bathrooms),
        floor: text(map, "floor", &template.floor),
        parking: text(map, "parking", &template.parking),
        furniture: text(map, "furniture", &template.furniture),
        source_of_asset: text(map, "sourceOfAsset", &template.source_of_asset),
        value: numeric(map, "value"),
        rent: numeric(map, "rent"),
        expiry: text(map, "expiry", &template.expiry),
        service_charges: numeric(map, "serviceCharges"),
        management_fee: numeric(map, "managementFee"),
        other_expenses: numeric(map, "otherExpenses"),
        purchase_price: numeric(map, "purchasePrice"),
        purchase_date: text(map, "purchaseDate", &template.purchase_date),
        acquisition_costs: numeric(map, "acquisitionCosts"),
        lease_start_date: text(map, "leaseStartDate", &template.lease_start_date),
        lease_end_date: text(map, "leaseEndDate", &template.lease_end_date),
        rent_frequency: text(map, "rentFrequency", &template.rent_frequency),
        is_mortgaged: flag(map, "isMortgaged", template.is_mortgaged),
        mortgage_balance: numeric(map, "mortgageBalance"),
        annual_mortgage_payment: numeric(map, "annualMortgagePayment"),
        vacant_since: text(map, "vacantSince", &template.vacant_since),
        construction_status: text(map, "constructionStatus", &template.construction_status),
        handover_status: text(map, "handoverStatus", &template.handover_status),
        baseline_construction_progress_percent: numeric(
            map,
            "baselineConstructionProgressPercent",
        ),
        actual_construction_progress_percent: numeric(map, "actualConstructionProgressPercent"),
        expected_handover_date: text(map, "expectedHandoverDate", &template.expected_handover_date),
        spa_signed_date: text(map, "spaSignedDate", &template.spa_signed_date),
        payment_plan: records(map, "paymentPlan"),
        valuation_history: records(map, "valuationHistory"),
        cheques: records(map, "cheques"),
        maintenance: records(map, "maintenance"),
        documents: records(map, "documents"),
        rental_history: records(map, "rentalHistory"),
        extra: Map::new(),
    };

    asset.extra = passthrough(map, &ASSET_FIELDS, &DERIVED_ASSET_FIELDS);
    asset
}

/// Produce a canonical [`Client`], normalizing every contained asset first
/// and recomputing the owned totals unconditionally. Stale persisted
/// `totalValue`/`totalUnits` values are discarded.
pub fn normalize_client(raw: &Value) -> Client {
    let empty = Map::new();
    let map = raw.as_object().unwrap_or(&empty);

    let assets: Vec<Asset> = map
        .get("assets")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(normalize_asset).collect())
        .unwrap_or_default();

    let mut client = Client {
        id: text(map, "id", ""),
        name: text(map, "name", ""),
        email: text(map, "email", ""),
        phone: text(map, "phone", ""),
        nationality: text(map, "nationality", ""),
        passport: text(map, "passport", ""),
        emirates_id: text(map, "emiratesId", ""),
        client_type: text(map, "type", ""),
        tags: tags(map),
        assets,
        total_value: 0.0,
        total_units: 0,
        extra: passthrough(map, &CLIENT_FIELDS, &[]),
    };
    client.recompute_totals();
    client
}

/// Coerce a raw value to a finite, non-negative number; anything else
/// (missing, null, wrong type, unparsable or negative) becomes 0.
fn numeric(map: &Map<String, Value>, key: &str) -> f64 {
    let parsed = match map.get(key) {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(0.0)
}

fn text(map: &Map<String, Value>, key: &str, default: &str) -> String {
    match map.get(key) {
        Some(Value::String(value)) => value.clone(),
        _ => default.to_string(),
    }
}

fn flag(map: &Map<String, Value>, key: &str, default: bool) -> bool {
    match map.get(key) {
        Some(Value::Bool(value)) => *value,
        _ => default,
    }
}

fn status(map: &Map<String, Value>) -> AssetStatus {
    match map.get("status") {
        Some(Value::String(value)) => AssetStatus::from(value.clone()),
        _ => AssetStatus::default(),
    }
}

/// Sequence coercion for `tags`: non-sequences become empty, non-string
/// entries are dropped.
fn tags(map: &Map<String, Value>) -> Vec<String> {
    map.get("tags")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Lenient collection extraction: malformed entries are skipped rather
/// than failing the record.
fn records<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Vec<T> {
    map.get(key)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn passthrough(
    map: &Map<String, Value>,
    known: &[&str],
    dropped: &[&str],
) -> Map<String, Value> {
    map.iter()
        .filter(|(key, _)| {
            !known.contains(&key.as_str()) && !dropped.contains(&key.as_str())
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_backfill_from_template() {
        let asset = normalize_asset(&json!({ "id": "a-1" }));
        assert_eq!(asset.asset_type, "Apartment");
        assert_eq!(asset.furniture, "N/A");
        assert_eq!(asset.status, AssetStatus::Vacant);
        assert_eq!(asset.value, 0.0);
        assert!(asset.payment_plan.is_empty());
    }

    #[test]
    fn numeric_strings_are_accepted_and_garbage_becomes_zero() {
        let asset = normalize_asset(&json!({
            "value": "1500000.5",
            "rent": "not a number",
            "serviceCharges": null,
            "managementFee": true,
            "purchasePrice": -40_000.0
        }));
        assert_eq!(asset.value, 1_500_000.5);
        assert_eq!(asset.rent, 0.0);
        assert_eq!(asset.service_charges, 0.0);
        assert_eq!(asset.management_fee, 0.0);
        assert_eq!(asset.purchase_price, 0.0);
    }

    #[test]
    fn unknown_fields_pass_through_and_derived_backrefs_are_stripped() {
        let asset = normalize_asset(&json!({
            "id": "a-9",
            "customNote": "keep me",
            "clientName": "stale owner",
            "ownerId": "c-stale"
        }));
        assert_eq!(asset.extra.get("customNote"), Some(&json!("keep me")));
        assert!(!asset.extra.contains_key("clientName"));
        assert!(!asset.extra.contains_key("ownerId"));
    }

    #[test]
    fn tags_coerce_to_empty_when_not_a_sequence() {
        let client = normalize_client(&json!({ "id": "c-1", "tags": "HNWI" }));
        assert!(client.tags.is_empty());

        let client = normalize_client(&json!({ "tags": ["HNWI", 7, "Institutional"] }));
        assert_eq!(client.tags, vec!["HNWI", "Institutional"]);
    }

    #[test]
    fn client_totals_are_recomputed_from_assets() {
        let client = normalize_client(&json!({
            "id": "c-1",
            "totalValue": 1.0,
            "totalUnits": 99,
            "assets": [
                { "id": "a-1", "value": 5_000_000.0 },
                { "id": "a-2", "value": "3250000" }
            ]
        }));
        assert_eq!(client.total_value, 8_250_000.0);
        assert_eq!(client.total_units, 2);
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = json!({
            "id": "a-1",
            "value": "1200000",
            "status": "Leased-ish",
            "tags_of_future": ["x"],
            "cheques": [{ "id": 3, "amount": "oops" }, { "id": "ch-2", "amount": 10.0 }]
        });
        let once = normalize_asset(&raw);
        let twice = normalize_asset(&serde_json::to_value(&once).expect("asset serializes"));
        assert_eq!(once, twice);

        let raw_client = json!({ "name": "Owner", "assets": [raw] });
        let once = normalize_client(&raw_client);
        let twice = normalize_client(&serde_json::to_value(&once).expect("client serializes"));
        assert_eq!(once, twice);
    }
}
