//! Built-in first-run dataset used whenever the persisted store is absent
//! or unreadable.

use serde_json::json;

use super::domain::Client;
use super::normalizer::normalize_client;

/// Demo portfolio: one VIP owner holding a rented Downtown apartment and a
/// vacant Palm Jumeirah villa. Routed through the normalizer so the seed
/// obeys the same canonical shape as persisted data.
pub fn seed_clients() -> Vec<Client> {
    vec![normalize_client(&json!({
        "id": "c-001",
        "name": "Sheikh Ahmed Al-Maktoum",
        "email": "ahmed@dubaiholding.ae",
        "phone": "+971 50 111 2233",
        "nationality": "Emirati",
        "emiratesId": "784-1975-1234567-1",
        "passport": "P784001",
        "type": "VIP Individual",
        "tags": ["HNWI", "Institutional"],
        "assets": [
            {
                "id": "a-101",
                "name": "Burj Khalifa Residence, 8802",
                "area": "Downtown Dubai",
                "buildingName": "Burj Khalifa",
                "type": "Apartment",
                "value": 18_500_000.0,
                "rent": 1_200_000.0,
                "status": "Rented",
                "bedrooms": "4",
                "bathrooms": "5",
                "size": 4_500.0,
                "purchasePrice": 15_000_000.0,
                "serviceCharges": 150_000.0,
                "managementFee": 60_000.0,
                "otherExpenses": 20_000.0
            },
            {
                "id": "a-102",
                "name": "Signature Villa, Frond J",
                "area": "Palm Jumeirah",
                "buildingName": "Frond J Villa",
                "type": "Villa",
                "value": 45_000_000.0,
                "rent": 3_500_000.0,
                "status": "Vacant",
                "bedrooms": "6",
                "bathrooms": "8",
                "size": 12_000.0,
                "purchasePrice": 38_000_000.0,
                "serviceCharges": 250_000.0,
                "managementFee": 100_000.0,
                "otherExpenses": 50_000.0
            }
        ]
    }))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_totals_are_derived_not_declared() {
        let clients = seed_clients();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].total_units, 2);
        assert_eq!(clients[0].total_value, 63_500_000.0);
    }
}
