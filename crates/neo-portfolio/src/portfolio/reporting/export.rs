use std::io::Write;

use super::views::{filtered, AssetTypeFilter};
use crate::portfolio::metrics::OwnedAsset;

/// Write the flattened, owner-annotated asset table as CSV, the payload
/// behind the reporting view's download affordance.
pub fn write_assets_csv<W: Write>(
    assets: &[OwnedAsset],
    filter: &AssetTypeFilter,
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "id",
        "name",
        "type",
        "area",
        "status",
        "owner_id",
        "owner",
        "value",
        "rent",
        "annual_expenses",
        "size_sqft",
    ])?;

    for owned in filtered(assets, filter) {
        let asset = &owned.asset;
        let value = format!("{:.2}", asset.value);
        let rent = format!("{:.2}", asset.rent);
        let expenses = format!("{:.2}", asset.annual_expenses());
        let size = format!("{:.1}", asset.size);
        csv_writer.write_record([
            asset.id.as_str(),
            asset.name.as_str(),
            asset.asset_type.as_str(),
            asset.area.as_str(),
            asset.status.label(),
            owned.owner_id.as_str(),
            owned.owner_name.as_str(),
            value.as_str(),
            rent.as_str(),
            expenses.as_str(),
            size.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Convenience wrapper returning the CSV as a string.
pub fn assets_csv(assets: &[OwnedAsset], filter: &AssetTypeFilter) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    write_assets_csv(assets, filter, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::domain::{Asset, AssetStatus};

    #[test]
    fn csv_contains_header_and_owner_annotation() {
        let assets = vec![OwnedAsset {
            owner_id: "c-001".to_string(),
            owner_name: "Test Owner".to_string(),
            asset: Asset {
                id: "a-101".to_string(),
                name: "Burj Khalifa Residence, 8802".to_string(),
                area: "Downtown Dubai".to_string(),
                status: AssetStatus::Rented,
                value: 18_500_000.0,
                rent: 1_200_000.0,
                ..Asset::default()
            },
        }];

        let csv = assets_csv(&assets, &AssetTypeFilter::All).expect("csv renders");
        let mut lines = csv.lines();
        assert!(lines.next().expect("header").starts_with("id,name,type"));
        let row = lines.next().expect("data row");
        assert!(row.contains("Test Owner"));
        assert!(row.contains("Rented"));
        assert!(row.contains("18500000.00"));
    }
}
