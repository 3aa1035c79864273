//! `venue-data.js`: the map page's embedded venue array.
//!
//! ```text
//! // Venue data embedded from CSV
//! // <with> venues have coordinates, <without> need geocoding
//! const VENUE_DATA = [ ...2-space indented JSON... ];
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use venuemap_recon::{CoverageStats, VenueRecord};

use crate::atomic::write_atomic;
use crate::csv::read_file_as_utf8;

const DATA_MARKER: &str = "const VENUE_DATA =";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VenueEntry {
    #[serde(default)]
    id: usize,
    #[serde(default)]
    name: String,
    #[serde(default)]
    address1: String,
    #[serde(default)]
    address2: String,
    #[serde(default)]
    town: String,
    #[serde(default)]
    post_code: String,
    #[serde(default)]
    country: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    county: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    region: String,
    #[serde(default, rename = "type")]
    venue_type: String,
    #[serde(default)]
    account_manager: String,
    #[serde(default)]
    account_manager_email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    quantity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    #[serde(default)]
    full_address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    original_order: String,
}

fn or_default(value: &str, default: &str) -> String {
    let v = value.trim();
    if v.is_empty() {
        default.to_string()
    } else {
        v.to_string()
    }
}

impl VenueEntry {
    fn from_record(id: usize, record: &VenueRecord) -> Self {
        let coords = record.coordinates();
        Self {
            id,
            name: or_default(&record.name, "Unknown Venue"),
            address1: record.address1.trim().to_string(),
            address2: record.address2.trim().to_string(),
            town: record.town.trim().to_string(),
            post_code: record.postcode.trim().to_string(),
            country: or_default(&record.country, "UK"),
            county: record.county.trim().to_string(),
            region: record.region.trim().to_string(),
            venue_type: or_default(&record.venue_type, "Unknown"),
            account_manager: record.account_manager.trim().to_string(),
            account_manager_email: record.account_manager_email.trim().to_string(),
            phone: record.phone.trim().to_string(),
            quantity: or_default(&record.quantity, "1"),
            latitude: coords.map(|c| c.latitude),
            longitude: coords.map(|c| c.longitude),
            full_address: record.full_address(),
            original_order: record.order.trim().to_string(),
        }
    }

    fn into_record(self) -> VenueRecord {
        VenueRecord {
            order: self.original_order,
            name: self.name,
            address1: self.address1,
            address2: self.address2,
            town: self.town,
            postcode: self.post_code,
            country: self.country,
            county: self.county,
            region: self.region,
            venue_type: self.venue_type,
            account_manager: self.account_manager,
            account_manager_email: self.account_manager_email,
            phone: self.phone,
            quantity: self.quantity,
            latitude: self.latitude,
            longitude: self.longitude,
            extra: Vec::new(),
        }
    }
}

/// Render the whole artifact. Same records in, same bytes out.
pub fn render_venue_data(records: &[VenueRecord]) -> Result<(String, CoverageStats), String> {
    let stats = CoverageStats::from_records(records);
    let entries: Vec<VenueEntry> = records
        .iter()
        .enumerate()
        .map(|(id, r)| VenueEntry::from_record(id, r))
        .collect();
    let json = serde_json::to_string_pretty(&entries).map_err(|e| e.to_string())?;

    let text = format!(
        "// Venue data embedded from CSV\n\
         // {} venues have coordinates, {} need geocoding\n\
         {} {};\n",
        stats.with_coordinates, stats.without_coordinates, DATA_MARKER, json
    );
    Ok((text, stats))
}

/// Render and atomically replace `path`. Returns coordinate coverage.
pub fn write_venue_data(records: &[VenueRecord], path: &Path) -> Result<CoverageStats, String> {
    let (text, stats) = render_venue_data(records)?;
    write_atomic(path, text.as_bytes())?;
    log::info!(
        "wrote {} venues to {} ({} with coordinates)",
        stats.total,
        path.display(),
        stats.with_coordinates
    );
    Ok(stats)
}

/// Parse a previously written artifact back into records. Display defaults
/// (`Unknown Venue`, `UK`, ...) come back as written.
pub fn parse_venue_data(text: &str) -> Result<Vec<VenueRecord>, String> {
    let after = text
        .find(DATA_MARKER)
        .map(|i| &text[i + DATA_MARKER.len()..])
        .ok_or_else(|| format!("'{}' not found", DATA_MARKER))?;
    let start = after
        .find('[')
        .ok_or_else(|| "venue array start '[' not found".to_string())?;
    let end = after
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or_else(|| "venue array end ']' not found".to_string())?;

    let entries: Vec<VenueEntry> =
        serde_json::from_str(&after[start..=end]).map_err(|e| format!("invalid venue array: {}", e))?;
    Ok(entries.into_iter().map(VenueEntry::into_record).collect())
}

pub fn read_venue_data(path: &Path) -> Result<Vec<VenueRecord>, String> {
    let text = read_file_as_utf8(path)?;
    parse_venue_data(&text).map_err(|e| format!("{}: {}", path.display(), e))
}
