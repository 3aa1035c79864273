// Venue CSV import/export

use std::io::Read;
use std::path::Path;

use venuemap_recon::VenueRecord;

use crate::atomic::write_atomic;

/// Columns the pipeline reads and writes, in canonical order.
pub const COLUMNS: [&str; 16] = [
    "OriginalOrder",
    "Name",
    "Address1",
    "Address2",
    "Town",
    "PostCode",
    "Country",
    "County",
    "Region",
    "Type",
    "Account Manager Name",
    "Account Manager Email",
    "Phone Number",
    "Quantity",
    "Latitude",
    "Longitude",
];

/// A loaded venue file: header order plus the parsed rows.
///
/// `headers` is the input header row with any pipeline columns it lacked
/// appended, so writing back keeps the user's column layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VenueSheet {
    pub headers: Vec<String>,
    pub records: Vec<VenueRecord>,
}

impl VenueSheet {
    pub fn new(records: Vec<VenueRecord>) -> Self {
        let mut sheet = Self {
            headers: Vec::new(),
            records,
        };
        sheet.complete_headers();
        sheet
    }

    /// Append columns present in `other` but not here (extras from a
    /// supplement file).
    pub fn absorb_headers(&mut self, other: &VenueSheet) {
        for h in &other.headers {
            if !self.headers.contains(h) {
                self.headers.push(h.clone());
            }
        }
    }

    fn complete_headers(&mut self) {
        for col in COLUMNS {
            if !self.headers.iter().any(|h| h == col) {
                self.headers.push(col.to_string());
            }
        }
    }
}

/// Read file and convert to UTF-8 if needed (Excel exports are often Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file =
        std::fs::File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

pub fn load_venues(path: &Path) -> Result<VenueSheet, String> {
    let content = read_file_as_utf8(path)?;
    parse_venues(&content).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Parse venue CSV text. Unreadable rows are skipped with a warning;
/// unparseable coordinates become absent.
pub fn parse_venues(content: &str) -> Result<VenueSheet, String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("invalid header row: {}", e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err("missing header row".to_string());
    }

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::warn!("skipping row {}: {}", line, e);
                continue;
            }
        };
        if row.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let mut record = VenueRecord::default();
        for (col, header) in headers.iter().enumerate() {
            let value = row.get(col).unwrap_or("");
            set_field(&mut record, header, value, line);
        }
        records.push(record);
    }

    let mut sheet = VenueSheet { headers, records };
    sheet.complete_headers();
    Ok(sheet)
}

fn set_field(record: &mut VenueRecord, header: &str, value: &str, line: usize) {
    let v = value.to_string();
    match header {
        "OriginalOrder" => record.order = v,
        "Name" => record.name = v,
        "Address1" => record.address1 = v,
        "Address2" => record.address2 = v,
        "Town" => record.town = v,
        "PostCode" => record.postcode = v,
        "Country" => record.country = v,
        "County" => record.county = v,
        "Region" => record.region = v,
        "Type" => record.venue_type = v,
        "Account Manager Name" => record.account_manager = v,
        "Account Manager Email" => record.account_manager_email = v,
        "Phone Number" => record.phone = v,
        "Quantity" => record.quantity = v,
        "Latitude" => record.latitude = parse_coordinate(value, "latitude", line),
        "Longitude" => record.longitude = parse_coordinate(value, "longitude", line),
        _ => record.extra.push((header.to_string(), v)),
    }
}

fn parse_coordinate(value: &str, what: &str, line: usize) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => {
            log::warn!("row {}: ignoring invalid {} '{}'", line, what, trimmed);
            None
        }
    }
}

fn get_field(record: &VenueRecord, header: &str) -> String {
    match header {
        "OriginalOrder" => record.order.clone(),
        "Name" => record.name.clone(),
        "Address1" => record.address1.clone(),
        "Address2" => record.address2.clone(),
        "Town" => record.town.clone(),
        "PostCode" => record.postcode.clone(),
        "Country" => record.country.clone(),
        "County" => record.county.clone(),
        "Region" => record.region.clone(),
        "Type" => record.venue_type.clone(),
        "Account Manager Name" => record.account_manager.clone(),
        "Account Manager Email" => record.account_manager_email.clone(),
        "Phone Number" => record.phone.clone(),
        "Quantity" => record.quantity.clone(),
        "Latitude" => format_coordinate(record.latitude),
        "Longitude" => format_coordinate(record.longitude),
        _ => record
            .extra
            .iter()
            .find(|(k, _)| k == header)
            .map(|(_, v)| v.clone())
            .unwrap_or_default(),
    }
}

fn format_coordinate(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn venues_to_csv(sheet: &VenueSheet) -> Result<String, String> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    writer
        .write_record(&sheet.headers)
        .map_err(|e| e.to_string())?;
    for record in &sheet.records {
        let row: Vec<String> = sheet.headers.iter().map(|h| get_field(record, h)).collect();
        writer.write_record(&row).map_err(|e| e.to_string())?;
    }

    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

/// Write the sheet as UTF-8 CSV, replacing `path` atomically.
pub fn save_venues(sheet: &VenueSheet, path: &Path) -> Result<(), String> {
    let text = venues_to_csv(sheet)?;
    write_atomic(path, text.as_bytes())
}
