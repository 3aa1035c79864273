//! Postcode to county lookup.
//!
//! Keys are postcode areas (`LS`, `B`) plus the few districts that straddle a
//! county line (`DY1`..`DY14`). Lookup tries the longest outward-code prefix
//! first and falls back to the bare area letters.

use std::collections::HashMap;

use regex::Regex;
use venuemap_recon::VenueRecord;

pub use venuemap_recon::UNKNOWN_COUNTY;

const AREAS: &[(&str, &str)] = &[
    ("AB", "Aberdeenshire"),
    ("AL", "Hertfordshire"),
    ("B", "West Midlands"),
    ("BA", "Somerset"),
    ("BB", "Lancashire"),
    ("BD", "West Yorkshire"),
    ("BH", "Dorset"),
    ("BL", "Greater Manchester"),
    ("BN", "East Sussex"),
    ("BR", "Greater London"),
    ("BS", "Bristol"),
    ("BT", "Northern Ireland"),
    ("CA", "Cumbria"),
    ("CB", "Cambridgeshire"),
    ("CF", "Cardiff"),
    ("CH", "Cheshire"),
    ("CM", "Essex"),
    ("CO", "Essex"),
    ("CR", "Greater London"),
    ("CT", "Kent"),
    ("CV", "Warwickshire"),
    ("CW", "Cheshire"),
    ("DA", "Kent"),
    ("DD", "Dundee"),
    ("DE", "Derbyshire"),
    ("DG", "Dumfries and Galloway"),
    ("DH", "County Durham"),
    ("DL", "County Durham"),
    ("DN", "South Yorkshire"),
    ("DT", "Dorset"),
    ("E", "Greater London"),
    ("EC", "Greater London"),
    ("EH", "Edinburgh"),
    ("EN", "Hertfordshire"),
    ("EX", "Devon"),
    ("FK", "Falkirk"),
    ("FY", "Lancashire"),
    ("G", "Glasgow"),
    ("GL", "Gloucestershire"),
    ("GU", "Surrey"),
    ("GY", "Guernsey"),
    ("HA", "Greater London"),
    ("HD", "West Yorkshire"),
    ("HG", "North Yorkshire"),
    ("HP", "Hertfordshire"),
    ("HR", "Herefordshire"),
    ("HS", "Outer Hebrides"),
    ("HU", "East Yorkshire"),
    ("HX", "West Yorkshire"),
    ("IG", "Essex"),
    ("IP", "Suffolk"),
    ("IV", "Highland"),
    ("JE", "Jersey"),
    ("KA", "East Ayrshire"),
    ("KT", "Surrey"),
    ("KW", "Highland"),
    ("KY", "Fife"),
    ("L", "Merseyside"),
    ("LA", "Lancashire"),
    ("LD", "Powys"),
    ("LE", "Leicestershire"),
    ("LL", "Clwyd"),
    ("LN", "Lincolnshire"),
    ("LS", "West Yorkshire"),
    ("LU", "Bedfordshire"),
    ("M", "Greater Manchester"),
    ("ME", "Kent"),
    ("MK", "Buckinghamshire"),
    ("ML", "North Lanarkshire"),
    ("N", "Greater London"),
    ("NE", "Tyne and Wear"),
    ("NG", "Nottinghamshire"),
    ("NN", "Northamptonshire"),
    ("NP", "Gwent"),
    ("NR", "Norfolk"),
    ("NW", "Greater London"),
    ("OL", "Greater Manchester"),
    ("OX", "Oxfordshire"),
    ("PA", "Renfrewshire"),
    ("PE", "Cambridgeshire"),
    ("PH", "Perth and Kinross"),
    ("PL", "Devon"),
    ("PO", "Hampshire"),
    ("PR", "Lancashire"),
    ("RG", "Berkshire"),
    ("RH", "Surrey"),
    ("RM", "Essex"),
    ("S", "South Yorkshire"),
    ("SA", "West Glamorgan"),
    ("SE", "Greater London"),
    ("SG", "Hertfordshire"),
    ("SK", "Greater Manchester"),
    ("SL", "Buckinghamshire"),
    ("SM", "Greater London"),
    ("SN", "Wiltshire"),
    ("SO", "Hampshire"),
    ("SP", "Wiltshire"),
    ("SR", "Tyne and Wear"),
    ("SS", "Essex"),
    ("ST", "Staffordshire"),
    ("SW", "Greater London"),
    ("SY", "Shropshire"),
    ("TA", "Somerset"),
    ("TD", "Borders"),
    ("TF", "Shropshire"),
    ("TN", "Kent"),
    ("TQ", "Devon"),
    ("TR", "Cornwall"),
    ("TS", "Cleveland"),
    ("TW", "Greater London"),
    ("UB", "Greater London"),
    ("W", "Greater London"),
    ("WA", "Cheshire"),
    ("WC", "Greater London"),
    ("WD", "Hertfordshire"),
    ("WF", "West Yorkshire"),
    ("WN", "Greater Manchester"),
    ("WR", "Worcestershire"),
    ("WS", "Staffordshire"),
    ("WV", "West Midlands"),
    ("YO", "North Yorkshire"),
    ("ZE", "Shetland Islands"),
];

// Dudley area districts split between the West Midlands and Worcestershire.
const SPLIT_DISTRICTS: &[(&str, &str)] = &[
    ("DY1", "West Midlands"),
    ("DY2", "West Midlands"),
    ("DY3", "West Midlands"),
    ("DY4", "West Midlands"),
    ("DY5", "West Midlands"),
    ("DY6", "West Midlands"),
    ("DY7", "West Midlands"),
    ("DY8", "West Midlands"),
    ("DY9", "Worcestershire"),
    ("DY10", "Worcestershire"),
    ("DY11", "Worcestershire"),
    ("DY12", "Worcestershire"),
    ("DY13", "Worcestershire"),
    ("DY14", "Worcestershire"),
];

/// Candidate prefixes, most specific first.
const PREFIX_PATTERNS: [&str; 4] = [
    r"^[A-Z]{1,2}\d{1,2}[A-Z]?",
    r"^[A-Z]{1,2}\d{1,2}",
    r"^[A-Z]{1,2}\d",
    r"^[A-Z]{1,2}",
];

pub struct CountyTable {
    entries: HashMap<String, String>,
    prefixes: Vec<Regex>,
}

impl CountyTable {
    /// Build a table from `(prefix, county)` pairs. Later pairs override
    /// earlier ones with the same prefix.
    pub fn new<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, regex::Error> {
        let prefixes = PREFIX_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            prefixes,
        })
    }

    /// Postcode areas of England, Scotland, Wales, Northern Ireland and the
    /// Crown Dependencies.
    pub fn uk() -> Result<Self, regex::Error> {
        Self::new(AREAS.iter().chain(SPLIT_DISTRICTS).copied())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// County for a postcode, or [`UNKNOWN_COUNTY`].
    pub fn lookup(&self, postcode: &str) -> &str {
        let cleaned: String = postcode
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        if cleaned.is_empty() {
            return UNKNOWN_COUNTY;
        }

        for re in &self.prefixes {
            if let Some(m) = re.find(&cleaned) {
                if let Some(county) = self.entries.get(m.as_str()) {
                    return county;
                }
            }
        }
        UNKNOWN_COUNTY
    }
}

/// Set `county` on every record from its postcode. Returns the county
/// histogram, largest first, ties by name.
pub fn tag_counties(records: &mut [VenueRecord], table: &CountyTable) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for record in records.iter_mut() {
        let county = table.lookup(&record.postcode).to_string();
        *counts.entry(county.clone()).or_default() += 1;
        record.county = county;
    }

    let unknown = counts.get(UNKNOWN_COUNTY).copied().unwrap_or(0);
    if unknown > 0 {
        log::warn!("{unknown} venue(s) have a postcode with no known county");
    }

    let mut histogram: Vec<(String, usize)> = counts.into_iter().collect();
    histogram.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    histogram
}
