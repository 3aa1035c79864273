//! County to regional group mapping used to colour the map.

use std::collections::HashMap;

use venuemap_recon::VenueRecord;

pub const OTHER_REGION: &str = "Other";

/// Groups in declaration order. A county listed twice takes the later group.
const GROUPS: &[(&str, &[&str])] = &[
    (
        "North West England",
        &["Greater Manchester", "Lancashire", "Cheshire", "Merseyside", "Cumbria"],
    ),
    (
        "Greater London & South East",
        &[
            "Greater London",
            "Surrey",
            "Kent",
            "Hertfordshire",
            "Essex",
            "Buckinghamshire",
            "Berkshire",
            "East Sussex",
            "Hampshire",
        ],
    ),
    (
        "West Midlands",
        &["West Midlands", "Worcestershire", "Warwickshire", "Staffordshire", "Shropshire"],
    ),
    (
        "Scotland Central",
        &[
            "Edinburgh",
            "Glasgow",
            "Fife",
            "Renfrewshire",
            "Falkirk",
            "North Lanarkshire",
            "Dundee",
        ],
    ),
    (
        "Yorkshire & Humber",
        &["South Yorkshire", "West Yorkshire", "North Yorkshire", "East Yorkshire", "Lincolnshire"],
    ),
    (
        "East Midlands",
        &["Nottinghamshire", "Derbyshire", "Leicestershire", "Northamptonshire"],
    ),
    (
        "South West England",
        &["Devon", "Cornwall", "Somerset", "Dorset", "Wiltshire", "Bristol", "Gloucestershire"],
    ),
    (
        "East of England",
        &["Norfolk", "Suffolk", "Cambridgeshire", "Hertfordshire", "Oxfordshire"],
    ),
    (
        "North East England",
        &["Tyne and Wear", "County Durham", "Cleveland"],
    ),
    (
        "Scotland North & Wales",
        &[
            "Aberdeenshire",
            "Perth and Kinross",
            "East Ayrshire",
            "Cardiff",
            "Clwyd",
            "Gwent",
            "West Glamorgan",
            "Unknown",
        ],
    ),
];

#[derive(Debug, Clone)]
pub struct RegionTable {
    by_county: HashMap<String, String>,
    names: Vec<String>,
}

impl RegionTable {
    pub fn uk() -> Self {
        let mut by_county = HashMap::new();
        let mut names = Vec::with_capacity(GROUPS.len());
        for (region, counties) in GROUPS {
            names.push(region.to_string());
            for county in *counties {
                by_county.insert(county.to_string(), region.to_string());
            }
        }
        Self { by_county, names }
    }

    /// Group names in declaration order, without the `Other` fallback.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn region_of(&self, county: &str) -> &str {
        self.by_county
            .get(county)
            .map(String::as_str)
            .unwrap_or(OTHER_REGION)
    }
}

/// Set `region` on every record from its county. Returns how many landed in
/// the `Other` bucket.
pub fn tag_regions(records: &mut [VenueRecord], table: &RegionTable) -> usize {
    let mut other = 0;
    for record in records.iter_mut() {
        let region = table.region_of(&record.county);
        if region == OTHER_REGION {
            other += 1;
        }
        record.region = region.to_string();
    }
    other
}
