//! The `vmap run` pipeline, minus file IO.
//!
//! Steps, in order: restore from the supplement, clear out-of-bounds
//! coordinates, tag county and region, normalize phones, geocode what is
//! still missing, apply by key, sort by order.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use venuemap_config::{tag_counties, tag_regions, CountyTable, RegionTable};
use venuemap_io::VenueSheet;
use venuemap_recon::bounds::clean_out_of_bounds;
use venuemap_recon::merge::sort_by_order;
use venuemap_recon::phone::normalize_phone;
use venuemap_recon::{
    apply_coordinates, key_of, merge, BoundingBox, CoverageStats, GeocodeResult, GeocoderChain,
    RecordKey,
};

pub struct Tables<'a> {
    pub counties: &'a CountyTable,
    pub regions: &'a RegionTable,
}

#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub generated_at: String,
    pub config_source: String,
    pub input_records: usize,
    pub restored: usize,
    pub backfilled: usize,
    pub cleared_out_of_bounds: Vec<String>,
    pub phones_normalized: usize,
    pub geocode_attempted: usize,
    pub geocoded: usize,
    pub geocoded_by_backend: BTreeMap<String, usize>,
    pub ungeocoded: Vec<String>,
    pub sorted: bool,
    pub coverage: CoverageStats,
}

pub fn run_pipeline(
    base: VenueSheet,
    supplement: Option<VenueSheet>,
    tables: &Tables<'_>,
    bounds: &BoundingBox,
    chain: Option<&mut GeocoderChain>,
) -> (VenueSheet, RunReport) {
    let mut report = RunReport {
        generated_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        input_records: base.records.len(),
        ..Default::default()
    };

    // 1. Restore
    let mut sheet = base;
    if let Some(supplement) = supplement {
        sheet.absorb_headers(&supplement);
        let outcome = merge(std::mem::take(&mut sheet.records), &supplement.records);
        log::info!(
            "restored {} venue(s), backfilled coordinates on {}",
            outcome.added,
            outcome.backfilled
        );
        report.restored = outcome.added;
        report.backfilled = outcome.backfilled;
        sheet.records = outcome.records;
    }

    // 2. Clean
    report.cleared_out_of_bounds = clean_out_of_bounds(&mut sheet.records, bounds);

    // 3. Enrich
    tag_counties(&mut sheet.records, tables.counties);
    tag_regions(&mut sheet.records, tables.regions);
    for record in sheet.records.iter_mut() {
        let normalized = normalize_phone(&record.phone);
        if normalized != record.phone {
            record.phone = normalized;
            report.phones_normalized += 1;
        }
    }

    // 4. Geocode + apply
    if let Some(chain) = chain {
        let resolved = geocode_missing(&sheet, chain, &mut report);
        report.geocoded = apply_coordinates(&mut sheet.records, &resolved);
        report.ungeocoded = sheet
            .records
            .iter()
            .filter(|r| !r.has_coordinates())
            .map(|r| r.name.clone())
            .collect();
    }

    // 5. Sort
    report.sorted = sort_by_order(&mut sheet.records);
    report.coverage = CoverageStats::from_records(&sheet.records);

    (sheet, report)
}

/// Resolve every distinct key that still lacks coordinates.
fn geocode_missing(
    sheet: &VenueSheet,
    chain: &mut GeocoderChain,
    report: &mut RunReport,
) -> HashMap<RecordKey, GeocodeResult> {
    let pending: Vec<_> = sheet
        .records
        .iter()
        .filter(|r| !r.has_coordinates())
        .collect();
    let total = pending.len();
    let mut resolved: HashMap<RecordKey, GeocodeResult> = HashMap::new();
    let mut tried: HashSet<RecordKey> = HashSet::new();

    for (i, record) in pending.into_iter().enumerate() {
        let key = key_of(record);
        if !tried.insert(key.clone()) {
            continue;
        }
        let address = record.full_address();
        if address.is_empty() {
            log::warn!("[{}/{}] {}: no address, skipping", i + 1, total, record.name);
            continue;
        }

        report.geocode_attempted += 1;
        match chain.resolve(&address) {
            Some(hit) => {
                log::info!(
                    "[{}/{}] {}: {:.6}, {:.6} via {}",
                    i + 1,
                    total,
                    record.name,
                    hit.latitude,
                    hit.longitude,
                    hit.source
                );
                *report
                    .geocoded_by_backend
                    .entry(hit.source.clone())
                    .or_default() += 1;
                resolved.insert(key, hit);
            }
            None => log::warn!("[{}/{}] {}: not found", i + 1, total, record.name),
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;
    use venuemap_recon::geocode::RetryPolicy;
    use venuemap_config::UNKNOWN_COUNTY;
    use venuemap_recon::{Coordinates, GeocodeError, Geocoder, VenueRecord};

    /// Answers from a fixed address table and records every call.
    struct TableGeocoder {
        answers: HashMap<String, Coordinates>,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl Geocoder for TableGeocoder {
        fn name(&self) -> &str {
            "table"
        }

        fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
            self.calls.borrow_mut().push(address.to_string());
            self.answers
                .get(address)
                .copied()
                .ok_or(GeocodeError::NoResults)
        }
    }

    fn chain_with(
        answers: &[(&str, f64, f64)],
    ) -> (GeocoderChain, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let geocoder = TableGeocoder {
            answers: answers
                .iter()
                .map(|(a, lat, lon)| (a.to_string(), Coordinates { latitude: *lat, longitude: *lon }))
                .collect(),
            calls: Rc::clone(&calls),
        };
        let chain = GeocoderChain::new(
            BoundingBox::UK,
            RetryPolicy { attempts: 1, backoff: Duration::ZERO },
        )
        .with_backend(Box::new(geocoder), Duration::ZERO);
        (chain, calls)
    }

    fn venue(order: &str, name: &str, town: &str, coords: Option<(f64, f64)>) -> VenueRecord {
        VenueRecord {
            order: order.into(),
            name: name.into(),
            town: town.into(),
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
            ..Default::default()
        }
    }

    fn run(
        base: Vec<VenueRecord>,
        supplement: Option<Vec<VenueRecord>>,
        chain: Option<&mut GeocoderChain>,
    ) -> (VenueSheet, RunReport) {
        let counties = CountyTable::uk().unwrap();
        let regions = RegionTable::uk();
        let tables = Tables { counties: &counties, regions: &regions };
        run_pipeline(
            VenueSheet::new(base),
            supplement.map(VenueSheet::new),
            &tables,
            &BoundingBox::UK,
            chain,
        )
    }

    #[test]
    fn restore_then_geocode_by_key() {
        let base = vec![
            venue("1", "A", "London", Some((51.5, -0.1))),
            venue("2", "B", "Birmingham", None),
            venue("3", "C", "Manchester", Some((53.4, -2.2))),
        ];
        let supplement = vec![
            venue("2", "B-old", "Nowhere", None),
            venue("4", "D", "Leeds", None),
        ];
        let (mut chain, calls) = chain_with(&[("Birmingham", 52.48, -1.89)]);

        let (sheet, report) = run(base, Some(supplement), Some(&mut chain));

        let orders: Vec<&str> = sheet.records.iter().map(|r| r.order.as_str()).collect();
        assert_eq!(orders, vec!["1", "2", "3", "4"]);
        assert_eq!(sheet.records[1].name, "B");
        assert_eq!(sheet.records[1].latitude, Some(52.48));
        assert_eq!(report.restored, 1);
        assert_eq!(report.geocode_attempted, 2);
        assert_eq!(report.geocoded, 1);
        assert_eq!(report.geocoded_by_backend.get("table"), Some(&1));
        assert_eq!(report.ungeocoded, vec!["D".to_string()]);
        assert_eq!(*calls.borrow(), vec!["Birmingham".to_string(), "Leeds".to_string()]);
        assert_eq!(report.coverage.with_coordinates, 3);
    }

    #[test]
    fn out_of_bounds_input_is_cleared_and_regeocoded() {
        let base = vec![venue("1", "Paris Bar", "Leeds", Some((48.85, 2.35)))];
        let (mut chain, _) = chain_with(&[("Leeds", 53.8, -1.55)]);

        let (sheet, report) = run(base, None, Some(&mut chain));

        assert_eq!(report.cleared_out_of_bounds, vec!["Paris Bar".to_string()]);
        assert_eq!(sheet.records[0].latitude, Some(53.8));
    }

    #[test]
    fn enrichment_without_geocoding() {
        let mut r = venue("1", "A", "Leeds", None);
        r.postcode = "LS1 1AA".into();
        r.phone = "+44 113 496 0000".into();

        let (sheet, report) = run(vec![r], None, None);

        let out = &sheet.records[0];
        assert_eq!(out.county, "West Yorkshire");
        assert_eq!(out.region, "Yorkshire & Humber");
        assert_eq!(out.phone, "01134960000");
        assert_eq!(report.phones_normalized, 1);
        assert_eq!(report.geocode_attempted, 0);
        assert!(report.ungeocoded.is_empty());
    }

    #[test]
    fn duplicate_keys_are_geocoded_once() {
        let base = vec![
            venue("7", "A", "York", None),
            venue("7", "A again", "York", None),
        ];
        let (mut chain, calls) = chain_with(&[("York", 53.96, -1.08)]);

        let (sheet, report) = run(base, None, Some(&mut chain));

        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(report.geocoded, 2);
        assert!(sheet.records.iter().all(|r| r.has_coordinates()));
    }

    #[test]
    fn records_without_address_are_not_sent() {
        let base = vec![venue("1", "Ghost", "", None)];
        let (mut chain, calls) = chain_with(&[]);

        let (_, report) = run(base, None, Some(&mut chain));

        assert!(calls.borrow().is_empty());
        assert_eq!(report.ungeocoded, vec!["Ghost".to_string()]);
    }

    #[test]
    fn unknown_county_is_not_sent_to_the_geocoder() {
        let mut r = venue("1", "A", "Leeds", None);
        r.postcode = "QQ1 1AA".into();
        let (mut chain, calls) = chain_with(&[]);

        let (sheet, _) = run(vec![r], None, Some(&mut chain));

        assert_eq!(sheet.records[0].county, UNKNOWN_COUNTY);
        assert_eq!(*calls.borrow(), vec!["Leeds, QQ1 1AA".to_string()]);
    }

    #[test]
    fn unsorted_when_an_order_is_missing() {
        let base = vec![venue("2", "B", "York", None), venue("", "X", "York", None)];
        let (_, report) = run(base, None, None);
        assert!(!report.sorted);
    }
}
