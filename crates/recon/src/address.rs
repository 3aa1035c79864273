//! Canonical free-text address for geocoding and display.

use crate::model::VenueRecord;

const SEPARATOR: &str = ", ";

/// County written for a postcode with no known county. Never part of an
/// address.
pub const UNKNOWN_COUNTY: &str = "Unknown";

/// Join address line 1, address line 2, town, postcode, county and country
/// with `", "`, skipping blank parts and the [`UNKNOWN_COUNTY`] placeholder.
/// Returns an empty string when nothing is populated; callers treat that as
/// "not geocodable".
pub fn build_address(record: &VenueRecord) -> String {
    let county = match record.county.trim() {
        UNKNOWN_COUNTY => "",
        c => c,
    };
    let parts = [
        record.address1.trim(),
        record.address2.trim(),
        record.town.trim(),
        record.postcode.trim(),
        county,
        record.country.trim(),
    ];

    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(parts: [&str; 6]) -> VenueRecord {
        VenueRecord {
            address1: parts[0].into(),
            address2: parts[1].into(),
            town: parts[2].into(),
            postcode: parts[3].into(),
            county: parts[4].into(),
            country: parts[5].into(),
            ..Default::default()
        }
    }

    #[test]
    fn full_address_in_field_order() {
        let r = record(["1 High St", "Unit 2", "Leeds", "LS1 1AA", "West Yorkshire", "UK"]);
        assert_eq!(
            build_address(&r),
            "1 High St, Unit 2, Leeds, LS1 1AA, West Yorkshire, UK"
        );
    }

    #[test]
    fn skips_blank_and_whitespace_parts() {
        let r = record(["1 High St", "   ", "Leeds", "", "", "UK"]);
        assert_eq!(build_address(&r), "1 High St, Leeds, UK");
    }

    #[test]
    fn empty_record_gives_empty_string() {
        assert_eq!(build_address(&VenueRecord::default()), "");
    }

    #[test]
    fn trims_parts() {
        let r = record(["  1 High St ", "", " Leeds", "", "", ""]);
        assert_eq!(build_address(&r), "1 High St, Leeds");
    }

    #[test]
    fn unknown_county_placeholder_is_dropped() {
        let r = record(["1 Rue", "", "Leeds", "LS2 7AA", "Unknown", "UK"]);
        assert_eq!(build_address(&r), "1 Rue, Leeds, LS2 7AA, UK");
        let r = record(["", "", "Leeds", "", "West Yorkshire", ""]);
        assert_eq!(build_address(&r), "Leeds, West Yorkshire");
    }

    fn arb_part() -> impl Strategy<Value = String> {
        prop_oneof![
            2 => "[A-Za-z0-9][A-Za-z0-9 ]{0,12}[A-Za-z0-9]",
            1 => Just(String::new()),
            1 => " {1,3}",
        ]
    }

    proptest! {
        #[test]
        fn never_doubles_separators(parts in proptest::array::uniform6(arb_part())) {
            prop_assume!(parts[4].trim() != UNKNOWN_COUNTY);
            let r = record([
                parts[0].as_str(),
                parts[1].as_str(),
                parts[2].as_str(),
                parts[3].as_str(),
                parts[4].as_str(),
                parts[5].as_str(),
            ]);
            let out = build_address(&r);

            prop_assert!(!out.contains(", , "));
            prop_assert!(!out.starts_with(", "));
            prop_assert!(!out.ends_with(", "));

            let populated: Vec<&str> = parts
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .collect();
            if populated.is_empty() {
                prop_assert_eq!(out, "");
            } else {
                let segments: Vec<&str> = out.split(SEPARATOR).collect();
                prop_assert_eq!(segments, populated);
            }
        }
    }
}
