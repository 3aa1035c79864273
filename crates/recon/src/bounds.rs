use serde::Deserialize;

use crate::model::VenueRecord;

/// Inclusive latitude/longitude rectangle used to accept or reject a hit.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Great Britain and Northern Ireland, Scilly to Shetland.
    pub const UK: BoundingBox = BoundingBox {
        min_lat: 49.8,
        max_lat: 60.9,
        min_lon: -8.2,
        max_lon: 1.8,
    };

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat.is_finite()
            && lon.is_finite()
            && (self.min_lat..=self.max_lat).contains(&lat)
            && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::UK
    }
}

/// Clear coordinates that fall outside `bounds`. Records without coordinates
/// are left alone. Returns the names of the venues that were cleared.
pub fn clean_out_of_bounds(records: &mut [VenueRecord], bounds: &BoundingBox) -> Vec<String> {
    let mut cleared = Vec::new();

    for record in records.iter_mut() {
        let (Some(lat), Some(lon)) = (record.latitude, record.longitude) else {
            continue;
        };
        if !bounds.contains(lat, lon) {
            log::warn!(
                "clearing out-of-bounds coordinates for '{}': {lat}, {lon}",
                record.name
            );
            record.clear_coordinates();
            cleared.push(record.name.clone());
        }
    }

    cleared
}
