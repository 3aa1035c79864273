use serde::Serialize;

// ---------------------------------------------------------------------------
// Venue record
// ---------------------------------------------------------------------------

/// A single venue row, normalized from the venue CSV.
///
/// `order` is kept as the raw `OriginalOrder` text so a malformed value is
/// written back untouched; [`crate::keyer::key_of`] decides whether it is
/// usable as an identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VenueRecord {
    pub order: String,
    pub name: String,
    pub address1: String,
    pub address2: String,
    pub town: String,
    pub postcode: String,
    pub country: String,
    pub county: String,
    pub region: String,
    pub venue_type: String,
    pub account_manager: String,
    pub account_manager_email: String,
    pub phone: String,
    pub quantity: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Columns the pipeline does not interpret, in input header order.
    pub extra: Vec<(String, String)>,
}

impl VenueRecord {
    /// Both coordinates present, finite, and not the (0, 0) placeholder.
    pub fn has_coordinates(&self) -> bool {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => {
                lat.is_finite() && lon.is_finite() && !(lat == 0.0 && lon == 0.0)
            }
            _ => false,
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        if self.has_coordinates() {
            Some(Coordinates {
                latitude: self.latitude?,
                longitude: self.longitude?,
            })
        } else {
            None
        }
    }

    pub fn set_coordinates(&mut self, coords: Coordinates) {
        self.latitude = Some(coords.latitude);
        self.longitude = Some(coords.longitude);
    }

    pub fn clear_coordinates(&mut self) {
        self.latitude = None;
        self.longitude = None;
    }

    pub fn full_address(&self) -> String {
        crate::address::build_address(self)
    }
}

// ---------------------------------------------------------------------------
// Geocoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A validated hit from one backend of the chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub source: String,
}

impl GeocodeResult {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

// ---------------------------------------------------------------------------
// Coverage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageStats {
    pub total: usize,
    pub with_coordinates: usize,
    pub without_coordinates: usize,
}

impl CoverageStats {
    pub fn from_records(records: &[VenueRecord]) -> Self {
        let with_coordinates = records.iter().filter(|r| r.has_coordinates()).count();
        Self {
            total: records.len(),
            with_coordinates,
            without_coordinates: records.len() - with_coordinates,
        }
    }

    /// Share of records with coordinates, in percent. 0 for an empty set.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.with_coordinates as f64 * 100.0 / self.total as f64
        }
    }
}
