//! OpenStreetMap Nominatim. Free, no key, one request per second.

use venuemap_recon::{Coordinates, GeocodeError, Geocoder};

use super::common::{malformed, parse_coordinate, GeoClient};

const NOMINATIM_BASE: &str = "https://nominatim.openstreetmap.org";

pub struct NominatimGeocoder {
    client: GeoClient,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new() -> Self {
        Self::with_base_url(NOMINATIM_BASE.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: GeoClient::new("Nominatim"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Geocoder for NominatimGeocoder {
    fn name(&self) -> &str {
        "nominatim"
    }

    fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let req = self
            .client
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", address),
                ("format", "json"),
                ("limit", "1"),
                ("countrycodes", "gb"),
            ]);
        let body = self.client.get_json(req)?;

        let hits = body
            .as_array()
            .ok_or_else(|| malformed("Nominatim", "result array"))?;
        let first = hits.first().ok_or(GeocodeError::NoResults)?;

        let latitude = parse_coordinate(&first["lat"]).ok_or_else(|| malformed("Nominatim", "lat"))?;
        let longitude = parse_coordinate(&first["lon"]).ok_or_else(|| malformed("Nominatim", "lon"))?;
        Ok(Coordinates { latitude, longitude })
    }
}
