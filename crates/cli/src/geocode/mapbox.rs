//! Mapbox Geocoding v5. Needs an access token. The address goes in the
//! path, so it is percent-encoded as a single segment.

use url::Url;
use venuemap_recon::{Coordinates, GeocodeError, Geocoder};

use super::common::{malformed, parse_coordinate, GeoClient};

const MAPBOX_BASE: &str = "https://api.mapbox.com";

pub struct MapboxGeocoder {
    client: GeoClient,
    access_token: Option<String>,
    base_url: String,
}

impl MapboxGeocoder {
    pub fn new(access_token: Option<String>) -> Self {
        Self::with_base_url(access_token, MAPBOX_BASE.to_string())
    }

    pub fn with_base_url(access_token: Option<String>, base_url: String) -> Self {
        Self {
            client: GeoClient::new("Mapbox"),
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn places_url(&self, address: &str) -> Result<Url, GeocodeError> {
        let last = format!("{}.json", address);
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| GeocodeError::Rejected(format!("invalid Mapbox base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| GeocodeError::Rejected("Mapbox base URL cannot have a path".into()))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places", last.as_str()]);
        Ok(url)
    }
}

impl Geocoder for MapboxGeocoder {
    fn name(&self) -> &str {
        "mapbox"
    }

    fn enabled(&self) -> bool {
        self.access_token.is_some()
    }

    fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let token = self.access_token.as_deref().ok_or(GeocodeError::Disabled)?;
        let url = self.places_url(address)?;
        let req = self
            .client
            .http
            .get(url)
            .query(&[("access_token", token), ("country", "GB"), ("limit", "1")]);
        let body = self.client.get_json(req)?;

        let features = body["features"]
            .as_array()
            .ok_or_else(|| malformed("Mapbox", "features"))?;
        let first = features.first().ok_or(GeocodeError::NoResults)?;

        // GeoJSON order: [longitude, latitude]
        let center = &first["center"];
        let longitude = parse_coordinate(&center[0]).ok_or_else(|| malformed("Mapbox", "center"))?;
        let latitude = parse_coordinate(&center[1]).ok_or_else(|| malformed("Mapbox", "center"))?;
        Ok(Coordinates { latitude, longitude })
    }
}
