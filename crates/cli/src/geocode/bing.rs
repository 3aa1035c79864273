//! Bing Maps Locations API. Needs an API key.

use venuemap_recon::{Coordinates, GeocodeError, Geocoder};

use super::common::{malformed, parse_coordinate, GeoClient};

const BING_BASE: &str = "https://dev.virtualearth.net";

pub struct BingGeocoder {
    client: GeoClient,
    api_key: Option<String>,
    base_url: String,
}

impl BingGeocoder {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, BING_BASE.to_string())
    }

    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Self {
        Self {
            client: GeoClient::new("Bing"),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Geocoder for BingGeocoder {
    fn name(&self) -> &str {
        "bing"
    }

    fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let key = self.api_key.as_deref().ok_or(GeocodeError::Disabled)?;
        let req = self
            .client
            .http
            .get(format!("{}/REST/v1/Locations", self.base_url))
            .query(&[("q", address), ("key", key), ("c", "GB"), ("maxResults", "1")]);
        let body = self.client.get_json(req)?;

        let resources = body["resourceSets"][0]["resources"]
            .as_array()
            .ok_or_else(|| malformed("Bing", "resourceSets"))?;
        let first = resources.first().ok_or(GeocodeError::NoResults)?;

        let point = &first["point"]["coordinates"];
        let latitude = parse_coordinate(&point[0]).ok_or_else(|| malformed("Bing", "point"))?;
        let longitude = parse_coordinate(&point[1]).ok_or_else(|| malformed("Bing", "point"))?;
        Ok(Coordinates { latitude, longitude })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn parses_point() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/REST/v1/Locations")
                .query_param("q", "CF10 1EP")
                .query_param("key", "bing-key")
                .query_param("c", "GB");
            then.status(200).json_body(json!({
                "resourceSets": [{
                    "estimatedTotal": 1,
                    "resources": [{"point": {"type": "Point", "coordinates": [51.4816, -3.1791]}}]
                }]
            }));
        });

        let geocoder = BingGeocoder::with_base_url(Some("bing-key".into()), server.base_url());
        let coords = geocoder.geocode("CF10 1EP").unwrap();

        mock.assert();
        assert_eq!(coords, Coordinates { latitude: 51.4816, longitude: -3.1791 });
    }

    #[test]
    fn empty_resources_is_no_results() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/REST/v1/Locations");
            then.status(200)
                .json_body(json!({"resourceSets": [{"estimatedTotal": 0, "resources": []}]}));
        });

        let geocoder = BingGeocoder::with_base_url(Some("k".into()), server.base_url());
        assert_eq!(geocoder.geocode("x").unwrap_err(), GeocodeError::NoResults);
    }

    #[test]
    fn server_error_is_transient() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/REST/v1/Locations");
            then.status(503);
        });

        let geocoder = BingGeocoder::with_base_url(Some("k".into()), server.base_url());
        assert!(geocoder.geocode("x").unwrap_err().is_transient());
        mock.assert_calls(1);
    }

    #[test]
    fn without_key_is_disabled() {
        assert!(!BingGeocoder::new(None).enabled());
        assert!(BingGeocoder::new(Some("k".into())).enabled());
    }
}
