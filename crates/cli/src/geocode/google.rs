//! Google Maps Geocoding API. Needs an API key.

use venuemap_recon::{Coordinates, GeocodeError, Geocoder};

use super::common::{malformed, parse_coordinate, GeoClient};

const GOOGLE_BASE: &str = "https://maps.googleapis.com";

pub struct GoogleGeocoder {
    client: GeoClient,
    api_key: Option<String>,
    base_url: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, GOOGLE_BASE.to_string())
    }

    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Self {
        Self {
            client: GeoClient::new("Google"),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Geocoder for GoogleGeocoder {
    fn name(&self) -> &str {
        "google"
    }

    fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let key = self.api_key.as_deref().ok_or(GeocodeError::Disabled)?;
        let req = self
            .client
            .http
            .get(format!("{}/maps/api/geocode/json", self.base_url))
            .query(&[("address", address), ("key", key), ("region", "gb")]);
        let body = self.client.get_json(req)?;

        // Google reports most failures with HTTP 200 and a status field.
        let status = body["status"].as_str().unwrap_or("");
        match status {
            "OK" => {}
            "ZERO_RESULTS" => return Err(GeocodeError::NoResults),
            "OVER_QUERY_LIMIT" | "UNKNOWN_ERROR" => {
                return Err(GeocodeError::Transient(format!("Google status {}", status)))
            }
            _ => {
                let detail = body["error_message"].as_str().unwrap_or("no detail");
                return Err(GeocodeError::Rejected(format!(
                    "Google status {}: {}",
                    if status.is_empty() { "missing" } else { status },
                    detail
                )));
            }
        }

        let location = &body["results"][0]["geometry"]["location"];
        if location.is_null() {
            return Err(GeocodeError::NoResults);
        }
        let latitude = parse_coordinate(&location["lat"]).ok_or_else(|| malformed("Google", "lat"))?;
        let longitude = parse_coordinate(&location["lng"]).ok_or_else(|| malformed("Google", "lng"))?;
        Ok(Coordinates { latitude, longitude })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn ok_response(lat: f64, lng: f64) -> serde_json::Value {
        json!({
            "status": "OK",
            "results": [{"geometry": {"location": {"lat": lat, "lng": lng}}}]
        })
    }

    #[test]
    fn parses_location() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/maps/api/geocode/json")
                .query_param("address", "M1 1AE")
                .query_param("key", "test-key")
                .query_param("region", "gb");
            then.status(200).json_body(ok_response(53.4808, -2.2426));
        });

        let geocoder = GoogleGeocoder::with_base_url(Some("test-key".into()), server.base_url());
        let coords = geocoder.geocode("M1 1AE").unwrap();

        mock.assert();
        assert_eq!(coords, Coordinates { latitude: 53.4808, longitude: -2.2426 });
    }

    #[test]
    fn status_mapping() {
        let cases = [
            ("ZERO_RESULTS", GeocodeError::NoResults),
            ("OVER_QUERY_LIMIT", GeocodeError::Transient("Google status OVER_QUERY_LIMIT".into())),
        ];
        for (status, expected) in cases {
            let server = MockServer::start();
            server.mock(|when, then| {
                when.method(GET).path("/maps/api/geocode/json");
                then.status(200).json_body(json!({"status": status, "results": []}));
            });
            let geocoder = GoogleGeocoder::with_base_url(Some("k".into()), server.base_url());
            assert_eq!(geocoder.geocode("x").unwrap_err(), expected);
        }
    }

    #[test]
    fn request_denied_is_rejected_with_detail() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/maps/api/geocode/json");
            then.status(200).json_body(json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid."
            }));
        });

        let geocoder = GoogleGeocoder::with_base_url(Some("bad".into()), server.base_url());
        let err = geocoder.geocode("x").unwrap_err();
        assert!(matches!(err, GeocodeError::Rejected(_)));
        assert!(err.to_string().contains("API key is invalid"), "{err}");
    }

    #[test]
    fn without_key_is_disabled_and_sends_nothing() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET);
            then.status(200);
        });

        let geocoder = GoogleGeocoder::with_base_url(None, server.base_url());
        assert!(!geocoder.enabled());
        assert_eq!(geocoder.geocode("x").unwrap_err(), GeocodeError::Disabled);
        mock.assert_calls(0);
    }
}
