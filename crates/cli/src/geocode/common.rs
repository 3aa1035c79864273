//! Shared HTTP plumbing for the geocoding backends.
//!
//! - `GeoClient`: one blocking request, status classified into
//!   [`GeocodeError`]. Retrying and pacing belong to the chain.
//! - `resolve_credential`: flag > env > none.
//! - `parse_coordinate`: services disagree on number vs string.

use std::time::Duration;

use venuemap_recon::GeocodeError;

pub(super) const USER_AGENT: &str = concat!("venuemap/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ── GeoClient ───────────────────────────────────────────────────────

pub(super) struct GeoClient {
    pub(super) http: reqwest::blocking::Client,
    source_name: &'static str,
}

impl GeoClient {
    pub(super) fn new(source_name: &'static str) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("{source_name}: falling back to default HTTP client: {e}");
                reqwest::blocking::Client::new()
            });

        Self { http, source_name }
    }

    /// Send one GET and return the JSON body.
    ///
    /// Network errors, 429 and 5xx are `Transient`; any other non-2xx status
    /// and undecodable bodies are `Rejected`.
    pub(super) fn get_json(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<serde_json::Value, GeocodeError> {
        let resp = request.send().map_err(|e| {
            GeocodeError::Transient(format!("{} request failed: {}", self.source_name, e))
        })?;

        let status = resp.status().as_u16();
        if status == 429 || status >= 500 {
            return Err(GeocodeError::Transient(format!(
                "{} {} (HTTP {})",
                self.source_name,
                if status == 429 { "rate limited" } else { "upstream error" },
                status,
            )));
        }
        if !(200..300).contains(&status) {
            return Err(GeocodeError::Rejected(format!(
                "{} error (HTTP {})",
                self.source_name, status
            )));
        }

        let text = resp.text().map_err(|e| {
            GeocodeError::Transient(format!(
                "failed to read {} response body: {}",
                self.source_name, e
            ))
        })?;
        let trimmed = text.trim_start_matches('\u{feff}');
        serde_json::from_str(trimmed).map_err(|e| {
            GeocodeError::Rejected(format!(
                "failed to parse {} JSON response: {} (body: {})",
                self.source_name,
                e,
                truncate(trimmed, 200),
            ))
        })
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ── Credentials ─────────────────────────────────────────────────────

/// Flag value wins, then the named environment variable. Blank values
/// count as absent.
pub fn resolve_credential(flag: Option<&str>, env_var: Option<&str>) -> Option<String> {
    if let Some(key) = flag {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }

    let var = env_var?;
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ── Response helpers ────────────────────────────────────────────────

/// Accept `53.8` or `"53.8"`.
pub(super) fn parse_coordinate(value: &serde_json::Value) -> Option<f64> {
    let n = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

pub(super) fn malformed(source: &str, what: &str) -> GeocodeError {
    GeocodeError::Rejected(format!("{} response missing {}", source, what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_get(server: &MockServer) -> Result<serde_json::Value, GeocodeError> {
        let client = GeoClient::new("Test");
        let req = client.http.get(server.url("/lookup"));
        client.get_json(req)
    }

    #[test]
    fn ok_body_is_returned() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/lookup").header_exists("user-agent");
            then.status(200).json_body(json!({"ok": true}));
        });

        assert_eq!(client_get(&server).unwrap(), json!({"ok": true}));
    }

    #[test]
    fn rate_limit_and_5xx_are_transient() {
        for status in [429, 500, 503] {
            let server = MockServer::start();
            server.mock(|when, then| {
                when.method(GET).path("/lookup");
                then.status(status);
            });
            let err = client_get(&server).unwrap_err();
            assert!(err.is_transient(), "HTTP {status} -> {err}");
        }
    }

    #[test]
    fn other_4xx_is_rejected() {
        for status in [400, 401, 403, 404] {
            let server = MockServer::start();
            server.mock(|when, then| {
                when.method(GET).path("/lookup");
                then.status(status);
            });
            let err = client_get(&server).unwrap_err();
            assert!(matches!(err, GeocodeError::Rejected(_)), "HTTP {status} -> {err}");
        }
    }

    #[test]
    fn garbage_body_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/lookup");
            then.status(200).body("<html>maintenance</html>");
        });
        let err = client_get(&server).unwrap_err();
        assert!(err.to_string().contains("failed to parse Test JSON"), "{err}");
    }

    #[test]
    fn connection_refused_is_transient() {
        let client = GeoClient::new("Test");
        // Port 9 (discard) on localhost is not expected to be listening.
        let req = client.http.get("http://127.0.0.1:9/lookup");
        assert!(client.get_json(req).unwrap_err().is_transient());
    }

    #[test]
    fn credential_flag_beats_env() {
        std::env::set_var("VMAP_TEST_CRED_A", "from-env");
        assert_eq!(
            resolve_credential(Some(" from-flag "), Some("VMAP_TEST_CRED_A")).as_deref(),
            Some("from-flag")
        );
        assert_eq!(
            resolve_credential(None, Some("VMAP_TEST_CRED_A")).as_deref(),
            Some("from-env")
        );
        assert_eq!(
            resolve_credential(Some("  "), Some("VMAP_TEST_CRED_A")).as_deref(),
            Some("from-env")
        );
    }

    #[test]
    fn credential_absent() {
        std::env::remove_var("VMAP_TEST_CRED_B");
        assert_eq!(resolve_credential(None, Some("VMAP_TEST_CRED_B")), None);
        assert_eq!(resolve_credential(None, None), None);
        std::env::set_var("VMAP_TEST_CRED_C", "   ");
        assert_eq!(resolve_credential(None, Some("VMAP_TEST_CRED_C")), None);
    }

    #[test]
    fn coordinates_as_number_or_string() {
        assert_eq!(parse_coordinate(&json!(53.8)), Some(53.8));
        assert_eq!(parse_coordinate(&json!("-1.55")), Some(-1.55));
        assert_eq!(parse_coordinate(&json!("north")), None);
        assert_eq!(parse_coordinate(&json!(null)), None);
    }
}
