//! HTTP geocoding backends and chain assembly from `pipeline.toml`.

mod bing;
mod common;
mod google;
mod mapbox;
mod nominatim;

pub use bing::BingGeocoder;
pub use common::resolve_credential;
pub use google::GoogleGeocoder;
pub use mapbox::MapboxGeocoder;
pub use nominatim::NominatimGeocoder;

use venuemap_recon::config::{BackendConfig, BackendKind};
use venuemap_recon::{Geocoder, GeocoderChain, PipelineConfig};

/// Credentials given on the command line. Each falls back to the
/// backend's environment variable.
#[derive(Debug, Clone, Default)]
pub struct CredentialFlags {
    pub google_key: Option<String>,
    pub mapbox_token: Option<String>,
    pub bing_key: Option<String>,
}

impl CredentialFlags {
    fn flag_for(&self, kind: BackendKind) -> Option<&str> {
        match kind {
            BackendKind::Nominatim => None,
            BackendKind::Google => self.google_key.as_deref(),
            BackendKind::Mapbox => self.mapbox_token.as_deref(),
            BackendKind::Bing => self.bing_key.as_deref(),
        }
    }
}

fn build_backend(backend: &BackendConfig, credential: Option<String>) -> Box<dyn Geocoder> {
    let base = backend.base_url.clone();
    match backend.kind {
        BackendKind::Nominatim => Box::new(match base {
            Some(url) => NominatimGeocoder::with_base_url(url),
            None => NominatimGeocoder::new(),
        }),
        BackendKind::Google => Box::new(match base {
            Some(url) => GoogleGeocoder::with_base_url(credential, url),
            None => GoogleGeocoder::new(credential),
        }),
        BackendKind::Mapbox => Box::new(match base {
            Some(url) => MapboxGeocoder::with_base_url(credential, url),
            None => MapboxGeocoder::new(credential),
        }),
        BackendKind::Bing => Box::new(match base {
            Some(url) => BingGeocoder::with_base_url(credential, url),
            None => BingGeocoder::new(credential),
        }),
    }
}

/// Assemble the chain in config order. Backends switched off in config are
/// left out; backends lacking a credential stay in but report disabled.
pub fn build_chain(config: &PipelineConfig, flags: &CredentialFlags) -> GeocoderChain {
    let mut chain = GeocoderChain::new(config.bounds, config.retry.policy());

    for backend in &config.backends {
        if !backend.enabled {
            log::debug!("{}: switched off in config", backend.kind);
            continue;
        }
        let credential = if backend.kind.requires_credential() {
            let cred = resolve_credential(flags.flag_for(backend.kind), backend.credential_env());
            if cred.is_none() {
                log::info!(
                    "{}: no credential (set {}), skipping",
                    backend.kind,
                    backend.credential_env().unwrap_or("a credential")
                );
            }
            cred
        } else {
            None
        };
        chain.push(build_backend(backend, credential), backend.min_delay());
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config_for(server: &MockServer) -> PipelineConfig {
        let toml = format!(
            r#"
[retry]
attempts = 2
backoff_ms = 0

[[backends]]
kind = "nominatim"
min_delay_ms = 0
base_url = "{base}"

[[backends]]
kind = "google"
min_delay_ms = 0
base_url = "{base}"
credential_env = "VMAP_TEST_UNSET_GOOGLE_KEY"
"#,
            base = server.base_url()
        );
        PipelineConfig::from_toml(&toml).unwrap()
    }

    #[test]
    fn default_chain_order_and_credentials() {
        let flags = CredentialFlags {
            google_key: Some("g".into()),
            ..Default::default()
        };
        std::env::remove_var("MAPBOX_ACCESS_TOKEN");
        std::env::remove_var("BING_MAPS_API_KEY");

        let chain = build_chain(&PipelineConfig::default(), &flags);

        assert_eq!(chain.backend_names(), vec!["google", "nominatim", "mapbox", "bing"]);
        assert_eq!(chain.enabled_backends(), vec!["google", "nominatim"]);
    }

    #[test]
    fn switched_off_backend_is_left_out() {
        let config = PipelineConfig::from_toml(
            "[[backends]]\nkind = \"nominatim\"\n\n[[backends]]\nkind = \"bing\"\nenabled = false\n",
        )
        .unwrap();
        let chain = build_chain(&config, &CredentialFlags::default());
        assert_eq!(chain.backend_names(), vec!["nominatim"]);
    }

    #[test]
    fn out_of_bounds_hit_falls_through_to_next_backend() {
        let server = MockServer::start();
        // Nominatim answers with New York
        let nominatim = server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(200)
                .json_body(json!([{"lat": "40.7128", "lon": "-74.0060"}]));
        });
        let google = server.mock(|when, then| {
            when.method(GET).path("/maps/api/geocode/json").query_param("key", "flag-key");
            then.status(200).json_body(json!({
                "status": "OK",
                "results": [{"geometry": {"location": {"lat": 51.5074, "lng": -0.1278}}}]
            }));
        });

        let flags = CredentialFlags {
            google_key: Some("flag-key".into()),
            ..Default::default()
        };
        let mut chain = build_chain(&config_for(&server), &flags);
        let hit = chain.resolve("Trafalgar Square, London").unwrap();

        nominatim.assert_calls(1);
        google.assert_calls(1);
        assert_eq!(hit.source, "google");
        assert_eq!((hit.latitude, hit.longitude), (51.5074, -0.1278));
    }

    #[test]
    fn server_errors_are_retried_then_chain_gives_up() {
        let server = MockServer::start();
        let nominatim = server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(502);
        });

        // Google has no credential, so only Nominatim is tried.
        let mut chain = build_chain(&config_for(&server), &CredentialFlags::default());

        assert_eq!(chain.resolve("1 High St, Leeds"), None);
        nominatim.assert_calls(2);
    }
}
