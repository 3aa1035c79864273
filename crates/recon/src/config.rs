use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;

use crate::bounds::BoundingBox;
use crate::error::ReconError;
use crate::geocode::RetryPolicy;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Geocoding pipeline settings. Every section is optional; an empty document
/// yields the built-in defaults (UK bounds, 3 attempts, all four backends).
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub bounds: BoundingBox,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bounds: BoundingBox::default(),
            retry: RetryConfig::default(),
            backends: default_backends(),
        }
    }
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.attempts,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Nominatim,
    Google,
    Mapbox,
    Bing,
}

impl BackendKind {
    /// Requests-per-second limits published by each service.
    pub fn default_delay_ms(&self) -> u64 {
        match self {
            Self::Nominatim => 1200,
            Self::Google | Self::Mapbox | Self::Bing => 100,
        }
    }

    /// Environment variable holding the credential, if one is needed.
    pub fn default_credential_env(&self) -> Option<&'static str> {
        match self {
            Self::Nominatim => None,
            Self::Google => Some("GOOGLE_MAPS_API_KEY"),
            Self::Mapbox => Some("MAPBOX_ACCESS_TOKEN"),
            Self::Bing => Some("BING_MAPS_API_KEY"),
        }
    }

    pub fn requires_credential(&self) -> bool {
        self.default_credential_env().is_some()
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nominatim => write!(f, "nominatim"),
            Self::Google => write!(f, "google"),
            Self::Mapbox => write!(f, "mapbox"),
            Self::Bing => write!(f, "bing"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    #[serde(default)]
    pub min_delay_ms: Option<u64>,
    #[serde(default)]
    pub credential_env: Option<String>,
    /// Override the service endpoint (self-hosted Nominatim, test servers).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl BackendConfig {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            min_delay_ms: None,
            credential_env: None,
            base_url: None,
            enabled: true,
        }
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms.unwrap_or_else(|| self.kind.default_delay_ms()))
    }

    pub fn credential_env(&self) -> Option<&str> {
        self.credential_env
            .as_deref()
            .or_else(|| self.kind.default_credential_env())
    }
}

/// Google first for accuracy, Nominatim as the free fallback, then the
/// optional commercial services.
fn default_backends() -> Vec<BackendConfig> {
    [
        BackendKind::Google,
        BackendKind::Nominatim,
        BackendKind::Mapbox,
        BackendKind::Bing,
    ]
    .into_iter()
    .map(BackendConfig::new)
    .collect()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let b = &self.bounds;
        if !(-90.0..=90.0).contains(&b.min_lat) || !(-90.0..=90.0).contains(&b.max_lat) {
            return Err(ReconError::ConfigValidation(
                "bounds latitude must be within [-90, 90]".into(),
            ));
        }
        if !(-180.0..=180.0).contains(&b.min_lon) || !(-180.0..=180.0).contains(&b.max_lon) {
            return Err(ReconError::ConfigValidation(
                "bounds longitude must be within [-180, 180]".into(),
            ));
        }
        if b.min_lat >= b.max_lat || b.min_lon >= b.max_lon {
            return Err(ReconError::ConfigValidation(format!(
                "bounds are empty: lat {}..{}, lon {}..{}",
                b.min_lat, b.max_lat, b.min_lon, b.max_lon
            )));
        }

        if self.retry.attempts == 0 {
            return Err(ReconError::ConfigValidation(
                "retry.attempts must be at least 1".into(),
            ));
        }

        if self.backends.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one backend is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for backend in &self.backends {
            if !seen.insert(backend.kind) {
                return Err(ReconError::DuplicateBackend(backend.kind.to_string()));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config.bounds, BoundingBox::UK);
        assert_eq!(config.retry.attempts, 3);
        assert_eq!(config.retry.backoff_ms, 1000);
        let kinds: Vec<BackendKind> = config.backends.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BackendKind::Google,
                BackendKind::Nominatim,
                BackendKind::Mapbox,
                BackendKind::Bing
            ]
        );
    }

    #[test]
    fn parse_full_config() {
        let input = r#"
[bounds]
min_lat = 50.0
max_lat = 59.0
min_lon = -7.0
max_lon = 2.0

[retry]
attempts = 5
backoff_ms = 250

[[backends]]
kind = "nominatim"
min_delay_ms = 1500
base_url = "http://localhost:8080"

[[backends]]
kind = "google"
credential_env = "MY_GOOGLE_KEY"
"#;
        let config = PipelineConfig::from_toml(input).unwrap();
        assert_eq!(config.bounds.min_lat, 50.0);
        assert_eq!(config.retry.policy().attempts, 5);
        assert_eq!(config.retry.policy().backoff, Duration::from_millis(250));

        let nominatim = &config.backends[0];
        assert_eq!(nominatim.kind, BackendKind::Nominatim);
        assert_eq!(nominatim.min_delay(), Duration::from_millis(1500));
        assert_eq!(nominatim.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(nominatim.credential_env(), None);

        let google = &config.backends[1];
        assert_eq!(google.min_delay(), Duration::from_millis(100));
        assert_eq!(google.credential_env(), Some("MY_GOOGLE_KEY"));
        assert!(google.enabled);
    }

    #[test]
    fn default_credential_env_per_kind() {
        assert_eq!(
            BackendConfig::new(BackendKind::Mapbox).credential_env(),
            Some("MAPBOX_ACCESS_TOKEN")
        );
        assert!(!BackendKind::Nominatim.requires_credential());
        assert!(BackendKind::Bing.requires_credential());
    }

    #[test]
    fn reject_unknown_backend_kind() {
        let input = r#"
[[backends]]
kind = "yahoo"
"#;
        let err = PipelineConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_duplicate_backend() {
        let input = r#"
[[backends]]
kind = "nominatim"

[[backends]]
kind = "nominatim"
"#;
        let err = PipelineConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("'nominatim'"));
    }

    #[test]
    fn reject_inverted_bounds() {
        let input = r#"
[bounds]
min_lat = 60.0
max_lat = 50.0
min_lon = -8.0
max_lon = 2.0
"#;
        let err = PipelineConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("bounds are empty"));
    }

    #[test]
    fn reject_zero_attempts() {
        let err = PipelineConfig::from_toml("[retry]\nattempts = 0\n").unwrap_err();
        assert!(err.to_string().contains("retry.attempts"));
    }

    #[test]
    fn reject_empty_backend_list() {
        let err = PipelineConfig::from_toml("backends = []\n").unwrap_err();
        assert!(err.to_string().contains("at least one backend"));
    }
}
