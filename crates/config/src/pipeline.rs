//! Locating and loading `pipeline.toml`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use venuemap_recon::{PipelineConfig, ReconError};

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Invalid { path: PathBuf, source: ReconError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "cannot read {}: {message}", path.display())
            }
            Self::Invalid { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {}

/// `<config dir>/venuemap`, or `./venuemap` when the platform has none.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("venuemap")
}

pub fn default_pipeline_path() -> PathBuf {
    config_dir().join("pipeline.toml")
}

/// Where the config came from, for the run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    UserDefault(PathBuf),
    BuiltIn,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(p) | Self::UserDefault(p) => write!(f, "{}", p.display()),
            Self::BuiltIn => write!(f, "built-in defaults"),
        }
    }
}

/// Load the pipeline config. An explicit path must exist; the per-user
/// default is optional and falls back to built-in defaults.
pub fn load_pipeline_config(
    explicit: Option<&Path>,
) -> Result<(PipelineConfig, ConfigSource), ConfigError> {
    if let Some(path) = explicit {
        let config = read_config(path)?;
        return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
    }

    let path = default_pipeline_path();
    if path.is_file() {
        let config = read_config(&path)?;
        return Ok((config, ConfigSource::UserDefault(path)));
    }

    log::debug!("no pipeline config at {}, using defaults", path.display());
    Ok((PipelineConfig::default(), ConfigSource::BuiltIn))
}

fn read_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    PipelineConfig::from_toml(&text).map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}
