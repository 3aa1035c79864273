use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad bounds, zero attempts, etc.).
    ConfigValidation(String),
    /// The same backend kind is listed more than once.
    DuplicateBackend(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::DuplicateBackend(kind) => write!(f, "backend '{kind}' is listed more than once"),
        }
    }
}

impl std::error::Error for ReconError {}
