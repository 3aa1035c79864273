//! Ordered geocoder fallback chain.
//!
//! Each backend has its own rate limiter. Transient failures are retried with
//! exponential backoff; every other failure, and any hit outside the bounding
//! box, moves straight on to the next backend. Running out of backends is a
//! normal outcome and yields `None`.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use crate::bounds::BoundingBox;
use crate::model::{Coordinates, GeocodeResult};

// ---------------------------------------------------------------------------
// Backend interface
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeError {
    /// Timeout, connection failure, HTTP 429 or 5xx. Worth retrying.
    Transient(String),
    /// Backend answered, but with an error status or unusable payload.
    Rejected(String),
    /// Backend answered with zero results.
    NoResults,
    /// Backend is not configured (missing credentials).
    Disabled,
}

impl GeocodeError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient(msg) => write!(f, "transient failure: {msg}"),
            Self::Rejected(msg) => write!(f, "rejected: {msg}"),
            Self::NoResults => write!(f, "no results"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

impl std::error::Error for GeocodeError {}

/// One external geocoding service.
pub trait Geocoder {
    fn name(&self) -> &str;

    /// False when the credentials the service needs are absent.
    fn enabled(&self) -> bool {
        true
    }

    /// Resolve a free-text address. One call is one request; retrying is the
    /// chain's job.
    fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError>;
}

// ---------------------------------------------------------------------------
// Rate limiting + retry
// ---------------------------------------------------------------------------

/// Minimum spacing between consecutive calls to one backend.
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_call: None,
        }
    }

    /// Block until `min_delay` has passed since the previous call, then
    /// record this one.
    pub fn wait(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                thread::sleep(self.min_delay - elapsed);
            }
        }
        self.last_call = Some(Instant::now());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per backend call, including the first.
    pub attempts: u32,
    /// Delay before the second attempt; doubles after each retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

struct Backend {
    geocoder: Box<dyn Geocoder>,
    limiter: RateLimiter,
}

pub struct GeocoderChain {
    backends: Vec<Backend>,
    bounds: BoundingBox,
    retry: RetryPolicy,
}

impl GeocoderChain {
    pub fn new(bounds: BoundingBox, retry: RetryPolicy) -> Self {
        Self {
            backends: Vec::new(),
            bounds,
            retry,
        }
    }

    /// Append a backend; dispatch order is insertion order.
    pub fn push(&mut self, geocoder: Box<dyn Geocoder>, min_delay: Duration) {
        self.backends.push(Backend {
            geocoder,
            limiter: RateLimiter::new(min_delay),
        });
    }

    pub fn with_backend(mut self, geocoder: Box<dyn Geocoder>, min_delay: Duration) -> Self {
        self.push(geocoder, min_delay);
        self
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.geocoder.name()).collect()
    }

    pub fn enabled_backends(&self) -> Vec<&str> {
        self.backends
            .iter()
            .filter(|b| b.geocoder.enabled())
            .map(|b| b.geocoder.name())
            .collect()
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// First in-bounds hit across the configured backends, or `None`.
    pub fn resolve(&mut self, address: &str) -> Option<GeocodeResult> {
        let address = address.trim();
        if address.is_empty() {
            return None;
        }

        let retry = self.retry;
        let bounds = self.bounds;

        for backend in self.backends.iter_mut() {
            let name = backend.geocoder.name().to_string();
            if !backend.geocoder.enabled() {
                log::debug!("{name}: disabled, skipping");
                continue;
            }

            match call_with_retry(backend, address, retry) {
                Ok(coords) if bounds.contains(coords.latitude, coords.longitude) => {
                    log::debug!(
                        "{name}: {address} -> {:.4}, {:.4}",
                        coords.latitude,
                        coords.longitude
                    );
                    return Some(GeocodeResult {
                        latitude: coords.latitude,
                        longitude: coords.longitude,
                        source: name,
                    });
                }
                Ok(coords) => {
                    log::warn!(
                        "{name} returned coordinates outside bounds for '{address}': {:.4}, {:.4}",
                        coords.latitude,
                        coords.longitude
                    );
                }
                Err(e) => {
                    log::debug!("{name}: {e}");
                }
            }
        }

        None
    }
}

fn call_with_retry(
    backend: &mut Backend,
    address: &str,
    retry: RetryPolicy,
) -> Result<Coordinates, GeocodeError> {
    let mut backoff = retry.backoff;
    let mut attempt = 1;

    loop {
        backend.limiter.wait();
        match backend.geocoder.geocode(address) {
            Err(e) if e.is_transient() && attempt < retry.attempts => {
                log::warn!(
                    "{}: retry {}/{} in {:?} ({e})",
                    backend.geocoder.name(),
                    attempt,
                    retry.attempts - 1,
                    backoff,
                );
                thread::sleep(backoff);
                backoff *= 2;
                attempt += 1;
            }
            result => return result,
        }
    }
}
