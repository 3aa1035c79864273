//! `venuemap-recon` — venue record reconciliation and geocoding engine.
//!
//! Pure engine crate: receives pre-loaded records, returns merged and
//! coordinate-filled records. Network backends plug in through the
//! [`geocode::Geocoder`] trait; no CLI or file IO lives here.

pub mod address;
pub mod bounds;
pub mod config;
pub mod error;
pub mod geocode;
pub mod keyer;
pub mod merge;
pub mod model;
pub mod phone;

pub use address::{build_address, UNKNOWN_COUNTY};
pub use bounds::BoundingBox;
pub use config::PipelineConfig;
pub use error::ReconError;
pub use geocode::{GeocodeError, Geocoder, GeocoderChain};
pub use keyer::{key_of, RecordKey};
pub use merge::{apply_coordinates, merge, MergeOutcome};
pub use model::{Coordinates, CoverageStats, GeocodeResult, VenueRecord};
