// File I/O: venue CSV and the venue-data.js artifact

pub mod atomic;
pub mod csv;
pub mod js;

pub use atomic::{write_atomic, write_atomic_all};
pub use csv::{load_venues, parse_venues, save_venues, venues_to_csv, VenueSheet, COLUMNS};
pub use js::{parse_venue_data, read_venue_data, render_venue_data, write_venue_data};
