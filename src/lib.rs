pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::GeocodeClient;
pub use config::GeocodeConfig;
pub use error::GeocodeError;
pub use types::{LocationRecord, LookupOutcome, LookupPath, Place, ResolvedLocation, found_records};
