use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GeocodeError;

/// Which provider endpoint an input routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPath {
    /// Five-digit US ZIP code, resolved via the postal-code endpoint
    Zip,
    /// Free-text "City, State", resolved via the direct-search endpoint
    City,
}

impl LookupPath {
    /// Classify a raw input string.
    ///
    /// ZIP path if and only if the input is exactly five ASCII digits and
    /// nothing else. No trimming or case-folding happens first, so
    /// `" 31419"` and `"31419-1234"` both route to the city path.
    pub fn for_input(raw: &str) -> Self {
        if raw.len() == 5 && raw.bytes().all(|b| b.is_ascii_digit()) {
            Self::Zip
        } else {
            Self::City
        }
    }
}

impl fmt::Display for LookupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zip => write!(f, "zip"),
            Self::City => write!(f, "city"),
        }
    }
}

/// A candidate object from either geocoding endpoint.
///
/// The direct-search endpoint returns an array of these; the ZIP endpoint
/// returns a single bare object. All text fields are optional in practice.
/// `lat`/`lon` are required: a candidate without coordinates is a parse
/// error, never a half-populated record.
#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    pub name: Option<String>,
    pub local_names: Option<LocalNames>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

/// Localized name variants; only English is consulted
#[derive(Debug, Clone, Deserialize)]
pub struct LocalNames {
    pub en: Option<String>,
}

/// Normalized output record, uniform across both lookup paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    pub state: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationRecord {
    /// Map a provider candidate to the normalized shape.
    ///
    /// Display name falls back `name` -> `local_names.en` -> `"Unknown"`;
    /// state defaults to `"N/A"`, country to `"US"`. Empty strings count as
    /// absent. Coordinates are taken verbatim.
    pub fn from_place(place: Place) -> Self {
        let name = place
            .name
            .filter(|s| !s.is_empty())
            .or_else(|| {
                place
                    .local_names
                    .and_then(|l| l.en)
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_else(|| "Unknown".to_string());

        Self {
            name,
            state: place
                .state
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "N/A".to_string()),
            country: place
                .country
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "US".to_string()),
            latitude: place.lat,
            longitude: place.lon,
        }
    }
}

impl fmt::Display for LocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {} ({}, {})",
            self.name, self.state, self.country, self.latitude, self.longitude
        )
    }
}

/// Outcome of a single lookup
#[derive(Debug)]
pub enum LookupOutcome {
    /// Provider returned a usable candidate
    Found(LocationRecord),
    /// Provider answered with no match (empty candidate list, or 404 on the
    /// ZIP endpoint)
    NotFound,
    /// Provider error status or transport failure
    Failed(GeocodeError),
}

impl LookupOutcome {
    pub fn record(&self) -> Option<&LocationRecord> {
        match self {
            Self::Found(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// One batch entry: the input, how it was routed, and what came back
#[derive(Debug)]
pub struct ResolvedLocation {
    pub query: String,
    pub path: LookupPath,
    pub outcome: LookupOutcome,
}

/// Project a batch result down to the successfully resolved records,
/// preserving input order. Not-found and failed entries are dropped, so the
/// output may be shorter than the input batch.
pub fn found_records(resolved: &[ResolvedLocation]) -> Vec<LocationRecord> {
    resolved
        .iter()
        .filter_map(|r| r.outcome.record().cloned())
        .collect()
}
