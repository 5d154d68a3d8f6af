//! # Canonical Event
//! Source-agnostic earthquake record produced by every adapter, plus the
//! provenance tag and the user-facing source selection mode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used when a provider omits the location text.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Provenance of a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Observatory,
    Survey,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Observatory => "observatory",
            EventSource::Survey => "survey",
        }
    }
}

/// Which upstream feeds a refresh should query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Observatory,
    Survey,
    #[default]
    Both,
}

impl SourceMode {
    pub fn includes_observatory(&self) -> bool {
        matches!(self, SourceMode::Observatory | SourceMode::Both)
    }

    pub fn includes_survey(&self) -> bool {
        matches!(self, SourceMode::Survey | SourceMode::Both)
    }
}

/// Normalized earthquake record. Built once by an adapter and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub magnitude: f64,
    /// Kilometres.
    pub depth: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub location: String,
    pub time: DateTime<Utc>,
    pub source: EventSource,
}
