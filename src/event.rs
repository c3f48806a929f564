//! # Event Records
//!
//! The unit of extraction. An [`Event`] is what the extractor produces after
//! validation and what each per-category artifact stores; a [`MergedEvent`] is
//! the same record stamped with the tag of the category it came from.
//!
//! Timestamps are naive (wall-clock) date-times serialized as ISO-8601
//! (`2024-05-01T18:30:00`). Absent dates serialize as `null`; `price` is
//! always present because validation normalizes a missing or free price to 0.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single event listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name, never empty
    pub name: String,

    /// When the event starts
    pub starting_date: Option<NaiveDateTime>,

    /// When the event ends. Expected to be at or after `starting_date`.
    pub ending_date: Option<NaiveDateTime>,

    /// Free-text description, possibly empty
    pub description: String,

    /// Price in euros, 0 when free or unspecified
    pub price: f64,

    /// Event type, e.g. "Exposiciones" or "Talleres"
    #[serde(rename = "type")]
    pub kind: String,
}

impl Event {
    /// Whether the date range is ordered (or not fully known)
    pub fn has_ordered_dates(&self) -> bool {
        match (self.starting_date, self.ending_date) {
            (Some(start), Some(end)) => end >= start,
            _ => true,
        }
    }

    /// Whether the event costs nothing
    pub fn is_free(&self) -> bool {
        self.price == 0.0
    }
}

/// An event tagged with the category it was extracted from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedEvent {
    #[serde(flatten)]
    pub event: Event,

    /// Source tag of the category, e.g. "actividad"
    pub source: String,
}

impl MergedEvent {
    pub fn new(event: Event, source: impl Into<String>) -> Self {
        Self {
            event,
            source: source.into(),
        }
    }
}
