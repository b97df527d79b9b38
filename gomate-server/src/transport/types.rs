//! Canonical transport types.
//!
//! Everything the upstream API returns is normalized into these shapes
//! before it leaves the `transport` module, whichever of its many response
//! layouts the upstream happened to use.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A listed transport service or place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportItem {
    /// Item identifier. Numeric upstream ids are rendered as decimal text.
    pub id: String,

    pub title: String,

    pub description: String,

    /// Image URL for list rendering.
    pub thumbnail: String,

    /// Display status such as "Active" or "Popular".
    pub status: String,

    /// Kind of transport ("Bus", "bus_stop", "train_station", ...).
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// NaPTAN ATCO code, when the item is a bus stop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atcocode: Option<String>,

    /// The upstream record this item was built from.
    ///
    /// Kept so the schedule resolver can pick identifiers the canonical
    /// shape does not carry.
    #[serde(default)]
    pub raw: Value,
}

/// A transport item together with its timetable and stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: TransportItem,

    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,

    #[serde(default)]
    pub stops: Vec<Stop>,
}

/// One departure on a timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Departure time as the upstream reports it (usually "HH:MM").
    pub time: String,

    /// Destination or direction of travel.
    pub dest: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_departure_time: Option<String>,

    #[serde(default)]
    pub raw: Value,
}

impl ScheduleEntry {
    /// Build an entry with only a time and destination.
    pub fn new(time: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            dest: dest.into(),
            operator: None,
            platform: None,
            status: None,
            expected_departure_time: None,
            raw: Value::Null,
        }
    }
}

/// A stop for map rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Stop {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }
}
