//! Detail resolution.
//!
//! An item id on its own does not say what kind of identifier it is, so
//! the place endpoint is queried with it as each kind in turn, ending with
//! the path-style lookup. The first query that returns a record wins.

use serde_json::{Map, Value};

use super::fields::{FieldChain, LATITUDE, LIST_KEYS, LONGITUDE, extract_list, normalize_for_id};
use super::request::{Upstream, UpstreamRequest};
use super::resolve::{Resolution, first_success};
use super::types::{ItemDetail, ScheduleEntry, Stop, TransportItem};

/// Query parameters tried against `/places.json`, in order.
const QUERY_KEYS: &[&str] = &["atcocode", "osm_id", "station_code", "tiploc_code"];

/// Top-level keys that mark a record as the item itself rather than a wrapper.
const RECORD_KEYS: &[&str] = &["id", "name", "title", "atcocode"];

const STOPS: FieldChain = FieldChain::new(&[&["stops"], &["calling_points"], &["route", "stops"]]);

const STOP_NAME: FieldChain = FieldChain::new(&[
    &["name"],
    &["station_name"],
    &["common_name"],
    &["description"],
]);

/// Detail strategies for `id`, in priority order.
pub fn strategies(id: &str) -> Vec<UpstreamRequest> {
    let mut requests: Vec<UpstreamRequest> = QUERY_KEYS
        .iter()
        .map(|key| UpstreamRequest::path(["places.json"]).with_query(*key, id))
        .collect();
    requests.push(UpstreamRequest::path([
        "places".to_string(),
        format!("{id}.json"),
    ]));
    requests
}

/// Pick the item record out of a detail response.
///
/// A list uses its first element; a wrapper object (one with a list key
/// and none of the item keys) uses the first element of that list. Empty
/// results and error objects are rejected.
pub fn record_from_body(body: Value) -> Option<Value> {
    let record = match body {
        Value::Array(items) => items.into_iter().next()?,
        Value::Object(ref map) if is_wrapper(map) => extract_list(&body).first()?.clone(),
        Value::Object(_) => body,
        _ => return None,
    };

    match &record {
        Value::Object(map) if !map.is_empty() && !map.contains_key("error") => Some(record),
        _ => None,
    }
}

fn is_wrapper(map: &Map<String, Value>) -> bool {
    !RECORD_KEYS.iter().any(|k| map.contains_key(*k))
        && LIST_KEYS
            .iter()
            .any(|k| map.get(*k).is_some_and(Value::is_array))
}

/// Stops for map rendering.
///
/// Taken from a stop list on the record when there is one; otherwise the
/// item itself is the only stop, if it has coordinates.
pub fn stops(record: &Value, item: &TransportItem) -> Vec<Stop> {
    if let Some(Value::Array(list)) = STOPS.value(record) {
        return list
            .iter()
            .enumerate()
            .map(|(i, stop)| Stop {
                name: STOP_NAME
                    .text(stop)
                    .unwrap_or_else(|| format!("Stop {}", i + 1)),
                latitude: LATITUDE.number(stop),
                longitude: LONGITUDE.number(stop),
            })
            .collect();
    }

    match (item.latitude, item.longitude) {
        (Some(lat), Some(lon)) => vec![Stop::new(item.title.clone(), lat, lon)],
        _ => Vec::new(),
    }
}

/// Assemble the detail for a resolved record.
pub fn build(id: &str, record: &Value, schedule: Vec<ScheduleEntry>) -> ItemDetail {
    let item = normalize_for_id(record, id);
    let stops = stops(record, &item);
    ItemDetail {
        item,
        schedule,
        stops,
    }
}

/// Run the detail strategies for `id`; the value is the raw item record.
pub async fn resolve<U: Upstream>(upstream: &U, id: &str) -> Resolution<Value> {
    first_success(upstream, &strategies(id), record_from_body).await
}
