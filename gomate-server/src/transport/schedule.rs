//! Timetable resolution.
//!
//! A place record may identify a bus stop (ATCO or SMS code), a railway
//! station (CRS or TIPLOC code), or neither. Each identifier maps to a
//! timetable endpoint; the endpoints are tried in order and the first one
//! that yields a non-empty timetable wins. A record with no identifier is
//! looked up by name first and the identifiers of the first match are used.

use serde_json::Value;

use super::fields::{FieldChain, extract_list};
use super::request::{Upstream, UpstreamRequest};
use super::resolve::{Resolution, first_success};
use super::types::ScheduleEntry;

/// Maximum number of entries kept from one timetable.
pub const SCHEDULE_CAP: usize = 50;

/// Keys under which timetable endpoints nest their departures, in lookup order.
const SCHEDULE_KEYS: &[&str] = &[
    "departures",
    "timetables",
    "services",
    "data",
    "schedule",
    "member",
    "all",
    "updates",
];

const ATCO: FieldChain = FieldChain::new(&[&["atcocode"], &["atco_code"]]);
const SMS: FieldChain = FieldChain::new(&[&["smscode"], &["naptan_code"]]);
const STATION: FieldChain = FieldChain::new(&[&["station_code"], &["crs"]]);
const TIPLOC: FieldChain = FieldChain::new(&[&["tiploc_code"]]);
const NAME: FieldChain = FieldChain::new(&[&["name"], &["title"], &["locality"]]);
const KIND: FieldChain = FieldChain::new(&[&["type"]]);

const TIME: FieldChain = FieldChain::new(&[
    &["aimed_departure_time"],
    &["expected_departure_time"],
    &["best_departure_estimate"],
    &["departure_time"],
    &["time"],
    &["std"],
]);

const DEST: FieldChain = FieldChain::new(&[
    &["direction"],
    &["destination_name"],
    &["destination", "name"],
    &["destination"],
    &["dest"],
]);

const OPERATOR: FieldChain =
    FieldChain::new(&[&["operator_name"], &["operator", "name"], &["operator"]]);

const PLATFORM: FieldChain = FieldChain::new(&[&["platform"]]);

const STATUS: FieldChain = FieldChain::new(&[&["status"], &["etd"]]);

const EXPECTED: FieldChain = FieldChain::new(&[
    &["expected_departure_time"],
    &["expected", "departure", "time"],
]);

fn bus_live(code: &str) -> UpstreamRequest {
    UpstreamRequest::path(["bus", "stop", code, "live.json"]).with_query("group", "no")
}

fn station_timetable(code: &str) -> UpstreamRequest {
    UpstreamRequest::path(["train", "station", code, "timetable.json"])
}

fn tiploc_timetable(code: &str) -> UpstreamRequest {
    UpstreamRequest::path([
        "train".to_string(),
        "station_timetables".to_string(),
        format!("tiploc:{code}.json"),
    ])
}

/// Free-text place search used when a record carries no identifiers.
pub fn name_search(name: &str) -> UpstreamRequest {
    UpstreamRequest::path(["places.json"])
        .with_query("query", name)
        .with_query("type", "bus_stop,train_station")
}

/// Timetable endpoints for a record, in the order they should be tried.
pub fn candidates(raw: &Value) -> Vec<UpstreamRequest> {
    let bus: Vec<UpstreamRequest> = [ATCO.text(raw), SMS.text(raw)]
        .into_iter()
        .flatten()
        .map(|code| bus_live(&code))
        .collect();

    let mut train = Vec::new();
    if let Some(code) = STATION.text(raw) {
        train.push(station_timetable(&code));
    }
    if let Some(code) = TIPLOC.text(raw) {
        train.push(tiploc_timetable(&code));
    }

    let train_first = KIND.text(raw).is_some_and(|k| k == "train_station");
    let (first, second) = if train_first { (train, bus) } else { (bus, train) };

    let mut requests = first;
    requests.extend(second);
    requests.dedup();
    requests
}

/// Locate the departure records in a timetable response.
///
/// An object under a schedule key is flattened by concatenating its array
/// values, which covers both `{"all": [...]}` and per-line maps.
pub fn extract_schedule(body: &Value) -> Vec<&Value> {
    if let Value::Array(items) = body {
        return items.iter().collect();
    }

    for key in SCHEDULE_KEYS {
        let found: Vec<&Value> = match body.get(*key) {
            Some(Value::Array(items)) => items.iter().collect(),
            // Per-line maps, flattened in the order the upstream sent them.
            Some(Value::Object(map)) => map
                .values()
                .filter_map(Value::as_array)
                .flatten()
                .collect(),
            _ => continue,
        };
        if !found.is_empty() {
            return found;
        }
    }

    Vec::new()
}

/// Normalize one departure record.
pub fn normalize_entry(raw: &Value) -> ScheduleEntry {
    ScheduleEntry {
        time: TIME.text(raw).unwrap_or_else(|| "--:--".to_string()),
        dest: DEST.text(raw).unwrap_or_else(|| "Unknown".to_string()),
        operator: OPERATOR.text(raw),
        platform: PLATFORM.text(raw),
        status: STATUS.text(raw),
        expected_departure_time: EXPECTED.text(raw),
        raw: raw.clone(),
    }
}

/// Normalize a timetable response, keeping at most [`SCHEDULE_CAP`] entries.
pub fn normalize_schedule(body: &Value) -> Vec<ScheduleEntry> {
    extract_schedule(body)
        .into_iter()
        .take(SCHEDULE_CAP)
        .map(normalize_entry)
        .collect()
}

fn non_empty_schedule(body: Value) -> Option<Vec<ScheduleEntry>> {
    Some(normalize_schedule(&body)).filter(|s| !s.is_empty())
}

/// Resolve the timetable for a raw place record.
pub async fn resolve<U: Upstream>(upstream: &U, raw: &Value) -> Resolution<Vec<ScheduleEntry>> {
    let direct = candidates(raw);
    if !direct.is_empty() {
        return first_success(upstream, &direct, non_empty_schedule).await;
    }

    let Some(name) = NAME.text(raw) else {
        return Resolution::Exhausted;
    };

    let search = [name_search(&name)];
    let record = match first_success(upstream, &search, |body| {
        extract_list(&body)
            .iter()
            .find(|record| !candidates(record).is_empty())
            .cloned()
    })
    .await
    {
        Resolution::Found { value, .. } => value,
        Resolution::Exhausted => return Resolution::Exhausted,
        Resolution::QuotaExceeded => return Resolution::QuotaExceeded,
    };

    first_success(upstream, &candidates(&record), non_empty_schedule).await
}
