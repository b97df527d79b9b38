//! Field normalization for upstream records.
//!
//! The transport API (and the demo endpoints standing in for it) return
//! the same information under different keys depending on endpoint and
//! record type. Each canonical field is therefore described by a
//! [`FieldChain`]: an ordered list of paths into the record, evaluated
//! left to right. The first path that yields a usable value wins; when
//! none does, the caller supplies a deterministic default.

use serde_json::Value;

use super::types::TransportItem;

/// Keys under which list endpoints nest their record arrays, in lookup order.
pub const LIST_KEYS: &[&str] = &[
    "member", "places", "stops", "features", "results", "data", "entries",
];

/// An ordered list of paths into a JSON record.
///
/// A path is a sequence of object keys; a segment that parses as an
/// integer also indexes into arrays, so `["geometry", "coordinates", "1"]`
/// reaches the latitude of a GeoJSON point.
#[derive(Debug, Clone, Copy)]
pub struct FieldChain(&'static [&'static [&'static str]]);

impl FieldChain {
    pub const fn new(paths: &'static [&'static [&'static str]]) -> Self {
        Self(paths)
    }

    /// First non-empty textual value along the chain.
    ///
    /// Numbers count as text so numeric ids and codes survive.
    pub fn text(&self, record: &Value) -> Option<String> {
        self.0
            .iter()
            .find_map(|path| lookup(record, path).and_then(as_text))
    }

    /// First numeric value along the chain. Numeric strings are accepted.
    pub fn number(&self, record: &Value) -> Option<f64> {
        self.0
            .iter()
            .find_map(|path| lookup(record, path).and_then(as_number))
    }

    /// First value along the chain that is neither null nor empty.
    pub fn value<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .find_map(|path| lookup(record, path).filter(|v| !is_blank(v)))
    }
}

pub const ID: FieldChain = FieldChain::new(&[
    &["id"],
    &["atcocode"],
    &["osm_id"],
    &["station_code"],
    &["tiploc_code"],
    &["properties", "id"],
]);

pub const TITLE: FieldChain = FieldChain::new(&[
    &["name"],
    &["properties", "name"],
    &["locality"],
    &["title"],
]);

const DESCRIPTION: FieldChain = FieldChain::new(&[
    &["description"],
    &["properties", "description"],
    &["locality"],
]);

const THUMBNAIL: FieldChain = FieldChain::new(&[&["icon"], &["thumbnail"], &["image"]]);

const STATUS: FieldChain = FieldChain::new(&[&["status"]]);

const KIND: FieldChain = FieldChain::new(&[&["type"], &["properties", "type"], &["category"]]);

pub const LATITUDE: FieldChain = FieldChain::new(&[
    &["latitude"],
    &["lat"],
    &["geometry", "coordinates", "1"],
    &["properties", "latitude"],
]);

pub const LONGITUDE: FieldChain = FieldChain::new(&[
    &["longitude"],
    &["lon"],
    &["lng"],
    &["geometry", "coordinates", "0"],
    &["properties", "longitude"],
]);

const ATCOCODE: FieldChain = FieldChain::new(&[
    &["atcocode"],
    &["atco_code"],
    &["properties", "atcocode"],
]);

/// Follow `path` into `value`.
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Locate the record array in a list response.
///
/// A bare array is returned as is; otherwise the first array found under
/// one of [`LIST_KEYS`]. Anything else yields an empty slice.
pub fn extract_list(body: &Value) -> &[Value] {
    if let Value::Array(items) = body {
        return items;
    }

    LIST_KEYS
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Normalize one upstream record into a [`TransportItem`].
///
/// `index` is the record's position in its list; it seeds the defaults
/// for records that carry no id, name or image.
pub fn normalize_item(raw: &Value, index: usize) -> TransportItem {
    TransportItem {
        id: ID.text(raw).unwrap_or_else(|| (1000 + index).to_string()),
        title: TITLE
            .text(raw)
            .unwrap_or_else(|| format!("Transport {}", index + 1)),
        description: DESCRIPTION
            .text(raw)
            .unwrap_or_else(|| "Transport service".to_string()),
        thumbnail: THUMBNAIL
            .text(raw)
            .unwrap_or_else(|| format!("https://picsum.photos/200/200?random={}", index + 10)),
        status: STATUS.text(raw).unwrap_or_else(|| "Active".to_string()),
        kind: KIND.text(raw).unwrap_or_else(|| "Transport".to_string()),
        latitude: LATITUDE.number(raw),
        longitude: LONGITUDE.number(raw),
        atcocode: ATCOCODE.text(raw),
        raw: raw.clone(),
    }
}

/// Normalize a record fetched for a known id.
///
/// Like [`normalize_item`], but a record without an id keeps `id`, and a
/// record without a name is titled after it.
pub fn normalize_for_id(raw: &Value, id: &str) -> TransportItem {
    let mut item = normalize_item(raw, 0);
    if ID.text(raw).is_none() {
        item.id = id.to_string();
    }
    if TITLE.text(raw).is_none() {
        item.title = format!("Transport {id}");
    }
    item
}

/// Normalize at most `limit` records of a list response.
pub fn normalize_list(body: &Value, limit: usize) -> Vec<TransportItem> {
    extract_list(body)
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, raw)| normalize_item(raw, index))
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{Map, json};

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[ a-zA-Z0-9]{0,12}".prop_map(Value::from),
        ]
    }

    fn record() -> impl Strategy<Value = Value> {
        let keys = prop::sample::select(vec![
            "id", "name", "title", "locality", "description", "icon", "type", "status",
            "latitude", "lat", "longitude", "lon", "atcocode",
        ]);
        prop::collection::vec((keys, scalar()), 0..8).prop_map(|pairs| {
            let map: Map<String, Value> = pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
            Value::Object(map)
        })
    }

    proptest! {
        #[test]
        fn normalization_never_yields_empty_required_fields(raw in record(), index in 0usize..500) {
            let item = normalize_item(&raw, index);
            prop_assert!(!item.id.is_empty());
            prop_assert!(!item.title.is_empty());
            prop_assert!(!item.description.is_empty());
            prop_assert!(!item.thumbnail.is_empty());
            prop_assert!(!item.status.is_empty());
            prop_assert!(!item.kind.is_empty());
        }

        #[test]
        fn normalization_is_deterministic(raw in record(), index in 0usize..500) {
            prop_assert_eq!(normalize_item(&raw, index), normalize_item(&raw, index));
        }

        #[test]
        fn list_length_is_bounded(count in 0usize..60, limit in 0usize..40) {
            let records: Vec<Value> = (0..count).map(|i| json!({"id": i})).collect();
            let items = normalize_list(&json!({"member": records}), limit);
            prop_assert_eq!(items.len(), count.min(limit));
        }
    }
}
