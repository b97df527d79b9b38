//! Mock transport data.
//!
//! Served when no credentials are configured, when the upstream fails and
//! the mock fallback is enabled, and unconditionally while the quota flag
//! is set. The data is static.

use serde_json::Value;

use super::types::{ItemDetail, ScheduleEntry, Stop, TransportItem};

fn item(id: u32, title: &str, description: &str, status: &str, kind: &str, image: u32) -> TransportItem {
    TransportItem {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        thumbnail: format!("https://picsum.photos/300/200?random={image}"),
        status: status.to_string(),
        kind: kind.to_string(),
        latitude: None,
        longitude: None,
        atcocode: None,
        raw: Value::Null,
    }
}

/// The fixed mock listing.
pub fn items() -> Vec<TransportItem> {
    vec![
        item(
            101,
            "City Express Bus",
            "Frequent city route connecting downtown and uptown",
            "Active",
            "Bus",
            11,
        ),
        item(
            102,
            "Coastal Ferry",
            "Scenic ferry service to the nearby islands",
            "Popular",
            "Ferry",
            12,
        ),
        item(
            103,
            "Regional Train",
            "Comfortable train with Wi-Fi and refreshments",
            "Active",
            "Train",
            13,
        ),
    ]
}

/// The fixed mock timetable.
pub fn schedule() -> Vec<ScheduleEntry> {
    vec![
        ScheduleEntry::new("08:00", "Central Station"),
        ScheduleEntry::new("09:30", "Airport"),
        ScheduleEntry::new("11:00", "Harbour"),
    ]
}

fn stops() -> Vec<Stop> {
    vec![
        Stop::new("Central Station", 51.5074, -0.1278),
        Stop::new("City Square", 51.5090, -0.1180),
        Stop::new("Harbour", 51.5010, -0.1420),
    ]
}

/// Mock detail for any id.
///
/// Listed mock items keep their listing fields; other ids get a synthesized
/// item whose status and type vary with the id's numeric value.
pub fn detail(id: &str) -> ItemDetail {
    let item = items().into_iter().find(|i| i.id == id).unwrap_or_else(|| {
        let n = id.parse::<u64>().unwrap_or(0);
        TransportItem {
            id: id.to_string(),
            title: format!("Detailed {id}"),
            description: "This is a detailed description of the transport service, including amenities and notes.".to_string(),
            thumbnail: format!("https://picsum.photos/600/300?random={id}"),
            status: if n % 2 == 0 { "Active" } else { "Popular" }.to_string(),
            kind: match n % 3 {
                0 => "Train",
                1 => "Bus",
                _ => "Ferry",
            }
            .to_string(),
            latitude: None,
            longitude: None,
            atcocode: None,
            raw: Value::Null,
        }
    });

    ItemDetail {
        item,
        schedule: schedule(),
        stops: stops(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_listing_has_three_items() {
        let items = items();
        assert_eq!(items.len(), 3);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["101", "102", "103"]);
    }

    #[test]
    fn detail_for_listed_item_keeps_listing_fields() {
        let detail = detail("102");
        assert_eq!(detail.item.title, "Coastal Ferry");
        assert_eq!(detail.schedule.len(), 3);
        assert_eq!(detail.stops.len(), 3);
    }

    #[test]
    fn detail_for_unknown_item_is_synthesized() {
        let detail = detail("7");
        assert_eq!(detail.item.id, "7");
        assert_eq!(detail.item.title, "Detailed 7");
        assert_eq!(detail.item.status, "Popular");
        assert_eq!(detail.item.kind, "Bus");

        let detail = super::detail("abc");
        assert_eq!(detail.item.status, "Active");
        assert_eq!(detail.item.kind, "Train");
    }
}
