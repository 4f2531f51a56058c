use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// GeoJSON point as stored by the backend's geospatial index.
/// Coordinates are `[longitude, latitude]` per the GeoJSON convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default = "point_type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

fn point_type() -> String {
    "Point".to_string()
}

impl GeoPoint {
    pub fn longitude(&self) -> Option<f64> {
        self.coordinates.first().copied()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coordinates.get(1).copied()
    }
}

/// A sports event as returned by the backend `events` resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "title", default)]
    pub name: String,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(rename = "maxParticipants", default)]
    pub max_participants: Option<u32>,
    /// Participant user ids; the server owns membership.
    #[serde(default)]
    pub participants: Vec<String>,
}

impl Event {
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_full(&self) -> bool {
        match self.max_participants {
            Some(max) => self.participants.len() >= max as usize,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_with_geojson_location() {
        let json = r#"{
            "_id": "ev1",
            "title": "Sunday five-a-side",
            "sport": "football",
            "location": {"type": "Point", "coordinates": [2.3522, 48.8566]},
            "maxParticipants": 10,
            "participants": ["u1", "u2"]
        }"#;
        let event: Event = serde_json::from_str(json).expect("Failed to parse event");
        assert_eq!(event.id, "ev1");
        assert_eq!(event.name, "Sunday five-a-side");
        let location = event.location.as_ref().expect("location");
        assert_eq!(location.longitude(), Some(2.3522));
        assert_eq!(location.latitude(), Some(48.8566));
        assert_eq!(event.participant_count(), 2);
        assert!(!event.is_full());
    }

    #[test]
    fn test_event_is_full() {
        let json = r#"{"id": "e", "name": "n", "maxParticipants": 2, "participants": ["a", "b"]}"#;
        let event: Event = serde_json::from_str(json).expect("parse");
        assert!(event.is_full());
    }
}
