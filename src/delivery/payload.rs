//! Payloads streamed to the registered consumer.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::source::{Fix, SourceError};

/// Opaque identifier the host uses to route replies to a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackId(String);

impl CallbackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialized form of a fix: `{latitude, longitude, accuracy, timestamp, speed, altitude, heading}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub speed: f64,
    pub altitude: f64,
    pub heading: f64,
}

impl From<Fix> for FixPayload {
    fn from(fix: Fix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy: fix.horizontal_accuracy,
            timestamp: fix.timestamp_ms,
            speed: fix.speed,
            altitude: fix.altitude,
            heading: fix.course,
        }
    }
}

/// Non-finite readings become `null`.
impl From<FixPayload> for Value {
    fn from(fix: FixPayload) -> Self {
        json!({
            "latitude": fix.latitude,
            "longitude": fix.longitude,
            "accuracy": fix.accuracy,
            "timestamp": fix.timestamp,
            "speed": fix.speed,
            "altitude": fix.altitude,
            "heading": fix.heading,
        })
    }
}

/// What a single push carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Location(FixPayload),
    /// Human-readable description of a source failure.
    Error(String),
}

impl Payload {
    pub fn is_error(&self) -> bool {
        matches!(self, Payload::Error(_))
    }
}

impl From<Fix> for Payload {
    fn from(fix: Fix) -> Self {
        Payload::Location(fix.into())
    }
}

impl From<SourceError> for Payload {
    fn from(error: SourceError) -> Self {
        Payload::Error(error.description)
    }
}

/// One message received by a consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub callback_id: CallbackId,
    pub payload: Payload,
    /// The channel stays usable for further deliveries.
    pub keep_callback: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceErrorKind;

    #[test]
    fn test_fix_payload_field_names() {
        let fix = Fix {
            latitude: 37.0,
            longitude: -122.0,
            horizontal_accuracy: 5.0,
            timestamp_ms: 1000,
            speed: 1.2,
            altitude: 10.0,
            course: 90.0,
        };

        let json = serde_json::to_value(Payload::from(fix)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "latitude": 37.0,
                "longitude": -122.0,
                "accuracy": 5.0,
                "timestamp": 1000,
                "speed": 1.2,
                "altitude": 10.0,
                "heading": 90.0,
            })
        );
    }

    #[test]
    fn test_fix_value_matches_serialized_form() {
        let fix = FixPayload {
            latitude: 52.5,
            longitude: 13.4,
            accuracy: 8.0,
            timestamp: 1_700_000_000_000,
            speed: -1.0,
            altitude: 34.0,
            heading: -1.0,
        };
        assert_eq!(Value::from(fix.clone()), serde_json::to_value(&fix).unwrap());

        let unknown_speed = FixPayload {
            speed: f64::NAN,
            ..fix
        };
        assert_eq!(Value::from(unknown_speed)["speed"], Value::Null);
    }

    #[test]
    fn test_error_payload_is_description() {
        let payload = Payload::from(SourceError::new(SourceErrorKind::Denied, "access denied"));
        assert!(payload.is_error());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!("access denied")
        );
    }
}
