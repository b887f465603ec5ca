use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::messaging::OutboundEvent;

/// A message bound for the realtime channel.
///
/// Serializes to the flat wire envelope
/// `{"type": ..., "userId": ..., "timestamp": ..., <payload fields>}`.
/// Immutable once created; whoever constructed it owns it until it is handed
/// to the queue or the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutboundMessage {
    #[serde(rename = "type")]
    pub event: OutboundEvent,
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Creation time, epoch milliseconds
    pub timestamp: i64,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl OutboundMessage {
    /// Creates a message stamped with the current time.
    pub fn new(event: OutboundEvent, user_id: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            event,
            user_id: user_id.into(),
            timestamp: epoch_millis(),
            payload,
        }
    }

    /// Connect announcement sent right after the channel opens.
    pub fn connection_announcement(user_id: impl Into<String>) -> Self {
        Self::new(OutboundEvent::Connection, user_id, Map::new())
    }
}

fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_of(entries: &[(&str, Value)]) -> Map<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_envelope_field_names() {
        let msg = OutboundMessage::new(
            OutboundEvent::ChallengeProgress,
            "user_abc",
            payload_of(&[("challengeId", json!("sqli-1")), ("progress", json!(40))]),
        );

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "challenge_progress");
        assert_eq!(value["userId"], "user_abc");
        assert!(value["timestamp"].is_i64());
        // Payload fields are flattened into the envelope
        assert_eq!(value["challengeId"], "sqli-1");
        assert_eq!(value["progress"], 40);
    }

    #[test]
    fn test_round_trip() {
        let msg = OutboundMessage::new(
            OutboundEvent::AchievementUnlocked,
            "user_1",
            payload_of(&[("achievementId", json!("first_blood"))]),
        );

        let serialized = serde_json::to_string(&msg).unwrap();
        let deserialized: OutboundMessage = serde_json::from_str(&serialized).unwrap();
        assert_eq!(msg, deserialized);
    }

    #[test]
    fn test_connection_announcement() {
        let msg = OutboundMessage::connection_announcement("user_1");
        assert_eq!(msg.event, OutboundEvent::Connection);
        assert!(msg.payload.is_empty());
        assert!(msg.timestamp > 0);
    }
}
