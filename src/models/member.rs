use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last known state of one beacon source.
///
/// `source_address` is the peer IP without port and is the table key;
/// `identity` is whatever name the source reported and is never verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub identity: String,
    pub source_address: String,
    pub last_seen: DateTime<Utc>,
}

impl MemberRecord {
    /// Age of the record relative to `now`; negative if the source clock runs ahead.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_seen
    }
}

/// Membership changes published by the listener and the sweeper
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum MembershipEvent {
    #[serde(rename = "member:joined")]
    Joined { key: String, identity: String },
    #[serde(rename = "member:refreshed")]
    Refreshed { key: String, identity: String },
    #[serde(rename = "member:evicted")]
    Evicted {
        key: String,
        identity: String,
        last_seen: DateTime<Utc>,
    },
}

impl MembershipEvent {
    /// Event name used on the wire, matching the serde tag
    pub fn kind(&self) -> &'static str {
        match self {
            MembershipEvent::Joined { .. } => "member:joined",
            MembershipEvent::Refreshed { .. } => "member:refreshed",
            MembershipEvent::Evicted { .. } => "member:evicted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_age() {
        let now = Utc::now();
        let record = MemberRecord {
            identity: "host-A".to_string(),
            source_address: "10.0.0.1".to_string(),
            last_seen: now - Duration::seconds(42),
        };
        assert_eq!(record.age(now), Duration::seconds(42));
    }

    #[test]
    fn test_event_serialization() {
        let event = MembershipEvent::Joined {
            key: "10.0.0.1".to_string(),
            identity: "host-A".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "member:joined");
        assert_eq!(json["type"], event.kind());
        assert_eq!(json["data"]["identity"], "host-A");
    }
}
