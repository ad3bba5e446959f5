//! Tests for data models
//!
//! These tests verify the beacon wire record and the member views.

use chrono::{TimeZone, Utc};
use serde_json::json;

use heartbeat_monitor::collector::protocol;
use heartbeat_monitor::models::{Beacon, MemberRecord};

#[test]
fn test_beacon_carries_identity_and_timestamp() {
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let beacon = Beacon::new("host-A", ts);

    let decoded = protocol::decode(&protocol::encode(&beacon).unwrap()).unwrap();

    assert_eq!(decoded.identity, "host-A");
    assert_eq!(decoded.timestamp, ts);
}

#[test]
fn test_beacon_keeps_subsecond_precision() {
    let ts = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    let decoded = protocol::decode(&protocol::encode(&Beacon::new("h", ts)).unwrap()).unwrap();

    assert_eq!(decoded.timestamp, ts);
}

#[test]
fn test_unicode_identity() {
    let beacon = Beacon::now("rechenknoten-α");
    let decoded = protocol::decode(&protocol::encode(&beacon).unwrap()).unwrap();

    assert_eq!(decoded.identity, "rechenknoten-α");
}

#[test]
fn test_member_record_json_shape() {
    let record = MemberRecord {
        identity: "host-A".to_string(),
        source_address: "10.0.0.1".to_string(),
        last_seen: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    };

    let value = serde_json::to_value(&record).unwrap();

    assert_eq!(
        value,
        json!({
            "identity": "host-A",
            "source_address": "10.0.0.1",
            "last_seen": "2024-05-01T12:00:00Z"
        })
    );
}
