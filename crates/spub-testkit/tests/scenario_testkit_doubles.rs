//! Scenario: the in-memory doubles behave like the real edges.
//!
//! GREEN when:
//! - ScriptedIngest replays in order, then reports exhaustion.
//! - RecordingPublisher records calls even when set to fail.
//! - Builders produce datagrams the producers would send.

use spub_schemas::Metric;
use spub_testkit::{cloud_datagram, live_datagram, RecordingPublisher, ScriptedIngest};
use spub_transport::{IngestSource, Publisher};

#[tokio::test]
async fn scripted_ingest_replays_then_ends() {
    let mut src = ScriptedIngest::new(vec![b"a".to_vec(), b"b".to_vec()]);
    assert_eq!(src.recv().await.unwrap().unwrap().payload, b"a");
    assert_eq!(src.recv().await.unwrap().unwrap().payload, b"b");
    assert!(src.recv().await.unwrap().is_none());
    assert_eq!(src.delivered(), 2);
}

#[test]
fn failing_publisher_still_records() {
    let p = RecordingPublisher::new();
    p.fail_publishes(true);
    assert!(p.publish("solar/pac", "1.0", false).is_err());
    p.fail_publishes(false);
    assert!(p.publish("solar/pac", "2.0", false).is_ok());
    assert_eq!(p.payloads_for("solar/pac"), vec!["1.0", "2.0"]);
}

#[test]
fn builders_match_producer_shapes() {
    let live: serde_json::Value = serde_json::from_slice(&live_datagram(1_700_000_000_000)).unwrap();
    assert_eq!(live["data"]["dataTimestamp"], "1700000000000");
    assert_eq!(live["data"]["pac"], 3.456);

    let cloud: serde_json::Value =
        serde_json::from_slice(&cloud_datagram(&[(Metric::GridSellTodayEnergy, 4.2)])).unwrap();
    assert_eq!(cloud["data"]["gridSellTodayEnergy"], 4.2);
    assert!(cloud["data"].get("dataTimestamp").is_none());
}
