//! Link lifecycle: bounded initial association and rate-limited reconnects.

use smartmeter::app::events::LinkEvent;
use smartmeter::app::link::LinkState;
use smartmeter::error::{Error, LinkError};

use crate::mock_net::{BASE_URL, connected_client, idle_client, test_config};

#[test]
fn begin_connects_within_window() {
    let (mut client, rig) = idle_client(&test_config());
    rig.wifi.set_join_delay(1_200);

    client.begin().unwrap();

    assert!(client.is_connected());
    assert_eq!(client.link_state(), LinkState::Connected);
    // Three 500 ms polls cover a 1.2 s join.
    assert_eq!(rig.clock.now(), 1_500);

    let events = rig.sink.link_events();
    assert!(matches!(events[0], LinkEvent::Associating { ref ssid } if ssid.as_str() == "HomeWiFi"));
    match &events[1] {
        LinkEvent::Associated { ip, rssi, server } => {
            assert!(ip.is_some());
            assert_eq!(*rssi, Some(-58));
            assert_eq!(server.as_str(), BASE_URL);
        }
        other => panic!("expected Associated, got {:?}", other),
    }
}

#[test]
fn begin_gives_up_after_twenty_polls() {
    let (mut client, rig) = idle_client(&test_config());
    rig.wifi.set_ap_available(false);

    let err = client.begin().unwrap_err();

    assert_eq!(err, Error::Link(LinkError::AssociationFailed));
    assert!(!client.is_connected());
    assert_eq!(client.link_state(), LinkState::Disconnected);
    assert_eq!(rig.clock.now(), 10_000, "20 polls x 500 ms");
    assert_eq!(
        rig.sink.link_events().last(),
        Some(&LinkEvent::AssociationFailed { attempts: 20 })
    );
}

#[test]
fn begin_reports_driver_rejection_without_waiting() {
    let (mut client, rig) = idle_client(&test_config());
    rig.wifi.set_reject_requests(true);

    let err = client.begin().unwrap_err();

    assert_eq!(err, Error::Link(LinkError::DriverRejected));
    assert_eq!(rig.clock.now(), 0);
    assert_eq!(
        rig.sink.link_events().last(),
        Some(&LinkEvent::AssociationFailed { attempts: 0 })
    );
}

#[test]
fn maintain_reconnects_at_most_once_per_interval() {
    let (mut client, rig) = idle_client(&test_config());
    rig.wifi.set_ap_available(false);
    let _ = client.begin();
    assert_eq!(rig.wifi.start_calls(), 1);

    // 10 s after boot: still inside the first 30 s interval.
    for _ in 0..50 {
        client.maintain();
        rig.clock.advance(100);
    }
    assert_eq!(rig.wifi.start_calls(), 1);

    rig.clock.set(30_000);
    client.maintain();
    assert_eq!(rig.wifi.start_calls(), 2);

    // Hammering maintain() for the rest of the interval issues nothing more.
    while rig.clock.now() < 59_900 {
        rig.clock.advance(100);
        client.maintain();
    }
    assert_eq!(rig.wifi.start_calls(), 2);

    rig.clock.set(60_000);
    client.maintain();
    assert_eq!(rig.wifi.start_calls(), 3);
    assert_eq!(rig.wifi.disconnect_calls(), 2);
}

#[test]
fn lost_link_is_reported_then_recovered() {
    let (mut client, rig) = connected_client();

    rig.wifi.set_ap_available(false);
    client.maintain();
    assert!(!client.is_connected());
    assert_eq!(rig.sink.link_events(), vec![LinkEvent::Lost]);

    rig.wifi.set_ap_available(true);
    rig.clock.advance(30_000);
    client.maintain();
    client.maintain();

    assert!(client.is_connected());
    let events = rig.sink.link_events();
    assert_eq!(events[1], LinkEvent::Reconnecting);
    assert!(matches!(events[2], LinkEvent::Recovered { ip: Some(_) }));
    assert_eq!(events.len(), 3);
}

#[test]
fn connected_requires_live_radio() {
    let (client, rig) = connected_client();
    assert!(client.signal_strength().is_some());
    assert!(client.address().is_some());

    rig.wifi.set_ap_available(false);

    // Cached state has not been refreshed by maintain() yet.
    assert_eq!(client.link_state(), LinkState::Connected);
    assert!(!client.is_connected());
    assert!(client.signal_strength().is_none());
}
