//! End-to-end device cycles: DeviceService driving the client against the
//! board mailboxes.

use smartmeter::adapters::board::{MeterReadings, RelayBank};
use smartmeter::app::ports::HttpMethod;
use smartmeter::app::relay::{RelayId, RelayState};
use smartmeter::app::service::{DeviceService, TickReport};
use smartmeter::app::telemetry::TelemetrySnapshot;
use smartmeter::error::{SyncError, TransportError};

use crate::mock_net::{Rig, TestClient, connected_client, idle_client, test_config};

const SERVER_BOTH_OFF: &str = r#"{"relay1":false,"relay2":false}"#;

struct Device {
    client: TestClient,
    rig: Rig,
    service: DeviceService,
    meter: MeterReadings,
    relays: RelayBank,
}

impl Device {
    fn online() -> Self {
        let (client, rig) = connected_client();
        rig.http.respond_always(200, SERVER_BOTH_OFF);
        Self::assemble(client, rig)
    }

    fn offline() -> Self {
        let (mut client, rig) = idle_client(&test_config());
        rig.wifi.set_ap_available(false);
        let _ = client.begin();
        rig.http.respond_always(200, SERVER_BOTH_OFF);
        Self::assemble(client, rig)
    }

    fn assemble(client: TestClient, rig: Rig) -> Self {
        Self {
            client,
            rig,
            service: DeviceService::new(&test_config()),
            meter: MeterReadings::new(),
            relays: RelayBank::new(RelayState::default()),
        }
    }

    fn relay_pushes(&self) -> Vec<String> {
        self.rig
            .http
            .requests()
            .iter()
            .filter(|r| r.method == HttpMethod::Post && r.url.ends_with("/api/relay/state"))
            .map(|r| r.body_str().to_owned())
            .collect()
    }

    fn tick(&mut self) -> TickReport {
        self.service
            .tick(&mut self.client, &mut self.meter, &mut self.relays)
    }

    fn posts_to(&self, path: &str) -> usize {
        self.rig
            .http
            .requests()
            .iter()
            .filter(|r| r.method == HttpMethod::Post && r.url.ends_with(path))
            .count()
    }
}

#[test]
fn boot_state_is_published_once() {
    let mut dev = Device::online();

    let first = dev.tick();
    assert!(first.connected);
    assert_eq!(first.pushed, Some(Ok(())));
    assert!(!dev.service.initial_push_pending());

    dev.rig.clock.advance(100);
    let second = dev.tick();
    assert_eq!(second.pushed, None);
    assert_eq!(dev.posts_to("/api/relay/state"), 1);
}

#[test]
fn failed_boot_push_is_retried_and_blocks_stale_server_state() {
    let mut dev = Device::online();
    dev.relays = RelayBank::new(RelayState::new(true, false));
    dev.rig.http.fail(TransportError::Timeout);

    // Push times out; the poll answers with the server's stale copy.
    let first = dev.tick();
    assert_eq!(
        first.pushed,
        Some(Err(SyncError::Transport(TransportError::Timeout)))
    );
    assert!(dev.service.initial_push_pending());
    assert_eq!(first.applied, None);
    assert_eq!(dev.relays.state(), RelayState::new(true, false));

    // Retries wait for the next poll slot.
    dev.rig.clock.advance(100);
    assert_eq!(dev.tick().pushed, None);
    assert_eq!(dev.relays.state(), RelayState::new(true, false));

    dev.rig.clock.set(2_000);
    dev.rig
        .http
        .respond_always(200, r#"{"relay1":true,"relay2":false}"#);
    let retry = dev.tick();
    assert_eq!(retry.pushed, Some(Ok(())));
    assert_eq!(retry.applied, None);
    assert!(!dev.service.initial_push_pending());
    assert_eq!(
        dev.relay_pushes(),
        vec![r#"{"relay1":true,"relay2":false}"#; 2]
    );
}

#[test]
fn rejected_boot_push_stays_pending() {
    let mut dev = Device::online();
    dev.rig.http.respond(500, "");

    let first = dev.tick();
    assert_eq!(first.pushed, Some(Err(SyncError::UnexpectedStatus(500))));
    assert!(dev.service.initial_push_pending());

    dev.rig.clock.advance(2_000);
    assert_eq!(dev.tick().pushed, Some(Ok(())));
    assert!(!dev.service.initial_push_pending());
    assert_eq!(dev.relay_pushes().len(), 2);
}

#[test]
fn local_change_is_pushed_once() {
    let mut dev = Device::online();
    dev.tick();

    dev.relays.toggle(RelayId::Relay1);
    dev.rig.clock.advance(100);
    let report = dev.tick();
    assert_eq!(report.pushed, Some(Ok(())));

    let last_push = dev
        .rig
        .http
        .requests()
        .into_iter()
        .filter(|r| r.method == HttpMethod::Post && r.url.ends_with("/api/relay/state"))
        .last()
        .unwrap();
    assert_eq!(last_push.body_str(), r#"{"relay1":true,"relay2":false}"#);

    dev.rig.clock.advance(100);
    assert_eq!(dev.tick().pushed, None);
}

#[test]
fn server_command_is_applied_without_echo() {
    let mut dev = Device::online();
    dev.tick();
    dev.rig
        .http
        .respond_always(200, r#"{"relay1":true,"relay2":false}"#);

    dev.rig.clock.advance(2_000);
    let report = dev.tick();

    assert_eq!(report.applied, Some(RelayState::new(true, false)));
    assert_eq!(dev.relays.state(), RelayState::new(true, false));
    assert_eq!(
        dev.relays.take_remote_update(),
        Some(RelayState::new(true, false))
    );

    let pushes_before = dev.posts_to("/api/relay/state");
    dev.rig.clock.advance(2_000);
    let next = dev.tick();
    assert_eq!(next.pushed, None);
    assert_eq!(next.applied, None, "server and device now agree");
    assert_eq!(dev.posts_to("/api/relay/state"), pushes_before);
}

#[test]
fn telemetry_follows_report_interval() {
    let mut dev = Device::online();

    // Nothing measured yet: no report.
    assert_eq!(dev.tick().telemetry, None);

    dev.meter.record(TelemetrySnapshot {
        voltage: 229.0,
        ..TelemetrySnapshot::default()
    });
    dev.rig.clock.advance(1_000);
    assert_eq!(dev.tick().telemetry, None, "interval not elapsed");

    dev.rig.clock.advance(4_000);
    assert_eq!(dev.tick().telemetry, Some(Ok(200)));

    dev.rig.clock.advance(4_900);
    assert_eq!(dev.tick().telemetry, None);
    dev.rig.clock.advance(100);
    assert_eq!(dev.tick().telemetry, Some(Ok(200)));
    assert_eq!(dev.posts_to("/api/data"), 2);
}

#[test]
fn poll_follows_its_interval() {
    let mut dev = Device::online();
    for _ in 0..20 {
        dev.tick();
        dev.rig.clock.advance(100);
    }
    // Polls at 0 ms and 2000 ms; the clock stopped at 2000.
    let gets = dev
        .rig
        .http
        .requests()
        .iter()
        .filter(|r| r.method == HttpMethod::Get)
        .count();
    assert_eq!(gets, 1);

    dev.tick();
    let gets = dev
        .rig
        .http
        .requests()
        .iter()
        .filter(|r| r.method == HttpMethod::Get)
        .count();
    assert_eq!(gets, 2);
}

#[test]
fn offline_cycles_make_no_requests() {
    let mut dev = Device::offline();
    dev.meter.record(TelemetrySnapshot::default());

    for _ in 0..50 {
        let report = dev.tick();
        assert!(!report.connected);
        dev.rig.clock.advance(100);
    }

    assert_eq!(dev.rig.http.request_count(), 0);
    assert!(dev.service.initial_push_pending());
}

#[test]
fn offline_change_is_dropped_but_boot_state_published_on_connect() {
    let mut dev = Device::offline();

    dev.relays.toggle(RelayId::Relay2);
    let report = dev.tick();
    assert_eq!(report.pushed, Some(Err(SyncError::NotConnected)));
    assert!(dev.service.initial_push_pending());

    // AP returns; the next reconnect slot is 30 s after boot.
    dev.rig.wifi.set_ap_available(true);
    dev.rig.clock.set(30_000);
    dev.tick();
    dev.rig.clock.advance(100);
    let report = dev.tick();

    assert!(report.connected);
    assert_eq!(report.pushed, Some(Ok(())));
    let push = dev
        .rig
        .http
        .requests()
        .into_iter()
        .find(|r| r.method == HttpMethod::Post && r.url.ends_with("/api/relay/state"))
        .unwrap();
    assert_eq!(push.body_str(), r#"{"relay1":false,"relay2":true}"#);
    assert!(!dev.service.initial_push_pending());
}

#[test]
fn tick_counter_advances() {
    let mut dev = Device::online();
    for _ in 0..3 {
        dev.tick();
    }
    assert_eq!(dev.service.tick_count(), 3);
}
