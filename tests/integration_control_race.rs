//! Vehicle control under conflict: simultaneous takes settle on the
//! last write, and a pilot's disconnect releases the vehicle without
//! deleting it.

use glam::Vec3;

use driftworld::{MemoryRelayHub, WorldClient, WorldConfig, VEHICLES_KEY};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn two_clients(hub: &MemoryRelayHub) -> (WorldClient<driftworld::MemoryRelay>, WorldClient<driftworld::MemoryRelay>) {
    let mut a = WorldClient::new(hub.connect("a", "Ada"), WorldConfig::default());
    let mut b = WorldClient::new(hub.connect("b", "Brin"), WorldConfig::default());
    a.tick();
    b.tick();
    (a, b)
}

#[test]
fn simultaneous_takes_settle_on_the_last_writer() {
    init_logs();
    let hub = MemoryRelayHub::new();
    let (mut a, mut b) = two_clients(&hub);

    let vehicle_id = a.spawn_vehicle(Vec3::ZERO, Vec3::ZERO).unwrap();
    hub.deliver_all();
    a.tick();
    b.tick();
    assert!(b.store().vehicles.get(&vehicle_id).is_some());

    // Both clients observe an unpiloted vehicle and take it before
    // either write propagates. b's write reaches the relay last.
    a.enter_vehicle(&vehicle_id).unwrap();
    b.enter_vehicle(&vehicle_id).unwrap();
    assert_eq!(
        a.store().vehicles.get(&vehicle_id).unwrap().controlling_user_id.as_deref(),
        Some("a")
    );

    hub.deliver_all();
    a.tick();
    b.tick();

    // Exactly one pilot once propagation settles, on both clients; the
    // loser was corrected by the inbound path, not left diverged.
    for client in [&a, &b] {
        let vehicle = client.store().vehicles.get(&vehicle_id).unwrap();
        assert_eq!(vehicle.controlling_user_id.as_deref(), Some("b"));
    }
    assert!(a.store().vehicles.controlled_by("a").is_none());
    assert_eq!(
        b.store().vehicles.controlled_by("b").unwrap().id,
        vehicle_id
    );

    // The settled state is stable: more frames, no more writes.
    let writes = hub.write_count(VEHICLES_KEY);
    for _ in 0..5 {
        a.tick();
        b.tick();
        hub.deliver_all();
    }
    assert_eq!(hub.write_count(VEHICLES_KEY), writes);
}

#[test]
fn pilot_disconnect_releases_but_keeps_the_vehicle() {
    init_logs();
    let hub = MemoryRelayHub::new();
    let (mut a, mut b) = two_clients(&hub);

    let vehicle_id = a.spawn_vehicle(Vec3::new(7.0, 0.0, 7.0), Vec3::ZERO).unwrap();
    hub.deliver_all();
    a.tick();
    b.tick();

    b.enter_vehicle(&vehicle_id).unwrap();
    hub.deliver_all();
    a.tick();
    b.tick();
    assert_eq!(
        a.store().vehicles.get(&vehicle_id).unwrap().controlling_user_id.as_deref(),
        Some("b")
    );

    // b vanishes mid-flight. The next roster pass on a releases control
    // reactively; the vehicle itself stays where it was.
    hub.disconnect("b");
    a.tick();

    let vehicle = a.store().vehicles.get(&vehicle_id).unwrap();
    assert!(vehicle.controlling_user_id.is_none());
    assert_eq!(vehicle.position, Vec3::new(7.0, 0.0, 7.0));

    // And the release was published for any remaining peers.
    hub.deliver_all();
    a.tick();
    assert!(a
        .store()
        .vehicles
        .get(&vehicle_id)
        .unwrap()
        .controlling_user_id
        .is_none());
}

#[test]
fn piloted_vehicle_movement_reaches_the_peer() {
    init_logs();
    let hub = MemoryRelayHub::new();
    let (mut a, mut b) = two_clients(&hub);

    let vehicle_id = a.spawn_vehicle(Vec3::ZERO, Vec3::ZERO).unwrap();
    hub.deliver_all();
    a.tick();
    b.tick();

    a.enter_vehicle(&vehicle_id).unwrap();
    a.update_controlled_vehicle(Vec3::new(0.0, 10.0, 40.0), Vec3::new(0.1, 0.2, 0.0));
    a.tick();
    hub.deliver_all();
    b.tick();

    let vehicle = b.store().vehicles.get(&vehicle_id).unwrap();
    assert_eq!(vehicle.position, Vec3::new(0.0, 10.0, 40.0));
    assert_eq!(vehicle.rotation, Vec3::new(0.1, 0.2, 0.0));
    assert_eq!(vehicle.controlling_user_id.as_deref(), Some("a"));
}
