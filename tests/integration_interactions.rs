//! The full boarding loop driven through key presses, plus embedder
//! objects flowing through the event stream.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;

use driftworld::{
    CameraMode, InteractionEvent, InteractiveObject, MemoryRelayHub, ObjectKind, WorldClient,
    WorldConfig,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn board_and_disembark_through_key_presses() {
    init_logs();
    let hub = MemoryRelayHub::new();
    let mut a = WorldClient::new(hub.connect("a", "Ada"), WorldConfig::default());
    a.tick();

    a.spawn_local(Some(Vec3::ZERO));
    let vehicle_id = a.spawn_vehicle(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO).unwrap();
    a.tick();

    // A boarding zone shadows the unpiloted vehicle and the avatar is
    // inside it.
    assert!(a
        .interactions()
        .for_player("a")
        .any(|i| i.object_id == format!("vehicle-enter-{vehicle_id}")));

    a.key_down("e");
    assert_eq!(
        a.store().vehicles.controlled_by("a").unwrap().id,
        vehicle_id
    );
    assert!(!a.store().players.get("a").unwrap().is_spawned);
    assert_eq!(a.camera().mode(), CameraMode::Vehicle);

    // Piloted vehicles are not boardable: the zone is gone next frame.
    a.tick();
    assert!(!a.registry().contains(&format!("vehicle-enter-{vehicle_id}")));

    // Fly off, then disembark: the avatar respawns above the vehicle.
    a.update_controlled_vehicle(Vec3::new(20.0, 5.0, 0.0), Vec3::ZERO);
    a.tick();
    a.key_down("X");

    assert!(a.store().vehicles.controlled_by("a").is_none());
    let player = a.store().players.get("a").unwrap();
    assert!(player.is_spawned);
    assert_eq!(player.position, Vec3::new(20.0, 8.0, 0.0));
    assert_eq!(a.camera().mode(), CameraMode::Player);
}

#[test]
fn boarding_a_taken_vehicle_is_refused() {
    init_logs();
    let hub = MemoryRelayHub::new();
    let mut a = WorldClient::new(hub.connect("a", "Ada"), WorldConfig::default());
    let mut b = WorldClient::new(hub.connect("b", "Brin"), WorldConfig::default());
    a.tick();
    b.tick();

    let vehicle_id = a.spawn_vehicle(Vec3::ZERO, Vec3::ZERO).unwrap();
    hub.deliver_all();
    a.tick();
    b.tick();

    b.enter_vehicle(&vehicle_id).unwrap();
    hub.deliver_all();
    a.tick();

    // a walks up: no boarding zone shadows a piloted vehicle, and even a
    // direct take is refused without despawning anything.
    a.spawn_local(Some(Vec3::new(1.0, 0.0, 0.0)));
    a.tick();
    a.key_down("e");
    assert!(a.enter_vehicle(&vehicle_id).is_err());
    assert!(a.store().vehicles.controlled_by("a").is_none());
    assert!(a.store().players.get("a").unwrap().is_spawned);
}

#[test]
fn spawner_pads_and_collectibles_flow_through_events() {
    init_logs();
    let hub = MemoryRelayHub::new();
    let mut a = WorldClient::new(hub.connect("a", "Ada"), WorldConfig::default());
    a.tick();
    a.spawn_local(Some(Vec3::ZERO));

    let picked = Rc::new(RefCell::new(0));
    let picked_in = picked.clone();
    a.registry_mut().register(
        InteractiveObject::new("shard_1", ObjectKind::Collectible, Vec3::new(0.5, 0.0, 0.0))
            .with_prompt_text("Pick up the shard (E)")
            .on_interact(move |_| *picked_in.borrow_mut() += 1),
    );
    a.registry_mut().register(
        InteractiveObject::new("pad", ObjectKind::VehicleSpawner, Vec3::new(0.0, 0.0, 2.0))
            .with_radius(3.0)
            .with_key("v")
            .with_prompt_text("Spawn a ship (V)"),
    );
    a.tick();
    drop(a.drain_interaction_events());

    a.key_down("e");
    a.key_down("v");

    assert_eq!(*picked.borrow(), 1);
    assert_eq!(a.store().vehicles.len(), 1);

    let events = a.drain_interaction_events();
    let triggered: Vec<&ObjectKind> = events
        .iter()
        .filter_map(|event| match event {
            InteractionEvent::Triggered { kind, .. } => Some(kind),
            _ => None,
        })
        .collect();
    assert!(triggered.contains(&&ObjectKind::Collectible));
    assert!(triggered.contains(&&ObjectKind::VehicleSpawner));
}

#[test]
fn prompts_follow_the_registry_objects() {
    init_logs();
    let hub = MemoryRelayHub::new();
    let mut a = WorldClient::new(hub.connect("a", "Ada"), WorldConfig::default());
    a.tick();
    a.spawn_local(Some(Vec3::ZERO));
    let vehicle_id = a.spawn_vehicle(Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO).unwrap();
    a.tick();

    let interaction = a
        .interactions()
        .for_player("a")
        .find(|i| i.object_id == format!("vehicle-enter-{vehicle_id}"))
        .cloned()
        .unwrap();
    assert_eq!(
        a.registry().render_prompt(&interaction),
        Some("Board the ship (E)".to_string())
    );
}
