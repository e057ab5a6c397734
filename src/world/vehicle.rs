//! The vehicle table and the exclusive-control protocol layered on it.

use glam::Vec3;
use log::{info, trace, warn};
use thiserror::Error;

/// A pilotable vehicle. Persists while unpiloted; only an explicit
/// `remove` deletes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: String,
    pub position: Vec3,
    /// Euler angles, radians. Vehicles bank and pitch, unlike avatars.
    pub rotation: Vec3,
    /// The exclusive pilot, or None while unpiloted.
    pub controlling_user_id: Option<String>,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, position: Vec3, rotation: Vec3) -> Self {
        Self {
            id: id.into(),
            position,
            rotation,
            controlling_user_id: None,
        }
    }
}

/// Why a control request was refused. Callers treat any of these as a
/// no-op and re-check state rather than assuming the take succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("vehicle {vehicle_id} does not exist")]
    UnknownVehicle { vehicle_id: String },

    #[error("vehicle {vehicle_id} is already piloted by {pilot}")]
    VehicleTaken { vehicle_id: String, pilot: String },

    #[error("user {user_id} already pilots vehicle {vehicle_id}")]
    AlreadyPiloting { user_id: String, vehicle_id: String },

    #[error("user {user_id} pilots no vehicle")]
    NotPiloting { user_id: String },
}

/// In-memory table of vehicles plus the control handoff rules.
///
/// Control is the one shared resource needing mutual exclusion across
/// clients. There is no distributed lock: the relay is last-write-wins, so
/// this table only enforces the local preconditions and relies on the sync
/// layer to converge every client on whichever claim landed last.
#[derive(Default)]
pub struct VehicleTable {
    vehicles: Vec<Vehicle>,
}

impl VehicleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vehicle. A duplicate id is refused, keeping ids unique.
    pub fn add(&mut self, vehicle: Vehicle) -> bool {
        if self.get(&vehicle.id).is_some() {
            warn!("vehicle {} already exists, spawn ignored", vehicle.id);
            return false;
        }
        self.vehicles.push(vehicle);
        true
    }

    pub fn remove(&mut self, vehicle_id: &str) -> Option<Vehicle> {
        let index = self.vehicles.iter().position(|v| v.id == vehicle_id)?;
        Some(self.vehicles.remove(index))
    }

    pub fn set_position(&mut self, vehicle_id: &str, position: Vec3) {
        if let Some(vehicle) = self.get_mut(vehicle_id) {
            vehicle.position = position;
        }
    }

    pub fn set_rotation(&mut self, vehicle_id: &str, rotation: Vec3) {
        if let Some(vehicle) = self.get_mut(vehicle_id) {
            vehicle.rotation = rotation;
        }
    }

    /// Take exclusive control of an unpiloted vehicle.
    ///
    /// Fails without mutating when the vehicle is unknown, already piloted,
    /// or the user already pilots another vehicle. The caller is
    /// responsible for despawning the avatar afterwards; the two steps are
    /// coordinated but not atomic.
    pub fn control(&mut self, vehicle_id: &str, user_id: &str) -> Result<(), ControlError> {
        if let Some(current) = self.controlled_by(user_id) {
            return Err(ControlError::AlreadyPiloting {
                user_id: user_id.to_string(),
                vehicle_id: current.id.clone(),
            });
        }
        let Some(vehicle) = self.get_mut(vehicle_id) else {
            return Err(ControlError::UnknownVehicle {
                vehicle_id: vehicle_id.to_string(),
            });
        };
        if let Some(pilot) = &vehicle.controlling_user_id {
            return Err(ControlError::VehicleTaken {
                vehicle_id: vehicle_id.to_string(),
                pilot: pilot.clone(),
            });
        }
        vehicle.controlling_user_id = Some(user_id.to_string());
        info!("{user_id} took control of vehicle {vehicle_id}");
        Ok(())
    }

    /// Release control unconditionally. Idempotent: releasing an unpiloted
    /// or unknown vehicle does nothing. The caller respawns the avatar.
    pub fn release(&mut self, vehicle_id: &str) {
        let Some(vehicle) = self.get_mut(vehicle_id) else {
            trace!("release for unknown vehicle {vehicle_id}, ignoring");
            return;
        };
        if let Some(pilot) = vehicle.controlling_user_id.take() {
            info!("{pilot} released control of vehicle {vehicle_id}");
        }
    }

    /// Release every vehicle whose pilot left the roster.
    ///
    /// Run on every roster change. This is the only automatic release
    /// path, and it never deletes: a vehicle orphaned by a disconnect
    /// stays in the world, unpiloted. Returns the (vehicle id, former
    /// pilot) pairs that were released.
    pub fn release_orphaned(&mut self, connected_ids: &[String]) -> Vec<(String, String)> {
        let mut released = Vec::new();
        for vehicle in &mut self.vehicles {
            let orphaned = vehicle
                .controlling_user_id
                .as_ref()
                .is_some_and(|pilot| !connected_ids.contains(pilot));
            if orphaned {
                if let Some(pilot) = vehicle.controlling_user_id.take() {
                    info!(
                        "vehicle {} orphaned by disconnect of {pilot}, control released",
                        vehicle.id
                    );
                    released.push((vehicle.id.clone(), pilot));
                }
            }
        }
        released
    }

    /// The vehicle a user currently pilots. O(n) scan; vehicle counts are
    /// tens, not thousands.
    pub fn controlled_by(&self, user_id: &str) -> Option<&Vehicle> {
        self.vehicles
            .iter()
            .find(|v| v.controlling_user_id.as_deref() == Some(user_id))
    }

    pub fn get(&self, vehicle_id: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == vehicle_id)
    }

    pub fn get_mut(&mut self, vehicle_id: &str) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|v| v.id == vehicle_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.iter()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Replace the whole table with a reconciled list from the sync layer.
    pub(crate) fn replace_all(&mut self, vehicles: Vec<Vehicle>) {
        self.vehicles = vehicles;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(ids: &[&str]) -> VehicleTable {
        let mut table = VehicleTable::new();
        for id in ids {
            table.add(Vehicle::new(*id, Vec3::ZERO, Vec3::ZERO));
        }
        table
    }

    #[test]
    fn control_grants_exclusive_ownership() {
        let mut table = table_with(&["ship_1", "ship_2"]);

        table.control("ship_1", "a").unwrap();
        assert_eq!(table.controlled_by("a").unwrap().id, "ship_1");

        // Second taker is refused, state untouched.
        let err = table.control("ship_1", "b").unwrap_err();
        assert_eq!(
            err,
            ControlError::VehicleTaken {
                vehicle_id: "ship_1".into(),
                pilot: "a".into()
            }
        );

        // One vehicle per pilot.
        let err = table.control("ship_2", "a").unwrap_err();
        assert!(matches!(err, ControlError::AlreadyPiloting { .. }));
    }

    #[test]
    fn release_is_idempotent() {
        let mut table = table_with(&["ship_1"]);
        table.control("ship_1", "a").unwrap();

        table.release("ship_1");
        assert!(table.controlled_by("a").is_none());

        table.release("ship_1");
        table.release("no_such_ship");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn orphan_cleanup_releases_but_never_deletes() {
        let mut table = table_with(&["ship_7", "ship_8"]);
        table.control("ship_7", "gone").unwrap();
        table.control("ship_8", "here").unwrap();

        let released = table.release_orphaned(&["here".to_string()]);

        assert_eq!(released, vec![("ship_7".to_string(), "gone".to_string())]);
        assert_eq!(table.len(), 2);
        assert!(table.get("ship_7").unwrap().controlling_user_id.is_none());
        assert_eq!(
            table.get("ship_8").unwrap().controlling_user_id.as_deref(),
            Some("here")
        );
    }

    #[test]
    fn duplicate_spawn_is_refused() {
        let mut table = table_with(&["ship_1"]);
        assert!(!table.add(Vehicle::new("ship_1", Vec3::ONE, Vec3::ZERO)));
        assert_eq!(table.get("ship_1").unwrap().position, Vec3::ZERO);
    }
}
