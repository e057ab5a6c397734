//! Tuning knobs for the world client.

/// Runtime parameters shared by the sync bridges and the vehicle
/// interaction wiring.
///
/// Constructed once by the embedder and handed to `WorldClient::new`; no
/// run-time mutation, so the per-frame paths stay branch-free.
pub struct WorldConfig {
    /// Minimum per-component change before a tracked field counts as moved.
    /// Anything below this is jitter-level noise and must not reach the
    /// relay, or every idle client would publish every frame.
    pub change_epsilon: f32,
    /// Radius of the boarding zone registered around an unpiloted vehicle.
    pub vehicle_enter_radius: f32,
    /// Height above the vehicle at which a disembarking avatar respawns.
    pub vehicle_exit_lift: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            change_epsilon: 0.001,
            vehicle_enter_radius: 6.0,
            vehicle_exit_lift: 3.0,
        }
    }
}
