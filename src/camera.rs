//! Camera coordination state.
//!
//! A mode flag plus the desired camera targets. Render code owns the
//! actual camera and interpolates toward the targets however it likes;
//! nothing here knows about projection or smoothing.

use glam::Vec3;
use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Third-person follow of the local avatar.
    Player,
    /// Chase view of the piloted vehicle.
    Vehicle,
    /// Orbit around a fixed point.
    Orbit,
    /// Unanchored fly camera.
    Free,
    /// Watching another player's viewpoint.
    Spectator,
}

pub struct CameraState {
    mode: CameraMode,
    previous_mode: Option<CameraMode>,
    transitioning: bool,
    target_position: Vec3,
    target_look_at: Vec3,
}

const DEFAULT_POSITION: Vec3 = Vec3::new(0.0, 5.0, -10.0);

impl CameraState {
    pub fn new() -> Self {
        Self {
            mode: CameraMode::Player,
            previous_mode: None,
            transitioning: false,
            target_position: DEFAULT_POSITION,
            target_look_at: Vec3::ZERO,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn previous_mode(&self) -> Option<CameraMode> {
        self.previous_mode
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn targets(&self) -> (Vec3, Vec3) {
        (self.target_position, self.target_look_at)
    }

    /// Switch perspective. A no-op when the mode is unchanged, so render
    /// code can call this every frame without restarting transitions.
    pub fn set_mode(&mut self, mode: CameraMode) {
        if self.mode == mode {
            return;
        }
        info!("camera switching from {:?} to {:?}", self.mode, mode);
        self.previous_mode = Some(self.mode);
        self.mode = mode;
        self.transitioning = true;
    }

    pub fn set_transitioning(&mut self, transitioning: bool) {
        self.transitioning = transitioning;
    }

    pub fn set_targets(&mut self, position: Vec3, look_at: Vec3) {
        self.target_position = position;
        self.target_look_at = look_at;
    }

    /// Recover from a stuck transition, e.g. after the camera-owning
    /// entity disappeared mid-switch. Restores default targets and flags
    /// a fresh transition for the renderer to pick up.
    pub fn force_reset(&mut self) {
        info!("camera force reset");
        self.transitioning = true;
        self.target_position = DEFAULT_POSITION;
        self.target_look_at = Vec3::ZERO;
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_mode_records_previous_and_flags_transition() {
        let mut camera = CameraState::new();
        assert_eq!(camera.mode(), CameraMode::Player);
        assert!(camera.previous_mode().is_none());

        camera.set_mode(CameraMode::Vehicle);
        assert_eq!(camera.mode(), CameraMode::Vehicle);
        assert_eq!(camera.previous_mode(), Some(CameraMode::Player));
        assert!(camera.is_transitioning());

        // Same mode again: nothing moves.
        camera.set_transitioning(false);
        camera.set_mode(CameraMode::Vehicle);
        assert!(!camera.is_transitioning());
        assert_eq!(camera.previous_mode(), Some(CameraMode::Player));
    }

    #[test]
    fn force_reset_restores_default_targets() {
        let mut camera = CameraState::new();
        camera.set_targets(Vec3::splat(40.0), Vec3::splat(41.0));
        camera.set_transitioning(false);

        camera.force_reset();

        assert!(camera.is_transitioning());
        assert_eq!(camera.targets(), (Vec3::new(0.0, 5.0, -10.0), Vec3::ZERO));
    }
}
