//! Simulation state.
//!
//! [`SimulationState`] is the spring state advanced every tick. The
//! [`CommittedPose`] is what the outside world observes: it only follows the
//! simulation while the character is actually moving.
//!
//! Positions live on the ground plane: a 2D `(x, y)` maps to world
//! `(x, 0, y)`. Headings are rotations about +Y, forward being +Z.

use bevy::prelude::*;

/// Heading rotation facing along a ground-plane direction.
///
/// Zero-length directions face forward (+Z).
pub fn heading_rotation(direction: Vec2) -> Quat {
    if direction.length_squared() <= f32::EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(direction.x.atan2(direction.y))
}

/// Ground-plane forward direction of a rotation, always unit length.
///
/// A rotation looking straight up or down has no ground-plane heading and
/// faces forward (+Z).
pub fn forward_direction(rotation: Quat) -> Vec2 {
    let forward = rotation * Vec3::Z;
    let ground = Vec2::new(forward.x, forward.z);
    if ground.length_squared() <= 1e-8 {
        return Vec2::Y;
    }
    ground.normalize()
}

/// Yaw-only part of a rotation (rotation about +Y).
///
/// Pitch and roll are dropped, so the result always has a ground-plane
/// heading.
pub fn yaw_rotation(rotation: Quat) -> Quat {
    let (yaw, _, _) = crate::spring::renormalize(rotation).to_euler(EulerRot::YXZ);
    if yaw.is_finite() {
        Quat::from_rotation_y(yaw)
    } else {
        Quat::IDENTITY
    }
}

/// Spring state of the simulated character.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Current rotation, always unit length.
    pub rotation: Quat,
    /// Angular velocity in radians per second (scaled axis).
    pub angular_velocity: Vec3,
    /// Rotation the spring is pulling toward, always unit length.
    pub desired_rotation: Quat,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::at_pose(Vec2::ZERO, Quat::IDENTITY)
    }
}

impl SimulationState {
    /// A resting state at the given pose, already facing its desired rotation.
    ///
    /// Only the yaw of `rotation` is kept.
    pub fn at_pose(position: Vec2, rotation: Quat) -> Self {
        let rotation = yaw_rotation(rotation);
        Self {
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            rotation,
            angular_velocity: Vec3::ZERO,
            desired_rotation: rotation,
        }
    }

    /// Whether the velocity is under the given deadzone (inclusive).
    #[inline]
    pub fn is_at_rest(&self, minimum_velocity: f32) -> bool {
        self.velocity.length_squared() <= minimum_velocity * minimum_velocity
    }

    /// Heading of the current velocity, if the character is moving at all.
    pub fn velocity_heading(&self) -> Option<Quat> {
        let direction = self.velocity.try_normalize()?;
        Some(heading_rotation(direction))
    }

    /// Ground-plane forward direction of the current rotation.
    pub fn forward(&self) -> Vec2 {
        forward_direction(self.rotation)
    }
}

/// Externally observable transform of the simulation object.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct CommittedPose {
    pub position: Vec2,
    pub rotation: Quat,
}

impl Default for CommittedPose {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl CommittedPose {
    pub fn new(position: Vec2, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Ground-plane forward direction.
    pub fn forward(&self) -> Vec2 {
        forward_direction(self.rotation)
    }

    /// Position in world space, keeping the given height.
    pub fn world_translation(&self, height: f32) -> Vec3 {
        Vec3::new(self.position.x, height, self.position.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn heading_matches_forward() {
        for direction in [Vec2::X, Vec2::Y, Vec2::NEG_X, Vec2::new(1.0, -1.0).normalize()] {
            let rotation = heading_rotation(direction);
            assert!((forward_direction(rotation) - direction).length() < 1e-5);
        }
    }

    #[test]
    fn heading_of_x_is_quarter_turn() {
        let rotation = heading_rotation(Vec2::X);
        assert!((rotation - Quat::from_rotation_y(FRAC_PI_2)).length() < 1e-6);
    }

    #[test]
    fn zero_direction_faces_forward() {
        assert_eq!(heading_rotation(Vec2::ZERO), Quat::IDENTITY);
    }

    #[test]
    fn default_state_is_at_rest() {
        let state = SimulationState::default();
        assert!(state.is_at_rest(0.0));
        assert_eq!(state.velocity_heading(), None);
        assert_eq!(state.forward(), Vec2::Y);
    }

    #[test]
    fn rest_threshold_is_inclusive() {
        let mut state = SimulationState::default();
        state.velocity = Vec2::new(0.01, 0.0);
        assert!(state.is_at_rest(0.01));
        state.velocity = Vec2::new(0.02, 0.0);
        assert!(!state.is_at_rest(0.01));
    }

    #[test]
    fn velocity_heading_follows_velocity() {
        let mut state = SimulationState::default();
        state.velocity = Vec2::new(0.0, -3.0);
        let heading = state.velocity_heading().unwrap();
        assert!((forward_direction(heading) - Vec2::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn vertical_rotation_still_has_a_heading() {
        let looking_up = Quat::from_rotation_x(-FRAC_PI_2);
        assert_eq!(forward_direction(looking_up), Vec2::Y);
        let looking_down = Quat::from_rotation_y(FRAC_PI_2) * Quat::from_rotation_x(FRAC_PI_2);
        assert!((forward_direction(looking_down).length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn at_pose_keeps_only_yaw() {
        let pitched = Quat::from_rotation_y(0.7) * Quat::from_rotation_x(0.4);
        let state = SimulationState::at_pose(Vec2::ZERO, pitched);
        assert!(state.rotation.dot(Quat::from_rotation_y(0.7)).abs() > 1.0 - 1e-6);
        assert_eq!(state.desired_rotation, state.rotation);

        let vertical = SimulationState::at_pose(Vec2::ZERO, Quat::from_rotation_x(FRAC_PI_2));
        assert!((vertical.forward().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn pose_world_translation_uses_xz_plane() {
        let pose = CommittedPose::new(Vec2::new(1.0, 2.0), Quat::IDENTITY);
        assert_eq!(pose.world_translation(5.0), Vec3::new(1.0, 5.0, 2.0));
    }
}
