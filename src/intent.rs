//! Movement intent.
//!
//! The intent is the desired movement direction coming from player input or
//! AI. It is latched between ticks and consumed by the controller as a
//! desired velocity.

use bevy::prelude::*;

/// Latched desired movement direction on the ground plane.
///
/// As a component, it is copied into the entity's controller before every
/// tick, so input systems only need to write here.
///
/// The direction is deliberately **not** normalized or clamped: a magnitude
/// above `1.0` asks for a speed above the configured `max_speed`, scaled
/// proportionally. Callers that want a hard speed cap should clamp before
/// calling [`MovementIntent::set_direction`].
///
/// # Example
///
/// ```rust
/// use bevy::math::Vec2;
/// use spring_character_controller::prelude::*;
///
/// let mut intent = MovementIntent::new();
/// intent.set_direction(Vec2::new(0.0, 1.0));
/// assert!(intent.is_moving());
/// assert_eq!(intent.desired_velocity(2.0), Vec2::new(0.0, 2.0));
///
/// intent.clear();
/// assert!(!intent.is_moving());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct MovementIntent {
    /// Desired direction, `x` = world X, `y` = world Z. Expected magnitude <= 1.
    direction: Vec2,
}

impl MovementIntent {
    /// Create an intent with no movement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch a new direction. The last write before a tick wins.
    pub fn set_direction(&mut self, direction: Vec2) {
        // Only non-finite input is rejected, magnitude is left untouched.
        self.direction = if direction.is_finite() {
            direction
        } else {
            Vec2::ZERO
        };
    }

    /// The latched direction.
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Clear the intent.
    pub fn clear(&mut self) {
        self.direction = Vec2::ZERO;
    }

    /// Check if there is active movement input.
    pub fn is_moving(&self) -> bool {
        self.direction.length_squared() > 1e-6
    }

    /// Desired velocity for the given maximum speed.
    #[inline]
    pub fn desired_velocity(&self, max_speed: f32) -> Vec2 {
        self.direction * max_speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_new_is_idle() {
        let intent = MovementIntent::new();
        assert_eq!(intent.direction(), Vec2::ZERO);
        assert!(!intent.is_moving());
    }

    #[test]
    fn last_write_wins() {
        let mut intent = MovementIntent::new();
        intent.set_direction(Vec2::X);
        intent.set_direction(Vec2::new(0.0, -0.5));
        assert_eq!(intent.direction(), Vec2::new(0.0, -0.5));
    }

    #[test]
    fn magnitude_is_not_clamped() {
        let mut intent = MovementIntent::new();
        intent.set_direction(Vec2::new(3.0, 4.0));
        assert_eq!(intent.desired_velocity(2.0), Vec2::new(6.0, 8.0));
    }

    #[test]
    fn non_finite_direction_is_dropped() {
        let mut intent = MovementIntent::new();
        intent.set_direction(Vec2::new(f32::NAN, 1.0));
        assert_eq!(intent.direction(), Vec2::ZERO);
    }

    #[test]
    fn clear_stops_movement() {
        let mut intent = MovementIntent::new();
        intent.set_direction(Vec2::Y);
        intent.clear();
        assert!(!intent.is_moving());
    }
}
