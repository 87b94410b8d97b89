//! Controller configuration.
//!
//! This module defines the tuning parameters of a spring character
//! controller: prediction layout, movement springs, the at-rest deadzone and
//! the simulation bone reconciliation.

use bevy::prelude::*;

use crate::error::ConfigError;

/// Configuration parameters for the spring character controller.
///
/// Set at construction and treated as constant afterwards. Spawning an entity
/// with this component lets the plugin build a
/// [`SpringCharacterController`](crate::controller::SpringCharacterController)
/// from it. A `Transform` is required and inserted with its default if
/// missing.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[require(Transform)]
pub struct ControllerConfig {
    // === Prediction ===
    /// Number of predicted trajectory samples.
    ///
    /// Zero is accepted and disables prediction entirely.
    pub number_prediction: usize,

    /// Frames between two chained position predictions.
    pub prediction_frames: usize,

    // === Movement ===
    /// Speed reached with a movement direction of length 1 (units/second).
    pub max_speed: f32,

    /// How quickly the springs react, in `[0, 1]`.
    /// The springs use `1 - responsiveness` as damping ratio.
    pub responsiveness: f32,

    /// Velocities at or below this magnitude count as standing still: the
    /// pose is not committed and the heading is not updated.
    pub minimum_velocity_clamp: f32,

    // === Simulation Bone ===
    /// Pull the simulation bone toward the simulation object every tick.
    pub do_adjustment: bool,

    /// Time (seconds) for the bone to cover half of its distance to the object.
    pub position_adjustment_half_life: f32,

    /// Keep the bone within `max_distance_simulation_bone_and_object`.
    pub do_clamping: bool,

    /// Largest allowed distance between the bone and the object.
    pub max_distance_simulation_bone_and_object: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Prediction
            number_prediction: 3,
            prediction_frames: 20,

            // Movement
            max_speed: 1.0,
            responsiveness: 0.75,
            minimum_velocity_clamp: 0.01,

            // Simulation bone
            do_adjustment: true,
            position_adjustment_half_life: 0.1,
            do_clamping: true,
            max_distance_simulation_bone_and_object: 0.1,
        }
    }
}

impl ControllerConfig {
    /// Damping ratio used by every spring.
    #[inline]
    pub fn damping_ratio(&self) -> f32 {
        1.0 - self.responsiveness
    }

    /// Check the configuration, reporting the first invalid parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let floats = [
            ("max_speed", self.max_speed),
            ("responsiveness", self.responsiveness),
            ("minimum_velocity_clamp", self.minimum_velocity_clamp),
            (
                "position_adjustment_half_life",
                self.position_adjustment_half_life,
            ),
            (
                "max_distance_simulation_bone_and_object",
                self.max_distance_simulation_bone_and_object,
            ),
        ];
        for (field, value) in floats {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }

        if !(0.0..=1.0).contains(&self.responsiveness) {
            return Err(ConfigError::ResponsivenessOutOfRange(self.responsiveness));
        }

        for (field, value) in floats {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.prediction_frames == 0 {
            return Err(ConfigError::ZeroPredictionFrames);
        }

        Ok(())
    }

    /// Create a config that turns and accelerates quickly.
    pub fn responsive() -> Self {
        Self {
            responsiveness: 0.9,
            position_adjustment_half_life: 0.05,
            ..default()
        }
    }

    /// Create a config with slow, heavy movement.
    pub fn smooth() -> Self {
        Self {
            responsiveness: 0.5,
            position_adjustment_half_life: 0.2,
            max_distance_simulation_bone_and_object: 0.2,
            ..default()
        }
    }

    /// Builder: set the prediction layout.
    pub fn with_predictions(mut self, number_prediction: usize, prediction_frames: usize) -> Self {
        self.number_prediction = number_prediction;
        self.prediction_frames = prediction_frames;
        self
    }

    /// Builder: set max speed.
    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Builder: set responsiveness.
    pub fn with_responsiveness(mut self, responsiveness: f32) -> Self {
        self.responsiveness = responsiveness;
        self
    }

    /// Builder: set the at-rest velocity deadzone.
    pub fn with_minimum_velocity_clamp(mut self, minimum: f32) -> Self {
        self.minimum_velocity_clamp = minimum;
        self
    }

    /// Builder: enable bone adjustment with the given half-life,
    /// or disable it with `None`.
    pub fn with_adjustment(mut self, half_life: Option<f32>) -> Self {
        self.do_adjustment = half_life.is_some();
        if let Some(half_life) = half_life {
            self.position_adjustment_half_life = half_life;
        }
        self
    }

    /// Builder: enable bone clamping with the given maximum distance,
    /// or disable it with `None`.
    pub fn with_clamping(mut self, max_distance: Option<f32>) -> Self {
        self.do_clamping = max_distance.is_some();
        if let Some(max_distance) = max_distance {
            self.max_distance_simulation_bone_and_object = max_distance;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ControllerConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.number_prediction, 3);
        assert!((config.damping_ratio() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn presets_are_valid() {
        assert_eq!(ControllerConfig::responsive().validate(), Ok(()));
        assert_eq!(ControllerConfig::smooth().validate(), Ok(()));
        let responsive = ControllerConfig::responsive();
        assert!(responsive.responsiveness > ControllerConfig::smooth().responsiveness);
    }

    #[test]
    fn responsiveness_out_of_range_is_rejected() {
        let config = ControllerConfig::default().with_responsiveness(1.2);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ResponsivenessOutOfRange(1.2))
        );
        let config = ControllerConfig::default().with_responsiveness(-0.1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_half_life_is_rejected() {
        let config = ControllerConfig::default().with_adjustment(Some(-0.5));
        assert_eq!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "position_adjustment_half_life",
                value: -0.5
            })
        );
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let config = ControllerConfig::default().with_max_speed(f32::INFINITY);
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotFinite { field: "max_speed" })
        );
    }

    #[test]
    fn zero_prediction_frames_is_rejected() {
        let config = ControllerConfig::default().with_predictions(3, 0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroPredictionFrames));
    }

    #[test]
    fn zero_predictions_is_accepted() {
        let config = ControllerConfig::default().with_predictions(0, 20);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn adjustment_and_clamping_builders() {
        let config = ControllerConfig::default()
            .with_adjustment(None)
            .with_clamping(Some(0.3));
        assert!(!config.do_adjustment);
        assert!(config.do_clamping);
        assert_eq!(config.max_distance_simulation_bone_and_object, 0.3);
    }
}
