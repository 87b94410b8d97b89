//! Trajectory prediction.
//!
//! Each tick the controller forecasts a few future states by running the
//! same springs over longer time steps. Rotation samples all start from the
//! current state with growing horizons, position samples are chained: each
//! one advances from the previous prediction by a fixed step.

use bevy::prelude::*;

use crate::spring;
use crate::state::{forward_direction, SimulationState};

/// Predicted future samples, recomputed every tick.
#[derive(Reflect, Debug, Clone, Default, PartialEq)]
pub struct PredictionBuffer {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    accelerations: Vec<Vec2>,
    rotations: Vec<Quat>,
    angular_velocities: Vec<Vec3>,
}

impl PredictionBuffer {
    /// A buffer of `len` samples, all zero / identity.
    pub fn with_len(len: usize) -> Self {
        Self {
            positions: vec![Vec2::ZERO; len],
            velocities: vec![Vec2::ZERO; len],
            accelerations: vec![Vec2::ZERO; len],
            rotations: vec![Quat::IDENTITY; len],
            angular_velocities: vec![Vec3::ZERO; len],
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities
    }

    pub fn accelerations(&self) -> &[Vec2] {
        &self.accelerations
    }

    pub fn rotations(&self) -> &[Quat] {
        &self.rotations
    }

    pub fn angular_velocities(&self) -> &[Vec3] {
        &self.angular_velocities
    }

    /// Ground-plane facing direction of sample `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn direction(&self, index: usize) -> Vec2 {
        forward_direction(self.rotations[index])
    }

    /// Fill every sample with the given state.
    pub fn fill(&mut self, state: &SimulationState) {
        self.positions.fill(state.position);
        self.velocities.fill(state.velocity);
        self.accelerations.fill(state.acceleration);
        self.rotations.fill(state.rotation);
        self.angular_velocities.fill(state.angular_velocity);
    }
}

/// Produces [`PredictionBuffer`] samples from the current state.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrajectoryPredictor {
    /// Number of samples.
    pub number_prediction: usize,
    /// Frames between chained position samples.
    pub prediction_frames: usize,
}

impl Default for TrajectoryPredictor {
    fn default() -> Self {
        Self {
            number_prediction: 3,
            prediction_frames: 20,
        }
    }
}

impl TrajectoryPredictor {
    pub fn new(number_prediction: usize, prediction_frames: usize) -> Self {
        Self {
            number_prediction,
            prediction_frames,
        }
    }

    /// A buffer sized for this predictor.
    pub fn buffer(&self) -> PredictionBuffer {
        PredictionBuffer::with_len(self.number_prediction)
    }

    /// Horizon in seconds of rotation sample `index`.
    #[inline]
    pub fn rotation_horizon(&self, index: usize, averaged_dt: f32) -> f32 {
        ((index + 1) * self.number_prediction) as f32 * averaged_dt
    }

    /// Step in seconds between chained position samples.
    #[inline]
    pub fn position_step(&self, averaged_dt: f32) -> f32 {
        self.prediction_frames as f32 * averaged_dt
    }

    /// Predict rotations toward `state.desired_rotation`.
    ///
    /// Every sample starts from the current rotation and angular velocity.
    pub fn predict_rotations(
        &self,
        state: &SimulationState,
        damping_ratio: f32,
        averaged_dt: f32,
        buffer: &mut PredictionBuffer,
    ) {
        self.ensure_len(buffer);
        for i in 0..self.number_prediction {
            let mut rotation = state.rotation;
            let mut angular_velocity = state.angular_velocity;
            spring::simple_spring_damper_implicit_rotation(
                &mut rotation,
                &mut angular_velocity,
                state.desired_rotation,
                damping_ratio,
                self.rotation_horizon(i, averaged_dt),
            );
            buffer.rotations[i] = rotation;
            buffer.angular_velocities[i] = angular_velocity;
        }
    }

    /// Predict positions toward `desired_velocity`.
    ///
    /// Sample 0 advances from the current state, sample `i` from sample `i - 1`.
    pub fn predict_positions(
        &self,
        state: &SimulationState,
        desired_velocity: Vec2,
        damping_ratio: f32,
        averaged_dt: f32,
        buffer: &mut PredictionBuffer,
    ) {
        self.ensure_len(buffer);
        let step = self.position_step(averaged_dt);
        let mut position = state.position;
        let mut velocity = state.velocity;
        let mut acceleration = state.acceleration;
        for i in 0..self.number_prediction {
            spring::character_position_update(
                &mut position,
                &mut velocity,
                &mut acceleration,
                desired_velocity,
                damping_ratio,
                step,
            );
            buffer.positions[i] = position;
            buffer.velocities[i] = velocity;
            buffer.accelerations[i] = acceleration;
        }
    }

    fn ensure_len(&self, buffer: &mut PredictionBuffer) {
        if buffer.len() != self.number_prediction {
            *buffer = self.buffer();
        }
    }
}
