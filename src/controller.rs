//! Spring character controller.
//!
//! [`SpringCharacterController`] owns the simulation state and drives one
//! tick per call to [`SpringCharacterController::advance`]:
//!
//! 1. push the raw frame time into the delta-time window and average it,
//! 2. spring the rotation toward the desired rotation and predict rotations,
//! 3. spring the position toward `direction * max_speed` and predict positions,
//! 4. commit the pose unless the character is at rest,
//! 5. notify tick listeners,
//! 6. pull the simulation bone toward the committed position and clamp it.
//!
//! The controller knows nothing about frame loops. The Bevy systems in
//! [`crate::systems`] call `advance` once per rendered frame, but any host
//! can do the same from its own loop.

use bevy::prelude::*;

use crate::bone::{BoneReconciler, SimulationBone};
use crate::config::ControllerConfig;
use crate::delta_time::DeltaTimeWindow;
use crate::error::{ConfigError, ListenerError};
use crate::events::{ListenerId, TickListeners};
use crate::intent::MovementIntent;
use crate::prediction::{PredictionBuffer, TrajectoryPredictor};
use crate::spring;
use crate::state::{CommittedPose, SimulationState};

/// Summary of a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Raw frame time handed to `advance` (negative values clamped to 0).
    pub elapsed: f32,
    /// Smoothed frame time used by the springs.
    pub averaged_dt: f32,
    /// Whether the pose was committed (the character was moving).
    pub committed: bool,
    /// Number of listeners that failed during notification.
    pub listener_failures: usize,
    /// Bone-object distance after reconciliation, if a bone was given.
    pub bone_distance: Option<f32>,
}

/// Predictive spring-damper character controller.
#[derive(Component, Debug)]
pub struct SpringCharacterController {
    config: ControllerConfig,
    predictor: TrajectoryPredictor,
    reconciler: BoneReconciler,
    state: SimulationState,
    pose: CommittedPose,
    predictions: PredictionBuffer,
    delta_times: DeltaTimeWindow,
    intent: MovementIntent,
    listeners: TickListeners,
}

impl SpringCharacterController {
    /// Create a controller at the origin, facing +Z.
    pub fn new(config: ControllerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.number_prediction == 0 {
            warn!("number_prediction is 0, trajectory prediction is disabled");
        }

        let predictor =
            TrajectoryPredictor::new(config.number_prediction, config.prediction_frames);
        let state = SimulationState::default();
        let mut predictions = predictor.buffer();
        predictions.fill(&state);

        Ok(Self {
            config,
            predictor,
            reconciler: BoneReconciler::from_config(&config),
            state,
            pose: CommittedPose::default(),
            predictions,
            delta_times: DeltaTimeWindow::default(),
            intent: MovementIntent::default(),
            listeners: TickListeners::default(),
        })
    }

    /// Builder: start at the given pose.
    pub fn with_pose(mut self, position: Vec2, rotation: Quat) -> Self {
        self.teleport(position, rotation);
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Spring state, including motion that has not been committed.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Externally observable pose of the simulation object.
    pub fn pose(&self) -> &CommittedPose {
        &self.pose
    }

    /// Predictions of the last tick.
    pub fn predictions(&self) -> &PredictionBuffer {
        &self.predictions
    }

    pub fn intent(&self) -> &MovementIntent {
        &self.intent
    }

    /// Smoothed frame time of the last tick.
    pub fn averaged_delta_time(&self) -> f32 {
        self.delta_times.average()
    }

    /// Latch the desired movement direction for the next tick.
    ///
    /// The magnitude is not clamped: a direction longer than 1 moves faster
    /// than `max_speed`, proportionally.
    pub fn set_movement_direction(&mut self, direction: Vec2) {
        self.intent.set_direction(direction);
    }

    pub fn movement_direction(&self) -> Vec2 {
        self.intent.direction()
    }

    /// Register a listener called after every tick with the elapsed seconds.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(f32) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Move instantly to a pose, dropping all motion and frame history.
    ///
    /// Only the yaw of `rotation` is kept, so the character always has a
    /// ground-plane heading.
    pub fn teleport(&mut self, position: Vec2, rotation: Quat) {
        self.state = SimulationState::at_pose(position, rotation);
        self.pose = CommittedPose::new(self.state.position, self.state.rotation);
        self.predictions.fill(&self.state);
        self.delta_times.clear();
    }

    /// Predicted world position of sample `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= config().number_prediction`.
    pub fn world_predicted_position(&self, index: usize) -> Vec2 {
        self.predictions.positions()[index]
    }

    /// Predicted facing direction (unit length) of sample `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= config().number_prediction`.
    pub fn world_predicted_direction(&self, index: usize) -> Vec2 {
        self.predictions.direction(index)
    }

    /// Run one simulation tick of `dt` seconds.
    ///
    /// `bone` is the externally owned simulation bone, if any; only its
    /// position is touched.
    pub fn advance(&mut self, dt: f32, bone: Option<&mut dyn SimulationBone>) -> TickReport {
        let elapsed = spring::sanitize_dt(dt);
        self.delta_times.push(elapsed);
        let averaged_dt = self.delta_times.average();
        let damping_ratio = self.config.damping_ratio();

        // Rotation
        spring::simple_spring_damper_implicit_rotation(
            &mut self.state.rotation,
            &mut self.state.angular_velocity,
            self.state.desired_rotation,
            damping_ratio,
            averaged_dt,
        );
        self.predictor
            .predict_rotations(&self.state, damping_ratio, averaged_dt, &mut self.predictions);

        // Position
        let desired_velocity = self.intent.desired_velocity(self.config.max_speed);
        spring::character_position_update(
            &mut self.state.position,
            &mut self.state.velocity,
            &mut self.state.acceleration,
            desired_velocity,
            damping_ratio,
            averaged_dt,
        );
        self.predictor.predict_positions(
            &self.state,
            desired_velocity,
            damping_ratio,
            averaged_dt,
            &mut self.predictions,
        );

        let committed = !self.state.is_at_rest(self.config.minimum_velocity_clamp);
        if committed {
            self.pose = CommittedPose::new(self.state.position, self.state.rotation);
            if let Some(heading) = self.state.velocity_heading() {
                self.state.desired_rotation = heading;
            }
        }

        let listener_failures = self.listeners.notify(elapsed);

        let bone_distance =
            bone.map(|bone| self.reconciler.reconcile(self.pose.position, bone, elapsed));

        TickReport {
            elapsed,
            averaged_dt,
            committed,
            listener_failures,
            bone_distance,
        }
    }
}
