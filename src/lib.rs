//! # `spring_character_controller`
//!
//! A predictive spring-damper character controller for ground-plane movement.
//!
//! This crate provides the simulation core of a motion-matching style
//! character:
//! - Springs position and facing toward a desired movement direction using
//!   critically damped implicit springs
//! - Predicts a short future trajectory (positions and facings) every tick
//! - Smooths frame times over a sliding window to absorb frame spikes
//! - Pulls an externally animated simulation bone toward the simulated
//!   object and clamps it within a maximum distance
//! - Notifies tick listeners after every tick
//!
//! ## Architecture
//!
//! [`SpringCharacterController`](controller::SpringCharacterController) is a
//! plain struct driven by an explicit `advance(dt)` call. The optional
//! [`SpringCharacterPlugin`] wires it into Bevy:
//! 1. Entities spawned with a `ControllerConfig` get a controller
//! 2. A [`MovementIntent`](intent::MovementIntent) component feeds input
//! 3. Every `Update`, the controller advances by the frame time
//! 4. The committed pose is written to the entity's `Transform`, and a
//!    linked [`SimulationBoneLink`](bone::SimulationBoneLink) bone is
//!    reconciled
//!
//! Positions live on the ground plane: `Vec2::x` is world X and `Vec2::y`
//! is world Z.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use spring_character_controller::prelude::*;
//!
//! let mut controller = SpringCharacterController::new(ControllerConfig::default())
//!     .expect("default config is valid");
//! controller.set_movement_direction(Vec2::new(0.0, 1.0));
//!
//! for _ in 0..60 {
//!     controller.advance(1.0 / 60.0, None);
//! }
//!
//! assert!(controller.pose().position.y > 0.0);
//! let ahead = controller.world_predicted_position(2);
//! assert!(ahead.y > controller.pose().position.y);
//! ```

use bevy::prelude::*;

pub mod bone;
pub mod config;
pub mod controller;
pub mod delta_time;
pub mod error;
pub mod events;
pub mod intent;
pub mod prediction;
pub mod spring;
pub mod state;
pub mod systems;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::bone::{BoneReconciler, SimulationBone, SimulationBoneLink};
    pub use crate::config::ControllerConfig;
    pub use crate::controller::{SpringCharacterController, TickReport};
    pub use crate::delta_time::DeltaTimeWindow;
    pub use crate::error::{ConfigError, ListenerError};
    pub use crate::events::ListenerId;
    pub use crate::intent::MovementIntent;
    pub use crate::prediction::{PredictionBuffer, TrajectoryPredictor};
    pub use crate::state::{CommittedPose, SimulationState};
    pub use crate::{SpringCharacterPlugin, SpringCharacterSet};
}

/// System set containing the controller systems, for ordering input
/// systems before them.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpringCharacterSet;

/// Plugin running spring character controllers every frame.
///
/// # Examples
///
/// ```rust,no_run
/// use bevy::prelude::*;
/// use spring_character_controller::prelude::*;
///
/// App::new()
///     .add_plugins(MinimalPlugins)
///     .add_plugins(SpringCharacterPlugin)
///     .run();
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct SpringCharacterPlugin;

impl Plugin for SpringCharacterPlugin {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::ControllerConfig>();
        app.register_type::<intent::MovementIntent>();
        app.register_type::<bone::SimulationBoneLink>();
        app.register_type::<state::SimulationState>();
        app.register_type::<state::CommittedPose>();

        // Frame-rate driven: the controller smooths dt itself
        app.add_systems(
            Update,
            (
                systems::initialize_spring_controllers,
                systems::advance_spring_characters,
            )
                .chain()
                .in_set(SpringCharacterSet),
        );
    }
}
