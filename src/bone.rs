//! Simulation bone reconciliation.
//!
//! The simulation bone (usually the animated skeleton root) moves on its own.
//! Each tick it is pulled toward the simulation object and, optionally, kept
//! within a maximum distance of it. The bone is owned elsewhere: the
//! reconciler only reads and writes its position through [`SimulationBone`].

use bevy::prelude::*;

use crate::config::ControllerConfig;
use crate::spring;

/// Position access to an externally owned simulation bone.
///
/// Positions are on the ground plane: `x` = world X, `y` = world Z.
pub trait SimulationBone {
    fn position(&self) -> Vec2;

    fn set_position(&mut self, position: Vec2);
}

/// Bevy transforms act as bones on the XZ plane; their height is untouched.
impl SimulationBone for Transform {
    fn position(&self) -> Vec2 {
        Vec2::new(self.translation.x, self.translation.z)
    }

    fn set_position(&mut self, position: Vec2) {
        self.translation.x = position.x;
        self.translation.z = position.y;
    }
}

/// Links a character entity to the entity carrying its simulation bone.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct SimulationBoneLink(pub Entity);

/// Pulls a [`SimulationBone`] toward the simulation object.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct BoneReconciler {
    pub do_adjustment: bool,
    pub position_adjustment_half_life: f32,
    pub do_clamping: bool,
    pub max_distance: f32,
}

impl Default for BoneReconciler {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}

impl BoneReconciler {
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            do_adjustment: config.do_adjustment,
            position_adjustment_half_life: config.position_adjustment_half_life,
            do_clamping: config.do_clamping,
            max_distance: config.max_distance_simulation_bone_and_object,
        }
    }

    /// Adjust then clamp the bone. Returns the final bone-object distance.
    pub fn reconcile<B: SimulationBone + ?Sized>(
        &self,
        object_position: Vec2,
        bone: &mut B,
        dt: f32,
    ) -> f32 {
        if self.do_adjustment {
            self.adjust(object_position, bone, dt);
        }
        if self.do_clamping {
            self.clamp(object_position, bone);
        }
        bone.position().distance(object_position)
    }

    /// Move the bone toward the object by the damped difference.
    pub fn adjust<B: SimulationBone + ?Sized>(&self, object_position: Vec2, bone: &mut B, dt: f32) {
        let bone_position = bone.position();
        let difference = object_position - bone_position;
        let delta =
            spring::damp_adjustment_implicit(difference, self.position_adjustment_half_life, dt);
        bone.set_position(bone_position + delta);
    }

    /// Snap the bone back to `max_distance` along the object->bone direction.
    pub fn clamp<B: SimulationBone + ?Sized>(&self, object_position: Vec2, bone: &mut B) {
        let offset = bone.position() - object_position;
        let distance = offset.length();
        if distance > self.max_distance {
            bone.set_position(object_position + offset / distance * self.max_distance);
        }
    }
}
