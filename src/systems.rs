//! Core controller systems.
//!
//! These systems attach controllers to configured entities and advance them
//! once per frame with the frame time. The spring maths lives in
//! [`SpringCharacterController`]; the systems only move data between the
//! ECS and the controller.

use bevy::prelude::*;

use crate::bone::{SimulationBone, SimulationBoneLink};
use crate::config::ControllerConfig;
use crate::controller::SpringCharacterController;
use crate::intent::MovementIntent;

/// Build a controller for every entity that just received a
/// [`ControllerConfig`].
///
/// The starting pose is read from the entity's `Transform` (XZ position and
/// yaw). Invalid configurations are logged and left without a controller.
pub fn initialize_spring_controllers(
    mut commands: Commands,
    q_new: Query<
        (Entity, &ControllerConfig, &Transform),
        (Added<ControllerConfig>, Without<SpringCharacterController>),
    >,
) {
    for (entity, config, transform) in &q_new {
        let controller = match SpringCharacterController::new(*config) {
            Ok(controller) => controller,
            Err(err) => {
                error!("entity {:?}: invalid ControllerConfig: {}", entity, err);
                continue;
            }
        };

        let controller = controller.with_pose(
            Vec2::new(transform.translation.x, transform.translation.z),
            transform.rotation,
        );

        commands.entity(entity).insert(controller);
    }
}

/// Advance every controller by the frame time.
///
/// A [`MovementIntent`] on the entity replaces the controller's movement
/// direction before the tick. When the pose is committed it is written to the
/// entity's `Transform`, keeping its height. A [`SimulationBoneLink`] target
/// is reconciled through its own `Transform`.
pub fn advance_spring_characters(
    time: Res<Time>,
    mut q_characters: Query<(
        Entity,
        &mut SpringCharacterController,
        &mut Transform,
        Option<&MovementIntent>,
        Option<&SimulationBoneLink>,
    )>,
    mut q_bones: Query<&mut Transform, Without<SpringCharacterController>>,
) {
    let dt = time.delta_secs();

    for (entity, mut controller, mut transform, intent, link) in &mut q_characters {
        if let Some(intent) = intent {
            controller.set_movement_direction(intent.direction());
        }

        let mut bone = link.and_then(|link| match q_bones.get_mut(link.0) {
            Ok(bone) => Some(bone),
            Err(_) => {
                debug!(
                    "entity {:?}: simulation bone {:?} has no Transform, skipping reconciliation",
                    entity, link.0
                );
                None
            }
        });

        let report = controller.advance(
            dt,
            bone.as_deref_mut().map(|bone| bone as &mut dyn SimulationBone),
        );

        if report.committed {
            let pose = *controller.pose();
            transform.translation = pose.world_translation(transform.translation.y);
            transform.rotation = pose.rotation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_app() -> App {
        let mut app = App::new();
        app.init_resource::<Time>();
        app.add_systems(
            Update,
            (initialize_spring_controllers, advance_spring_characters).chain(),
        );
        app
    }

    fn step(app: &mut App) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(1.0 / 60.0));
        app.update();
    }

    #[test]
    fn controller_starts_at_transform_pose() {
        let mut app = test_app();
        let rotation = Quat::from_rotation_y(0.5);
        let entity = app
            .world_mut()
            .spawn((
                ControllerConfig::default(),
                Transform::from_xyz(3.0, 1.0, -2.0).with_rotation(rotation),
            ))
            .id();

        step(&mut app);

        let controller = app
            .world()
            .get::<SpringCharacterController>(entity)
            .expect("controller attached");
        assert_eq!(controller.pose().position, Vec2::new(3.0, -2.0));
        assert!(controller.pose().rotation.dot(rotation).abs() > 1.0 - 1e-6);
    }

    #[test]
    fn invalid_config_gets_no_controller() {
        let mut app = test_app();
        let entity = app
            .world_mut()
            .spawn((
                ControllerConfig::default().with_responsiveness(3.0),
                Transform::default(),
            ))
            .id();

        step(&mut app);

        assert!(app.world().get::<SpringCharacterController>(entity).is_none());
    }

    #[test]
    fn intent_moves_transform_and_keeps_height() {
        let mut app = test_app();
        let mut intent = MovementIntent::new();
        intent.set_direction(Vec2::X);
        let entity = app
            .world_mut()
            .spawn((
                ControllerConfig::default(),
                Transform::from_xyz(0.0, 2.0, 0.0),
                intent,
            ))
            .id();

        for _ in 0..60 {
            step(&mut app);
        }

        let transform = app.world().get::<Transform>(entity).expect("transform");
        assert!(transform.translation.x > 0.1);
        assert_eq!(transform.translation.y, 2.0);
        assert!(transform.translation.z.abs() < 1e-4);
    }

    #[test]
    fn config_without_transform_still_ticks() {
        let mut app = test_app();
        let mut intent = MovementIntent::new();
        intent.set_direction(Vec2::Y);
        let entity = app
            .world_mut()
            .spawn((ControllerConfig::default(), intent))
            .id();

        for _ in 0..30 {
            step(&mut app);
        }

        assert!(app.world().get::<SpringCharacterController>(entity).is_some());
        let transform = app.world().get::<Transform>(entity).expect("required transform");
        assert!(transform.translation.z > 0.0);
    }

    #[test]
    fn missing_bone_entity_is_skipped() {
        let mut app = test_app();
        let bone = app.world_mut().spawn_empty().id();
        let entity = app
            .world_mut()
            .spawn((
                ControllerConfig::default(),
                Transform::default(),
                SimulationBoneLink(bone),
            ))
            .id();

        step(&mut app);
        step(&mut app);

        assert!(app.world().get::<SpringCharacterController>(entity).is_some());
    }
}
