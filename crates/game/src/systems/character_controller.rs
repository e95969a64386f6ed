use crate::prelude::*;

use std::time::Duration;

/// Drives every character one tick: sample, arbitrate, integrate, look.
///
/// The motor gets the planar and the vertical move as two separate requests.
/// A character without a motor is treated as airborne and moved directly.
pub fn update_character_controllers(
    mut characters: Query<
        (&mut CharacterController, &mut Transform, Option<&mut Motor>),
        Without<Camera>,
    >,
    mut cameras: Query<&mut Transform, (With<Camera>, Without<CharacterController>)>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();

    for (mut controller, mut transform, mut motor) in characters.iter_mut() {
        let grounded = motor.as_ref().is_some_and(|motor| motor.0.is_grounded());
        let output = controller.tick(grounded, dt, &transform.rotation);

        match motor.as_mut() {
            Some(motor) => {
                motor.0.move_by(output.motion.planar);
                motor.0.move_by(output.motion.vertical);
                transform.position = motor.0.position();
            }
            None => transform.position += output.motion.total(),
        }

        transform.rotate_yaw(output.look.yaw);

        let camera = controller.camera();
        match cameras.get_mut(camera) {
            Ok(mut camera_transform) => {
                camera_transform.position =
                    transform.position + transform.up() * controller.config().eye_height;
                camera_transform.rotation = transform.rotation * output.camera_rotation;
                controller.set_camera_missing(false);
            }
            Err(_) => {
                if controller.set_camera_missing(true) {
                    log::warn!("Camera {:?} is gone, look is not applied", camera);
                }
            }
        }
    }
}

/// Throttle for [`report_characters`]
#[derive(Resource, Debug)]
pub struct StatusReport {
    pub interval: Duration,
    elapsed: Duration,
    reports: u64,
}

impl StatusReport {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            reports: 0,
        }
    }

    /// Reports written so far
    pub fn reports(&self) -> u64 {
        self.reports
    }

    fn advance(&mut self, delta: Duration) -> bool {
        self.elapsed += delta;
        if self.elapsed < self.interval {
            return false;
        }

        self.elapsed = Duration::ZERO;
        self.reports += 1;
        true
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// Logs every character's state once per [`StatusReport::interval`] of frame time
pub fn report_characters(
    characters: Query<(&Tag, &CharacterController, &Transform)>,
    time: Res<Time>,
    mut report: ResMut<StatusReport>,
) {
    if !report.advance(time.0) {
        return;
    }

    for (tag, controller, transform) in characters.iter() {
        let motion = controller.motion_state();
        log::debug!(
            "{}: position ({:.2}, {:.2}, {:.2}), pitch {:.1}, grounded {}",
            tag.label,
            transform.position.x,
            transform.position.y,
            transform.position.z,
            controller.look_state().pitch_angle,
            motion.is_grounded
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    struct Scene {
        world: World,
        schedule: Schedule,
        character: Entity,
        camera: Entity,
    }

    impl Scene {
        fn new(config: ControllerConfig) -> Self {
            let mut world = World::new();
            world.insert_resource(InputBus::new());
            world.insert_resource(Time(FRAME));

            let camera = world.spawn((Transform::default(), Camera)).id();
            let character = spawn_character(
                &mut world,
                "Player",
                config,
                Transform::default(),
                KinematicMotor::new(Point3::origin(), 0.0),
                camera,
            )
            .unwrap();

            let mut schedule = Schedule::default();
            schedule.add_systems(update_character_controllers);

            Self {
                world,
                schedule,
                character,
                camera,
            }
        }

        fn publish(&self, event: InputEvent) {
            self.world.resource::<InputBus>().publish(&event);
        }

        fn run(&mut self, ticks: usize) {
            for _ in 0..ticks {
                self.schedule.run(&mut self.world);
            }
        }

        fn transform(&self, entity: Entity) -> Transform {
            *self.world.get::<Transform>(entity).unwrap()
        }
    }

    #[test]
    fn test_walks_forward() {
        let mut scene = Scene::new(ControllerConfig::default());
        scene.publish(InputEvent::KeyPressed {
            key: KeyCode::KeyW,
            repeat: false,
        });
        scene.run(60);

        let body = scene.transform(scene.character);
        assert!(body.position.z < -1.0);
        assert!(body.position.x.abs() < 1e-4);
        assert_eq!(body.position.y, 0.0);
    }

    #[test]
    fn test_jump_leaves_ground_and_lands() {
        let mut scene = Scene::new(ControllerConfig::default());
        scene.run(1);
        scene.publish(InputEvent::KeyPressed {
            key: KeyCode::Space,
            repeat: false,
        });

        scene.run(30);
        let airborne = scene.transform(scene.character);
        assert!(airborne.position.y > 1.0);

        scene.run(200);
        let landed = scene.transform(scene.character);
        assert_eq!(landed.position.y, 0.0);
        let controller = scene.world.get::<CharacterController>(scene.character).unwrap();
        assert!(controller.motion_state().is_grounded);
    }

    #[test]
    fn test_camera_follows_body() {
        let config = ControllerConfig::default();
        let eye_height = config.eye_height;
        let mut scene = Scene::new(config);

        scene.publish(InputEvent::GamepadConnected);
        scene.publish(InputEvent::GamepadAxisChanged(GamepadAxis::RightStickX, 1.0));
        scene.publish(InputEvent::GamepadAxisChanged(GamepadAxis::RightStickY, -1.0));
        scene.run(10);

        let body = scene.transform(scene.character);
        let camera = scene.transform(scene.camera);

        // Turned right, looking down, eyes above the body
        assert!(body.forward().x > 0.0);
        assert!(camera.forward().y < 0.0);
        assert!((camera.position - (body.position + Vector3::y() * eye_height)).magnitude() < 1e-5);
    }

    #[test]
    fn test_missing_motor_falls() {
        let mut scene = Scene::new(ControllerConfig::default());
        scene.world.entity_mut(scene.character).remove::<Motor>();

        scene.run(10);
        let body = scene.transform(scene.character);
        assert!(body.position.y < 0.0);

        let controller = scene.world.get::<CharacterController>(scene.character).unwrap();
        assert!(!controller.motion_state().is_grounded);
    }

    #[test]
    fn test_removed_camera_does_not_stop_movement() {
        let mut scene = Scene::new(ControllerConfig::default());
        scene.world.despawn(scene.camera);
        scene.publish(InputEvent::KeyPressed {
            key: KeyCode::KeyD,
            repeat: false,
        });

        scene.run(30);
        assert!(scene.transform(scene.character).position.x > 0.0);

        let controller = scene.world.get::<CharacterController>(scene.character).unwrap();
        assert!(controller.camera_missing());
    }

    #[test]
    fn test_report_runs_once_per_interval() {
        let mut world = World::new();
        world.insert_resource(Time(Duration::from_millis(300)));
        world.init_resource::<StatusReport>();

        let mut schedule = Schedule::default();
        schedule.add_systems(report_characters);

        for _ in 0..3 {
            schedule.run(&mut world);
        }
        assert_eq!(world.resource::<StatusReport>().reports(), 0);

        schedule.run(&mut world);
        assert_eq!(world.resource::<StatusReport>().reports(), 1);

        // The interval restarts after each report
        for _ in 0..3 {
            schedule.run(&mut world);
        }
        assert_eq!(world.resource::<StatusReport>().reports(), 1);
        schedule.run(&mut world);
        assert_eq!(world.resource::<StatusReport>().reports(), 2);
    }
}
