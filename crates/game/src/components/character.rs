use crate::prelude::*;

/// Spawn a first-person character whose camera lives on `camera`.
///
/// The camera entity must already carry a `Camera` and a `Transform`;
/// anything else is a wiring mistake and fails here rather than at runtime.
pub fn spawn_character(
    world: &mut World,
    label: impl Into<String>,
    config: ControllerConfig,
    transform: Transform,
    motor: impl CharacterMotor + 'static,
    camera: Entity,
) -> Result<Entity, ControllerError> {
    check_attachment::<Camera>(world, camera, "Camera")?;
    check_attachment::<Transform>(world, camera, "Transform")?;

    let controller = {
        let bus = world.get_resource_or_insert_with(InputBus::new);
        CharacterController::new(config, &bus, camera)?
    };

    let label = label.into();
    log::info!("Spawning character '{}' with camera {:?}", label, camera);

    let entity = world
        .spawn((Tag { label }, transform, Motor::new(motor), controller))
        .id();
    Ok(entity)
}

fn check_attachment<T: Component>(
    world: &World,
    camera: Entity,
    component: &'static str,
) -> Result<(), ControllerError> {
    if world.get::<T>(camera).is_some() {
        return Ok(());
    }

    let error = ControllerError::MissingAttachment {
        entity: camera,
        component,
    };
    log::error!("{}", error);
    Err(error)
}
