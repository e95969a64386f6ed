use anyhow::Context;
use std::path::Path;
use vantage::ControllerLayer;
use vantage::prelude::*;
use vantage_engine::{ApplicationBuilder, Result, layers::GamepadLayer};
use winit::event_loop::EventLoop;

const CONFIG_PATH: &str = "vantage.toml";

fn load_config() -> Result<ControllerConfig> {
    let path = Path::new(CONFIG_PATH);
    if !path.exists() {
        log::info!("No {} found, using default controller config", CONFIG_PATH);
        return Ok(ControllerConfig::default());
    }

    let config = ControllerConfig::load(path)
        .with_context(|| format!("Unable to load {}", path.display()))?;
    log::info!("Loaded controller config from {}", path.display());
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_module("vantage", log::LevelFilter::Debug)
        .filter_module("vantage_engine", log::LevelFilter::Debug)
        .init();

    let config = load_config()?;
    let event_loop = EventLoop::new()?;

    let mut app = ApplicationBuilder::new()
        .title("vantage")
        .add_layer(|context| Box::new(GamepadLayer::new(context)))
        .add_layer(|context| Box::new(ControllerLayer::new(context)))
        .build();

    let camera = app.spawn(
        "Camera",
        (
            Transform::from_position(Point3::new(0.0, config.eye_height, 0.0)),
            Camera,
        ),
    );

    app.with_world(|world| {
        spawn_character(
            world,
            "Player",
            config,
            Transform::default(),
            KinematicMotor::new(Point3::origin(), 0.0),
            camera,
        )
    })?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
