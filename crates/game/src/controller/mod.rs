//! First-person character control.
//!
//! Per tick: [`InputSampler`] → [`DeviceArbiter`] → [`MotionIntegrator`] and
//! [`LookController`]. [`CharacterController`] bundles one full set for a
//! single character.

mod arbiter;
mod config;
mod error;
mod look;
mod motion;
mod sampler;

pub use arbiter::*;
pub use config::*;
pub use error::*;
pub use look::*;
pub use motion::*;
pub use sampler::*;

use crate::prelude::*;

/// Everything one tick produced for the character and its camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerOutput {
    pub source: DeviceSource,
    pub motion: MotionStep,
    pub look: LookDelta,
    /// Camera rotation relative to the body
    pub camera_rotation: UnitQuaternion<f32>,
}

/// Controller state for one character, plus the entity its camera lives on
#[derive(Component, Debug)]
pub struct CharacterController {
    config: ControllerConfig,
    sampler: InputSampler,
    arbiter: DeviceArbiter,
    motion: MotionIntegrator,
    look: LookController,
    camera: Entity,
    /// Source chosen on the previous tick
    source: DeviceSource,
    camera_missing: bool,
}

impl CharacterController {
    /// Subscribes to `bus` for as long as the controller lives
    pub fn new(
        config: ControllerConfig,
        bus: &InputBus,
        camera: Entity,
    ) -> Result<Self, ControllerError> {
        config.validate()?;

        Ok(Self {
            config,
            sampler: InputSampler::new(bus),
            arbiter: DeviceArbiter,
            motion: MotionIntegrator::new(),
            look: LookController::new(),
            camera,
            source: DeviceSource::default(),
            camera_missing: false,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn camera(&self) -> Entity {
        self.camera
    }

    /// Device that drove the most recent tick
    pub fn source(&self) -> DeviceSource {
        self.source
    }

    pub fn camera_missing(&self) -> bool {
        self.camera_missing
    }

    /// Record whether the camera entity could be found this tick.
    /// Returns true only on the tick it goes missing.
    pub fn set_camera_missing(&mut self, missing: bool) -> bool {
        let newly_missing = missing && !self.camera_missing;
        self.camera_missing = missing;
        newly_missing
    }

    pub fn motion_state(&self) -> &MotionState {
        self.motion.state()
    }

    pub fn look_state(&self) -> &LookState {
        self.look.state()
    }

    pub fn sampler(&self) -> &InputSampler {
        &self.sampler
    }

    /// Advance one tick. Movement uses the facing from before this tick's yaw.
    pub fn tick(&mut self, grounded: bool, dt: f32, facing: &UnitQuaternion<f32>) -> ControllerOutput {
        let raw = self.sampler.sample();
        let source = self.arbiter.decide(&raw, self.config.deadzone);
        if source != self.source {
            log::debug!("Input source switched from {:?} to {:?}", self.source, source);
            self.source = source;
        }

        let motion = self
            .motion
            .integrate(&self.config, source, &raw, grounded, dt, facing);
        let look = self.look.look(&self.config, source, &raw, dt);

        ControllerOutput {
            source,
            motion,
            look,
            camera_rotation: self.look.camera_rotation(),
        }
    }
}
