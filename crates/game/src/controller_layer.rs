use crate::prelude::*;

use std::time::Duration;

/// Longest frame the controllers integrate in one step. Longer stalls (window
/// drags, breakpoints) are clipped so characters do not tunnel through the floor.
const MAX_FRAME_TIME: Duration = Duration::from_millis(100);

pub struct ControllerLayer {
    schedule: Schedule,
}

impl ControllerLayer {
    pub fn new(context: &LayerContext) -> Self {
        context.world().init_resource::<StatusReport>();
        Self::default()
    }

    /// Run one frame of character control against `world`
    pub fn step(&mut self, world: &mut World, delta: Duration) {
        world.insert_resource(Time(delta.min(MAX_FRAME_TIME)));
        self.schedule.run(world);
    }
}

impl Default for ControllerLayer {
    fn default() -> Self {
        let mut schedule = Schedule::default();
        schedule.add_systems((update_character_controllers, report_characters).chain());
        Self { schedule }
    }
}

impl Layer for ControllerLayer {
    fn frame(&mut self, context: &LayerContext) -> vantage_engine::Result<()> {
        let mut world = context.world();
        self.step(&mut world, context.delta_time);

        Ok(())
    }

    fn detach(&mut self, _context: &LayerContext) {
        log::debug!("Controller layer detached");
    }
}
