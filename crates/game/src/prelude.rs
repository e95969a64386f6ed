pub use crate::components::*;
pub use crate::controller::*;
pub use crate::systems::*;

pub use vantage_engine::prelude::*;
