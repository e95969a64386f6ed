mod camera;
mod label;
mod resources;
mod transform;

pub use camera::*;
pub use label::*;
pub use resources::*;
pub use transform::*;
