mod color;
mod engine;
mod label;
mod svg;
mod viewport;

pub use engine::{Notice, RenderEngine, Tooltip};
pub use viewport::{Transform, Viewport, MAX_SCALE, MIN_SCALE};
