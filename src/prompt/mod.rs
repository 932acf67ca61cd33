// Prompt rendering boundary
pub mod prompt_renderer;

pub use prompt_renderer::*;
