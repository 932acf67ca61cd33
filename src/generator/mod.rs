// Generator client implementations
pub mod generator_trait;
pub mod mock_generator;
pub mod openai_generator;
pub mod output_shape;

pub use generator_trait::*;
pub use mock_generator::*;
pub use openai_generator::*;
pub use output_shape::*;
