pub mod cache;
pub mod cli;
pub mod generator;
pub mod prompt;
pub mod utils;
pub mod vtab;

pub use cache::*;
pub use cli::*;
pub use generator::*;
pub use prompt::*;
pub use utils::*;
pub use vtab::*;
