// Schema and data caching
pub mod data_cache;
pub mod flight;
pub mod schema_cache;

pub use data_cache::*;
pub use flight::*;
pub use schema_cache::*;
