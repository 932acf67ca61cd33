// Virtual table protocol components
pub mod cursor;
pub mod module;
pub mod table;
pub mod vtab_trait;

pub use cursor::*;
pub use module::*;
pub use table::*;
pub use vtab_trait::*;
