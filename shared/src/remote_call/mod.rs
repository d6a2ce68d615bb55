pub mod descriptor;
pub mod error;
pub mod func_id;
pub mod registry;
