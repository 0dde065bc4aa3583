pub mod authorization;
pub mod entities;
pub mod errors;
pub mod reference_table;
pub mod value_objects;
