pub mod builder;
pub mod context;
pub mod gc;
pub mod optimizer;
pub mod ports;
