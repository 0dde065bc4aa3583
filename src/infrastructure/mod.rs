pub mod backend;
pub mod imaging;
pub mod memory;
pub mod prompt;
