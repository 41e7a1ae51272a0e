pub mod data;
pub mod io;

pub use data::{ChatMode, Config};
pub use io::ConfigError;
