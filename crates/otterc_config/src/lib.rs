pub mod error;
pub mod inlining;

pub use crate::error::ConfigError;
pub use crate::inlining::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
