//! Command implementations.

pub mod config;
pub mod reasons;
pub mod verify;

pub use self::config::execute_config;
pub use self::reasons::execute_reasons;
pub use self::verify::execute_verify;
