//! Utility modules

pub mod env;
pub mod logging;
pub mod timeout;

// Re-export commonly used items
pub use env::{env_bool, env_int, env_opt};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
pub use logging::{init_logging, init_logging_from_config};
pub use timeout::{with_timeout, with_timeout_opt};
