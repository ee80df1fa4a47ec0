pub mod config;
pub mod error;
pub mod types;

pub use config::{FleetConfig, Policy, StopStrategy};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
