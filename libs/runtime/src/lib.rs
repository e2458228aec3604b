//! Process-level plumbing shared by the admin console binaries:
//! layered configuration and logging initialisation.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    default_logging_config, AppConfig, AppConfigProvider, CliArgs, LoggingConfig, Section,
    ServerConfig,
};
