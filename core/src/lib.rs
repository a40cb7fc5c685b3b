//! Configuration and wiring shared by estate front-ends.
//!
//! Resolves the estate home, loads `config.toml` with command-line
//! overrides, and builds an access-layer [`Connection`] whose session and
//! refresh cookie survive between processes.

pub mod config;
mod config_loader;
mod config_override;
mod connection;

pub use config::Config;
pub use config::ConfigError;
pub use config::find_estate_home;
pub use config_override::CliConfigOverrides;
pub use connection::Connection;
