//! Application wiring: configuration, the service facade, and start-up.

pub mod config;
pub mod services;

pub use config::AppConfig;
pub use services::ComboTrack;
