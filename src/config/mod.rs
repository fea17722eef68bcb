/// Database configuration and connection management
pub mod database;

/// Secrets and process settings read from environment variables
pub mod environment;

/// Tunables loaded from config.toml
pub mod settings;

pub use environment::Environment;
pub use settings::AppConfig;
