use crate::error::ConfigError;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use rust_decimal::Decimal;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    AnalyticsSettings, ChartSettings, Config, ExportSettings, JournalSettings, LoggingSettings,
};

/// Lowest PBKDF2 iteration count an export may be written with.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

/// Loads the application configuration.
///
/// Reads `path` if it exists, then applies `TRADELOG__SECTION__KEY` environment
/// overrides (e.g. `TRADELOG__EXPORT__KDF_ITERATIONS=200000`), and validates the result.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix("TRADELOG")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
    finish(builder)
}

/// Parses configuration from TOML text, without consulting the environment.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    finish(config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Config, ConfigError> {
    let config = builder.build()?.try_deserialize::<Config>()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.export.kdf_iterations < MIN_KDF_ITERATIONS {
        return Err(ConfigError::invalid(
            "export.kdf_iterations",
            format!("must be at least {MIN_KDF_ITERATIONS}"),
        ));
    }
    if config.chart.width == 0 || config.chart.height == 0 {
        return Err(ConfigError::invalid("chart", "width and height must be greater than 0"));
    }
    if let Some((symbol, _)) = config
        .analytics
        .point_values
        .iter()
        .find(|(_, value)| **value <= Decimal::ZERO)
    {
        return Err(ConfigError::invalid(
            format!("analytics.point_values.{symbol}"),
            "must be greater than 0",
        ));
    }
    Ok(())
}
