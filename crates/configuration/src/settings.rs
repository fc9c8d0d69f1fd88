use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an absent `config.toml` is a valid setup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub journal: JournalSettings,
    pub analytics: AnalyticsSettings,
    pub export: ExportSettings,
    pub chart: ChartSettings,
    pub logging: LoggingSettings,
}

/// Where the trade journal lives on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JournalSettings {
    pub path: PathBuf,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("journal.json"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Extra or replacement point values, keyed by futures symbol (e.g. `CL = 1000`).
    pub point_values: HashMap<String, Decimal>,
}

impl AnalyticsSettings {
    /// Point-value overrides with symbols upper-cased.
    pub fn point_value_overrides(&self) -> impl Iterator<Item = (String, Decimal)> + '_ {
        self.point_values
            .iter()
            .map(|(symbol, value)| (symbol.to_uppercase(), *value))
    }
}

/// Parameters for encrypted exports.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// PBKDF2-HMAC-SHA256 rounds for newly written exports.
    pub kdf_iterations: u32,
    /// Abort an export/import when an image can't be converted, instead of dropping it.
    pub strict_images: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            kdf_iterations: 100_000,
            strict_images: true,
        }
    }
}

/// Size of the rendered equity chart, in SVG user units.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 220,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive, used when `RUST_LOG` is unset.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "tradelog.log".to_string(),
        }
    }
}
