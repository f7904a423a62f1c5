use serde::{Deserialize, Serialize};

use signal::SignalConfig;

/// Analysis parameters (TOML).
///
/// Example `config/analysis.toml`:
/// ```toml
/// [signal]
/// short_window = 40
/// long_window = 100
/// price_column = "alpha_close"
///
/// [trend]
/// timeframe = "now 1-d"
/// geo = "US"
/// grid_interval_secs = 60
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    pub signal: SignalConfig,
    #[serde(default)]
    pub trend: TrendSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrendSection {
    /// Google Trends timeframe expression.
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default = "default_geo")]
    pub geo: String,
    /// Resampling grid step for the correlator.
    #[serde(default = "default_grid_interval_secs")]
    pub grid_interval_secs: i64,
}

impl Default for TrendSection {
    fn default() -> Self {
        Self {
            timeframe: default_timeframe(),
            geo: default_geo(),
            grid_interval_secs: default_grid_interval_secs(),
        }
    }
}

fn default_timeframe() -> String {
    "now 1-d".to_string()
}

fn default_geo() -> String {
    "US".to_string()
}

fn default_grid_interval_secs() -> i64 {
    60
}

impl AnalysisConfig {
    /// Load from a TOML file. Exits process on error.
    pub fn load(path: &str) -> Self {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read analysis config at '{path}': {e}"));
        let config: AnalysisConfig = toml::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse analysis config at '{path}': {e}"));
        config.validate();
        config
    }

    fn validate(&self) {
        assert!(
            self.signal.short_window >= 1 && self.signal.long_window >= 1,
            "signal windows must be positive"
        );
        assert!(
            self.trend.grid_interval_secs >= 1,
            "trend grid interval must be positive"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: AnalysisConfig = toml::from_str(
            r#"
            [signal]
            short_window = 40
            long_window = 100
            price_column = "alpha_close"

            [trend]
            timeframe = "today 3-m"
            geo = ""
            grid_interval_secs = 3600
            "#,
        )
        .unwrap();

        assert_eq!(config.signal.short_window, 40);
        assert_eq!(config.signal.price_column, "alpha_close");
        assert_eq!(config.trend.timeframe, "today 3-m");
        assert_eq!(config.trend.grid_interval_secs, 3600);
    }

    #[test]
    fn trend_section_and_windows_are_optional() {
        let config: AnalysisConfig = toml::from_str(
            r#"
            [signal]
            price_column = "alpha_close"
            "#,
        )
        .unwrap();

        assert_eq!(config.signal.short_window, 40);
        assert_eq!(config.signal.long_window, 100);
        assert_eq!(config.trend.timeframe, "now 1-d");
        assert_eq!(config.trend.grid_interval_secs, 60);
    }
}
