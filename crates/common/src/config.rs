/// Credentials and paths loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
///
/// Analysis parameters (windows, keyword, grid interval) live in the TOML
/// file at `analysis_config_path`, not in the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub alpha_vantage_api_key: String,
    pub iex_cloud_api_key: String,
    pub analysis_config_path: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            alpha_vantage_api_key: required_env("ALPHA_VANTAGE_API_KEY"),
            iex_cloud_api_key: required_env("IEX_CLOUD_API_KEY"),
            analysis_config_path: optional_env("ANALYSIS_CONFIG_PATH")
                .unwrap_or_else(|| "config/analysis.toml".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
