use log::LevelFilter;
use serde::Deserialize;
use std::{env, fs::read_to_string, path::Path, time::Duration};

/// The crate version extracted from the Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable key to load the config from
const CONFIG_ENV_KEY: &str = "INGEST_CONFIG_JSON";

/// Environment variable key holding the database connection URL
pub const DATABASE_URL_KEY: &str = "DATABASE_URL";

/// Loads the pipeline configuration, trying the env var first, then
/// `config.json` on disk, falling back to [Config::default].
///
/// Malformed config is logged and ignored rather than treated as fatal
/// (mirrors the "using default" fallback behavior of the ministry-of-economy
/// portal, which is equally tolerant of garbage).
pub fn load_config() -> Config {
    if let Ok(env) = env::var(CONFIG_ENV_KEY) {
        match serde_json::from_str(&env) {
            Ok(value) => return value,
            Err(err) => {
                eprintln!("Failed to load env config (using default): {err:?}");
                return Config::default();
            }
        }
    }

    let file = Path::new("config.json");
    if !file.exists() {
        return Config::default();
    }

    let data = match read_to_string(file) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Failed to load config file (using default): {err:?}");
            return Config::default();
        }
    };

    match serde_json::from_str(&data) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Failed to load config file (using default): {err:?}");
            Config::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database connection URL, overridden by `$DATABASE_URL` if that is set
    pub database_url: String,

    /// Size of the bounded worker pool used by the pipeline driver
    pub processes: usize,

    /// Root directory under which per-chain file caches are stored
    pub cache_dir: String,

    /// Index page listing all known chains and their portal credentials
    pub catalog_url: String,

    /// Per-request network timeout
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,

    pub logging: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/ingest.db?mode=rwc".to_string(),
            processes: 1,
            cache_dir: "data/cache".to_string(),
            catalog_url: "http://www.economy.gov.il/Trade/ConsumerProtection/Pages/PriceTransparencyRegulations.aspx".to_string(),
            request_timeout: Duration::from_secs(30),
            logging: LevelFilter::Info,
        }
    }
}

impl Config {
    /// Resolves the effective database URL, preferring `$DATABASE_URL`
    /// over whatever was loaded from the config file/env JSON.
    pub fn resolved_database_url(&self) -> String {
        env::var(DATABASE_URL_KEY).unwrap_or_else(|_| self.database_url.clone())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
