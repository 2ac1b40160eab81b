use crate::models::MatchParams;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub database: Option<DatabaseSettings>,
    #[serde(default)]
    pub donors: DonorSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub imputation: ImputationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonorSourceKind {
    Postgres,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DonorSettings {
    #[serde(default = "default_donor_source")]
    pub source: DonorSourceKind,
    /// Directory holding `donors_{year}.json` when `source = "file"`
    #[serde(default = "default_donor_directory")]
    pub directory: String,
}

impl Default for DonorSettings {
    fn default() -> Self {
        Self {
            source: default_donor_source(),
            directory: default_donor_directory(),
        }
    }
}

fn default_donor_source() -> DonorSourceKind { DonorSourceKind::Postgres }
fn default_donor_directory() -> String { "data/donors".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Number of policy-year donor indexes kept in memory
    #[serde(default = "default_max_indexes")]
    pub max_indexes: u64,
    pub ttl_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_indexes: default_max_indexes(),
            ttl_secs: None,
        }
    }
}

fn default_max_indexes() -> u64 { 8 }

#[derive(Debug, Clone, Deserialize)]
pub struct ImputationSettings {
    #[serde(default = "default_age_top_code")]
    pub age_top_code: u32,
    #[serde(default)]
    pub children_base_discrepancy: f64,
    #[serde(default = "default_children_per_child")]
    pub children_discrepancy_per_child: f64,
    #[serde(default = "default_earnings_thresholds")]
    pub earnings_thresholds: Vec<f64>,
    #[serde(default = "default_age_bound")]
    pub age_bound: f64,
    #[serde(default = "default_median_fraction")]
    pub median_fraction: f64,
    #[serde(default = "default_max_ratio")]
    pub max_ratio: f64,
    #[serde(default)]
    pub guarantee_age_match: bool,
    /// Seed of the shared random stream used when a request carries no seed
    #[serde(default)]
    pub rng_seed: u64,
}

impl Default for ImputationSettings {
    fn default() -> Self {
        let params = MatchParams::default();
        Self {
            age_top_code: params.age_top_code,
            children_base_discrepancy: params.children_base_discrepancy,
            children_discrepancy_per_child: params.children_discrepancy_per_child,
            earnings_thresholds: params.earnings_thresholds,
            age_bound: params.age_bound,
            median_fraction: params.median_fraction,
            max_ratio: params.max_ratio,
            guarantee_age_match: params.guarantee_age_match,
            rng_seed: 0,
        }
    }
}

fn default_age_top_code() -> u32 { MatchParams::default().age_top_code }
fn default_children_per_child() -> f64 { MatchParams::default().children_discrepancy_per_child }
fn default_earnings_thresholds() -> Vec<f64> { MatchParams::default().earnings_thresholds }
fn default_age_bound() -> f64 { MatchParams::default().age_bound }
fn default_median_fraction() -> f64 { MatchParams::default().median_fraction }
fn default_max_ratio() -> f64 { MatchParams::default().max_ratio }

impl ImputationSettings {
    pub fn match_params(&self) -> MatchParams {
        MatchParams {
            age_top_code: self.age_top_code,
            children_base_discrepancy: self.children_base_discrepancy,
            children_discrepancy_per_child: self.children_discrepancy_per_child,
            earnings_thresholds: self.earnings_thresholds.clone(),
            age_bound: self.age_bound,
            median_fraction: self.median_fraction,
            max_ratio: self.max_ratio,
            guarantee_age_match: self.guarantee_age_match,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with IMPUTE_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., IMPUTE__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("IMPUTE")
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("imputation.earnings_thresholds")
        .try_parsing(true)
}

/// DATABASE_URL takes precedence over any configured database URL
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}
