//! Waypoint configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::RequestField;

/// Main Waypoint configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Intake dialogue settings
    pub intake: IntakeConfig,

    /// Orchestrator settings
    pub planning: PlanningConfig,

    /// Canonical currency and static rates
    pub currency: CurrencyConfig,

    /// Budget validator thresholds
    pub budget: BudgetConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Offline destination catalogue
    pub suggestions: SuggestionsConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Catches values that would make intake or planning misbehave. Call this
    /// early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        let order = &self.intake.field_order;
        for field in RequestField::MANDATORY {
            let count = order.iter().filter(|f| **f == field).count();
            if count != 1 {
                return Err(eyre::eyre!(
                    "intake.field-order must list {} exactly once (found {})",
                    field,
                    count
                ));
            }
        }
        if order.contains(&RequestField::Notes) {
            return Err(eyre::eyre!("intake.field-order must not list notes; it is always asked last"));
        }
        if self.planning.max_concurrent_steps == 0 {
            return Err(eyre::eyre!("planning.max-concurrent-steps must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.planning.relevance_floor) {
            return Err(eyre::eyre!("planning.relevance-floor must be within [0, 1]"));
        }
        if !(self.planning.price_tie_tolerance >= 0.0 && self.planning.price_tie_tolerance < 1.0) {
            return Err(eyre::eyre!("planning.price-tie-tolerance must be within [0, 1)"));
        }
        if self.currency.canonical.trim().is_empty() {
            return Err(eyre::eyre!("currency.canonical must not be empty"));
        }
        for (name, ratio) in [
            ("flight-ratio", self.budget.flight_ratio),
            ("accommodation-ratio", self.budget.accommodation_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(eyre::eyre!("budget.{} must be within (0, 1]", name));
            }
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .waypoint.yml
        let local_config = PathBuf::from(".waypoint.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/waypoint/waypoint.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("waypoint").join("waypoint.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed; a broken config is reported later by `load`.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates: Vec<PathBuf> = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".waypoint.yml")];
                if let Some(config_dir) = dirs::config_dir() {
                    paths.push(config_dir.join("waypoint").join("waypoint.yml"));
                }
                paths
            }
        };

        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("anthropic" or "openai")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.api_key_env
            )),
        }
    }
}

/// Intake dialogue settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Priority order of the mandatory fields
    #[serde(rename = "field-order")]
    pub field_order: Vec<RequestField>,

    /// Failed replies on one field before re-prompts include an example format
    #[serde(rename = "max-reprompts")]
    pub max_reprompts: u32,

    /// Reject departure dates that are not after today
    #[serde(rename = "require-future-date")]
    pub require_future_date: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            field_order: RequestField::MANDATORY.to_vec(),
            max_reprompts: 3,
            require_future_date: true,
        }
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Per-invocation step timeout in milliseconds
    #[serde(rename = "step-timeout-ms")]
    pub step_timeout_ms: u64,

    /// Retries after a transient step failure
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before a retry in milliseconds
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Maximum specialist invocations in flight
    #[serde(rename = "max-concurrent-steps")]
    pub max_concurrent_steps: usize,

    /// Minimum relevance score for a candidate to be eligible
    #[serde(rename = "relevance-floor")]
    pub relevance_floor: f64,

    /// Relative price difference under which candidates tie
    #[serde(rename = "price-tie-tolerance")]
    pub price_tie_tolerance: f64,

    /// Version stamped into compiled plans
    #[serde(rename = "schema-version")]
    pub schema_version: String,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            step_timeout_ms: 120_000,
            max_retries: 1,
            retry_backoff_ms: 500,
            max_concurrent_steps: 3,
            relevance_floor: 0.5,
            price_tie_tolerance: 0.01,
            schema_version: crate::domain::PLAN_SCHEMA_VERSION.to_string(),
        }
    }
}

/// Canonical currency and static rates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Currency every plan amount is expressed in
    pub canonical: String,

    /// Units of the canonical currency per one unit of each code
    pub rates: HashMap<String, f64>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        let rates = [
            ("USD", 25_000.0),
            ("EUR", 27_000.0),
            ("GBP", 31_500.0),
            ("JPY", 165.0),
            ("KRW", 18.0),
            ("THB", 700.0),
            ("SGD", 18_500.0),
            ("CNY", 3_450.0),
            ("AUD", 16_500.0),
        ]
        .into_iter()
        .map(|(code, rate)| (code.to_string(), rate))
        .collect();

        Self {
            canonical: "VND".to_string(),
            rates,
        }
    }
}

/// Budget validator thresholds, as shares of the trip budget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    #[serde(rename = "flight-ratio")]
    pub flight_ratio: f64,

    #[serde(rename = "accommodation-ratio")]
    pub accommodation_ratio: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            flight_ratio: 0.4,
            accommodation_ratio: 0.3,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for stored sessions and plans
    #[serde(rename = "store-dir")]
    pub store_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/waypoint/store on Linux)
        let store_dir = dirs::data_local_dir()
            .map(|d| d.join("waypoint").join("store"))
            .unwrap_or_else(|| PathBuf::from(".waypoint/store"))
            .to_string_lossy()
            .into_owned();

        Self { store_dir }
    }
}

impl StorageConfig {
    /// Expand a leading ~/ in the store directory
    pub fn expanded_dir(&self) -> PathBuf {
        match self.store_dir.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.store_dir)),
            None => PathBuf::from(&self.store_dir),
        }
    }
}

/// A catalogue destination with descriptive tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl CatalogEntry {
    fn new(name: &str, tags: &[&str], description: &str) -> Self {
        Self {
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            description: description.to_string(),
        }
    }
}

/// Offline destination catalogue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionsConfig {
    pub catalogue: Vec<CatalogEntry>,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            catalogue: vec![
                CatalogEntry::new(
                    "Sa Pa",
                    &["mountains", "mountain", "cool", "cold", "trekking", "hiking", "rice terraces", "ethnic"],
                    "Misty highland town with terraced valleys and trekking trails",
                ),
                CatalogEntry::new(
                    "Da Lat",
                    &["mountains", "cool", "flowers", "pine", "romantic", "coffee", "lakes"],
                    "Temperate plateau city of pine forests, lakes and flower farms",
                ),
                CatalogEntry::new(
                    "Ha Long Bay",
                    &["bay", "islands", "cruise", "kayaking", "limestone", "sea", "scenic"],
                    "Limestone karsts and emerald water, best seen from a cruise",
                ),
                CatalogEntry::new(
                    "Phu Quoc",
                    &["beach", "beaches", "island", "warm", "sunny", "snorkeling", "resort", "relax"],
                    "Tropical island with long beaches and clear water",
                ),
                CatalogEntry::new(
                    "Hoi An",
                    &["ancient", "old town", "history", "culture", "lanterns", "food", "tailor", "beach"],
                    "Lantern-lit old trading port with riverside food stalls",
                ),
                CatalogEntry::new(
                    "Hue",
                    &["history", "imperial", "citadel", "culture", "temples", "food"],
                    "Former imperial capital with tombs and the walled citadel",
                ),
                CatalogEntry::new(
                    "Ha Giang",
                    &["mountains", "motorbike", "adventure", "loop", "remote", "passes"],
                    "Remote northern loop of high passes and limestone plateaus",
                ),
                CatalogEntry::new(
                    "Nha Trang",
                    &["beach", "beaches", "warm", "diving", "nightlife", "sea", "city"],
                    "Beach city with islands, diving and a lively night scene",
                ),
                CatalogEntry::new(
                    "Ho Chi Minh City",
                    &["city", "nightlife", "shopping", "food", "street food", "busy", "modern"],
                    "Energetic southern metropolis of markets, rooftops and street food",
                ),
                CatalogEntry::new(
                    "Ninh Binh",
                    &["countryside", "caves", "boat", "limestone", "rice", "scenic", "cycling"],
                    "River caves and rice fields among limestone peaks",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.intake.max_reprompts, 3);
        assert_eq!(config.planning.max_concurrent_steps, 3);
        assert_eq!(config.currency.canonical, "VND");
        assert_eq!(config.currency.rates["USD"], 25_000.0);
        assert_eq!(config.suggestions.catalogue[0].name, "Sa Pa");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();

        assert_eq!(config.provider, "anthropic");
        assert!(config.model.contains("sonnet"));
        assert_eq!(config.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_missing_api_key() {
        let config = LlmConfig {
            api_key_env: "WAYPOINT_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..LlmConfig::default()
        };
        let err = config.get_api_key().unwrap_err();
        assert!(err.to_string().contains("WAYPOINT_TEST_KEY_THAT_IS_NOT_SET"));
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug

llm:
  provider: openai
  model: gpt-4o
  api-key-env: MY_API_KEY
  base-url: https://api.example.com
  max-tokens: 8192
  timeout-ms: 60000

intake:
  field-order: [budget, destination, departure_point, departure_date, trip_duration, num_travelers, travel_style]
  max-reprompts: 2
  require-future-date: false

planning:
  step-timeout-ms: 5000
  relevance-floor: 0.6

currency:
  canonical: USD
  rates:
    EUR: 1.08

budget:
  flight-ratio: 0.5
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.llm.max_tokens, 8192);
        assert_eq!(config.intake.field_order[0], RequestField::Budget);
        assert_eq!(config.intake.max_reprompts, 2);
        assert!(!config.intake.require_future_date);
        assert_eq!(config.planning.step_timeout_ms, 5000);
        assert_eq!(config.planning.relevance_floor, 0.6);
        assert_eq!(config.planning.max_concurrent_steps, 3);
        assert_eq!(config.currency.canonical, "USD");
        assert_eq!(config.currency.rates.len(), 1);
        assert_eq!(config.budget.flight_ratio, 0.5);
        assert_eq!(config.budget.accommodation_ratio, 0.3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: claude-haiku
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.llm.model, "claude-haiku");

        // Defaults for unspecified
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.intake.field_order, RequestField::MANDATORY.to_vec());
        assert_eq!(config.planning.price_tie_tolerance, 0.01);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_field_order() {
        let mut config = Config::default();
        config.intake.field_order.pop();
        assert!(config.validate().unwrap_err().to_string().contains("travel style"));

        let mut config = Config::default();
        config.intake.field_order.push(RequestField::Destination);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_planning_values() {
        let mut config = Config::default();
        config.planning.max_concurrent_steps = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.budget.accommodation_ratio = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_and_log_level() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("waypoint.yml");
        fs::write(&path, "log-level: warn\nplanning:\n  max-retries: 2\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.planning.max_retries, 2);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));

        let missing = dir.path().join("nope.yml");
        assert!(Config::load(Some(&missing)).is_err());
        assert!(Config::load_log_level(Some(&missing)).is_none());
    }

    #[test]
    fn test_expanded_store_dir() {
        let storage = StorageConfig {
            store_dir: "/tmp/waypoint-store".to_string(),
        };
        assert_eq!(storage.expanded_dir(), PathBuf::from("/tmp/waypoint-store"));
    }
}
