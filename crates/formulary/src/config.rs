//! Configuration: defaults, TOML layer, environment overrides.
//!
//! Precedence is defaults < `formulary.toml` < `FORMULARY_*` environment
//! variables. Unparseable env values are warned about and ignored rather
//! than failing startup.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};

pub const CONFIG_FILE_NAME: &str = "formulary.toml";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub counters: CounterConfig,
    pub allocator: AllocatorConfig,
    pub logging: LoggingConfig,
}

/// Per-family counter start values and the shared code width.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub set_start: u64,
    pub weight_start: u64,
    pub batch_start: u64,
    /// Starts above the seeded partner table so minted codes continue from
    /// where the seed ends.
    pub partner_start: u64,
    pub code_width: usize,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            set_start: 1,
            weight_start: 1,
            batch_start: 1,
            partner_start: 31,
            code_width: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Compare-and-swap attempts before surfacing contention.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Full-workflow re-runs after allocation contention.
    pub workflow_retries: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_base_ms: 5,
            backoff_max_ms: 50,
            workflow_retries: 3,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Tracing filter directive, e.g. `info` or `formulary=debug`.
    pub filter: Option<String>,
}

/// Partial config as parsed from a TOML file; `None` fields keep the value
/// from the layer below.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub counters: Option<CounterConfig>,
    pub allocator: Option<AllocatorConfig>,
    pub logging: Option<LoggingConfig>,
}

impl ConfigLayer {
    pub fn apply_to(self, config: &mut Config) {
        if let Some(counters) = self.counters {
            config.counters = counters;
        }
        if let Some(allocator) = self.allocator {
            config.allocator = allocator;
        }
        if let Some(logging) = self.logging {
            config.logging = logging;
        }
    }
}

pub fn load_file(path: &Path) -> Result<Option<ConfigLayer>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| config_error(format!("failed to read {}: {e}", path.display())))?;
    let layer: ConfigLayer = toml::from_str(&contents)
        .map_err(|e| config_error(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Some(layer))
}

/// Load `formulary.toml` from `dir` (if present) and apply env overrides.
pub fn load_from(dir: &Path) -> Result<Config> {
    let mut config = Config::default();
    if let Some(layer) = load_file(&dir.join(CONFIG_FILE_NAME))? {
        layer.apply_to(&mut config);
    }
    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Reject values no counter family can run with. Codes are 1-based, so a
/// start value of 0 would fail on its first allocation.
pub fn validate(config: &Config) -> Result<()> {
    let counters = &config.counters;
    for (name, start) in [
        ("set_start", counters.set_start),
        ("weight_start", counters.weight_start),
        ("batch_start", counters.batch_start),
        ("partner_start", counters.partner_start),
    ] {
        if start < 1 {
            return Err(config_error(format!("{name} must be at least 1")));
        }
    }
    let max_width = formulary_core::code::MAX_CODE_WIDTH;
    if counters.code_width < 1 || counters.code_width > max_width {
        return Err(config_error(format!(
            "code_width must be between 1 and {max_width}"
        )));
    }
    Ok(())
}

pub fn load() -> Result<Config> {
    let cwd = std::env::current_dir()
        .map_err(|e| config_error(format!("failed to resolve working directory: {e}")))?;
    load_from(&cwd)
}

pub fn apply_env_overrides(config: &mut Config) {
    apply_env_overrides_from(config, |key| std::env::var(key).ok());
}

fn apply_env_overrides_from<F>(config: &mut Config, mut lookup: F)
where
    F: FnMut(&str) -> Option<String>,
{
    fn parse_override<T: std::str::FromStr>(key: &str, raw: &str, slot: &mut T)
    where
        T::Err: std::fmt::Display,
    {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return;
        }
        match trimmed.parse::<T>() {
            Ok(value) => *slot = value,
            Err(err) => tracing::warn!("invalid {key}, ignoring: {err}"),
        }
    }

    if let Some(raw) = lookup("FORMULARY_SET_START") {
        parse_override("FORMULARY_SET_START", &raw, &mut config.counters.set_start);
    }
    if let Some(raw) = lookup("FORMULARY_WEIGHT_START") {
        parse_override(
            "FORMULARY_WEIGHT_START",
            &raw,
            &mut config.counters.weight_start,
        );
    }
    if let Some(raw) = lookup("FORMULARY_BATCH_START") {
        parse_override(
            "FORMULARY_BATCH_START",
            &raw,
            &mut config.counters.batch_start,
        );
    }
    if let Some(raw) = lookup("FORMULARY_PARTNER_START") {
        parse_override(
            "FORMULARY_PARTNER_START",
            &raw,
            &mut config.counters.partner_start,
        );
    }
    if let Some(raw) = lookup("FORMULARY_CODE_WIDTH") {
        parse_override("FORMULARY_CODE_WIDTH", &raw, &mut config.counters.code_width);
    }
    if let Some(raw) = lookup("FORMULARY_MAX_ATTEMPTS") {
        parse_override(
            "FORMULARY_MAX_ATTEMPTS",
            &raw,
            &mut config.allocator.max_attempts,
        );
    }
    if let Some(raw) = lookup("FORMULARY_LOG_FILTER") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            config.logging.filter = Some(trimmed.to_string());
        }
    }
}

/// Atomically write a config file (temp file + rename in the same directory).
pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| config_error("config path missing parent directory".to_string()))?;
    fs::create_dir_all(dir)
        .map_err(|e| config_error(format!("failed to create {}: {e}", dir.display())))?;
    let contents = toml::to_string_pretty(config)
        .map_err(|e| config_error(format!("failed to render config: {e}")))?;
    let temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        config_error(format!(
            "failed to create temp file in {}: {e}",
            dir.display()
        ))
    })?;
    fs::write(temp.path(), contents.as_bytes())
        .map_err(|e| config_error(format!("failed to write config temp file: {e}")))?;
    temp.persist(path).map_err(|e| {
        config_error(format!("failed to persist config to {}: {e}", path.display()))
    })?;
    Ok(())
}

fn config_error(reason: String) -> Error {
    ConfigError::new(reason).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn defaults_match_deployment_expectations() {
        let config = Config::default();
        assert_eq!(config.counters.set_start, 1);
        assert_eq!(config.counters.partner_start, 31);
        assert_eq!(config.counters.code_width, 2);
        assert_eq!(config.allocator.max_attempts, 10);
    }

    #[test]
    fn toml_layer_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "[counters]\nset_start = 5\nweight_start = 1\nbatch_start = 1\npartner_start = 40\ncode_width = 3\n",
        )
        .unwrap();

        let mut config = Config::default();
        let layer = load_file(&path).unwrap().unwrap();
        layer.apply_to(&mut config);
        assert_eq!(config.counters.set_start, 5);
        assert_eq!(config.counters.partner_start, 40);
        assert_eq!(config.counters.code_width, 3);
        // Untouched sections keep defaults.
        assert_eq!(config.allocator.max_attempts, 10);
    }

    #[test]
    fn env_overrides_win_and_ignore_garbage() {
        let mut env = BTreeMap::new();
        env.insert("FORMULARY_PARTNER_START", "50");
        env.insert("FORMULARY_MAX_ATTEMPTS", "not-a-number");
        env.insert("FORMULARY_LOG_FILTER", "formulary=debug");

        let mut config = Config::default();
        apply_env_overrides_from(&mut config, |key| {
            env.get(key).map(|v| v.to_string())
        });
        assert_eq!(config.counters.partner_start, 50);
        assert_eq!(config.allocator.max_attempts, 10);
        assert_eq!(config.logging.filter.as_deref(), Some("formulary=debug"));
    }

    #[test]
    fn write_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut config = Config::default();
        config.counters.set_start = 7;
        write_config(&path, &config).unwrap();

        let mut reloaded = Config::default();
        load_file(&path).unwrap().unwrap().apply_to(&mut reloaded);
        assert_eq!(reloaded, config);
    }

    #[test]
    fn zero_start_values_are_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[counters]\nset_start = 0\nweight_start = 1\nbatch_start = 1\npartner_start = 31\ncode_width = 2\n",
        )
        .unwrap();
        assert!(load_from(dir.path()).is_err());

        let mut config = Config::default();
        config.counters.code_width = 0;
        assert!(validate(&config).is_err());
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file(&dir.path().join(CONFIG_FILE_NAME))
            .unwrap()
            .is_none());
    }
}
