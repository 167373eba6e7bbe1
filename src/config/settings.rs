use crate::core::{PowSettings, DEFAULT_DIFFICULTY, MAX_NONCE};
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_PATH_KEY: &str = "LEDGER_CONFIG";
const DB_PATH_KEY: &str = "LEDGER_DB_PATH";
const DIFFICULTY_KEY: &str = "LEDGER_DIFFICULTY";
const MAX_NONCE_KEY: &str = "LEDGER_MAX_NONCE";

static DEFAULT_CONFIG_FILE: &str = "ledger.toml";
static DEFAULT_DB_DIR: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub db_path: PathBuf,
    pub difficulty: u32,
    pub max_nonce: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_DIR),
            difficulty: DEFAULT_DIFFICULTY,
            max_nonce: MAX_NONCE,
        }
    }
}

impl Config {
    /// Resolve the configuration for this process.
    ///
    /// The file is `explicit` if given, else `$LEDGER_CONFIG`, else `./ledger.toml`
    /// when it exists. Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let file = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => env::var_os(CONFIG_PATH_KEY).map(PathBuf::from).or_else(|| {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                path.exists().then_some(path)
            }),
        };

        let mut config = match file {
            Some(path) => Config::from_file(&path)?,
            None => Config::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Config::from_toml_str(&text)
    }

    /// Parse only. Range checks run in [`Config::load`] once overrides are applied.
    pub fn from_toml_str(text: &str) -> Result<Config> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `LEDGER_DB_PATH`, `LEDGER_DIFFICULTY` and `LEDGER_MAX_NONCE` as
    /// reported by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DB_PATH_KEY) {
            self.db_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(DIFFICULTY_KEY) {
            self.difficulty = raw.trim().parse().map_err(|e| {
                LedgerError::Config(format!("Invalid {DIFFICULTY_KEY} '{raw}': {e}"))
            })?;
        }
        if let Some(raw) = lookup(MAX_NONCE_KEY) {
            self.max_nonce = raw.trim().parse().map_err(|e| {
                LedgerError::Config(format!("Invalid {MAX_NONCE_KEY} '{raw}': {e}"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.pow_settings().check()
    }

    pub fn pow_settings(&self) -> PowSettings {
        PowSettings {
            difficulty: self.difficulty,
            max_nonce: self.max_nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.db_path, PathBuf::from("data"));
        assert_eq!(config.difficulty, 12);
        assert_eq!(config.max_nonce, i64::MAX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("difficulty = 8\n").unwrap();
        assert_eq!(config.difficulty, 8);
        assert_eq!(config.db_path, PathBuf::from("data"));
        assert_eq!(config.max_nonce, i64::MAX);
    }

    #[test]
    fn test_full_toml() {
        let config = Config::from_toml_str(
            "db_path = \"/tmp/chain\"\ndifficulty = 4\nmax_nonce = 1000\n",
        )
        .unwrap();
        assert_eq!(
            config.pow_settings(),
            PowSettings {
                difficulty: 4,
                max_nonce: 1000
            }
        );
        assert_eq!(config.db_path, PathBuf::from("/tmp/chain"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result = Config::from_toml_str("difficulty = 4\nfees = true\n");
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_out_of_range_difficulty_rejected() {
        let config = Config::from_toml_str("difficulty = 300\n").unwrap();
        assert!(matches!(config.validate(), Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_override_repairs_out_of_range_file_value() {
        let mut config = Config::from_toml_str("difficulty = 300\nmax_nonce = 0\n").unwrap();
        config
            .apply_overrides(|key| match key {
                "LEDGER_DIFFICULTY" => Some("8".to_string()),
                "LEDGER_MAX_NONCE" => Some("1000".to_string()),
                _ => None,
            })
            .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.difficulty, 8);
        assert_eq!(config.max_nonce, 1000);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LEDGER_DB_PATH", "/var/lib/ledger"),
            ("LEDGER_DIFFICULTY", " 6 "),
            ("LEDGER_MAX_NONCE", "5000"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/var/lib/ledger"));
        assert_eq!(config.difficulty, 6);
        assert_eq!(config.max_nonce, 5000);
    }

    #[test]
    fn test_bad_override_is_config_error() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| {
            (key == "LEDGER_DIFFICULTY").then(|| "hard".to_string())
        });
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.toml");
        fs::write(&path, "difficulty = 3\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.difficulty, 3);
        assert!(matches!(
            Config::from_file(&dir.path().join("missing.toml")),
            Err(LedgerError::Config(_))
        ));
    }
}
