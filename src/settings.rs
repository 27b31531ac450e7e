use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassificationRule;
use crate::error::{GapsError, Result};
use crate::importer::DateColumn;
use crate::reports::ActiveTypeRule;
use crate::session::AnalysisOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub classification_rule: ClassificationRule,
    #[serde(default = "default_lenient_date_column")]
    pub lenient_date_column: DateColumn,
    #[serde(default)]
    pub active_type_rule: ActiveTypeRule,
    #[serde(default = "default_top_companies")]
    pub top_companies: usize,
}

fn default_lenient_date_column() -> DateColumn {
    DateColumn::PaidDate
}

fn default_top_companies() -> usize {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            classification_rule: ClassificationRule::default(),
            lenient_date_column: default_lenient_date_column(),
            active_type_rule: ActiveTypeRule::default(),
            top_companies: default_top_companies(),
        }
    }
}

impl Settings {
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            rule: self.classification_rule,
            lenient_date_column: self.lenient_date_column,
        }
    }

    /// Update one field from its `config set` key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || GapsError::Settings(format!("invalid value for {key}: {value}"));
        match key {
            "classification_rule" => {
                self.classification_rule =
                    clap::ValueEnum::from_str(value, true).map_err(|_| invalid())?;
            }
            "lenient_date_column" => {
                self.lenient_date_column =
                    clap::ValueEnum::from_str(value, true).map_err(|_| invalid())?;
            }
            "active_type_rule" => {
                self.active_type_rule = clap::ValueEnum::from_str(value, true).map_err(|_| invalid())?;
            }
            "top_companies" => {
                self.top_companies = value.parse().map_err(|_| invalid())?;
            }
            _ => return Err(GapsError::Settings(format!("unknown setting: {key}"))),
        }
        Ok(())
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("gaps")
}

pub fn settings_path() -> PathBuf {
    std::env::var_os("GAPS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join("settings.json"))
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let path = settings_path();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| GapsError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.classification_rule, ClassificationRule::ThreeFlag);
        assert_eq!(s.lenient_date_column, DateColumn::PaidDate);
        assert_eq!(s.active_type_rule, ActiveTypeRule::Present);
        assert_eq!(s.top_companies, 10);
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"classification_rule": "two-flag", "lenient_date_column": "PaymentDate"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.classification_rule, ClassificationRule::TwoFlag);
        assert_eq!(s.lenient_date_column, DateColumn::PaymentDate);
        assert_eq!(s.top_companies, 10);
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            top_companies: 3,
            active_type_rule: ActiveTypeRule::All,
            ..Settings::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();
        let loaded: Settings =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_set_known_keys() {
        let mut s = Settings::default();
        s.set("classification_rule", "two-flag").unwrap();
        s.set("lenient_date_column", "paymentdate").unwrap();
        s.set("active_type_rule", "all").unwrap();
        s.set("top_companies", "25").unwrap();
        assert_eq!(s.classification_rule, ClassificationRule::TwoFlag);
        assert_eq!(s.lenient_date_column, DateColumn::PaymentDate);
        assert_eq!(s.active_type_rule, ActiveTypeRule::All);
        assert_eq!(s.top_companies, 25);
        assert_eq!(s.analysis_options().rule, ClassificationRule::TwoFlag);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut s = Settings::default();
        assert!(s.set("top_companies", "many").is_err());
        assert!(s.set("classification_rule", "four-flag").is_err());
        let err = s.set("theme", "dark").err().unwrap();
        assert!(err.to_string().contains("unknown setting"));
    }
}
