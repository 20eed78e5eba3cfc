use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use paytax_core::EngineConfig;
use serde::Deserialize;

/// Contents of the optional `--config` TOML file.
///
/// ```toml
/// data_dir = "/srv/paytax/rates"
/// log_level = "warn"
///
/// [engine.singapore]
/// default_age = 40
///
/// [engine.china]
/// employer_social_insurance_rate = "0.07"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Reads and validates a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.engine.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_engine_section_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            log_level = "debug"

            [engine.united_states]
            retirement_contribution_limit = 23500
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.engine.united_states.retirement_contribution_limit, dec!(23500));
        assert_eq!(config.engine.united_states.non_resident_flat_rate, dec!(0.30));
        assert_eq!(config.engine.china, paytax_core::ChinaConfig::default());
    }

    #[test]
    fn string_decimals_are_accepted() {
        let config = AppConfig::from_toml(
            r#"
            [engine.china]
            employer_social_insurance_rate = "0.105"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.china.employer_social_insurance_rate, dec!(0.105));
    }

    #[test]
    fn out_of_range_rate_is_rejected() {
        let result = AppConfig::from_toml(
            r#"
            [engine.singapore]
            non_resident_flat_rate = "1.5"
            "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AppConfig::from_toml("data_directory = \"/tmp\"").is_err());
    }

    #[test]
    fn missing_file_names_path() {
        let err = AppConfig::load(Path::new("/no/such/paytax.toml")).unwrap_err();

        assert!(err.to_string().contains("/no/such/paytax.toml"));
    }
}
