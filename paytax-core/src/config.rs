//! Engine constants that are policy rather than table data.
//!
//! Every value has a default matching current statute. A deployment may
//! override them (the CLI reads an `[engine]` TOML table) and each section is
//! checked by `validate()` before any calculator is built.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be between 0 and 1, got {value}")]
    RateOutOfRange { name: &'static str, value: Decimal },

    #[error("{name} must not be negative, got {value}")]
    NegativeAmount { name: &'static str, value: Decimal },

    #[error("{name} must be positive, got {value}")]
    NonPositiveAmount { name: &'static str, value: Decimal },
}

fn check_rate(
    name: &'static str,
    value: Decimal,
) -> Result<(), ConfigError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ConfigError::RateOutOfRange { name, value });
    }
    Ok(())
}

fn check_positive(
    name: &'static str,
    value: Decimal,
) -> Result<(), ConfigError> {
    if value <= Decimal::ZERO {
        return Err(ConfigError::NonPositiveAmount { name, value });
    }
    Ok(())
}

/// Singapore policy constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingaporeConfig {
    /// Flat rate non-residents pay when it exceeds the resident schedule.
    pub non_resident_flat_rate: Decimal,

    /// Ordinary wage ceiling for CPF, per month.
    pub cpf_monthly_wage_ceiling: Decimal,

    /// Age assumed when the caller does not supply one.
    pub default_age: u32,
}

impl Default for SingaporeConfig {
    fn default() -> Self {
        Self {
            non_resident_flat_rate: Decimal::new(15, 2),
            cpf_monthly_wage_ceiling: Decimal::from(6800),
            default_age: 35,
        }
    }
}

impl SingaporeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("singapore.non_resident_flat_rate", self.non_resident_flat_rate)?;
        check_positive(
            "singapore.cpf_monthly_wage_ceiling",
            self.cpf_monthly_wage_ceiling,
        )?;
        Ok(())
    }
}

/// United States policy constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitedStatesConfig {
    /// Flat federal rate applied to non-resident aliens.
    pub non_resident_flat_rate: Decimal,

    /// Elective 401(k) deferral limit for the year.
    pub retirement_contribution_limit: Decimal,
}

impl Default for UnitedStatesConfig {
    fn default() -> Self {
        Self {
            non_resident_flat_rate: Decimal::new(30, 2),
            retirement_contribution_limit: Decimal::from(23000),
        }
    }
}

impl UnitedStatesConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("united_states.non_resident_flat_rate", self.non_resident_flat_rate)?;
        if self.retirement_contribution_limit < Decimal::ZERO {
            return Err(ConfigError::NegativeAmount {
                name: "united_states.retirement_contribution_limit",
                value: self.retirement_contribution_limit,
            });
        }
        Ok(())
    }
}

/// China policy constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChinaConfig {
    /// Annual basic deduction for residents.
    pub standard_deduction: Decimal,

    /// Employer social insurance rate, applied to gross income.
    ///
    /// The employer side of the social insurance table is not consulted.
    pub employer_social_insurance_rate: Decimal,
}

impl Default for ChinaConfig {
    fn default() -> Self {
        Self {
            standard_deduction: Decimal::from(60000),
            employer_social_insurance_rate: Decimal::new(7, 2),
        }
    }
}

impl ChinaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.standard_deduction < Decimal::ZERO {
            return Err(ConfigError::NegativeAmount {
                name: "china.standard_deduction",
                value: self.standard_deduction,
            });
        }
        check_rate(
            "china.employer_social_insurance_rate",
            self.employer_social_insurance_rate,
        )?;
        Ok(())
    }
}

/// All engine policy constants, grouped by jurisdiction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub singapore: SingaporeConfig,
    pub united_states: UnitedStatesConfig,
    pub china: ChinaConfig,
}

impl EngineConfig {
    /// Validates every section, reporting the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.singapore.validate()?;
        self.united_states.validate()?;
        self.china.validate()?;
        Ok(())
    }
}
