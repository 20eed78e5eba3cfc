//! Serde row types, one per rate file.
//!
//! Headers are matched by name, so column order does not matter. Cells that
//! describe an open-ended upper bound may be left empty (or hold `inf`).

use std::collections::BTreeMap;

use paytax_core::InsuranceSide;
use rust_decimal::Decimal;
use serde::Deserialize;

/// `sg_tax_rates.csv`: `chargeable_income` is the width of the bracket
/// starting at `income_threshold`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SingaporeTaxRecord {
    pub year: i32,
    pub income_threshold: Decimal,
    #[serde(deserialize_with = "deserialize_open_decimal")]
    pub chargeable_income: Option<Decimal>,
    pub rate: Decimal,
}

/// `sg_cpf_rates.csv`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CpfRecord {
    pub year: i32,
    pub min_age: u32,
    pub max_age: u32,
    pub employee_rate: Decimal,
    pub employer_rate: Decimal,
}

/// `us_federal_tax_rates.csv`: each bracket ends where the next row's
/// threshold begins.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ThresholdRecord {
    pub year: i32,
    pub income_threshold: Decimal,
    pub rate: Decimal,
}

/// `us_state_tax_rates.csv`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StateTaxRecord {
    pub year: i32,
    pub state: String,
    pub income_threshold: Decimal,
    pub rate: Decimal,
}

/// `us_local_tax_rates.csv`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LocalTaxRecord {
    pub year: i32,
    pub state: String,
    pub city: String,
    pub rate: Decimal,
}

/// `us_social_security_rates.csv`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SocialSecurityRecord {
    pub year: i32,
    pub employee_rate: Decimal,
    pub employer_rate: Decimal,
    pub wage_base: Decimal,
}

/// `us_medicare_rates.csv`. Only the single-filer threshold feeds the
/// calculation.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MedicareRecord {
    pub year: i32,
    pub employee_rate: Decimal,
    pub employer_rate: Decimal,
    pub additional_rate: Decimal,
    pub additional_threshold_single: Decimal,
    pub additional_threshold_married: Decimal,
}

/// `cn_resident_tax_rates.csv` and `cn_non_resident_tax_rates.csv`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChinaTaxRecord {
    pub year: i32,
    pub taxable_income_min: Decimal,
    #[serde(deserialize_with = "deserialize_open_decimal")]
    pub taxable_income_max: Option<Decimal>,
    pub tax_rate: Decimal,
    pub quick_deduction: Decimal,
}

/// One row of `cn_social_insurance_rates.csv`. Every column other than
/// `year` and `category` is an insurance category.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialInsuranceRecord {
    pub year: i32,
    pub side: InsuranceSide,
    pub rates: BTreeMap<String, Decimal>,
}

fn deserialize_open_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("inf") || s.eq_ignore_ascii_case("infinity") => Ok(None),
        Some(s) => s
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
