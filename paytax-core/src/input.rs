//! Calculation inputs and the lenient sanitization applied at the boundary.
//!
//! Calculators only ever see a typed [`CalculationInput`]. Loosely typed
//! requests (web-form JSON, CLI strings) pass through
//! [`RawCalculationRequest::sanitize`] first, which applies a fixed policy:
//!
//! | Field | Missing / empty | Unparseable |
//! |-------|-----------------|-------------|
//! | income, retirement percentages | 0 | 0, logged |
//! | age | configured default | configured default, logged |
//! | residency | resident | resident, logged |
//! | tax year | current calendar year | [`EngineError::MalformedInput`] |
//!
//! Negative amounts are coerced to zero and retirement percentages are capped
//! at 100. An income above [`MAX_INCOME`] is rejected rather than clamped.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EngineError;

/// Largest gross income the engine accepts (one quadrillion).
///
/// Keeps every intermediate product of income and a rate or percentage well
/// inside `Decimal`'s range.
pub const MAX_INCOME: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// United States 401(k) election, all values in percent of gross income.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetirementElection {
    pub contribution_percent: Decimal,
    pub employer_match_percent: Decimal,
    pub employer_match_limit_percent: Decimal,
}

/// Jurisdiction-specific extras. Each calculator reads only what it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extras {
    /// Singapore CPF age. `None` uses the configured default.
    pub age: Option<u32>,
    pub retirement: RetirementElection,
}

/// Typed, sanitized input for one calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationInput {
    pub income: Decimal,
    pub region: String,
    pub subregion: String,
    pub year: i32,
    pub is_resident: bool,
    pub extras: Extras,
}

impl CalculationInput {
    /// A resident calculation with no region and default extras.
    pub fn new(
        income: Decimal,
        year: i32,
    ) -> Self {
        Self {
            income,
            region: String::new(),
            subregion: String::new(),
            year,
            is_resident: true,
            extras: Extras::default(),
        }
    }

    pub fn with_region(
        mut self,
        region: impl Into<String>,
        subregion: impl Into<String>,
    ) -> Self {
        self.region = region.into();
        self.subregion = subregion.into();
        self
    }

    pub fn with_residency(
        mut self,
        is_resident: bool,
    ) -> Self {
        self.is_resident = is_resident;
        self
    }

    pub fn with_age(
        mut self,
        age: u32,
    ) -> Self {
        self.extras.age = Some(age);
        self
    }

    pub fn with_retirement(
        mut self,
        contribution_percent: Decimal,
        employer_match_percent: Decimal,
        employer_match_limit_percent: Decimal,
    ) -> Self {
        self.extras.retirement = RetirementElection {
            contribution_percent,
            employer_match_percent,
            employer_match_limit_percent,
        };
        self
    }

    /// Rejects amounts the calculators cannot work with.
    ///
    /// # Errors
    /// [`EngineError::MalformedInput`] for an income above [`MAX_INCOME`] or a
    /// retirement percentage outside `0..=100`.
    pub fn check_bounds(&self) -> Result<(), EngineError> {
        if self.income > MAX_INCOME {
            return Err(income_too_large(self.income));
        }
        let retirement = &self.extras.retirement;
        for (field, percent) in [
            ("401k-contribution", retirement.contribution_percent),
            ("employer-match", retirement.employer_match_percent),
            ("employer-match-limit", retirement.employer_match_limit_percent),
        ] {
            if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
                return Err(EngineError::malformed(
                    field,
                    format!("{percent} is not between 0 and 100"),
                ));
            }
        }
        Ok(())
    }
}

fn income_too_large(income: Decimal) -> EngineError {
    EngineError::malformed("income", format!("{income} exceeds the maximum of {MAX_INCOME}"))
}

/// Parses a loosely formatted amount, falling back to zero.
///
/// Surrounding whitespace and thousands separators are ignored and scientific
/// notation is accepted. Empty input is zero without a warning; anything else
/// that fails to parse is zero with a warning.
pub fn lenient_decimal(
    field: &str,
    raw: Option<&str>,
) -> Decimal {
    let Some(raw) = raw else {
        return Decimal::ZERO;
    };
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    match Decimal::from_str(&cleaned).or_else(|_| Decimal::from_scientific(&cleaned)) {
        Ok(value) => value,
        Err(_) => {
            warn!(field, value = raw, "unparseable amount, using 0");
            Decimal::ZERO
        }
    }
}

/// Like [`lenient_decimal`] but negative values are also coerced to zero.
pub fn lenient_amount(
    field: &str,
    raw: Option<&str>,
) -> Decimal {
    let value = lenient_decimal(field, raw);
    if value < Decimal::ZERO {
        warn!(field, value = %value, "negative amount, using 0");
        return Decimal::ZERO;
    }
    value
}

/// Like [`lenient_amount`] but values above 100 are capped at 100.
pub fn lenient_percent(
    field: &str,
    raw: Option<&str>,
) -> Decimal {
    let value = lenient_amount(field, raw);
    if value > Decimal::ONE_HUNDRED {
        warn!(field, value = %value, "percentage above 100, using 100");
        return Decimal::ONE_HUNDRED;
    }
    value
}

fn lenient_age(raw: Option<&str>) -> Option<u32> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u32>() {
        Ok(age) => Some(age),
        Err(_) => {
            warn!(value = raw, "unparseable age, using default");
            None
        }
    }
}

fn lenient_flag(raw: Option<&str>) -> bool {
    let Some(raw) = raw else {
        return true;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        _ => {
            warn!(value = raw, "unrecognised residency flag, assuming resident");
            true
        }
    }
}

fn strict_year(
    raw: Option<&str>,
    default_year: i32,
) -> Result<i32, EngineError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default_year);
    };
    if let Ok(year) = raw.parse::<i32>() {
        return Ok(year);
    }
    // "2024.0" names a whole year; "2024.5" does not
    Decimal::from_str(raw)
        .ok()
        .filter(|value| value.fract().is_zero())
        .and_then(|value| value.to_i32())
        .ok_or_else(|| EngineError::malformed("tax-year", format!("'{raw}' is not a whole year")))
}

/// A calculation request as submitted by a web form or batch file.
///
/// Every field is optional and accepted as a string, number or boolean.
/// Keys follow the form's naming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawCalculationRequest {
    #[serde(default, deserialize_with = "loose_string")]
    pub country: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub income: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub state: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub city: Option<String>,

    #[serde(default, rename = "tax-year", deserialize_with = "loose_string")]
    pub tax_year: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub is_resident: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub age: Option<String>,

    #[serde(default, rename = "401k-contribution", deserialize_with = "loose_string")]
    pub contribution_percent: Option<String>,

    #[serde(default, rename = "employer-match", deserialize_with = "loose_string")]
    pub employer_match_percent: Option<String>,

    #[serde(default, rename = "employer-match-limit", deserialize_with = "loose_string")]
    pub employer_match_limit_percent: Option<String>,
}

/// A sanitized request: the jurisdiction name plus typed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationRequest {
    pub jurisdiction: String,
    pub input: CalculationInput,
}

impl RawCalculationRequest {
    /// Applies the lenient policy, using `default_year` when no year is given.
    ///
    /// # Errors
    /// [`EngineError::MalformedInput`] for a missing country, a tax year
    /// that is present but not a whole number, or an income above
    /// [`MAX_INCOME`].
    pub fn sanitize(
        &self,
        default_year: i32,
    ) -> Result<CalculationRequest, EngineError> {
        let jurisdiction = self
            .country
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| EngineError::malformed("country", "missing"))?
            .to_string();

        let year = strict_year(self.tax_year.as_deref(), default_year)?;

        let income = lenient_amount("income", self.income.as_deref());
        if income > MAX_INCOME {
            return Err(income_too_large(income));
        }

        let input = CalculationInput {
            income,
            region: self.state.clone().unwrap_or_default(),
            subregion: self.city.clone().unwrap_or_default(),
            year,
            is_resident: lenient_flag(self.is_resident.as_deref()),
            extras: Extras {
                age: lenient_age(self.age.as_deref()),
                retirement: RetirementElection {
                    contribution_percent: lenient_percent(
                        "401k-contribution",
                        self.contribution_percent.as_deref(),
                    ),
                    employer_match_percent: lenient_percent(
                        "employer-match",
                        self.employer_match_percent.as_deref(),
                    ),
                    employer_match_limit_percent: lenient_percent(
                        "employer-match-limit",
                        self.employer_match_limit_percent.as_deref(),
                    ),
                },
            },
        };

        Ok(CalculationRequest {
            jurisdiction,
            input,
        })
    }
}

/// Accepts a string, number, boolean or null and keeps its text form.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LooseString;

    impl<'de> Visitor<'de> for LooseString {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number, boolean or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(LooseString)
        }
    }

    deserializer.deserialize_any(LooseString)
}
