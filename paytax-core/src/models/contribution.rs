use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat-rate statutory contributions that are looked up per year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContributionKind {
    UsSocialSecurity,
    UsMedicare,
}

impl fmt::Display for ContributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsSocialSecurity => f.write_str("United States social security"),
            Self::UsMedicare => f.write_str("United States medicare"),
        }
    }
}

/// Employee/employer rate pair with optional ceiling and surtax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRate {
    pub employee_rate: Decimal,
    pub employer_rate: Decimal,
    /// Income above this amount is not subject to the rate.
    pub wage_base: Option<Decimal>,
    pub additional_rate: Option<Decimal>,
    /// Income above this amount also pays `additional_rate`.
    pub additional_threshold: Option<Decimal>,
}

impl ContributionRate {
    pub fn new(
        employee_rate: Decimal,
        employer_rate: Decimal,
    ) -> Self {
        Self {
            employee_rate,
            employer_rate,
            wage_base: None,
            additional_rate: None,
            additional_threshold: None,
        }
    }

    pub fn with_wage_base(
        mut self,
        wage_base: Decimal,
    ) -> Self {
        self.wage_base = Some(wage_base);
        self
    }

    pub fn with_additional(
        mut self,
        rate: Decimal,
        threshold: Decimal,
    ) -> Self {
        self.additional_rate = Some(rate);
        self.additional_threshold = Some(threshold);
        self
    }
}

/// Singapore CPF rates for one inclusive age band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpfRate {
    pub min_age: u32,
    pub max_age: u32,
    pub employee_rate: Decimal,
    pub employer_rate: Decimal,
}

impl CpfRate {
    pub fn covers(
        &self,
        age: u32,
    ) -> bool {
        self.min_age <= age && age <= self.max_age
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InsuranceSide {
    Employee,
    Employer,
}

impl InsuranceSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Employer => "employer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "employee" => Some(Self::Employee),
            "employer" => Some(Self::Employer),
            _ => None,
        }
    }
}

/// China social insurance rates for one side of the payroll.
///
/// The category set comes from the data (pension, medical, ...), so it is kept
/// as a name-to-rate map rather than fixed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialInsuranceRates {
    pub rates: BTreeMap<String, Decimal>,
}

impl SocialInsuranceRates {
    pub fn total_rate(&self) -> Decimal {
        self.rates.values().copied().sum()
    }
}
