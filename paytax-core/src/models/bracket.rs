use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Jurisdiction;

/// One contiguous income range with its marginal rate.
///
/// `upper_bound` is `None` for the top bracket of a schedule. The
/// `quick_deduction` is only present for schedules evaluated by direct lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
    pub quick_deduction: Option<Decimal>,
}

impl Bracket {
    pub fn new(
        lower_bound: Decimal,
        upper_bound: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self {
            lower_bound,
            upper_bound,
            rate,
            quick_deduction: None,
        }
    }

    pub fn with_quick_deduction(
        mut self,
        quick_deduction: Decimal,
    ) -> Self {
        self.quick_deduction = Some(quick_deduction);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.upper_bound.is_none()
    }
}

/// Identifies which rate schedule a set of brackets belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BracketSchedule {
    /// Singapore resident chargeable-income schedule (annual).
    SingaporeResident,
    /// United States federal schedule (single filer, annual).
    UsFederal,
    /// United States state schedule, keyed by state name.
    UsState(String),
    /// China resident comprehensive-income schedule (annual).
    ChinaResident,
    /// China non-resident wage schedule (monthly amounts).
    ChinaNonResidentMonthly,
}

impl BracketSchedule {
    pub fn jurisdiction(&self) -> Jurisdiction {
        match self {
            Self::SingaporeResident => Jurisdiction::Singapore,
            Self::UsFederal | Self::UsState(_) => Jurisdiction::UnitedStates,
            Self::ChinaResident | Self::ChinaNonResidentMonthly => Jurisdiction::China,
        }
    }
}

impl fmt::Display for BracketSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingaporeResident => f.write_str("Singapore resident tax"),
            Self::UsFederal => f.write_str("United States federal tax"),
            Self::UsState(state) => write!(f, "United States state tax ({state})"),
            Self::ChinaResident => f.write_str("China resident tax"),
            Self::ChinaNonResidentMonthly => f.write_str("China non-resident tax"),
        }
    }
}
