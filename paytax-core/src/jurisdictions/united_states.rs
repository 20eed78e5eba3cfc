//! United States federal, state and local income tax, FICA and 401(k).
//!
//! Order of computation:
//!
//! 1. Elective 401(k) contribution (residents only), capped at the annual
//!    limit, and the employer match.
//! 2. Taxable income = gross − employee contribution.
//! 3. Federal tax: progressive schedule for residents, flat 30% otherwise.
//! 4. State tax: the state's progressive schedule, residents only.
//! 5. Local tax: flat city rate × taxable income, residents only.
//! 6. Social Security on gross income up to the wage base, residents only.
//! 7. Medicare on gross income plus the additional rate above the single-filer
//!    threshold, residents only.
//!
//! There is no filing status; the Medicare threshold is always the single-filer
//! amount.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::breakdown::Breakdown;
use crate::calculations::common::{non_negative, percent_of, round_half_up};
use crate::calculations::progressive::cumulative_marginal_tax;
use crate::config::UnitedStatesConfig;
use crate::error::EngineError;
use crate::input::{CalculationInput, RetirementElection};
use crate::jurisdictions::Calculator;
use crate::models::{BracketSchedule, ContributionKind, Jurisdiction};
use crate::regions::RegionSet;
use crate::store::RateTableStore;

/// Annual 401(k) contributions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetirementContribution {
    pub employee: Decimal,
    pub employer: Decimal,
}

/// Typed United States result. Every amount is rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitedStatesBreakdown {
    pub year: i32,
    pub is_resident: bool,
    pub gross_income: Decimal,
    pub taxable_income: Decimal,
    pub federal_tax: Decimal,
    pub state_tax: Decimal,
    pub local_tax: Decimal,
    pub social_security_tax: Decimal,
    pub medicare_tax: Decimal,
    pub total_tax: Decimal,
    pub employee_401k_contribution: Decimal,
    pub employer_401k_contribution: Decimal,
    pub net_income: Decimal,
    /// Gross plus employer match.
    pub total_compensation: Decimal,
}

impl From<UnitedStatesBreakdown> for Breakdown {
    fn from(b: UnitedStatesBreakdown) -> Self {
        Breakdown::new(Jurisdiction::UnitedStates, b.year, b.is_resident)
            .with("gross_income", b.gross_income)
            .with("taxable_income", b.taxable_income)
            .with("federal_tax", b.federal_tax)
            .with("state_tax", b.state_tax)
            .with("local_tax", b.local_tax)
            .with("social_security_tax", b.social_security_tax)
            .with("medicare_tax", b.medicare_tax)
            .with("total_tax", b.total_tax)
            .with("employee_401k_contribution", b.employee_401k_contribution)
            .with("employer_401k_contribution", b.employer_401k_contribution)
            .with("net_income", b.net_income)
            .with("total_compensation", b.total_compensation)
    }
}

#[derive(Debug, Clone)]
pub struct UnitedStatesCalculator {
    store: Arc<RateTableStore>,
    config: UnitedStatesConfig,
    regions: RegionSet,
}

impl UnitedStatesCalculator {
    pub fn new(
        store: Arc<RateTableStore>,
        config: UnitedStatesConfig,
        regions: RegionSet,
    ) -> Self {
        Self {
            store,
            config,
            regions,
        }
    }

    /// Employee deferral and employer match. Non-residents contribute nothing.
    pub fn retirement(
        &self,
        income: Decimal,
        election: &RetirementElection,
        is_resident: bool,
    ) -> RetirementContribution {
        if !is_resident {
            return RetirementContribution::default();
        }

        let employee = percent_of(income, election.contribution_percent)
            .min(self.config.retirement_contribution_limit);
        let employer = employee
            .min(percent_of(income, election.employer_match_percent))
            .min(percent_of(income, election.employer_match_limit_percent));

        RetirementContribution { employee, employer }
    }

    pub fn federal_tax(
        &self,
        taxable_income: Decimal,
        year: i32,
        is_resident: bool,
    ) -> Result<Decimal, EngineError> {
        let brackets = self.store.brackets(&BracketSchedule::UsFederal, year)?;
        if is_resident {
            Ok(cumulative_marginal_tax(brackets, taxable_income))
        } else {
            Ok(non_negative(taxable_income) * self.config.non_resident_flat_rate)
        }
    }

    /// Zero for non-residents and for states without a schedule that year.
    pub fn state_tax(
        &self,
        taxable_income: Decimal,
        state: &str,
        year: i32,
        is_resident: bool,
    ) -> Decimal {
        if !is_resident {
            return Decimal::ZERO;
        }
        match self
            .store
            .find_brackets(&BracketSchedule::UsState(state.to_string()), year)
        {
            Some(brackets) => cumulative_marginal_tax(brackets, taxable_income),
            None => {
                warn!(state, year, "no state tax schedule, state tax is 0");
                Decimal::ZERO
            }
        }
    }

    /// Zero for non-residents and for cities without a local rate that year.
    pub fn local_tax(
        &self,
        taxable_income: Decimal,
        state: &str,
        city: &str,
        year: i32,
        is_resident: bool,
    ) -> Decimal {
        if !is_resident {
            return Decimal::ZERO;
        }
        match self.store.local_rate(year, state, city) {
            Some(rate) => non_negative(taxable_income) * rate,
            None => {
                debug!(state, city, year, "no local tax rate");
                Decimal::ZERO
            }
        }
    }

    pub fn social_security_tax(
        &self,
        income: Decimal,
        year: i32,
        is_resident: bool,
    ) -> Result<Decimal, EngineError> {
        if !is_resident {
            return Ok(Decimal::ZERO);
        }
        let rate = self
            .store
            .contribution_rate(ContributionKind::UsSocialSecurity, year)?;
        let covered = rate.wage_base.map_or(income, |base| income.min(base));
        Ok(covered * rate.employee_rate)
    }

    pub fn medicare_tax(
        &self,
        income: Decimal,
        year: i32,
        is_resident: bool,
    ) -> Result<Decimal, EngineError> {
        if !is_resident {
            return Ok(Decimal::ZERO);
        }
        let rate = self
            .store
            .contribution_rate(ContributionKind::UsMedicare, year)?;
        let base = income * rate.employee_rate;
        let additional = match (rate.additional_rate, rate.additional_threshold) {
            (Some(additional_rate), Some(threshold)) => {
                non_negative((income - threshold) * additional_rate)
            }
            _ => Decimal::ZERO,
        };
        Ok(base + additional)
    }

    /// Full United States calculation.
    ///
    /// # Errors
    /// [`EngineError::DataUnavailable`] when the year is missing from the
    /// federal table or, for residents, the Social Security or Medicare table.
    pub fn calculate_detailed(
        &self,
        input: &CalculationInput,
    ) -> Result<UnitedStatesBreakdown, EngineError> {
        input.check_bounds()?;
        let year = input.year;
        let resident = input.is_resident;
        self.store.brackets(&BracketSchedule::UsFederal, year)?;

        let gross_income = input.income;
        let retirement = self.retirement(gross_income, &input.extras.retirement, resident);
        let employee_401k = round_half_up(retirement.employee);
        let employer_401k = round_half_up(retirement.employer);
        let taxable_income = gross_income - employee_401k;

        let federal_tax = round_half_up(self.federal_tax(taxable_income, year, resident)?);
        let state_tax =
            round_half_up(self.state_tax(taxable_income, &input.region, year, resident));
        let local_tax = round_half_up(self.local_tax(
            taxable_income,
            &input.region,
            &input.subregion,
            year,
            resident,
        ));
        let social_security_tax =
            round_half_up(self.social_security_tax(gross_income, year, resident)?);
        let medicare_tax = round_half_up(self.medicare_tax(gross_income, year, resident)?);

        let total_tax = federal_tax + state_tax + local_tax + social_security_tax + medicare_tax;

        debug!(
            year,
            resident,
            taxable_income = %taxable_income,
            total_tax = %total_tax,
            "United States calculation complete"
        );

        Ok(UnitedStatesBreakdown {
            year,
            is_resident: resident,
            gross_income,
            taxable_income,
            federal_tax,
            state_tax,
            local_tax,
            social_security_tax,
            medicare_tax,
            total_tax,
            employee_401k_contribution: employee_401k,
            employer_401k_contribution: employer_401k,
            net_income: gross_income - total_tax - employee_401k,
            total_compensation: gross_income + employer_401k,
        })
    }
}

impl Calculator for UnitedStatesCalculator {
    fn jurisdiction(&self) -> Jurisdiction {
        Jurisdiction::UnitedStates
    }

    fn available_years(&self) -> Vec<i32> {
        self.store.available_years(Jurisdiction::UnitedStates)
    }

    fn regions(&self) -> Vec<String> {
        self.regions.regions()
    }

    fn subregions(
        &self,
        region: &str,
    ) -> Vec<String> {
        self.regions.subregions(region)
    }

    fn calculate(
        &self,
        input: &CalculationInput,
    ) -> Result<Breakdown, EngineError> {
        self.calculate_detailed(input).map(Breakdown::from)
    }
}
