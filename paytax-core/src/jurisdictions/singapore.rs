//! Singapore income tax and CPF.
//!
//! | Component | Residents | Non-residents |
//! |-----------|-----------|---------------|
//! | Income tax | progressive chargeable-income schedule | higher of the schedule and a flat 15% |
//! | CPF | monthly wage capped at 6800, rate by age band, annualized | none |
//!
//! Net income is gross less income tax and employee CPF.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::breakdown::Breakdown;
use crate::calculations::common::{max, round_half_up};
use crate::calculations::progressive::cumulative_marginal_tax;
use crate::config::SingaporeConfig;
use crate::error::EngineError;
use crate::input::CalculationInput;
use crate::jurisdictions::Calculator;
use crate::models::{BracketSchedule, Jurisdiction};
use crate::regions::RegionSet;
use crate::store::RateTableStore;

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Annual CPF contributions for one employee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpfContribution {
    pub employee: Decimal,
    pub employer: Decimal,
}

/// Typed Singapore result. Every amount is rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingaporeBreakdown {
    pub year: i32,
    pub is_resident: bool,
    pub gross_income: Decimal,
    pub income_tax: Decimal,
    pub employee_cpf_contribution: Decimal,
    pub employer_cpf_contribution: Decimal,
    pub net_income: Decimal,
    /// Gross plus employer CPF.
    pub total_compensation: Decimal,
    /// Gross less income tax plus employer CPF.
    pub real_compensation: Decimal,
}

impl From<SingaporeBreakdown> for Breakdown {
    fn from(b: SingaporeBreakdown) -> Self {
        Breakdown::new(Jurisdiction::Singapore, b.year, b.is_resident)
            .with("gross_income", b.gross_income)
            .with("income_tax", b.income_tax)
            .with("employee_cpf_contribution", b.employee_cpf_contribution)
            .with("employer_cpf_contribution", b.employer_cpf_contribution)
            .with("net_income", b.net_income)
            .with("total_compensation", b.total_compensation)
            .with("real_compensation", b.real_compensation)
    }
}

#[derive(Debug, Clone)]
pub struct SingaporeCalculator {
    store: Arc<RateTableStore>,
    config: SingaporeConfig,
    regions: RegionSet,
}

impl SingaporeCalculator {
    pub fn new(
        store: Arc<RateTableStore>,
        config: SingaporeConfig,
        regions: RegionSet,
    ) -> Self {
        Self {
            store,
            config,
            regions,
        }
    }

    /// Unrounded income tax for the year.
    pub fn income_tax(
        &self,
        income: Decimal,
        year: i32,
        is_resident: bool,
    ) -> Result<Decimal, EngineError> {
        let brackets = self
            .store
            .brackets(&BracketSchedule::SingaporeResident, year)?;
        let resident_tax = cumulative_marginal_tax(brackets, income);

        if is_resident {
            return Ok(resident_tax);
        }
        let flat_tax = income * self.config.non_resident_flat_rate;
        Ok(max(resident_tax, flat_tax))
    }

    /// Unrounded annual CPF for a resident of the given age.
    ///
    /// The first age band covering `age` is used. An age outside every band
    /// contributes nothing.
    pub fn cpf(
        &self,
        income: Decimal,
        age: u32,
        year: i32,
    ) -> Result<CpfContribution, EngineError> {
        let bands = self.store.cpf_rates(year)?;
        let Some(band) = bands.iter().find(|band| band.covers(age)) else {
            warn!(age, year, "no CPF age band covers age, contributions are 0");
            return Ok(CpfContribution::default());
        };

        debug!(
            age,
            min_age = band.min_age,
            max_age = band.max_age,
            "CPF age band selected"
        );

        let monthly_wage = (income / MONTHS_PER_YEAR).min(self.config.cpf_monthly_wage_ceiling);
        Ok(CpfContribution {
            employee: monthly_wage * band.employee_rate * MONTHS_PER_YEAR,
            employer: monthly_wage * band.employer_rate * MONTHS_PER_YEAR,
        })
    }

    /// Full Singapore calculation.
    ///
    /// # Errors
    /// [`EngineError::DataUnavailable`] when the year is missing from the tax
    /// or CPF table, whatever the residency.
    pub fn calculate_detailed(
        &self,
        input: &CalculationInput,
    ) -> Result<SingaporeBreakdown, EngineError> {
        input.check_bounds()?;
        let year = input.year;
        self.store
            .brackets(&BracketSchedule::SingaporeResident, year)?;
        self.store.cpf_rates(year)?;

        let gross_income = input.income;
        let income_tax = round_half_up(self.income_tax(gross_income, year, input.is_resident)?);

        let cpf = if input.is_resident {
            let age = input.extras.age.unwrap_or(self.config.default_age);
            self.cpf(gross_income, age, year)?
        } else {
            CpfContribution::default()
        };
        let employee_cpf = round_half_up(cpf.employee);
        let employer_cpf = round_half_up(cpf.employer);

        Ok(SingaporeBreakdown {
            year,
            is_resident: input.is_resident,
            gross_income,
            income_tax,
            employee_cpf_contribution: employee_cpf,
            employer_cpf_contribution: employer_cpf,
            net_income: gross_income - income_tax - employee_cpf,
            total_compensation: gross_income + employer_cpf,
            real_compensation: gross_income - income_tax + employer_cpf,
        })
    }
}

impl Calculator for SingaporeCalculator {
    fn jurisdiction(&self) -> Jurisdiction {
        Jurisdiction::Singapore
    }

    fn available_years(&self) -> Vec<i32> {
        self.store.available_years(Jurisdiction::Singapore)
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
