//! China individual income tax and social insurance.
//!
//! Residents deduct employee social insurance and the annual standard
//! deduction, then use the annual quick-deduction table. Non-residents get no
//! deductions: annual income is spread over twelve months, the monthly table
//! is applied and the monthly tax is annualized.
//!
//! The employer social insurance figure is a flat configured rate of gross
//! income. The employer side of the rate table is loaded but not used here.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::breakdown::Breakdown;
use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::progressive::quick_deduction_tax;
use crate::config::ChinaConfig;
use crate::error::EngineError;
use crate::input::CalculationInput;
use crate::jurisdictions::Calculator;
use crate::models::{BracketSchedule, InsuranceSide, Jurisdiction};
use crate::regions::RegionSet;
use crate::store::RateTableStore;

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Typed China result. Every amount is rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChinaBreakdown {
    pub year: i32,
    pub is_resident: bool,
    pub gross_income: Decimal,
    pub standard_deduction: Decimal,
    pub taxable_income: Decimal,
    pub income_tax: Decimal,
    pub employee_social_insurance: Decimal,
    pub employer_social_insurance: Decimal,
    pub net_income: Decimal,
    pub total_compensation: Decimal,
    pub real_compensation: Decimal,
}

impl From<ChinaBreakdown> for Breakdown {
    fn from(b: ChinaBreakdown) -> Self {
        Breakdown::new(Jurisdiction::China, b.year, b.is_resident)
            .with("gross_income", b.gross_income)
            .with("standard_deduction", b.standard_deduction)
            .with("taxable_income", b.taxable_income)
            .with("income_tax", b.income_tax)
            .with("employee_social_insurance", b.employee_social_insurance)
            .with("employer_social_insurance", b.employer_social_insurance)
            .with("net_income", b.net_income)
            .with("total_compensation", b.total_compensation)
            .with("real_compensation", b.real_compensation)
    }
}

#[derive(Debug, Clone)]
pub struct ChinaCalculator {
    store: Arc<RateTableStore>,
    config: ChinaConfig,
    regions: RegionSet,
}

impl ChinaCalculator {
    pub fn new(
        store: Arc<RateTableStore>,
        config: ChinaConfig,
        regions: RegionSet,
    ) -> Self {
        Self {
            store,
            config,
            regions,
        }
    }

    /// Employee social insurance: income times the sum of every employee-side
    /// category rate for the year.
    pub fn employee_social_insurance(
        &self,
        income: Decimal,
        year: i32,
    ) -> Result<Decimal, EngineError> {
        let rates = self
            .store
            .social_insurance(year, InsuranceSide::Employee)?;
        Ok(income * rates.total_rate())
    }

    pub fn employer_social_insurance(
        &self,
        income: Decimal,
    ) -> Decimal {
        income * self.config.employer_social_insurance_rate
    }

    /// Unrounded annual income tax on already-reduced taxable income.
    pub fn income_tax(
        &self,
        taxable_income: Decimal,
        year: i32,
        is_resident: bool,
    ) -> Result<Decimal, EngineError> {
        if is_resident {
            let brackets = self.store.brackets(&BracketSchedule::ChinaResident, year)?;
            return Ok(quick_deduction_tax(brackets, taxable_income));
        }

        let brackets = self
            .store
            .brackets(&BracketSchedule::ChinaNonResidentMonthly, year)?;
        let monthly_income = taxable_income / MONTHS_PER_YEAR;
        let monthly_tax = quick_deduction_tax(brackets, monthly_income);
        debug!(
            monthly_income = %monthly_income,
            monthly_tax = %monthly_tax,
            "non-resident monthly tax"
        );
        Ok(monthly_tax * MONTHS_PER_YEAR)
    }

    /// Full China calculation.
    ///
    /// # Errors
    /// [`EngineError::DataUnavailable`] when the year is missing from the
    /// resident table, the non-resident table or the employee social insurance
    /// table, whatever the residency.
    pub fn calculate_detailed(
        &self,
        input: &CalculationInput,
    ) -> Result<ChinaBreakdown, EngineError> {
        input.check_bounds()?;
        let year = input.year;
        self.store.brackets(&BracketSchedule::ChinaResident, year)?;
        self.store
            .brackets(&BracketSchedule::ChinaNonResidentMonthly, year)?;
        self.store.social_insurance(year, InsuranceSide::Employee)?;

        let gross_income = input.income;
        let (standard_deduction, employee_si, employer_si, taxable_income) = if input.is_resident {
            let employee_si = round_half_up(self.employee_social_insurance(gross_income, year)?);
            let employer_si = round_half_up(self.employer_social_insurance(gross_income));
            let deduction = self.config.standard_deduction;
            let taxable = non_negative(gross_income - employee_si - deduction);
            (deduction, employee_si, employer_si, taxable)
        } else {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, gross_income)
        };

        let income_tax = round_half_up(self.income_tax(taxable_income, year, input.is_resident)?);

        Ok(ChinaBreakdown {
            year,
            is_resident: input.is_resident,
            gross_income,
            standard_deduction,
            taxable_income,
            income_tax,
            employee_social_insurance: employee_si,
            employer_social_insurance: employer_si,
            net_income: gross_income - income_tax - employee_si,
            total_compensation: gross_income + employer_si,
            real_compensation: gross_income - income_tax + employer_si,
        })
    }
}

impl Calculator for ChinaCalculator {
    fn jurisdiction(&self) -> Jurisdiction {
        Jurisdiction::China
    }

    fn available_years(&self) -> Vec<i32> {
        self.store.available_years(Jurisdiction::China)
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
