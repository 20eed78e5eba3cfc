use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use crate::models::{
    Bracket, BracketSchedule, ContributionKind, ContributionRate, CpfRate, InsuranceSide,
    Jurisdiction, SocialInsuranceRates,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("No {table} data available for year {year}")]
    DataUnavailable { table: String, year: i32 },

    #[error("Invalid {table} schedule for year {year}: {reason}")]
    InvalidSchedule {
        table: String,
        year: i32,
        reason: String,
    },

    #[error("Invalid {table} rate {value} for year {year}")]
    InvalidRate {
        table: String,
        year: i32,
        value: Decimal,
    },

    #[error("Duplicate {table} entry for year {year}")]
    Duplicate { table: String, year: i32 },
}

impl StoreError {
    fn unavailable(
        table: impl ToString,
        year: i32,
    ) -> Self {
        Self::DataUnavailable {
            table: table.to_string(),
            year,
        }
    }
}

type LocalRates = BTreeMap<String, BTreeMap<String, Decimal>>;

/// Immutable, in-memory rate tables keyed by schedule and year.
///
/// Built once through [`RateTableStoreBuilder`] and then shared read-only
/// (typically behind an `Arc`) by every calculator. Lookups never fall back to
/// another year's data.
#[derive(Debug, Clone, Default)]
pub struct RateTableStore {
    brackets: BTreeMap<(BracketSchedule, i32), Vec<Bracket>>,
    contributions: BTreeMap<(ContributionKind, i32), ContributionRate>,
    cpf: BTreeMap<i32, Vec<CpfRate>>,
    social_insurance: BTreeMap<(i32, InsuranceSide), SocialInsuranceRates>,
    local: BTreeMap<i32, LocalRates>,
}

impl RateTableStore {
    pub fn builder() -> RateTableStoreBuilder {
        RateTableStoreBuilder::default()
    }

    /// Brackets for a schedule and year, sorted ascending by lower bound.
    ///
    /// # Errors
    /// [`StoreError::DataUnavailable`] when the schedule has no rows for `year`.
    pub fn brackets(
        &self,
        schedule: &BracketSchedule,
        year: i32,
    ) -> Result<&[Bracket], StoreError> {
        self.find_brackets(schedule, year)
            .ok_or_else(|| StoreError::unavailable(schedule, year))
    }

    /// Like [`Self::brackets`] but treats a missing schedule as absent rather
    /// than an error. Used for optional tables such as US state schedules.
    pub fn find_brackets(
        &self,
        schedule: &BracketSchedule,
        year: i32,
    ) -> Option<&[Bracket]> {
        self.brackets
            .get(&(schedule.clone(), year))
            .map(Vec::as_slice)
    }

    pub fn contribution_rate(
        &self,
        kind: ContributionKind,
        year: i32,
    ) -> Result<&ContributionRate, StoreError> {
        self.contributions
            .get(&(kind, year))
            .ok_or_else(|| StoreError::unavailable(kind, year))
    }

    /// CPF age bands for `year` in load order. The first band covering an age
    /// wins.
    pub fn cpf_rates(
        &self,
        year: i32,
    ) -> Result<&[CpfRate], StoreError> {
        self.cpf
            .get(&year)
            .map(Vec::as_slice)
            .ok_or_else(|| StoreError::unavailable("Singapore CPF", year))
    }

    pub fn social_insurance(
        &self,
        year: i32,
        side: InsuranceSide,
    ) -> Result<&SocialInsuranceRates, StoreError> {
        self.social_insurance.get(&(year, side)).ok_or_else(|| {
            StoreError::unavailable(format!("China {} social insurance", side.as_str()), year)
        })
    }

    /// Flat local rate for a (state, city) pair, if the year lists one.
    pub fn local_rate(
        &self,
        year: i32,
        state: &str,
        city: &str,
    ) -> Option<Decimal> {
        self.local.get(&year)?.get(state)?.get(city).copied()
    }

    /// Years with at least one bracket row for `schedule`.
    pub fn schedule_years(
        &self,
        schedule: &BracketSchedule,
    ) -> BTreeSet<i32> {
        self.brackets
            .keys()
            .filter(|(s, _)| s == schedule)
            .map(|(_, year)| *year)
            .collect()
    }

    /// Years a jurisdiction can be calculated for, newest first.
    ///
    /// Singapore and the United States report the years of their primary tax
    /// table. China reports the union of its three tables.
    pub fn available_years(
        &self,
        jurisdiction: Jurisdiction,
    ) -> Vec<i32> {
        let years = match jurisdiction {
            Jurisdiction::Singapore => self.schedule_years(&BracketSchedule::SingaporeResident),
            Jurisdiction::UnitedStates => self.schedule_years(&BracketSchedule::UsFederal),
            Jurisdiction::China => {
                let mut years = self.schedule_years(&BracketSchedule::ChinaResident);
                years.extend(self.schedule_years(&BracketSchedule::ChinaNonResidentMonthly));
                years.extend(self.social_insurance.keys().map(|(year, _)| *year));
                years
            }
        };
        years.into_iter().rev().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
            && self.contributions.is_empty()
            && self.cpf.is_empty()
            && self.social_insurance.is_empty()
            && self.local.is_empty()
    }
}

/// Collects and validates rate tables before freezing them into a
/// [`RateTableStore`].
#[derive(Debug, Default)]
pub struct RateTableStoreBuilder {
    store: RateTableStore,
}

impl RateTableStoreBuilder {
    /// Adds one bracket schedule for a year.
    ///
    /// Brackets are sorted by lower bound and must then be contiguous, start
    /// below their upper bound, carry rates in `[0, 1]`, and end with an
    /// unbounded bracket.
    ///
    /// # Errors
    /// * [`StoreError::Duplicate`] if the schedule/year pair was already added.
    /// * [`StoreError::InvalidRate`] for a rate outside `[0, 1]`.
    /// * [`StoreError::InvalidSchedule`] when the ordering invariant fails.
    pub fn add_brackets(
        &mut self,
        schedule: BracketSchedule,
        year: i32,
        mut brackets: Vec<Bracket>,
    ) -> Result<&mut Self, StoreError> {
        if self.store.brackets.contains_key(&(schedule.clone(), year)) {
            return Err(StoreError::Duplicate {
                table: schedule.to_string(),
                year,
            });
        }

        brackets.sort_by(|a, b| a.lower_bound.cmp(&b.lower_bound));
        validate_schedule(&schedule, year, &brackets)?;

        self.store.brackets.insert((schedule, year), brackets);
        Ok(self)
    }

    pub fn add_contribution_rate(
        &mut self,
        kind: ContributionKind,
        year: i32,
        rate: ContributionRate,
    ) -> Result<&mut Self, StoreError> {
        for value in [
            Some(rate.employee_rate),
            Some(rate.employer_rate),
            rate.additional_rate,
        ]
        .into_iter()
        .flatten()
        {
            check_rate(kind, year, value)?;
        }
        if self.store.contributions.contains_key(&(kind, year)) {
            return Err(StoreError::Duplicate {
                table: kind.to_string(),
                year,
            });
        }

        self.store.contributions.insert((kind, year), rate);
        Ok(self)
    }

    /// Appends one CPF age band; bands keep their insertion order.
    pub fn add_cpf_rate(
        &mut self,
        year: i32,
        rate: CpfRate,
    ) -> Result<&mut Self, StoreError> {
        check_rate("Singapore CPF", year, rate.employee_rate)?;
        check_rate("Singapore CPF", year, rate.employer_rate)?;
        if rate.min_age > rate.max_age {
            return Err(StoreError::InvalidSchedule {
                table: "Singapore CPF".to_string(),
                year,
                reason: format!("min_age {} exceeds max_age {}", rate.min_age, rate.max_age),
            });
        }

        self.store.cpf.entry(year).or_default().push(rate);
        Ok(self)
    }

    pub fn add_social_insurance(
        &mut self,
        year: i32,
        side: InsuranceSide,
        rates: SocialInsuranceRates,
    ) -> Result<&mut Self, StoreError> {
        let table = format!("China {} social insurance", side.as_str());
        for value in rates.rates.values() {
            check_rate(&table, year, *value)?;
        }
        if self.store.social_insurance.contains_key(&(year, side)) {
            return Err(StoreError::Duplicate { table, year });
        }

        self.store.social_insurance.insert((year, side), rates);
        Ok(self)
    }

    /// Sets the flat local rate for a city. A later row for the same city
    /// replaces the earlier one.
    pub fn add_local_rate(
        &mut self,
        year: i32,
        state: impl Into<String>,
        city: impl Into<String>,
        rate: Decimal,
    ) -> Result<&mut Self, StoreError> {
        check_rate("United States local tax", year, rate)?;

        self.store
            .local
            .entry(year)
            .or_default()
            .entry(state.into())
            .or_default()
            .insert(city.into(), rate);
        Ok(self)
    }

    pub fn build(self) -> RateTableStore {
        let store = self.store;
        info!(
            bracket_schedules = store.brackets.len(),
            contribution_rates = store.contributions.len(),
            cpf_years = store.cpf.len(),
            social_insurance_tables = store.social_insurance.len(),
            local_years = store.local.len(),
            "rate table store built"
        );
        store
    }
}

fn check_rate(
    table: impl ToString,
    year: i32,
    value: Decimal,
) -> Result<(), StoreError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(StoreError::InvalidRate {
            table: table.to_string(),
            year,
            value,
        });
    }
    Ok(())
}

fn validate_schedule(
    schedule: &BracketSchedule,
    year: i32,
    brackets: &[Bracket],
) -> Result<(), StoreError> {
    let invalid = |reason: String| StoreError::InvalidSchedule {
        table: schedule.to_string(),
        year,
        reason,
    };

    let Some(last) = brackets.last() else {
        return Err(invalid("schedule has no brackets".to_string()));
    };
    if !last.is_unbounded() {
        return Err(invalid(format!(
            "top bracket starting at {} must be unbounded",
            last.lower_bound
        )));
    }

    for bracket in brackets {
        check_rate(schedule, year, bracket.rate)?;
        if let Some(upper) = bracket.upper_bound {
            if upper <= bracket.lower_bound {
                return Err(invalid(format!(
                    "bracket upper bound {} is not above lower bound {}",
                    upper, bracket.lower_bound
                )));
            }
        }
    }

    for pair in brackets.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        match current.upper_bound {
            Some(upper) if upper == next.lower_bound => {}
            Some(upper) => {
                return Err(invalid(format!(
                    "gap or overlap between {} and {}",
                    upper, next.lower_bound
                )));
            }
            None => {
                return Err(invalid(format!(
                    "unbounded bracket at {} is not the last one",
                    current.lower_bound
                )));
            }
        }
    }

    Ok(())
}
