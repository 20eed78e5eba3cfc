use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use paytax_core::{
    Bracket, BracketSchedule, ContributionKind, ContributionRate, CpfRate, InsuranceSide,
    RateTableStore, RateTableStoreBuilder, SocialInsuranceRates, StoreError,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::records::{
    ChinaTaxRecord, CpfRecord, LocalTaxRecord, MedicareRecord, SingaporeTaxRecord,
    SocialInsuranceRecord, SocialSecurityRecord, StateTaxRecord, ThresholdRecord,
};

pub const SG_TAX_FILE: &str = "sg_tax_rates.csv";
pub const SG_CPF_FILE: &str = "sg_cpf_rates.csv";
pub const US_FEDERAL_FILE: &str = "us_federal_tax_rates.csv";
pub const US_STATE_FILE: &str = "us_state_tax_rates.csv";
pub const US_LOCAL_FILE: &str = "us_local_tax_rates.csv";
pub const US_SOCIAL_SECURITY_FILE: &str = "us_social_security_rates.csv";
pub const US_MEDICARE_FILE: &str = "us_medicare_rates.csv";
pub const CN_RESIDENT_FILE: &str = "cn_resident_tax_rates.csv";
pub const CN_NON_RESIDENT_FILE: &str = "cn_non_resident_tax_rates.csv";
pub const CN_SOCIAL_INSURANCE_FILE: &str = "cn_social_insurance_rates.csv";

/// Every file a complete data directory must contain.
pub const RATE_FILES: [&str; 10] = [
    SG_TAX_FILE,
    SG_CPF_FILE,
    US_FEDERAL_FILE,
    US_STATE_FILE,
    US_LOCAL_FILE,
    US_SOCIAL_SECURITY_FILE,
    US_MEDICARE_FILE,
    CN_RESIDENT_FILE,
    CN_NON_RESIDENT_FILE,
    CN_SOCIAL_INSURANCE_FILE,
];

/// Errors that can occur when loading rate data. All of them are fatal at
/// startup.
#[derive(Debug, Error)]
pub enum RateLoaderError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}: CSV parse error: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{file}: missing required column '{column}'")]
    MissingColumn {
        file: &'static str,
        column: &'static str,
    },

    #[error("{file} row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        file: &'static str,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{file}: {source}")]
    Store {
        file: &'static str,
        #[source]
        source: StoreError,
    },
}

impl RateLoaderError {
    fn store(file: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { file, source }
    }
}

fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(text.as_bytes())
}

fn parse_records<T: DeserializeOwned>(
    file: &'static str,
    text: &str,
) -> Result<Vec<T>, RateLoaderError> {
    let records = csv_reader(text)
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| RateLoaderError::Csv { file, source })?;
    debug!(file, rows = records.len(), "parsed rate file");
    Ok(records)
}

/// Turns `(threshold, rate)` rows into brackets whose upper bound is the next
/// threshold. The highest threshold is unbounded.
fn threshold_brackets(mut rows: Vec<(Decimal, Decimal)>) -> Vec<Bracket> {
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    let uppers = rows
        .iter()
        .skip(1)
        .map(|(threshold, _)| Some(*threshold))
        .chain(std::iter::once(None));

    rows.iter()
        .zip(uppers)
        .map(|((lower, rate), upper)| Bracket::new(*lower, upper, *rate))
        .collect()
}

/// Loader for the ten rate files that make up a [`RateTableStore`].
///
/// Each `parse_*` function reads one file's text; [`RateLoader::load_with`]
/// drives them all and validates the result through the store builder.
pub struct RateLoader;

impl RateLoader {
    pub fn parse_singapore_tax(text: &str) -> Result<Vec<SingaporeTaxRecord>, RateLoaderError> {
        parse_records(SG_TAX_FILE, text)
    }

    pub fn parse_cpf(text: &str) -> Result<Vec<CpfRecord>, RateLoaderError> {
        parse_records(SG_CPF_FILE, text)
    }

    pub fn parse_federal(text: &str) -> Result<Vec<ThresholdRecord>, RateLoaderError> {
        parse_records(US_FEDERAL_FILE, text)
    }

    pub fn parse_state(text: &str) -> Result<Vec<StateTaxRecord>, RateLoaderError> {
        parse_records(US_STATE_FILE, text)
    }

    pub fn parse_local(text: &str) -> Result<Vec<LocalTaxRecord>, RateLoaderError> {
        parse_records(US_LOCAL_FILE, text)
    }

    pub fn parse_social_security(
        text: &str
    ) -> Result<Vec<SocialSecurityRecord>, RateLoaderError> {
        parse_records(US_SOCIAL_SECURITY_FILE, text)
    }

    pub fn parse_medicare(text: &str) -> Result<Vec<MedicareRecord>, RateLoaderError> {
        parse_records(US_MEDICARE_FILE, text)
    }

    pub fn parse_china_tax(
        file: &'static str,
        text: &str,
    ) -> Result<Vec<ChinaTaxRecord>, RateLoaderError> {
        parse_records(file, text)
    }

    /// Parses the social insurance file, whose category columns are not
    /// fixed. `year` and `category` are required; every other column is a
    /// category rate.
    pub fn parse_social_insurance(
        text: &str
    ) -> Result<Vec<SocialInsuranceRecord>, RateLoaderError> {
        let file = CN_SOCIAL_INSURANCE_FILE;
        let csv_error = |source| RateLoaderError::Csv { file, source };

        let mut reader = csv_reader(text);
        let headers = reader.headers().map_err(csv_error)?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(RateLoaderError::MissingColumn { file, column: name })
        };
        let year_idx = column("year")?;
        let side_idx = column("category")?;

        let mut records = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let row = result.map_err(csv_error)?;
            let row_number = idx + 1;
            let invalid = |column: &str, value: &str| RateLoaderError::InvalidValue {
                file,
                row: row_number,
                column: column.to_string(),
                value: value.to_string(),
            };

            let year_text = row.get(year_idx).unwrap_or_default();
            let year = year_text
                .parse::<i32>()
                .map_err(|_| invalid("year", year_text))?;
            let side_text = row.get(side_idx).unwrap_or_default();
            let side = InsuranceSide::parse(side_text).ok_or_else(|| invalid("category", side_text))?;

            let mut rates = BTreeMap::new();
            for (col, name) in headers.iter().enumerate() {
                if col == year_idx || col == side_idx {
                    continue;
                }
                let value_text = row.get(col).unwrap_or_default();
                let value = value_text
                    .parse::<Decimal>()
                    .map_err(|_| invalid(name, value_text))?;
                rates.insert(name.to_string(), value);
            }

            records.push(SocialInsuranceRecord { year, side, rates });
        }

        debug!(file, rows = records.len(), "parsed rate file");
        Ok(records)
    }

    /// Builds a store from a data directory containing every file in
    /// [`RATE_FILES`].
    ///
    /// # Errors
    /// * [`RateLoaderError::Io`] if a file is missing or unreadable.
    /// * Any parse or validation error from [`RateLoader::load_with`].
    pub fn load_dir(dir: &Path) -> Result<RateTableStore, RateLoaderError> {
        info!(dir = %dir.display(), "loading rate tables");
        Self::load_with(|file| {
            let path = dir.join(file);
            std::fs::read_to_string(&path).map_err(|source| RateLoaderError::Io { path, source })
        })
    }

    /// Builds a store from the copies of the rate files compiled into this
    /// crate.
    pub fn bundled() -> Result<RateTableStore, RateLoaderError> {
        Self::load_with(|file| {
            bundled_file(file)
                .map(str::to_string)
                .ok_or_else(|| RateLoaderError::Io {
                    path: PathBuf::from(file),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
        })
    }

    /// Reads every rate file through `read` and loads it into a fresh store.
    pub fn load_with<F>(mut read: F) -> Result<RateTableStore, RateLoaderError>
    where
        F: FnMut(&'static str) -> Result<String, RateLoaderError>,
    {
        let mut builder = RateTableStore::builder();

        load_singapore_tax(&mut builder, &read(SG_TAX_FILE)?)?;
        load_cpf(&mut builder, &read(SG_CPF_FILE)?)?;
        load_federal(&mut builder, &read(US_FEDERAL_FILE)?)?;
        load_state(&mut builder, &read(US_STATE_FILE)?)?;
        load_local(&mut builder, &read(US_LOCAL_FILE)?)?;
        load_social_security(&mut builder, &read(US_SOCIAL_SECURITY_FILE)?)?;
        load_medicare(&mut builder, &read(US_MEDICARE_FILE)?)?;
        load_china_tax(
            &mut builder,
            CN_RESIDENT_FILE,
            BracketSchedule::ChinaResident,
            &read(CN_RESIDENT_FILE)?,
        )?;
        load_china_tax(
            &mut builder,
            CN_NON_RESIDENT_FILE,
            BracketSchedule::ChinaNonResidentMonthly,
            &read(CN_NON_RESIDENT_FILE)?,
        )?;
        load_social_insurance(&mut builder, &read(CN_SOCIAL_INSURANCE_FILE)?)?;

        Ok(builder.build())
    }
}

fn bundled_file(file: &str) -> Option<&'static str> {
    let text = match file {
        SG_TAX_FILE => include_str!("../data/sg_tax_rates.csv"),
        SG_CPF_FILE => include_str!("../data/sg_cpf_rates.csv"),
        US_FEDERAL_FILE => include_str!("../data/us_federal_tax_rates.csv"),
        US_STATE_FILE => include_str!("../data/us_state_tax_rates.csv"),
        US_LOCAL_FILE => include_str!("../data/us_local_tax_rates.csv"),
        US_SOCIAL_SECURITY_FILE => include_str!("../data/us_social_security_rates.csv"),
        US_MEDICARE_FILE => include_str!("../data/us_medicare_rates.csv"),
        CN_RESIDENT_FILE => include_str!("../data/cn_resident_tax_rates.csv"),
        CN_NON_RESIDENT_FILE => include_str!("../data/cn_non_resident_tax_rates.csv"),
        CN_SOCIAL_INSURANCE_FILE => include_str!("../data/cn_social_insurance_rates.csv"),
        _ => return None,
    };
    Some(text)
}

fn load_singapore_tax(
    builder: &mut RateTableStoreBuilder,
    text: &str,
) -> Result<(), RateLoaderError> {
    let mut by_year: BTreeMap<i32, Vec<Bracket>> = BTreeMap::new();
    for record in RateLoader::parse_singapore_tax(text)? {
        let upper = record
            .chargeable_income
            .map(|span| record.income_threshold + span);
        by_year
            .entry(record.year)
            .or_default()
            .push(Bracket::new(record.income_threshold, upper, record.rate));
    }

    for (year, brackets) in by_year {
        builder
            .add_brackets(BracketSchedule::SingaporeResident, year, brackets)
            .map_err(RateLoaderError::store(SG_TAX_FILE))?;
    }
    Ok(())
}

fn load_cpf(
    builder: &mut RateTableStoreBuilder,
    text: &str,
) -> Result<(), RateLoaderError> {
    for record in RateLoader::parse_cpf(text)? {
        let rate = CpfRate {
            min_age: record.min_age,
            max_age: record.max_age,
            employee_rate: record.employee_rate,
            employer_rate: record.employer_rate,
        };
        builder
            .add_cpf_rate(record.year, rate)
            .map_err(RateLoaderError::store(SG_CPF_FILE))?;
    }
    Ok(())
}

fn load_federal(
    builder: &mut RateTableStoreBuilder,
    text: &str,
) -> Result<(), RateLoaderError> {
    let mut by_year: BTreeMap<i32, Vec<(Decimal, Decimal)>> = BTreeMap::new();
    for record in RateLoader::parse_federal(text)? {
        by_year
            .entry(record.year)
            .or_default()
            .push((record.income_threshold, record.rate));
    }

    for (year, rows) in by_year {
        builder
            .add_brackets(BracketSchedule::UsFederal, year, threshold_brackets(rows))
            .map_err(RateLoaderError::store(US_FEDERAL_FILE))?;
    }
    Ok(())
}

fn load_state(
    builder: &mut RateTableStoreBuilder,
    text: &str,
) -> Result<(), RateLoaderError> {
    let mut by_state: BTreeMap<(i32, String), Vec<(Decimal, Decimal)>> = BTreeMap::new();
    for record in RateLoader::parse_state(text)? {
        by_state
            .entry((record.year, record.state))
            .or_default()
            .push((record.income_threshold, record.rate));
    }

    for ((year, state), rows) in by_state {
        builder
            .add_brackets(BracketSchedule::UsState(state), year, threshold_brackets(rows))
            .map_err(RateLoaderError::store(US_STATE_FILE))?;
    }
    Ok(())
}

fn load_local(
    builder: &mut RateTableStoreBuilder,
    text: &str,
) -> Result<(), RateLoaderError> {
    for record in RateLoader::parse_local(text)? {
        builder
            .add_local_rate(record.year, record.state, record.city, record.rate)
            .map_err(RateLoaderError::store(US_LOCAL_FILE))?;
    }
    Ok(())
}

fn load_social_security(
    builder: &mut RateTableStoreBuilder,
    text: &str,
) -> Result<(), RateLoaderError> {
    for record in RateLoader::parse_social_security(text)? {
        let rate = ContributionRate::new(record.employee_rate, record.employer_rate)
            .with_wage_base(record.wage_base);
        builder
            .add_contribution_rate(ContributionKind::UsSocialSecurity, record.year, rate)
            .map_err(RateLoaderError::store(US_SOCIAL_SECURITY_FILE))?;
    }
    Ok(())
}

fn load_medicare(
    builder: &mut RateTableStoreBuilder,
    text: &str,
) -> Result<(), RateLoaderError> {
    for record in RateLoader::parse_medicare(text)? {
        let rate = ContributionRate::new(record.employee_rate, record.employer_rate)
            .with_additional(record.additional_rate, record.additional_threshold_single);
        builder
            .add_contribution_rate(ContributionKind::UsMedicare, record.year, rate)
            .map_err(RateLoaderError::store(US_MEDICARE_FILE))?;
    }
    Ok(())
}

fn load_china_tax(
    builder: &mut RateTableStoreBuilder,
    file: &'static str,
    schedule: BracketSchedule,
    text: &str,
) -> Result<(), RateLoaderError> {
    let mut by_year: BTreeMap<i32, Vec<Bracket>> = BTreeMap::new();
    for record in RateLoader::parse_china_tax(file, text)? {
        by_year.entry(record.year).or_default().push(
            Bracket::new(
                record.taxable_income_min,
                record.taxable_income_max,
                record.tax_rate,
            )
            .with_quick_deduction(record.quick_deduction),
        );
    }

    for (year, brackets) in by_year {
        builder
            .add_brackets(schedule.clone(), year, brackets)
            .map_err(RateLoaderError::store(file))?;
    }
    Ok(())
}

fn load_social_insurance(
    builder: &mut RateTableStoreBuilder,
    text: &str,
) -> Result<(), RateLoaderError> {
    for record in RateLoader::parse_social_insurance(text)? {
        builder
            .add_social_insurance(
                record.year,
                record.side,
                SocialInsuranceRates {
                    rates: record.rates,
                },
            )
            .map_err(RateLoaderError::store(CN_SOCIAL_INSURANCE_FILE))?;
    }
    Ok(())
}
