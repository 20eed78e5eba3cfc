use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Datelike;
use tracing::{debug, warn};

use crate::breakdown::Breakdown;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::input::{CalculationInput, RawCalculationRequest};
use crate::jurisdictions::{
    Calculator, ChinaCalculator, SingaporeCalculator, UnitedStatesCalculator,
};
use crate::models::Jurisdiction;
use crate::regions::RegionCatalog;
use crate::store::RateTableStore;

/// Registry of [`Calculator`] instances, keyed by jurisdiction.
///
/// Typical lifetime:
/// 1. Build the shared [`RateTableStore`] once at startup.
/// 2. Create with [`CalculatorRegistry::standard`] (or `new` plus `register`).
/// 3. Share the registry read-only; every lookup and calculation takes `&self`.
pub struct CalculatorRegistry {
    calculators: BTreeMap<Jurisdiction, Box<dyn Calculator>>,
}

impl CalculatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            calculators: BTreeMap::new(),
        }
    }

    /// Registry with the Singapore, United States and China calculators, all
    /// reading from `store` and the standard region catalog.
    ///
    /// # Errors
    /// [`EngineError::InvalidConfig`] if `config` fails validation.
    pub fn standard(
        store: Arc<RateTableStore>,
        config: &EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let catalog = RegionCatalog::standard();

        let mut registry = Self::new();
        registry.register(Box::new(SingaporeCalculator::new(
            Arc::clone(&store),
            config.singapore.clone(),
            catalog.region_set(Jurisdiction::Singapore),
        )));
        registry.register(Box::new(UnitedStatesCalculator::new(
            Arc::clone(&store),
            config.united_states.clone(),
            catalog.region_set(Jurisdiction::UnitedStates),
        )));
        registry.register(Box::new(ChinaCalculator::new(
            store,
            config.china.clone(),
            catalog.region_set(Jurisdiction::China),
        )));
        Ok(registry)
    }

    /// Register a calculator, replacing any existing one for the same
    /// jurisdiction.
    pub fn register(
        &mut self,
        calculator: Box<dyn Calculator>,
    ) {
        self.calculators.insert(calculator.jurisdiction(), calculator);
    }

    /// Resolve a jurisdiction by display name ("Singapore", "United States",
    /// "China").
    ///
    /// # Errors
    /// [`EngineError::UnsupportedJurisdiction`] for an unknown or unregistered
    /// name.
    pub fn resolve(
        &self,
        name: &str,
    ) -> Result<&dyn Calculator, EngineError> {
        Jurisdiction::parse(name)
            .and_then(|j| self.calculators.get(&j))
            .map(|calculator| &**calculator)
            .ok_or_else(|| EngineError::UnsupportedJurisdiction(name.to_string()))
    }

    /// Display names of registered jurisdictions in canonical order.
    pub fn list_jurisdictions(&self) -> Vec<&'static str> {
        self.calculators
            .keys()
            .map(Jurisdiction::display_name)
            .collect()
    }

    /// Union of every calculator's years, newest first.
    pub fn list_years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self
            .calculators
            .values()
            .flat_map(|calculator| calculator.available_years())
            .collect();
        years.into_iter().rev().collect()
    }

    pub fn regions(
        &self,
        jurisdiction: &str,
    ) -> Result<Vec<String>, EngineError> {
        Ok(self.resolve(jurisdiction)?.regions())
    }

    pub fn subregions(
        &self,
        jurisdiction: &str,
        region: &str,
    ) -> Result<Vec<String>, EngineError> {
        Ok(self.resolve(jurisdiction)?.subregions(region))
    }

    /// Resolve and run one calculation.
    pub fn calculate(
        &self,
        jurisdiction: &str,
        input: &CalculationInput,
    ) -> Result<Breakdown, EngineError> {
        let calculator = self.resolve(jurisdiction)?;
        debug!(
            jurisdiction,
            year = input.year,
            is_resident = input.is_resident,
            "calculating"
        );

        calculator.calculate(input).inspect_err(|err| {
            warn!(jurisdiction, year = input.year, error = %err, "calculation failed");
        })
    }

    /// Sanitize a raw request and calculate it, defaulting the year to
    /// `default_year`.
    pub fn calculate_request_for_year(
        &self,
        raw: &RawCalculationRequest,
        default_year: i32,
    ) -> Result<Breakdown, EngineError> {
        let request = raw.sanitize(default_year)?;
        self.calculate(&request.jurisdiction, &request.input)
    }

    /// Like [`Self::calculate_request_for_year`] with the current calendar
    /// year as the default.
    pub fn calculate_request(
        &self,
        raw: &RawCalculationRequest,
    ) -> Result<Breakdown, EngineError> {
        self.calculate_request_for_year(raw, chrono::Local::now().year())
    }
}

impl Default for CalculatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// tests
// ─────────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{Bracket, BracketSchedule};

    struct FixedCalculator {
        jurisdiction: Jurisdiction,
        years: Vec<i32>,
    }

    impl Calculator for FixedCalculator {
        fn jurisdiction(&self) -> Jurisdiction {
            self.jurisdiction
        }

        fn available_years(&self) -> Vec<i32> {
            self.years.clone()
        }

        fn regions(&self) -> Vec<String> {
            vec!["Somewhere".to_string()]
        }

        fn subregions(
            &self,
            region: &str,
        ) -> Vec<String> {
            vec![format!("{region} City")]
        }

        fn calculate(
            &self,
            input: &CalculationInput,
        ) -> Result<Breakdown, EngineError> {
            Ok(Breakdown::new(self.jurisdiction, input.year, input.is_resident)
                .with("gross_income", input.income))
        }
    }

    fn fixed(
        jurisdiction: Jurisdiction,
        years: &[i32],
    ) -> Box<dyn Calculator> {
        Box::new(FixedCalculator {
            jurisdiction,
            years: years.to_vec(),
        })
    }

    #[test]
    fn empty_registry_lists_nothing() {
        let registry = CalculatorRegistry::new();

        assert!(registry.list_jurisdictions().is_empty());
        assert!(registry.list_years().is_empty());
    }

    #[test]
    fn jurisdictions_listed_in_canonical_order() {
        let mut registry = CalculatorRegistry::new();
        registry.register(fixed(Jurisdiction::China, &[]));
        registry.register(fixed(Jurisdiction::Singapore, &[]));
        registry.register(fixed(Jurisdiction::UnitedStates, &[]));

        assert_eq!(
            registry.list_jurisdictions(),
            vec!["Singapore", "United States", "China"]
        );
    }

    #[test]
    fn years_are_union_sorted_descending() {
        let mut registry = CalculatorRegistry::new();
        registry.register(fixed(Jurisdiction::Singapore, &[2024, 2023]));
        registry.register(fixed(Jurisdiction::China, &[2025, 2024, 2022]));

        assert_eq!(registry.list_years(), vec![2025, 2024, 2023, 2022]);
    }

    #[test]
    fn register_replaces_existing_calculator() {
        let mut registry = CalculatorRegistry::new();
        registry.register(fixed(Jurisdiction::Singapore, &[2020]));
        registry.register(fixed(Jurisdiction::Singapore, &[2024]));

        assert_eq!(registry.list_years(), vec![2024]);
    }

    #[test]
    fn resolve_unknown_name() {
        let registry = CalculatorRegistry::new();

        let err = registry.calculate("Atlantis", &CalculationInput::new(dec!(1), 2024));

        assert_eq!(
            err.unwrap_err(),
            EngineError::UnsupportedJurisdiction("Atlantis".to_string())
        );
    }

    #[test]
    fn resolve_known_but_unregistered_name() {
        let mut registry = CalculatorRegistry::new();
        registry.register(fixed(Jurisdiction::Singapore, &[]));

        assert!(matches!(
            registry.regions("China"),
            Err(EngineError::UnsupportedJurisdiction(name)) if name == "China"
        ));
    }

    #[test]
    fn regions_and_subregions_delegate() {
        let mut registry = CalculatorRegistry::new();
        registry.register(fixed(Jurisdiction::UnitedStates, &[]));

        assert_eq!(registry.regions("United States").unwrap(), vec!["Somewhere"]);
        assert_eq!(
            registry.subregions("United States", "Ohio").unwrap(),
            vec!["Ohio City"]
        );
    }

    #[test]
    fn raw_request_uses_default_year() {
        let mut registry = CalculatorRegistry::new();
        registry.register(fixed(Jurisdiction::China, &[]));
        let raw = RawCalculationRequest {
            country: Some("China".to_string()),
            income: Some("1,000".to_string()),
            ..Default::default()
        };

        let breakdown = registry.calculate_request_for_year(&raw, 2031).unwrap();

        assert_eq!(breakdown.year, 2031);
        assert_eq!(breakdown.get("gross_income"), Some(dec!(1000)));
    }

    #[test]
    fn standard_registry_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.china.employer_social_insurance_rate = dec!(7);

        let result = CalculatorRegistry::standard(Arc::new(RateTableStore::default()), &config);

        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn standard_registry_wires_store_and_catalog() {
        let mut builder = RateTableStore::builder();
        builder
            .add_brackets(
                BracketSchedule::UsFederal,
                2024,
                vec![Bracket::new(dec!(0), None, dec!(0.10))],
            )
            .unwrap();
        let store = Arc::new(builder.build());

        let registry = CalculatorRegistry::standard(store, &EngineConfig::default()).unwrap();

        assert_eq!(registry.list_jurisdictions().len(), 3);
        assert_eq!(registry.list_years(), vec![2024]);
        assert_eq!(registry.regions("China").unwrap().len(), 7);
        assert_eq!(registry.subregions("Singapore", "x").unwrap(), vec!["Singapore"]);
    }
}
