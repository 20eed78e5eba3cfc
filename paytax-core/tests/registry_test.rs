//! Registry behaviour with fabricated rate tables: sharing across tasks,
//! idempotence and the log lines emitted for lenient fallbacks.

use std::io;
use std::sync::{Arc, Mutex};

use paytax_core::{
    Bracket, BracketSchedule, CalculationInput, CalculatorRegistry, ContributionKind,
    ContributionRate, CpfRate, EngineConfig, EngineError, InsuranceSide, RateTableStore,
    RawCalculationRequest, SocialInsuranceRates,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tracing_subscriber::fmt::MakeWriter;

const YEAR: i32 = 2024;

fn fabricated_store() -> Arc<RateTableStore> {
    let mut builder = RateTableStore::builder();
    builder
        .add_brackets(
            BracketSchedule::SingaporeResident,
            YEAR,
            vec![
                Bracket::new(dec!(0), Some(dec!(20000)), dec!(0)),
                Bracket::new(dec!(20000), None, dec!(0.10)),
            ],
        )
        .unwrap()
        .add_cpf_rate(
            YEAR,
            CpfRate {
                min_age: 0,
                max_age: 55,
                employee_rate: dec!(0.20),
                employer_rate: dec!(0.17),
            },
        )
        .unwrap()
        .add_brackets(
            BracketSchedule::UsFederal,
            YEAR,
            vec![
                Bracket::new(dec!(0), Some(dec!(10000)), dec!(0.10)),
                Bracket::new(dec!(10000), None, dec!(0.20)),
            ],
        )
        .unwrap()
        .add_contribution_rate(
            ContributionKind::UsSocialSecurity,
            YEAR,
            ContributionRate::new(dec!(0.062), dec!(0.062)).with_wage_base(dec!(168600)),
        )
        .unwrap()
        .add_contribution_rate(
            ContributionKind::UsMedicare,
            YEAR,
            ContributionRate::new(dec!(0.0145), dec!(0.0145)).with_additional(dec!(0.009), dec!(200000)),
        )
        .unwrap()
        .add_brackets(
            BracketSchedule::ChinaResident,
            YEAR,
            vec![Bracket::new(dec!(0), None, dec!(0.03)).with_quick_deduction(dec!(0))],
        )
        .unwrap()
        .add_brackets(
            BracketSchedule::ChinaNonResidentMonthly,
            YEAR,
            vec![Bracket::new(dec!(0), None, dec!(0.03)).with_quick_deduction(dec!(0))],
        )
        .unwrap()
        .add_social_insurance(
            YEAR,
            InsuranceSide::Employee,
            SocialInsuranceRates {
                rates: [("pension".to_string(), dec!(0.08))].into_iter().collect(),
            },
        )
        .unwrap();
    Arc::new(builder.build())
}

fn registry() -> Arc<CalculatorRegistry> {
    Arc::new(
        CalculatorRegistry::standard(fabricated_store(), &EngineConfig::default()).unwrap(),
    )
}

// =============================================================================
// concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_registry_gives_same_results_across_tasks() {
    let registry = registry();
    let input = CalculationInput::new(dec!(100000), YEAR).with_region("Texas", "Austin");
    let expected = registry.calculate("United States", &input).unwrap();

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let input = input.clone();
            tokio::spawn(async move {
                let jurisdiction = ["Singapore", "United States", "China"][i % 3];
                let other = registry.calculate(jurisdiction, &input);
                (registry.calculate("United States", &input), other)
            })
        })
        .collect();

    for handle in handles {
        let (us, other) = handle.await.unwrap();
        assert_eq!(us.unwrap(), expected);
        assert!(other.is_ok());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_lookups_do_not_disturb_other_tasks() {
    let registry = registry();

    let missing = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            registry.calculate("China", &CalculationInput::new(dec!(100000), 1990))
        })
    };
    let present = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            registry.calculate("China", &CalculationInput::new(dec!(100000), YEAR))
        })
    };

    assert!(matches!(
        missing.await.unwrap(),
        Err(EngineError::DataUnavailable { year: 1990, .. })
    ));
    assert_eq!(
        present.await.unwrap().unwrap().get("income_tax"),
        Some(dec!(960))
    );
}

// =============================================================================
// idempotence
// =============================================================================

#[test]
fn repeated_raw_requests_are_identical() {
    let registry = registry();
    let raw = RawCalculationRequest {
        country: Some("Singapore".to_string()),
        income: Some("90,000".to_string()),
        age: Some("not an age".to_string()),
        tax_year: Some(YEAR.to_string()),
        ..Default::default()
    };

    let first = registry.calculate_request(&raw).unwrap();
    let second = registry.calculate_request(&raw).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.get("income_tax"), Some(dec!(7000)));
    assert_eq!(first.get("employee_cpf_contribution"), Some(dec!(16320)));
}

#[test]
fn non_integer_year_is_rejected_before_calculation() {
    let raw = RawCalculationRequest {
        country: Some("China".to_string()),
        income: Some("1000".to_string()),
        tax_year: Some("2024.5".to_string()),
        ..Default::default()
    };

    let err = registry().calculate_request(&raw).unwrap_err();

    assert!(matches!(err, EngineError::MalformedInput { field: "tax-year", .. }));
}

// =============================================================================
// logging
// =============================================================================

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn fallbacks_are_logged() {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();
    let registry = registry();

    tracing::subscriber::with_default(subscriber, || {
        let input = CalculationInput::new(dec!(50000), YEAR).with_region("Ohio", "Dayton");
        registry.calculate("United States", &input).unwrap();

        let raw = RawCalculationRequest {
            country: Some("China".to_string()),
            income: Some("lots".to_string()),
            tax_year: Some(YEAR.to_string()),
            ..Default::default()
        };
        registry.calculate_request(&raw).unwrap();
    });

    let logs = captured.contents();
    assert!(logs.contains("WARN"), "{logs}");
    assert!(logs.contains("no state tax schedule"), "{logs}");
    assert!(logs.contains("no local tax rate"), "{logs}");
    assert!(logs.contains("lots"), "{logs}");
}
