//! Per-jurisdiction evaluators.
//!
//! Each evaluator owns a shared handle to the immutable
//! [`RateTableStore`](crate::store::RateTableStore), its policy constants and
//! its region set. Evaluation is a pure function of the input, so evaluators
//! are `Send + Sync` and can be shared freely across threads.

pub mod china;
pub mod singapore;
pub mod united_states;

pub use china::{ChinaBreakdown, ChinaCalculator};
pub use singapore::{CpfContribution, SingaporeBreakdown, SingaporeCalculator};
pub use united_states::{RetirementContribution, UnitedStatesBreakdown, UnitedStatesCalculator};

use crate::breakdown::Breakdown;
use crate::error::EngineError;
use crate::input::CalculationInput;
use crate::models::Jurisdiction;

/// The uniform calculation contract.
pub trait Calculator: Send + Sync {
    fn jurisdiction(&self) -> Jurisdiction;

    /// Years with rate data, newest first.
    fn available_years(&self) -> Vec<i32>;

    fn regions(&self) -> Vec<String>;

    fn subregions(
        &self,
        region: &str,
    ) -> Vec<String>;

    /// Runs the full calculation for one input.
    ///
    /// # Errors
    /// [`EngineError::DataUnavailable`] when a required table has no rows for
    /// `input.year`.
    fn calculate(
        &self,
        input: &CalculationInput,
    ) -> Result<Breakdown, EngineError>;
}
