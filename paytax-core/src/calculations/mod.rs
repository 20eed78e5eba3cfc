//! Shared arithmetic used by every jurisdiction calculator.
//!
//! [`common`] holds rounding and clamping helpers, and [`progressive`]
//! holds the two bracket evaluation strategies.

pub mod common;
pub mod progressive;

pub use progressive::{cumulative_marginal_tax, quick_deduction_tax};
