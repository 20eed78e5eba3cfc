use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Failures surfaced to callers of the calculation engine.
///
/// Every variant is a value-level failure; nothing in the engine panics on bad
/// input or a missing year.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("No {table} data available for year {year}")]
    DataUnavailable { table: String, year: i32 },

    #[error("Unsupported jurisdiction: {0}")]
    UnsupportedJurisdiction(String),

    #[error("Malformed {field}: {reason}")]
    MalformedInput { field: &'static str, reason: String },

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Rate table error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DataUnavailable { table, year } => Self::DataUnavailable { table, year },
            other => Self::Store(other),
        }
    }
}

impl EngineError {
    pub fn malformed(
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedInput {
            field,
            reason: reason.into(),
        }
    }

    /// Year named by a [`Self::DataUnavailable`] failure.
    pub fn missing_year(&self) -> Option<i32> {
        match self {
            Self::DataUnavailable { year, .. } => Some(*year),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn store_data_unavailable_maps_across() {
        let err: EngineError = StoreError::DataUnavailable {
            table: "Singapore CPF".to_string(),
            year: 2019,
        }
        .into();

        assert_eq!(
            err,
            EngineError::DataUnavailable {
                table: "Singapore CPF".to_string(),
                year: 2019,
            }
        );
        assert_eq!(err.missing_year(), Some(2019));
        assert_eq!(err.to_string(), "No Singapore CPF data available for year 2019");
    }

    #[test]
    fn other_store_errors_are_wrapped() {
        let err: EngineError = StoreError::Duplicate {
            table: "United States federal tax".to_string(),
            year: 2024,
        }
        .into();

        assert!(matches!(err, EngineError::Store(StoreError::Duplicate { .. })));
        assert_eq!(err.missing_year(), None);
    }

    #[test]
    fn unsupported_jurisdiction_message() {
        let err = EngineError::UnsupportedJurisdiction("Atlantis".to_string());

        assert_eq!(err.to_string(), "Unsupported jurisdiction: Atlantis");
    }
}
