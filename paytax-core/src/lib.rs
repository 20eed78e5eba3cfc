pub mod breakdown;
pub mod calculations;
pub mod config;
pub mod error;
pub mod input;
pub mod jurisdictions;
pub mod models;
pub mod regions;
pub mod registry;
pub mod store;

pub use breakdown::Breakdown;
pub use config::{ChinaConfig, ConfigError, EngineConfig, SingaporeConfig, UnitedStatesConfig};
pub use error::EngineError;
pub use input::{
    CalculationInput, CalculationRequest, Extras, MAX_INCOME, RawCalculationRequest, RetirementElection,
};
pub use jurisdictions::Calculator;
pub use models::*;
pub use regions::{RegionCatalog, RegionSet};
pub use registry::CalculatorRegistry;
pub use store::{RateTableStore, RateTableStoreBuilder, StoreError};
