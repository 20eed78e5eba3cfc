//! CSV rate files and the loader that turns them into a
//! [`paytax_core::RateTableStore`].

pub mod loader;
pub mod records;

pub use loader::{RATE_FILES, RateLoader, RateLoaderError};
