//! Importers feeding the scenario engine: ledger CSV files into the
//! transaction store, and scenario request files into [`ScenarioRequest`]s.
//!
//! [`ScenarioRequest`]: scenario_core::ScenarioRequest

mod loader;
mod request;

pub use loader::{TransactionCsvRecord, TransactionLoader, TransactionLoaderError};
pub use request::{ScenarioEntry, ScenarioRequestError, ScenarioRequestFile};
