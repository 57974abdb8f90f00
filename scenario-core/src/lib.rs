pub mod calculations;
pub mod db;
pub mod models;

pub use db::repository::{
    RateCacheRepository, RepositoryError, ScenarioStore, TransactionRepository,
};
pub use models::*;
