// Service exports
pub mod cache;
pub mod donors;
pub mod postgres;

pub use cache::{CacheError, CacheStats, IndexCache};
pub use donors::{DonorSource, DonorSourceError};
pub use postgres::{PostgresClient, PostgresError};
