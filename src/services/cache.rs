use crate::core::InMemoryDonorIndex;
use crate::services::donors::{DonorSource, DonorSourceError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to load donor index for {year}: {source}")]
    Load {
        year: i32,
        #[source]
        source: Arc<DonorSourceError>,
    },
}

/// Per-year donor index cache
///
/// Each index is built once from the donor source and then shared
/// read-only between requests.
pub struct IndexCache {
    indexes: moka::future::Cache<i32, Arc<InMemoryDonorIndex>>,
}

impl IndexCache {
    pub fn new(max_indexes: u64, ttl_secs: Option<u64>) -> Self {
        let mut builder = moka::future::CacheBuilder::new(max_indexes);
        if let Some(ttl) = ttl_secs {
            builder = builder.time_to_live(Duration::from_secs(ttl));
        }

        Self {
            indexes: builder.build(),
        }
    }

    /// Get the index of a year, building it on first use
    ///
    /// Concurrent requests for the same year share a single build.
    pub async fn get_or_load(
        &self,
        year: i32,
        source: &DonorSource,
        age_top_code: u32,
    ) -> Result<Arc<InMemoryDonorIndex>, CacheError> {
        if let Some(index) = self.indexes.get(&year).await {
            tracing::trace!("Donor index cache hit: {}", year);
            return Ok(index);
        }

        tracing::debug!("Donor index cache miss: {}", year);
        self.indexes
            .try_get_with(year, async {
                source.build_index(year, age_top_code).await.map(Arc::new)
            })
            .await
            .map_err(|source| CacheError::Load { year, source })
    }

    /// Install a prebuilt index
    pub async fn insert(&self, year: i32, index: InMemoryDonorIndex) {
        self.indexes.insert(year, Arc::new(index)).await;
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            loaded_indexes: self.indexes.entry_count(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub loaded_indexes: u64,
}
