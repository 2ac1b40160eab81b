use crate::core::InMemoryDonorIndex;
use crate::error::ImputeError;
use crate::models::DonorRecord;
use crate::services::postgres::{PostgresClient, PostgresError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while loading a donor population
#[derive(Debug, Error)]
pub enum DonorSourceError {
    #[error("Database error: {0}")]
    Postgres(#[from] PostgresError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid donor file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid donor population: {0}")]
    Invalid(#[from] ImputeError),

    #[error("No donor households for year {0}")]
    EmptyPopulation(i32),
}

/// Where donor populations come from
#[derive(Clone)]
pub enum DonorSource {
    Postgres(Arc<PostgresClient>),
    /// Directory of `donors_{year}.json` files, each an array of donor records
    Files { directory: PathBuf },
}

impl DonorSource {
    /// Load the donor population of a policy year, ordered by donor id
    pub async fn load(&self, year: i32) -> Result<Vec<DonorRecord>, DonorSourceError> {
        let mut donors = match self {
            DonorSource::Postgres(client) => client.load_donors(year).await?,
            DonorSource::Files { directory } => {
                let path = directory.join(format!("donors_{}.json", year));
                let display = path.display().to_string();
                let bytes = tokio::fs::read(&path).await.map_err(|source| DonorSourceError::Io {
                    path: display.clone(),
                    source,
                })?;
                let mut donors: Vec<DonorRecord> = serde_json::from_slice(&bytes)
                    .map_err(|source| DonorSourceError::Parse { path: display, source })?;
                donors.sort_by_key(|donor| donor.donor_id);
                donors
            }
        };

        if donors.is_empty() {
            return Err(DonorSourceError::EmptyPopulation(year));
        }

        donors.shrink_to_fit();
        Ok(donors)
    }

    /// Load a year's donors and build its read-only index
    pub async fn build_index(
        &self,
        year: i32,
        age_top_code: u32,
    ) -> Result<InMemoryDonorIndex, DonorSourceError> {
        let donors = self.load(year).await?;
        let index = InMemoryDonorIndex::build(donors, age_top_code)?;

        tracing::info!(
            "Donor index for {} ready: {} donors, {} keys",
            year,
            index.donors().len(),
            index.key_count()
        );

        Ok(index)
    }

    pub async fn health_check(&self) -> bool {
        match self {
            DonorSource::Postgres(client) => client.health_check().await.unwrap_or(false),
            DonorSource::Files { directory } => tokio::fs::metadata(directory)
                .await
                .map(|meta| meta.is_dir())
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = DonorSource::Files {
            directory: PathBuf::from("/nonexistent/donor/dir"),
        };

        let err = source.load(2024).await.unwrap_err();
        assert!(matches!(err, DonorSourceError::Io { .. }));
        assert!(!source.health_check().await);
    }

    #[tokio::test]
    async fn test_load_from_file_sorted() {
        let directory = std::env::temp_dir().join(format!("donor-impute-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&directory).await.unwrap();

        let json = r#"[
            {"donorId": 9, "profile": {"occupancy": "singleMale", "region": "UKI", "numberOfChildren": 0,
             "male": {"age": 40, "potentialHourlyWage": 12.0, "labour": "40h+"}},
             "grossIncome": 2000.0, "disposableIncome": 1600.0, "disposableToGrossRatio": 0.8},
            {"donorId": 3, "profile": {"occupancy": "singleFemale", "region": "wales", "numberOfChildren": 1,
             "female": {"age": 33, "potentialHourlyWage": 9.5, "labour": "16-29h", "longTermSickOrDisabled": true}},
             "grossIncome": 900.0, "disposableIncome": 1100.0, "disposableToGrossRatio": 1.22}
        ]"#;
        tokio::fs::write(directory.join("donors_2024.json"), json).await.unwrap();

        let source = DonorSource::Files { directory: directory.clone() };
        let index = source.build_index(2024, 80).await.unwrap();
        let ids: Vec<u64> = index.donors().iter().map(|d| d.donor_id).collect();
        assert_eq!(ids, vec![3, 9]);
        assert!(source.health_check().await);

        tokio::fs::remove_dir_all(&directory).await.unwrap();
    }
}
