use crate::error::ImputeError;
use crate::models::{Adult, DonorRecord, HouseholdProfile};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid donor row {donor_id}: {source}")]
    InvalidRow {
        donor_id: i64,
        #[source]
        source: ImputeError,
    },
}

/// PostgreSQL client for the donor population
///
/// Donor households are stored one row per household and policy year, with
/// nullable per-gender adult columns.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL donor store");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Load every donor household of a policy year, ordered by donor id
    pub async fn load_donors(&self, year: i32) -> Result<Vec<DonorRecord>, PostgresError> {
        let query = r#"
            SELECT donor_id, occupancy, region, number_of_children,
                   male_age, male_long_term_sick, male_hourly_wage, male_labour,
                   female_age, female_long_term_sick, female_hourly_wage, female_labour,
                   gross_income, disposable_income, disposable_to_gross_ratio
            FROM donor_households
            WHERE year = $1
            ORDER BY donor_id
        "#;

        let rows = sqlx::query(query).bind(year).fetch_all(&self.pool).await?;

        let donors = rows
            .iter()
            .map(donor_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} donor households for {}", donors.len(), year);

        Ok(donors)
    }

    /// Policy years with at least one donor household
    pub async fn available_years(&self) -> Result<Vec<i32>, PostgresError> {
        let query = r#"
            SELECT DISTINCT year
            FROM donor_households
            ORDER BY year
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(|row| row.get("year")).collect())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn donor_from_row(row: &PgRow) -> Result<DonorRecord, PostgresError> {
    let donor_id: i64 = row.try_get("donor_id")?;
    let invalid = |source: ImputeError| PostgresError::InvalidRow { donor_id, source };

    let occupancy: String = row.try_get("occupancy")?;
    let region: String = row.try_get("region")?;
    let number_of_children: i32 = row.try_get("number_of_children")?;

    let profile = HouseholdProfile {
        occupancy: occupancy.parse().map_err(invalid)?,
        region: region.parse().map_err(invalid)?,
        number_of_children: non_negative(number_of_children, "number_of_children").map_err(invalid)?,
        male: adult_from_row(row, "male")?.transpose().map_err(invalid)?,
        female: adult_from_row(row, "female")?.transpose().map_err(invalid)?,
    };

    let donor = DonorRecord {
        donor_id: u64::try_from(donor_id).map_err(|_| {
            invalid(ImputeError::MalformedProfile("negative donor id".to_string()))
        })?,
        profile,
        gross_income: row.try_get("gross_income")?,
        disposable_income: row.try_get("disposable_income")?,
        disposable_to_gross_ratio: row.try_get("disposable_to_gross_ratio")?,
    };

    donor.validate().map_err(invalid)?;
    Ok(donor)
}

/// Read the `{prefix}_*` adult columns; all-null columns mean no such adult
fn adult_from_row(
    row: &PgRow,
    prefix: &str,
) -> Result<Option<Result<Adult, ImputeError>>, PostgresError> {
    let age: Option<i32> = row.try_get(format!("{}_age", prefix).as_str())?;
    let Some(age) = age else {
        return Ok(None);
    };

    let long_term_sick: Option<bool> = row.try_get(format!("{}_long_term_sick", prefix).as_str())?;
    let wage: Option<f64> = row.try_get(format!("{}_hourly_wage", prefix).as_str())?;
    let labour: Option<String> = row.try_get(format!("{}_labour", prefix).as_str())?;

    Ok(Some(build_adult(prefix, age, long_term_sick, wage, labour)))
}

fn build_adult(
    prefix: &str,
    age: i32,
    long_term_sick: Option<bool>,
    wage: Option<f64>,
    labour: Option<String>,
) -> Result<Adult, ImputeError> {
    let labour = labour.ok_or_else(|| {
        ImputeError::MalformedProfile(format!("{} adult without labour bin", prefix))
    })?;

    Ok(Adult {
        long_term_sick_or_disabled: long_term_sick.unwrap_or(false),
        age: non_negative(age, "age")?,
        potential_hourly_wage: wage.unwrap_or(0.0),
        labour: labour.parse()?,
    })
}

fn non_negative(value: i32, column: &str) -> Result<u32, ImputeError> {
    u32::try_from(value)
        .map_err(|_| ImputeError::MalformedProfile(format!("negative {}: {}", column, value)))
}
