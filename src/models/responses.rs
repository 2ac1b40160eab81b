use crate::core::{ConversionMethod, HouseholdImputation, MatchLevel};
use serde::{Deserialize, Serialize};

/// Response for the donor match endpoint
#[derive(Debug, Clone, Serialize)]
pub struct DonorMatchResponse {
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub matched: bool,
    #[serde(rename = "donorId")]
    pub donor_id: Option<u64>,
    pub level: Option<MatchLevel>,
    /// 1 (exact key) to 5 (labour only)
    #[serde(rename = "levelNumber")]
    pub level_number: Option<u8>,
}

/// Imputed income of one labour configuration
#[derive(Debug, Clone, Serialize)]
pub struct OptionResult {
    pub label: String,
    #[serde(rename = "donorId")]
    pub donor_id: u64,
    pub level: MatchLevel,
    #[serde(rename = "disposableIncome")]
    pub disposable_income: f64,
    pub method: ConversionMethod,
    pub imputed: bool,
}

/// Response for the household imputation endpoint
#[derive(Debug, Clone, Serialize)]
pub struct HouseholdImputationResponse {
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(rename = "householdId")]
    pub household_id: String,
    pub year: i32,
    #[serde(rename = "medianIncome")]
    pub median_income: f64,
    pub results: Vec<OptionResult>,
    pub unmatched: Vec<String>,
}

impl HouseholdImputationResponse {
    pub fn new(request_id: String, year: i32, imputation: HouseholdImputation) -> Self {
        let results = imputation
            .results
            .into_iter()
            .map(|(label, imputed)| OptionResult {
                label,
                donor_id: imputed.donor_id,
                level: imputed.level,
                disposable_income: imputed.income.disposable_income,
                method: imputed.income.method,
                imputed: imputed.income.imputed,
            })
            .collect();

        Self {
            request_id,
            household_id: imputation.household_id,
            year,
            median_income: imputation.median_income,
            results,
            unmatched: imputation.unmatched,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Donor indexes currently resident in the cache
    #[serde(rename = "loadedIndexes")]
    pub loaded_indexes: u64,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
