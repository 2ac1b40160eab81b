use crate::models::domain::{HouseholdProfile, LabourOption};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to find a single donor for a household profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DonorMatchRequest {
    /// Policy year whose donor population is searched
    #[validate(range(min = 1900, max = 2200))]
    pub year: i32,
    #[serde(default)]
    pub seed: Option<u64>,
    pub profile: HouseholdProfile,
}

/// Request to impute disposable income for all labour configurations of a household
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HouseholdImputationRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "household_id", rename = "householdId")]
    pub household_id: String,
    #[validate(range(min = 1900, max = 2200))]
    pub year: i32,
    /// Reference median gross income; defaults to the donor population median
    #[validate(range(min = 0.0))]
    #[serde(alias = "median_income", rename = "medianIncome", default)]
    pub median_income: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[validate(length(min = 1, max = 64))]
    pub options: Vec<LabourOption>,
}
