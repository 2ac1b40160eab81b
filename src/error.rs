use crate::models::{Occupancy, Region};
use thiserror::Error;

/// Errors raised by the donor matching and imputation core
#[derive(Debug, Error)]
pub enum ImputeError {
    /// Profile does not describe a well-formed household (upstream construction bug)
    #[error("Malformed household profile: {0}")]
    MalformedProfile(String),

    #[error("Unknown {kind} value: {value:?}")]
    UnknownCategory { kind: &'static str, value: String },

    #[error("Invalid matching parameters: {0}")]
    InvalidParams(String),

    /// Not one labour configuration of the household found a donor.
    ///
    /// This means the donor population or the thresholds cannot represent the
    /// household at all, so the run must stop.
    #[error(
        "No donor found for any labour configuration of household {household_id} \
         (region: {region}, occupancy: {occupancy}, children: {number_of_children}, adults: {adults})"
    )]
    NoDonorForHousehold {
        household_id: String,
        region: Region,
        occupancy: Occupancy,
        number_of_children: u32,
        adults: usize,
    },
}

impl ImputeError {
    /// Whether the error signals bad input rather than an unrepresentable household
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            ImputeError::MalformedProfile(_) | ImputeError::UnknownCategory { .. }
        )
    }
}
