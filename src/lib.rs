//! Donor Impute - Donor matching and disposable income imputation for household microsimulation
//!
//! Simulated households are matched against a reference population of donor
//! households through a hierarchical key lookup followed by health, children,
//! earnings and age refinements. The chosen donor's tax-and-benefit outcome is
//! then converted into a disposable income for the simulated household.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{InMemoryDonorIndex, MatchLevel, MatchOutcome, Matcher};
pub use error::ImputeError;
pub use models::{Adult, DonorRecord, HouseholdProfile, LabourBin, LabourOption, MatchParams, Occupancy, Region};
