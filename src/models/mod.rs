// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Adult, DonorRecord, Gender, HealthCategory, HouseholdProfile, LabourBin, LabourOption, MatchParams, Occupancy, QueryProfile, Region};
pub use requests::{DonorMatchRequest, HouseholdImputationRequest};
pub use responses::{DonorMatchResponse, ErrorResponse, HealthResponse, HouseholdImputationResponse, OptionResult};
