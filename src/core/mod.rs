// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod income;
pub mod index;
pub mod keys;
pub mod matcher;

pub use distance::{age_distance, earnings_distance, proportional_wage_distance};
pub use filters::{earnings_tiers, refine_age, refine_candidates, refine_children, refine_health, EarningsTier};
pub use income::{ConversionMethod, ConvertedIncome, IncomeConverter};
pub use index::{DonorIndex, InMemoryDonorIndex};
pub use keys::{IndexKey, KeyTuple, MatchLevel, Refinements};
pub use matcher::{select_donor, HouseholdImputation, ImputedIncome, MatchOutcome, Matcher};
