use crate::core::{
    filters::refine_candidates,
    income::{ConvertedIncome, IncomeConverter},
    index::DonorIndex,
    keys::{KeyTuple, MatchLevel},
};
use crate::error::ImputeError;
use crate::models::{DonorRecord, HouseholdProfile, LabourOption, MatchParams};
use rand::seq::SliceRandom;
use rand::Rng;

/// Result of a donor search for one labour configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome<'a> {
    Matched {
        donor: &'a DonorRecord,
        level: MatchLevel,
    },
    Unmatched,
}

/// Disposable income imputed for one labour configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImputedIncome {
    pub donor_id: u64,
    pub level: MatchLevel,
    pub income: ConvertedIncome,
}

/// Imputation results for every labour configuration of a household
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdImputation {
    pub household_id: String,
    pub median_income: f64,
    /// Matched configurations in input order
    pub results: Vec<(String, ImputedIncome)>,
    /// Labels of configurations without a donor
    pub unmatched: Vec<String>,
}

/// Donor matching orchestrator
///
/// # Pipeline Stages
/// 1. Hierarchical index lookup, from the full key down to labour only
/// 2. Candidate refinement (health, children, earnings, age)
/// 3. Uniform tie-break among the surviving donors
/// 4. Gross-to-disposable income conversion
#[derive(Debug, Clone)]
pub struct Matcher {
    params: MatchParams,
    converter: IncomeConverter,
}

impl Matcher {
    pub fn new(params: MatchParams) -> Result<Self, ImputeError> {
        params.validate()?;
        let converter = IncomeConverter::new(params.median_fraction, params.max_ratio);
        Ok(Self { params, converter })
    }

    pub fn with_default_params() -> Self {
        let params = MatchParams::default();
        let converter = IncomeConverter::new(params.median_fraction, params.max_ratio);
        Self { params, converter }
    }

    pub fn params(&self) -> &MatchParams {
        &self.params
    }

    /// Find the refined candidate set at the most specific level that yields one
    ///
    /// Levels are tried strictly in order and the first non-empty refined set
    /// wins. `None` means no level produced a donor.
    pub fn find_candidates<'a, I>(
        &self,
        index: &'a I,
        query: &HouseholdProfile,
    ) -> Result<Option<(MatchLevel, Vec<&'a DonorRecord>)>, ImputeError>
    where
        I: DonorIndex + ?Sized,
    {
        query.validate()?;
        if index.age_top_code() != self.params.age_top_code {
            return Err(ImputeError::InvalidParams(format!(
                "donor index built with age top-code {}, matcher uses {}",
                index.age_top_code(),
                self.params.age_top_code
            )));
        }
        let key = KeyTuple::from_profile(query, self.params.age_top_code);

        let found = MatchLevel::ALL.into_iter().find_map(|level| {
            let candidates = index.lookup(&key.index_key(level));
            if candidates.is_empty() {
                tracing::trace!("No index entry at {}", level);
                return None;
            }

            let hits = candidates.len();
            let refined = refine_candidates(query, candidates, level.refinements(), &self.params);
            tracing::debug!(
                "{}: {} index hits, {} after refinement",
                level,
                hits,
                refined.len()
            );

            (!refined.is_empty()).then_some((level, refined))
        });

        Ok(found)
    }

    /// Find one donor for the query, breaking ties with `rng`
    pub fn find_donor<'a, I, R>(
        &self,
        index: &'a I,
        query: &HouseholdProfile,
        rng: &mut R,
    ) -> Result<MatchOutcome<'a>, ImputeError>
    where
        I: DonorIndex + ?Sized,
        R: Rng + ?Sized,
    {
        let outcome = match self.find_candidates(index, query)? {
            Some((level, candidates)) => match select_donor(&candidates, rng) {
                Some(donor) => MatchOutcome::Matched { donor, level },
                None => MatchOutcome::Unmatched,
            },
            None => MatchOutcome::Unmatched,
        };

        Ok(outcome)
    }

    /// Impute disposable income for one labour configuration
    ///
    /// Returns `None` when no donor matches; the caller drops that
    /// configuration from consideration.
    pub fn impute<I, R>(
        &self,
        index: &I,
        query: &HouseholdProfile,
        target_gross: f64,
        median_income: f64,
        rng: &mut R,
    ) -> Result<Option<ImputedIncome>, ImputeError>
    where
        I: DonorIndex + ?Sized,
        R: Rng + ?Sized,
    {
        let imputed = match self.find_donor(index, query, rng)? {
            MatchOutcome::Matched { donor, level } => Some(ImputedIncome {
                donor_id: donor.donor_id,
                level,
                income: self.converter.convert(donor, target_gross, median_income),
            }),
            MatchOutcome::Unmatched => None,
        };

        Ok(imputed)
    }

    /// Impute disposable income for every labour configuration of a household
    ///
    /// Configurations are processed in the given order, which fixes the
    /// sequence of random draws. Failing to match any configuration is fatal.
    pub fn impute_household<I, R>(
        &self,
        index: &I,
        household_id: &str,
        options: &[LabourOption],
        median_income: f64,
        rng: &mut R,
    ) -> Result<HouseholdImputation, ImputeError>
    where
        I: DonorIndex + ?Sized,
        R: Rng + ?Sized,
    {
        let Some(first) = options.first() else {
            return Err(ImputeError::MalformedProfile(format!(
                "household {} has no labour configurations",
                household_id
            )));
        };

        for option in options {
            option.validate()?;
        }

        let mut results = Vec::with_capacity(options.len());
        let mut unmatched = Vec::new();

        for option in options {
            match self.impute(index, &option.profile, option.gross_income, median_income, rng)? {
                Some(income) => results.push((option.label.clone(), income)),
                None => {
                    tracing::warn!(
                        "No donor for household {} configuration {}",
                        household_id,
                        option.label
                    );
                    unmatched.push(option.label.clone());
                }
            }
        }

        if results.is_empty() {
            tracing::error!(
                "No donor for any of the {} configurations of household {}",
                options.len(),
                household_id
            );
            return Err(ImputeError::NoDonorForHousehold {
                household_id: household_id.to_string(),
                region: first.profile.region,
                occupancy: first.profile.occupancy,
                number_of_children: first.profile.number_of_children,
                adults: first.profile.adult_count(),
            });
        }

        tracing::info!(
            "Imputed household {}: {} configurations matched, {} unmatched",
            household_id,
            results.len(),
            unmatched.len()
        );

        Ok(HouseholdImputation {
            household_id: household_id.to_string(),
            median_income,
            results,
            unmatched,
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_params()
    }
}

/// Draw one donor uniformly from a refined candidate set
pub fn select_donor<'a, R>(candidates: &[&'a DonorRecord], rng: &mut R) -> Option<&'a DonorRecord>
where
    R: Rng + ?Sized,
{
    candidates.choose(rng).copied()
}
