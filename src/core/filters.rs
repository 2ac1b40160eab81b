use crate::core::distance::{age_distance, children_distance, earnings_distance, widen_children_bound};
use crate::core::keys::Refinements;
use crate::models::{DonorRecord, Gender, HealthCategory, HouseholdProfile, MatchParams};

/// Donors within one earnings discrepancy threshold
#[derive(Debug, Clone)]
pub struct EarningsTier<'a> {
    pub threshold: f64,
    pub donors: Vec<&'a DonorRecord>,
}

/// Narrow an index hit down to the donors closest to the query
///
/// Health, children and age are only checked when the matched key left them
/// out. Earnings are always checked. An empty result means the caller must
/// move on to the next relaxation level.
pub fn refine_candidates<'a>(
    query: &HouseholdProfile,
    candidates: Vec<&'a DonorRecord>,
    refinements: Refinements,
    params: &MatchParams,
) -> Vec<&'a DonorRecord> {
    let mut candidates = candidates;

    if refinements.health {
        candidates = refine_health(query, candidates);
        if candidates.is_empty() {
            tracing::trace!("Health refinement rejected all candidates");
            return candidates;
        }
    }

    if refinements.children {
        candidates = refine_children(query, candidates, params);
        if candidates.is_empty() {
            tracing::trace!("Children refinement rejected all candidates");
            return candidates;
        }
    }

    let tiers = earnings_tiers(query, &candidates, &params.earnings_thresholds);
    refine_age(query, tiers, refinements.age, params)
}

/// Keep donors whose adults share the query's health categories
///
/// Couples prefer donors matching both members, in either gender
/// assignment, and fall back to donors matching at least one member.
/// Singles accept a match on either donor slot.
pub fn refine_health<'a>(
    query: &HouseholdProfile,
    candidates: Vec<&'a DonorRecord>,
) -> Vec<&'a DonorRecord> {
    let health = |profile: &HouseholdProfile, gender: Gender| -> Option<HealthCategory> {
        profile.adult(gender).map(|adult| adult.health())
    };

    match query.single_gender() {
        None => {
            let qm = health(query, Gender::Male);
            let qf = health(query, Gender::Female);

            let both: Vec<&DonorRecord> = candidates
                .iter()
                .copied()
                .filter(|donor| {
                    let dm = health(&donor.profile, Gender::Male);
                    let df = health(&donor.profile, Gender::Female);
                    (dm == qm && df == qf) || (dm == qf && df == qm)
                })
                .collect();

            if !both.is_empty() {
                return both;
            }

            candidates
                .into_iter()
                .filter(|donor| {
                    let dm = health(&donor.profile, Gender::Male);
                    let df = health(&donor.profile, Gender::Female);
                    [dm, df]
                        .into_iter()
                        .flatten()
                        .any(|h| Some(h) == qm || Some(h) == qf)
                })
                .collect()
        }
        Some(gender) => {
            let own = health(query, gender);
            candidates
                .into_iter()
                .filter(|donor| {
                    own.is_some()
                        && (health(&donor.profile, gender) == own
                            || health(&donor.profile, gender.opposite()) == own)
                })
                .collect()
        }
    }
}

/// Keep donors whose number of children is within the discrepancy bound
///
/// The bound starts from the configured base for the query's children
/// count and widens until it reaches the nearest donor, so a non-empty
/// input always admits at least one donor.
pub fn refine_children<'a>(
    query: &HouseholdProfile,
    candidates: Vec<&'a DonorRecord>,
    params: &MatchParams,
) -> Vec<&'a DonorRecord> {
    let distances: Vec<f64> = candidates
        .iter()
        .map(|donor| children_distance(query.number_of_children, donor.profile.number_of_children))
        .collect();

    let Some(nearest) = distances.iter().copied().reduce(f64::min) else {
        return candidates;
    };

    // The bound grows at least 1.5x per step, so this ends for any finite distance
    let mut bound = params.children_bound(query.number_of_children);
    let mut widenings = 0u32;
    while bound * bound < nearest {
        bound = widen_children_bound(bound);
        widenings += 1;
    }

    let total = candidates.len();
    let admitted: Vec<&DonorRecord> = candidates
        .into_iter()
        .zip(distances)
        .filter_map(|(donor, distance)| (distance <= bound * bound).then_some(donor))
        .collect();

    tracing::trace!(
        "Children refinement admitted {} of {} donors (bound {:.2}, {} widenings)",
        admitted.len(),
        total,
        bound,
        widenings
    );

    admitted
}

/// Split donors into nested tiers by earnings distance, narrowest first
///
/// A donor belongs to every tier whose squared threshold its distance does
/// not exceed.
pub fn earnings_tiers<'a>(
    query: &HouseholdProfile,
    candidates: &[&'a DonorRecord],
    thresholds: &[f64],
) -> Vec<EarningsTier<'a>> {
    let distances: Vec<f64> = candidates
        .iter()
        .map(|donor| earnings_distance(query, &donor.profile))
        .collect();

    thresholds
        .iter()
        .map(|&threshold| EarningsTier {
            threshold,
            donors: candidates
                .iter()
                .zip(&distances)
                .filter(|(_, distance)| **distance <= threshold * threshold)
                .map(|(&donor, _)| donor)
                .collect(),
        })
        .collect()
}

/// Pick the age-compatible donors of the narrowest usable earnings tier
///
/// Without age refinement the first non-empty tier is returned as is.
/// Otherwise donors must lie within the age bound; with the guarantee flag
/// the closest-age donor of the tier is always admitted as well.
pub fn refine_age<'a>(
    query: &HouseholdProfile,
    tiers: Vec<EarningsTier<'a>>,
    refine: bool,
    params: &MatchParams,
) -> Vec<&'a DonorRecord> {
    for tier in tiers.into_iter().filter(|tier| !tier.donors.is_empty()) {
        if !refine {
            return tier.donors;
        }

        let distances: Vec<f64> = tier
            .donors
            .iter()
            .map(|donor| age_distance(query, &donor.profile, params.age_top_code))
            .collect();

        let mut admitted: Vec<bool> = distances.iter().map(|&d| d <= params.age_bound).collect();

        if params.guarantee_age_match {
            if let Some((closest, _)) = distances
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.total_cmp(b))
            {
                admitted[closest] = true;
            }
        }

        let selected: Vec<&DonorRecord> = tier
            .donors
            .iter()
            .zip(admitted)
            .filter_map(|(&donor, keep)| keep.then_some(donor))
            .collect();

        if !selected.is_empty() {
            return selected;
        }

        tracing::trace!(
            "No donor within age bound at earnings threshold {}, widening",
            tier.threshold
        );
    }

    Vec::new()
}
