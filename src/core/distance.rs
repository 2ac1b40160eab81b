use crate::models::{Adult, Gender, HouseholdProfile};

/// Query wages below this are treated as zero earners
const NEAR_ZERO_WAGE: f64 = 0.01;

/// Stand-in age for an adult the donor household does not have
pub const MISSING_AGE_PENALTY: f64 = -100.0;

/// Growth applied to the children bound when nothing is admitted
pub const CHILDREN_BOUND_GROWTH: f64 = 1.5;

/// Modified proportional squared distance between two hourly wages
///
/// The query wage is the denominator, shifted by one for zero earners.
#[inline]
pub fn proportional_wage_distance(query_wage: f64, donor_wage: f64) -> f64 {
    let denom = if query_wage < NEAR_ZERO_WAGE {
        query_wage + 1.0
    } else {
        query_wage
    };
    ((donor_wage - query_wage) / denom).powi(2)
}

/// Earnings distance between a query household and a donor household
///
/// Couples average both adults' distances and take the better of the direct
/// and the gender-swapped pairing. Singles compare the query adult with the
/// donor adult of the same gender, or the donor's only adult.
pub fn earnings_distance(query: &HouseholdProfile, donor: &HouseholdProfile) -> f64 {
    match query.single_gender() {
        None => {
            let wage = |adult: Option<&Adult>| adult.map_or(0.0, |a| a.potential_hourly_wage);
            let (qm, qf) = (wage(query.male.as_ref()), wage(query.female.as_ref()));
            let (dm, df) = (wage(donor.male.as_ref()), wage(donor.female.as_ref()));

            let direct =
                (proportional_wage_distance(qm, dm) + proportional_wage_distance(qf, df)) / 2.0;
            let swapped =
                (proportional_wage_distance(qm, df) + proportional_wage_distance(qf, dm)) / 2.0;
            direct.min(swapped)
        }
        Some(gender) => {
            let query_wage = query.adult(gender).map_or(0.0, |a| a.potential_hourly_wage);
            let donor_wage = counterpart(donor, gender).map_or(0.0, |a| a.potential_hourly_wage);
            proportional_wage_distance(query_wage, donor_wage)
        }
    }
}

/// Squared age distance between a query household and a donor household
///
/// Couples are paired by age rank, older with older and younger with
/// younger, regardless of gender. Missing donor adults count as
/// `MISSING_AGE_PENALTY` years old.
pub fn age_distance(query: &HouseholdProfile, donor: &HouseholdProfile, top_code: u32) -> f64 {
    let age = |adult: Option<&Adult>| adult.map(|a| f64::from(a.age_top_coded(top_code)));

    match query.single_gender() {
        None => {
            let (q_old, q_young) = by_rank(age(query.male.as_ref()), age(query.female.as_ref()));
            let (d_old, d_young) = by_rank(age(donor.male.as_ref()), age(donor.female.as_ref()));
            squared_age_gap(q_old, d_old) + squared_age_gap(q_young, d_young)
        }
        Some(gender) => squared_age_gap(age(query.adult(gender)), age(counterpart(donor, gender))),
    }
}

/// Squared difference in the number of children
#[inline]
pub fn children_distance(query_children: u32, donor_children: u32) -> f64 {
    (f64::from(query_children) - f64::from(donor_children)).powi(2)
}

/// Next, wider children discrepancy bound
#[inline]
pub fn widen_children_bound(bound: f64) -> f64 {
    (bound + 1.0) * CHILDREN_BOUND_GROWTH
}

/// Donor adult compared with a single query adult of `gender`
fn counterpart(donor: &HouseholdProfile, gender: Gender) -> Option<&Adult> {
    donor.adult(gender).or_else(|| donor.adult(gender.opposite()))
}

/// Order two optional ages as (older, younger); missing values sort last
fn by_rank(a: Option<f64>, b: Option<f64>) -> (Option<f64>, Option<f64>) {
    match (a, b) {
        (Some(x), Some(y)) if y > x => (Some(y), Some(x)),
        (None, Some(y)) => (Some(y), None),
        other => other,
    }
}

fn squared_age_gap(query_age: Option<f64>, donor_age: Option<f64>) -> f64 {
    match query_age {
        Some(q) => (q - donor_age.unwrap_or(MISSING_AGE_PENALTY)).powi(2),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LabourBin, Region};

    fn adult(age: u32, wage: f64) -> Adult {
        Adult::new(age, wage, LabourBin::Forty)
    }

    #[test]
    fn test_proportional_distance() {
        assert_eq!(proportional_wage_distance(10.0, 10.0), 0.0);
        assert!((proportional_wage_distance(10.0, 15.0) - 0.25).abs() < 1e-12);
        assert!((proportional_wage_distance(10.0, 80.0) - 49.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_earner_denominator() {
        // denominator becomes 1.0 instead of blowing up
        assert!((proportional_wage_distance(0.0, 3.0) - 9.0).abs() < 1e-12);
        assert!(proportional_wage_distance(0.005, 0.0).is_finite());
    }

    #[test]
    fn test_couple_earnings_uses_better_assignment() {
        let query = HouseholdProfile::couple(Region::London, 0, adult(40, 20.0), adult(40, 10.0));
        let donor = HouseholdProfile::couple(Region::London, 0, adult(40, 10.0), adult(40, 20.0));
        assert_eq!(earnings_distance(&query, &donor), 0.0);
    }

    #[test]
    fn test_couple_age_pairs_by_rank() {
        // Query: male 60, female 30. Donor: male 30, female 60.
        let query = HouseholdProfile::couple(Region::London, 0, adult(60, 10.0), adult(30, 10.0));
        let donor = HouseholdProfile::couple(Region::London, 0, adult(30, 10.0), adult(60, 10.0));
        assert_eq!(age_distance(&query, &donor, 80), 0.0);
    }

    #[test]
    fn test_missing_donor_age_is_penalised() {
        let query = HouseholdProfile::couple(Region::London, 0, adult(50, 10.0), adult(40, 10.0));
        let donor = HouseholdProfile::single(Region::London, 0, Gender::Male, adult(50, 10.0));
        assert_eq!(age_distance(&query, &donor, 80), 140.0_f64.powi(2));
    }

    #[test]
    fn test_single_age_distance_top_coded() {
        let query = HouseholdProfile::single(Region::London, 0, Gender::Female, adult(95, 0.0));
        let donor = HouseholdProfile::single(Region::London, 0, Gender::Female, adult(78, 0.0));
        assert_eq!(age_distance(&query, &donor, 80), 4.0);
    }

    #[test]
    fn test_children_bound_widening() {
        assert_eq!(widen_children_bound(0.0), 1.5);
        assert_eq!(widen_children_bound(1.5), 3.75);
        assert_eq!(children_distance(1, 4), 9.0);
    }
}
