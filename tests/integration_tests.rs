// Integration tests for Donor Impute

use donor_impute::core::{ConversionMethod, DonorIndex, InMemoryDonorIndex, MatchLevel, MatchOutcome, Matcher};
use donor_impute::error::ImputeError;
use donor_impute::models::{
    Adult, DonorRecord, Gender, HouseholdProfile, LabourBin, LabourOption, MatchParams, Region,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::collections::HashMap;

fn create_single_donor(id: u64, region: Region, children: u32, age: u32, wage: f64) -> DonorRecord {
    DonorRecord {
        donor_id: id,
        profile: HouseholdProfile::single(
            region,
            children,
            Gender::Female,
            Adult::new(age, wage, LabourBin::Twenty),
        ),
        gross_income: 1300.0,
        disposable_income: 1450.0,
        disposable_to_gross_ratio: 1.1,
    }
}

fn create_single_query(region: Region, children: u32, age: u32, wage: f64) -> HouseholdProfile {
    HouseholdProfile::single(
        region,
        children,
        Gender::Female,
        Adult::new(age, wage, LabourBin::Twenty),
    )
}

fn expect_match(outcome: MatchOutcome<'_>) -> (u64, MatchLevel) {
    match outcome {
        MatchOutcome::Matched { donor, level } => (donor.donor_id, level),
        MatchOutcome::Unmatched => panic!("expected a donor"),
    }
}

#[test]
fn test_integration_single_parent_exact_match() {
    // Single female in London, two children, part-time
    let index = InMemoryDonorIndex::build(
        vec![create_single_donor(101, Region::London, 2, 35, 10.5)],
        80,
    )
    .unwrap();
    let matcher = Matcher::with_default_params();
    let mut rng = ChaCha20Rng::seed_from_u64(2024);

    let query = create_single_query(Region::London, 2, 35, 10.0);
    let (donor_id, level) = expect_match(matcher.find_donor(&index, &query, &mut rng).unwrap());

    assert_eq!(donor_id, 101);
    assert_eq!(level, MatchLevel::Exact);
    assert_eq!(level.number(), 1);
}

#[test]
fn test_integration_region_is_relaxed_at_level_three() {
    // No donor shares the query's region
    let index = InMemoryDonorIndex::build(
        vec![
            create_single_donor(7, Region::Wales, 2, 35, 10.5),
            create_single_donor(8, Region::Scotland, 2, 35, 10.5),
        ],
        80,
    )
    .unwrap();
    let matcher = Matcher::with_default_params();
    let mut rng = ChaCha20Rng::seed_from_u64(1);

    let query = create_single_query(Region::London, 2, 35, 10.0);
    let (donor_id, level) = expect_match(matcher.find_donor(&index, &query, &mut rng).unwrap());

    assert!(donor_id == 7 || donor_id == 8);
    assert_eq!(level, MatchLevel::DropRegion);
}

#[test]
fn test_integration_exact_bucket_takes_precedence() {
    // Donor 2 earns exactly like the query but differs in age; donor 1 shares the full key
    let index = InMemoryDonorIndex::build(
        vec![
            create_single_donor(1, Region::London, 2, 35, 20.0),
            create_single_donor(2, Region::London, 2, 36, 10.0),
        ],
        80,
    )
    .unwrap();
    let matcher = Matcher::with_default_params();

    let (level, candidates) = matcher
        .find_candidates(&index, &create_single_query(Region::London, 2, 35, 10.0))
        .unwrap()
        .unwrap();

    assert_eq!(level, MatchLevel::Exact);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].donor_id, 1);
}

#[test]
fn test_integration_children_relaxed_at_level_four() {
    // Same health and labour, but no donor shares the child count
    let index = InMemoryDonorIndex::build(
        vec![
            create_single_donor(31, Region::Wales, 3, 35, 10.0),
            create_single_donor(32, Region::London, 6, 35, 10.0),
        ],
        80,
    )
    .unwrap();
    let matcher = Matcher::with_default_params();
    let mut rng = ChaCha20Rng::seed_from_u64(6);

    // Bound 0.5 widens to 2.25, admitting three children but not six
    let (level, candidates) = matcher
        .find_candidates(&index, &create_single_query(Region::London, 2, 35, 10.0))
        .unwrap()
        .unwrap();
    assert_eq!(level, MatchLevel::DropChildren);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].donor_id, 31);

    let (donor_id, level) = expect_match(
        matcher
            .find_donor(&index, &create_single_query(Region::London, 2, 35, 10.0), &mut rng)
            .unwrap(),
    );
    assert_eq!(donor_id, 31);
    assert_eq!(level.number(), 4);
}

#[test]
fn test_integration_labour_only_fallback() {
    // Health swapped across genders, different children, region and ages
    let query = HouseholdProfile::couple(
        Region::London,
        0,
        Adult::new(40, 15.0, LabourBin::Forty),
        Adult::new(38, 12.0, LabourBin::Thirty).long_term_sick(true),
    );
    let donor = DonorRecord {
        donor_id: 55,
        profile: HouseholdProfile::couple(
            Region::NorthWest,
            3,
            Adult::new(41, 15.0, LabourBin::Forty).long_term_sick(true),
            Adult::new(39, 12.0, LabourBin::Thirty),
        ),
        gross_income: 4200.0,
        disposable_income: 3300.0,
        disposable_to_gross_ratio: 0.79,
    };
    let index = InMemoryDonorIndex::build(vec![donor], 80).unwrap();
    let matcher = Matcher::with_default_params();
    let mut rng = ChaCha20Rng::seed_from_u64(5);

    let (donor_id, level) = expect_match(matcher.find_donor(&index, &query, &mut rng).unwrap());
    assert_eq!(donor_id, 55);
    assert_eq!(level, MatchLevel::LabourOnly);
}

#[test]
fn test_integration_narrowest_earnings_tier_wins() {
    let index = InMemoryDonorIndex::build(
        vec![
            create_single_donor(1, Region::London, 2, 40, 80.0),
            create_single_donor(2, Region::London, 2, 40, 10.0),
        ],
        80,
    )
    .unwrap();
    let matcher = Matcher::with_default_params();

    // Age 35 misses the exact key, level 2 refines earnings then age
    let (level, candidates) = matcher
        .find_candidates(&index, &create_single_query(Region::London, 2, 35, 10.0))
        .unwrap()
        .unwrap();

    assert_eq!(level, MatchLevel::DropAge);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].donor_id, 2);
}

#[test]
fn test_integration_age_guarantee_rescues_level() {
    let index = InMemoryDonorIndex::build(
        vec![create_single_donor(9, Region::London, 2, 70, 10.0)],
        80,
    )
    .unwrap();
    let query = create_single_query(Region::London, 2, 30, 10.0);
    let mut rng = ChaCha20Rng::seed_from_u64(3);

    let strict = Matcher::with_default_params();
    assert_eq!(
        strict.find_donor(&index, &query, &mut rng).unwrap(),
        MatchOutcome::Unmatched
    );

    let lenient = Matcher::new(MatchParams {
        guarantee_age_match: true,
        ..MatchParams::default()
    })
    .unwrap();
    let (donor_id, level) = expect_match(lenient.find_donor(&index, &query, &mut rng).unwrap());
    assert_eq!(donor_id, 9);
    assert_eq!(level, MatchLevel::DropAge);
}

#[test]
fn test_integration_tie_break_is_uniform() {
    let donors: Vec<DonorRecord> = (1..=4)
        .map(|id| create_single_donor(id, Region::Scotland, 1, 45, 12.0))
        .collect();
    let index = InMemoryDonorIndex::build(donors, 80).unwrap();
    let matcher = Matcher::with_default_params();
    let query = create_single_query(Region::Scotland, 1, 45, 12.0);

    let draws: u64 = 4000;
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for seed in 0..draws {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let (donor_id, _) = expect_match(matcher.find_donor(&index, &query, &mut rng).unwrap());
        *counts.entry(donor_id).or_default() += 1;
    }

    assert_eq!(counts.len(), 4);
    for count in counts.values() {
        // Expected 1000 per donor, standard deviation about 27
        assert!((850..=1150).contains(count), "skewed count: {}", count);
    }
}

#[test]
fn test_integration_seed_reproduces_draws() {
    let donors: Vec<DonorRecord> = (1..=10)
        .map(|id| create_single_donor(id, Region::SouthEast, 0, 28, 9.0))
        .collect();
    let index = InMemoryDonorIndex::build(donors, 80).unwrap();
    let matcher = Matcher::with_default_params();
    let query = create_single_query(Region::SouthEast, 0, 28, 9.0);

    let run = |seed: u64| -> Vec<u64> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        (0..20)
            .map(|_| expect_match(matcher.find_donor(&index, &query, &mut rng).unwrap()).0)
            .collect()
    };

    assert_eq!(run(17), run(17));
}

#[test]
fn test_integration_household_imputation() {
    let mut full_time = create_single_donor(2, Region::London, 2, 35, 10.0);
    if let Some(adult) = full_time.profile.female.as_mut() {
        adult.labour = LabourBin::Forty;
    }
    full_time.gross_income = 50.0;
    full_time.disposable_income = 900.0;

    let index = InMemoryDonorIndex::build(
        vec![create_single_donor(1, Region::London, 2, 35, 10.0), full_time],
        80,
    )
    .unwrap();
    assert_eq!(index.len(), 2);

    let mut full_time_query = create_single_query(Region::London, 2, 35, 10.0);
    if let Some(adult) = full_time_query.female.as_mut() {
        adult.labour = LabourBin::Forty;
    }
    let mut inactive_query = create_single_query(Region::London, 2, 35, 10.0);
    if let Some(adult) = inactive_query.female.as_mut() {
        adult.labour = LabourBin::Zero;
    }

    let options = vec![
        LabourOption {
            label: "part-time".to_string(),
            profile: create_single_query(Region::London, 2, 35, 10.0),
            gross_income: 1000.0,
        },
        LabourOption {
            label: "full-time".to_string(),
            profile: full_time_query,
            gross_income: 1700.0,
        },
        LabourOption {
            label: "inactive".to_string(),
            profile: inactive_query,
            gross_income: 0.0,
        },
    ];

    let matcher = Matcher::with_default_params();
    let mut rng = ChaCha20Rng::seed_from_u64(8);
    let result = matcher
        .impute_household(&index, "hh-100", &options, 2000.0, &mut rng)
        .unwrap();

    assert_eq!(result.results.len(), 2);
    assert_eq!(result.unmatched, vec!["inactive".to_string()]);

    let (label, part_time) = &result.results[0];
    assert_eq!(label, "part-time");
    assert_eq!(part_time.income.method, ConversionMethod::Ratio);
    assert!((part_time.income.disposable_income - 1100.0).abs() < 1e-9);

    // Donor gross below 10% of the median: copied and flagged
    let (label, full_time) = &result.results[1];
    assert_eq!(label, "full-time");
    assert_eq!(full_time.donor_id, 2);
    assert_eq!(full_time.income.method, ConversionMethod::Direct);
    assert!(full_time.income.imputed);
    assert_eq!(full_time.income.disposable_income, 900.0);
}

#[test]
fn test_integration_unrepresentable_household_is_fatal() {
    let index = InMemoryDonorIndex::build(
        vec![create_single_donor(1, Region::London, 2, 35, 10.0)],
        80,
    )
    .unwrap();
    let query = HouseholdProfile::single(
        Region::NorthernIreland,
        4,
        Gender::Male,
        Adult::new(61, 0.0, LabourBin::Zero),
    );
    let options = vec![LabourOption {
        label: "inactive".to_string(),
        profile: query,
        gross_income: 0.0,
    }];

    let matcher = Matcher::with_default_params();
    let mut rng = ChaCha20Rng::seed_from_u64(8);
    let err = matcher
        .impute_household(&index, "hh-404", &options, 2000.0, &mut rng)
        .unwrap_err();

    assert!(matches!(
        err,
        ImputeError::NoDonorForHousehold { region: Region::NorthernIreland, number_of_children: 4, .. }
    ));
    assert!(err.to_string().contains("hh-404"));
}
