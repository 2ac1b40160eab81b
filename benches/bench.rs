// Criterion benchmarks for Donor Impute

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use donor_impute::core::{distance::earnings_distance, InMemoryDonorIndex, Matcher};
use donor_impute::models::{Adult, DonorRecord, Gender, HouseholdProfile, LabourBin, LabourOption, Region};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn create_donor(id: usize) -> DonorRecord {
    let region = Region::ALL[id % Region::ALL.len()];
    let labour = LabourBin::ALL[id % LabourBin::ALL.len()];
    let children = (id % 4) as u32;
    let wage = 6.0 + (id % 40) as f64 * 0.75;

    let profile = if id % 3 == 0 {
        HouseholdProfile::single(
            region,
            children,
            if id % 2 == 0 { Gender::Female } else { Gender::Male },
            Adult::new(20 + (id % 60) as u32, wage, labour).long_term_sick(id % 11 == 0),
        )
    } else {
        HouseholdProfile::couple(
            region,
            children,
            Adult::new(22 + (id % 55) as u32, wage, labour),
            Adult::new(21 + (id % 50) as u32, wage * 0.8, LabourBin::ALL[(id / 5) % 5])
                .long_term_sick(id % 13 == 0),
        )
    };

    DonorRecord {
        donor_id: id as u64,
        profile,
        gross_income: wage * f64::from(labour.hours()) * 4.33,
        disposable_income: 900.0 + wage * 40.0,
        disposable_to_gross_ratio: 0.82,
    }
}

fn create_query() -> HouseholdProfile {
    HouseholdProfile::couple(
        Region::London,
        2,
        Adult::new(41, 14.0, LabourBin::Forty),
        Adult::new(39, 11.0, LabourBin::Twenty),
    )
}

fn bench_earnings_distance(c: &mut Criterion) {
    let query = create_query();
    let donor = create_donor(7);

    c.bench_function("earnings_distance", |b| {
        b.iter(|| earnings_distance(black_box(&query), black_box(&donor.profile)));
    });
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for donor_count in [1_000, 10_000, 50_000].iter() {
        let donors: Vec<DonorRecord> = (0..*donor_count).map(create_donor).collect();

        group.bench_with_input(BenchmarkId::new("build", donor_count), donor_count, |b, _| {
            b.iter(|| InMemoryDonorIndex::build(black_box(donors.clone()), 80));
        });
    }

    group.finish();
}

fn bench_find_donor(c: &mut Criterion) {
    let matcher = Matcher::with_default_params();
    let query = create_query();

    let mut group = c.benchmark_group("find_donor");

    for donor_count in [1_000, 10_000, 50_000].iter() {
        let index = match InMemoryDonorIndex::build((0..*donor_count).map(create_donor).collect(), 80) {
            Ok(index) => index,
            Err(e) => panic!("invalid benchmark population: {}", e),
        };
        let mut rng = ChaCha20Rng::seed_from_u64(2024);

        group.bench_with_input(BenchmarkId::new("couple", donor_count), donor_count, |b, _| {
            b.iter(|| matcher.find_donor(black_box(&index), black_box(&query), &mut rng));
        });
    }

    group.finish();
}

fn bench_household_imputation(c: &mut Criterion) {
    let matcher = Matcher::with_default_params();
    let index = match InMemoryDonorIndex::build((0..10_000).map(create_donor).collect(), 80) {
        Ok(index) => index,
        Err(e) => panic!("invalid benchmark population: {}", e),
    };

    let options: Vec<LabourOption> = LabourBin::ALL
        .iter()
        .map(|&bin| {
            let mut profile = create_query();
            if let Some(female) = profile.female.as_mut() {
                female.labour = bin;
            }
            LabourOption {
                label: bin.label().to_string(),
                profile,
                gross_income: 2400.0 + 11.0 * f64::from(bin.hours()) * 4.33,
            }
        })
        .collect();
    let mut rng = ChaCha20Rng::seed_from_u64(7);

    c.bench_function("household_imputation_5_options", |b| {
        b.iter(|| {
            matcher.impute_household(
                black_box(&index),
                "bench",
                black_box(&options),
                2000.0,
                &mut rng,
            )
        });
    });
}

criterion_group!(
    benches,
    bench_earnings_distance,
    bench_index_build,
    bench_find_donor,
    bench_household_imputation
);

criterion_main!(benches);
