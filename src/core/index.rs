use crate::core::keys::{IndexKey, KeyTuple};
use crate::error::ImputeError;
use crate::models::DonorRecord;
use std::collections::HashMap;

/// Read-only lookup from index keys to donor households.
///
/// Candidate order must be stable across calls, tie-breaks depend on it.
pub trait DonorIndex {
    fn lookup(&self, key: &IndexKey) -> Vec<&DonorRecord>;

    fn len(&self) -> usize;

    /// Age top-code the donor keys were built with
    fn age_top_code(&self) -> u32;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Donor index held in memory, built once per policy year
#[derive(Debug, Clone)]
pub struct InMemoryDonorIndex {
    donors: Vec<DonorRecord>,
    buckets: HashMap<IndexKey, Vec<usize>>,
    age_top_code: u32,
}

impl InMemoryDonorIndex {
    /// File every donor under its key at each relaxation level.
    ///
    /// Donors keep their input order inside each bucket.
    pub fn build(donors: Vec<DonorRecord>, age_top_code: u32) -> Result<Self, ImputeError> {
        let mut buckets: HashMap<IndexKey, Vec<usize>> = HashMap::new();

        for (position, donor) in donors.iter().enumerate() {
            donor.validate()?;
            let key = KeyTuple::from_profile(&donor.profile, age_top_code);
            for index_key in key.index_keys() {
                buckets.entry(index_key).or_default().push(position);
            }
        }

        tracing::debug!(
            "Built donor index: {} donors, {} keys (age top-code {})",
            donors.len(),
            buckets.len(),
            age_top_code
        );

        Ok(Self {
            donors,
            buckets,
            age_top_code,
        })
    }

    pub fn donors(&self) -> &[DonorRecord] {
        &self.donors
    }

    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    /// Median monthly gross income across all donors
    pub fn median_gross_income(&self) -> Option<f64> {
        if self.donors.is_empty() {
            return None;
        }

        let mut incomes: Vec<f64> = self.donors.iter().map(|d| d.gross_income).collect();
        incomes.sort_by(f64::total_cmp);

        let mid = incomes.len() / 2;
        if incomes.len() % 2 == 0 {
            Some((incomes[mid - 1] + incomes[mid]) / 2.0)
        } else {
            Some(incomes[mid])
        }
    }
}

impl DonorIndex for InMemoryDonorIndex {
    fn lookup(&self, key: &IndexKey) -> Vec<&DonorRecord> {
        self.buckets
            .get(key)
            .map(|positions| positions.iter().map(|&i| &self.donors[i]).collect())
            .unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.donors.len()
    }

    fn age_top_code(&self) -> u32 {
        self.age_top_code
    }
}
