use crate::models::DonorRecord;
use serde::Serialize;

/// How a donor's outcome was transferred to the simulated household
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMethod {
    /// Donor disposable-to-gross ratio applied to the simulated gross income
    Ratio,
    /// Donor disposable income copied as is
    Direct,
}

/// Disposable income derived from a donor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertedIncome {
    pub disposable_income: f64,
    pub method: ConversionMethod,
    /// Set when the value does not scale with the household's own earnings
    pub imputed: bool,
}

/// Gross-to-disposable conversion rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomeConverter {
    /// θ, fraction of the median gross income
    pub median_fraction: f64,
    /// ρ_max, ratio ceiling
    pub max_ratio: f64,
}

impl IncomeConverter {
    pub fn new(median_fraction: f64, max_ratio: f64) -> Self {
        Self {
            median_fraction,
            max_ratio,
        }
    }

    /// Convert `target_gross` into disposable income using `donor`
    ///
    /// The donor ratio is trusted when the donor earns at least θ × median
    /// and the ratio does not exceed ρ_max. Otherwise the donor's disposable
    /// income is copied and flagged as imputed.
    pub fn convert(
        &self,
        donor: &DonorRecord,
        target_gross: f64,
        median_income: f64,
    ) -> ConvertedIncome {
        let earns_enough = donor.gross_income >= self.median_fraction * median_income;
        let ratio_trusted = donor.disposable_to_gross_ratio <= self.max_ratio;

        if earns_enough && ratio_trusted {
            ConvertedIncome {
                disposable_income: donor.disposable_to_gross_ratio * target_gross,
                method: ConversionMethod::Ratio,
                imputed: false,
            }
        } else {
            ConvertedIncome {
                disposable_income: donor.disposable_income,
                method: ConversionMethod::Direct,
                imputed: true,
            }
        }
    }
}
