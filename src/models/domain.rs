use crate::error::ImputeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Household composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Occupancy {
    Couple,
    SingleMale,
    SingleFemale,
}

impl fmt::Display for Occupancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Occupancy::Couple => "couple",
            Occupancy::SingleMale => "single male",
            Occupancy::SingleFemale => "single female",
        };
        f.write_str(label)
    }
}

impl FromStr for Occupancy {
    type Err = ImputeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['_', ' '], "").as_str() {
            "couple" => Ok(Occupancy::Couple),
            "singlemale" | "singlemen" => Ok(Occupancy::SingleMale),
            "singlefemale" | "singlewomen" => Ok(Occupancy::SingleFemale),
            _ => Err(ImputeError::UnknownCategory {
                kind: "occupancy",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn opposite(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthCategory {
    Good,
    Poor,
}

impl HealthCategory {
    /// Long-term sick or disabled adults are in poor health, everyone else in good health
    pub fn from_long_term_sick(long_term_sick_or_disabled: bool) -> Self {
        if long_term_sick_or_disabled {
            HealthCategory::Poor
        } else {
            HealthCategory::Good
        }
    }
}

/// UK NUTS-1 regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    #[serde(alias = "UKC")]
    NorthEast,
    #[serde(alias = "UKD")]
    NorthWest,
    #[serde(alias = "UKE")]
    YorkshireAndTheHumber,
    #[serde(alias = "UKF")]
    EastMidlands,
    #[serde(alias = "UKG")]
    WestMidlands,
    #[serde(alias = "UKH")]
    EastOfEngland,
    #[serde(alias = "UKI")]
    London,
    #[serde(alias = "UKJ")]
    SouthEast,
    #[serde(alias = "UKK")]
    SouthWest,
    #[serde(alias = "UKL")]
    Wales,
    #[serde(alias = "UKM")]
    Scotland,
    #[serde(alias = "UKN")]
    NorthernIreland,
}

impl Region {
    pub const ALL: [Region; 12] = [
        Region::NorthEast,
        Region::NorthWest,
        Region::YorkshireAndTheHumber,
        Region::EastMidlands,
        Region::WestMidlands,
        Region::EastOfEngland,
        Region::London,
        Region::SouthEast,
        Region::SouthWest,
        Region::Wales,
        Region::Scotland,
        Region::NorthernIreland,
    ];

    /// NUTS-1 code, e.g. `UKI` for London
    pub fn code(self) -> &'static str {
        match self {
            Region::NorthEast => "UKC",
            Region::NorthWest => "UKD",
            Region::YorkshireAndTheHumber => "UKE",
            Region::EastMidlands => "UKF",
            Region::WestMidlands => "UKG",
            Region::EastOfEngland => "UKH",
            Region::London => "UKI",
            Region::SouthEast => "UKJ",
            Region::SouthWest => "UKK",
            Region::Wales => "UKL",
            Region::Scotland => "UKM",
            Region::NorthernIreland => "UKN",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = ImputeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Region::ALL
            .into_iter()
            .find(|region| {
                region.code().eq_ignore_ascii_case(trimmed)
                    || format!("{:?}", region).eq_ignore_ascii_case(&trimmed.replace('_', ""))
            })
            .ok_or_else(|| ImputeError::UnknownCategory {
                kind: "region",
                value: value.to_string(),
            })
    }
}

/// Bucket of weekly working hours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LabourBin {
    #[serde(rename = "0h", alias = "zero")]
    Zero,
    #[serde(rename = "1-15h", alias = "ten")]
    Ten,
    #[serde(rename = "16-29h", alias = "twenty")]
    Twenty,
    #[serde(rename = "30-39h", alias = "thirty")]
    Thirty,
    #[serde(rename = "40h+", alias = "forty")]
    Forty,
}

impl LabourBin {
    pub const ALL: [LabourBin; 5] = [
        LabourBin::Zero,
        LabourBin::Ten,
        LabourBin::Twenty,
        LabourBin::Thirty,
        LabourBin::Forty,
    ];

    /// Representative weekly hours of the bin
    pub fn hours(self) -> u32 {
        match self {
            LabourBin::Zero => 0,
            LabourBin::Ten => 10,
            LabourBin::Twenty => 20,
            LabourBin::Thirty => 30,
            LabourBin::Forty => 40,
        }
    }

    /// Bin containing the given number of weekly hours
    pub fn from_hours(hours: f64) -> Self {
        if hours <= 0.0 {
            LabourBin::Zero
        } else if hours < 16.0 {
            LabourBin::Ten
        } else if hours < 30.0 {
            LabourBin::Twenty
        } else if hours < 40.0 {
            LabourBin::Thirty
        } else {
            LabourBin::Forty
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LabourBin::Zero => "0h",
            LabourBin::Ten => "1-15h",
            LabourBin::Twenty => "16-29h",
            LabourBin::Thirty => "30-39h",
            LabourBin::Forty => "40h+",
        }
    }
}

impl fmt::Display for LabourBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LabourBin {
    type Err = ImputeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        LabourBin::ALL
            .into_iter()
            .find(|bin| {
                bin.label() == trimmed || format!("{:?}", bin).eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| ImputeError::UnknownCategory {
                kind: "labour bin",
                value: value.to_string(),
            })
    }
}

/// One adult member of a household
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adult {
    #[serde(rename = "longTermSickOrDisabled", default)]
    pub long_term_sick_or_disabled: bool,
    pub age: u32,
    #[serde(rename = "potentialHourlyWage")]
    pub potential_hourly_wage: f64,
    pub labour: LabourBin,
}

impl Adult {
    pub fn new(age: u32, potential_hourly_wage: f64, labour: LabourBin) -> Self {
        Self {
            long_term_sick_or_disabled: false,
            age,
            potential_hourly_wage,
            labour,
        }
    }

    pub fn long_term_sick(mut self, flag: bool) -> Self {
        self.long_term_sick_or_disabled = flag;
        self
    }

    pub fn health(&self) -> HealthCategory {
        HealthCategory::from_long_term_sick(self.long_term_sick_or_disabled)
    }

    /// Age capped at the configured top-code
    #[inline]
    pub fn age_top_coded(&self, top_code: u32) -> u32 {
        self.age.min(top_code)
    }
}

/// Household attributes used to search the donor population.
///
/// Simulated households build one per candidate labour configuration; donor
/// records carry the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdProfile {
    pub occupancy: Occupancy,
    pub region: Region,
    #[serde(rename = "numberOfChildren", default)]
    pub number_of_children: u32,
    #[serde(default)]
    pub male: Option<Adult>,
    #[serde(default)]
    pub female: Option<Adult>,
}

pub type QueryProfile = HouseholdProfile;

impl HouseholdProfile {
    pub fn couple(region: Region, number_of_children: u32, male: Adult, female: Adult) -> Self {
        Self {
            occupancy: Occupancy::Couple,
            region,
            number_of_children,
            male: Some(male),
            female: Some(female),
        }
    }

    pub fn single(region: Region, number_of_children: u32, gender: Gender, adult: Adult) -> Self {
        let (occupancy, male, female) = match gender {
            Gender::Male => (Occupancy::SingleMale, Some(adult), None),
            Gender::Female => (Occupancy::SingleFemale, None, Some(adult)),
        };
        Self {
            occupancy,
            region,
            number_of_children,
            male,
            female,
        }
    }

    pub fn adult(&self, gender: Gender) -> Option<&Adult> {
        match gender {
            Gender::Male => self.male.as_ref(),
            Gender::Female => self.female.as_ref(),
        }
    }

    pub fn adult_count(&self) -> usize {
        usize::from(self.male.is_some()) + usize::from(self.female.is_some())
    }

    /// Gender of the reference adult of a single-adult household
    pub fn single_gender(&self) -> Option<Gender> {
        match self.occupancy {
            Occupancy::Couple => None,
            Occupancy::SingleMale => Some(Gender::Male),
            Occupancy::SingleFemale => Some(Gender::Female),
        }
    }

    /// Reject households whose adults contradict the occupancy or whose wages are unusable
    pub fn validate(&self) -> Result<(), ImputeError> {
        let consistent = match self.occupancy {
            Occupancy::Couple => self.male.is_some() && self.female.is_some(),
            Occupancy::SingleMale => self.male.is_some() && self.female.is_none(),
            Occupancy::SingleFemale => self.male.is_none() && self.female.is_some(),
        };
        if !consistent {
            return Err(ImputeError::MalformedProfile(format!(
                "{} household with {} adult(s) (male present: {}, female present: {})",
                self.occupancy,
                self.adult_count(),
                self.male.is_some(),
                self.female.is_some()
            )));
        }

        for adult in self.male.iter().chain(self.female.iter()) {
            let wage = adult.potential_hourly_wage;
            if !wage.is_finite() || wage < 0.0 {
                return Err(ImputeError::MalformedProfile(format!(
                    "potential hourly wage must be finite and non-negative, got {}",
                    wage
                )));
            }
        }

        Ok(())
    }
}

/// Reference household with a known tax-and-benefit outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorRecord {
    #[serde(rename = "donorId")]
    pub donor_id: u64,
    pub profile: HouseholdProfile,
    /// Monthly gross income
    #[serde(rename = "grossIncome")]
    pub gross_income: f64,
    /// Monthly disposable income
    #[serde(rename = "disposableIncome")]
    pub disposable_income: f64,
    #[serde(rename = "disposableToGrossRatio")]
    pub disposable_to_gross_ratio: f64,
}

impl DonorRecord {
    pub fn validate(&self) -> Result<(), ImputeError> {
        self.profile.validate()?;
        let incomes = [
            self.gross_income,
            self.disposable_income,
            self.disposable_to_gross_ratio,
        ];
        if incomes.iter().any(|value| !value.is_finite()) {
            return Err(ImputeError::MalformedProfile(format!(
                "donor {} has non-finite income data",
                self.donor_id
            )));
        }
        Ok(())
    }
}

/// One candidate labour-supply configuration of a simulated household
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabourOption {
    /// Caller-chosen name of the configuration, echoed back in results
    pub label: String,
    pub profile: HouseholdProfile,
    /// Simulated monthly gross income under this configuration
    #[serde(rename = "grossIncome")]
    pub gross_income: f64,
}

impl LabourOption {
    /// Reject configurations with an unusable profile or target gross income
    pub fn validate(&self) -> Result<(), ImputeError> {
        self.profile.validate()?;
        if !self.gross_income.is_finite() || self.gross_income < 0.0 {
            return Err(ImputeError::MalformedProfile(format!(
                "configuration {} has gross income {}, expected finite and non-negative",
                self.label, self.gross_income
            )));
        }
        Ok(())
    }
}

/// Constants steering the matching cascade and the income conversion
#[derive(Debug, Clone, PartialEq)]
pub struct MatchParams {
    /// Ages above this value are capped before keying and age comparison
    pub age_top_code: u32,
    pub children_base_discrepancy: f64,
    pub children_discrepancy_per_child: f64,
    /// Ascending earnings discrepancy thresholds, one tier each
    pub earnings_thresholds: Vec<f64>,
    /// Largest admissible squared age distance
    pub age_bound: f64,
    /// θ: donor gross income must reach this fraction of the median for the ratio method
    pub median_fraction: f64,
    /// ρ_max: largest disposable-to-gross ratio trusted by the ratio method
    pub max_ratio: f64,
    /// Always admit the closest-age donor of the first non-empty earnings tier
    pub guarantee_age_match: bool,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            age_top_code: 80,
            children_base_discrepancy: 0.0,
            children_discrepancy_per_child: 0.25,
            earnings_thresholds: vec![0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 10.0, 50.0],
            age_bound: 25.0,
            median_fraction: 0.1,
            max_ratio: 1.5,
            guarantee_age_match: false,
        }
    }
}

impl MatchParams {
    /// Initial children-count discrepancy tolerated for a query household
    pub fn children_bound(&self, number_of_children: u32) -> f64 {
        self.children_base_discrepancy
            + self.children_discrepancy_per_child * f64::from(number_of_children)
    }

    pub fn validate(&self) -> Result<(), ImputeError> {
        if self.earnings_thresholds.is_empty() {
            return Err(ImputeError::InvalidParams(
                "at least one earnings threshold is required".to_string(),
            ));
        }
        if self
            .earnings_thresholds
            .iter()
            .any(|threshold| !threshold.is_finite() || *threshold <= 0.0)
        {
            return Err(ImputeError::InvalidParams(
                "earnings thresholds must be finite and positive".to_string(),
            ));
        }
        if self.earnings_thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ImputeError::InvalidParams(
                "earnings thresholds must be strictly ascending".to_string(),
            ));
        }
        let children = [self.children_base_discrepancy, self.children_discrepancy_per_child];
        if children.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return Err(ImputeError::InvalidParams(
                "children discrepancy must be finite and non-negative".to_string(),
            ));
        }
        if !self.age_bound.is_finite() || self.age_bound < 0.0 {
            return Err(ImputeError::InvalidParams(
                "age bound must be finite and non-negative".to_string(),
            ));
        }
        if !self.median_fraction.is_finite() || !self.max_ratio.is_finite() {
            return Err(ImputeError::InvalidParams(
                "income conversion constants must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
