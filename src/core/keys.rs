use crate::models::{HealthCategory, HouseholdProfile, LabourBin, Region};
use serde::Serialize;
use std::fmt;

/// Labour bins of the household adults, male first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabourKey {
    pub male: Option<LabourBin>,
    pub female: Option<LabourBin>,
}

/// Health categories of the household adults, male first.
///
/// Not commutative: a (Good, Poor) couple and a (Poor, Good) couple have
/// different keys. Cross-gender equivalence is left to health refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HealthKey {
    pub male: Option<HealthCategory>,
    pub female: Option<HealthCategory>,
}

/// Top-coded ages of the household adults, male first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgeKey {
    pub male: Option<u32>,
    pub female: Option<u32>,
}

/// Full five-dimensional matching key of a household
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyTuple {
    pub labour: LabourKey,
    pub health: HealthKey,
    pub children: u32,
    pub region: Region,
    pub age: AgeKey,
}

impl KeyTuple {
    /// Derive the key of a query profile or donor household
    pub fn from_profile(profile: &HouseholdProfile, age_top_code: u32) -> Self {
        let male = profile.male.as_ref();
        let female = profile.female.as_ref();

        Self {
            labour: LabourKey {
                male: male.map(|adult| adult.labour),
                female: female.map(|adult| adult.labour),
            },
            health: HealthKey {
                male: male.map(|adult| adult.health()),
                female: female.map(|adult| adult.health()),
            },
            children: profile.number_of_children,
            region: profile.region,
            age: AgeKey {
                male: male.map(|adult| adult.age_top_coded(age_top_code)),
                female: female.map(|adult| adult.age_top_coded(age_top_code)),
            },
        }
    }

    /// Index key keeping only the dimensions used at `level`
    pub fn index_key(&self, level: MatchLevel) -> IndexKey {
        match level {
            MatchLevel::Exact => IndexKey::Exact {
                labour: self.labour,
                health: self.health,
                children: self.children,
                region: self.region,
                age: self.age,
            },
            MatchLevel::DropAge => IndexKey::DropAge {
                labour: self.labour,
                health: self.health,
                children: self.children,
                region: self.region,
            },
            MatchLevel::DropRegion => IndexKey::DropRegion {
                labour: self.labour,
                health: self.health,
                children: self.children,
            },
            MatchLevel::DropChildren => IndexKey::DropChildren {
                labour: self.labour,
                health: self.health,
            },
            MatchLevel::LabourOnly => IndexKey::LabourOnly {
                labour: self.labour,
            },
        }
    }

    /// Every index key a donor with this key is filed under
    pub fn index_keys(&self) -> impl Iterator<Item = IndexKey> + '_ {
        MatchLevel::ALL.into_iter().map(move |level| self.index_key(level))
    }
}

/// Donor index key at one relaxation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKey {
    Exact {
        labour: LabourKey,
        health: HealthKey,
        children: u32,
        region: Region,
        age: AgeKey,
    },
    DropAge {
        labour: LabourKey,
        health: HealthKey,
        children: u32,
        region: Region,
    },
    DropRegion {
        labour: LabourKey,
        health: HealthKey,
        children: u32,
    },
    DropChildren {
        labour: LabourKey,
        health: HealthKey,
    },
    LabourOnly {
        labour: LabourKey,
    },
}

impl IndexKey {
    pub fn level(&self) -> MatchLevel {
        match self {
            IndexKey::Exact { .. } => MatchLevel::Exact,
            IndexKey::DropAge { .. } => MatchLevel::DropAge,
            IndexKey::DropRegion { .. } => MatchLevel::DropRegion,
            IndexKey::DropChildren { .. } => MatchLevel::DropChildren,
            IndexKey::LabourOnly { .. } => MatchLevel::LabourOnly,
        }
    }
}

/// Relaxation level of the hierarchical lookup, most specific first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchLevel {
    Exact,
    DropAge,
    DropRegion,
    DropChildren,
    LabourOnly,
}

/// Dimensions that need distance-based refinement after an index hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Refinements {
    pub health: bool,
    pub children: bool,
    pub age: bool,
}

impl MatchLevel {
    /// Levels in the order the lookup tries them
    pub const ALL: [MatchLevel; 5] = [
        MatchLevel::Exact,
        MatchLevel::DropAge,
        MatchLevel::DropRegion,
        MatchLevel::DropChildren,
        MatchLevel::LabourOnly,
    ];

    /// 1 for the exact key up to 5 for labour only
    pub fn number(self) -> u8 {
        match self {
            MatchLevel::Exact => 1,
            MatchLevel::DropAge => 2,
            MatchLevel::DropRegion => 3,
            MatchLevel::DropChildren => 4,
            MatchLevel::LabourOnly => 5,
        }
    }

    // Region is never refined once dropped.
    pub fn refinements(self) -> Refinements {
        Refinements {
            health: self >= MatchLevel::LabourOnly,
            children: self >= MatchLevel::DropChildren,
            age: self >= MatchLevel::DropAge,
        }
    }
}

impl fmt::Display for MatchLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {}", self.number())
    }
}
