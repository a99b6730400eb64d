use std::fmt;
use std::str::FromStr;

/// Building-use category a facility reports under.
///
/// Stored as its display label (TEXT) and used as the grouping key for all
/// peer comparisons and public aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum BuildingCategory {
    Office,
    Retail,
    Hotel,
    Hospital,
    School,
    Warehouse,
    ResidentialMulti,
    Other,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown building category '{0}'")]
pub struct UnknownCategory(pub String);

impl BuildingCategory {
    pub const ALL: [BuildingCategory; 8] = [
        BuildingCategory::Office,
        BuildingCategory::Retail,
        BuildingCategory::Hotel,
        BuildingCategory::Hospital,
        BuildingCategory::School,
        BuildingCategory::Warehouse,
        BuildingCategory::ResidentialMulti,
        BuildingCategory::Other,
    ];

    pub fn as_label(&self) -> &'static str {
        match self {
            BuildingCategory::Office => "Office",
            BuildingCategory::Retail => "Retail",
            BuildingCategory::Hotel => "Hotel",
            BuildingCategory::Hospital => "Hospital",
            BuildingCategory::School => "School",
            BuildingCategory::Warehouse => "Warehouse",
            BuildingCategory::ResidentialMulti => "Residential (Multi-family)",
            BuildingCategory::Other => "Other",
        }
    }
}

impl fmt::Display for BuildingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl FromStr for BuildingCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .find(|c| c.as_label() == trimmed)
            .copied()
            .ok_or_else(|| UnknownCategory(trimmed.to_string()))
    }
}

impl TryFrom<String> for BuildingCategory {
    type Error = UnknownCategory;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BuildingCategory> for String {
    fn from(c: BuildingCategory) -> Self {
        c.as_label().to_string()
    }
}
