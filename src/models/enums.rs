use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Meal slots a budget or expenditure can be attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MealType::Breakfast => write!(f, "breakfast"),
            MealType::Lunch => write!(f, "lunch"),
            MealType::Dinner => write!(f, "dinner"),
        }
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            _ => Err(format!("Invalid meal type: {}", s)),
        }
    }
}

/// Address classification for a member's saved addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    Home,
    Work,
    Etc,
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressKind::Home => write!(f, "home"),
            AddressKind::Work => write!(f, "work"),
            AddressKind::Etc => write!(f, "etc"),
        }
    }
}

impl FromStr for AddressKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "home" => Ok(AddressKind::Home),
            "work" => Ok(AddressKind::Work),
            "etc" => Ok(AddressKind::Etc),
            _ => Err(format!("Invalid address kind: {}", s)),
        }
    }
}

/// Spending disposition used to seed member preferences at signup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationType {
    Saving,
    Balanced,
    Indulgent,
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationType::Saving => write!(f, "saving"),
            RecommendationType::Balanced => write!(f, "balanced"),
            RecommendationType::Indulgent => write!(f, "indulgent"),
        }
    }
}

impl FromStr for RecommendationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "saving" => Ok(RecommendationType::Saving),
            "balanced" => Ok(RecommendationType::Balanced),
            "indulgent" => Ok(RecommendationType::Indulgent),
            _ => Err(format!("Invalid recommendation type: {}", s)),
        }
    }
}

/// Card vendors recognized by the SMS parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardVendor {
    Kb,
    Shinhan,
    Nh,
}

impl fmt::Display for CardVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardVendor::Kb => write!(f, "kb"),
            CardVendor::Shinhan => write!(f, "shinhan"),
            CardVendor::Nh => write!(f, "nh"),
        }
    }
}

impl FromStr for CardVendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kb" => Ok(CardVendor::Kb),
            "shinhan" => Ok(CardVendor::Shinhan),
            "nh" => Ok(CardVendor::Nh),
            _ => Err(format!("Invalid card vendor: {}", s)),
        }
    }
}
