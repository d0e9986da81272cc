use serde::{Deserialize, Serialize};

/// Placeholder shown wherever a label, name or date could not be resolved.
pub const UNKNOWN: &str = "알 수 없음";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientInfo {
    pub english_name: String,
    pub korean_name: String,
    pub shelf_life_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientListEntry {
    pub id: i64,
    pub english_name: String,
    pub korean_name: String,
    pub calculated_shelf_life: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodInfo {
    pub english_name: String,
    pub korean_name: String,
    pub calories: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodCaloriesEntry {
    pub id: i64,
    pub english_name: String,
    pub eaten_date: String,
    pub calories: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub fn label(self) -> &'static str {
        match self {
            Self::Breakfast => "아침",
            Self::Lunch => "점심",
            Self::Dinner => "저녁",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "아침" => Some(Self::Breakfast),
            "점심" => Some(Self::Lunch),
            "저녁" => Some(Self::Dinner),
            _ => None,
        }
    }
}

impl Default for MealSlot {
    fn default() -> Self {
        Self::Breakfast
    }
}

/// One ranked output of an image classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfLifeEstimate {
    pub english_name: String,
    pub korean_name: String,
    pub expires_on: String,
}

impl ShelfLifeEstimate {
    pub fn unknown(english_name: impl Into<String>) -> Self {
        Self {
            english_name: english_name.into(),
            korean_name: UNKNOWN.to_string(),
            expires_on: UNKNOWN.to_string(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.english_name != UNKNOWN && self.korean_name != UNKNOWN && self.expires_on != UNKNOWN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalorieSource {
    /// Taken from the seeded food catalog.
    Catalog,
    /// Classifier confidence scaled by 100. Not a nutritional value.
    ConfidencePlaceholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodEstimate {
    pub english_name: String,
    pub korean_name: Option<String>,
    pub calories: i64,
    pub source: CalorieSource,
}

/// Last classified ingredient as held by the flow controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientPrediction {
    pub english_name: String,
    pub korean_name: String,
    pub expires_on: String,
}

impl Default for IngredientPrediction {
    fn default() -> Self {
        Self {
            english_name: UNKNOWN.to_string(),
            korean_name: UNKNOWN.to_string(),
            expires_on: UNKNOWN.to_string(),
        }
    }
}

impl From<ShelfLifeEstimate> for IngredientPrediction {
    fn from(estimate: ShelfLifeEstimate) -> Self {
        Self {
            english_name: estimate.english_name,
            korean_name: estimate.korean_name,
            expires_on: estimate.expires_on,
        }
    }
}
