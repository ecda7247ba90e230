use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::nutrition::{derive_calories, round0, round2};

/// Daily macro and calorie goals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTargets {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub calories: f64,
}

pub const DEFAULT_DAILY_TARGETS: DailyTargets = DailyTargets {
    protein: 96.0,
    carbs: 240.0,
    fats: 64.0,
    calories: 1918.0,
};

impl Default for DailyTargets {
    fn default() -> Self {
        DEFAULT_DAILY_TARGETS
    }
}

impl DailyTargets {
    /// Targets whose calories follow from the macros (4-4-9).
    pub fn from_macros(protein: f64, carbs: f64, fats: f64) -> Self {
        Self {
            protein,
            carbs,
            fats,
            calories: derive_calories(protein, carbs, fats),
        }
    }

    /// Grams to 2 decimals, calories to a whole number.
    pub fn normalized(self) -> Self {
        Self {
            protein: round2(self.protein),
            carbs: round2(self.carbs),
            fats: round2(self.fats),
            calories: round0(self.calories),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fats", self.fats),
            ("calories", self.calories),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::validation(format!(
                    "target {field} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
