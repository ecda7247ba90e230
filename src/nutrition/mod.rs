//! Macro arithmetic: per-quantity scaling, 4-4-9 calorie derivation and
//! meal/day aggregation against targets.

pub mod calculator;
pub mod totals;

use serde::{Deserialize, Serialize};

pub use calculator::{derive_calories, round0, round2, scale};
pub use totals::{daily_totals, meal_totals, percentage, progress, Progress};

/// Protein/carbs/fats in grams plus calories in kcal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub calories: f64,
}

impl Macros {
    pub const ZERO: Macros = Macros {
        protein: 0.0,
        carbs: 0.0,
        fats: 0.0,
        calories: 0.0,
    };

    /// Rounds grams to 2 decimals and calories to a whole number.
    pub fn rounded(self) -> Self {
        Self {
            protein: round2(self.protein),
            carbs: round2(self.carbs),
            fats: round2(self.fats),
            calories: round0(self.calories),
        }
    }
}

impl std::ops::Add for Macros {
    type Output = Macros;

    fn add(self, rhs: Macros) -> Macros {
        Macros {
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fats: self.fats + rhs.fats,
            calories: self.calories + rhs.calories,
        }
    }
}

impl std::iter::Sum for Macros {
    fn sum<I: Iterator<Item = Macros>>(iter: I) -> Macros {
        iter.fold(Macros::ZERO, |acc, m| acc + m)
    }
}
