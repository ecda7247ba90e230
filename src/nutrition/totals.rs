use serde::Serialize;

use crate::meals::{FoodEntry, Meal};
use crate::targets::DailyTargets;

use super::Macros;

/// Sum of every entry in `meal`. Rounding is applied once to the sum, not per entry.
pub fn meal_totals(meal: &Meal) -> Macros {
    sum_entries(meal.foods.iter())
}

/// Sum of every entry across all meals, with the same rounding policy as [`meal_totals`].
pub fn daily_totals(meals: &[Meal]) -> Macros {
    sum_entries(meals.iter().flat_map(|m| m.foods.iter()))
}

fn sum_entries<'a>(entries: impl Iterator<Item = &'a FoodEntry>) -> Macros {
    entries.map(FoodEntry::macros).sum::<Macros>().rounded()
}

/// `current` as a whole percentage of `target`, capped at 100.
///
/// Returns `None` when `target` is zero, negative or not finite, since no
/// meaningful ratio exists.
pub fn percentage(current: f64, target: f64) -> Option<u8> {
    if !target.is_finite() || target <= 0.0 || !current.is_finite() {
        return None;
    }
    let pct = (current / target * 100.0).round().clamp(0.0, 100.0);
    Some(pct as u8)
}

/// Per-field progress towards the daily targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub protein: Option<u8>,
    pub carbs: Option<u8>,
    pub fats: Option<u8>,
    pub calories: Option<u8>,
}

pub fn progress(totals: &Macros, targets: &DailyTargets) -> Progress {
    Progress {
        protein: percentage(totals.protein, targets.protein),
        carbs: percentage(totals.carbs, targets.carbs),
        fats: percentage(totals.fats, targets.fats),
        calories: percentage(totals.calories, targets.calories),
    }
}
