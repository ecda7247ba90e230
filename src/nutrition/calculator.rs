use tracing::debug;

use crate::error::{Error, Result};
use crate::foods::FoodItem;

use super::Macros;

const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FATS: f64 = 9.0;

/// Rounds to 2 decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounds to the nearest integer, half away from zero.
pub fn round0(value: f64) -> f64 {
    value.round()
}

/// Macros for `quantity` units of `food`.
///
/// Food values describe `macro_per` units, so the ratio is
/// `quantity / macro_per`. Grams are rounded to 2 decimals and calories to
/// a whole number. A food with a non-positive `macro_per` cannot be scaled.
pub fn scale(food: &FoodItem, quantity: f64) -> Result<Macros> {
    if !food.macro_per.is_finite() || food.macro_per <= 0.0 {
        return Err(Error::validation(format!(
            "food {} has macroPer {}; it must be positive",
            food.id, food.macro_per
        )));
    }
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(Error::validation(format!(
            "quantity {quantity} must be a non-negative number"
        )));
    }

    let ratio = quantity / food.macro_per;
    let scaled = Macros {
        protein: round2(food.protein * ratio),
        carbs: round2(food.carbs * ratio),
        fats: round2(food.fats * ratio),
        calories: round0(food.calories * ratio),
    };
    debug!(food_id = %food.id, quantity, ratio, "scaled macros");
    Ok(scaled)
}

/// Calories from macros using the 4-4-9 rule, rounded to 2 decimals.
pub fn derive_calories(protein: f64, carbs: f64, fats: f64) -> f64 {
    round2(protein * KCAL_PER_G_PROTEIN + carbs * KCAL_PER_G_CARBS + fats * KCAL_PER_G_FATS)
}
