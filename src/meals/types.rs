use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::foods::FoodItem;
use crate::nutrition::{scale, Macros};

/// One of the four fixed meal slots, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

impl MealSlot {
    pub const ALL: [MealSlot; 4] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Dinner,
        MealSlot::Snacks,
    ];

    pub fn index(self) -> usize {
        match self {
            MealSlot::Breakfast => 0,
            MealSlot::Lunch => 1,
            MealSlot::Dinner => 2,
            MealSlot::Snacks => 3,
        }
    }

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(Error::OutOfRange(index))
    }

    pub fn name(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
            MealSlot::Snacks => "Snacks",
        }
    }

    /// Slot for a meal name from an older layout. Matching is a
    /// case-sensitive substring test; anything unrecognised lands in Snacks.
    pub fn classify(legacy_name: &str) -> Self {
        if legacy_name.contains("Breakfast") {
            MealSlot::Breakfast
        } else if legacy_name.contains("Lunch") {
            MealSlot::Lunch
        } else if legacy_name.contains("Dinner") {
            MealSlot::Dinner
        } else {
            MealSlot::Snacks
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A logged portion of food. Values are copied from the catalog item when
/// logged and never follow later edits to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub calories: f64,
}

impl FoodEntry {
    /// Snapshots `quantity` units of `food`.
    pub fn log(food: &FoodItem, quantity: f64) -> Result<Self> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(Error::validation(format!(
                "quantity must be greater than zero, got {quantity}"
            )));
        }
        let m = scale(food, quantity)?;
        Ok(Self {
            id: format!("{}-{}", food.id, Uuid::new_v4()),
            name: food.name.clone(),
            quantity,
            unit: food.unit.clone(),
            protein: m.protein,
            carbs: m.carbs,
            fats: m.fats,
            calories: m.calories,
        })
    }

    /// Checks an entry built outside [`FoodEntry::log`]: the id must be
    /// non-empty and every number finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::validation("entry id must not be empty"));
        }
        for (field, value) in [
            ("quantity", self.quantity),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fats", self.fats),
            ("calories", self.calories),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::validation(format!(
                    "entry {field} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn macros(&self) -> Macros {
        Macros {
            protein: self.protein,
            carbs: self.carbs,
            fats: self.fats,
            calories: self.calories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub foods: Vec<FoodEntry>,
}

impl Meal {
    pub fn empty(slot: MealSlot) -> Self {
        Self {
            name: slot.name().to_string(),
            foods: Vec::new(),
        }
    }
}
