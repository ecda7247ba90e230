use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::nutrition::{derive_calories, round2};

/// A reusable food definition. Macro values describe `macro_per` units of `unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub macro_per: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub calories: f64,
}

/// Food as entered by the user, before it has an id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodDraft {
    pub name: String,
    pub unit: String,
    pub macro_per: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    /// 0 means "derive from macros".
    #[serde(default)]
    pub calories: f64,
}

impl Default for FoodDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            unit: "g".into(),
            macro_per: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fats: 0.0,
            calories: 0.0,
        }
    }
}

impl FoodDraft {
    /// Normalizes the draft into a catalog item carrying `id`.
    ///
    /// Zero calories are replaced with the 4-4-9 value. A food that really
    /// has zero calories but non-zero macros cannot be expressed this way.
    pub fn into_item(self, id: impl Into<String>) -> FoodItem {
        let calories = if self.calories == 0.0 {
            derive_calories(self.protein, self.carbs, self.fats)
        } else {
            self.calories
        };
        FoodItem {
            id: id.into(),
            name: self.name,
            unit: self.unit,
            macro_per: round2(self.macro_per),
            protein: round2(self.protein),
            carbs: round2(self.carbs),
            fats: round2(self.fats),
            calories: round2(calories),
        }
    }
}

impl FoodItem {
    /// Builds a new catalog item with a freshly generated id.
    pub fn new(draft: FoodDraft) -> Self {
        draft.into_item(format!("food-{}", Uuid::new_v4()))
    }

    /// Applies an edit, keeping this item's identity.
    pub fn edited(&self, draft: FoodDraft) -> Self {
        draft.into_item(self.id.clone())
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::validation("food id must not be empty"));
        }
        if !self.macro_per.is_finite() || self.macro_per <= 0.0 {
            return Err(Error::validation(format!(
                "macroPer must be positive, got {}",
                self.macro_per
            )));
        }
        for (field, value) in [
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fats", self.fats),
            ("calories", self.calories),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::validation(format!(
                    "{field} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> FoodDraft {
        FoodDraft {
            name: "Chicken breast".into(),
            unit: "g".into(),
            macro_per: 100.0,
            protein: 31.0,
            carbs: 0.0,
            fats: 3.6,
            calories: 0.0,
        }
    }

    #[test]
    fn zero_calories_are_derived() {
        let item = FoodItem::new(draft());
        assert_eq!(item.calories, 156.4);
        assert!(item.id.starts_with("food-"));
    }

    #[test]
    fn explicit_calories_are_kept() {
        let item = FoodItem::new(FoodDraft {
            calories: 165.0,
            ..draft()
        });
        assert_eq!(item.calories, 165.0);
    }

    #[test]
    fn numbers_are_rounded_to_two_decimals() {
        let item = FoodItem::new(FoodDraft {
            macro_per: 33.333,
            protein: 1.005_1,
            fats: 2.499,
            ..draft()
        });
        assert_eq!(item.macro_per, 33.33);
        assert_eq!(item.protein, 1.01);
        assert_eq!(item.fats, 2.5);
    }

    #[test]
    fn edit_keeps_identity() {
        let item = FoodItem::new(draft());
        let edited = item.edited(FoodDraft {
            name: "Grilled chicken".into(),
            ..draft()
        });
        assert_eq!(edited.id, item.id);
        assert_eq!(edited.name, "Grilled chicken");
    }

    #[test]
    fn validate_rejects_zero_macro_per_and_negative_macros() {
        let mut item = FoodItem::new(draft());
        assert!(item.validate().is_ok());

        item.macro_per = 0.0;
        assert!(matches!(item.validate(), Err(Error::Validation(_))));

        item.macro_per = 100.0;
        item.fats = -1.0;
        assert!(item.validate().is_err());
    }

    #[test]
    fn serializes_with_camel_case_macro_per() {
        let item = FoodItem::new(draft());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["macroPer"], 100.0);
        assert!(json.get("macro_per").is_none());
    }
}
