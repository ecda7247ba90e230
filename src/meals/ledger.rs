use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

use super::{FoodEntry, Meal, MealSlot};

/// Today's meals: always exactly Breakfast, Lunch, Dinner and Snacks in
/// that order. Only entry membership can change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MealLedger {
    meals: [Meal; 4],
}

impl Default for MealLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MealLedger {
    /// Four empty meals.
    pub fn new() -> Self {
        Self {
            meals: MealSlot::ALL.map(Meal::empty),
        }
    }

    pub fn meals(&self) -> &[Meal; 4] {
        &self.meals
    }

    pub fn meal(&self, slot: MealSlot) -> &Meal {
        &self.meals[slot.index()]
    }

    pub fn entry_count(&self) -> usize {
        self.meals.iter().map(|m| m.foods.len()).sum()
    }

    /// Appends `entry` to the meal. Rejects an entry that fails [`FoodEntry::validate`].
    pub fn add_entry(&mut self, meal_index: usize, entry: FoodEntry) -> Result<()> {
        let slot = MealSlot::from_index(meal_index)?;
        entry.validate()?;
        debug!(meal = %slot, entry_id = %entry.id, "entry added");
        self.append(slot, entry);
        Ok(())
    }

    /// Removes the entry with `entry_id` from the meal. Returns `false` if it was not there.
    pub fn remove_entry(&mut self, meal_index: usize, entry_id: &str) -> Result<bool> {
        let slot = MealSlot::from_index(meal_index)?;
        let foods = &mut self.meals[slot.index()].foods;
        let Some(pos) = foods.iter().position(|e| e.id == entry_id) else {
            debug!(meal = %slot, %entry_id, "remove skipped; entry not found");
            return Ok(false);
        };
        foods.remove(pos);
        debug!(meal = %slot, %entry_id, "entry removed");
        Ok(true)
    }

    /// Empties every meal. Each slot gets its own new vector.
    pub fn reset_day(&mut self) {
        for meal in &mut self.meals {
            meal.foods = Vec::new();
        }
        debug!("day reset");
    }

    pub(crate) fn append(&mut self, slot: MealSlot, entry: FoodEntry) {
        self.meals[slot.index()].foods.push(entry);
    }

    pub(crate) fn extend(&mut self, slot: MealSlot, entries: Vec<FoodEntry>) {
        self.meals[slot.index()].foods.extend(entries);
    }

    /// Returns `Err(OutOfRange)` for an index outside 0..=3.
    pub fn meal_at(&self, meal_index: usize) -> Result<&Meal> {
        self.meals.get(meal_index).ok_or(Error::OutOfRange(meal_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> FoodEntry {
        FoodEntry {
            id: id.into(),
            name: "Apple".into(),
            quantity: 1.0,
            unit: "piece".into(),
            protein: 0.3,
            carbs: 25.0,
            fats: 0.2,
            calories: 95.0,
        }
    }

    #[test]
    fn new_ledger_has_four_named_slots() {
        let ledger = MealLedger::new();
        let names: Vec<_> = ledger.meals().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Breakfast", "Lunch", "Dinner", "Snacks"]);
        assert_eq!(ledger.entry_count(), 0);
    }

    #[test]
    fn add_entry_appends_in_order() {
        let mut ledger = MealLedger::new();
        ledger.add_entry(1, entry("a")).unwrap();
        ledger.add_entry(1, entry("b")).unwrap();
        let ids: Vec<_> = ledger.meal(MealSlot::Lunch).foods.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn add_entry_out_of_range_leaves_state_unchanged() {
        let mut ledger = MealLedger::new();
        let err = ledger.add_entry(4, entry("a")).unwrap_err();
        assert!(matches!(err, Error::OutOfRange(4)));
        assert_eq!(ledger, MealLedger::new());
    }

    #[test]
    fn add_entry_rejects_invalid_numbers() {
        let mut ledger = MealLedger::new();
        ledger.add_entry(0, entry("kept")).unwrap();

        let nan = FoodEntry { protein: f64::NAN, ..entry("nan") };
        assert!(matches!(ledger.add_entry(1, nan), Err(Error::Validation(_))));
        let negative = FoodEntry { quantity: -4.0, ..entry("neg") };
        assert!(matches!(ledger.add_entry(1, negative), Err(Error::Validation(_))));

        assert_eq!(ledger.entry_count(), 1);
        assert!(ledger.meal(MealSlot::Lunch).foods.is_empty());
    }

    #[test]
    fn remove_entry_only_touches_matching_id() {
        let mut ledger = MealLedger::new();
        ledger.add_entry(2, entry("a")).unwrap();
        ledger.add_entry(2, entry("b")).unwrap();
        assert!(ledger.remove_entry(2, "a").unwrap());
        assert!(!ledger.remove_entry(2, "a").unwrap());
        assert_eq!(ledger.meal(MealSlot::Dinner).foods.len(), 1);
        assert_eq!(ledger.meal(MealSlot::Dinner).foods[0].id, "b");
        assert!(ledger.remove_entry(7, "b").is_err());
    }

    #[test]
    fn reset_day_empties_every_slot_independently() {
        let mut ledger = MealLedger::new();
        for i in 0..4 {
            ledger.add_entry(i, entry(&format!("e{i}"))).unwrap();
        }
        ledger.reset_day();
        assert_eq!(ledger.entry_count(), 0);
        assert_eq!(ledger, MealLedger::new());

        ledger.add_entry(0, entry("fresh")).unwrap();
        assert_eq!(ledger.meal(MealSlot::Breakfast).foods.len(), 1);
        for slot in [MealSlot::Lunch, MealSlot::Dinner, MealSlot::Snacks] {
            assert!(ledger.meal(slot).foods.is_empty());
        }
    }

    #[test]
    fn serializes_as_array_of_named_meals() {
        let mut ledger = MealLedger::new();
        ledger.add_entry(3, entry("a")).unwrap();
        let json = serde_json::to_value(&ledger).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(4));
        assert_eq!(json[3]["name"], "Snacks");
        assert_eq!(json[3]["foods"][0]["id"], "a");
    }
}
