//! Normalizes a persisted meal structure into the four canonical slots.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{FoodEntry, MealLedger, MealSlot};

#[derive(Debug, Deserialize)]
struct StoredMeal {
    name: String,
    #[serde(default)]
    foods: Vec<Value>,
}

/// Result of reading a persisted meal structure.
#[derive(Debug, Clone, PartialEq)]
pub enum Migration {
    /// Already Breakfast/Lunch/Dinner/Snacks; taken as-is.
    Canonical(MealLedger),
    /// Reshaped from an older layout, or stripped of unreadable meals or
    /// entries; should be written back once.
    Migrated(MealLedger),
    /// Unreadable; replaced with four empty meals.
    Malformed(MealLedger),
}

impl Migration {
    pub fn needs_save(&self) -> bool {
        matches!(self, Migration::Migrated(_))
    }

    pub fn into_ledger(self) -> MealLedger {
        match self {
            Migration::Canonical(l) | Migration::Migrated(l) | Migration::Malformed(l) => l,
        }
    }
}

struct DecodedMeal {
    name: String,
    foods: Vec<FoodEntry>,
}

pub fn migrate(raw: Value) -> Migration {
    let Value::Array(items) = raw else {
        warn!("stored meals are not a list; starting from empty meals");
        return Migration::Malformed(MealLedger::new());
    };

    let stored_count = items.len();
    let mut dropped = 0usize;
    let mut meals = Vec::with_capacity(stored_count);
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<StoredMeal>(item) {
            Ok(meal) => meals.push(decode_meal(meal, &mut dropped)),
            Err(e) => {
                warn!(error = %e, position = i, "unreadable meal dropped");
                dropped += 1;
            }
        }
    }
    if stored_count > 0 && meals.is_empty() {
        warn!("no stored meal is readable; starting from empty meals");
        return Migration::Malformed(MealLedger::new());
    }

    if dropped == 0 && is_canonical(&meals) {
        let mut ledger = MealLedger::new();
        for (slot, meal) in MealSlot::ALL.into_iter().zip(meals) {
            ledger.extend(slot, meal.foods);
        }
        return Migration::Canonical(ledger);
    }

    let stored_names: Vec<&str> = meals.iter().map(|m| m.name.as_str()).collect();
    info!(?stored_names, dropped, "migrating meals to canonical slots");

    let mut ledger = MealLedger::new();
    for meal in meals {
        let slot = MealSlot::classify(&meal.name);
        ledger.extend(slot, meal.foods);
    }
    Migration::Migrated(ledger)
}

fn decode_meal(meal: StoredMeal, dropped: &mut usize) -> DecodedMeal {
    let mut foods = Vec::with_capacity(meal.foods.len());
    for raw in meal.foods {
        match decode_entry(raw) {
            Ok(entry) => foods.push(entry),
            Err(e) => {
                warn!(error = %e, meal = %meal.name, "unreadable entry dropped");
                *dropped += 1;
            }
        }
    }
    DecodedMeal {
        name: meal.name,
        foods,
    }
}

fn decode_entry(raw: Value) -> crate::Result<FoodEntry> {
    let entry: FoodEntry = serde_json::from_value(raw)?;
    entry.validate()?;
    Ok(entry)
}

fn is_canonical(meals: &[DecodedMeal]) -> bool {
    meals.len() == MealSlot::ALL.len()
        && meals
            .iter()
            .zip(MealSlot::ALL)
            .all(|(meal, slot)| meal.name == slot.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str) -> Value {
        json!({
            "id": id,
            "name": id,
            "quantity": 1.0,
            "unit": "g",
            "protein": 1.0,
            "carbs": 2.0,
            "fats": 3.0,
            "calories": 39.0
        })
    }

    fn ids(ledger: &MealLedger, slot: MealSlot) -> Vec<String> {
        ledger.meal(slot).foods.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn canonical_structure_passes_through() {
        let raw = json!([
            { "name": "Breakfast", "foods": [entry("a"), entry("b")] },
            { "name": "Lunch", "foods": [] },
            { "name": "Dinner", "foods": [entry("c")] },
            { "name": "Snacks", "foods": [entry("d")] }
        ]);
        let migration = migrate(raw.clone());
        assert!(!migration.needs_save());
        let Migration::Canonical(ledger) = migration else {
            panic!("expected canonical");
        };
        assert_eq!(serde_json::to_value(&ledger).unwrap(), raw);
    }

    #[test]
    fn legacy_meals_are_merged_by_name() {
        let raw = json!([
            { "name": "Morning Breakfast", "foods": [entry("A"), entry("B")] },
            { "name": "Late Dinner", "foods": [entry("C")] },
            { "name": "Midnight Snack", "foods": [entry("D")] },
            { "name": "Brunch", "foods": [entry("E")] }
        ]);
        let migration = migrate(raw);
        assert!(migration.needs_save());
        let ledger = migration.into_ledger();
        assert_eq!(ids(&ledger, MealSlot::Breakfast), ["A", "B"]);
        assert!(ids(&ledger, MealSlot::Lunch).is_empty());
        assert_eq!(ids(&ledger, MealSlot::Dinner), ["C"]);
        assert_eq!(ids(&ledger, MealSlot::Snacks), ["D", "E"]);
    }

    #[test]
    fn reordered_canonical_names_are_migrated() {
        let raw = json!([
            { "name": "Lunch", "foods": [entry("l")] },
            { "name": "Breakfast", "foods": [entry("b")] },
            { "name": "Dinner", "foods": [] },
            { "name": "Snacks", "foods": [] }
        ]);
        let migration = migrate(raw);
        assert!(matches!(migration, Migration::Migrated(_)));
        let ledger = migration.into_ledger();
        assert_eq!(ids(&ledger, MealSlot::Breakfast), ["b"]);
        assert_eq!(ids(&ledger, MealSlot::Lunch), ["l"]);
    }

    #[test]
    fn several_legacy_meals_concatenate_into_one_slot() {
        let raw = json!([
            { "name": "Snack 1", "foods": [entry("s1")] },
            { "name": "Pre-workout", "foods": [entry("p")] },
            { "name": "Snack 2", "foods": [entry("s2")] }
        ]);
        let ledger = migrate(raw).into_ledger();
        assert_eq!(ids(&ledger, MealSlot::Snacks), ["s1", "p", "s2"]);
        assert_eq!(ledger.meals().len(), 4);
    }

    #[test]
    fn empty_array_migrates_to_empty_canonical() {
        let migration = migrate(json!([]));
        assert!(migration.needs_save());
        assert_eq!(migration.into_ledger(), MealLedger::new());
    }

    #[test]
    fn unreadable_entries_are_dropped_and_the_rest_kept() {
        let raw = json!([
            { "name": "Breakfast", "foods": [entry("a"), { "id": "no-macros" }, entry("b")] },
            { "name": "Lunch", "foods": [] },
            { "name": "Dinner", "foods": [entry("c")] },
            {
                "name": "Snacks",
                "foods": [{ "id": "nan", "name": "x", "quantity": 1.0, "unit": "g",
                            "protein": null, "carbs": 0.0, "fats": 0.0, "calories": 0.0 }]
            }
        ]);
        let migration = migrate(raw);
        assert!(migration.needs_save());
        let ledger = migration.into_ledger();
        assert_eq!(ids(&ledger, MealSlot::Breakfast), ["a", "b"]);
        assert_eq!(ids(&ledger, MealSlot::Dinner), ["c"]);
        assert!(ids(&ledger, MealSlot::Snacks).is_empty());
    }

    #[test]
    fn unreadable_meals_are_dropped_and_the_rest_kept() {
        let raw = json!([
            { "name": "Breakfast", "foods": [entry("a")] },
            { "foods": [entry("lost")] },
            { "name": "Dinner", "foods": "not a list" },
            { "name": "Late Dinner", "foods": [entry("c")] }
        ]);
        let migration = migrate(raw);
        assert!(matches!(migration, Migration::Migrated(_)));
        let ledger = migration.into_ledger();
        assert_eq!(ids(&ledger, MealSlot::Breakfast), ["a"]);
        assert_eq!(ids(&ledger, MealSlot::Dinner), ["c"]);
        assert_eq!(ledger.entry_count(), 2);
    }

    #[test]
    fn negative_quantity_entry_is_dropped() {
        let mut bad = entry("neg");
        bad["quantity"] = json!(-2.0);
        let raw = json!([
            { "name": "Breakfast", "foods": [bad, entry("ok")] },
            { "name": "Lunch", "foods": [] },
            { "name": "Dinner", "foods": [] },
            { "name": "Snacks", "foods": [] }
        ]);
        let ledger = migrate(raw).into_ledger();
        assert_eq!(ids(&ledger, MealSlot::Breakfast), ["ok"]);
    }

    #[test]
    fn malformed_data_falls_back_to_empty_meals() {
        for raw in [json!({ "meals": 3 }), json!("oops"), json!([{ "foods": [] }])] {
            let migration = migrate(raw);
            assert!(matches!(migration, Migration::Malformed(_)));
            assert!(!migration.needs_save());
            assert_eq!(migration.into_ledger(), MealLedger::new());
        }
    }
}
