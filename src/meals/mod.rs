//! The four fixed daily meal slots and the entries logged into them.

mod ledger;
pub mod migrate;
mod types;

pub use ledger::MealLedger;
pub use migrate::{migrate, Migration};
pub use types::{FoodEntry, Meal, MealSlot};
