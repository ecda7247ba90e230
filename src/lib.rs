pub mod config;
pub mod error;
pub mod foods;
pub mod meals;
pub mod nutrition;
pub mod persistence;
pub mod session;
pub mod state;
pub mod storage;
pub mod targets;
pub mod telemetry;

pub use error::{Error, Result};
pub use foods::{FoodCatalog, FoodDraft, FoodItem};
pub use meals::{FoodEntry, Meal, MealLedger, MealSlot};
pub use nutrition::Macros;
pub use session::{Lifecycle, Session};
pub use targets::{DailyTargets, DEFAULT_DAILY_TARGETS};
