mod catalog;
mod types;

pub use catalog::FoodCatalog;
pub use types::{FoodDraft, FoodItem};
