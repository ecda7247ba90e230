use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::FoodItem;

/// The user's food database, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodCatalog {
    items: Vec<FoodItem>,
}

impl FoodCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<FoodItem>) -> Self {
        Self { items }
    }

    /// Appends `food`. The list is left untouched if the food is invalid or its id is taken.
    pub fn add(&mut self, food: FoodItem) -> Result<()> {
        food.validate()?;
        if self.get(&food.id).is_some() {
            return Err(Error::validation(format!("food id {} already exists", food.id)));
        }
        debug!(food_id = %food.id, name = %food.name, "food added");
        self.items.push(food);
        Ok(())
    }

    /// Replaces the item with the same id in place. Returns `false` when no such item exists.
    pub fn update(&mut self, food: FoodItem) -> Result<bool> {
        food.validate()?;
        match self.items.iter_mut().find(|f| f.id == food.id) {
            Some(slot) => {
                debug!(food_id = %food.id, "food updated");
                *slot = food;
                Ok(true)
            }
            None => {
                debug!(food_id = %food.id, "update skipped; food not found");
                Ok(false)
            }
        }
    }

    /// Removes the item with `id`. Returns `false` when nothing matched.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|f| f.id != id);
        let removed = self.items.len() != before;
        debug!(food_id = %id, removed, "food delete");
        removed
    }

    pub fn get(&self, id: &str) -> Option<&FoodItem> {
        self.items.iter().find(|f| f.id == id)
    }

    /// Foods whose name contains `query`, ignoring case. An empty query matches everything.
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a FoodItem> + 'a {
        let needle = query.to_lowercase();
        self.items
            .iter()
            .filter(move |f| f.name.to_lowercase().contains(&needle))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FoodItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
