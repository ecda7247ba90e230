//! Loaded aggregates of one tracker; mutations are refused until `load` has finished.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::error::{Error, Result};
use crate::foods::{FoodCatalog, FoodDraft, FoodItem};
use crate::meals::{FoodEntry, MealLedger, MealSlot, Migration};
use crate::nutrition::{self, Macros, Progress};
use crate::persistence::{AggregateWriter, PersistenceGateway};
use crate::storage::{KeyValueStore, Namespace};
use crate::targets::DailyTargets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Loading,
    Ready,
}

struct Writers {
    foods: AggregateWriter,
    meals: AggregateWriter,
    targets: AggregateWriter,
}

impl Writers {
    fn spawn(gateway: &PersistenceGateway) -> Self {
        Self {
            foods: AggregateWriter::spawn(gateway.clone(), Namespace::Foods),
            meals: AggregateWriter::spawn(gateway.clone(), Namespace::Meals),
            targets: AggregateWriter::spawn(gateway.clone(), Namespace::Targets),
        }
    }

    fn get(&self, ns: Namespace) -> &AggregateWriter {
        match ns {
            Namespace::Foods => &self.foods,
            Namespace::Meals => &self.meals,
            Namespace::Targets => &self.targets,
        }
    }

    async fn flush(&self) {
        tokio::join!(self.foods.flush(), self.meals.flush(), self.targets.flush());
    }
}

pub struct Session {
    gateway: PersistenceGateway,
    lifecycle: Lifecycle,
    foods: FoodCatalog,
    meals: MealLedger,
    targets: DailyTargets,
    writers: Option<Writers>,
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            gateway: PersistenceGateway::new(store),
            lifecycle: Lifecycle::Uninitialized,
            foods: FoodCatalog::new(),
            meals: MealLedger::new(),
            targets: DailyTargets::default(),
            writers: None,
        }
    }

    /// A session that has already been loaded from `store`.
    pub async fn open(store: Arc<dyn KeyValueStore>) -> Self {
        let mut session = Self::new(store);
        session.load().await;
        session
    }

    /// Loads all three aggregates. Never fails: any aggregate that cannot
    /// be read falls back to its default and the failure is logged.
    #[instrument(skip(self))]
    pub async fn load(&mut self) {
        if let Some(writers) = &self.writers {
            writers.flush().await;
        }
        self.lifecycle = Lifecycle::Loading;

        if let Err(e) = self.gateway.initialize().await {
            warn!(error = %e, "storage initialization failed");
        }

        self.foods = self.gateway.load_foods().await.unwrap_or_else(|e| {
            warn!(error = %e, "foods unreadable; starting with an empty catalog");
            FoodCatalog::new()
        });

        self.targets = self.gateway.load_targets().await.unwrap_or_else(|e| {
            warn!(error = %e, "targets unreadable; using defaults");
            DailyTargets::default()
        });

        let migration = self.gateway.load_meals().await.unwrap_or_else(|e| {
            warn!(error = %e, "meals unreadable; starting with empty meals");
            Migration::Malformed(MealLedger::new())
        });
        let migrated = migration.needs_save();
        self.meals = migration.into_ledger();
        if migrated {
            match self.gateway.save_typed(Namespace::Meals, &self.meals).await {
                Ok(()) => info!("migrated meals saved"),
                Err(e) => error!(error = %e, "saving migrated meals failed"),
            }
        }

        if self.writers.is_none() {
            self.writers = Some(Writers::spawn(&self.gateway));
        }
        self.lifecycle = Lifecycle::Ready;
        info!(
            foods = self.foods.len(),
            entries = self.meals.entry_count(),
            "session ready"
        );
    }

    /// Waits for every queued write to reach the store.
    pub async fn flush(&self) {
        if let Some(writers) = &self.writers {
            writers.flush().await;
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    pub fn foods(&self) -> &FoodCatalog {
        &self.foods
    }

    pub fn meals(&self) -> &MealLedger {
        &self.meals
    }

    pub fn targets(&self) -> &DailyTargets {
        &self.targets
    }

    // ---- foods ----

    pub fn add_food(&mut self, food: FoodItem) -> Result<()> {
        self.ensure_ready()?;
        self.foods.add(food)?;
        self.persist(Namespace::Foods);
        Ok(())
    }

    /// Adds a food built from user input and returns it with its new id.
    pub fn create_food(&mut self, draft: FoodDraft) -> Result<FoodItem> {
        let food = FoodItem::new(draft);
        self.add_food(food.clone())?;
        Ok(food)
    }

    pub fn update_food(&mut self, food: FoodItem) -> Result<bool> {
        self.ensure_ready()?;
        let updated = self.foods.update(food)?;
        if updated {
            self.persist(Namespace::Foods);
        }
        Ok(updated)
    }

    /// Removes a food from the catalog. Logged entries made from it are not touched.
    pub fn delete_food(&mut self, id: &str) -> Result<bool> {
        self.ensure_ready()?;
        let removed = self.foods.delete(id);
        if removed {
            self.persist(Namespace::Foods);
        }
        Ok(removed)
    }

    // ---- meals ----

    pub fn add_entry(&mut self, meal_index: usize, entry: FoodEntry) -> Result<()> {
        self.ensure_ready()?;
        self.meals.add_entry(meal_index, entry)?;
        self.persist(Namespace::Meals);
        Ok(())
    }

    /// Logs `quantity` of the catalog food `food_id` into a meal.
    pub fn log_food(&mut self, meal_index: usize, food_id: &str, quantity: f64) -> Result<FoodEntry> {
        self.ensure_ready()?;
        MealSlot::from_index(meal_index)?;
        let food = self
            .foods
            .get(food_id)
            .ok_or_else(|| Error::validation(format!("unknown food {food_id}")))?;
        let entry = FoodEntry::log(food, quantity)?;
        self.meals.add_entry(meal_index, entry.clone())?;
        self.persist(Namespace::Meals);
        Ok(entry)
    }

    pub fn remove_entry(&mut self, meal_index: usize, entry_id: &str) -> Result<bool> {
        self.ensure_ready()?;
        let removed = self.meals.remove_entry(meal_index, entry_id)?;
        if removed {
            self.persist(Namespace::Meals);
        }
        Ok(removed)
    }

    pub fn reset_day(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.meals.reset_day();
        self.persist(Namespace::Meals);
        Ok(())
    }

    // ---- targets ----

    /// Stores new targets, rounded the way they are displayed.
    pub fn update_targets(&mut self, targets: DailyTargets) -> Result<DailyTargets> {
        self.ensure_ready()?;
        targets.validate()?;
        self.targets = targets.normalized();
        self.persist(Namespace::Targets);
        Ok(self.targets)
    }

    // ---- derived values, recomputed on every call ----

    pub fn meal_totals(&self, meal_index: usize) -> Result<Macros> {
        Ok(nutrition::meal_totals(self.meals.meal_at(meal_index)?))
    }

    pub fn daily_totals(&self) -> Macros {
        nutrition::daily_totals(self.meals.meals())
    }

    pub fn progress(&self) -> Progress {
        nutrition::progress(&self.daily_totals(), &self.targets)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.lifecycle == Lifecycle::Ready {
            Ok(())
        } else {
            warn!(lifecycle = ?self.lifecycle, "mutation rejected before load");
            Err(Error::NotReady)
        }
    }

    fn persist(&self, ns: Namespace) {
        let Some(writers) = &self.writers else {
            return;
        };
        let encoded = match ns {
            Namespace::Foods => snapshot(&self.foods),
            Namespace::Meals => snapshot(&self.meals),
            Namespace::Targets => snapshot(&self.targets),
        };
        match encoded {
            Ok(value) => writers.get(ns).enqueue(value),
            Err(e) => error!(error = %e, namespace = %ns, "snapshot failed"),
        }
    }
}

fn snapshot<T: Serialize>(value: &T) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(value)
}
