use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, warn};

use crate::error::Result;
use crate::foods::FoodCatalog;
use crate::meals::{migrate, MealLedger, Migration};
use crate::storage::{KeyValueStore, Namespace};
use crate::targets::DailyTargets;

#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Writes the default value of every aggregate whose key is missing.
    /// Namespaces are handled independently; the first failure is returned
    /// after all of them have been tried.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        let mut first_err = None;
        for ns in Namespace::ALL {
            if let Err(e) = self.initialize_namespace(ns).await {
                warn!(error = %e, namespace = %ns, "initialize failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn initialize_namespace(&self, ns: Namespace) -> Result<()> {
        if self.store.has(ns, ns.key()).await? {
            return Ok(());
        }
        let default = match ns {
            Namespace::Foods => serde_json::to_value(FoodCatalog::new())?,
            Namespace::Meals => serde_json::to_value(MealLedger::new())?,
            Namespace::Targets => serde_json::to_value(DailyTargets::default())?,
        };
        self.store.set(ns, ns.key(), default).await?;
        info!(namespace = %ns, "initialized with defaults");
        Ok(())
    }

    pub async fn load(&self, ns: Namespace) -> Result<Option<Value>> {
        Ok(self.store.get(ns, ns.key()).await?)
    }

    async fn load_typed<T: DeserializeOwned + Default>(&self, ns: Namespace) -> Result<T> {
        match self.load(ns).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(T::default()),
        }
    }

    #[instrument(skip(self))]
    pub async fn load_foods(&self) -> Result<FoodCatalog> {
        self.load_typed(Namespace::Foods).await
    }

    #[instrument(skip(self))]
    pub async fn load_targets(&self) -> Result<DailyTargets> {
        self.load_typed(Namespace::Targets).await
    }

    /// Reads the stored meals through the migrator. A missing key reads as four empty meals.
    #[instrument(skip(self))]
    pub async fn load_meals(&self) -> Result<Migration> {
        match self.load(Namespace::Meals).await? {
            Some(value) => Ok(migrate(value)),
            None => Ok(Migration::Canonical(MealLedger::new())),
        }
    }

    pub async fn save(&self, ns: Namespace, value: Value) -> Result<()> {
        self.store.set(ns, ns.key(), value).await?;
        debug!(namespace = %ns, "saved");
        Ok(())
    }

    pub async fn save_typed<T: Serialize>(&self, ns: Namespace, value: &T) -> Result<()> {
        self.save(ns, serde_json::to_value(value)?).await
    }
}

enum WriteCommand {
    Save(Value),
    Flush(oneshot::Sender<()>),
}

/// Serializes the writes of one aggregate. Snapshots are written in the
/// order they were queued; a burst of snapshots collapses into the latest.
pub(crate) struct AggregateWriter {
    ns: Namespace,
    tx: mpsc::UnboundedSender<WriteCommand>,
}

impl AggregateWriter {
    pub(crate) fn spawn(gateway: PersistenceGateway, ns: Namespace) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteCommand>();
        tokio::spawn(async move {
            while let Some(first) = rx.recv().await {
                let mut latest = None;
                let mut waiters = Vec::new();
                let mut next = Some(first);
                while let Some(cmd) = next {
                    match cmd {
                        WriteCommand::Save(value) => latest = Some(value),
                        WriteCommand::Flush(done) => waiters.push(done),
                    }
                    next = rx.try_recv().ok();
                }

                if let Some(value) = latest {
                    // memory stays authoritative; the next mutation retries
                    if let Err(e) = gateway.save(ns, value).await {
                        error!(error = %e, namespace = %ns, "save failed");
                    }
                }
                for done in waiters {
                    let _ = done.send(());
                }
            }
            debug!(namespace = %ns, "writer stopped");
        });
        Self { ns, tx }
    }

    pub(crate) fn enqueue(&self, value: Value) {
        if self.tx.send(WriteCommand::Save(value)).is_err() {
            error!(namespace = %self.ns, "writer gone; snapshot dropped");
        }
    }

    /// Waits until everything queued so far has been written (or has failed).
    pub(crate) async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}
