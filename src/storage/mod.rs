//! Key-value backends for the three persisted aggregates.

mod file;
mod memory;
mod postgres;
mod s3;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use s3::S3Store;

/// Independent storage areas. Each aggregate lives in its own namespace
/// under a key of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Foods,
    Meals,
    Targets,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [Namespace::Foods, Namespace::Meals, Namespace::Targets];

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Foods => "foods",
            Namespace::Meals => "meals",
            Namespace::Targets => "targets",
        }
    }

    /// Key the aggregate is stored under within its namespace.
    pub fn key(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, ns: Namespace, key: &str) -> anyhow::Result<Option<Value>>;
    async fn set(&self, ns: Namespace, key: &str, value: Value) -> anyhow::Result<()>;

    async fn has(&self, ns: Namespace, key: &str) -> anyhow::Result<bool> {
        Ok(self.get(ns, key).await?.is_some())
    }
}
