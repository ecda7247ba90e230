use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::{KeyValueStore, Namespace};

/// One JSON document per namespace (`foods.json`, `meals.json`,
/// `targets.json`) inside a data directory. Each document is an object
/// mapping keys to values.
pub struct FileStore {
    dir: PathBuf,
    // read-modify-write of a document must not interleave
    locks: [Mutex<()>; 3],
}

impl FileStore {
    pub async fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create data dir {}", dir.display()))?;
        Ok(Self {
            dir,
            locks: Default::default(),
        })
    }

    fn path(&self, ns: Namespace) -> PathBuf {
        self.dir.join(format!("{}.json", ns.as_str()))
    }

    fn lock(&self, ns: Namespace) -> &Mutex<()> {
        match ns {
            Namespace::Foods => &self.locks[0],
            Namespace::Meals => &self.locks[1],
            Namespace::Targets => &self.locks[2],
        }
    }

    async fn read_raw(&self, ns: Namespace) -> anyhow::Result<Option<Vec<u8>>> {
        let path = self.path(ns);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    async fn read_document(&self, ns: Namespace) -> anyhow::Result<Map<String, Value>> {
        match self.read_raw(ns).await? {
            Some(raw) => serde_json::from_slice(&raw)
                .with_context(|| format!("parse {}", self.path(ns).display())),
            None => Ok(Map::new()),
        }
    }

    /// Like `read_document`, but an unparseable document is moved aside to
    /// `<ns>.json.corrupt` and replaced by an empty one.
    async fn read_document_for_write(&self, ns: Namespace) -> anyhow::Result<Map<String, Value>> {
        let Some(raw) = self.read_raw(ns).await? else {
            return Ok(Map::new());
        };
        match serde_json::from_slice(&raw) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                let path = self.path(ns);
                let aside = path.with_extension("json.corrupt");
                warn!(error = %e, path = %path.display(), "unparseable document replaced");
                if let Err(e) = tokio::fs::rename(&path, &aside).await {
                    warn!(error = %e, path = %aside.display(), "could not keep corrupt document");
                }
                Ok(Map::new())
            }
        }
    }

    async fn write_document(&self, ns: Namespace, doc: &Map<String, Value>) -> anyhow::Result<()> {
        let path = self.path(ns);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(doc).context("encode document")?;
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("rename {} to {}", tmp.display(), path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    #[instrument(skip(self))]
    async fn get(&self, ns: Namespace, key: &str) -> anyhow::Result<Option<Value>> {
        let _guard = self.lock(ns).lock().await;
        let doc = self.read_document(ns).await?;
        Ok(doc.get(key).cloned())
    }

    #[instrument(skip(self, value))]
    async fn set(&self, ns: Namespace, key: &str, value: Value) -> anyhow::Result<()> {
        let _guard = self.lock(ns).lock().await;
        let mut doc = self.read_document_for_write(ns).await?;
        doc.insert(key.to_string(), value);
        self.write_document(ns, &doc).await?;
        debug!(path = %self.path(ns).display(), "document written");
        Ok(())
    }
}
