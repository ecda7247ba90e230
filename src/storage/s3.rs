use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::{KeyValueStore, Namespace};

/// Each namespace is one JSON object `<prefix>/<namespace>.json` in an
/// S3-compatible bucket (AWS or MinIO).
pub struct S3Store {
    client: Client,
    bucket: String,
    prefix: String,
    locks: [Mutex<()>; 3],
}

impl S3Store {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
        prefix: &str,
    ) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .endpoint_url(endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: bucket.to_string(),
            prefix: prefix.trim_end_matches('/').to_string(),
            locks: Default::default(),
        })
    }

    fn object_key(&self, ns: Namespace) -> String {
        format!("{}/{}.json", self.prefix, ns.as_str())
    }

    fn lock(&self, ns: Namespace) -> &Mutex<()> {
        match ns {
            Namespace::Foods => &self.locks[0],
            Namespace::Meals => &self.locks[1],
            Namespace::Targets => &self.locks[2],
        }
    }

    async fn read_raw(&self, ns: Namespace) -> anyhow::Result<Option<Bytes>> {
        let out = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.object_key(ns))
            .send()
            .await
        {
            Ok(out) => out,
            Err(e) => {
                let err = e.into_service_error();
                if err.is_no_such_key() {
                    return Ok(None);
                }
                return Err(anyhow::Error::new(err).context("s3 get_object"));
            }
        };
        let body = out
            .body
            .collect()
            .await
            .context("s3 read body")?
            .into_bytes();
        Ok(Some(body))
    }

    async fn read_document(&self, ns: Namespace) -> anyhow::Result<Map<String, Value>> {
        match self.read_raw(ns).await? {
            Some(body) => serde_json::from_slice(&body)
                .with_context(|| format!("parse s3 object {}", self.object_key(ns))),
            None => Ok(Map::new()),
        }
    }

    /// An unparseable object is overwritten from an empty document.
    async fn read_document_for_write(&self, ns: Namespace) -> anyhow::Result<Map<String, Value>> {
        let Some(body) = self.read_raw(ns).await? else {
            return Ok(Map::new());
        };
        match serde_json::from_slice(&body) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                warn!(error = %e, object = %self.object_key(ns), "unparseable object replaced");
                Ok(Map::new())
            }
        }
    }

    async fn write_document(&self, ns: Namespace, doc: &Map<String, Value>) -> anyhow::Result<()> {
        let body = Bytes::from(serde_json::to_vec(doc).context("encode document")?);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(ns))
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for S3Store {
    #[instrument(skip(self))]
    async fn get(&self, ns: Namespace, key: &str) -> anyhow::Result<Option<Value>> {
        let _guard = self.lock(ns).lock().await;
        Ok(self.read_document(ns).await?.get(key).cloned())
    }

    #[instrument(skip(self, value))]
    async fn set(&self, ns: Namespace, key: &str, value: Value) -> anyhow::Result<()> {
        let _guard = self.lock(ns).lock().await;
        let mut doc = self.read_document_for_write(ns).await?;
        doc.insert(key.to_string(), value);
        self.write_document(ns, &doc).await?;
        debug!(bucket = %self.bucket, object = %self.object_key(ns), "object written");
        Ok(())
    }
}
