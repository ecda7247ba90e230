use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub prefix: String,
}

/// Where the foods/meals/targets aggregates are kept.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Memory,
    File { data_dir: PathBuf },
    S3(S3Config),
    Postgres { database_url: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
}

impl AppConfig {
    /// Reads `STORE_BACKEND` (memory | file | s3 | postgres, default file)
    /// and the variables of the chosen backend. A `.env` file is honoured.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |name: &str| var(name).ok_or_else(|| anyhow::anyhow!("{name} is not set"));

        let backend = var("STORE_BACKEND").unwrap_or_else(|| "file".into());
        let store = match backend.as_str() {
            "memory" => StoreConfig::Memory,
            "file" => StoreConfig::File {
                data_dir: var("DATA_DIR").unwrap_or_else(|| "./data".into()).into(),
            },
            "s3" => StoreConfig::S3(S3Config {
                endpoint: required("S3_ENDPOINT")?,
                bucket: required("S3_BUCKET")?,
                access_key: required("S3_ACCESS_KEY")?,
                secret_key: required("S3_SECRET_KEY")?,
                region: var("S3_REGION").unwrap_or_else(|| "us-east-1".into()),
                prefix: var("S3_PREFIX").unwrap_or_else(|| "macroledger".into()),
            }),
            "postgres" => StoreConfig::Postgres {
                database_url: required("DATABASE_URL")?,
            },
            other => anyhow::bail!("unknown STORE_BACKEND {other:?}"),
        };
        Ok(Self { store })
    }
}
