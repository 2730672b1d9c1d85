//! Configuration module
//!
//! Settings for the HTTP surface, the video repository, the storage backend
//! and the external media tools. Built once from the environment at startup
//! and passed down explicitly.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const PROBE_TIMEOUT_SECS: u64 = 60;
const REMUX_TIMEOUT_SECS: u64 = 600;

/// Where video records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryBackend {
    Postgres,
    Memory,
}

impl FromStr for RepositoryBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(RepositoryBackend::Postgres),
            "memory" => Ok(RepositoryBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid video repository: {}", s)),
        }
    }
}

impl Display for RepositoryBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RepositoryBackend::Postgres => write!(f, "postgres"),
            RepositoryBackend::Memory => write!(f, "memory"),
        }
    }
}

/// HTTP and auth settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub environment: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
}

/// Ingestion service configuration
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub base: BaseConfig,
    pub video_repository: RepositoryBackend,
    pub database_url: Option<String>,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Media tools
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub probe_timeout_secs: u64,
    pub remux_timeout_secs: u64,
    pub upload_temp_dir: PathBuf,
    // Thumbnails
    pub assets_root: PathBuf,
    pub assets_base_url: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<IngestConfig>);

impl Config {
    fn as_ingest(&self) -> &IngestConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_ingest().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = IngestConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_ingest().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_ingest().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_ingest().base.cors_origins
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_ingest().base.jwt_secret
    }

    pub fn environment(&self) -> &str {
        &self.as_ingest().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_ingest().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_ingest().base.db_timeout_seconds
    }

    pub fn video_repository(&self) -> RepositoryBackend {
        self.as_ingest().video_repository
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_ingest().database_url.as_deref()
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.as_ingest().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_ingest().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_ingest().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_ingest().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_ingest().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_ingest().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_ingest().local_storage_base_url.as_deref()
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.as_ingest().ffprobe_path
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_ingest().ffmpeg_path
    }

    pub fn probe_timeout_secs(&self) -> u64 {
        self.as_ingest().probe_timeout_secs
    }

    pub fn remux_timeout_secs(&self) -> u64 {
        self.as_ingest().remux_timeout_secs
    }

    pub fn upload_temp_dir(&self) -> &PathBuf {
        &self.as_ingest().upload_temp_dir
    }

    pub fn assets_root(&self) -> &PathBuf {
        &self.as_ingest().assets_root
    }

    pub fn assets_base_url(&self) -> &str {
        &self.as_ingest().assets_base_url
    }
}

fn is_production_env(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let base = BaseConfig {
            server_port,
            cors_origins,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
        };

        let video_repository = match env::var("VIDEO_REPOSITORY") {
            Ok(value) => value.parse()?,
            Err(_) => RepositoryBackend::Postgres,
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => Some(value.parse()?),
            Err(_) => None,
        };

        let config = IngestConfig {
            base,
            video_repository,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            probe_timeout_secs: env::var("PROBE_TIMEOUT_SECS")
                .unwrap_or_else(|_| PROBE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(PROBE_TIMEOUT_SECS),
            remux_timeout_secs: env::var("REMUX_TIMEOUT_SECS")
                .unwrap_or_else(|_| REMUX_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REMUX_TIMEOUT_SECS),
            upload_temp_dir: env::var("UPLOAD_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
            assets_root: env::var("ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("assets")),
            assets_base_url: env::var("ASSETS_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", server_port)),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if is_production_env(&self.base.environment)
            && self.base.cors_origins.iter().any(|origin| origin == "*")
        {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.probe_timeout_secs == 0 || self.remux_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "PROBE_TIMEOUT_SECS and REMUX_TIMEOUT_SECS must be greater than zero"
            ));
        }

        if self.video_repository == RepositoryBackend::Postgres {
            match self.database_url.as_deref() {
                None => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be set when VIDEO_REPOSITORY is postgres"
                    ))
                }
                Some(url)
                    if !url.starts_with("postgres://") && !url.starts_with("postgresql://") =>
                {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ))
                }
                Some(_) => {}
            }
        }

        match self.storage_backend.unwrap_or(StorageBackend::S3) {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
