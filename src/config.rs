use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use thiserror::Error;

use crate::bolt::ExcludeList;
use crate::llm::{DefaultProvider, ModelEntry, ModelRegistry};

pub const DEFAULT_PORT: u16 = 7433;
pub const DEFAULT_IDEM_API_BASE_URL: &str = "http://localhost:3001";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub idem_api_base_url: String,
    pub public_url: String,
    pub default_provider: DefaultProvider,
    pub models: Option<Vec<ModelEntry>>,
    pub extra_excluded_files: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = match get("APPGEN_HOST") {
            Some(h) => h.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "APPGEN_HOST",
                message: e.to_string(),
            })?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };

        let port = match get("APPGEN_PORT") {
            Some(p) => p.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                key: "APPGEN_PORT",
                message: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let data_dir = get("APPGEN_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let idem_api_base_url = get("IDEM_API_BASE_URL").unwrap_or_else(|| DEFAULT_IDEM_API_BASE_URL.to_string());
        url::Url::parse(&idem_api_base_url).map_err(|e| ConfigError::Invalid {
            key: "IDEM_API_BASE_URL",
            message: e.to_string(),
        })?;

        let public_url = get("APPGEN_PUBLIC_URL").unwrap_or_else(|| format!("http://{}:{}", host, port));

        let models = match get("APPGEN_MODELS") {
            Some(json) => Some(serde_json::from_str(&json).map_err(|e| ConfigError::Invalid {
                key: "APPGEN_MODELS",
                message: e.to_string(),
            })?),
            None => None,
        };

        let extra_excluded_files = get("APPGEN_EXCLUDE_FILES")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            data_dir,
            idem_api_base_url,
            public_url,
            default_provider: DefaultProvider {
                api_url: get("THIRD_API_URL").unwrap_or_default(),
                api_key: get("THIRD_API_KEY").unwrap_or_default(),
            },
            models,
            extra_excluded_files,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("appgen.db")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn model_registry(&self) -> ModelRegistry {
        match &self.models {
            Some(models) => ModelRegistry::new(models.clone(), self.default_provider.clone()),
            None => ModelRegistry::with_defaults(self.default_provider.clone()),
        }
    }

    /// Built-in exclusions plus `APPGEN_EXCLUDE_FILES`.
    pub fn exclude_list(&self) -> ExcludeList {
        let mut list = ExcludeList::with_defaults();
        for path in &self.extra_excluded_files {
            list.add(path.clone());
        }
        list
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("appgen")
}
