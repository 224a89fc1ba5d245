//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_ENGINE__URL`). [`Settings`] is the
//! typed view consumed by the binaries.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_ENGINE_URL: &str = "http://localhost:9200";
pub const DEFAULT_INDEX: &str = "products";

/// Inference ids that ship as default sparse-embedding services.
pub const DEFAULT_INFERENCE_ENDPOINTS: [&str; 2] =
    [".elser-2-elasticsearch", ".elser_model_2_linux-x86_64"];

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Elasticsearch,
    /// In-process engine, for offline development and tests.
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub inference: InferenceSettings,
    pub data: DataSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub url: String,
    pub index: String,
    pub timeout_secs: u64,
    pub backend: Backend,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENGINE_URL.to_string(),
            index: DEFAULT_INDEX.to_string(),
            timeout_secs: 30,
            backend: Backend::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Overrides `engine.url` for inference calls.
    pub url: Option<String>,
    /// Tried in order before falling back to endpoint discovery.
    pub endpoints: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            url: None,
            endpoints: DEFAULT_INFERENCE_ENDPOINTS.iter().map(|s| (*s).to_string()).collect(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub products_dir: Option<String>,
}

impl Settings {
    pub fn inference_url(&self) -> &str {
        self.inference.url.as_deref().unwrap_or(&self.engine.url)
    }

    pub fn validate(&self) -> Result<()> {
        for (key, url) in [("engine.url", self.engine.url.as_str()), ("inference.url", self.inference_url())] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::InvalidConfig(format!("{key} must be an http(s) URL, got '{url}'")));
            }
        }
        if self.engine.index.is_empty() || self.engine.index != self.engine.index.to_lowercase() {
            return Err(Error::InvalidConfig(format!(
                "engine.index must be a non-empty lowercase name, got '{}'",
                self.engine.index
            )));
        }
        if self.engine.timeout_secs == 0 || self.inference.timeout_secs == 0 {
            return Err(Error::InvalidConfig("timeouts must be greater than 0".to_string()));
        }
        if self.inference.endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(Error::InvalidConfig("inference.endpoints contains an empty id".to_string()));
        }
        Ok(())
    }
}

/// `~` and `$VAR` / `${VAR}` expansion for configured paths. Unknown
/// variables leave the input untouched; nothing is canonicalized.
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let with_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    PathBuf::from(shellexpand::tilde(&with_env).as_ref())
}

/// [`expand_path`], then anchor relative results at `base`.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
