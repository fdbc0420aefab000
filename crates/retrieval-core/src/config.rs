//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Every setting has a default, so an empty environment yields a usable
//! [`Settings`]. Provides helpers to expand `~` and `${VAR}` and to resolve
//! relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::DEFAULT_CHUNK_SIZE;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub bm25_k1: f32,
    pub bm25_b: f32,
    pub index_dir: String,
    pub data_dir: String,
}

impl Default for RetrieverSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: 0,
            top_k: 3,
            bm25_k1: 1.5,
            bm25_b: 0.75,
            index_dir: "retriever_index".to_string(),
            data_dir: "data".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// `bert` or `hashing`.
    pub backend: String,
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub hashing_dim: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { backend: "bert".to_string(), model_dir: None, max_len: 256, hashing_dim: 384, batch_size: 32 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retriever: RetrieverSettings,
    pub embedding: EmbeddingSettings,
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Self::base().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    /// A single explicit TOML file plus `APP_*` overrides.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()).into());
        }
        let figment = Self::base().merge(Toml::file(path)).merge(Env::prefixed("APP_").split("__"));
        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    fn base() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        validate(&settings)?;
        Ok(settings)
    }
}

fn validate(settings: &Settings) -> Result<(), Error> {
    let r = &settings.retriever;
    if r.chunk_overlap >= r.chunk_size {
        return Err(Error::InvalidConfig(format!(
            "retriever.chunk_overlap ({}) must be smaller than retriever.chunk_size ({})",
            r.chunk_overlap, r.chunk_size
        )));
    }
    if r.top_k == 0 {
        return Err(Error::InvalidConfig("retriever.top_k must be positive".to_string()));
    }
    if !(r.bm25_k1 >= 0.0) || !(0.0..=1.0).contains(&r.bm25_b) {
        return Err(Error::InvalidConfig(format!(
            "bm25 parameters out of range: k1={} b={}",
            r.bm25_k1, r.bm25_b
        )));
    }
    let e = &settings.embedding;
    if !matches!(e.backend.as_str(), "bert" | "hashing") {
        return Err(Error::InvalidConfig(format!("unknown embedding.backend '{}'", e.backend)));
    }
    if e.hashing_dim == 0 || e.batch_size == 0 || e.max_len == 0 {
        return Err(Error::InvalidConfig(
            "embedding.hashing_dim, batch_size and max_len must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
