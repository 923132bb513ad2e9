//! Settings shared by the server and the ingestion CLI.
//!
//! Sources, lowest priority first:
//!
//! 1. the TOML file given with `--config` (optional, default `depot.toml`);
//! 2. `DEPOT_*` environment variables, one per key (`DEPOT_PORT=8080`);
//! 3. the well-known variables `VITE_SUPABASE_URL`, `VITE_SUPABASE_ANON_KEY`,
//!    `YANDEX_API_KEY` and `YANDEX_FOLDER_ID`.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use depot_llm::LlmConfig;
use depot_store_supabase::SupabaseConfig;
use serde::Deserialize;
use thiserror::Error;

/// `(settings key, environment variable)` pairs applied as overrides.
const WELL_KNOWN: [(&str, &str); 4] = [
  ("supabase_url", "VITE_SUPABASE_URL"),
  ("supabase_anon_key", "VITE_SUPABASE_ANON_KEY"),
  ("yandex_api_key", "YANDEX_API_KEY"),
  ("yandex_folder_id", "YANDEX_FOLDER_ID"),
];

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("failed to load settings: {0}")]
  Load(#[from] config::ConfigError),

  #[error("missing setting `{key}` (set {env})")]
  Missing {
    key: &'static str,
    env: &'static str,
  },
}

/// Which store implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  /// Local SQLite file at `store_path`.
  Sqlite,
  /// The hosted Postgres behind `supabase_url`.
  Supabase,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  /// Unset means [`Settings::backend`] picks one.
  #[serde(default)]
  pub backend:              Option<Backend>,
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  #[serde(default)]
  pub supabase_url:         Option<String>,
  #[serde(default)]
  pub supabase_anon_key:    Option<String>,
  #[serde(default)]
  pub yandex_api_key:       Option<String>,
  #[serde(default)]
  pub yandex_folder_id:     Option<String>,
  #[serde(default)]
  pub yandex_base_url:      Option<String>,
  #[serde(default)]
  pub completion_model:     Option<String>,
  /// Applies to provider and PostgREST calls made by the server.
  #[serde(default)]
  pub request_timeout_secs: Option<u64>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 3001 }

fn default_store_path() -> PathBuf { PathBuf::from("depot.db") }

fn required(
  value: &Option<String>,
  key: &'static str,
  env: &'static str,
) -> Result<String, SettingsError> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(str::to_owned)
    .ok_or(SettingsError::Missing { key, env })
}

impl Settings {
  /// Load from `path` and the process environment.
  pub fn load(path: &Path) -> Result<Self, SettingsError> { Self::load_with_env(path, None) }

  /// Like [`Settings::load`], reading variables from `env` instead of the
  /// process environment when it is given.
  pub fn load_with_env(
    path: &Path,
    env: Option<HashMap<String, String>>,
  ) -> Result<Self, SettingsError> {
    let lookup = |name: &str| {
      match &env {
        Some(map) => map.get(name).cloned(),
        None => std::env::var(name).ok(),
      }
      .filter(|v| !v.is_empty())
    };

    let mut builder = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("DEPOT")
          .try_parsing(true)
          .source(env.clone()),
      );
    for (key, name) in WELL_KNOWN {
      builder = builder.set_override_option(key, lookup(name))?;
    }

    Ok(builder.build()?.try_deserialize()?)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// The configured backend; without one, Supabase when its URL is set and
  /// SQLite otherwise.
  pub fn backend(&self) -> Backend {
    match self.backend {
      Some(backend) => backend,
      None if self.supabase_url.as_deref().is_some_and(|u| !u.trim().is_empty()) => {
        Backend::Supabase
      }
      None => Backend::Sqlite,
    }
  }

  /// Provider settings; fails when the API key or folder is missing.
  pub fn llm_config(&self) -> Result<LlmConfig, SettingsError> {
    let mut config = LlmConfig::new(
      required(&self.yandex_api_key, "yandex_api_key", "YANDEX_API_KEY")?,
      required(&self.yandex_folder_id, "yandex_folder_id", "YANDEX_FOLDER_ID")?,
    );
    if let Some(url) = &self.yandex_base_url {
      config.base_url = url.clone();
    }
    if let Some(model) = &self.completion_model {
      config.completion_model = model.clone();
    }
    config.timeout_secs = self.request_timeout_secs;
    Ok(config)
  }

  pub fn supabase_config(&self) -> Result<SupabaseConfig, SettingsError> {
    Ok(SupabaseConfig {
      url:          required(&self.supabase_url, "supabase_url", "VITE_SUPABASE_URL")?,
      anon_key:     required(
        &self.supabase_anon_key,
        "supabase_anon_key",
        "VITE_SUPABASE_ANON_KEY",
      )?,
      timeout_secs: self.request_timeout_secs,
    })
  }
}
