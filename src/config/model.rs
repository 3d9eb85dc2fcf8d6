// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [session]
/// scope_id = "reservation-42"
///
/// [service]
/// name = "web-stack"
/// model_name = "Terraform Service"
/// module_path = "/srv/modules/web"
/// inputs = "region=eu-west-1,size=small"
///
/// [store]
/// path = ".tfdriver/store.json"
///
/// [log]
/// dir = ".tfdriver/logs"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub session: SessionSection,

    pub service: ServiceConfig,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub log: LogSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub session: SessionSection,
    pub service: ServiceConfig,
    pub store: StoreSection,
    pub log: LogSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        session: SessionSection,
        service: ServiceConfig,
        store: StoreSection,
        log: LogSection,
    ) -> Self {
        Self {
            session,
            service,
            store,
            log,
        }
    }
}

/// `[session]` section: which sandbox/reservation scope the request runs in.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    pub scope_id: String,
}

/// `[service]` section: the managed entity and where its Terraform lives.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Entity name used when reading/writing attributes.
    pub name: String,

    /// Model name; prefixes attribute names (`<model>.UUID`).
    pub model_name: String,

    /// Terraform module directory. Every invocation runs here.
    pub module_path: PathBuf,

    /// Directory holding the Terraform binary. Defaults to `module_path`.
    #[serde(default)]
    pub executable_dir: Option<PathBuf>,

    #[serde(default = "default_binary_name")]
    pub binary_name: String,

    /// Comma-separated `key=value` pairs passed as `-var` flags to `plan`.
    #[serde(default)]
    pub inputs: Option<String>,
}

fn default_binary_name() -> String {
    if cfg!(windows) {
        "terraform.exe".to_string()
    } else {
        "terraform".to_string()
    }
}

impl ServiceConfig {
    pub fn new(
        name: impl Into<String>,
        model_name: impl Into<String>,
        module_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            model_name: model_name.into(),
            module_path: module_path.into(),
            executable_dir: None,
            binary_name: default_binary_name(),
            inputs: None,
        }
    }

    /// Terraform binary path for a run in `working_dir`.
    ///
    /// `executable_dir` wins when set; otherwise the binary is expected in
    /// the working directory itself.
    pub fn executable_in(&self, working_dir: &Path) -> PathBuf {
        self.executable_dir
            .as_deref()
            .unwrap_or(working_dir)
            .join(&self.binary_name)
    }

    /// Split `inputs` into individual `key=value` entries.
    pub fn input_vars(&self) -> Vec<String> {
        self.inputs
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn uuid_attribute(&self) -> String {
        format!("{}.UUID", self.model_name)
    }

    pub fn output_attribute(&self) -> String {
        format!("{}.Terraform Output", self.model_name)
    }

    pub fn state_file(&self) -> PathBuf {
        self.module_path.join("terraform.tfstate")
    }
}

/// `[store]` section for the file-backed host store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    Path::new(".tfdriver").join("store.json")
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// `[log]` section for per-request execution logs.
#[derive(Debug, Clone, Deserialize)]
pub struct LogSection {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
}

fn default_log_dir() -> PathBuf {
    Path::new(".tfdriver").join("logs")
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
        }
    }
}
