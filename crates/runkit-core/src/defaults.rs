use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{
    DEFAULT_CONCURRENCY, DEFAULT_CPU, DEFAULT_MAX_INSTANCES, DEFAULT_MEMORY,
    DEFAULT_MIN_INSTANCES, DEFAULT_PORT, DEFAULT_REGION, DEFAULT_REPOSITORY,
    DEFAULT_TIMEOUT_SECS,
};

pub const DEFAULTS_FILE: &str = "runkit.toml";

/// Prompt defaults: built-in values, overlaid by `runkit.toml`, overlaid by
/// the process environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDefaults {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub deploy: DeploySection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    /// GCP project ID (falls back to `gcloud config get-value project`)
    pub project_id: Option<String>,
    /// Cloud Run region
    #[serde(default = "default_region")]
    pub region: String,
    /// Service name offered as the first prompt's default
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySection {
    #[serde(default = "default_memory")]
    pub memory: String,
    #[serde(default = "default_cpu")]
    pub cpu: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
    #[serde(default)]
    pub min_instances: u32,
    #[serde(default = "default_max_instances")]
    pub max_instances: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u32,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Artifact Registry repository for pushed images
    #[serde(default = "default_repository")]
    pub repository: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            project_id: None,
            region: default_region(),
            service_name: None,
        }
    }
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            memory: default_memory(),
            cpu: default_cpu(),
            concurrency: default_concurrency(),
            min_instances: DEFAULT_MIN_INSTANCES,
            max_instances: default_max_instances(),
            timeout: default_timeout(),
            port: default_port(),
            repository: default_repository(),
        }
    }
}

impl ProjectDefaults {
    /// Load from `runkit.toml` in the given directory, or return built-in
    /// defaults if the file does not exist.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join(DEFAULTS_FILE);
        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            tracing::debug!(path = %config_path.display(), "loaded project defaults");
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })
        } else {
            Ok(Self::default())
        }
    }

    /// Overlay `SERVICE_NAME`, `REGION` and `PROJECT_ID` (or
    /// `GOOGLE_CLOUD_PROJECT`) from the given lookup. Empty values are ignored.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).and_then(crate::config::non_empty);

        if let Some(name) = get("SERVICE_NAME") {
            self.project.service_name = Some(name);
        }
        if let Some(region) = get("REGION") {
            self.project.region = region;
        }
        if let Some(project) = get("PROJECT_ID").or_else(|| get("GOOGLE_CLOUD_PROJECT")) {
            self.project.project_id = Some(project);
        }
        self
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_owned()
}

fn default_memory() -> String {
    DEFAULT_MEMORY.to_owned()
}

fn default_cpu() -> String {
    DEFAULT_CPU.to_owned()
}

fn default_concurrency() -> u32 {
    DEFAULT_CONCURRENCY
}

fn default_max_instances() -> u32 {
    DEFAULT_MAX_INSTANCES
}

fn default_timeout() -> u32 {
    DEFAULT_TIMEOUT_SECS
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_repository() -> String {
    DEFAULT_REPOSITORY.to_owned()
}
