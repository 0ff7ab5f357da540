//! Per-service deploy record: the frozen configuration plus the endpoint
//! the platform assigned, written as `KEY=value` lines after a successful
//! deploy.

use std::path::{Path, PathBuf};

use crate::config::{Artifact, DeployConfig};

pub const RECORD_DIR: &str = ".runkit";

/// Path of the record for a service: `<dir>/.runkit/<service>.conf`.
pub fn record_path(project_dir: &Path, service_name: &str) -> PathBuf {
    project_dir
        .join(RECORD_DIR)
        .join(format!("{service_name}.conf"))
}

/// Ordered `KEY=value` entries describing one deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRecord {
    entries: Vec<(String, String)>,
}

impl DeployRecord {
    pub fn new(config: &DeployConfig, service_url: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut put = |k: &str, v: String| entries.push((k.to_owned(), v));

        put("SERVICE_NAME", config.service_name.to_string());
        put("PROJECT_ID", config.project_id.clone());
        put("REGION", config.region.clone());
        match &config.artifact {
            Artifact::Image(image) => put("IMAGE", image.clone()),
            Artifact::Source(path) => put("SOURCE", path.display().to_string()),
        }
        put("PORT", config.port.to_string());
        put("MEMORY", config.memory.to_string());
        put("CPU", config.cpu.clone());
        put("CONCURRENCY", config.concurrency.to_string());
        put("MIN_INSTANCES", config.min_instances.to_string());
        put("MAX_INSTANCES", config.max_instances.to_string());
        put("TIMEOUT", config.timeout_secs.to_string());
        put("INGRESS", config.ingress.to_string());
        put("VPC_EGRESS", config.vpc_egress.to_string());
        put(
            "EXECUTION_ENVIRONMENT",
            config.execution_environment.to_string(),
        );
        put(
            "ALLOW_UNAUTHENTICATED",
            config.allow_unauthenticated.to_string(),
        );
        if let Some(sa) = &config.service_account {
            put("SERVICE_ACCOUNT", sa.clone());
        }
        if !config.labels.is_empty() {
            put("LABELS", config.labels.to_flag_value());
        }
        if !config.annotations.is_empty() {
            put("ANNOTATIONS", config.annotations.to_flag_value());
        }
        if let Some(tag) = &config.tag {
            put("TAG", tag.clone());
        }
        if let Some(suffix) = &config.revision_suffix {
            put("REVISION_SUFFIX", suffix.clone());
        }
        if config.no_traffic {
            put("NO_TRAFFIC", "true".to_owned());
        }
        if !config.env_vars.is_empty() {
            // Values are omitted: they may hold credentials.
            let names: Vec<&str> = config.env_vars.iter().map(|(k, _)| k).collect();
            put("ENV_VAR_NAMES", names.join(","));
        }
        if !config.secrets.is_empty() {
            put("SECRETS", config.secrets.to_flag_value());
        }
        if let Some(instance) = &config.cloudsql_instance {
            put("CLOUDSQL_INSTANCE", instance.clone());
        }
        if let Some(connector) = &config.vpc_connector {
            put("VPC_CONNECTOR", connector.clone());
        }
        put("SERVICE_URL", service_url.to_owned());

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (k, v) in &self.entries {
            out.push_str(k);
            out.push('=');
            out.push_str(v);
            out.push('\n');
        }
        out
    }

    /// Parse `KEY=value` lines. Blank lines and `#` comments are skipped;
    /// lines without `=` are ignored.
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim().to_owned(), v.to_owned()))
            .collect();
        Self { entries }
    }

    /// Write to `<dir>/.runkit/<service>.conf`, replacing any earlier record
    /// for the same service.
    pub fn write(&self, project_dir: &Path) -> crate::Result<PathBuf> {
        let service = self.get("SERVICE_NAME").unwrap_or("service");
        let path = record_path(project_dir, service);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| crate::Error::RecordWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&path, self.render()).map_err(|e| crate::Error::RecordWrite {
            path: path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "deploy record written");
        Ok(path)
    }

    /// Read the record for a service, `None` if it was never deployed from
    /// this directory.
    pub fn read(project_dir: &Path, service_name: &str) -> crate::Result<Option<Self>> {
        let path = record_path(project_dir, service_name);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| crate::Error::RecordRead { path, source: e })?;
        Ok(Some(Self::parse(&content)))
    }
}
