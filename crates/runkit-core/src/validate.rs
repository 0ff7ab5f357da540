//! Format validation for the handful of fields that are checked at the
//! prompt boundary. Values that pass are wrapped in newtypes so an
//! unvalidated string can never reach the deploy command synthesizer.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static SERVICE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]{0,62}$").expect("static regex"));

static MEMORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(Mi|Gi)$").expect("static regex"));

static CPU_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+(\.[0-9]+)?|[0-9]+m)$").expect("static regex"));

/// A Cloud Run service name: `^[a-z][a-z0-9-]{0,62}$`, no trailing hyphen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn parse(value: &str) -> crate::Result<Self> {
        let value = value.trim();
        if SERVICE_NAME_RE.is_match(value) && !value.ends_with('-') {
            Ok(Self(value.to_owned()))
        } else {
            Err(crate::Error::InvalidServiceName(value.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A memory limit such as `512Mi` or `2Gi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory(String);

impl Memory {
    pub fn parse(value: &str) -> crate::Result<Self> {
        let value = value.trim();
        if MEMORY_RE.is_match(value) {
            Ok(Self(value.to_owned()))
        } else {
            Err(crate::Error::InvalidMemory(value.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self(crate::config::DEFAULT_MEMORY.to_owned())
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepts whole or fractional vCPU counts (`1`, `0.5`) and millicores (`500m`).
pub fn validate_cpu(value: &str) -> crate::Result<String> {
    let value = value.trim();
    if CPU_RE.is_match(value) {
        Ok(value.to_owned())
    } else {
        Err(crate::Error::InvalidCpu(value.to_owned()))
    }
}
