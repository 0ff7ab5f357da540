use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    // ── Validation ──
    #[error(
        "invalid service name '{0}': must start with a lowercase letter, contain only \
         lowercase letters, digits and hyphens, not end with a hyphen, and be at most 63 characters"
    )]
    InvalidServiceName(String),

    #[error("invalid memory '{0}': expected a number followed by Mi or Gi (e.g. 512Mi, 2Gi)")]
    InvalidMemory(String),

    #[error("invalid cpu '{0}': expected a number (1, 2, 0.5) or millicores (500m)")]
    InvalidCpu(String),

    #[error("invalid entry '{entry}': {reason}")]
    InvalidKeyValue { entry: String, reason: &'static str },

    #[error("unknown {kind} '{value}', expected one of: {}", expected.join(", "))]
    UnknownVariant {
        kind: &'static str,
        value: String,
        expected: Vec<&'static str>,
    },

    // ── Deploy record ──
    #[error("failed to write deploy record at {path}")]
    RecordWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read deploy record at {path}")]
    RecordRead {
        path: PathBuf,
        source: std::io::Error,
    },
}
