//! Core types for runkit.
//!
//! This crate defines the Deployment Configuration record ([`DeployConfig`]),
//! the execution mode flags ([`ExecutionMode`]), field validation, the
//! `runkit.toml` defaults schema ([`ProjectDefaults`]), the persisted
//! per-service deploy record ([`DeployRecord`]), and shared error types.

pub mod config;
pub mod defaults;
pub mod error;
pub mod kv;
pub mod mode;
pub mod record;
pub mod validate;

pub use config::{
    Artifact, DeployConfig, ExecutionEnvironment, Ingress, Registry, TriggerKind, VpcEgress,
    artifact_registry_image, container_registry_image, non_empty, registry_host,
};
pub use defaults::{DeploySection, ProjectDefaults, ProjectSection};
pub use error::{Error, Result};
pub use kv::{KeyValueMap, SecretMounts};
pub use mode::ExecutionMode;
pub use record::{DeployRecord, record_path};
pub use validate::{Memory, ServiceName, validate_cpu};
