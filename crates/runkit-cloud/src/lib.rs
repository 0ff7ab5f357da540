//! External command plumbing for runkit.
//!
//! Every `gcloud`, `docker`, and `curl` invocation passes through a
//! [`CommandExecutor`]. [`Shim`] picks real execution or a dry-run trace
//! from the [`ExecutionMode`](runkit_core::ExecutionMode); [`deploy_args`]
//! turns a [`DeployConfig`](runkit_core::DeployConfig) into the deploy argv;
//! [`CloudRunClient`] wraps the individual platform operations.

pub mod client;
pub mod executor;
pub mod revision;
pub mod synth;
pub mod tool;

pub use client::{
    AccessError, ApiCheck, BuildError, CheckResult, CiError, CloudRunClient, DeployError,
    DoctorReport, DomainError, Location, MetricsError, PreflightError, PreflightReport,
    HealthCheckError, ProjectError, REQUIRED_APIS, Readiness, RegistryError, SecretError,
    TrafficError, TriggerSpec, compute_service_account, service_account_email,
};
pub use executor::{CommandExecutor, DryRunExecutor, RealExecutor, Shim, dry_run_trace};
pub use revision::{MetricsSummary, Revision, ServiceStatus, TrafficTarget};
pub use synth::{deploy_args, display_command};
pub use tool::{ExecError, Tool};
