//! Generated artifacts for runkit: Dockerfiles, Cloud Build pipelines,
//! GitHub Actions workflows, Makefiles, and ignore files.
//!
//! # Emission
//!
//! ```text
//! TemplateId ── files()  → embedded assets (include_str!)
//!            ── render() → {{KEY}} placeholders filled from Substitutions
//!            ── emit()   → written / unchanged / kept per OverwritePolicy
//! ```
//!
//! Templates carry no logic beyond placeholder substitution. A placeholder
//! without a value is an error, and nothing is written in that case.

pub mod emit;
pub mod render;
pub mod template;

pub use emit::{EmitError, EmitReport, OverwritePolicy, emit};
pub use render::{Substitutions, render};
pub use template::{PipelineKind, Runtime, TemplateFile, TemplateId};
