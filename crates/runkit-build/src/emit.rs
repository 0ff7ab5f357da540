use crate::render::{Substitutions, render};
use crate::template::TemplateId;
use std::path::{Path, PathBuf};

/// What to do when a target file already exists with different content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Leave the existing file alone and report it as kept.
    #[default]
    KeepExisting,
    Overwrite,
}

/// Per-file outcome of one [`emit`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Files created or replaced.
    pub written: Vec<PathBuf>,
    /// Files that already had exactly the rendered content.
    pub unchanged: Vec<PathBuf>,
    /// Files with local changes that were not overwritten.
    pub kept: Vec<PathBuf>,
}

/// Render every file of `id` and write it under `dir`.
///
/// All files are rendered before anything is written, so a missing
/// substitution leaves the directory untouched. Re-emitting the same
/// template with the same substitutions is a no-op.
pub fn emit(
    dir: &Path,
    id: TemplateId,
    subs: &Substitutions,
    policy: OverwritePolicy,
) -> Result<EmitReport, EmitError> {
    let rendered = id
        .files()
        .into_iter()
        .map(|f| {
            render(f.body, subs)
                .map(|content| (dir.join(f.path), content))
                .map_err(|key| EmitError::Unresolved { file: f.path, key })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = EmitReport::default();
    for (path, content) in rendered {
        if path.exists() {
            let existing = std::fs::read_to_string(&path).map_err(|e| EmitError::Read {
                path: path.clone(),
                source: e,
            })?;
            if existing == content {
                tracing::debug!(path = %path.display(), "unchanged");
                report.unchanged.push(path);
                continue;
            }
            if policy == OverwritePolicy::KeepExisting {
                tracing::warn!(path = %path.display(), "exists with local changes, keeping it");
                report.kept.push(path);
                continue;
            }
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EmitError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&path, content).map_err(|e| EmitError::Write {
            path: path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "written");
        report.written.push(path);
    }

    Ok(report)
}

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("template {file} needs a value for {{{{{key}}}}}")]
    Unresolved { file: &'static str, key: String },

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
