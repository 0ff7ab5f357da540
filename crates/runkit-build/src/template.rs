//! Template catalog: every generated artifact is an embedded asset
//! selected by a [`TemplateId`].

use runkit_core::TriggerKind;
use std::fmt;
use std::path::Path;

mod assets {
    pub static NODE: &str = include_str!("../templates/dockerfile/node.Dockerfile");
    pub static PYTHON: &str = include_str!("../templates/dockerfile/python.Dockerfile");
    pub static GO: &str = include_str!("../templates/dockerfile/go.Dockerfile");
    pub static JAVA: &str = include_str!("../templates/dockerfile/java.Dockerfile");
    pub static RUST: &str = include_str!("../templates/dockerfile/rust.Dockerfile");
    pub static STATIC: &str = include_str!("../templates/dockerfile/static.Dockerfile");

    pub static CLOUDBUILD_BASIC: &str = include_str!("../templates/cloudbuild/basic.yaml");
    pub static CLOUDBUILD_FULL: &str = include_str!("../templates/cloudbuild/full.yaml");

    pub static WORKFLOW_BRANCH: &str = include_str!("../templates/github/branch.yml");
    pub static WORKFLOW_TAG: &str = include_str!("../templates/github/tag.yml");
    pub static WORKFLOW_PULL_REQUEST: &str = include_str!("../templates/github/pull-request.yml");

    pub static MAKEFILE: &str = include_str!("../templates/Makefile");
    pub static DOCKERIGNORE: &str = include_str!("../templates/ignore/dockerignore");
    pub static GCLOUDIGNORE: &str = include_str!("../templates/ignore/gcloudignore");
}

/// Application runtime a Dockerfile is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Node,
    Python,
    Go,
    Java,
    Rust,
    Static,
}

impl Runtime {
    pub const ALL: &'static [Self] = &[
        Self::Node,
        Self::Python,
        Self::Go,
        Self::Java,
        Self::Rust,
        Self::Static,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Python => "python",
            Self::Go => "go",
            Self::Java => "java",
            Self::Rust => "rust",
            Self::Static => "static",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Node => "Node.js (npm start)",
            Self::Python => "Python (gunicorn, main:app)",
            Self::Go => "Go (distroless)",
            Self::Java => "Java (Maven, fat jar)",
            Self::Rust => "Rust (cargo-chef)",
            Self::Static => "Static site (nginx)",
        }
    }

    /// Guess the runtime from marker files in `dir`.
    pub fn detect(dir: &Path) -> Option<Self> {
        const MARKERS: &[(&str, Runtime)] = &[
            ("package.json", Runtime::Node),
            ("requirements.txt", Runtime::Python),
            ("pyproject.toml", Runtime::Python),
            ("go.mod", Runtime::Go),
            ("pom.xml", Runtime::Java),
            ("Cargo.toml", Runtime::Rust),
            ("index.html", Runtime::Static),
        ];
        MARKERS
            .iter()
            .find(|(file, _)| dir.join(file).is_file())
            .map(|(_, runtime)| *runtime)
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cloud Build pipeline shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    /// build, push, deploy
    Basic,
    /// build, test, push, tagged candidate, smoke test, promote
    Full,
}

impl PipelineKind {
    pub const ALL: &'static [Self] = &[Self::Basic, Self::Full];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Basic => "basic (build, push, deploy)",
            Self::Full => "full (build, test, push, candidate deploy, smoke test, promote)",
        }
    }
}

/// One generated artifact family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateId {
    /// `Dockerfile` plus `.dockerignore`.
    Dockerfile(Runtime),
    /// `cloudbuild.yaml` plus `.gcloudignore`.
    CloudBuild(PipelineKind),
    /// A GitHub Actions workflow under `.github/workflows/`.
    GithubWorkflow(TriggerKind),
    Makefile,
    /// `.dockerignore` and `.gcloudignore`.
    IgnoreFiles,
}

/// A file produced by a template: path relative to the target directory,
/// and its unrendered body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateFile {
    pub path: &'static str,
    pub body: &'static str,
}

const fn file(path: &'static str, body: &'static str) -> TemplateFile {
    TemplateFile { path, body }
}

const DOCKERIGNORE: TemplateFile = file(".dockerignore", assets::DOCKERIGNORE);
const GCLOUDIGNORE: TemplateFile = file(".gcloudignore", assets::GCLOUDIGNORE);

impl TemplateId {
    pub fn files(&self) -> Vec<TemplateFile> {
        match self {
            Self::Dockerfile(runtime) => {
                let body = match runtime {
                    Runtime::Node => assets::NODE,
                    Runtime::Python => assets::PYTHON,
                    Runtime::Go => assets::GO,
                    Runtime::Java => assets::JAVA,
                    Runtime::Rust => assets::RUST,
                    Runtime::Static => assets::STATIC,
                };
                vec![file("Dockerfile", body), DOCKERIGNORE]
            }
            Self::CloudBuild(PipelineKind::Basic) => {
                vec![file("cloudbuild.yaml", assets::CLOUDBUILD_BASIC), GCLOUDIGNORE]
            }
            Self::CloudBuild(PipelineKind::Full) => {
                vec![file("cloudbuild.yaml", assets::CLOUDBUILD_FULL), GCLOUDIGNORE]
            }
            Self::GithubWorkflow(TriggerKind::Branch) => vec![file(
                ".github/workflows/cloud-run-deploy.yml",
                assets::WORKFLOW_BRANCH,
            )],
            Self::GithubWorkflow(TriggerKind::Tag) => vec![file(
                ".github/workflows/cloud-run-release.yml",
                assets::WORKFLOW_TAG,
            )],
            Self::GithubWorkflow(TriggerKind::PullRequest) => vec![file(
                ".github/workflows/cloud-run-preview.yml",
                assets::WORKFLOW_PULL_REQUEST,
            )],
            Self::Makefile => vec![file("Makefile", assets::MAKEFILE)],
            Self::IgnoreFiles => vec![DOCKERIGNORE, GCLOUDIGNORE],
        }
    }
}
