use crate::prompt::{Console, Prompter};
use crate::ui;
use anyhow::Context;
use runkit_build::{OverwritePolicy, Substitutions, TemplateId};
use runkit_cloud::{CloudRunClient, Location, PreflightReport};
use runkit_core::{ExecutionMode, ProjectDefaults, ServiceName};
use std::path::{Path, PathBuf};

const FALLBACK_SERVICE_NAME: &str = "my-service";

/// Everything one run needs, built once from the command line and passed
/// to every action.
pub struct Session {
    pub defaults: ProjectDefaults,
    pub client: CloudRunClient,
    pub prompter: Prompter,
    pub project_dir: PathBuf,
    pub overwrite: OverwritePolicy,
}

impl Session {
    pub fn new(mode: ExecutionMode, project_dir: PathBuf, force: bool) -> anyhow::Result<Self> {
        let defaults = ProjectDefaults::load(&project_dir)
            .context("failed to load project defaults")?
            .apply_env(|name| std::env::var(name).ok());

        Ok(Self {
            defaults,
            client: CloudRunClient::new(&mode),
            prompter: Prompter::new(Box::new(Console), mode.non_interactive),
            project_dir,
            overwrite: if force {
                OverwritePolicy::Overwrite
            } else {
                OverwritePolicy::KeepExisting
            },
        })
    }

    // ── Shared prompts ──

    pub fn ask_service_name(&mut self) -> anyhow::Result<ServiceName> {
        let default = self.default_service_name();
        self.prompter
            .ask_validated("Service name", &default, ServiceName::parse)
    }

    pub fn ask_project_id(&mut self) -> anyhow::Result<String> {
        let default = self.defaults.project.project_id.clone().unwrap_or_default();
        let project_id = self.prompter.ask_required("Project ID", &default)?;
        self.defaults.project.project_id = Some(project_id.clone());
        Ok(project_id)
    }

    pub fn ask_region(&mut self) -> anyhow::Result<String> {
        let default = self.defaults.project.region.clone();
        let region = self.prompter.ask_required("Region", &default)?;
        self.defaults.project.region = region.clone();
        Ok(region)
    }

    pub fn ask_location(&mut self) -> anyhow::Result<Location> {
        let project_id = self.ask_project_id()?;
        let region = self.ask_region()?;
        Ok(Location::new(project_id, region))
    }

    /// Service name plus where it runs.
    pub fn ask_service(&mut self) -> anyhow::Result<(ServiceName, Location)> {
        let service = self.ask_service_name()?;
        let location = self.ask_location()?;
        self.defaults.project.service_name = Some(service.to_string());
        Ok((service, location))
    }

    /// Configured name, else the project directory's name when it is a
    /// valid service name.
    fn default_service_name(&self) -> String {
        if let Some(name) = &self.defaults.project.service_name {
            return name.clone();
        }
        std::fs::canonicalize(&self.project_dir)
            .ok()
            .and_then(|dir| dir.file_name().and_then(|n| n.to_str()).map(str::to_owned))
            .filter(|name| ServiceName::parse(name).is_ok())
            .unwrap_or_else(|| FALLBACK_SERVICE_NAME.to_owned())
    }

    // ── Preflight ──

    /// Fail fast on missing tools, session, or project. A project found in
    /// the gcloud config becomes the default for later prompts.
    pub async fn preflight(&mut self, needs_docker: bool) -> anyhow::Result<PreflightReport> {
        let report = self
            .client
            .check_prerequisites(self.defaults.project.project_id.as_deref(), needs_docker)
            .await?;

        tracing::debug!(
            gcloud = report.gcloud_version.as_deref().unwrap_or("-"),
            account = report.account.as_deref().unwrap_or("-"),
            "prerequisites satisfied"
        );
        if self.defaults.project.project_id.is_none() {
            self.defaults.project.project_id = report.project_id.clone();
        }
        Ok(report)
    }

    // ── Generated files ──

    /// Write a template under `dir`, reporting each file's outcome.
    pub fn emit(&self, dir: &Path, id: TemplateId, subs: &Substitutions) -> anyhow::Result<()> {
        let report = runkit_build::emit(dir, id, subs, self.overwrite)?;

        for path in &report.written {
            ui::success(format!("wrote {}", path.display()));
        }
        for path in &report.unchanged {
            ui::info(format!("{} is up to date", path.display()));
        }
        for path in &report.kept {
            ui::warn(format!(
                "{} has local changes, left as is (use --force to replace)",
                path.display()
            ));
        }
        Ok(())
    }
}
