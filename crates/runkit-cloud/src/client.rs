use crate::executor::{CommandExecutor, Shim};
use crate::revision::{
    MetricsSummary, Revision, ServiceStatus, parse_revisions, parse_service_status,
    summarize_request_logs,
};
use crate::synth::deploy_args;
use crate::tool::{ExecError, Tool};
use runkit_core::{DeployConfig, ExecutionMode, KeyValueMap, TriggerKind};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// APIs a Cloud Run deploy depends on, with display labels.
pub const REQUIRED_APIS: &[(&str, &str)] = &[
    ("Cloud Run", "run.googleapis.com"),
    ("Cloud Build", "cloudbuild.googleapis.com"),
    ("Artifact Registry", "artifactregistry.googleapis.com"),
    ("Secret Manager", "secretmanager.googleapis.com"),
];

/// Project and region a service lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub project_id: String,
    pub region: String,
}

impl Location {
    pub fn new(project_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            region: region.into(),
        }
    }

    fn flags(&self) -> [String; 2] {
        [
            format!("--region={}", self.region),
            format!("--project={}", self.project_id),
        ]
    }
}

/// Outcome of polling a service until it reports Ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// The deadline passed first. Not an error: the caller decides.
    TimedOut,
}

/// Cloud Build trigger definition for a GitHub-connected repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSpec {
    pub name: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub kind: TriggerKind,
    pub pattern: String,
    pub build_config: String,
}

/// Cloud Run operations, parameterized over the executor for testability.
pub struct CloudRunClient<E: CommandExecutor = Shim> {
    executor: E,
}

impl CloudRunClient<Shim> {
    pub fn new(mode: &ExecutionMode) -> Self {
        Self {
            executor: Shim::for_mode(mode),
        }
    }
}

impl<E: CommandExecutor> CloudRunClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// True when commands are traced rather than run.
    pub fn is_simulated(&self) -> bool {
        self.executor.is_simulated()
    }

    async fn gcloud(&self, a: Vec<String>) -> Result<String, ExecError> {
        self.executor.exec(Tool::Gcloud, &a).await
    }

    async fn gcloud_streaming(&self, a: Vec<String>) -> Result<(), ExecError> {
        self.executor.exec_streaming(Tool::Gcloud, &a).await
    }

    // ── Preflight ──

    /// Verify the tools and session a mutating operation needs. Stops at
    /// the first unmet prerequisite.
    ///
    /// `project_id` is used when given; otherwise the gcloud default
    /// project must be set.
    pub async fn check_prerequisites(
        &self,
        project_id: Option<&str>,
        needs_docker: bool,
    ) -> Result<PreflightReport, PreflightError> {
        let simulated = self.is_simulated();
        let mut report = PreflightReport::default();

        // 1. gcloud CLI available
        match self
            .gcloud(args(["version", "--format=value(version)"]))
            .await
        {
            Ok(version) => report.gcloud_version = non_blank(&version),
            Err(_) => return Err(PreflightError::GcloudNotInstalled),
        }

        // 2. Active account
        let account = self
            .gcloud(args(["config", "get-value", "account"]))
            .await
            .ok()
            .and_then(|a| non_blank(&a));
        match account {
            Some(a) => report.account = Some(a),
            None if simulated => {}
            None => return Err(PreflightError::NotAuthenticated),
        }

        // 3. Project
        report.project_id = match project_id {
            Some(p) if !p.trim().is_empty() => Some(p.trim().to_owned()),
            _ => self
                .gcloud(args(["config", "get-value", "project"]))
                .await
                .ok()
                .and_then(|p| non_blank(&p)),
        };
        if report.project_id.is_none() && !simulated {
            return Err(PreflightError::NoProject);
        }

        // 4. Docker, only for local builds
        if needs_docker {
            match self
                .executor
                .exec(Tool::Docker, &args(["version", "--format={{.Client.Version}}"]))
                .await
            {
                Ok(version) => report.docker_version = non_blank(&version),
                Err(_) => return Err(PreflightError::DockerNotInstalled),
            }
        }

        Ok(report)
    }

    // ── Doctor ──

    /// Run all diagnostic checks without early return.
    pub async fn doctor(&self, project_id: Option<&str>) -> DoctorReport {
        let mut report = DoctorReport::default();

        // 1. gcloud CLI
        match self.gcloud(args(["version"])).await {
            Ok(v) => {
                // First line reads "Google Cloud SDK X.Y.Z"
                let version = v
                    .lines()
                    .next()
                    .and_then(|line| line.strip_prefix("Google Cloud SDK "))
                    .unwrap_or(v.trim());
                report.gcloud = CheckResult::ok(version.trim());
            }
            Err(e) => report.gcloud = CheckResult::fail(&e.to_string()),
        }

        // 2. Docker
        match self
            .executor
            .exec(Tool::Docker, &args(["--version"]))
            .await
        {
            Ok(v) => report.docker = CheckResult::ok(v.trim()),
            Err(_) => report.docker = CheckResult::fail("not installed (needed for local builds)"),
        }

        // 3. Active account
        match self.gcloud(args(["config", "get-value", "account"])).await {
            Ok(a) if !a.trim().is_empty() => report.account = CheckResult::ok(a.trim()),
            _ => report.account = CheckResult::fail("no active account, run: gcloud auth login"),
        }

        // 4. Project
        let configured = match project_id {
            Some(p) => Some(p.to_owned()),
            None => self
                .gcloud(args(["config", "get-value", "project"]))
                .await
                .ok()
                .and_then(|p| non_blank(&p)),
        };
        let Some(pid) = configured else {
            report.project = CheckResult::fail("no project set, run: runkit setup set-defaults");
            return report;
        };

        match self
            .gcloud(args(["projects", "describe", &pid, "--format=value(name)"]))
            .await
        {
            Ok(name) => report.project = CheckResult::ok(&format!("{pid} ({})", name.trim())),
            Err(_) => {
                report.project = CheckResult::fail(&format!("{pid} is not accessible"));
                return report;
            }
        }

        // 5. Required APIs
        for (label, api) in REQUIRED_APIS {
            let enabled = self
                .gcloud(args([
                    "services",
                    "list",
                    "--enabled",
                    &format!("--project={pid}"),
                    &format!("--filter=config.name={api}"),
                    "--format=value(config.name)",
                ]))
                .await
                .map(|out| !out.trim().is_empty())
                .unwrap_or(false);

            report.apis.push(ApiCheck {
                name: (*label).to_owned(),
                api: (*api).to_owned(),
                result: if enabled {
                    CheckResult::ok("Enabled")
                } else {
                    CheckResult::fail("Not enabled")
                },
            });
        }

        report
    }

    // ── Project setup ──

    pub async fn enable_apis(&self, project_id: &str, apis: &[&str]) -> Result<(), ProjectError> {
        let mut a = args(["services", "enable"]);
        a.extend(apis.iter().map(|api| (*api).to_owned()));
        a.push(format!("--project={project_id}"));

        self.gcloud_streaming(a)
            .await
            .map_err(|e| ProjectError::EnableApis { source: e })
    }

    /// Persist the gcloud default project and Cloud Run region.
    pub async fn set_defaults(&self, project_id: &str, region: &str) -> Result<(), ProjectError> {
        for (key, value) in [("project", project_id), ("run/region", region)] {
            self.gcloud(args(["config", "set", key, value]))
                .await
                .map_err(|e| ProjectError::SetConfig {
                    key: key.to_owned(),
                    source: e,
                })?;
        }
        Ok(())
    }

    pub async fn get_project_number(&self, project_id: &str) -> Result<String, ProjectError> {
        let output = self
            .gcloud(args([
                "projects",
                "describe",
                project_id,
                "--format=value(projectNumber)",
            ]))
            .await
            .map_err(|e| ProjectError::ProjectNumber { source: e })?;

        Ok(output.trim().to_owned())
    }

    // ── Artifact Registry ──

    /// Non-zero exit means "does not exist", not failure.
    pub async fn repository_exists(&self, repository: &str, location: &Location) -> bool {
        self.gcloud(args([
            "artifacts",
            "repositories",
            "describe",
            repository,
            &format!("--location={}", location.region),
            &format!("--project={}", location.project_id),
        ]))
        .await
        .is_ok()
    }

    pub async fn create_repository(
        &self,
        repository: &str,
        location: &Location,
    ) -> Result<(), RegistryError> {
        self.gcloud_streaming(args([
            "artifacts",
            "repositories",
            "create",
            repository,
            "--repository-format=docker",
            &format!("--location={}", location.region),
            &format!("--project={}", location.project_id),
            "--description=Container images for Cloud Run",
        ]))
        .await
        .map_err(|e| RegistryError::Create { source: e })
    }

    /// Register gcloud as the docker credential helper for a registry host.
    pub async fn configure_docker(&self, registry_host: &str) -> Result<(), RegistryError> {
        self.gcloud(args(["auth", "configure-docker", registry_host, "--quiet"]))
            .await
            .map(|_| ())
            .map_err(|e| RegistryError::ConfigureDocker { source: e })
    }

    // ── Build ──

    pub async fn docker_build(
        &self,
        image: &str,
        context: &Path,
        dockerfile: Option<&Path>,
        build_args: &KeyValueMap,
    ) -> Result<(), BuildError> {
        let context_str = path_str(context)?;
        let mut a = args(["build", "--platform=linux/amd64", "-t", image]);
        if let Some(file) = dockerfile {
            a.push("-f".to_owned());
            a.push(path_str(file)?.to_owned());
        }
        for (key, value) in build_args.iter() {
            a.push("--build-arg".to_owned());
            a.push(format!("{key}={value}"));
        }
        a.push(context_str.to_owned());

        self.executor
            .exec_streaming(Tool::Docker, &a)
            .await
            .map_err(|e| BuildError::DockerBuild { source: e })
    }

    pub async fn docker_push(&self, image: &str) -> Result<(), BuildError> {
        self.executor
            .exec_streaming(Tool::Docker, &args(["push", image]))
            .await
            .map_err(|e| BuildError::DockerPush { source: e })
    }

    /// Build remotely with Cloud Build and tag the result.
    pub async fn submit_build(
        &self,
        context: &Path,
        image: &str,
        project_id: &str,
    ) -> Result<(), BuildError> {
        let context_str = path_str(context)?;

        self.gcloud_streaming(args([
            "builds",
            "submit",
            context_str,
            &format!("--tag={image}"),
            &format!("--project={project_id}"),
            "--quiet",
        ]))
        .await
        .map_err(|e| BuildError::Submit { source: e })
    }

    // ── Deploy ──

    /// Run the synthesized deploy command, then look up the service URL.
    /// The URL is empty when simulated.
    pub async fn deploy(&self, config: &DeployConfig) -> Result<String, DeployError> {
        let mut a = deploy_args(config);
        a.push("--quiet".to_owned());

        self.gcloud_streaming(a)
            .await
            .map_err(|e| DeployError::Deploy { source: e })?;

        let location = Location::new(&config.project_id, &config.region);
        self.service_url(config.service_name.as_str(), &location)
            .await
    }

    /// Poll the service until its Ready condition is true or `timeout`
    /// elapses. Returns `Ready` at once when simulated.
    pub async fn wait_until_ready(
        &self,
        service: &str,
        location: &Location,
        interval: Duration,
        timeout: Duration,
    ) -> Result<Readiness, DeployError> {
        if self.is_simulated() {
            return Ok(Readiness::Ready);
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let status = self.service_status(service, location).await?;
            if status.ready == Some(true) {
                return Ok(Readiness::Ready);
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::debug!(service, "readiness poll timed out");
                return Ok(Readiness::TimedOut);
            }
            tokio::time::sleep(interval).await;
        }
    }

    // ── Services ──

    pub async fn list_services(&self, location: &Location) -> Result<(), DeployError> {
        let mut a = args(["run", "services", "list"]);
        a.extend(location.flags());

        self.gcloud_streaming(a)
            .await
            .map_err(|e| DeployError::List { source: e })
    }

    /// Print the full service description.
    pub async fn describe_service(
        &self,
        service: &str,
        location: &Location,
    ) -> Result<(), DeployError> {
        let mut a = args(["run", "services", "describe", service]);
        a.extend(location.flags());

        self.gcloud_streaming(a)
            .await
            .map_err(|e| DeployError::Describe { source: e })
    }

    pub async fn service_status(
        &self,
        service: &str,
        location: &Location,
    ) -> Result<ServiceStatus, DeployError> {
        let mut a = args(["run", "services", "describe", service, "--format=json"]);
        a.extend(location.flags());

        let output = self
            .gcloud(a)
            .await
            .map_err(|e| DeployError::Describe { source: e })?;
        parse_service_status(&output).map_err(|e| DeployError::Parse { source: e })
    }

    pub async fn service_url(&self, service: &str, location: &Location) -> Result<String, DeployError> {
        let mut a = args(["run", "services", "describe", service, "--format=value(status.url)"]);
        a.extend(location.flags());

        let output = self
            .gcloud(a)
            .await
            .map_err(|e| DeployError::Describe { source: e })?;
        Ok(output.trim().to_owned())
    }

    pub async fn delete_service(&self, service: &str, location: &Location) -> Result<(), DeployError> {
        let mut a = args(["run", "services", "delete", service]);
        a.extend(location.flags());
        a.push("--quiet".to_owned());

        self.gcloud_streaming(a)
            .await
            .map_err(|e| DeployError::Delete { source: e })
    }

    pub async fn read_logs(
        &self,
        service: &str,
        location: &Location,
        limit: u32,
    ) -> Result<(), DeployError> {
        let mut a = args(["run", "services", "logs", "read", service]);
        a.extend(location.flags());
        a.push(format!("--limit={limit}"));

        self.gcloud_streaming(a)
            .await
            .map_err(|e| DeployError::Logs { source: e })
    }

    // ── Revisions & traffic ──

    pub async fn list_revisions(
        &self,
        service: &str,
        location: &Location,
    ) -> Result<Vec<Revision>, TrafficError> {
        let mut a = args(["run", "revisions", "list", &format!("--service={service}")]);
        a.extend(location.flags());
        a.push("--format=json".to_owned());

        let output = self
            .gcloud(a)
            .await
            .map_err(|e| TrafficError::List { source: e })?;
        parse_revisions(&output).map_err(|e| TrafficError::Parse { source: e })
    }

    /// Split traffic across revisions. Percentages must sum to 100.
    pub async fn split_traffic(
        &self,
        service: &str,
        location: &Location,
        split: &[(String, u32)],
    ) -> Result<(), TrafficError> {
        if split.is_empty() {
            return Err(TrafficError::EmptySplit);
        }
        let total: u32 = split.iter().map(|(_, pct)| pct).sum();
        if total != 100 {
            return Err(TrafficError::InvalidSplit { total });
        }

        let targets = split
            .iter()
            .map(|(rev, pct)| format!("{rev}={pct}"))
            .collect::<Vec<_>>()
            .join(",");
        self.update_traffic(service, location, format!("--to-revisions={targets}"))
            .await
    }

    pub async fn route_to_latest(&self, service: &str, location: &Location) -> Result<(), TrafficError> {
        self.update_traffic(service, location, "--to-latest".to_owned())
            .await
    }

    /// Give a revision a tag so it gets its own URL.
    pub async fn tag_revision(
        &self,
        service: &str,
        location: &Location,
        revision: &str,
        tag: &str,
    ) -> Result<(), TrafficError> {
        self.update_traffic(service, location, format!("--set-tags={tag}={revision}"))
            .await
    }

    async fn update_traffic(
        &self,
        service: &str,
        location: &Location,
        change: String,
    ) -> Result<(), TrafficError> {
        let mut a = args(["run", "services", "update-traffic", service]);
        a.push(change);
        a.extend(location.flags());

        self.gcloud_streaming(a)
            .await
            .map_err(|e| TrafficError::Update { source: e })
    }

    // ── Metrics ──

    /// Summarize the request log entries written in the last `freshness`
    /// window (gcloud duration syntax, e.g. `1h`).
    pub async fn request_metrics(
        &self,
        service: &str,
        project_id: &str,
        freshness: &str,
        limit: u32,
    ) -> Result<MetricsSummary, MetricsError> {
        let filter = format!(
            "resource.type=\"cloud_run_revision\" AND resource.labels.service_name=\"{service}\" AND httpRequest.status>0"
        );
        let output = self
            .gcloud(args([
                "logging",
                "read",
                &filter,
                &format!("--project={project_id}"),
                &format!("--freshness={freshness}"),
                &format!("--limit={limit}"),
                "--format=json",
            ]))
            .await
            .map_err(|e| MetricsError::Read { source: e })?;

        summarize_request_logs(&output).map_err(|e| MetricsError::Parse { source: e })
    }

    // ── Secret Manager ──

    /// Create the secret if missing, then add a version holding `value`.
    /// The value travels over stdin, never argv.
    pub async fn set_secret(
        &self,
        project_id: &str,
        secret_name: &str,
        value: &str,
    ) -> Result<(), SecretError> {
        let project = format!("--project={project_id}");
        let secret_exists = self
            .gcloud(args(["secrets", "describe", secret_name, &project]))
            .await
            .is_ok();

        if !secret_exists {
            self.gcloud(args([
                "secrets",
                "create",
                secret_name,
                &project,
                "--replication-policy=automatic",
            ]))
            .await
            .map_err(|e| SecretError::Create { source: e })?;
        }

        self.executor
            .exec_with_stdin(
                Tool::Gcloud,
                &args([
                    "secrets",
                    "versions",
                    "add",
                    secret_name,
                    &project,
                    "--data-file=-",
                ]),
                value.as_bytes(),
            )
            .await
            .map_err(|e| SecretError::AddVersion { source: e })?;

        Ok(())
    }

    pub async fn list_secrets(&self, project_id: &str) -> Result<Vec<String>, SecretError> {
        let output = self
            .gcloud(args([
                "secrets",
                "list",
                &format!("--project={project_id}"),
                "--format=value(name)",
            ]))
            .await
            .map_err(|e| SecretError::List { source: e })?;

        Ok(output
            .lines()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect())
    }

    pub async fn grant_secret_access(
        &self,
        project_id: &str,
        secret_name: &str,
        service_account: &str,
    ) -> Result<(), SecretError> {
        self.gcloud(args([
            "secrets",
            "add-iam-policy-binding",
            secret_name,
            &format!("--project={project_id}"),
            &format!("--member=serviceAccount:{service_account}"),
            "--role=roles/secretmanager.secretAccessor",
        ]))
        .await
        .map_err(|e| SecretError::GrantAccess { source: e })?;

        Ok(())
    }

    // ── Access ──

    /// Allow or revoke unauthenticated invocation (`allUsers` as invoker).
    pub async fn set_public_access(
        &self,
        service: &str,
        location: &Location,
        public: bool,
    ) -> Result<(), AccessError> {
        let verb = if public {
            "add-iam-policy-binding"
        } else {
            "remove-iam-policy-binding"
        };
        let mut a = args([
            "run",
            "services",
            verb,
            service,
            "--member=allUsers",
            "--role=roles/run.invoker",
        ]);
        a.extend(location.flags());

        self.gcloud(a)
            .await
            .map(|_| ())
            .map_err(|e| AccessError::Update { source: e })
    }

    // ── Domain mappings ──

    pub async fn map_domain(
        &self,
        service: &str,
        domain: &str,
        location: &Location,
    ) -> Result<(), DomainError> {
        let mut a = args([
            "beta",
            "run",
            "domain-mappings",
            "create",
            &format!("--service={service}"),
            &format!("--domain={domain}"),
        ]);
        a.extend(location.flags());

        self.gcloud_streaming(a)
            .await
            .map_err(|e| DomainError::Create { source: e })
    }

    pub async fn list_domain_mappings(&self, location: &Location) -> Result<(), DomainError> {
        let mut a = args(["beta", "run", "domain-mappings", "list"]);
        a.extend(location.flags());

        self.gcloud_streaming(a)
            .await
            .map_err(|e| DomainError::List { source: e })
    }

    pub async fn unmap_domain(&self, domain: &str, location: &Location) -> Result<(), DomainError> {
        let mut a = args([
            "beta",
            "run",
            "domain-mappings",
            "delete",
            &format!("--domain={domain}"),
        ]);
        a.extend(location.flags());
        a.push("--quiet".to_owned());

        self.gcloud_streaming(a)
            .await
            .map_err(|e| DomainError::Delete { source: e })
    }

    // ── CI/CD ──

    /// Create a service account. Returns `false` when it already existed.
    pub async fn ensure_service_account(
        &self,
        project_id: &str,
        account_id: &str,
        display_name: &str,
    ) -> Result<bool, CiError> {
        let result = self
            .gcloud(args([
                "iam",
                "service-accounts",
                "create",
                account_id,
                &format!("--project={project_id}"),
                &format!("--display-name={display_name}"),
            ]))
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_already_exists(&e) => Ok(false),
            Err(e) => Err(CiError::CreateServiceAccount { source: e }),
        }
    }

    /// Bind project-level roles to a service account, one role at a time.
    pub async fn bind_project_roles(
        &self,
        project_id: &str,
        service_account_email: &str,
        roles: &[&str],
    ) -> Result<(), CiError> {
        let member = format!("--member=serviceAccount:{service_account_email}");
        for role in roles {
            self.gcloud(args([
                "projects",
                "add-iam-policy-binding",
                project_id,
                &member,
                &format!("--role={role}"),
                "--condition=None",
                "--quiet",
            ]))
            .await
            .map_err(|e| CiError::BindRole {
                role: (*role).to_owned(),
                source: e,
            })?;
        }
        Ok(())
    }

    pub async fn create_trigger(&self, project_id: &str, spec: &TriggerSpec) -> Result<(), CiError> {
        let pattern_flag = match spec.kind {
            TriggerKind::Branch => "branch-pattern",
            TriggerKind::Tag => "tag-pattern",
            TriggerKind::PullRequest => "pull-request-pattern",
        };

        self.gcloud_streaming(args([
            "builds",
            "triggers",
            "create",
            "github",
            &format!("--name={}", spec.name),
            &format!("--repo-owner={}", spec.repo_owner),
            &format!("--repo-name={}", spec.repo_name),
            &format!("--{pattern_flag}={}", spec.pattern),
            &format!("--build-config={}", spec.build_config),
            &format!("--project={project_id}"),
        ]))
        .await
        .map_err(|e| CiError::CreateTrigger { source: e })
    }

    // ── Health check ──

    /// Request `url` and return the HTTP status. `None` when simulated.
    pub async fn http_status(&self, url: &str) -> Result<Option<u16>, HealthCheckError> {
        let output = self
            .executor
            .exec(
                Tool::Curl,
                &args([
                    "--silent",
                    "--output",
                    "/dev/null",
                    "--write-out",
                    "%{http_code}",
                    "--max-time",
                    "10",
                    url,
                ]),
            )
            .await
            .map_err(|e| HealthCheckError::Request { source: e })?;

        let code = output.trim();
        if code.is_empty() {
            return Ok(None);
        }
        code.parse::<u16>()
            .map(Some)
            .map_err(|_| HealthCheckError::UnexpectedOutput(code.to_owned()))
    }
}

// ── Helper ──

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    // `gcloud config get-value` prints "(unset)" for missing keys
    if s.is_empty() || s == "(unset)" {
        None
    } else {
        Some(s.to_owned())
    }
}

fn path_str(path: &Path) -> Result<&str, BuildError> {
    path.to_str()
        .ok_or_else(|| BuildError::InvalidPath(path.to_path_buf()))
}

fn is_already_exists(e: &ExecError) -> bool {
    let stderr = e.stderr();
    stderr.contains("ALREADY_EXISTS") || stderr.contains("already exists")
}

/// `<account>@<project>.iam.gserviceaccount.com`.
pub fn service_account_email(account_id: &str, project_id: &str) -> String {
    format!("{account_id}@{project_id}.iam.gserviceaccount.com")
}

/// Default runtime identity of Cloud Run services in a project.
pub fn compute_service_account(project_number: &str) -> String {
    format!("{project_number}-compute@developer.gserviceaccount.com")
}

// ── Preflight types ──

#[derive(Debug, Default)]
pub struct PreflightReport {
    pub gcloud_version: Option<String>,
    pub account: Option<String>,
    pub project_id: Option<String>,
    pub docker_version: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PreflightError {
    #[error("gcloud CLI not installed, see {}", Tool::Gcloud.install_hint())]
    GcloudNotInstalled,

    #[error("not authenticated, run: gcloud auth login")]
    NotAuthenticated,

    #[error("no project configured, set PROJECT_ID or run: gcloud config set project <id>")]
    NoProject,

    #[error("docker not installed, see {}", Tool::Docker.install_hint())]
    DockerNotInstalled,
}

// ── Doctor types ──

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub gcloud: CheckResult,
    pub docker: CheckResult,
    pub account: CheckResult,
    pub project: CheckResult,
    pub apis: Vec<ApiCheck>,
}

impl DoctorReport {
    /// Docker is optional (source deploys build remotely), so it does not count.
    pub fn all_passed(&self) -> bool {
        self.gcloud.passed
            && self.account.passed
            && self.project.passed
            && self.apis.iter().all(|a| a.result.passed)
    }

    pub fn disabled_apis(&self) -> Vec<&str> {
        self.apis
            .iter()
            .filter(|a| !a.result.passed)
            .map(|a| a.api.as_str())
            .collect()
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

#[derive(Debug, Clone)]
pub struct ApiCheck {
    pub name: String,
    pub api: String,
    pub result: CheckResult,
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("failed to enable APIs")]
    EnableApis { source: ExecError },

    #[error("failed to set gcloud config '{key}'")]
    SetConfig { key: String, source: ExecError },

    #[error("failed to look up project number")]
    ProjectNumber { source: ExecError },
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to create Artifact Registry repository")]
    Create { source: ExecError },

    #[error("failed to configure docker credentials")]
    ConfigureDocker { source: ExecError },
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("docker build failed")]
    DockerBuild { source: ExecError },

    #[error("docker push failed")]
    DockerPush { source: ExecError },

    #[error("cloud build submission failed")]
    Submit { source: ExecError },
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("cloud run deployment failed")]
    Deploy { source: ExecError },

    #[error("failed to describe service")]
    Describe { source: ExecError },

    #[error("failed to list services")]
    List { source: ExecError },

    #[error("failed to delete service")]
    Delete { source: ExecError },

    #[error("failed to read logs")]
    Logs { source: ExecError },

    #[error("unexpected service description")]
    Parse { source: serde_json::Error },
}

#[derive(Debug, thiserror::Error)]
pub enum TrafficError {
    #[error("failed to list revisions")]
    List { source: ExecError },

    #[error("unexpected revision list")]
    Parse { source: serde_json::Error },

    #[error("traffic split is empty")]
    EmptySplit,

    #[error("traffic percentages sum to {total}, expected 100")]
    InvalidSplit { total: u32 },

    #[error("failed to update traffic")]
    Update { source: ExecError },
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to read request logs")]
    Read { source: ExecError },

    #[error("unexpected request log format")]
    Parse { source: serde_json::Error },
}

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("failed to create secret")]
    Create { source: ExecError },

    #[error("failed to add secret version")]
    AddVersion { source: ExecError },

    #[error("failed to list secrets")]
    List { source: ExecError },

    #[error("failed to grant secret access")]
    GrantAccess { source: ExecError },
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("failed to update invoker policy")]
    Update { source: ExecError },
}

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("failed to create domain mapping")]
    Create { source: ExecError },

    #[error("failed to list domain mappings")]
    List { source: ExecError },

    #[error("failed to delete domain mapping")]
    Delete { source: ExecError },
}

#[derive(Debug, thiserror::Error)]
pub enum CiError {
    #[error("failed to create service account")]
    CreateServiceAccount { source: ExecError },

    #[error("failed to bind role {role}")]
    BindRole { role: String, source: ExecError },

    #[error("failed to create build trigger")]
    CreateTrigger { source: ExecError },
}

#[derive(Debug, thiserror::Error)]
pub enum HealthCheckError {
    #[error("health check request failed")]
    Request { source: ExecError },

    #[error("unexpected curl output '{0}'")]
    UnexpectedOutput(String),
}
