use crate::menu::{self, MenuAction, menu_actions};
use crate::prompt::Prompter;
use crate::session::Session;
use crate::ui;
use anyhow::bail;
use runkit_build::render::{PORT, SERVICE_NAME};
use runkit_build::{Runtime, Substitutions, TemplateId};
use runkit_cloud::{
    CloudRunClient, CommandExecutor, Location, Readiness, deploy_args, display_command,
};
use runkit_core::{
    Artifact, DeployConfig, DeployRecord, ExecutionEnvironment, Ingress, KeyValueMap, Memory,
    ProjectDefaults, Registry, SecretMounts, ServiceName, VpcEgress, artifact_registry_image,
    container_registry_image, non_empty, registry_host, validate_cpu,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

menu_actions! {
    /// Actions of `runkit deploy`.
    DeployAction {
        DeployImage => "deploy-image", "Deploy a prebuilt container image";
        DeploySource => "deploy-source", "Build from source with Cloud Build and deploy";
        BuildAndPush => "build-and-push", "Build with Docker or Cloud Build, push, and deploy";
        GenerateDockerfile => "generate-dockerfile", "Generate a Dockerfile";
        ShowCommand => "show-command", "Show the deploy command without running it";
        Exit => "exit", "Exit";
    }
}

const READY_POLL_INTERVAL: Duration = Duration::from_secs(5);
const READY_TIMEOUT: Duration = Duration::from_secs(300);
const MAX_TIMEOUT_SECS: u32 = 3600;

pub async fn deploy(session: &mut Session, action: Option<DeployAction>) -> anyhow::Result<()> {
    if let Some(action) = action {
        return run(session, action).await;
    }
    loop {
        let action = menu::select::<DeployAction>(&mut session.prompter, "Deploy")?;
        if action.is_exit() {
            return Ok(());
        }
        run(session, action).await?;
    }
}

async fn run(session: &mut Session, action: DeployAction) -> anyhow::Result<()> {
    match action {
        DeployAction::DeployImage => deploy_image(session).await,
        DeployAction::DeploySource => deploy_source(session).await,
        DeployAction::BuildAndPush => build_and_push(session).await,
        DeployAction::GenerateDockerfile => generate_dockerfile(session),
        DeployAction::ShowCommand => show_command(session),
        DeployAction::Exit => Ok(()),
    }
}

// ── Actions ──

async fn deploy_image(session: &mut Session) -> anyhow::Result<()> {
    session.preflight(false).await?;

    ui::header("Service");
    let (service, location) = session.ask_service()?;

    ui::header("Image");
    let image = choose_image(session, &service, &location, true).await?;

    let config = configure(session, service, &location, Artifact::Image(image))?;
    execute(session, &config).await
}

async fn deploy_source(session: &mut Session) -> anyhow::Result<()> {
    session.preflight(false).await?;

    ui::header("Service");
    let (service, location) = session.ask_service()?;

    ui::header("Source");
    let source = ask_dir(session, "Source directory")?;
    if !source.join("Dockerfile").exists() {
        ui::info("no Dockerfile found, Cloud Build will detect the runtime with buildpacks");
    }

    let config = configure(session, service, &location, Artifact::Source(source))?;
    execute(session, &config).await
}

/// Where `build-and-push` builds the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builder {
    Docker,
    CloudBuild,
}

impl Builder {
    const ALL: &'static [Self] = &[Self::Docker, Self::CloudBuild];

    fn label(&self) -> &'static str {
        match self {
            Self::Docker => "local Docker (build, then push)",
            Self::CloudBuild => "Cloud Build (remote, no local Docker needed)",
        }
    }
}

async fn build_and_push(session: &mut Session) -> anyhow::Result<()> {
    let builder = session.prompter.choose(
        "Build with",
        Builder::ALL,
        |b| b.label().to_owned(),
        Some(0),
    )?;
    session.preflight(builder == Builder::Docker).await?;

    ui::header("Service");
    let (service, location) = session.ask_service()?;

    ui::header("Image");
    let image = choose_image(session, &service, &location, false).await?;
    let context = ask_dir(session, "Build context")?;

    if !context.join("Dockerfile").exists() {
        ui::warn(format!("no Dockerfile in {}", context.display()));
        if !session.prompter.confirm("Generate one now?", true)? {
            bail!("a Dockerfile is required to build an image");
        }
        write_dockerfile(session, &context, &service)?;
    }

    let build_args = match builder {
        Builder::Docker => collect_entries(
            &mut session.prompter,
            "Build arguments (KEY=VALUE)",
            KeyValueMap::parse_all::<String>,
        )?,
        Builder::CloudBuild => KeyValueMap::default(),
    };

    ui::header("Build");
    build_image(
        &session.client,
        builder,
        &image,
        &context,
        &location.project_id,
        &build_args,
    )
    .await?;
    ui::success(format!("pushed {image}"));

    if !session.prompter.confirm("Deploy the pushed image now?", true)? {
        return Ok(());
    }
    let config = configure(session, service, &location, Artifact::Image(image))?;
    execute(session, &config).await
}

/// Build `image` from `context` and leave it in the registry.
async fn build_image<E: CommandExecutor>(
    client: &CloudRunClient<E>,
    builder: Builder,
    image: &str,
    context: &Path,
    project_id: &str,
    build_args: &KeyValueMap,
) -> anyhow::Result<()> {
    match builder {
        Builder::Docker => {
            client.configure_docker(registry_host(image)).await?;
            client.docker_build(image, context, None, build_args).await?;
            client.docker_push(image).await?;
        }
        Builder::CloudBuild => {
            client.submit_build(context, image, project_id).await?;
        }
    }
    Ok(())
}

fn generate_dockerfile(session: &mut Session) -> anyhow::Result<()> {
    let service = session.ask_service_name()?;
    let dir = session.project_dir.clone();
    write_dockerfile(session, &dir, &service)
}

fn show_command(session: &mut Session) -> anyhow::Result<()> {
    let (service, location) = session.ask_service()?;

    let from_source = session.prompter.choose(
        "Build mode",
        &[false, true],
        |source| {
            if *source {
                "build from a source directory".to_owned()
            } else {
                "prebuilt image".to_owned()
            }
        },
        Some(0),
    )?;
    let artifact = if from_source {
        Artifact::Source(ask_dir(session, "Source directory")?)
    } else {
        let default = artifact_registry_image(
            &location.region,
            &location.project_id,
            &session.defaults.deploy.repository,
            service.as_str(),
            "latest",
        );
        Artifact::Image(session.prompter.ask_required("Image reference", &default)?)
    };

    let config = configure(session, service, &location, artifact)?;
    println!("{}", display_command("gcloud", &deploy_args(&config)));
    Ok(())
}

// ── Configuration ──

fn configure(
    session: &mut Session,
    service: ServiceName,
    location: &Location,
    artifact: Artifact,
) -> anyhow::Result<DeployConfig> {
    let mut config = DeployConfig::new(service, location.project_id.clone(), artifact);
    config.region = location.region.clone();
    collect_settings(&mut session.prompter, &session.defaults, &mut config)?;
    Ok(config)
}

/// Prompt for every tunable after the artifact is known, in a fixed
/// order. Defaults come from `runkit.toml` or the built-in values.
pub(crate) fn collect_settings(
    p: &mut Prompter,
    defaults: &ProjectDefaults,
    config: &mut DeployConfig,
) -> anyhow::Result<()> {
    let d = &defaults.deploy;

    ui::header("Resources");
    config.port = p.ask_validated("Container port", &d.port.to_string(), parse_port)?;
    config.memory = p.ask_validated("Memory", &d.memory, Memory::parse)?;
    config.cpu = p.ask_validated("CPU", &d.cpu, validate_cpu)?;
    config.concurrency = p.ask_validated(
        "Max concurrent requests per instance",
        &d.concurrency.to_string(),
        parse_count,
    )?;
    config.min_instances =
        p.ask_validated("Min instances", &d.min_instances.to_string(), parse_count)?;
    let min = config.min_instances;
    config.max_instances =
        p.ask_validated("Max instances", &d.max_instances.to_string(), |s| {
            let max = parse_count(s)?;
            if max < min {
                Err(format!("must be at least the minimum ({min})"))
            } else {
                Ok(max)
            }
        })?;
    config.timeout_secs =
        p.ask_validated("Request timeout (seconds)", &d.timeout.to_string(), |s| {
            let secs = parse_count(s)?;
            if (1..=MAX_TIMEOUT_SECS).contains(&secs) {
                Ok(secs)
            } else {
                Err(format!("must be between 1 and {MAX_TIMEOUT_SECS}"))
            }
        })?;

    ui::header("Networking");
    config.ingress = p.choose(
        "Ingress",
        Ingress::ALL,
        |i| i.label().to_owned(),
        default_index(Ingress::ALL),
    )?;
    config.allow_unauthenticated = p.confirm("Allow unauthenticated access?", true)?;
    config.execution_environment = p.choose(
        "Execution environment",
        ExecutionEnvironment::ALL,
        |e| e.label().to_owned(),
        default_index(ExecutionEnvironment::ALL),
    )?;

    ui::header("Environment");
    config.env_vars = collect_entries(
        p,
        "Environment variables (KEY=VALUE)",
        KeyValueMap::parse_all::<String>,
    )?;
    config.secrets = collect_entries(
        p,
        "Secrets (ENV_VAR=secret-name[:version])",
        SecretMounts::parse_all::<String>,
    )?;

    if p.confirm("Configure advanced options?", false)? {
        ui::header("Advanced");
        config.service_account = non_empty(p.ask("Service account email (empty for default)", "")?);
        config.labels = collect_entries(p, "Labels (key=value)", KeyValueMap::parse_all::<String>)?;
        config.annotations = collect_entries(
            p,
            "Annotations (key=value)",
            KeyValueMap::parse_all::<String>,
        )?;
        config.cloudsql_instance =
            non_empty(p.ask("Cloud SQL instance (project:region:instance)", "")?);
        config.vpc_connector = non_empty(p.ask("VPC connector", "")?);
        if config.vpc_connector.is_some() {
            config.vpc_egress = p.choose(
                "VPC egress",
                VpcEgress::ALL,
                |e| e.label().to_owned(),
                default_index(VpcEgress::ALL),
            )?;
        }
        config.tag = non_empty(p.ask("Revision tag", "")?);
        config.revision_suffix = non_empty(p.ask("Revision suffix", "")?);
        config.no_traffic =
            p.confirm("Deploy without routing traffic to the new revision?", false)?;
    }

    Ok(())
}

/// Read a list and parse it as a whole; a bad entry means the list is
/// asked for again.
fn collect_entries<T>(
    p: &mut Prompter,
    prompt: &str,
    parse: impl Fn(&[String]) -> runkit_core::Result<T>,
) -> anyhow::Result<T> {
    loop {
        let entries = p.collect_list(prompt)?;
        match parse(&entries) {
            Ok(value) => return Ok(value),
            Err(e) if !p.is_interactive() => return Err(e.into()),
            Err(e) => {
                ui::error(e);
                ui::info("enter the whole list again");
            }
        }
    }
}

pub(crate) fn parse_count(s: &str) -> Result<u32, String> {
    s.parse::<u32>()
        .map_err(|_| format!("'{s}' is not a non-negative whole number"))
}

pub(crate) fn parse_port(s: &str) -> Result<u16, String> {
    match s.parse::<u16>() {
        Ok(0) | Err(_) => Err(format!("'{s}' is not a port number (1-65535)")),
        Ok(port) => Ok(port),
    }
}

fn default_index<T: Default + PartialEq>(all: &[T]) -> Option<usize> {
    let default = T::default();
    all.iter().position(|v| *v == default)
}

// ── Image & source ──

async fn choose_image(
    session: &mut Session,
    service: &ServiceName,
    location: &Location,
    allow_custom: bool,
) -> anyhow::Result<String> {
    let registries: &[Registry] = if allow_custom {
        Registry::ALL
    } else {
        &[Registry::ArtifactRegistry, Registry::ContainerRegistry]
    };
    let registry = session.prompter.choose(
        "Image registry",
        registries,
        |r| r.label().to_owned(),
        Some(0),
    )?;

    match registry {
        Registry::ArtifactRegistry => {
            let repository = session.prompter.ask_required(
                "Artifact Registry repository",
                &session.defaults.deploy.repository,
            )?;
            ensure_repository(session, &repository, location).await?;
            let tag = session.prompter.ask_required("Image tag", "latest")?;
            Ok(artifact_registry_image(
                &location.region,
                &location.project_id,
                &repository,
                service.as_str(),
                &tag,
            ))
        }
        Registry::ContainerRegistry => {
            let tag = session.prompter.ask_required("Image tag", "latest")?;
            Ok(container_registry_image(
                &location.project_id,
                service.as_str(),
                &tag,
            ))
        }
        Registry::Custom => session.prompter.ask_required("Image reference", ""),
    }
}

/// Offer to create the repository when the existence check says it is
/// missing. Declining aborts the action.
pub(crate) async fn ensure_repository(
    session: &mut Session,
    repository: &str,
    location: &Location,
) -> anyhow::Result<()> {
    if session
        .client
        .repository_exists(repository, location)
        .await
    {
        tracing::debug!(repository, "repository exists");
        return Ok(());
    }

    ui::warn(format!(
        "repository {repository} does not exist in {}",
        location.region
    ));
    if !session.prompter.confirm("Create it now?", true)? {
        bail!("repository {repository} is required");
    }
    session
        .client
        .create_repository(repository, location)
        .await?;
    ui::success(format!("created repository {repository}"));
    Ok(())
}

fn ask_dir(session: &mut Session, prompt: &str) -> anyhow::Result<PathBuf> {
    let answer = session.prompter.ask_required(prompt, ".")?;
    let dir = resolve(&session.project_dir, &answer);
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    Ok(dir)
}

/// Relative answers are taken from the project directory.
fn resolve(project_dir: &Path, answer: &str) -> PathBuf {
    let path = Path::new(answer);
    if path.is_absolute() || project_dir == Path::new(".") {
        path.to_path_buf()
    } else {
        project_dir.join(path)
    }
}

fn write_dockerfile(session: &mut Session, dir: &Path, service: &ServiceName) -> anyhow::Result<()> {
    let detected = Runtime::detect(dir);
    if let Some(runtime) = detected {
        ui::info(format!("detected a {runtime} project"));
    }
    let default = detected
        .and_then(|d| Runtime::ALL.iter().position(|r| *r == d))
        .unwrap_or(0);

    let runtime = session.prompter.choose(
        "Runtime",
        Runtime::ALL,
        |r| r.label().to_owned(),
        Some(default),
    )?;
    let port = session.prompter.ask_validated(
        "Container port",
        &session.defaults.deploy.port.to_string(),
        parse_port,
    )?;

    let subs = Substitutions::new()
        .with(SERVICE_NAME, service.as_str())
        .with(PORT, port.to_string());
    session.emit(dir, TemplateId::Dockerfile(runtime), &subs)
}

// ── Deploy ──

async fn execute(session: &mut Session, config: &DeployConfig) -> anyhow::Result<()> {
    ui::header("Deploy");
    ui::info(format!(
        "deploying {} to {} in {}",
        config.service_name, config.region, config.project_id
    ));

    let url = session.client.deploy(config).await?;
    let location = Location::new(&config.project_id, &config.region);
    let readiness = session
        .client
        .wait_until_ready(
            config.service_name.as_str(),
            &location,
            READY_POLL_INTERVAL,
            READY_TIMEOUT,
        )
        .await?;
    match readiness {
        Readiness::Ready => ui::success(format!("{} is ready", config.service_name)),
        Readiness::TimedOut => ui::warn(format!(
            "{} did not report ready within {}s, check it with: runkit manage status",
            config.service_name,
            READY_TIMEOUT.as_secs()
        )),
    }

    if session.client.is_simulated() {
        ui::info("dry run: no service URL was assigned and no deploy record was written");
        return Ok(());
    }

    if url.is_empty() {
        ui::warn("service URL is not available yet");
    } else {
        ui::success(format!("service URL: {url}"));
        if config.allow_unauthenticated && readiness == Readiness::Ready {
            super::manage::report_health(&session.client, &url).await;
        }
    }

    let path = DeployRecord::new(config, &url).write(&session.project_dir)?;
    ui::info(format!("configuration saved to {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::scripted::Scripted;
    use runkit_cloud::{ExecError, Tool};
    use std::sync::{Arc, Mutex};

    fn config() -> DeployConfig {
        DeployConfig::new(
            ServiceName::parse("api-demo").unwrap(),
            "my-project",
            Artifact::Image("gcr.io/my-project/api-demo:latest".to_owned()),
        )
    }

    #[test]
    fn non_interactive_settings_fall_back_to_defaults() {
        let mut p = Prompter::new(Box::new(Scripted::default()), true);
        let mut c = config();
        collect_settings(&mut p, &ProjectDefaults::default(), &mut c).unwrap();

        assert_eq!(c.region, "us-central1");
        assert_eq!(c.memory.as_str(), "512Mi");
        assert_eq!(c.cpu, "1");
        assert_eq!(c.concurrency, 80);
        assert_eq!(c.min_instances, 0);
        assert_eq!(c.max_instances, 100);
        assert_eq!(c.timeout_secs, 300);
        assert_eq!(c.port, 8080);
        assert!(c.allow_unauthenticated);
        assert!(c.env_vars.is_empty());
        assert!(c.service_account.is_none());
    }

    #[test]
    fn defaults_file_values_become_prompt_defaults() {
        let mut defaults = ProjectDefaults::default();
        defaults.deploy.memory = "1Gi".to_owned();
        defaults.deploy.max_instances = 5;

        let mut p = Prompter::new(Box::new(Scripted::default()), true);
        let mut c = config();
        collect_settings(&mut p, &defaults, &mut c).unwrap();

        assert_eq!(c.memory.as_str(), "1Gi");
        assert_eq!(c.max_instances, 5);
    }

    #[test]
    fn interactive_answers_with_reprompts() {
        let answers = [
            "",        // port
            "512MB",   // memory, rejected
            "2Gi",     // memory
            "2",       // cpu
            "",        // concurrency
            "1",       // min instances
            "0",       // max instances, below min
            "10",      // max instances
            "",        // timeout
            "2",       // ingress: internal
            "n",       // allow unauthenticated
            "",        // execution environment
            "LOG_LEVEL=info",
            "",        // end of env vars
            "",        // no secrets
            "",        // no advanced options
        ];
        let mut p = Prompter::new(Box::new(Scripted::new(&answers)), false);
        let mut c = config();
        collect_settings(&mut p, &ProjectDefaults::default(), &mut c).unwrap();

        assert_eq!(c.memory.as_str(), "2Gi");
        assert_eq!(c.cpu, "2");
        assert_eq!(c.min_instances, 1);
        assert_eq!(c.max_instances, 10);
        assert_eq!(c.ingress, Ingress::Internal);
        assert!(!c.allow_unauthenticated);
        assert_eq!(c.env_vars.get("LOG_LEVEL"), Some("info"));
        assert!(c.secrets.is_empty());
    }

    #[test]
    fn malformed_list_is_asked_again() {
        let answers = ["=oops", "", "MODE=prod", ""];
        let mut p = Prompter::new(Box::new(Scripted::new(&answers)), false);
        let env = collect_entries(&mut p, "Env", KeyValueMap::parse_all::<String>).unwrap();
        assert_eq!(env.get("MODE"), Some("prod"));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn numeric_parsers() {
        assert_eq!(parse_port("8080"), Ok(8080));
        assert!(parse_port("0").is_err());
        assert!(parse_port("70000").is_err());
        assert_eq!(parse_count("0"), Ok(0));
        assert!(parse_count("-1").is_err());
    }

    #[test]
    fn relative_paths_follow_the_project_dir() {
        assert_eq!(resolve(Path::new("."), "app"), PathBuf::from("app"));
        assert_eq!(resolve(Path::new("/srv/api"), "app"), PathBuf::from("/srv/api/app"));
        assert_eq!(resolve(Path::new("/srv/api"), "/tmp/x"), PathBuf::from("/tmp/x"));
    }

    type Calls = Arc<Mutex<Vec<(Tool, Vec<String>)>>>;

    /// Records every command and reports success.
    struct Recorder(Calls);

    impl CommandExecutor for Recorder {
        async fn exec(&self, tool: Tool, args: &[String]) -> Result<String, ExecError> {
            self.0.lock().unwrap().push((tool, args.to_vec()));
            Ok(String::new())
        }

        async fn exec_streaming(&self, tool: Tool, args: &[String]) -> Result<(), ExecError> {
            self.exec(tool, args).await.map(|_| ())
        }

        async fn exec_with_stdin(
            &self,
            tool: Tool,
            args: &[String],
            _stdin_data: &[u8],
        ) -> Result<String, ExecError> {
            self.exec(tool, args).await
        }

        fn is_simulated(&self) -> bool {
            false
        }
    }

    fn recording_client() -> (CloudRunClient<Recorder>, Calls) {
        let calls = Calls::default();
        (CloudRunClient::with_executor(Recorder(calls.clone())), calls)
    }

    const IMAGE: &str = "europe-west1-docker.pkg.dev/my-project/cloud-run/api-demo:v1";

    #[tokio::test]
    async fn cloud_build_submits_without_docker() {
        let (client, calls) = recording_client();
        build_image(
            &client,
            Builder::CloudBuild,
            IMAGE,
            Path::new("app"),
            "my-project",
            &KeyValueMap::default(),
        )
        .await
        .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (tool, args) = &calls[0];
        assert_eq!(*tool, Tool::Gcloud);
        assert_eq!(&args[..3], ["builds", "submit", "app"]);
        assert!(args.contains(&format!("--tag={IMAGE}")));
        assert!(args.contains(&"--project=my-project".to_owned()));
    }

    #[tokio::test]
    async fn docker_builder_logs_in_builds_and_pushes() {
        let (client, calls) = recording_client();
        let build_args = KeyValueMap::parse_all(&["NODE_ENV=production"]).unwrap();
        build_image(
            &client,
            Builder::Docker,
            IMAGE,
            Path::new("app"),
            "my-project",
            &build_args,
        )
        .await
        .unwrap();

        let calls = calls.lock().unwrap();
        let tools: Vec<Tool> = calls.iter().map(|(tool, _)| *tool).collect();
        assert_eq!(tools, [Tool::Gcloud, Tool::Docker, Tool::Docker]);
        assert!(calls[0].1.contains(&"europe-west1-docker.pkg.dev".to_owned()));
        assert_eq!(calls[1].1[0], "build");
        assert!(calls[1].1.contains(&"NODE_ENV=production".to_owned()));
        assert_eq!(calls[2].1, ["push", IMAGE]);
    }

    #[test]
    fn local_docker_is_the_default_builder() {
        assert_eq!(Builder::ALL[0], Builder::Docker);
    }

    #[test]
    fn actions_end_with_exit() {
        assert!(DeployAction::Exit.is_exit());
        assert_eq!(DeployAction::ALL[0], DeployAction::DeployImage);
    }
}
