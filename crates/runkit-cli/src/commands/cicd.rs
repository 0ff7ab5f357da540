use super::deploy::parse_port;
use crate::menu::{self, MenuAction, menu_actions};
use crate::session::Session;
use crate::ui;
use runkit_build::render::{BRANCH, IMAGE, PORT, PROJECT_ID, REGION, REPOSITORY, SERVICE_NAME};
use runkit_build::{PipelineKind, Substitutions, TemplateId};
use runkit_cloud::{TriggerSpec, service_account_email};
use runkit_core::TriggerKind;

menu_actions! {
    /// Actions of `runkit cicd`.
    CicdAction {
        CloudBuild => "cloud-build", "Generate cloudbuild.yaml";
        Trigger => "trigger", "Create a Cloud Build trigger";
        GithubActions => "github-actions", "Generate a GitHub Actions workflow";
        ServiceAccount => "service-account", "Create a deployer service account";
        Makefile => "makefile", "Generate a Makefile";
        IgnoreFiles => "ignore-files", "Generate .dockerignore and .gcloudignore";
        Exit => "exit", "Exit";
    }
}

/// Project roles a CI deployer needs to build, push, and deploy.
const DEPLOYER_ROLES: &[&str] = &[
    "roles/run.admin",
    "roles/iam.serviceAccountUser",
    "roles/artifactregistry.writer",
    "roles/cloudbuild.builds.editor",
    "roles/storage.admin",
];

const DEFAULT_ACCOUNT_ID: &str = "runkit-deployer";
const DEFAULT_BUILD_CONFIG: &str = "cloudbuild.yaml";

pub async fn cicd(session: &mut Session, action: Option<CicdAction>) -> anyhow::Result<()> {
    if let Some(action) = action {
        return run(session, action).await;
    }
    loop {
        let action = menu::select::<CicdAction>(&mut session.prompter, "CI/CD")?;
        if action.is_exit() {
            return Ok(());
        }
        run(session, action).await?;
    }
}

async fn run(session: &mut Session, action: CicdAction) -> anyhow::Result<()> {
    match action {
        CicdAction::CloudBuild => cloud_build(session),
        CicdAction::Trigger => trigger(session).await,
        CicdAction::GithubActions => github_actions(session),
        CicdAction::ServiceAccount => service_account(session).await,
        CicdAction::Makefile => {
            let subs = pipeline_substitutions(session)?;
            session.emit(&session.project_dir, TemplateId::Makefile, &subs)
        }
        CicdAction::IgnoreFiles => session.emit(
            &session.project_dir,
            TemplateId::IgnoreFiles,
            &Substitutions::new(),
        ),
        CicdAction::Exit => Ok(()),
    }
}

// ── Generated pipelines ──

fn cloud_build(session: &mut Session) -> anyhow::Result<()> {
    let kind = session.prompter.choose(
        "Pipeline",
        PipelineKind::ALL,
        |k| k.label().to_owned(),
        Some(0),
    )?;
    let subs = pipeline_substitutions(session)?;
    session.emit(&session.project_dir, TemplateId::CloudBuild(kind), &subs)?;

    ui::info("the Cloud Build service account needs roles/run.admin and roles/iam.serviceAccountUser to deploy");
    if kind == PipelineKind::Full {
        ui::info("set the _TEST_COMMAND substitution on the trigger to run your tests");
    }
    Ok(())
}

fn github_actions(session: &mut Session) -> anyhow::Result<()> {
    let kind = session.prompter.choose(
        "Trigger",
        TriggerKind::ALL,
        |k| k.label().to_owned(),
        Some(0),
    )?;
    let mut subs = pipeline_substitutions(session)?;
    if kind != TriggerKind::Tag {
        let branch = session.prompter.ask_required("Branch", "main")?;
        subs.set(BRANCH, branch);
    }
    session.emit(&session.project_dir, TemplateId::GithubWorkflow(kind), &subs)?;

    ui::info("add a GCP_SA_KEY repository secret holding a key of the deployer service account");
    Ok(())
}

/// Values every CI template shares. The image is the repository path
/// without a tag; pipelines append their own.
fn pipeline_substitutions(session: &mut Session) -> anyhow::Result<Substitutions> {
    let service = session.ask_service_name()?;
    let location = session.ask_location()?;
    let repository = session.prompter.ask_required(
        "Artifact Registry repository",
        &session.defaults.deploy.repository,
    )?;
    let port = session.prompter.ask_validated(
        "Container port",
        &session.defaults.deploy.port.to_string(),
        parse_port,
    )?;

    let image = format!(
        "{}-docker.pkg.dev/{}/{repository}/{service}",
        location.region, location.project_id
    );
    Ok(Substitutions::new()
        .with(SERVICE_NAME, service.as_str())
        .with(REGION, location.region)
        .with(PROJECT_ID, location.project_id)
        .with(IMAGE, image)
        .with(PORT, port.to_string())
        .with(REPOSITORY, repository))
}

// ── Cloud resources ──

async fn trigger(session: &mut Session) -> anyhow::Result<()> {
    let service = session.ask_service_name()?;
    let project_id = session.ask_project_id()?;
    let repo_owner = session.prompter.ask_required("GitHub owner", "")?;
    let repo_name = session.prompter.ask_required("GitHub repository", "")?;
    let kind = session.prompter.choose(
        "Trigger on",
        TriggerKind::ALL,
        |k| k.label().to_owned(),
        Some(0),
    )?;
    let pattern = session
        .prompter
        .ask_required("Ref pattern", kind.default_pattern())?;
    let build_config = session
        .prompter
        .ask_required("Build config", DEFAULT_BUILD_CONFIG)?;
    if !session.project_dir.join(&build_config).exists() {
        ui::warn(format!(
            "{build_config} not found, generate it with: runkit cicd cloud-build"
        ));
    }
    let name = session
        .prompter
        .ask_required("Trigger name", &format!("{service}-{kind}"))?;

    let spec = TriggerSpec {
        name,
        repo_owner,
        repo_name,
        kind,
        pattern,
        build_config,
    };
    session.client.create_trigger(&project_id, &spec).await?;
    ui::success(format!("trigger {} created", spec.name));
    Ok(())
}

async fn service_account(session: &mut Session) -> anyhow::Result<()> {
    let project_id = session.ask_project_id()?;
    let account_id =
        session
            .prompter
            .ask_validated("Account ID", DEFAULT_ACCOUNT_ID, validate_account_id)?;
    let display_name = session
        .prompter
        .ask_required("Display name", "runkit CI deployer")?;

    let created = session
        .client
        .ensure_service_account(&project_id, &account_id, &display_name)
        .await?;
    let email = service_account_email(&account_id, &project_id);
    if created {
        ui::success(format!("created {email}"));
    } else {
        ui::info(format!("{email} already exists"));
    }

    session
        .client
        .bind_project_roles(&project_id, &email, DEPLOYER_ROLES)
        .await?;
    ui::success(format!("granted {}", DEPLOYER_ROLES.join(", ")));
    ui::info(format!(
        "create a key for CI with: gcloud iam service-accounts keys create key.json --iam-account={email}"
    ));
    Ok(())
}

/// 6 to 30 characters: lowercase letters, digits, hyphens; starts with a
/// letter and does not end with a hyphen.
fn validate_account_id(id: &str) -> Result<String, String> {
    let valid = (6..=30).contains(&id.len())
        && id.starts_with(|c: char| c.is_ascii_lowercase())
        && !id.ends_with('-')
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(id.to_owned())
    } else {
        Err(format!(
            "invalid account ID '{id}': 6-30 lowercase letters, digits or hyphens, starting with a letter"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_ids() {
        assert!(validate_account_id("runkit-deployer").is_ok());
        assert!(validate_account_id("ci").is_err());
        assert!(validate_account_id("1deployer").is_err());
        assert!(validate_account_id("deployer-").is_err());
        assert!(validate_account_id("Deployer").is_err());
        assert!(validate_account_id(&"a".repeat(31)).is_err());
    }

    #[test]
    fn default_account_id_is_valid() {
        assert!(validate_account_id(DEFAULT_ACCOUNT_ID).is_ok());
    }

    #[test]
    fn deployer_can_run_and_push() {
        assert!(DEPLOYER_ROLES.contains(&"roles/run.admin"));
        assert!(DEPLOYER_ROLES.contains(&"roles/artifactregistry.writer"));
    }
}
