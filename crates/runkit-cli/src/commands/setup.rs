use super::deploy::ensure_repository;
use crate::menu::{self, MenuAction, menu_actions};
use crate::session::Session;
use crate::ui;
use anyhow::bail;
use runkit_cloud::{CheckResult, DoctorReport, REQUIRED_APIS};

menu_actions! {
    /// Actions of `runkit setup`.
    SetupAction {
        Check => "check", "Check tools, login, project, and APIs";
        EnableApis => "enable-apis", "Enable the required APIs";
        ConfigureDocker => "configure-docker", "Let docker push to Artifact Registry";
        SetDefaults => "set-defaults", "Set the default gcloud project and region";
        CreateRepository => "create-repository", "Create an Artifact Registry repository";
        Exit => "exit", "Exit";
    }
}

pub async fn setup(session: &mut Session, action: Option<SetupAction>) -> anyhow::Result<()> {
    if let Some(action) = action {
        return run(session, action).await;
    }
    loop {
        let action = menu::select::<SetupAction>(&mut session.prompter, "Setup")?;
        if action.is_exit() {
            return Ok(());
        }
        run(session, action).await?;
    }
}

async fn run(session: &mut Session, action: SetupAction) -> anyhow::Result<()> {
    match action {
        SetupAction::Check => check(session).await,
        SetupAction::EnableApis => {
            let project_id = session.ask_project_id()?;
            let apis: Vec<&str> = REQUIRED_APIS.iter().map(|(_, api)| *api).collect();
            ui::info(format!("enabling {}", apis.join(", ")));
            session.client.enable_apis(&project_id, &apis).await?;
            ui::success("APIs enabled");
            Ok(())
        }
        SetupAction::ConfigureDocker => {
            let region = session.ask_region()?;
            let host = format!("{region}-docker.pkg.dev");
            session.client.configure_docker(&host).await?;
            ui::success(format!("docker can push to {host}"));
            Ok(())
        }
        SetupAction::SetDefaults => {
            let project_id = session.ask_project_id()?;
            let region = session.ask_region()?;
            session.client.set_defaults(&project_id, &region).await?;
            ui::success(format!("gcloud now defaults to {project_id} in {region}"));
            Ok(())
        }
        SetupAction::CreateRepository => {
            let location = session.ask_location()?;
            let repository = session.prompter.ask_required(
                "Repository name",
                &session.defaults.deploy.repository,
            )?;
            ensure_repository(session, &repository, &location).await?;
            ui::success(format!(
                "repository ready: {}-docker.pkg.dev/{}/{repository}",
                location.region, location.project_id
            ));
            Ok(())
        }
        SetupAction::Exit => Ok(()),
    }
}

async fn check(session: &mut Session) -> anyhow::Result<()> {
    let report = session
        .client
        .doctor(session.defaults.project.project_id.as_deref())
        .await;
    print_report(&report);

    if session.client.is_simulated() {
        ui::info("dry run: checks were traced, not run");
        return Ok(());
    }

    let disabled = report.disabled_apis();
    if !disabled.is_empty() {
        ui::warn(format!(
            "enable the missing APIs with: runkit setup enable-apis ({})",
            disabled.join(", ")
        ));
    }
    if !report.all_passed() {
        bail!("some checks failed");
    }
    ui::success("all checks passed");
    Ok(())
}

fn print_report(report: &DoctorReport) {
    ui::header("Environment");
    line("gcloud CLI", &report.gcloud);
    line("docker", &report.docker);
    line("Account", &report.account);
    line("Project", &report.project);

    if !report.apis.is_empty() {
        ui::header("APIs");
        for api in &report.apis {
            line(&api.name, &api.result);
        }
    }
}

fn line(label: &str, check: &CheckResult) {
    ui::field(label, format!("[{}] {}", check.icon(), check.detail));
}
