use super::deploy::parse_count;
use crate::menu::{self, MenuAction, menu_actions};
use crate::session::Session;
use crate::ui;
use anyhow::bail;
use runkit_cloud::{CloudRunClient, Location, compute_service_account};
use runkit_core::{DeployRecord, ServiceName};

menu_actions! {
    /// Actions of `runkit manage`.
    ManageAction {
        List => "list", "List services";
        Status => "status", "Show service status";
        Logs => "logs", "Read recent logs";
        Revisions => "revisions", "List revisions and traffic";
        Traffic => "traffic", "Manage traffic";
        Metrics => "metrics", "Summarize recent requests";
        Secrets => "secrets", "Manage secrets";
        Access => "access", "Manage public access";
        Domains => "domains", "Manage domain mappings";
        HealthCheck => "health-check", "Check the service URL responds";
        SavedConfig => "saved-config", "Show the saved deploy configuration";
        Delete => "delete", "Delete a service";
        Exit => "exit", "Exit";
    }
}

menu_actions! {
    TrafficAction {
        Split => "split", "Split traffic across revisions";
        Latest => "latest", "Send all traffic to the latest revision";
        Tag => "tag", "Tag a revision";
        Back => "back", "Back";
    }
}

menu_actions! {
    SecretAction {
        Set => "set", "Create or update a secret";
        List => "list", "List secrets";
        Grant => "grant", "Grant a service account access to a secret";
        Back => "back", "Back";
    }
}

menu_actions! {
    AccessAction {
        Public => "public", "Allow unauthenticated access";
        Private => "private", "Require authentication";
        Back => "back", "Back";
    }
}

menu_actions! {
    DomainAction {
        Map => "map", "Map a custom domain";
        List => "list", "List domain mappings";
        Unmap => "unmap", "Remove a domain mapping";
        Back => "back", "Back";
    }
}

const DEFAULT_LOG_LIMIT: &str = "50";
const DEFAULT_METRICS_WINDOW: &str = "1h";
const DEFAULT_METRICS_LIMIT: &str = "1000";

pub async fn manage(session: &mut Session, action: Option<ManageAction>) -> anyhow::Result<()> {
    if let Some(action) = action {
        return run(session, action).await;
    }
    loop {
        let action = menu::select::<ManageAction>(&mut session.prompter, "Manage")?;
        if action.is_exit() {
            return Ok(());
        }
        run(session, action).await?;
    }
}

async fn run(session: &mut Session, action: ManageAction) -> anyhow::Result<()> {
    match action {
        ManageAction::List => {
            let location = session.ask_location()?;
            session.client.list_services(&location).await?;
        }
        ManageAction::Status => status(session).await?,
        ManageAction::Logs => {
            let (service, location) = session.ask_service()?;
            let limit = session.prompter.ask_validated(
                "Number of entries",
                DEFAULT_LOG_LIMIT,
                parse_count,
            )?;
            session
                .client
                .read_logs(service.as_str(), &location, limit)
                .await?;
        }
        ManageAction::Revisions => revisions(session).await?,
        ManageAction::Traffic => traffic(session).await?,
        ManageAction::Metrics => metrics(session).await?,
        ManageAction::Secrets => secrets(session).await?,
        ManageAction::Access => access(session).await?,
        ManageAction::Domains => domains(session).await?,
        ManageAction::HealthCheck => health_check(session).await?,
        ManageAction::SavedConfig => saved_config(session)?,
        ManageAction::Delete => delete(session).await?,
        ManageAction::Exit => {}
    }
    Ok(())
}

// ── Status ──

async fn status(session: &mut Session) -> anyhow::Result<()> {
    let (service, location) = session.ask_service()?;
    let status = session
        .client
        .service_status(service.as_str(), &location)
        .await?;

    ui::header(service.as_str());
    ui::field("URL", status.url.as_deref().unwrap_or("-"));
    ui::field(
        "Ready",
        match status.ready {
            Some(true) => "yes",
            Some(false) => "no",
            None => "unknown",
        },
    );
    for target in &status.traffic {
        let revision = match (&target.revision, target.latest) {
            (Some(rev), _) => rev.clone(),
            (None, true) => "LATEST".to_owned(),
            (None, false) => "-".to_owned(),
        };
        let tag = target
            .tag
            .as_deref()
            .map(|t| format!(" (tag {t})"))
            .unwrap_or_default();
        ui::field("Traffic", format!("{}% {revision}{tag}", target.percent));
    }

    if session
        .prompter
        .confirm("Show the full service description?", false)?
    {
        session
            .client
            .describe_service(service.as_str(), &location)
            .await?;
    }
    Ok(())
}

async fn revisions(session: &mut Session) -> anyhow::Result<()> {
    let (service, location) = session.ask_service()?;
    print_revisions(&session.client, &service, &location).await
}

async fn print_revisions(
    client: &CloudRunClient,
    service: &ServiceName,
    location: &Location,
) -> anyhow::Result<()> {
    let revisions = client.list_revisions(service.as_str(), location).await?;
    let status = client.service_status(service.as_str(), location).await?;

    if revisions.is_empty() {
        ui::info(format!("no revisions found for {service}"));
        return Ok(());
    }

    println!("{:<48} {:<28} {:>7}  STATUS", "REVISION", "CREATED", "TRAFFIC");
    for rev in &revisions {
        let percent: u32 = status
            .traffic
            .iter()
            .filter(|t| t.revision.as_deref() == Some(rev.name.as_str()))
            .map(|t| t.percent)
            .sum();
        println!(
            "{:<48} {:<28} {:>6}%  {}",
            rev.name,
            rev.created.as_deref().unwrap_or("-"),
            percent,
            if rev.ready { "ready" } else { "not ready" }
        );
    }
    Ok(())
}

// ── Traffic ──

async fn traffic(session: &mut Session) -> anyhow::Result<()> {
    let (service, location) = session.ask_service()?;
    loop {
        match menu::select::<TrafficAction>(&mut session.prompter, "Traffic")? {
            TrafficAction::Split => {
                print_revisions(&session.client, &service, &location).await?;
                let split = ask_split(session)?;
                session
                    .client
                    .split_traffic(service.as_str(), &location, &split)
                    .await?;
                ui::success("traffic updated");
            }
            TrafficAction::Latest => {
                session
                    .client
                    .route_to_latest(service.as_str(), &location)
                    .await?;
                ui::success("all traffic goes to the latest revision");
            }
            TrafficAction::Tag => {
                let revision = session.prompter.ask_required("Revision", "")?;
                let tag = session.prompter.ask_required("Tag", "")?;
                session
                    .client
                    .tag_revision(service.as_str(), &location, &revision, &tag)
                    .await?;
                ui::success(format!("tagged {revision} as {tag}"));
            }
            TrafficAction::Back => return Ok(()),
        }
    }
}

fn ask_split(session: &mut Session) -> anyhow::Result<Vec<(String, u32)>> {
    loop {
        let entries = session
            .prompter
            .collect_list("Traffic split (revision=percent)")?;
        match parse_split(&entries) {
            Ok(split) => return Ok(split),
            Err(e) if !session.prompter.is_interactive() => bail!(e),
            Err(e) => ui::error(e),
        }
    }
}

/// `revision=percent` entries whose percentages sum to 100.
fn parse_split(entries: &[String]) -> Result<Vec<(String, u32)>, String> {
    if entries.is_empty() {
        return Err("at least one revision=percent entry is required".to_owned());
    }
    let split = entries
        .iter()
        .map(|entry| -> Result<(String, u32), String> {
            let (rev, pct) = entry
                .split_once('=')
                .ok_or_else(|| format!("'{entry}' is not revision=percent"))?;
            let pct = pct
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|p| *p <= 100)
                .ok_or_else(|| format!("'{pct}' is not a percentage"))?;
            Ok((rev.trim().to_owned(), pct))
        })
        .collect::<Result<Vec<_>, String>>()?;

    let total: u32 = split.iter().map(|(_, pct)| pct).sum();
    if total != 100 {
        return Err(format!("percentages add up to {total}, not 100"));
    }
    Ok(split)
}

// ── Metrics ──

async fn metrics(session: &mut Session) -> anyhow::Result<()> {
    let (service, location) = session.ask_service()?;
    let window = session
        .prompter
        .ask_required("Time window (e.g. 30m, 1h, 1d)", DEFAULT_METRICS_WINDOW)?;
    let limit = session.prompter.ask_validated(
        "Max log entries to read",
        DEFAULT_METRICS_LIMIT,
        parse_count,
    )?;

    let summary = session
        .client
        .request_metrics(service.as_str(), &location.project_id, &window, limit)
        .await?;

    ui::header(&format!("{service}, last {window}"));
    ui::field("Requests", summary.requests);
    ui::field("4xx responses", summary.client_errors);
    ui::field("5xx responses", summary.server_errors);
    ui::field("Error rate", format!("{:.2}%", summary.error_rate()));
    ui::field("Mean latency", latency(summary.mean_latency_ms));
    ui::field("Max latency", latency(summary.max_latency_ms));
    Ok(())
}

fn latency(ms: Option<f64>) -> String {
    ms.map(|ms| format!("{ms:.1} ms")).unwrap_or_else(|| "-".to_owned())
}

// ── Secrets ──

async fn secrets(session: &mut Session) -> anyhow::Result<()> {
    let project_id = session.ask_project_id()?;
    loop {
        match menu::select::<SecretAction>(&mut session.prompter, "Secrets")? {
            SecretAction::Set => {
                let name = session
                    .prompter
                    .ask_validated("Secret name", "", validate_secret_name)?;
                let value = session.prompter.ask_secret("Secret value")?;
                session
                    .client
                    .set_secret(&project_id, &name, &value)
                    .await?;
                ui::success(format!("secret {name} updated"));
            }
            SecretAction::List => {
                let names = session.client.list_secrets(&project_id).await?;
                if names.is_empty() {
                    ui::info(format!("no secrets in {project_id}"));
                }
                for name in names {
                    println!("{name}");
                }
            }
            SecretAction::Grant => {
                let name = session
                    .prompter
                    .ask_validated("Secret name", "", validate_secret_name)?;
                let number = session.client.get_project_number(&project_id).await?;
                let default = if number.is_empty() {
                    String::new()
                } else {
                    compute_service_account(&number)
                };
                let account = session
                    .prompter
                    .ask_required("Service account email", &default)?;
                session
                    .client
                    .grant_secret_access(&project_id, &name, &account)
                    .await?;
                ui::success(format!("{account} can read {name}"));
            }
            SecretAction::Back => return Ok(()),
        }
    }
}

/// Letters, digits, `-` and `_`, up to 255 characters.
fn validate_secret_name(name: &str) -> Result<String, String> {
    let valid = !name.is_empty()
        && name.len() <= 255
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(name.to_owned())
    } else {
        Err(format!(
            "invalid secret name '{name}': use letters, digits, '-' and '_' (at most 255)"
        ))
    }
}

// ── Access ──

async fn access(session: &mut Session) -> anyhow::Result<()> {
    let (service, location) = session.ask_service()?;
    loop {
        let public = match menu::select::<AccessAction>(&mut session.prompter, "Access")? {
            AccessAction::Public => true,
            AccessAction::Private => false,
            AccessAction::Back => return Ok(()),
        };
        session
            .client
            .set_public_access(service.as_str(), &location, public)
            .await?;
        if public {
            ui::success(format!("{service} accepts unauthenticated requests"));
        } else {
            ui::success(format!("{service} requires authentication"));
        }
    }
}

// ── Domains ──

async fn domains(session: &mut Session) -> anyhow::Result<()> {
    let (service, location) = session.ask_service()?;
    loop {
        match menu::select::<DomainAction>(&mut session.prompter, "Domains")? {
            DomainAction::Map => {
                let domain = session.prompter.ask_required("Domain", "")?;
                session
                    .client
                    .map_domain(service.as_str(), &domain, &location)
                    .await?;
                ui::success(format!("{domain} mapped to {service}"));
                ui::info("add the DNS records listed above at your DNS provider");
            }
            DomainAction::List => session.client.list_domain_mappings(&location).await?,
            DomainAction::Unmap => {
                let domain = session.prompter.ask_required("Domain", "")?;
                if session
                    .prompter
                    .confirm(&format!("Remove the mapping for {domain}?"), false)?
                {
                    session.client.unmap_domain(&domain, &location).await?;
                    ui::success(format!("{domain} unmapped"));
                } else {
                    ui::info("cancelled");
                }
            }
            DomainAction::Back => return Ok(()),
        }
    }
}

// ── Health ──

async fn health_check(session: &mut Session) -> anyhow::Result<()> {
    let (service, location) = session.ask_service()?;
    let url = session
        .client
        .service_url(service.as_str(), &location)
        .await?;
    if url.is_empty() {
        if session.client.is_simulated() {
            ui::info("dry run: no service URL to check");
            return Ok(());
        }
        bail!("{service} has no URL yet");
    }

    let path = session.prompter.ask("Path", "/")?;
    let target = format!("{}/{}", url.trim_end_matches('/'), path.trim_start_matches('/'));
    if !report_health(&session.client, &target).await {
        bail!("health check failed for {target}");
    }
    Ok(())
}

/// Request `url` and report the status. `true` for 2xx and 3xx, or when
/// nothing was requested in a dry run.
pub(crate) async fn report_health(client: &CloudRunClient, url: &str) -> bool {
    match client.http_status(url).await {
        Ok(Some(code)) if (200..400).contains(&code) => {
            ui::success(format!("{url} answered {code}"));
            true
        }
        Ok(Some(code)) => {
            ui::warn(format!("{url} answered {code}"));
            false
        }
        Ok(None) => {
            ui::info(format!("dry run: {url} was not requested"));
            true
        }
        Err(e) => {
            ui::warn(format!("{:#}", anyhow::Error::from(e)));
            false
        }
    }
}

// ── Saved config & delete ──

fn saved_config(session: &mut Session) -> anyhow::Result<()> {
    let service = session.ask_service_name()?;
    match DeployRecord::read(&session.project_dir, service.as_str())? {
        Some(record) => {
            ui::header(&format!("{service}, last deploy"));
            for (key, value) in record.entries() {
                println!("{key}={value}");
            }
        }
        None => ui::warn(format!(
            "no saved configuration for {service}, one is written after each deploy"
        )),
    }
    Ok(())
}

async fn delete(session: &mut Session) -> anyhow::Result<()> {
    let (service, location) = session.ask_service()?;
    let prompt = format!(
        "Delete {service} in {}? This cannot be undone",
        location.region
    );
    if !session.prompter.confirm(&prompt, false)? {
        ui::info("cancelled");
        return Ok(());
    }
    session
        .client
        .delete_service(service.as_str(), &location)
        .await?;
    ui::success(format!("{service} deleted"));
    Ok(())
}
