use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// The binary in `dir` with no inherited runkit configuration.
fn runkit(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("runkit");
    cmd.current_dir(dir).env("NO_COLOR", "1");
    for var in [
        "DRY_RUN",
        "NON_INTERACTIVE",
        "DEBUG",
        "RUST_LOG",
        "SERVICE_NAME",
        "PROJECT_ID",
        "GOOGLE_CLOUD_PROJECT",
        "REGION",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Non-interactive run for `api-demo` in `my-project`.
fn batch(dir: &Path) -> assert_cmd::Command {
    let mut cmd = runkit(dir);
    cmd.arg("--non-interactive")
        .env("PROJECT_ID", "my-project")
        .env("SERVICE_NAME", "api-demo");
    cmd
}

// ── Help / Version ──

#[test]
fn shows_help() {
    let tmp = TempDir::new().unwrap();
    runkit(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Guided deploy"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn shows_version() {
    let tmp = TempDir::new().unwrap();
    runkit(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("runkit"));
}

#[test]
fn lists_actions_in_subcommand_help() {
    let tmp = TempDir::new().unwrap();
    runkit(tmp.path())
        .args(["manage", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("health-check"))
        .stdout(predicate::str::contains("saved-config"));
}

#[test]
fn rejects_unknown_action() {
    let tmp = TempDir::new().unwrap();
    runkit(tmp.path())
        .args(["deploy", "launch-rockets"])
        .assert()
        .failure();
}

// ── Non-interactive mode ──

#[test]
fn non_interactive_requires_an_action() {
    let tmp = TempDir::new().unwrap();
    batch(tmp.path())
        .arg("deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("an action is required"));
}

#[test]
fn non_interactive_flag_can_come_from_env() {
    for value in ["1", "true", "yes"] {
        let tmp = TempDir::new().unwrap();
        runkit(tmp.path())
            .env("NON_INTERACTIVE", value)
            .arg("setup")
            .assert()
            .failure()
            .stderr(predicate::str::contains("an action is required"));
    }
}

#[test]
fn mode_env_values_are_truthy_or_falsey() {
    let tmp = TempDir::new().unwrap();
    for debug in ["yes", "1", "0", ""] {
        batch(tmp.path())
            .env("DEBUG", debug)
            .args(["deploy", "show-command"])
            .assert()
            .success()
            .stdout(predicate::str::contains("gcloud run deploy api-demo"));
    }

    batch(tmp.path())
        .env("DRY_RUN", "0")
        .args(["deploy", "show-command"])
        .assert()
        .success()
        .stderr(predicate::str::contains("dry run").not());

    batch(tmp.path())
        .env("DRY_RUN", "yes")
        .args(["deploy", "show-command"])
        .assert()
        .success()
        .stderr(predicate::str::contains("dry run: external commands are printed"));
}

#[test]
fn show_command_uses_documented_defaults() {
    let tmp = TempDir::new().unwrap();
    batch(tmp.path())
        .args(["deploy", "show-command"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gcloud run deploy api-demo"))
        .stdout(predicate::str::contains(
            "--image=us-central1-docker.pkg.dev/my-project/cloud-run/api-demo:latest",
        ))
        .stdout(predicate::str::contains("--region=us-central1"))
        .stdout(predicate::str::contains("--memory=512Mi"))
        .stdout(predicate::str::contains("--cpu=1"))
        .stdout(predicate::str::contains("--concurrency=80"))
        .stdout(predicate::str::contains("--min-instances=0"))
        .stdout(predicate::str::contains("--max-instances=100"))
        .stdout(predicate::str::contains("--timeout=300"))
        .stdout(predicate::str::contains("--allow-unauthenticated"))
        .stdout(predicate::str::contains("--service-account").not())
        .stdout(predicate::str::contains("--set-env-vars").not());
}

#[test]
fn defaults_file_and_env_are_layered() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("runkit.toml"),
        r#"
[project]
project_id = "toml-project"
service_name = "from-toml"
region = "europe-west1"

[deploy]
memory = "1Gi"
max_instances = 5
"#,
    )
    .unwrap();

    // runkit.toml alone
    runkit(tmp.path())
        .args(["--non-interactive", "deploy", "show-command"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gcloud run deploy from-toml"))
        .stdout(predicate::str::contains("--project=toml-project"))
        .stdout(predicate::str::contains("--region=europe-west1"))
        .stdout(predicate::str::contains("--memory=1Gi"))
        .stdout(predicate::str::contains("--max-instances=5"));

    // environment wins over the file
    runkit(tmp.path())
        .args(["--non-interactive", "deploy", "show-command"])
        .env("SERVICE_NAME", "from-env")
        .assert()
        .success()
        .stdout(predicate::str::contains("gcloud run deploy from-env"))
        .stdout(predicate::str::contains("--project=toml-project"));
}

#[test]
fn invalid_service_name_is_rejected() {
    let tmp = TempDir::new().unwrap();
    batch(tmp.path())
        .env("SERVICE_NAME", "Api_Demo")
        .args(["deploy", "show-command"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("gcloud run deploy").not())
        .stderr(predicate::str::contains("invalid service name"));
}

#[test]
fn missing_project_is_fatal_without_prompting() {
    let tmp = TempDir::new().unwrap();
    runkit(tmp.path())
        .env("SERVICE_NAME", "api-demo")
        .args(["--non-interactive", "deploy", "show-command"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Project ID"));
}

// ── Dry run ──

#[test]
fn dry_run_deploy_traces_instead_of_running() {
    let tmp = TempDir::new().unwrap();
    batch(tmp.path())
        .args(["--dry-run", "deploy", "deploy-image"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY-RUN] gcloud run deploy api-demo"))
        .stdout(predicate::str::contains("--memory=512Mi"))
        .stdout(predicate::str::contains("--quiet"));

    // no successful deploy, so nothing is recorded
    assert!(!tmp.path().join(".runkit").exists());
}

#[test]
fn dry_run_flag_can_come_from_env() {
    let tmp = TempDir::new().unwrap();
    batch(tmp.path())
        .env("DRY_RUN", "1")
        .args(["deploy", "deploy-source"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY-RUN] gcloud run deploy api-demo --source=."));
}

#[test]
fn dry_run_delete_defaults_to_no() {
    let tmp = TempDir::new().unwrap();
    batch(tmp.path())
        .args(["--dry-run", "manage", "delete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("services delete").not())
        .stderr(predicate::str::contains("cancelled"));
}

#[test]
fn dry_run_setup_check_traces_every_check() {
    let tmp = TempDir::new().unwrap();
    batch(tmp.path())
        .args(["--dry-run", "setup", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY-RUN] gcloud version"))
        .stdout(predicate::str::contains("[DRY-RUN] docker --version"))
        .stdout(predicate::str::contains("run.googleapis.com"));
}

// ── Generated files ──

#[test]
fn cicd_makefile_is_generated() {
    let tmp = TempDir::new().unwrap();
    batch(tmp.path())
        .args(["cicd", "makefile"])
        .assert()
        .success();

    let makefile = std::fs::read_to_string(tmp.path().join("Makefile")).unwrap();
    assert!(makefile.contains("SERVICE    ?= api-demo"));
    assert!(makefile.contains(
        "IMAGE      ?= us-central1-docker.pkg.dev/my-project/cloud-run/api-demo"
    ));
}

#[test]
fn answers_can_be_piped_without_a_terminal() {
    let tmp = TempDir::new().unwrap();
    runkit(tmp.path())
        .args(["cicd", "makefile"])
        .write_stdin("api-demo\nmy-project\neurope-west1\n\n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Service name"));

    let makefile = std::fs::read_to_string(tmp.path().join("Makefile")).unwrap();
    assert!(makefile.contains("SERVICE    ?= api-demo"));
    assert!(makefile.contains("REGION     ?= europe-west1"));
    assert!(makefile.contains("REPOSITORY ?= cloud-run"));
}

#[test]
fn closed_stdin_fails_instead_of_defaulting() {
    let tmp = TempDir::new().unwrap();
    runkit(tmp.path())
        .args(["cicd", "makefile"])
        .write_stdin("api-demo\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input closed"));
    assert!(!tmp.path().join("Makefile").exists());
}

#[test]
fn local_changes_are_kept_unless_forced() {
    let tmp = TempDir::new().unwrap();
    let makefile = tmp.path().join("Makefile");
    std::fs::write(&makefile, "custom:\n\techo mine\n").unwrap();

    batch(tmp.path())
        .args(["cicd", "makefile"])
        .assert()
        .success()
        .stderr(predicate::str::contains("--force"));
    assert_eq!(
        std::fs::read_to_string(&makefile).unwrap(),
        "custom:\n\techo mine\n"
    );

    batch(tmp.path())
        .args(["--force", "cicd", "makefile"])
        .assert()
        .success();
    assert!(std::fs::read_to_string(&makefile)
        .unwrap()
        .contains("SERVICE    ?= api-demo"));
}

#[test]
fn regenerating_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    batch(tmp.path())
        .args(["cicd", "cloud-build"])
        .assert()
        .success();
    let first = std::fs::read(tmp.path().join("cloudbuild.yaml")).unwrap();

    batch(tmp.path())
        .args(["cicd", "cloud-build"])
        .assert()
        .success()
        .stderr(predicate::str::contains("up to date"));
    assert_eq!(std::fs::read(tmp.path().join("cloudbuild.yaml")).unwrap(), first);
}

#[test]
fn github_workflow_lands_in_workflows_dir() {
    let tmp = TempDir::new().unwrap();
    batch(tmp.path())
        .args(["cicd", "github-actions"])
        .assert()
        .success();

    let workflow = tmp.path().join(".github/workflows/cloud-run-deploy.yml");
    let content = std::fs::read_to_string(workflow).unwrap();
    assert!(content.contains("branches: ['main']"));
    assert!(content.contains("SERVICE: api-demo"));
}

#[test]
fn dockerfile_follows_detected_runtime() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("go.mod"), "module example.com/api\n").unwrap();

    batch(tmp.path())
        .args(["deploy", "generate-dockerfile"])
        .assert()
        .success()
        .stderr(predicate::str::contains("detected a go project"));

    assert!(tmp.path().join("Dockerfile").exists());
    assert!(tmp.path().join(".dockerignore").exists());
}

#[test]
fn project_dir_flag_redirects_output() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("app");
    std::fs::create_dir(&target).unwrap();

    batch(tmp.path())
        .args(["--project-dir", "app", "cicd", "ignore-files"])
        .assert()
        .success();

    assert!(target.join(".dockerignore").exists());
    assert!(target.join(".gcloudignore").exists());
    assert!(!tmp.path().join(".dockerignore").exists());
}

// ── Saved config ──

#[test]
fn saved_config_reports_missing_record() {
    let tmp = TempDir::new().unwrap();
    batch(tmp.path())
        .args(["manage", "saved-config"])
        .assert()
        .success()
        .stderr(predicate::str::contains("no saved configuration for api-demo"));
}

#[test]
fn saved_config_prints_record() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join(".runkit");
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(
        dir.join("api-demo.conf"),
        "SERVICE_NAME=api-demo\nMEMORY=1Gi\nSERVICE_URL=https://api-demo-xyz.a.run.app\n",
    )
    .unwrap();

    batch(tmp.path())
        .args(["manage", "saved-config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MEMORY=1Gi"))
        .stdout(predicate::str::contains("SERVICE_URL=https://api-demo-xyz.a.run.app"));
}
