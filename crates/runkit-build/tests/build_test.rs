use runkit_build::render::{BRANCH, IMAGE, PORT, PROJECT_ID, REGION, REPOSITORY, SERVICE_NAME};
use runkit_build::{
    EmitError, OverwritePolicy, PipelineKind, Runtime, Substitutions, TemplateId, emit,
};
use runkit_core::TriggerKind;
use tempfile::TempDir;

fn subs() -> Substitutions {
    Substitutions::new()
        .with(SERVICE_NAME, "api-demo")
        .with(REGION, "us-central1")
        .with(PROJECT_ID, "my-project")
        .with(IMAGE, "us-central1-docker.pkg.dev/my-project/cloud-run/api-demo")
        .with(PORT, "8080")
        .with(REPOSITORY, "cloud-run")
        .with(BRANCH, "main")
}

fn every_template() -> Vec<TemplateId> {
    let mut ids: Vec<TemplateId> = Runtime::ALL
        .iter()
        .map(|r| TemplateId::Dockerfile(*r))
        .collect();
    ids.extend(PipelineKind::ALL.iter().map(|k| TemplateId::CloudBuild(*k)));
    ids.extend(TriggerKind::ALL.iter().map(|k| TemplateId::GithubWorkflow(*k)));
    ids.push(TemplateId::Makefile);
    ids.push(TemplateId::IgnoreFiles);
    ids
}

// ── Emission Tests ──

#[test]
fn dockerfile_emits_dockerfile_and_dockerignore() {
    let tmp = TempDir::new().unwrap();
    let report = emit(
        tmp.path(),
        TemplateId::Dockerfile(Runtime::Node),
        &subs(),
        OverwritePolicy::KeepExisting,
    )
    .unwrap();

    assert_eq!(
        report.written,
        vec![tmp.path().join("Dockerfile"), tmp.path().join(".dockerignore")]
    );

    let dockerfile = std::fs::read_to_string(tmp.path().join("Dockerfile")).unwrap();
    assert!(dockerfile.contains("FROM node:20-slim"));
    assert!(dockerfile.contains("EXPOSE 8080"));
    assert!(dockerfile.contains("# api-demo:"));
}

#[test]
fn workflow_lands_under_github_workflows() {
    let tmp = TempDir::new().unwrap();
    let report = emit(
        tmp.path(),
        TemplateId::GithubWorkflow(TriggerKind::Branch),
        &subs(),
        OverwritePolicy::KeepExisting,
    )
    .unwrap();

    let path = tmp.path().join(".github/workflows/cloud-run-deploy.yml");
    assert_eq!(report.written, vec![path.clone()]);

    let content = std::fs::read_to_string(path).unwrap();
    assert!(content.contains("branches: ['main']"));
    assert!(content.contains("SERVICE: api-demo"));
    // GitHub expressions survive substitution
    assert!(content.contains("${{ secrets.GCP_SA_KEY }}"));
    assert!(content.contains("${{ github.sha }}"));
}

#[test]
fn cloudbuild_full_keeps_cloud_build_variables() {
    let tmp = TempDir::new().unwrap();
    emit(
        tmp.path(),
        TemplateId::CloudBuild(PipelineKind::Full),
        &subs(),
        OverwritePolicy::KeepExisting,
    )
    .unwrap();

    let content = std::fs::read_to_string(tmp.path().join("cloudbuild.yaml")).unwrap();
    assert!(content.contains("'us-central1-docker.pkg.dev/my-project/cloud-run/api-demo:$BUILD_ID'"));
    assert!(content.contains("$BUILD_ID"));
    assert!(content.contains("${_TEST_COMMAND}"));
    assert!(content.contains("--tag=candidate"));
    assert!(tmp.path().join(".gcloudignore").exists());
}

#[test]
fn no_placeholder_survives_any_template() {
    for id in every_template() {
        let tmp = TempDir::new().unwrap();
        let report = emit(tmp.path(), id, &subs(), OverwritePolicy::KeepExisting).unwrap();

        for path in &report.written {
            let content = std::fs::read_to_string(path).unwrap();
            for key in [SERVICE_NAME, REGION, PROJECT_ID, IMAGE, PORT, REPOSITORY, BRANCH] {
                let placeholder = format!("{{{{{key}}}}}");
                assert!(
                    !content.contains(&placeholder),
                    "{placeholder} left in {} for {id:?}",
                    path.display()
                );
            }
        }
    }
}

#[test]
fn every_substitution_key_is_used_by_some_template() {
    let bodies: Vec<&str> = every_template()
        .iter()
        .flat_map(|id| id.files())
        .map(|f| f.body)
        .collect();

    for key in [SERVICE_NAME, REGION, PROJECT_ID, IMAGE, PORT, REPOSITORY, BRANCH] {
        let placeholder = format!("{{{{{key}}}}}");
        assert!(
            bodies.iter().any(|b| b.contains(&placeholder)),
            "no template uses {placeholder}"
        );
    }
}

#[test]
fn makefile_can_create_the_repository() {
    let tmp = TempDir::new().unwrap();
    emit(tmp.path(), TemplateId::Makefile, &subs(), OverwritePolicy::KeepExisting).unwrap();

    let content = std::fs::read_to_string(tmp.path().join("Makefile")).unwrap();
    assert!(content.contains("REPOSITORY ?= cloud-run"));
    assert!(content.contains("\n\tgcloud artifacts repositories describe $(REPOSITORY)"));
    assert!(content.contains("repositories create $(REPOSITORY) --repository-format=docker"));
}

#[test]
fn emitting_twice_is_idempotent() {
    for id in every_template() {
        let tmp = TempDir::new().unwrap();

        let first = emit(tmp.path(), id, &subs(), OverwritePolicy::KeepExisting).unwrap();
        let snapshot: Vec<Vec<u8>> = first
            .written
            .iter()
            .map(|p| std::fs::read(p).unwrap())
            .collect();

        let second = emit(tmp.path(), id, &subs(), OverwritePolicy::KeepExisting).unwrap();
        assert!(second.written.is_empty(), "{id:?} rewrote files");
        assert!(second.kept.is_empty());
        assert_eq!(second.unchanged, first.written);

        let again: Vec<Vec<u8>> = first
            .written
            .iter()
            .map(|p| std::fs::read(p).unwrap())
            .collect();
        assert_eq!(snapshot, again);
    }
}

// ── Overwrite Policy Tests ──

#[test]
fn modified_file_is_kept_by_default() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Makefile"), "custom:\n\techo mine\n").unwrap();

    let report = emit(
        tmp.path(),
        TemplateId::Makefile,
        &subs(),
        OverwritePolicy::KeepExisting,
    )
    .unwrap();

    assert!(report.written.is_empty());
    assert_eq!(report.kept, vec![tmp.path().join("Makefile")]);
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("Makefile")).unwrap(),
        "custom:\n\techo mine\n"
    );
}

#[test]
fn modified_file_is_replaced_with_overwrite() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("Makefile"), "custom:\n\techo mine\n").unwrap();

    let report = emit(
        tmp.path(),
        TemplateId::Makefile,
        &subs(),
        OverwritePolicy::Overwrite,
    )
    .unwrap();

    assert_eq!(report.written, vec![tmp.path().join("Makefile")]);
    let content = std::fs::read_to_string(tmp.path().join("Makefile")).unwrap();
    assert!(content.contains("SERVICE    ?= api-demo"));
}

#[test]
fn ignore_files_skip_only_the_changed_one() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join(".dockerignore"), "node_modules\n").unwrap();

    let report = emit(
        tmp.path(),
        TemplateId::IgnoreFiles,
        &subs(),
        OverwritePolicy::KeepExisting,
    )
    .unwrap();

    assert_eq!(report.kept, vec![tmp.path().join(".dockerignore")]);
    assert_eq!(report.written, vec![tmp.path().join(".gcloudignore")]);
}

// ── Error Tests ──

#[test]
fn missing_substitution_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let partial = Substitutions::new().with(SERVICE_NAME, "api-demo");

    let result = emit(
        tmp.path(),
        TemplateId::CloudBuild(PipelineKind::Basic),
        &partial,
        OverwritePolicy::Overwrite,
    );

    match result {
        Err(EmitError::Unresolved { file, key }) => {
            assert_eq!(file, "cloudbuild.yaml");
            assert_eq!(key, "IMAGE");
        }
        other => panic!("expected unresolved placeholder, got {other:?}"),
    }
    assert!(!tmp.path().join("cloudbuild.yaml").exists());
    assert!(!tmp.path().join(".gcloudignore").exists());
}

#[test]
fn unresolved_error_names_the_placeholder() {
    let err = EmitError::Unresolved {
        file: "Makefile",
        key: "PORT".to_owned(),
    };
    assert_eq!(err.to_string(), "template Makefile needs a value for {{PORT}}");
}
