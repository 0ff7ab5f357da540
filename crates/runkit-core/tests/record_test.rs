use runkit_core::{
    Artifact, DeployConfig, DeployRecord, KeyValueMap, SecretMounts, ServiceName, record_path,
};
use tempfile::TempDir;

fn config() -> DeployConfig {
    let mut config = DeployConfig::new(
        ServiceName::parse("api-demo").unwrap(),
        "my-project",
        Artifact::Image("gcr.io/my-project/api-demo:latest".to_owned()),
    );
    config.env_vars = KeyValueMap::parse_all(&["LOG_LEVEL=info", "API_TOKEN=hunter2"]).unwrap();
    config.secrets = SecretMounts::parse_all(&["DB_PASS=db-pass"]).unwrap();
    config
}

#[test]
fn record_captures_config_and_url() {
    let record = DeployRecord::new(&config(), "https://api-demo-abc-uc.a.run.app");

    assert_eq!(record.get("SERVICE_NAME"), Some("api-demo"));
    assert_eq!(record.get("PROJECT_ID"), Some("my-project"));
    assert_eq!(record.get("REGION"), Some("us-central1"));
    assert_eq!(record.get("IMAGE"), Some("gcr.io/my-project/api-demo:latest"));
    assert_eq!(record.get("MEMORY"), Some("512Mi"));
    assert_eq!(record.get("MAX_INSTANCES"), Some("100"));
    assert_eq!(record.get("SECRETS"), Some("DB_PASS=db-pass:latest"));
    assert_eq!(
        record.get("SERVICE_URL"),
        Some("https://api-demo-abc-uc.a.run.app")
    );
    assert!(record.get("SOURCE").is_none());
    assert!(record.get("SERVICE_ACCOUNT").is_none());
}

#[test]
fn record_does_not_store_env_var_values() {
    let rendered = DeployRecord::new(&config(), "https://x").render();

    assert!(rendered.contains("ENV_VAR_NAMES=API_TOKEN,LOG_LEVEL"));
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn record_for_source_deploy() {
    let mut config = config();
    config.artifact = Artifact::Source(".".into());
    let record = DeployRecord::new(&config, "https://x");

    assert_eq!(record.get("SOURCE"), Some("."));
    assert!(record.get("IMAGE").is_none());
}

#[test]
fn write_then_read_back() {
    let tmp = TempDir::new().unwrap();
    let record = DeployRecord::new(&config(), "https://api-demo.run.app");

    let path = record.write(tmp.path()).unwrap();
    assert_eq!(path, record_path(tmp.path(), "api-demo"));
    assert!(path.ends_with(".runkit/api-demo.conf"));

    let loaded = DeployRecord::read(tmp.path(), "api-demo").unwrap().unwrap();
    assert_eq!(loaded, record);
}

#[test]
fn read_missing_record_is_none() {
    let tmp = TempDir::new().unwrap();
    assert!(DeployRecord::read(tmp.path(), "never-deployed").unwrap().is_none());
}

#[test]
fn parse_skips_comments_and_blank_lines() {
    let record = DeployRecord::parse("# saved\n\nSERVICE_NAME=api\nnot a pair\nURL=https://a=b\n");

    assert_eq!(record.entries().len(), 2);
    assert_eq!(record.get("SERVICE_NAME"), Some("api"));
    assert_eq!(record.get("URL"), Some("https://a=b"));
}
