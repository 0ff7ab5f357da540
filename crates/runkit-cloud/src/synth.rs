//! Deploy command synthesis: a pure function from a frozen
//! [`DeployConfig`] to the `gcloud` argument list.
//!
//! Every flag is a single `--flag=value` token. Required settings are always
//! emitted in a fixed order; each optional setting contributes exactly one
//! flag when it is set and nothing when it is not.

use runkit_core::{Artifact, DeployConfig};

/// Delimiter characters tried, in order, when a map value contains a comma.
/// The first one absent from every entry is doubled, see `gcloud topic escaping`.
const ALT_DELIMITERS: &[char] = &['#', '@', '~', ';', '%', '|', '!', '+', '*', '\u{1f}'];

pub fn deploy_args(config: &DeployConfig) -> Vec<String> {
    let mut args = vec![
        "run".to_owned(),
        "deploy".to_owned(),
        config.service_name.to_string(),
    ];

    match &config.artifact {
        Artifact::Image(image) => args.push(flag("image", image)),
        Artifact::Source(path) => args.push(flag("source", &path.display().to_string())),
    }

    args.push(flag("platform", "managed"));
    args.push(flag("region", &config.region));
    args.push(flag("project", &config.project_id));
    args.push(flag("port", &config.port.to_string()));
    args.push(flag("memory", config.memory.as_str()));
    args.push(flag("cpu", &config.cpu));
    args.push(flag("concurrency", &config.concurrency.to_string()));
    args.push(flag("min-instances", &config.min_instances.to_string()));
    args.push(flag("max-instances", &config.max_instances.to_string()));
    args.push(flag("timeout", &config.timeout_secs.to_string()));
    args.push(flag("ingress", config.ingress.as_flag_value()));
    args.push(flag("vpc-egress", config.vpc_egress.as_flag_value()));
    args.push(flag(
        "execution-environment",
        config.execution_environment.as_flag_value(),
    ));
    args.push(if config.allow_unauthenticated {
        "--allow-unauthenticated".to_owned()
    } else {
        "--no-allow-unauthenticated".to_owned()
    });

    // ── Optional ──

    push_opt(&mut args, "service-account", config.service_account.as_deref());
    push_map(&mut args, "labels", config.labels.iter());
    push_map(&mut args, "annotations", config.annotations.iter());
    push_opt(&mut args, "tag", config.tag.as_deref());
    push_opt(&mut args, "revision-suffix", config.revision_suffix.as_deref());
    if config.no_traffic {
        args.push("--no-traffic".to_owned());
    }
    push_map(&mut args, "set-env-vars", config.env_vars.iter());
    push_map(&mut args, "set-secrets", config.secrets.iter());
    push_opt(
        &mut args,
        "add-cloudsql-instances",
        config.cloudsql_instance.as_deref(),
    );
    push_opt(&mut args, "vpc-connector", config.vpc_connector.as_deref());

    args
}

fn flag(name: &str, value: &str) -> String {
    format!("--{name}={value}")
}

/// Values are emitted exactly as set; blank answers are mapped to `None`
/// when the configuration is collected.
fn push_opt(args: &mut Vec<String>, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        args.push(flag(name, value));
    }
}

fn push_map<'a>(args: &mut Vec<String>, name: &str, entries: impl Iterator<Item = (&'a str, &'a str)>) {
    let pairs: Vec<String> = entries.map(|(k, v)| format!("{k}={v}")).collect();
    if pairs.is_empty() {
        return;
    }
    if pairs.iter().any(|p| p.contains(',')) {
        let delimiter = alt_delimiter(&pairs);
        let joined = pairs.join(&delimiter);
        args.push(flag(name, &format!("^{delimiter}^{joined}")));
    } else {
        args.push(flag(name, &pairs.join(",")));
    }
}

fn alt_delimiter(pairs: &[String]) -> String {
    let c = ALT_DELIMITERS
        .iter()
        .copied()
        .find(|c| pairs.iter().all(|p| !p.contains(*c)))
        .unwrap_or('\u{1f}');
    [c, c].iter().collect()
}

/// Render an argument list the way a user would type it, quoting tokens
/// that contain shell-significant characters.
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut out = String::from(program);
    for arg in args {
        out.push(' ');
        if arg.is_empty()
            || arg
                .chars()
                .any(|c| c.is_whitespace() || "'\"$`\\!*?;&|<>()#".contains(c))
        {
            out.push('\'');
            out.push_str(&arg.replace('\'', r"'\''"));
            out.push('\'');
        } else {
            out.push_str(arg);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_only_when_needed() {
        let args = vec![
            "run".to_owned(),
            "--set-env-vars=GREETING=hello world".to_owned(),
            "--tag=v1".to_owned(),
        ];
        assert_eq!(
            display_command("gcloud", &args),
            "gcloud run '--set-env-vars=GREETING=hello world' --tag=v1"
        );
    }

    #[test]
    fn display_escapes_single_quotes() {
        let args = vec!["it's".to_owned()];
        assert_eq!(display_command("echo", &args), r"echo 'it'\''s'");
    }
}
