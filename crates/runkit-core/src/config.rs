use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::kv::{KeyValueMap, SecretMounts};
use crate::validate::{Memory, ServiceName};

pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_MEMORY: &str = "512Mi";
pub const DEFAULT_CPU: &str = "1";
pub const DEFAULT_CONCURRENCY: u32 = 80;
pub const DEFAULT_MIN_INSTANCES: u32 = 0;
pub const DEFAULT_MAX_INSTANCES: u32 = 100;
pub const DEFAULT_TIMEOUT_SECS: u32 = 300;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REPOSITORY: &str = "cloud-run";

/// Closed set of string choices accepted for an enum-valued field.
///
/// `parse` accepts the flag value (`internal`) and is case-insensitive.
macro_rules! flag_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal, default = $default:ident {
            $($variant:ident => $value:literal, $label:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Value as written in the gcloud flag.
            pub fn as_flag_value(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            /// Human-readable description for menus.
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_flag_value())
            }
        }

        impl FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> crate::Result<Self> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_flag_value().eq_ignore_ascii_case(s))
                    .ok_or_else(|| crate::Error::UnknownVariant {
                        kind: $kind,
                        value: s.to_owned(),
                        expected: Self::ALL.iter().map(|v| v.as_flag_value()).collect(),
                    })
            }
        }
    };
}

flag_enum! {
    /// Which network sources may reach the service.
    Ingress, "ingress", default = All {
        All => "all", "all traffic, including the internet";
        Internal => "internal", "internal traffic only (VPC, same project)";
        InternalAndCloudLoadBalancing => "internal-and-cloud-load-balancing",
            "internal traffic and Cloud Load Balancing";
    }
}

flag_enum! {
    /// Which outbound traffic is routed through the VPC connector.
    VpcEgress, "vpc egress", default = PrivateRangesOnly {
        PrivateRangesOnly => "private-ranges-only", "only private IP ranges through the VPC";
        AllTraffic => "all-traffic", "all outbound traffic through the VPC";
    }
}

flag_enum! {
    /// Container sandbox generation.
    ExecutionEnvironment, "execution environment", default = Gen2 {
        Gen2 => "gen2", "second generation (full Linux compatibility)";
        Gen1 => "gen1", "first generation (faster cold starts)";
    }
}

flag_enum! {
    /// Where a prebuilt image is stored.
    Registry, "registry", default = ArtifactRegistry {
        ArtifactRegistry => "artifact-registry", "Artifact Registry (recommended)";
        ContainerRegistry => "container-registry", "Container Registry (gcr.io)";
        Custom => "custom", "a full image reference you provide";
    }
}

flag_enum! {
    /// Repository event that starts a CI build.
    TriggerKind, "trigger", default = Branch {
        Branch => "branch", "push to a branch";
        Tag => "tag", "push of a tag";
        PullRequest => "pull-request", "pull request against a branch";
    }
}

impl TriggerKind {
    /// Default ref pattern for the event.
    pub fn default_pattern(&self) -> &'static str {
        match self {
            Self::Branch | Self::PullRequest => "^main$",
            Self::Tag => "^v.*$",
        }
    }
}

/// What gets deployed: a prebuilt image or a source directory built remotely.
/// The two build modes are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Image(String),
    Source(PathBuf),
}

impl Artifact {
    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source(_))
    }
}

/// Artifact Registry image reference:
/// `<region>-docker.pkg.dev/<project>/<repository>/<service>:<tag>`.
pub fn artifact_registry_image(
    region: &str,
    project_id: &str,
    repository: &str,
    service: &str,
    tag: &str,
) -> String {
    format!("{region}-docker.pkg.dev/{project_id}/{repository}/{service}:{tag}")
}

/// Container Registry image reference: `gcr.io/<project>/<service>:<tag>`.
pub fn container_registry_image(project_id: &str, service: &str, tag: &str) -> String {
    format!("gcr.io/{project_id}/{service}:{tag}")
}

/// Registry host for `gcloud auth configure-docker`.
pub fn registry_host(image: &str) -> &str {
    image.split('/').next().unwrap_or(image)
}

/// One deploy action's frozen configuration.
///
/// Built field by field during the prompt phase, then handed by reference
/// to the command synthesizer. A new deploy creates a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub service_name: ServiceName,
    pub project_id: String,
    pub region: String,
    pub artifact: Artifact,
    pub port: u16,
    pub memory: Memory,
    pub cpu: String,
    pub concurrency: u32,
    pub min_instances: u32,
    pub max_instances: u32,
    pub timeout_secs: u32,
    pub ingress: Ingress,
    pub vpc_egress: VpcEgress,
    pub execution_environment: ExecutionEnvironment,
    pub allow_unauthenticated: bool,

    // Optional: each is emitted as a flag only when set.
    pub service_account: Option<String>,
    pub labels: KeyValueMap,
    pub annotations: KeyValueMap,
    pub tag: Option<String>,
    pub revision_suffix: Option<String>,
    pub no_traffic: bool,
    pub env_vars: KeyValueMap,
    pub secrets: SecretMounts,
    pub cloudsql_instance: Option<String>,
    pub vpc_connector: Option<String>,
}

impl DeployConfig {
    /// A configuration with every tunable at its documented default.
    pub fn new(service_name: ServiceName, project_id: impl Into<String>, artifact: Artifact) -> Self {
        Self {
            service_name,
            project_id: project_id.into(),
            region: DEFAULT_REGION.to_owned(),
            artifact,
            port: DEFAULT_PORT,
            memory: Memory::default(),
            cpu: DEFAULT_CPU.to_owned(),
            concurrency: DEFAULT_CONCURRENCY,
            min_instances: DEFAULT_MIN_INSTANCES,
            max_instances: DEFAULT_MAX_INSTANCES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            ingress: Ingress::default(),
            vpc_egress: VpcEgress::default(),
            execution_environment: ExecutionEnvironment::default(),
            allow_unauthenticated: true,
            service_account: None,
            labels: KeyValueMap::new(),
            annotations: KeyValueMap::new(),
            tag: None,
            revision_suffix: None,
            no_traffic: false,
            env_vars: KeyValueMap::new(),
            secrets: SecretMounts::new(),
            cloudsql_instance: None,
            vpc_connector: None,
        }
    }
}

/// Map an empty or whitespace-only answer to "not configured".
pub fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
