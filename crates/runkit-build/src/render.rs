use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `{{KEY}}` with an uppercase key. GitHub expressions (`${{ github.sha }}`)
/// and shell or make variables never match.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Z][A-Z0-9_]*)\}\}").expect("static regex"));

pub const SERVICE_NAME: &str = "SERVICE_NAME";
pub const REGION: &str = "REGION";
pub const PROJECT_ID: &str = "PROJECT_ID";
/// Image repository path without a tag; templates append their own.
pub const IMAGE: &str = "IMAGE";
pub const PORT: &str = "PORT";
/// Artifact Registry repository name, as in `IMAGE`.
pub const REPOSITORY: &str = "REPOSITORY";
pub const BRANCH: &str = "BRANCH";

/// Values substituted into template placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions(BTreeMap<String, String>);

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_owned(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// Replace every placeholder in `body`. Values are inserted verbatim and
/// not scanned again. Returns the first key with no value on failure.
pub fn render(body: &str, subs: &Substitutions) -> Result<String, String> {
    let mut missing: Option<String> = None;
    let rendered = PLACEHOLDER.replace_all(body, |caps: &Captures<'_>| {
        let key = &caps[1];
        match subs.get(key) {
            Some(value) => value.to_owned(),
            None => {
                missing.get_or_insert_with(|| key.to_owned());
                String::new()
            }
        }
    });

    match missing {
        Some(key) => Err(key),
        None => Ok(rendered.into_owned()),
    }
}
