//! Typed `NAME=VALUE` collections for environment variables, labels,
//! annotations, and secret mounts.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_./-]*$").expect("static regex"));

/// Ordered name to value map. Entries are validated when they enter the
/// map, so every key is well-formed by the time it is rendered into a flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueMap(BTreeMap<String, String>);

impl KeyValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single `KEY=VALUE` entry. The value may be empty and may
    /// itself contain `=`.
    pub fn parse_entry(entry: &str) -> crate::Result<(String, String)> {
        let entry = entry.trim();
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| crate::Error::InvalidKeyValue {
                entry: entry.to_owned(),
                reason: "expected KEY=VALUE",
            })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(crate::Error::InvalidKeyValue {
                entry: entry.to_owned(),
                reason: "key is empty",
            });
        }
        if !KEY_RE.is_match(key) {
            return Err(crate::Error::InvalidKeyValue {
                entry: entry.to_owned(),
                reason: "key must start with a letter or underscore and contain only letters, digits, '_', '.', '/' or '-'",
            });
        }
        Ok((key.to_owned(), value.to_owned()))
    }

    /// Parse a list of entries, rejecting the whole list on the first
    /// malformed one. Later duplicates replace earlier ones.
    pub fn parse_all<S: AsRef<str>>(entries: &[S]) -> crate::Result<Self> {
        let mut map = Self::new();
        for entry in entries {
            map.insert_entry(entry.as_ref())?;
        }
        Ok(map)
    }

    pub fn insert_entry(&mut self, entry: &str) -> crate::Result<()> {
        let (key, value) = Self::parse_entry(entry)?;
        self.insert(key, value);
        Ok(())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `K1=V1,K2=V2`, the form gcloud expects for map-valued flags.
    pub fn to_flag_value(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Secret Manager mounts: `ENV_VAR=secret-name[:version]`. The version
/// defaults to `latest`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretMounts(KeyValueMap);

impl SecretMounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_all<S: AsRef<str>>(entries: &[S]) -> crate::Result<Self> {
        let mut mounts = Self::new();
        for entry in entries {
            mounts.insert_entry(entry.as_ref())?;
        }
        Ok(mounts)
    }

    pub fn insert_entry(&mut self, entry: &str) -> crate::Result<()> {
        let (env, reference) = KeyValueMap::parse_entry(entry)?;
        let reference = reference.trim();
        let (secret, version) = match reference.split_once(':') {
            Some((secret, version)) => (secret.trim(), version.trim()),
            None => (reference, "latest"),
        };
        if secret.is_empty() || version.is_empty() {
            return Err(crate::Error::InvalidKeyValue {
                entry: entry.trim().to_owned(),
                reason: "expected ENV_VAR=secret-name[:version]",
            });
        }
        self.0.insert(env, format!("{secret}:{version}"));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter()
    }

    /// `ENV=secret:version,...`
    pub fn to_flag_value(&self) -> String {
        self.0.to_flag_value()
    }
}
