use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CHANNEL_ALIAS: &str = "https://conda.anaconda.org";

pub const DEFAULT_CHANNELS: &[&str] = &[
    "https://repo.anaconda.com/pkgs/main",
    "https://repo.anaconda.com/pkgs/r",
];

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to read context file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse context: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration consulted by derived-field resolution.
///
/// Only the last fallback steps read it: the default subdirectory when a
/// record carries no subdir, URL, or platform, and the channel alias and
/// default channel URLs when canonicalizing channel names. Records hold it
/// behind an `Arc` and never mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Context {
    pub subdir: String,
    pub channel_alias: String,
    pub default_channels: Vec<String>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            subdir: host_subdir().to_owned(),
            channel_alias: DEFAULT_CHANNEL_ALIAS.to_owned(),
            default_channels: DEFAULT_CHANNELS.iter().map(|&c| c.to_owned()).collect(),
        }
    }
}

impl Context {
    #[must_use]
    pub fn with_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.subdir = subdir.into();
        self
    }

    #[must_use]
    pub fn with_channel_alias(mut self, alias: &str) -> Self {
        alias.trim_end_matches('/').clone_into(&mut self.channel_alias);
        self
    }

    /// Parse a TOML context file. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ContextError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContextError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// True when `base_url` names one of the configured default channels.
    pub fn is_default_channel(&self, base_url: &str) -> bool {
        let base_url = base_url.trim_end_matches('/');
        self.default_channels
            .iter()
            .any(|c| c.trim_end_matches('/') == base_url)
    }

    /// Channel name relative to the channel alias, if `base_url` lives under it.
    pub fn strip_channel_alias<'a>(&self, base_url: &'a str) -> Option<&'a str> {
        let alias = self.channel_alias.trim_end_matches('/');
        base_url
            .strip_prefix(alias)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(|rest| rest.trim_end_matches('/'))
            .filter(|rest| !rest.is_empty())
    }
}

/// Subdirectory matching the platform this binary was compiled for.
pub fn host_subdir() -> &'static str {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("linux", "x86_64") => "linux-64",
        ("linux", "x86") => "linux-32",
        ("linux", "aarch64") => "linux-aarch64",
        ("linux", "powerpc64") => "linux-ppc64le",
        ("linux", "s390x") => "linux-s390x",
        ("macos", "x86_64") => "osx-64",
        ("macos", "aarch64") => "osx-arm64",
        ("windows", "x86_64") => "win-64",
        ("windows", "x86") => "win-32",
        ("windows", "aarch64") => "win-arm64",
        _ => "noarch",
    }
}
