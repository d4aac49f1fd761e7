//! Per-file metadata for an installed package (`info/paths.json`).

use crate::enums::{FileMode, LinkType, PathType};
use crate::manifest::parse_optional;
use crate::RecordError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// One file, link, or directory a package places into a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathEntry {
    #[serde(rename = "_path")]
    pub path: String,
    pub path_type: PathType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_in_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inode_paths: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256_in_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_mode: Option<FileMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_link: Option<bool>,
}

impl PathEntry {
    pub fn new(path: impl Into<String>, path_type: PathType) -> Self {
        Self {
            path: path.into(),
            path_type,
            sha256: None,
            size_in_bytes: None,
            inode_paths: None,
            sha256_in_prefix: None,
            file_mode: None,
            prefix_placeholder: None,
            no_link: None,
        }
    }

    /// True when the file must be rewritten at install time.
    pub fn has_prefix(&self) -> bool {
        self.prefix_placeholder.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct RawPathEntry {
    #[serde(rename = "_path", alias = "path")]
    path: Option<String>,
    path_type: Option<String>,
    sha256: Option<String>,
    size_in_bytes: Option<u64>,
    inode_paths: Option<Vec<String>>,
    sha256_in_prefix: Option<String>,
    file_mode: Option<String>,
    prefix_placeholder: Option<String>,
    no_link: Option<bool>,
}

impl RawPathEntry {
    fn normalize(self) -> Result<PathEntry, RecordError> {
        let path = self.path.ok_or(RecordError::MissingField { field: "_path" })?;
        let path_type = self
            .path_type
            .as_deref()
            .ok_or(RecordError::MissingField { field: "path_type" })?
            .parse::<PathType>()?;
        Ok(PathEntry {
            path,
            path_type,
            sha256: self.sha256,
            size_in_bytes: self.size_in_bytes,
            inode_paths: self.inode_paths,
            sha256_in_prefix: self.sha256_in_prefix,
            file_mode: parse_optional::<FileMode>(self.file_mode.as_deref())?,
            prefix_placeholder: self.prefix_placeholder,
            no_link: self.no_link,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawPathManifest {
    paths_version: Option<u32>,
    #[serde(default)]
    paths: Vec<RawPathEntry>,
}

/// The ordered list of paths a package installs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathManifest {
    pub paths_version: u32,
    pub paths: Vec<PathEntry>,
}

impl PathManifest {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(paths: Vec<PathEntry>) -> Self {
        Self {
            paths_version: Self::CURRENT_VERSION,
            paths,
        }
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, RecordError> {
        Self::normalize(serde_json::from_value(value)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self, RecordError> {
        Self::normalize(serde_json::from_str(input)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn normalize(raw: RawPathManifest) -> Result<Self, RecordError> {
        let paths_version = raw
            .paths_version
            .ok_or(RecordError::MissingField { field: "paths_version" })?;
        let paths = raw
            .paths
            .into_iter()
            .map(RawPathEntry::normalize)
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::with_capacity(paths.len());
        for entry in &paths {
            if !seen.insert(entry.path.as_str()) {
                warn!("duplicate path entry '{}'", entry.path);
            }
        }

        Ok(Self {
            paths_version,
            paths,
        })
    }

    pub fn dump(&self) -> Result<serde_json::Value, RecordError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn hardlinks(&self) -> impl Iterator<Item = &PathEntry> {
        self.paths
            .iter()
            .filter(|entry| entry.path_type == PathType::HardLink)
    }

    /// First entry for `path`.
    pub fn find(&self, path: &str) -> Option<&PathEntry> {
        self.paths.iter().find(|entry| entry.path == path)
    }
}

/// How a package asks to be linked, from `info/link.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub link_type: Option<LinkType>,
}
