//! Channel index documents (`repodata.json`).

use crate::context::Context;
use crate::manifest::RawRecord;
use crate::record::PackageRecord;
use crate::RecordError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoDataInfo {
    #[serde(default)]
    pub subdir: Option<String>,
}

/// A subdirectory index: package entries keyed by archive filename.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoData {
    #[serde(default)]
    pub info: RepoDataInfo,
    #[serde(default)]
    pub packages: BTreeMap<String, RawRecord>,
    #[serde(rename = "packages.conda", default)]
    pub conda_packages: BTreeMap<String, RawRecord>,
    #[serde(default)]
    pub repodata_version: Option<u32>,
}

impl RepoData {
    pub fn from_value(value: serde_json::Value) -> Result<Self, RecordError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.packages.len() + self.conda_packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.conda_packages.is_empty()
    }

    /// Build a record for every entry, `.tar.bz2` entries first.
    ///
    /// An entry without `fn` or `filename` takes its map key; one without `subdir` takes
    /// `info.subdir`. The first invalid entry aborts with its key attached.
    pub fn records(&self, context: &Arc<Context>) -> Result<Vec<PackageRecord>, RecordError> {
        let records = self
            .packages
            .iter()
            .chain(&self.conda_packages)
            .map(|(key, raw)| {
                self.entry_record(key, raw, context)
                    .map_err(|source| RecordError::Entry {
                        key: key.clone(),
                        source: Box::new(source),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "built {} record(s) for subdir {}",
            records.len(),
            self.info.subdir.as_deref().unwrap_or("?")
        );
        Ok(records)
    }

    fn entry_record(
        &self,
        key: &str,
        raw: &RawRecord,
        context: &Arc<Context>,
    ) -> Result<PackageRecord, RecordError> {
        let mut raw = raw.clone();
        if raw.filename().is_none() {
            raw.filename = Some(key.to_owned());
        }
        if raw.subdir.is_none() {
            raw.subdir.clone_from(&self.info.subdir);
        }
        PackageRecord::from_raw(&raw, Arc::clone(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identified;
    use serde_json::json;

    fn ctx() -> Arc<Context> {
        Arc::new(Context::default().with_subdir("win-64"))
    }

    fn sample() -> serde_json::Value {
        json!({
            "info": { "subdir": "linux-64" },
            "packages": {
                "zlib-1.3-h0.tar.bz2": {
                    "name": "zlib", "version": "1.3", "build": "h0", "build_number": 0,
                    "depends": ["libgcc >=13"]
                }
            },
            "packages.conda": {
                "zlib-1.3-h1.conda": {
                    "name": "zlib", "version": "1.3", "build": "h1", "build_number": 1,
                    "subdir": "noarch"
                }
            },
            "repodata_version": 1
        })
    }

    #[test]
    fn entries_inherit_key_and_subdir() {
        let repo = RepoData::from_value(sample()).unwrap();
        assert_eq!(repo.len(), 2);
        let records = repo.records(&ctx()).unwrap();
        assert_eq!(records[0].filename().unwrap(), "zlib-1.3-h0.tar.bz2");
        assert_eq!(records[0].subdir(), "linux-64");
        assert_eq!(records[1].filename().unwrap(), "zlib-1.3-h1.conda");
        assert_eq!(records[1].subdir(), "noarch");
        assert_eq!(records[1].identity_key().build(), "h1");
    }

    #[test]
    fn filename_alias_beats_map_key() {
        let repo = RepoData::from_value(json!({
            "packages": {
                "old-1-0.tar.bz2": {
                    "name": "old", "version": "1", "build": "0", "build_number": 0,
                    "filename": "old-1-0-renamed.tar.bz2",
                    "channel": "https://conda.anaconda.org/conda-forge/linux-64",
                    "schannel": "conda-forge"
                }
            }
        }))
        .unwrap();
        let records = repo.records(&ctx()).unwrap();
        assert_eq!(records[0].filename().unwrap(), "old-1-0-renamed.tar.bz2");
        assert_eq!(records[0].schannel(), "conda-forge");
        assert_eq!(records[0].subdir(), "win-64");
    }

    #[test]
    fn invalid_entry_reports_key() {
        let repo = RepoData::from_value(json!({
            "packages": { "broken-1-0.tar.bz2": { "name": "broken" } }
        }))
        .unwrap();
        let err = repo.records(&ctx()).unwrap_err();
        assert!(matches!(err, RecordError::Entry { ref key, .. } if key == "broken-1-0.tar.bz2"));
    }

    #[test]
    fn empty_document() {
        let repo = RepoData::from_json_str("{}").unwrap();
        assert!(repo.is_empty());
        assert!(repo.records(&ctx()).unwrap().is_empty());
    }
}
