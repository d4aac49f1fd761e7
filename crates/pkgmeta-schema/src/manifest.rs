//! Raw, unvalidated record fields as they appear in `index.json` and
//! `repodata.json` entries.
//!
//! Every field is optional here; [`RawRecord`] only applies the lenient
//! list/feature coercions. Alias keys (`build_string`, `schannel`, `filename`)
//! are kept in their own fields and only consulted when the primary key is
//! absent. Required-field checks and enum parsing happen when a typed record
//! is built from it.

use crate::enums::{EnumError, NoarchType, PackageType, Platform};
use crate::features::FeatureSet;
use crate::priority::Priority;
use crate::record::{BaseIdentity, Locator, ManifestFields, RecordExtras};
use crate::RecordError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    pub name: Option<String>,
    pub version: Option<String>,
    pub build: Option<String>,
    pub build_string: Option<String>,
    pub build_number: Option<u64>,

    pub channel: Option<String>,
    pub schannel: Option<String>,
    pub subdir: Option<String>,
    #[serde(rename = "fn")]
    pub filename: Option<String>,
    #[serde(rename = "filename")]
    pub filename_alias: Option<String>,
    pub md5: Option<String>,
    pub url: Option<String>,

    pub arch: Option<String>,
    pub platform: Option<String>,
    pub depends: Option<Vec<String>>,
    pub constrains: Option<Vec<String>>,
    #[serde(default)]
    pub features: FeatureSet,
    #[serde(default)]
    pub track_features: FeatureSet,
    pub noarch: Option<serde_json::Value>,
    pub preferred_env: Option<String>,
    pub license: Option<String>,
    pub license_family: Option<String>,

    pub date: Option<String>,
    pub priority: Option<Priority>,
    pub size: Option<u64>,
    pub package_type: Option<String>,

    /// Keys no record bundle declares. Kept only so they can be reported.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RawRecord {
    pub fn from_value(value: serde_json::Value) -> Result<Self, RecordError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(input)?)
    }

    pub(crate) fn base(&self) -> Result<BaseIdentity, RecordError> {
        Ok(BaseIdentity {
            name: required(self.name.as_ref(), "name")?,
            version: required(self.version.as_ref(), "version")?,
            build: required(self.build.as_ref().or(self.build_string.as_ref()), "build")?,
            build_number: self
                .build_number
                .ok_or(RecordError::MissingField {
                    field: "build_number",
                })?,
        })
    }

    pub(crate) fn locator(&self) -> Locator {
        Locator {
            channel: self.channel.clone().or_else(|| self.schannel.clone()),
            subdir: self.subdir.clone(),
            filename: self.filename().map(str::to_owned),
            md5: self.md5.clone(),
            url: self.url.clone(),
        }
    }

    /// `fn`, else `filename`.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref().or(self.filename_alias.as_deref())
    }

    pub(crate) fn manifest_fields(&self) -> Result<ManifestFields, RecordError> {
        Ok(ManifestFields {
            arch: self.arch.clone(),
            platform: parse_optional::<Platform>(self.platform.as_deref())?,
            depends: self.depends.clone().unwrap_or_default(),
            constrains: self.constrains.clone().unwrap_or_default(),
            features: self.features.clone(),
            track_features: self.track_features.clone(),
            subdir: self.subdir.clone(),
            noarch: match &self.noarch {
                Some(value) => NoarchType::coerce(value)?,
                None => None,
            },
            preferred_env: self.preferred_env.clone(),
            license: self.license.clone(),
            license_family: self.license_family.clone(),
        })
    }

    pub(crate) fn extras(&self) -> Result<RecordExtras, RecordError> {
        Ok(RecordExtras {
            date: self.date.clone(),
            priority: self.priority,
            size: self.size,
            package_type: parse_optional::<PackageType>(self.package_type.as_deref())?,
        })
    }

    pub(crate) fn log_ignored_keys(&self) {
        if !self.extra.is_empty() {
            let keys: Vec<&str> = self.extra.keys().map(String::as_str).collect();
            debug!(
                "ignoring {} undeclared key(s) on '{}': {}",
                keys.len(),
                self.name.as_deref().unwrap_or("?"),
                keys.join(", ")
            );
        }
    }
}

fn required(value: Option<&String>, field: &'static str) -> Result<String, RecordError> {
    value.cloned().ok_or(RecordError::MissingField { field })
}

pub(crate) fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, RecordError>
where
    T: FromStr<Err = EnumError>,
{
    value.map(str::parse).transpose().map_err(RecordError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn aliases_fill_absent_primary_keys() {
        let raw = RawRecord::from_value(json!({
            "name": "zlib",
            "version": "1.3",
            "build_string": "h0",
            "build_number": 0,
            "filename": "zlib-1.3-h0.conda",
            "schannel": "conda-forge",
        }))
        .unwrap();
        assert_eq!(raw.base().unwrap().build, "h0");
        let locator = raw.locator();
        assert_eq!(locator.filename.as_deref(), Some("zlib-1.3-h0.conda"));
        assert_eq!(locator.channel.as_deref(), Some("conda-forge"));
    }

    #[test]
    fn primary_key_wins_over_alias() {
        let raw = RawRecord::from_value(json!({
            "name": "zlib",
            "version": "1.3",
            "build": "h0",
            "build_string": "h9",
            "build_number": 0,
            "fn": "zlib-1.3-h0.tar.bz2",
            "filename": "zlib-1.3-h9.conda",
            "channel": "https://conda.anaconda.org/conda-forge/linux-64",
            "schannel": "bioconda",
        }))
        .unwrap();
        assert_eq!(raw.base().unwrap().build, "h0");
        let locator = raw.locator();
        assert_eq!(locator.filename.as_deref(), Some("zlib-1.3-h0.tar.bz2"));
        assert_eq!(
            locator.channel.as_deref(),
            Some("https://conda.anaconda.org/conda-forge/linux-64")
        );
        assert!(raw.extra.is_empty());
    }

    #[test]
    fn missing_required_field_is_named() {
        let raw = RawRecord::from_value(json!({
            "name": "zlib",
            "version": "1.3",
            "build_number": 0,
        }))
        .unwrap();
        let err = raw.base().unwrap_err();
        assert!(matches!(err, RecordError::MissingField { field: "build" }));
        assert!(err.to_string().contains("build"));
    }

    #[test]
    fn invalid_platform_is_reported_with_field() {
        let raw = RawRecord::from_value(json!({ "platform": "beos" })).unwrap();
        let err = raw.manifest_fields().unwrap_err();
        match err {
            RecordError::InvalidEnum(e) => {
                assert_eq!(e.field, "platform");
                assert_eq!(e.value, "beos");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn null_lists_become_empty() {
        let raw = RawRecord::from_value(json!({
            "depends": null,
            "features": null,
            "track_features": "a,b",
        }))
        .unwrap();
        let fields = raw.manifest_fields().unwrap();
        assert!(fields.depends.is_empty());
        assert!(fields.features.is_empty());
        assert_eq!(fields.track_features.as_slice(), ["a", "b"]);
    }

    #[test]
    fn collects_undeclared_keys() {
        let raw = RawRecord::from_value(json!({
            "name": "x",
            "timestamp": 1_700_000_000,
            "sha256": "00",
        }))
        .unwrap();
        assert_eq!(raw.extra.len(), 2);
        assert!(raw.extra.contains_key("timestamp"));
    }

    #[test]
    fn wrong_json_type_is_a_parse_error() {
        let err = RawRecord::from_value(json!({ "build_number": "zero" })).unwrap_err();
        assert!(matches!(err, RecordError::Parse(_)));
    }
}
