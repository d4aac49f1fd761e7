//! Package records composed from capability bundles.
//!
//! ```text
//!                 BaseIdentity
//!                /            \
//!   ReferenceMetadata      IndexManifestMetadata
//!   (base + Locator)       (base + ManifestFields)
//!                \            /
//!                PackageRecord
//!     (base + Locator + ManifestFields + RecordExtras)
//! ```
//!
//! Field precedence in the composed record is fixed: base identity, then the
//! locator, then the manifest fields, then the record extras. `subdir` is the
//! one field both middle bundles derive. A composed record keeps the stored
//! subdir only on its locator; [`PackageRecord::subdir`] walks the stored
//! subdir, then the URL, then platform/arch, and only then falls back to the
//! context default.

use crate::channel::Channel;
use crate::context::Context;
use crate::depends::combine_depends;
use crate::derive::{resolve_channel, resolve_filename, resolve_subdir, SubdirSource};
use crate::enums::{NoarchType, PackageType, Platform};
use crate::features::FeatureSet;
use crate::identity::{Identified, IdentityKey};
use crate::manifest::RawRecord;
use crate::priority::Priority;
use crate::spec::{MatchSpec, SpecError};
use crate::RecordError;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

/// Name, version, build string, and build number. Required on every record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BaseIdentity {
    pub name: String,
    pub version: String,
    pub build: String,
    pub build_number: u64,
}

impl BaseIdentity {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        build: impl Into<String>,
        build_number: u64,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            build: build.into(),
            build_number,
        }
    }
}

/// Where a package lives: enough to find and verify its archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locator {
    pub channel: Option<String>,
    pub subdir: Option<String>,
    pub filename: Option<String>,
    pub md5: Option<String>,
    pub url: Option<String>,
}

impl Locator {
    fn channel(&self, ctx: &Context) -> Channel {
        resolve_channel(self.channel.as_deref(), self.url.as_deref(), ctx)
    }

    fn filename(&self, base: &BaseIdentity, ctx: &Context) -> Result<String, RecordError> {
        resolve_filename(self.filename.as_deref(), self.url.as_deref(), base, ctx)
    }

    fn subdir_sources(&self) -> [SubdirSource<'_>; 2] {
        [
            SubdirSource::Explicit(self.subdir.as_deref()),
            SubdirSource::Url(self.url.as_deref()),
        ]
    }
}

/// What a package's own `info/index.json` declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestFields {
    pub arch: Option<String>,
    pub platform: Option<Platform>,
    pub depends: Vec<String>,
    pub constrains: Vec<String>,
    pub features: FeatureSet,
    pub track_features: FeatureSet,
    /// Unused inside a [`PackageRecord`], which keeps the stored subdir on its
    /// [`Locator`].
    pub subdir: Option<String>,
    /// `None` means the package is not noarch.
    pub noarch: Option<NoarchType>,
    pub preferred_env: Option<String>,
    pub license: Option<String>,
    pub license_family: Option<String>,
}

impl ManifestFields {
    fn subdir_sources(&self) -> [SubdirSource<'_>; 2] {
        [
            SubdirSource::Explicit(self.subdir.as_deref()),
            self.platform_source(),
        ]
    }

    fn platform_source(&self) -> SubdirSource<'_> {
        SubdirSource::PlatformArch(self.platform, self.arch.as_deref())
    }

    pub fn combined_depends(&self) -> Result<Vec<MatchSpec>, SpecError> {
        combine_depends(&self.depends, &self.constrains)
    }
}

/// Fields only the fully composed record carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordExtras {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_type: Option<PackageType>,
}

// ---------------------------------------------------------------------------
// ReferenceMetadata
// ---------------------------------------------------------------------------

/// A reference to a package: base identity plus locator.
#[derive(Debug, Clone)]
pub struct ReferenceMetadata {
    pub base: BaseIdentity,
    pub locator: Locator,
    context: Arc<Context>,
}

impl ReferenceMetadata {
    pub fn new(
        base: BaseIdentity,
        locator: Locator,
        context: Arc<Context>,
    ) -> Result<Self, RecordError> {
        locator.filename(&base, &context)?;
        Ok(Self {
            base,
            locator,
            context,
        })
    }

    pub fn from_raw(raw: &RawRecord, context: Arc<Context>) -> Result<Self, RecordError> {
        raw.log_ignored_keys();
        Self::new(raw.base()?, raw.locator(), context)
    }

    pub fn from_value(value: serde_json::Value, context: Arc<Context>) -> Result<Self, RecordError> {
        Self::from_raw(&RawRecord::from_value(value)?, context)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn channel(&self) -> Channel {
        self.locator.channel(&self.context)
    }

    /// Canonical name of [`Self::channel`].
    pub fn schannel(&self) -> String {
        self.channel().canonical_name().to_owned()
    }

    pub fn subdir(&self) -> String {
        resolve_subdir(&self.locator.subdir_sources(), &self.context)
    }

    pub fn filename(&self) -> Result<String, RecordError> {
        self.locator.filename(&self.base, &self.context)
    }

    pub fn dist_str(&self) -> String {
        dist_str(&self.schannel(), &self.base)
    }

    pub fn dump(&self) -> Result<serde_json::Value, RecordError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Identified for ReferenceMetadata {
    fn identity_key(&self) -> IdentityKey {
        identity_key(&self.schannel(), self.subdir(), &self.base)
    }
}

impl PartialEq for ReferenceMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.identity_key() == other.identity_key()
    }
}

impl Eq for ReferenceMetadata {}

impl Hash for ReferenceMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_key().hash(state);
    }
}

impl Serialize for ReferenceMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RecordDump {
            base: &self.base,
            subdir: self.subdir(),
            locator: Some(LocatorDump::new::<S::Error>(
                &self.locator,
                &self.base,
                &self.context,
            )?),
            manifest: None,
            extras: None,
        }
        .serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// IndexManifestMetadata
// ---------------------------------------------------------------------------

/// A package's self-description: base identity plus manifest fields.
///
/// Carries no channel, so it has no identity key and no identity equality.
#[derive(Debug, Clone)]
pub struct IndexManifestMetadata {
    pub base: BaseIdentity,
    pub manifest: ManifestFields,
    context: Arc<Context>,
}

impl IndexManifestMetadata {
    pub fn new(base: BaseIdentity, manifest: ManifestFields, context: Arc<Context>) -> Self {
        Self {
            base,
            manifest,
            context,
        }
    }

    pub fn from_raw(raw: &RawRecord, context: Arc<Context>) -> Result<Self, RecordError> {
        raw.log_ignored_keys();
        Ok(Self::new(raw.base()?, raw.manifest_fields()?, context))
    }

    pub fn from_value(value: serde_json::Value, context: Arc<Context>) -> Result<Self, RecordError> {
        Self::from_raw(&RawRecord::from_value(value)?, context)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn subdir(&self) -> String {
        resolve_subdir(&self.manifest.subdir_sources(), &self.context)
    }

    pub fn combined_depends(&self) -> Result<Vec<MatchSpec>, SpecError> {
        self.manifest.combined_depends()
    }

    pub fn dump(&self) -> Result<serde_json::Value, RecordError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Serialize for IndexManifestMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RecordDump {
            base: &self.base,
            subdir: self.subdir(),
            locator: None,
            manifest: Some(ManifestDump::new(&self.manifest)),
            extras: None,
        }
        .serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// PackageRecord
// ---------------------------------------------------------------------------

/// The record consumed by resolution, cache lookup, and installed-package
/// bookkeeping.
///
/// Equality and hashing use only [`IdentityKey`]; records differing in md5,
/// URL, size, date, or dependencies compare equal when the key matches.
#[derive(Debug, Clone)]
pub struct PackageRecord {
    pub base: BaseIdentity,
    pub locator: Locator,
    pub manifest: ManifestFields,
    pub extras: RecordExtras,
    context: Arc<Context>,
}

impl PackageRecord {
    /// A subdir stored only on `manifest` moves to the locator.
    pub fn new(
        base: BaseIdentity,
        mut locator: Locator,
        mut manifest: ManifestFields,
        extras: RecordExtras,
        context: Arc<Context>,
    ) -> Result<Self, RecordError> {
        locator.filename(&base, &context)?;
        let declared = manifest.subdir.take();
        if locator.subdir.is_none() {
            locator.subdir = declared;
        }
        Ok(Self {
            base,
            locator,
            manifest,
            extras,
            context,
        })
    }

    pub fn from_raw(raw: &RawRecord, context: Arc<Context>) -> Result<Self, RecordError> {
        raw.log_ignored_keys();
        Self::new(
            raw.base()?,
            raw.locator(),
            raw.manifest_fields()?,
            raw.extras()?,
            context,
        )
    }

    pub fn from_value(value: serde_json::Value, context: Arc<Context>) -> Result<Self, RecordError> {
        Self::from_raw(&RawRecord::from_value(value)?, context)
    }

    pub fn from_json_str(input: &str, context: Arc<Context>) -> Result<Self, RecordError> {
        Self::from_raw(&RawRecord::from_json_str(input)?, context)
    }

    /// Read a package's `info/index.json`.
    pub fn load(path: impl AsRef<Path>, context: Arc<Context>) -> Result<Self, RecordError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content, context)
    }

    #[must_use]
    pub fn with_context(mut self, context: Arc<Context>) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn name(&self) -> &str {
        &self.base.name
    }

    pub fn version(&self) -> &str {
        &self.base.version
    }

    pub fn build(&self) -> &str {
        &self.base.build
    }

    pub fn channel(&self) -> Channel {
        self.locator.channel(&self.context)
    }

    pub fn schannel(&self) -> String {
        self.channel().canonical_name().to_owned()
    }

    pub fn subdir(&self) -> String {
        let [stored, url] = self.locator.subdir_sources();
        resolve_subdir(
            &[stored, url, self.manifest.platform_source()],
            &self.context,
        )
    }

    pub fn filename(&self) -> Result<String, RecordError> {
        self.locator.filename(&self.base, &self.context)
    }

    pub fn dist_str(&self) -> String {
        dist_str(&self.schannel(), &self.base)
    }

    pub fn combined_depends(&self) -> Result<Vec<MatchSpec>, SpecError> {
        self.manifest.combined_depends()
    }

    /// The reference view of this record. Its subdir ignores platform/arch.
    pub fn to_reference(&self) -> ReferenceMetadata {
        ReferenceMetadata {
            base: self.base.clone(),
            locator: self.locator.clone(),
            context: Arc::clone(&self.context),
        }
    }

    /// The manifest view of this record. Its subdir ignores the URL.
    pub fn to_index_manifest(&self) -> IndexManifestMetadata {
        let mut manifest = self.manifest.clone();
        manifest.subdir.clone_from(&self.locator.subdir);
        IndexManifestMetadata {
            base: self.base.clone(),
            manifest,
            context: Arc::clone(&self.context),
        }
    }

    pub fn dump(&self) -> Result<serde_json::Value, RecordError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Identified for PackageRecord {
    fn identity_key(&self) -> IdentityKey {
        identity_key(&self.schannel(), self.subdir(), &self.base)
    }
}

impl PartialEq for PackageRecord {
    fn eq(&self, other: &Self) -> bool {
        self.identity_key() == other.identity_key()
    }
}

impl Eq for PackageRecord {}

impl Hash for PackageRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_key().hash(state);
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dist_str())
    }
}

impl Serialize for PackageRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RecordDump {
            base: &self.base,
            subdir: self.subdir(),
            locator: Some(LocatorDump::new::<S::Error>(
                &self.locator,
                &self.base,
                &self.context,
            )?),
            manifest: Some(ManifestDump::new(&self.manifest)),
            extras: Some(&self.extras),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PackageRecord {
    /// Uses [`Context::default`]; call [`PackageRecord::from_raw`] to supply one.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawRecord::deserialize(deserializer)?;
        Self::from_raw(&raw, Arc::new(Context::default())).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn identity_key(channel: &str, subdir: String, base: &BaseIdentity) -> IdentityKey {
    IdentityKey::new(
        channel,
        subdir,
        base.name.as_str(),
        base.version.as_str(),
        base.build.as_str(),
    )
}

fn dist_str(channel: &str, base: &BaseIdentity) -> String {
    format!("{channel}::{}-{}-{}", base.name, base.version, base.build)
}

#[derive(Serialize)]
struct RecordDump<'a> {
    #[serde(flatten)]
    base: &'a BaseIdentity,
    subdir: String,
    #[serde(flatten)]
    locator: Option<LocatorDump<'a>>,
    #[serde(flatten)]
    manifest: Option<ManifestDump<'a>>,
    #[serde(flatten)]
    extras: Option<&'a RecordExtras>,
}

#[derive(Serialize)]
struct LocatorDump<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
    #[serde(rename = "fn")]
    filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    md5: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

impl<'a> LocatorDump<'a> {
    fn new<E: serde::ser::Error>(
        locator: &'a Locator,
        base: &BaseIdentity,
        ctx: &Context,
    ) -> Result<Self, E> {
        let channel = locator.channel(ctx);
        Ok(Self {
            channel: (!channel.is_unknown()).then(|| channel.canonical_name().to_owned()),
            filename: locator.filename(base, ctx).map_err(E::custom)?,
            md5: locator.md5.as_deref(),
            url: locator.url.as_deref(),
        })
    }
}

#[derive(Serialize)]
struct ManifestDump<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    arch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    platform: Option<Platform>,
    depends: &'a [String],
    constrains: &'a [String],
    features: &'a FeatureSet,
    track_features: &'a FeatureSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    noarch: Option<NoarchType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preferred_env: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_family: Option<&'a str>,
}

impl<'a> ManifestDump<'a> {
    fn new(fields: &'a ManifestFields) -> Self {
        Self {
            arch: fields.arch.as_deref(),
            platform: fields.platform,
            depends: &fields.depends,
            constrains: &fields.constrains,
            features: &fields.features,
            track_features: &fields.track_features,
            noarch: fields.noarch,
            preferred_env: fields.preferred_env.as_deref(),
            license: fields.license.as_deref(),
            license_family: fields.license_family.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;

    fn ctx() -> Arc<Context> {
        Arc::new(Context::default().with_subdir("linux-64"))
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut h = DefaultHasher::new();
        value.hash(&mut h);
        h.finish()
    }

    fn numpy() -> serde_json::Value {
        json!({
            "name": "numpy",
            "version": "1.2",
            "build": "0",
            "build_number": 0,
        })
    }

    fn with(mut base: serde_json::Value, extra: serde_json::Value) -> serde_json::Value {
        if let (Some(target), serde_json::Value::Object(fields)) = (base.as_object_mut(), extra) {
            target.extend(fields);
        }
        base
    }

    #[test]
    fn filename_falls_back_to_name_version_build() {
        let rec = PackageRecord::from_value(numpy(), ctx()).unwrap();
        assert_eq!(rec.filename().unwrap(), "numpy-1.2-0");
    }

    #[test]
    fn subdir_from_url() {
        let rec = PackageRecord::from_value(
            with(numpy(), json!({ "url": "https://repo/linux-64/foo-1.0-0.tar.bz2" })),
            Arc::new(Context::default().with_subdir("win-64")),
        )
        .unwrap();
        assert_eq!(rec.subdir(), "linux-64");
        assert_eq!(rec.filename().unwrap(), "foo-1.0-0.tar.bz2");
    }

    #[test]
    fn subdir_from_platform_and_arch() {
        let rec = PackageRecord::from_value(
            with(numpy(), json!({ "platform": "linux", "arch": "x86_64" })),
            Arc::new(Context::default().with_subdir("osx-arm64")),
        )
        .unwrap();
        assert_eq!(rec.subdir(), "linux-64");
    }

    #[test]
    fn subdir_noarch_when_platform_without_arch() {
        let rec = PackageRecord::from_value(with(numpy(), json!({ "platform": "win" })), ctx())
            .unwrap();
        assert_eq!(rec.subdir(), "noarch");
    }

    #[test]
    fn url_branch_precedes_platform_branch() {
        let rec = PackageRecord::from_value(
            with(
                numpy(),
                json!({
                    "url": "https://repo/osx-64/numpy-1.2-0.tar.bz2",
                    "platform": "linux",
                    "arch": "x86_64",
                }),
            ),
            ctx(),
        )
        .unwrap();
        assert_eq!(rec.subdir(), "osx-64");
        assert_eq!(rec.to_index_manifest().subdir(), "linux-64");
        assert_eq!(rec.to_reference().subdir(), "osx-64");
    }

    #[test]
    fn stored_subdir_lives_on_the_locator() {
        let mut rec = PackageRecord::from_value(
            with(numpy(), json!({ "subdir": "linux-64", "platform": "osx", "arch": "arm64" })),
            ctx(),
        )
        .unwrap();
        assert!(rec.manifest.subdir.is_none());
        assert_eq!(rec.to_index_manifest().subdir(), "linux-64");

        rec.locator.subdir = Some("win-64".to_owned());
        assert_eq!(rec.subdir(), "win-64");
        assert_eq!(rec.to_index_manifest().subdir(), rec.subdir());
        assert_eq!(rec.to_reference().subdir(), rec.subdir());

        rec.locator.subdir = None;
        assert_eq!(rec.subdir(), "osx-arm64");
        assert_eq!(rec.to_index_manifest().subdir(), rec.subdir());
    }

    #[test]
    fn manifest_only_subdir_moves_to_locator() {
        let manifest = ManifestFields {
            subdir: Some("noarch".to_owned()),
            ..ManifestFields::default()
        };
        let rec = PackageRecord::new(
            BaseIdentity::new("numpy", "1.2", "0", 0),
            Locator::default(),
            manifest,
            RecordExtras::default(),
            ctx(),
        )
        .unwrap();
        assert_eq!(rec.locator.subdir.as_deref(), Some("noarch"));
        assert!(rec.manifest.subdir.is_none());
        assert_eq!(rec.subdir(), "noarch");
    }

    #[test]
    fn both_spellings_of_build_and_channel_are_accepted() {
        let rec = PackageRecord::from_value(
            with(
                json!({ "name": "numpy", "version": "1.2", "build_number": 0 }),
                json!({
                    "build": "0",
                    "build_string": "0",
                    "channel": "https://conda.anaconda.org/conda-forge/linux-64",
                    "schannel": "conda-forge",
                }),
            ),
            ctx(),
        )
        .unwrap();
        assert_eq!(rec.build(), "0");
        assert_eq!(rec.schannel(), "conda-forge");
        assert_eq!(rec.dist_str(), "conda-forge::numpy-1.2-0");
    }

    #[test]
    fn reference_view_ignores_platform() {
        let rec = PackageRecord::from_value(with(numpy(), json!({ "platform": "win" })), ctx())
            .unwrap();
        assert_eq!(rec.to_reference().subdir(), "linux-64");
    }

    #[test]
    fn identity_ignores_non_key_fields() {
        let a = PackageRecord::from_value(
            with(
                numpy(),
                json!({ "channel": "conda-forge", "subdir": "linux-64", "md5": "aa", "size": 10 }),
            ),
            ctx(),
        )
        .unwrap();
        let b = PackageRecord::from_value(
            with(
                numpy(),
                json!({
                    "channel": "conda-forge",
                    "subdir": "linux-64",
                    "md5": "bb",
                    "url": "https://conda.anaconda.org/conda-forge/linux-64/numpy-1.2-0.tar.bz2",
                    "date": "2024-01-01",
                    "depends": ["python"],
                }),
            ),
            ctx(),
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let set: HashSet<PackageRecord> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn identity_differs_on_build() {
        let a = PackageRecord::from_value(numpy(), ctx()).unwrap();
        let mut b = a.clone();
        b.base.build = "1".to_owned();
        assert_ne!(a, b);
    }

    #[test]
    fn mutation_changes_derived_identity() {
        let mut rec = PackageRecord::from_value(numpy(), ctx()).unwrap();
        let before = rec.identity_key();
        rec.locator.url = Some("https://repo/osx-64/numpy-1.2-0.tar.bz2".to_owned());
        let after = rec.identity_key();
        assert_ne!(before, after);
        assert_eq!(after.subdir(), "osx-64");
        assert_eq!(after.channel(), "https://repo");
    }

    #[test]
    fn derived_fields_repeat() {
        let rec = PackageRecord::from_value(numpy(), ctx()).unwrap();
        assert_eq!(rec.subdir(), rec.subdir());
        assert_eq!(rec.identity_key(), rec.identity_key());
        assert_eq!(rec.schannel(), "<unknown>");
        assert_eq!(rec.dist_str(), "<unknown>::numpy-1.2-0");
    }

    #[test]
    fn empty_filename_fails_construction() {
        let err = PackageRecord::from_value(with(numpy(), json!({ "fn": "" })), ctx()).unwrap_err();
        assert!(matches!(err, RecordError::EmptyFilename { .. }));
    }

    #[test]
    fn missing_build_number_fails_construction() {
        let err = PackageRecord::from_value(
            json!({ "name": "a", "version": "1", "build": "0" }),
            ctx(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("build_number"));
    }

    #[test]
    fn invalid_package_type_fails_construction() {
        let err = PackageRecord::from_value(
            with(numpy(), json!({ "package_type": "rpm" })),
            ctx(),
        )
        .unwrap_err();
        assert!(matches!(err, RecordError::InvalidEnum(ref e) if e.field == "package_type"));
    }

    #[test]
    fn reference_metadata_ignores_manifest_fields() {
        let reference = ReferenceMetadata::from_value(
            with(numpy(), json!({ "platform": "beos", "schannel": "bioconda" })),
            ctx(),
        )
        .unwrap();
        assert_eq!(reference.schannel(), "bioconda");
        assert_eq!(reference.dist_str(), "bioconda::numpy-1.2-0");
    }

    #[test]
    fn reference_and_record_share_identity() {
        let rec = PackageRecord::from_value(
            with(numpy(), json!({ "channel": "conda-forge" })),
            ctx(),
        )
        .unwrap();
        assert_eq!(rec.to_reference().identity_key(), rec.identity_key());
    }

    #[test]
    fn dump_inverts_coercions() {
        let rec = PackageRecord::from_value(
            with(
                numpy(),
                json!({
                    "schannel": "conda-forge",
                    "features": "mkl, debug",
                    "track_features": ["blas"],
                    "noarch": true,
                    "platform": "linux",
                    "priority": 2,
                }),
            ),
            ctx(),
        )
        .unwrap();
        let dump = rec.dump().unwrap();
        assert_eq!(dump["features"], json!("mkl debug"));
        assert_eq!(dump["track_features"], json!("blas"));
        assert_eq!(dump["noarch"], json!("generic"));
        assert_eq!(dump["platform"], json!("linux"));
        assert_eq!(dump["channel"], json!("conda-forge"));
        assert_eq!(dump["fn"], json!("numpy-1.2-0"));
        assert_eq!(dump["subdir"], json!("noarch"));
        assert_eq!(dump["priority"], json!(2));
        assert!(dump.get("md5").is_none());
        assert!(dump.get("url").is_none());
    }

    #[test]
    fn dump_omits_unknown_channel_and_native_noarch() {
        let dump = PackageRecord::from_value(numpy(), ctx()).unwrap().dump().unwrap();
        assert!(dump.get("channel").is_none());
        assert!(dump.get("noarch").is_none());
        assert_eq!(dump["features"], json!(""));
        assert_eq!(dump["depends"], json!([]));
    }

    #[test]
    fn dump_then_load_preserves_record() {
        let rec = PackageRecord::from_value(
            with(
                numpy(),
                json!({
                    "url": "https://conda.anaconda.org/conda-forge/linux-64/numpy-1.2-0.tar.bz2",
                    "md5": "0123",
                    "depends": ["python >=3.9"],
                    "constrains": ["mkl <2024"],
                    "features": "a b",
                    "license": "BSD-3-Clause",
                    "size": 4096,
                }),
            ),
            ctx(),
        )
        .unwrap();
        let reloaded = PackageRecord::from_value(rec.dump().unwrap(), ctx()).unwrap();
        assert_eq!(reloaded, rec);
        assert_eq!(reloaded.manifest.depends, rec.manifest.depends);
        assert_eq!(reloaded.manifest.constrains, rec.manifest.constrains);
        assert_eq!(reloaded.manifest.features, rec.manifest.features);
        assert_eq!(reloaded.extras, rec.extras);
        // The derived subdir is written back as a stored one.
        assert_eq!(reloaded.locator.subdir.as_deref(), Some("linux-64"));
        assert_eq!(reloaded.filename().unwrap(), rec.filename().unwrap());
        assert_eq!(reloaded.dump().unwrap(), rec.dump().unwrap());
    }

    #[test]
    fn combined_depends_through_record() {
        let rec = PackageRecord::from_value(
            with(
                numpy(),
                json!({ "depends": ["foo >=1", "python"], "constrains": ["foo <2"] }),
            ),
            ctx(),
        )
        .unwrap();
        let merged = rec.combined_depends().unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].to_string(), "foo <2");
        assert!(merged[0].is_optional());
    }

    #[test]
    fn deserialize_uses_default_context() {
        let rec: PackageRecord = serde_json::from_value(with(
            numpy(),
            json!({ "subdir": "noarch", "channel": "conda-forge" }),
        ))
        .unwrap();
        assert_eq!(rec.identity_key().subdir(), "noarch");

        let err = serde_json::from_value::<PackageRecord>(json!({ "name": "x" })).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn load_index_json_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, numpy().to_string()).unwrap();
        let rec = PackageRecord::load(&path, ctx()).unwrap();
        assert_eq!(rec.name(), "numpy");
        assert!(PackageRecord::load(dir.path().join("missing.json"), ctx()).is_err());
    }
}
