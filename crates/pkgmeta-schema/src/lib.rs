//! Package identity and metadata records for conda-style package indexes.
//!
//! This crate defines the record layer: the composed `PackageRecord` and its
//! narrower views (`ReferenceMetadata`, `IndexManifestMetadata`), lenient
//! normalizers for manifest fields (`LinkType`, `NoarchType`, `FeatureSet`),
//! derived channel/subdir/filename resolution driven by a `Context`, the
//! five-field `IdentityKey` behind record equality, the `combine_depends`
//! merge, and the `PathManifest` of files a package installs.

pub mod channel;
pub mod context;
pub mod depends;
pub mod derive;
pub mod enums;
pub mod features;
pub mod identity;
pub mod manifest;
pub mod paths;
pub mod priority;
pub mod record;
pub mod repodata;
pub mod spec;

pub use channel::{Channel, UNKNOWN_CHANNEL};
pub use context::{host_subdir, Context, ContextError};
pub use depends::combine_depends;
pub use derive::{normalize_arch, SubdirSource};
pub use enums::{EnumError, FileMode, LinkType, NoarchType, PackageType, PathType, Platform};
pub use features::FeatureSet;
pub use identity::{try_identity_eq, Identified, IdentityKey};
pub use manifest::RawRecord;
pub use paths::{Link, PathEntry, PathManifest};
pub use priority::Priority;
pub use record::{
    BaseIdentity, IndexManifestMetadata, Locator, ManifestFields, PackageRecord, RecordExtras,
    ReferenceMetadata,
};
pub use repodata::{RepoData, RepoDataInfo};
pub use spec::{MatchSpec, SpecError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
    #[error(transparent)]
    InvalidEnum(#[from] EnumError),
    #[error("record for '{name}' resolves to an empty filename")]
    EmptyFilename { name: String },
    #[error("cannot compare a package identity with a value of type {found}")]
    TypeMismatch { found: &'static str },
    #[error("invalid dependency: {0}")]
    Spec(#[from] SpecError),
    #[error("entry '{key}': {source}")]
    Entry {
        key: String,
        #[source]
        source: Box<RecordError>,
    },
}
