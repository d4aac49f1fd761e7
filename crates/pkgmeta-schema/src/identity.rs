use crate::RecordError;
use serde::Serialize;
use std::any::Any;
use std::fmt;

/// The five fields that decide whether two records describe the same package:
/// channel canonical name, subdir, name, version, build.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct IdentityKey([String; 5]);

impl IdentityKey {
    pub fn new(
        channel: impl Into<String>,
        subdir: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        build: impl Into<String>,
    ) -> Self {
        Self([
            channel.into(),
            subdir.into(),
            name.into(),
            version.into(),
            build.into(),
        ])
    }

    pub fn channel(&self) -> &str {
        &self.0[0]
    }

    pub fn subdir(&self) -> &str {
        &self.0[1]
    }

    pub fn name(&self) -> &str {
        &self.0[2]
    }

    pub fn version(&self) -> &str {
        &self.0[3]
    }

    pub fn build(&self) -> &str {
        &self.0[4]
    }

    pub fn as_array(&self) -> &[String; 5] {
        &self.0
    }

    /// Stable digest of the key, suitable as a cache or lookup key across
    /// processes (unlike `std::hash::Hash`, which is seeded per process).
    /// Returns the full hex digest and its 12-character prefix.
    pub fn digest(&self) -> (String, String) {
        let mut hasher = blake3::Hasher::new();
        for (label, value) in ["channel", "subdir", "name", "version", "build"]
            .iter()
            .zip(&self.0)
        {
            hasher.update(format!("{label}:{}\n", value.len()).as_bytes());
            hasher.update(value.as_bytes());
        }
        let hex = hasher.finalize().to_hex().to_string();
        let short = hex[..12].to_owned();
        (hex, short)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}::{}-{}-{}",
            self.channel(),
            self.subdir(),
            self.name(),
            self.version(),
            self.build()
        )
    }
}

/// Anything that exposes a package identity key.
///
/// `PartialEq` and `Hash` on identity-bearing records are both defined in
/// terms of this key and nothing else.
pub trait Identified {
    fn identity_key(&self) -> IdentityKey;
}

impl Identified for IdentityKey {
    fn identity_key(&self) -> IdentityKey {
        self.clone()
    }
}

/// Compare a record's identity against a value whose type is only known at
/// runtime.
///
/// Returns [`RecordError::TypeMismatch`] when `other` carries no identity key,
/// rather than reporting the values as unequal.
pub fn try_identity_eq<T: Any>(lhs: &dyn Identified, other: &T) -> Result<bool, RecordError> {
    let other: &dyn Any = other;
    let rhs = if let Some(record) = other.downcast_ref::<crate::PackageRecord>() {
        record.identity_key()
    } else if let Some(reference) = other.downcast_ref::<crate::ReferenceMetadata>() {
        reference.identity_key()
    } else if let Some(key) = other.downcast_ref::<IdentityKey>() {
        key.clone()
    } else {
        return Err(RecordError::TypeMismatch {
            found: std::any::type_name::<T>(),
        });
    };
    Ok(lhs.identity_key() == rhs)
}
