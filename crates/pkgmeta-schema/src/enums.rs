//! Closed vocabularies used by package records and path manifests.
//!
//! Every enum serializes as its canonical lowercase spelling. Parsing is strict
//! except for [`LinkType`], which accepts free-form spellings, and
//! [`NoarchType`], which also accepts booleans and "falsy" markers.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An input did not match any variant of a closed vocabulary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid value '{value}' for {field}")]
pub struct EnumError {
    pub field: &'static str,
    pub value: String,
}

impl EnumError {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

macro_rules! canonical_enum {
    (
        $(#[$meta:meta])*
        $name:ident, field = $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $spelling:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Field name reported when parsing fails.
            pub const FIELD: &'static str = $field;

            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical spelling, as written to manifests.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $spelling),+
                }
            }

            /// Exact match against the canonical spellings.
            pub fn from_canonical(value: &str) -> Option<Self> {
                match value {
                    $($spelling => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

macro_rules! deserialize_via_from_str {
    ($name:ident) => {
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

macro_rules! strict_from_str {
    ($name:ident) => {
        impl FromStr for $name {
            type Err = EnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_canonical(s).ok_or_else(|| EnumError::new(Self::FIELD, s))
            }
        }

        deserialize_via_from_str!($name);
    };
}

canonical_enum!(
    /// Operating-system family a package was built for.
    Platform, field = "platform" {
        Linux => "linux",
        Win => "win",
        Openbsd5 => "openbsd5",
        Osx => "osx",
        Zos => "zos",
    }
);
strict_from_str!(Platform);

canonical_enum!(
    /// How a file from an extracted package is placed into a prefix.
    LinkType, field = "link_type" {
        HardLink => "hardlink",
        SoftLink => "softlink",
        Copy => "copy",
        Directory => "directory",
    }
);
deserialize_via_from_str!(LinkType);

impl FromStr for LinkType {
    type Err = EnumError;

    /// Accepts `hard-link`, `Hard_Link`, `hard`, `SOFTLINK`, and similar.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        let folded = match folded.as_str() {
            "hard" => "hardlink",
            "soft" => "softlink",
            other => other,
        };
        Self::from_canonical(folded).ok_or_else(|| EnumError::new(Self::FIELD, s))
    }
}

canonical_enum!(
    /// Kind of platform independence a noarch package declares.
    ///
    /// A package that is not noarch at all is represented as `None` in an
    /// `Option<NoarchType>`, see [`NoarchType::coerce`].
    NoarchType, field = "noarch" {
        Generic => "generic",
        Python => "python",
    }
);

impl NoarchType {
    /// Coerce any accepted spelling of a noarch marker.
    ///
    /// `"python"` means python. Any truthy boolean spelling (`true`, `1`,
    /// `"true"`, `"yes"`, `"y"`, `"on"`, `"1"`) and `"generic"` mean generic.
    /// `null`, `""`, `"none"`, `"null"` and falsy boolean spellings (`false`,
    /// `0`, `"false"`, `"no"`, `"n"`, `"off"`, `"0"`) mean "not noarch".
    pub fn coerce(value: &serde_json::Value) -> Result<Option<Self>, EnumError> {
        match value {
            serde_json::Value::Null | serde_json::Value::Bool(false) => Ok(None),
            serde_json::Value::Bool(true) => Ok(Some(Self::Generic)),
            serde_json::Value::String(s) => Self::coerce_str(s),
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(None),
                Some(1) => Ok(Some(Self::Generic)),
                _ => Err(EnumError::new(Self::FIELD, n.to_string())),
            },
            other => Err(EnumError::new(Self::FIELD, other.to_string())),
        }
    }

    fn coerce_str(value: &str) -> Result<Option<Self>, EnumError> {
        match value.trim().to_lowercase().as_str() {
            "" | "none" | "null" | "false" | "no" | "n" | "off" | "0" => Ok(None),
            "generic" | "true" | "yes" | "y" | "on" | "1" => Ok(Some(Self::Generic)),
            "python" => Ok(Some(Self::Python)),
            _ => Err(EnumError::new(Self::FIELD, value)),
        }
    }
}

impl<'de> Deserialize<'de> for NoarchType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        match Self::coerce(&raw).map_err(serde::de::Error::custom)? {
            Some(kind) => Ok(kind),
            None => Err(serde::de::Error::custom(
                "noarch marker is falsy; use Option<NoarchType>",
            )),
        }
    }
}

canonical_enum!(
    /// Installation behaviour class of a package.
    PackageType, field = "package_type" {
        NoarchGeneric => "noarch_generic",
        NoarchPython => "noarch_python",
        VirtualPrivateEnv => "virtual_private_env",
        VirtualPythonWheel => "virtual_python_wheel",
        VirtualPythonEggManageable => "virtual_python_egg_manageable",
        VirtualPythonEggUnmanageable => "virtual_python_egg_unmanageable",
        VirtualPythonEggLink => "virtual_python_egg_link",
    }
);
strict_from_str!(PackageType);

canonical_enum!(
    /// Filesystem object kind of an installed path.
    PathType, field = "path_type" {
        HardLink => "hardlink",
        SoftLink => "softlink",
        Directory => "directory",
    }
);
strict_from_str!(PathType);

canonical_enum!(
    /// Whether a file carrying a prefix placeholder is text or binary.
    FileMode, field = "file_mode" {
        Text => "text",
        Binary => "binary",
    }
);
strict_from_str!(FileMode);
