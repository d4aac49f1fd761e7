use serde::de::Deserializer;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;

/// Ordered list of feature names, as found in `features` / `track_features`.
///
/// Manifests write these either as one string separated by commas and/or
/// whitespace, or as a list. Order and duplicates are kept as given. The
/// canonical output form is the names joined by a single space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FeatureSet(Vec<String>);

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a feature string on commas and whitespace, dropping empty pieces.
    pub fn parse(input: &str) -> Self {
        Self(
            input
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|piece| !piece.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }

    /// Names joined with one space; empty string when there are none.
    pub fn to_canonical_string(&self) -> String {
        self.0.join(" ")
    }
}

impl Deref for FeatureSet {
    type Target = [String];
    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl<S: Into<String>> FromIterator<S> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for FeatureSet {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<Vec<String>> for FeatureSet {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl Serialize for FeatureSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureRepr {
    Text(String),
    List(Vec<String>),
}

impl<'de> Deserialize<'de> for FeatureSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<FeatureRepr>::deserialize(deserializer)? {
            None => Self::default(),
            Some(FeatureRepr::Text(text)) => Self::parse(&text),
            Some(FeatureRepr::List(names)) => Self(names),
        })
    }
}
