//! Minimal dependency specifier parsing.
//!
//! Accepts the space-separated form found in `depends` and `constrains`:
//! `name`, `name version`, `name version build`, with the version operator
//! allowed to touch the name (`numpy>=1.21`) or stand apart (`numpy >= 1.21`).

use serde::Serialize;
use std::fmt;
use thiserror::Error;

const VERSION_OPERATOR_CHARS: &[char] = &['<', '>', '=', '!', '~'];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("empty dependency spec")]
    Empty,
    #[error("invalid package name '{name}' in spec '{spec}'")]
    InvalidName { spec: String, name: String },
    #[error("too many components in spec '{0}', expected '<name> [<version> [<build>]]'")]
    TooManyParts(String),
}

/// A parsed dependency or constraint on a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MatchSpec {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<String>,
    optional: bool,
}

impl MatchSpec {
    /// Parse a hard requirement (a `depends` entry).
    pub fn parse(spec: &str) -> Result<Self, SpecError> {
        Self::parse_with(spec, false)
    }

    /// Parse a soft constraint (a `constrains` entry).
    pub fn parse_optional(spec: &str) -> Result<Self, SpecError> {
        Self::parse_with(spec, true)
    }

    fn parse_with(spec: &str, optional: bool) -> Result<Self, SpecError> {
        let tokens = join_split_tokens(spec);
        let Some((head, rest)) = tokens.split_first() else {
            return Err(SpecError::Empty);
        };

        let (name, inline_version) = match head.find(VERSION_OPERATOR_CHARS) {
            Some(0) | None => (head.as_str(), None),
            Some(idx) => (&head[..idx], Some(head[idx..].to_owned())),
        };
        if !is_valid_name(name) {
            return Err(SpecError::InvalidName {
                spec: spec.to_owned(),
                name: name.to_owned(),
            });
        }

        let mut parts = inline_version.into_iter().chain(rest.iter().cloned());
        let version = parts.next();
        let build = parts.next();
        if parts.next().is_some() {
            return Err(SpecError::TooManyParts(spec.to_owned()));
        }

        Ok(Self {
            name: name.to_owned(),
            version,
            build,
            optional,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

impl fmt::Display for MatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(version) = &self.version {
            write!(f, " {version}")?;
        }
        if let Some(build) = &self.build {
            write!(f, " {build}")?;
        }
        Ok(())
    }
}

/// Split on whitespace, gluing a bare operator (`>=`) or a token ending in a
/// comma (`>=1,`) onto the token that follows it.
fn join_split_tokens(spec: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut glue_next = false;
    for token in spec.split_whitespace() {
        match tokens.last_mut() {
            Some(last) if glue_next => last.push_str(token),
            _ => tokens.push(token.to_owned()),
        }
        let last = tokens.last().map_or("", String::as_str);
        glue_next = last.ends_with(',')
            || (tokens.len() > 1 && last.chars().all(|c| VERSION_OPERATOR_CHARS.contains(&c)));
    }
    tokens
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+' | '*'))
}
