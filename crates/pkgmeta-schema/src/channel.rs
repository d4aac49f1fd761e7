//! Channel parsing for package URLs and stored channel values.
//!
//! A package URL has the shape `<scheme>://<host>/<channel path>/<subdir>/<filename>`,
//! optionally with a `/t/<token>` segment pair right after the host. The
//! parser peels the filename and subdir off the end; what remains is the
//! channel's base URL, which is then canonicalized against the [`Context`].

use crate::context::Context;
use std::fmt;
use tracing::debug;
use url::Url;

/// Canonical name of a channel that could not be determined.
pub const UNKNOWN_CHANNEL: &str = "<unknown>";

/// Subdirectories recognized when splitting a channel path.
pub const KNOWN_SUBDIRS: &[&str] = &[
    "noarch",
    "linux-32",
    "linux-64",
    "linux-aarch64",
    "linux-armv6l",
    "linux-armv7l",
    "linux-ppc64le",
    "linux-s390x",
    "osx-64",
    "osx-arm64",
    "win-32",
    "win-64",
    "win-arm64",
    "zos-z",
];

const PACKAGE_EXTENSIONS: &[&str] = &[".tar.bz2", ".conda"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Channel {
    name: Option<String>,
    base_url: Option<String>,
    subdir: Option<String>,
    package_filename: Option<String>,
}

impl Channel {
    /// The placeholder channel used when nothing identifies one.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Parse a full package or channel URL.
    pub fn from_url(raw: &str, ctx: &Context) -> Self {
        match Url::parse(raw.trim()) {
            Ok(url) => Self::from_parsed_url(&url, ctx),
            Err(e) => {
                debug!("'{raw}' is not a URL ({e}), treating it as a channel name");
                Self::from_name(raw)
            }
        }
    }

    /// Parse a stored channel value, which is either a URL or a bare name
    /// such as `conda-forge` or `conda-forge/label/dev`.
    pub fn from_value(value: &str, ctx: &Context) -> Self {
        if value.contains("://") {
            Self::from_url(value, ctx)
        } else {
            Self::from_name(value)
        }
    }

    fn from_name(value: &str) -> Self {
        let mut segments: Vec<&str> = value
            .trim()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let (subdir, package_filename) = split_tail(&mut segments);
        let name = segments.join("/");
        Self {
            name: (!name.is_empty()).then_some(name),
            base_url: None,
            subdir,
            package_filename,
        }
    }

    fn from_parsed_url(url: &Url, ctx: &Context) -> Self {
        let mut segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        if segments.len() >= 2 && segments[0] == "t" {
            segments.drain(..2);
        }
        let (subdir, package_filename) = split_tail(&mut segments);

        let mut base_url = format!("{}://{}", url.scheme(), url.host_str().unwrap_or(""));
        if let Some(port) = url.port() {
            base_url.push_str(&format!(":{port}"));
        }
        for segment in &segments {
            base_url.push('/');
            base_url.push_str(segment);
        }

        let name = if ctx.is_default_channel(&base_url) {
            "defaults".to_owned()
        } else if let Some(relative) = ctx.strip_channel_alias(&base_url) {
            relative.to_owned()
        } else {
            base_url.clone()
        };

        Self {
            name: Some(name),
            base_url: Some(base_url),
            subdir,
            package_filename,
        }
    }

    pub fn canonical_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_CHANNEL)
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn subdir(&self) -> Option<&str> {
        self.subdir.as_deref()
    }

    pub fn package_filename(&self) -> Option<&str> {
        self.package_filename.as_deref()
    }

    pub fn is_unknown(&self) -> bool {
        self.name.is_none()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Pop a trailing package filename, then a trailing known subdir.
fn split_tail(segments: &mut Vec<&str>) -> (Option<String>, Option<String>) {
    let package_filename = match segments.last() {
        Some(last) if PACKAGE_EXTENSIONS.iter().any(|ext| last.ends_with(ext)) => {
            segments.pop().map(str::to_owned)
        }
        _ => None,
    };
    let subdir = match segments.last() {
        Some(last) if KNOWN_SUBDIRS.contains(last) => segments.pop().map(str::to_owned),
        _ => None,
    };
    (subdir, package_filename)
}
