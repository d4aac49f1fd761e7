//! Fallback chains for fields that may be derived from other fields.
//!
//! Each resolver walks an ordered list of sources and returns the first one
//! that yields a value. Nothing is cached: callers re-derive on every access,
//! so a derived value always reflects the fields stored at that moment.

use crate::channel::Channel;
use crate::context::Context;
use crate::enums::Platform;
use crate::record::BaseIdentity;
use crate::RecordError;

/// One source in a subdirectory fallback chain.
#[derive(Debug, Clone, Copy)]
pub enum SubdirSource<'a> {
    /// A subdir stored on the record.
    Explicit(Option<&'a str>),
    /// The subdir segment of the record's download URL.
    Url(Option<&'a str>),
    /// The legacy `platform` / `arch` pair from a package's own manifest.
    PlatformArch(Option<Platform>, Option<&'a str>),
}

impl SubdirSource<'_> {
    fn resolve(&self, ctx: &Context) -> Option<String> {
        match *self {
            Self::Explicit(subdir) => subdir.map(str::to_owned),
            Self::Url(url) => non_empty(url)
                .and_then(|url| Channel::from_url(url, ctx).subdir().map(str::to_owned)),
            Self::PlatformArch(platform, arch) => subdir_from_platform(platform, non_empty(arch)),
        }
    }
}

/// First subdir any source yields, else the context default.
pub fn resolve_subdir(chain: &[SubdirSource<'_>], ctx: &Context) -> String {
    chain
        .iter()
        .find_map(|source| source.resolve(ctx))
        .unwrap_or_else(|| ctx.subdir.clone())
}

fn subdir_from_platform(platform: Option<Platform>, arch: Option<&str>) -> Option<String> {
    match (platform, arch) {
        (Some(_), None) => Some("noarch".to_owned()),
        (Some(platform), Some(arch)) => Some(format!("{platform}-{}", normalize_arch(arch))),
        (None, _) => None,
    }
}

/// Collapse `x86`-family tokens to a bitness (`x86_64` → `64`, `x86` → `32`).
/// Other tokens pass through unchanged.
pub fn normalize_arch(arch: &str) -> &str {
    if arch.contains("x86") {
        if arch.contains("64") {
            "64"
        } else {
            "32"
        }
    } else {
        arch
    }
}

/// Stored channel, else the channel of the URL, else the placeholder.
pub fn resolve_channel(explicit: Option<&str>, url: Option<&str>, ctx: &Context) -> Channel {
    explicit
        .map(|value| Channel::from_value(value, ctx))
        .or_else(|| non_empty(url).map(|url| Channel::from_url(url, ctx)))
        .unwrap_or_else(Channel::unknown)
}

/// Stored filename, else the URL's package filename, else `name-version-build`.
pub fn resolve_filename(
    explicit: Option<&str>,
    url: Option<&str>,
    base: &BaseIdentity,
    ctx: &Context,
) -> Result<String, RecordError> {
    let filename = explicit
        .map(str::to_owned)
        .or_else(|| {
            non_empty(url).and_then(|url| {
                Channel::from_url(url, ctx)
                    .package_filename()
                    .filter(|f| !f.is_empty())
                    .map(str::to_owned)
            })
        })
        .unwrap_or_else(|| format!("{}-{}-{}", base.name, base.version, base.build));

    if filename.is_empty() {
        return Err(RecordError::EmptyFilename {
            name: base.name.clone(),
        });
    }
    Ok(filename)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
