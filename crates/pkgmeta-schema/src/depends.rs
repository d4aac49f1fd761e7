use crate::spec::{MatchSpec, SpecError};
use indexmap::IndexMap;
use tracing::debug;

/// Merge `depends` and `constrains` into one ordered list keyed by package name.
///
/// Every `depends` entry is parsed as a required spec, in order; a repeated
/// name keeps its first position and takes the later value. Every
/// `constrains` entry is then parsed as an optional spec and inserted the same
/// way: a name already present from `depends` is replaced where it stands, a
/// new name goes to the end.
///
/// A constraint on a name that is also a dependency therefore drops the
/// dependency's required status. Resolvers consuming this list rely on that.
pub fn combine_depends(
    depends: &[String],
    constrains: &[String],
) -> Result<Vec<MatchSpec>, SpecError> {
    let mut merged: IndexMap<String, MatchSpec> =
        IndexMap::with_capacity(depends.len() + constrains.len());

    for raw in depends {
        let spec = MatchSpec::parse(raw)?;
        merged.insert(spec.name().to_owned(), spec);
    }
    for raw in constrains {
        let spec = MatchSpec::parse_optional(raw)?;
        if let Some(replaced) = merged.insert(spec.name().to_owned(), spec) {
            debug!("constraint overrides entry '{replaced}' for '{}'", replaced.name());
        }
    }

    Ok(merged.into_values().collect())
}
