pub mod completions;
pub mod depends;
pub mod paths;
pub mod show;

use pkgmeta_schema::{Context, PackageRecord, RecordError, RepoData};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_RECORD_ERROR: u8 = 2;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

#[allow(clippy::needless_pass_by_value)]
pub fn record_error(e: RecordError) -> String {
    format!("record error: {e}")
}

/// Context from `--config` (or defaults), with `--subdir` applied on top.
pub fn load_context(config: Option<&Path>, subdir: Option<&str>) -> Result<Arc<Context>, String> {
    let mut ctx = match config {
        Some(path) => Context::load(path).map_err(|e| format!("{}: {e}", path.display()))?,
        None => Context::default(),
    };
    if let Some(subdir) = subdir {
        ctx = ctx.with_subdir(subdir);
    }
    debug!("default subdir: {}", ctx.subdir);
    Ok(Arc::new(ctx))
}

/// A parsed record document: one package's `index.json`, or a channel
/// subdir's `repodata.json`.
pub enum Document {
    Record(Box<PackageRecord>),
    Index(Vec<PackageRecord>),
}

impl Document {
    pub fn records(&self) -> &[PackageRecord] {
        match self {
            Self::Record(record) => std::slice::from_ref(record.as_ref()),
            Self::Index(records) => records,
        }
    }
}

pub fn read_document(path: &Path, ctx: &Arc<Context>) -> Result<Document, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| record_error(RecordError::Parse(e)))?;

    let is_index = value
        .as_object()
        .is_some_and(|map| map.contains_key("packages") || map.contains_key("packages.conda"));
    if is_index {
        let repo = RepoData::from_value(value).map_err(record_error)?;
        Ok(Document::Index(repo.records(ctx).map_err(record_error)?))
    } else {
        let record = PackageRecord::from_value(value, Arc::clone(ctx)).map_err(record_error)?;
        Ok(Document::Record(Box::new(record)))
    }
}

pub fn colorize_requirement(optional: bool) -> String {
    use console::Style;
    if optional {
        Style::new().yellow().apply_to("optional").to_string()
    } else {
        Style::new().green().apply_to("required").to_string()
    }
}
