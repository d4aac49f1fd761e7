use super::{colorize_requirement, json_pretty, read_document, record_error, EXIT_SUCCESS};
use pkgmeta_schema::{Context, MatchSpec, RecordError};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Serialize)]
struct RecordDepends {
    record: String,
    depends: Vec<MatchSpec>,
}

pub fn run(file: &Path, ctx: &Arc<Context>, json: bool) -> Result<u8, String> {
    let document = read_document(file, ctx)?;
    let merged = document
        .records()
        .iter()
        .map(|record| {
            let depends = record
                .combined_depends()
                .map_err(|e| record_error(RecordError::from(e)))?;
            Ok(RecordDepends {
                record: record.dist_str(),
                depends,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    if json {
        println!("{}", json_pretty(&merged)?);
        return Ok(EXIT_SUCCESS);
    }

    for entry in &merged {
        println!("{}", entry.record);
        if entry.depends.is_empty() {
            println!("  (no dependencies)");
        }
        for spec in &entry.depends {
            let text = spec.to_string();
            println!("  {text:<40} {}", colorize_requirement(spec.is_optional()));
        }
    }
    Ok(EXIT_SUCCESS)
}
