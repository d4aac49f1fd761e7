use super::{json_pretty, read_document, record_error, Document, EXIT_SUCCESS};
use pkgmeta_schema::{Context, Identified, PackageRecord};
use std::path::Path;
use std::sync::Arc;

pub fn run(file: &Path, ctx: &Arc<Context>, json: bool) -> Result<u8, String> {
    let document = read_document(file, ctx)?;
    if json {
        let output = match &document {
            Document::Record(record) => record.dump().map_err(record_error)?,
            Document::Index(records) => serde_json::Value::Array(
                records
                    .iter()
                    .map(PackageRecord::dump)
                    .collect::<Result<_, _>>()
                    .map_err(record_error)?,
            ),
        };
        println!("{}", json_pretty(&output)?);
        return Ok(EXIT_SUCCESS);
    }

    for (i, record) in document.records().iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_record(record)?;
    }
    Ok(EXIT_SUCCESS)
}

fn print_record(record: &PackageRecord) -> Result<(), String> {
    let (_, short) = record.identity_key().digest();
    println!("name:        {}", record.name());
    println!("version:     {}", record.version());
    println!(
        "build:       {} (number {})",
        record.build(),
        record.base.build_number
    );
    println!("channel:     {}", record.schannel());
    println!("subdir:      {}", record.subdir());
    println!("fn:          {}", record.filename().map_err(record_error)?);
    println!("dist:        {}", record.dist_str());
    println!("identity:    {short}");
    if let Some(noarch) = record.manifest.noarch {
        println!("noarch:      {noarch}");
    }
    if !record.manifest.track_features.is_empty() {
        println!("tracks:      {}", record.manifest.track_features);
    }
    if let Some(priority) = record.extras.priority {
        println!("priority:    {priority}");
    }
    Ok(())
}
