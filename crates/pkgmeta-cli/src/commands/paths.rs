use super::{json_pretty, record_error, EXIT_SUCCESS};
use pkgmeta_schema::{PathManifest, PathType};
use std::path::Path;

pub fn run(file: &Path, json: bool) -> Result<u8, String> {
    let manifest = PathManifest::load(file).map_err(record_error)?;
    if json {
        println!("{}", json_pretty(&manifest)?);
        return Ok(EXIT_SUCCESS);
    }

    let count = |kind: PathType| manifest.paths.iter().filter(|e| e.path_type == kind).count();
    println!("paths_version: {}", manifest.paths_version);
    println!("entries:       {}", manifest.len());
    println!("hardlinks:     {}", count(PathType::HardLink));
    println!("softlinks:     {}", count(PathType::SoftLink));
    println!("directories:   {}", count(PathType::Directory));
    println!(
        "with prefix:   {}",
        manifest.paths.iter().filter(|e| e.has_prefix()).count()
    );
    Ok(EXIT_SUCCESS)
}
