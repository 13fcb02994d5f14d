//! Loading ABI descriptors from disk.
//!
//! Three file shapes are accepted:
//! - `.json` holding a structured ABI array, or a compiler artifact with an
//!   `abi` field;
//! - `.json` holding an array of human-readable declaration strings;
//! - anything else is read as one human-readable declaration per line,
//!   skipping blank lines and `//` comments.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::ParserConfig;
use crate::descriptor::Descriptor;
use crate::human_readable::{RejectedDeclaration, SignatureParser};

const ABI_EXTENSIONS: [&str; 2] = ["json", "abi"];

#[derive(Debug)]
pub struct LoadedAbi {
    pub path: PathBuf,
    pub descriptor: Descriptor,
    /// Declarations skipped while parsing human-readable input. For line
    /// based files `index` is the 1-based line number.
    pub rejected: Vec<RejectedDeclaration>,
}

pub fn load_descriptor(path: &Path, config: &ParserConfig) -> Result<LoadedAbi> {
    let source = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let is_json = path.extension().map(|ext| ext == "json").unwrap_or(false);
    let (descriptor, rejected) = if is_json {
        let value: Value =
            serde_json::from_str(&source).with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
        from_json(value, config).with_context(|| format!("Invalid ABI in {}", path.display()))?
    } else {
        from_lines(&source, config)
    };

    info!(
        "Loaded {} entries from {} ({} rejected)",
        descriptor.len(),
        path.display(),
        rejected.len()
    );
    Ok(LoadedAbi {
        path: path.to_path_buf(),
        descriptor,
        rejected,
    })
}

fn from_json(value: Value, config: &ParserConfig) -> Result<(Descriptor, Vec<RejectedDeclaration>)> {
    let abi = match value {
        Value::Object(mut artifact) => artifact.remove("abi").context("ABI not found in artifact")?,
        other => other,
    };

    if let Some(items) = abi.as_array() {
        if !items.is_empty() && items.iter().all(Value::is_string) {
            debug!("Treating JSON string array as human-readable declarations");
            let declarations = items.iter().filter_map(Value::as_str);
            let report = SignatureParser::with_config(*config).parse(declarations);
            return Ok((report.descriptor, report.rejected));
        }
    } else {
        bail!("Expected a JSON array of ABI entries");
    }

    Ok((Descriptor::from_json_value(abi)?, Vec::new()))
}

fn from_lines(source: &str, config: &ParserConfig) -> (Descriptor, Vec<RejectedDeclaration>) {
    let (line_numbers, declarations): (Vec<usize>, Vec<&str>) = source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with("//"))
        .unzip();

    let mut report = SignatureParser::with_config(*config).parse(declarations);
    for rejected in &mut report.rejected {
        rejected.index = line_numbers[rejected.index];
    }
    (report.descriptor, report.rejected)
}

/// Recursively collects `.json` and `.abi` files under `dir`, sorted by path.
pub fn find_abi_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ABI_EXTENSIONS.contains(&ext))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}
