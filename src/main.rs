use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

use abi_shapes::loader::{find_abi_files, load_descriptor, LoadedAbi};
use abi_shapes::signature::{signature_types, to_hex_prefixed};
use abi_shapes::{Descriptor, Entry, Function, Parameter, ParserConfig};

#[derive(Parser)]
#[command(name = "abi-shapes")]
#[command(about = "Parse contract ABIs and resolve the value shapes of their entries")]
#[command(version)]
struct Cli {
    /// Path to an ABI file (JSON or one declaration per line) or a directory of them
    #[arg(short, long)]
    input: PathBuf,

    /// Only show the function, event or error with this name
    #[arg(short, long)]
    entry: Option<String>,

    /// Select a function overload by canonical signature, e.g. `transfer(address,uint256)`
    #[arg(short, long, conflicts_with = "entry")]
    signature: Option<String>,

    /// JSON array of arguments to bind against the selected function
    #[arg(short, long)]
    args: Option<String>,

    /// Print the normalised descriptor as a JSON ABI
    #[arg(long)]
    json: bool,

    /// Take the first mutability keyword instead of rejecting ambiguous declarations
    #[arg(long, env = "ABI_SHAPES_RELAXED")]
    relaxed: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let config = if cli.relaxed {
        ParserConfig::relaxed()
    } else {
        ParserConfig::default()
    };

    if cli.input.is_file() {
        let loaded = load_descriptor(&cli.input, &config)?;
        process_descriptor(&cli, &loaded)?;
    } else if cli.input.is_dir() {
        process_directory(&cli, &cli.input, &config)?;
    } else {
        error!("Input path does not exist: {}", cli.input.display());
        bail!("Invalid input path");
    }

    Ok(())
}

fn process_directory(cli: &Cli, dir_path: &Path, config: &ParserConfig) -> Result<()> {
    let files = find_abi_files(dir_path);
    if files.is_empty() {
        warn!("No ABI files found in {}", dir_path.display());
    }

    let mut total_entries = 0;
    let mut total_rejected = 0;
    let mut failed = 0;
    for path in &files {
        match load_descriptor(path, config) {
            Ok(loaded) => {
                total_entries += loaded.descriptor.len();
                total_rejected += loaded.rejected.len();
                if let Err(e) = process_descriptor(cli, &loaded) {
                    failed += 1;
                    warn!("Failed to process {}: {:#}", path.display(), e);
                }
            }
            Err(e) => {
                failed += 1;
                warn!("Failed to load {}: {:#}", path.display(), e);
            }
        }
    }

    if !cli.json {
        println!("\n{}", "Summary".bold());
        println!("   {} entries across {} files", total_entries, files.len());
        if total_rejected > 0 {
            println!("   {} declarations rejected", total_rejected.to_string().yellow());
        }
        if failed > 0 {
            println!("   {} files failed", failed.to_string().red());
        }
    }
    Ok(())
}

fn process_descriptor(cli: &Cli, loaded: &LoadedAbi) -> Result<()> {
    for rejected in &loaded.rejected {
        eprintln!(
            "{} {}:{} `{}`: {}",
            "✘".red(),
            loaded.path.display(),
            rejected.index,
            rejected.source,
            rejected.error
        );
    }

    let descriptor = &loaded.descriptor;
    if cli.signature.is_some() || cli.args.is_some() {
        let function = select_function(cli, descriptor)?;
        print_entry(&Entry::Function(function.clone()));
        if let Some(args) = &cli.args {
            bind_arguments(function, args)?;
        }
        return Ok(());
    }

    let entries: Vec<&Entry> = match &cli.entry {
        Some(name) => descriptor
            .iter()
            .filter(|entry| entry.name() == Some(name.as_str()))
            .collect(),
        None => descriptor.iter().collect(),
    };
    if let Some(name) = &cli.entry {
        if entries.is_empty() {
            bail!("No entry named `{}` in {}", name, loaded.path.display());
        }
    }

    if cli.json {
        let selected = Descriptor::new(entries.into_iter().cloned().collect());
        println!("{}", selected.to_json_string()?);
        return Ok(());
    }

    println!("{} {}", "ABI".bold(), loaded.path.display());
    println!("{}", "-".repeat(50));
    for entry in entries {
        print_entry(entry);
    }
    Ok(())
}

fn select_function<'a>(cli: &Cli, descriptor: &'a Descriptor) -> Result<&'a Function> {
    if let Some(signature) = &cli.signature {
        let name = signature.split('(').next().unwrap_or_default().trim();
        return Ok(descriptor.function_by_signature(name, &signature_types(signature))?);
    }

    let name = cli.entry.as_deref().context("--args needs --entry or --signature")?;
    let overloads = descriptor.function(name)?;
    match &cli.args {
        Some(args) => Ok(overloads.matching_args(&parse_args(args)?)?),
        None => Ok(overloads.single()?),
    }
}

fn parse_args(args: &str) -> Result<Vec<Value>> {
    match serde_json::from_str(args).context("--args must be JSON")? {
        Value::Array(items) => Ok(items),
        _ => bail!("--args must be a JSON array"),
    }
}

fn bind_arguments(function: &Function, args: &str) -> Result<()> {
    let args = parse_args(args)?;
    let shape = function.shape()?;
    if shape.inputs.len() != args.len() {
        bail!(
            "{} takes {} arguments, got {}",
            function.signature(),
            shape.inputs.len(),
            args.len()
        );
    }

    for ((param, shape), arg) in function.inputs.iter().zip(&shape.inputs).zip(&args) {
        let value = shape
            .bind(arg)
            .with_context(|| format!("Argument `{}` of {}", param, function.signature()))?;
        println!("   {} {} = {}", "✔".green(), param, value.to_json());
    }
    Ok(())
}

fn print_entry(entry: &Entry) {
    for line in describe_entry(entry) {
        println!("{}", line);
    }
}

/// Header plus one line per parameter. A parameter whose type does not
/// resolve is marked in place and the rest are still listed.
fn describe_entry(entry: &Entry) -> Vec<String> {
    let mut lines = vec![entry.to_string().bold().to_string()];
    match entry {
        Entry::Function(function) => {
            lines.push(format!("   selector {}", to_hex_prefixed(function.selector()).cyan()));
            lines.extend(function.inputs.iter().map(|param| describe_parameter("in ", param)));
            lines.extend(function.outputs.iter().map(|param| describe_parameter("out", param)));
        }
        Entry::Event(event) => {
            match event.topic() {
                Some(topic) => lines.push(format!("   topic {}", to_hex_prefixed(topic).cyan())),
                None => lines.push(format!("   {}", "anonymous".dimmed())),
            }
            for param in &event.inputs {
                let label = if param.indexed { "topic" } else { "data " };
                lines.push(describe_parameter(label, param));
            }
        }
        Entry::Error(error) => {
            lines.push(format!("   selector {}", to_hex_prefixed(error.selector()).cyan()));
            lines.extend(error.inputs.iter().map(|param| describe_parameter("in ", param)));
        }
        Entry::Constructor(ctor) => {
            lines.extend(ctor.inputs.iter().map(|param| describe_parameter("in ", param)));
        }
        Entry::Fallback(_) | Entry::Receive(_) => {}
    }
    lines
}

fn describe_parameter(label: &str, param: &Parameter) -> String {
    match param.shape() {
        Ok(shape) => format!("   {} {:<24} {}", label, param.to_string(), shape),
        Err(e) => format!("   {} {:<24} {} {}", label, param.to_string(), "✘".red(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolvable_parameter_does_not_hide_others() {
        let report = Descriptor::from_human_readable([
            "function f(boolean x, uint8 y)",
            "function g(uint256 y)",
            "event E(account indexed who, bool ok)",
        ]);
        assert!(report.is_clean());

        let lines: Vec<String> = report.descriptor.iter().flat_map(describe_entry).collect();
        let text = lines.join("\n");

        assert!(text.contains("unknown ABI type `boolean`"));
        assert!(text.contains("unknown ABI type `account`"));
        assert!(text.contains("uint8 y"));
        assert!(text.contains("function g(uint256 y)"));
        assert!(text.contains("bool ok"));
        assert_eq!(lines.iter().filter(|line| line.contains('✘')).count(), 2);
    }
}
