//! `tools`: check that every external program can be run.

use anyhow::{bail, Result};
use clap::Args;

use crate::cli::OutputFormat;
use crate::tools::{Tool, ToolRunner};

#[derive(Args)]
pub struct ToolsArgs {}

/// # Errors
///
/// Returns an error if any tool is missing or fails to report a version.
#[allow(clippy::needless_pass_by_value)]
pub fn run(_args: ToolsArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let runner = ToolRunner::from_env();
    let checks: Vec<_> = Tool::ALL
        .iter()
        .map(|&tool| (tool, runner.version(tool)))
        .collect();

    match format {
        OutputFormat::Text => {
            let width = checks
                .iter()
                .map(|(tool, _)| tool.binary_name().len())
                .max()
                .unwrap_or(0);
            if let Some(dir) = runner.tools_dir() {
                println!("Tools directory: {}", dir.display());
            }
            for (tool, result) in &checks {
                match result {
                    Ok(version) => println!("  {:<width$}  {}", tool.binary_name(), version),
                    Err(e) => println!("  {:<width$}  MISSING ({e})", tool.binary_name()),
                }
                if verbose {
                    println!("  {:<width$}  used for {}", "", tool.purpose());
                }
            }
        }
        OutputFormat::Json => {
            let json: Vec<_> = checks
                .iter()
                .map(|(tool, result)| {
                    serde_json::json!({
                        "tool": tool.binary_name(),
                        "purpose": tool.purpose(),
                        "available": result.is_ok(),
                        "version": result.as_ref().ok(),
                        "error": result.as_ref().err().map(ToString::to_string),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Tsv => {
            println!("tool\tavailable\tversion");
            for (tool, result) in &checks {
                let version = result.as_deref().unwrap_or("");
                println!("{}\t{}\t{}", tool.binary_name(), result.is_ok(), version);
            }
        }
    }

    let missing = checks.iter().filter(|(_, r)| r.is_err()).count();
    if missing > 0 {
        bail!("{missing} of {} tools could not be run", checks.len());
    }
    Ok(())
}
