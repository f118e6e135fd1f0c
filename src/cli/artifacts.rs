//! `import`, `export` and `peek`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::artifact::import::{export_artifact, import_artifact};
use crate::artifact::Artifact;
use crate::cli::OutputFormat;
use crate::core::types::ArtifactType;

#[derive(Args)]
pub struct ImportArgs {
    /// Semantic type, e.g. 'FeatureData[Sequence]'
    #[arg(long = "type", value_name = "TYPE")]
    pub artifact_type: ArtifactType,

    /// File or directory to import
    #[arg(long = "input-path", value_name = "PATH")]
    pub input_path: PathBuf,

    /// Where to save the artifact
    #[arg(long = "output-path", value_name = "PATH")]
    pub output_path: PathBuf,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Artifact to export
    #[arg(long = "input-path", value_name = "ARTIFACT")]
    pub input_path: PathBuf,

    /// Directory to create and fill with the payload
    #[arg(long = "output-path", value_name = "PATH")]
    pub output_path: PathBuf,
}

#[derive(Args)]
pub struct PeekArgs {
    /// Artifact to inspect
    pub artifact: PathBuf,

    /// Recompute payload checksums
    #[arg(long)]
    pub verify: bool,
}

/// # Errors
///
/// Returns an error if the source does not parse as the requested type or
/// the output path exists.
#[allow(clippy::needless_pass_by_value)]
pub fn run_import(args: ImportArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let artifact = import_artifact(args.artifact_type, &args.input_path, &args.output_path)
        .with_context(|| format!("Failed to import {}", args.input_path.display()))?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "type": artifact.artifact_type().as_str(),
                "path": artifact.path().display().to_string(),
                "signature": artifact.signature(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text | OutputFormat::Tsv => {
            println!(
                "Imported {} as {} to {}",
                args.input_path.display(),
                artifact.artifact_type(),
                artifact.path().display()
            );
        }
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the artifact cannot be loaded or the output path
/// exists.
#[allow(clippy::needless_pass_by_value)]
pub fn run_export(args: ExportArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let artifact = Artifact::load(&args.input_path)?;
    let written = export_artifact(&artifact, &args.output_path)?;

    match format {
        OutputFormat::Json => {
            let files: Vec<_> = written.iter().map(|p| p.display().to_string()).collect();
            let json = serde_json::json!({
                "type": artifact.artifact_type().as_str(),
                "output": args.output_path.display().to_string(),
                "files": files,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Tsv => {
            for path in &written {
                println!("{}", path.display());
            }
        }
        OutputFormat::Text => {
            println!(
                "Exported {} to directory {}",
                args.input_path.display(),
                args.output_path.display()
            );
            if verbose {
                for path in &written {
                    println!("  {}", path.display());
                }
            }
        }
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the artifact cannot be loaded, or with `--verify`
/// if a checksum does not match.
#[allow(clippy::needless_pass_by_value)]
pub fn run_peek(args: PeekArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let artifact = Artifact::load(&args.artifact)?;
    if args.verify {
        artifact.verify()?;
    }
    let metadata = artifact.metadata();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "path": artifact.path().display().to_string(),
                "type": metadata.artifact_type.as_str(),
                "format": metadata.format,
                "format_version": metadata.format_version,
                "created_at": metadata.created_at,
                "signature": artifact.signature(),
                "provenance": metadata.provenance,
                "files": metadata.checksums.keys().collect::<Vec<_>>(),
                "verified": args.verify,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Tsv => {
            println!("field\tvalue");
            println!("type\t{}", metadata.artifact_type);
            println!("format\t{}", metadata.format);
            println!("created_at\t{}", metadata.created_at);
            println!("action\t{}", metadata.provenance.action);
            println!("signature\t{}", artifact.signature());
            println!("files\t{}", metadata.checksums.len());
        }
        OutputFormat::Text => {
            println!("Artifact: {}", artifact.path().display());
            println!("Type: {}", metadata.artifact_type);
            println!("Data format: {}", metadata.format);
            println!("Created: {}", metadata.created_at);
            println!("Signature: {}", artifact.signature());
            println!("Action: {}", metadata.provenance.action);
            if !metadata.provenance.parameters.is_empty() {
                println!("Parameters:");
                for (name, value) in &metadata.provenance.parameters {
                    println!("  {name}: {value}");
                }
            }
            if !metadata.provenance.inputs.is_empty() {
                println!("Inputs:");
                for (name, signature) in &metadata.provenance.inputs {
                    println!("  {name}: {signature}");
                }
            }
            println!("Files: {}", metadata.checksums.len());
            if args.verify {
                println!("Checksums: OK");
            }
        }
    }
    Ok(())
}
