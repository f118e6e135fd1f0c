//! Command-line interface for longread-qc.
//!
//! Every action is a subcommand taking `--i-*` input artifacts, `--p-*`
//! parameters and `--o-*` output paths. Artifacts are moved in and out with
//! `import`, `export` and `peek`:
//!
//! ```text
//! # Bring data in
//! longread-qc import --type 'FeatureData[Sequence]' --input-path ref.fasta --output-path ref.qza
//! longread-qc import --type 'SampleData[SequencesWithQuality]' --input-path reads/ --output-path reads.qza
//!
//! # Index a reference and drop reads that do not align well
//! longread-qc build-index --i-sequences ref.qza --o-index-database index.qza
//! longread-qc filter-reads --i-query-reads reads.qza --i-index-database index.qza \
//!     --p-min-per-identity 0.85 --o-filtered-query-reads filtered.qza
//!
//! # Inspect what is available
//! longread-qc actions list
//! longread-qc tools
//! ```

use clap::{Parser, Subcommand};

pub mod actions;
pub mod artifacts;
pub mod describe;
pub mod tools;

#[derive(Parser)]
#[command(name = "longread-qc")]
#[command(version)]
#[command(about = "Quality control and taxonomic classification of long-read sequencing data")]
#[command(
    long_about = "longread-qc wraps minimap2, samtools, chopper and NanoPlot behind typed actions.\n\nInputs and outputs are artifacts: directories holding a payload and metadata.json with the artifact type, checksums and provenance. Set LONGREAD_QC_TOOLS_DIR to run tools from a specific directory instead of PATH."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a minimap2 index database from reference sequences
    BuildIndex(actions::BuildIndexArgs),

    /// Search query sequences against a reference
    Search(actions::SearchArgs),

    /// Keep reads that do or do not align to a reference
    FilterReads(actions::FilterReadsArgs),

    /// Extract sequences that do or do not align to a reference
    ExtractReads(actions::ExtractReadsArgs),

    /// Assign taxonomy by consensus of search hits
    ClassifyConsensus(actions::ClassifyConsensusArgs),

    /// Consensus taxonomy from existing search results
    FindConsensusAnnotation(actions::FindConsensusAnnotationArgs),

    /// Filter and trim reads by quality and length
    Trim(actions::TrimArgs),

    /// Read quality report with NanoPlot
    Stats(actions::StatsArgs),

    /// Import a file or directory as an artifact
    Import(artifacts::ImportArgs),

    /// Copy an artifact's payload out
    Export(artifacts::ExportArgs),

    /// Show an artifact's type and provenance
    Peek(artifacts::PeekArgs),

    /// List or describe actions
    Actions(describe::ActionsArgs),

    /// Check that the external tools can be run
    Tools(tools::ToolsArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
