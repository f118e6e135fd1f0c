//! Action subcommands: `--i-*` inputs, `--p-*` parameters, `--o-*` outputs.
//!
//! Parameters left off the command line fall back to the action's
//! declared defaults; all range and choice checks happen in the registry.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::actions::common::{INDEX_DATABASE, REFERENCE_READS};
use crate::actions::{ActionCall, ActionRegistry};
use crate::artifact::Artifact;
use crate::cli::OutputFormat;
use crate::core::types::{MappingPreset, ReadSelection};

/// Reference to align against, as an index or as raw sequences
#[derive(Args, Debug)]
pub struct ReferenceArgs {
    /// minimap2 index database artifact (Minimap2IndexDB)
    #[arg(long = "i-index-database", value_name = "ARTIFACT")]
    pub index_database: Option<PathBuf>,

    /// Reference sequences artifact (FeatureData[Sequence])
    #[arg(long = "i-reference-reads", value_name = "ARTIFACT")]
    pub reference_reads: Option<PathBuf>,
}

impl ReferenceArgs {
    fn apply(&self, call: ActionCall) -> ActionCall {
        call.input_if_some(INDEX_DATABASE, self.index_database.clone())
            .input_if_some(REFERENCE_READS, self.reference_reads.clone())
    }
}

/// Alignment parameters shared by `filter-reads` and `extract-reads`
#[derive(Args, Debug)]
pub struct AlignmentArgs {
    /// Number of threads
    #[arg(long = "p-n-threads", allow_negative_numbers = true)]
    pub n_threads: Option<i64>,

    /// minimap2 preset for the read technology
    #[arg(long = "p-mapping-preset", value_enum)]
    pub mapping_preset: Option<MappingPreset>,

    /// Minimum identity for a read to count as mapped, in [0, 1]
    #[arg(long = "p-min-per-identity", allow_negative_numbers = true)]
    pub min_per_identity: Option<f64>,

    /// Matching score (minimap2 -A)
    #[arg(long = "p-matching-score", allow_negative_numbers = true)]
    pub matching_score: Option<i64>,

    /// Mismatching penalty (minimap2 -B)
    #[arg(long = "p-mismatching-penalty", allow_negative_numbers = true)]
    pub mismatching_penalty: Option<i64>,

    /// Gap open penalty (minimap2 -O)
    #[arg(long = "p-gap-open-penalty", allow_negative_numbers = true)]
    pub gap_open_penalty: Option<i64>,

    /// Gap extension penalty (minimap2 -E)
    #[arg(long = "p-gap-extension-penalty", allow_negative_numbers = true)]
    pub gap_extension_penalty: Option<i64>,
}

impl AlignmentArgs {
    fn apply(&self, call: ActionCall) -> ActionCall {
        call.param_if_some("n_threads", self.n_threads)
            .param_if_some("mapping_preset", self.mapping_preset.map(MappingPreset::as_str))
            .param_if_some("min_per_identity", self.min_per_identity)
            .param_if_some("matching_score", self.matching_score)
            .param_if_some("mismatching_penalty", self.mismatching_penalty)
            .param_if_some("gap_open_penalty", self.gap_open_penalty)
            .param_if_some("gap_extension_penalty", self.gap_extension_penalty)
    }
}

/// Search thresholds shared by `search` and `classify-consensus`
#[derive(Args, Debug)]
pub struct SearchThresholdArgs {
    /// Number of threads
    #[arg(long = "p-n-threads", allow_negative_numbers = true)]
    pub n_threads: Option<i64>,

    /// Maximum number of hits kept per query
    #[arg(long = "p-maxaccepts", allow_negative_numbers = true)]
    pub maxaccepts: Option<i64>,

    /// Minimum hit identity, in [0, 1]
    #[arg(long = "p-perc-identity", allow_negative_numbers = true)]
    pub perc_identity: Option<f64>,

    /// Report queries without hits
    #[arg(long = "p-output-no-hits", value_name = "BOOL")]
    pub output_no_hits: Option<bool>,
}

impl SearchThresholdArgs {
    fn apply(&self, call: ActionCall) -> ActionCall {
        call.param_if_some("n_threads", self.n_threads)
            .param_if_some("maxaccepts", self.maxaccepts)
            .param_if_some("perc_identity", self.perc_identity)
            .param_if_some("output_no_hits", self.output_no_hits)
    }
}

/// Consensus parameters shared by both classification actions
#[derive(Args, Debug)]
pub struct ConsensusArgs {
    /// Fraction of hits that must agree on a rank, in (0.5, 1]
    #[arg(long = "p-min-consensus", allow_negative_numbers = true)]
    pub min_consensus: Option<f64>,

    /// Taxon given to queries without a consensus
    #[arg(long = "p-unassignable-label")]
    pub unassignable_label: Option<String>,
}

impl ConsensusArgs {
    fn apply(&self, call: ActionCall) -> ActionCall {
        call.param_if_some("min_consensus", self.min_consensus)
            .param_if_some("unassignable_label", self.unassignable_label.clone())
    }
}

#[derive(Args, Debug)]
pub struct BuildIndexArgs {
    /// Reference sequences artifact (FeatureData[Sequence])
    #[arg(long = "i-sequences", value_name = "ARTIFACT")]
    pub sequences: PathBuf,

    /// minimap2 preset for the read technology
    #[arg(long = "p-mapping-preset", value_enum)]
    pub mapping_preset: Option<MappingPreset>,

    /// Minimizer k-mer length, in [1, 28]
    #[arg(long = "p-kmer-length", allow_negative_numbers = true)]
    pub kmer_length: Option<i64>,

    /// Where to save the index artifact
    #[arg(long = "o-index-database", value_name = "PATH")]
    pub index_database: PathBuf,
}

impl BuildIndexArgs {
    #[must_use]
    pub fn to_call(&self) -> ActionCall {
        ActionCall::new("build-index")
            .input("sequences", &self.sequences)
            .param_if_some("mapping_preset", self.mapping_preset.map(MappingPreset::as_str))
            .param_if_some("kmer_length", self.kmer_length)
            .output("index_database", &self.index_database)
    }
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query sequences artifact (FeatureData[Sequence])
    #[arg(long = "i-query-reads", value_name = "ARTIFACT")]
    pub query_reads: PathBuf,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    #[command(flatten)]
    pub thresholds: SearchThresholdArgs,

    /// Where to save the search results artifact
    #[arg(long = "o-search-results", value_name = "PATH")]
    pub search_results: PathBuf,
}

impl SearchArgs {
    #[must_use]
    pub fn to_call(&self) -> ActionCall {
        let call = ActionCall::new("search").input("query_reads", &self.query_reads);
        self.thresholds
            .apply(self.reference.apply(call))
            .output("search_results", &self.search_results)
    }
}

#[derive(Args, Debug)]
pub struct FilterReadsArgs {
    /// Per-sample reads artifact (SampleData[SequencesWithQuality] or
    /// SampleData[PairedEndSequencesWithQuality])
    #[arg(long = "i-query-reads", value_name = "ARTIFACT")]
    pub query_reads: PathBuf,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    #[command(flatten)]
    pub alignment: AlignmentArgs,

    /// Keep mapped or unmapped reads
    #[arg(long = "p-keep", value_enum)]
    pub keep: Option<ReadSelection>,

    /// Where to save the filtered reads artifact
    #[arg(long = "o-filtered-query-reads", value_name = "PATH")]
    pub filtered_query_reads: PathBuf,
}

impl FilterReadsArgs {
    #[must_use]
    pub fn to_call(&self) -> ActionCall {
        let call = ActionCall::new("filter-reads").input("query_reads", &self.query_reads);
        self.alignment
            .apply(self.reference.apply(call))
            .param_if_some("keep", self.keep.map(ReadSelection::as_str))
            .output("filtered_query_reads", &self.filtered_query_reads)
    }
}

#[derive(Args, Debug)]
pub struct ExtractReadsArgs {
    /// Sequences artifact to screen (FeatureData[Sequence])
    #[arg(long = "i-sequences", value_name = "ARTIFACT")]
    pub sequences: PathBuf,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    #[command(flatten)]
    pub alignment: AlignmentArgs,

    /// Extract mapped or unmapped sequences
    #[arg(long = "p-extract", value_enum)]
    pub extract: Option<ReadSelection>,

    /// Where to save the extracted sequences artifact
    #[arg(long = "o-extracted-seqs", value_name = "PATH")]
    pub extracted_seqs: PathBuf,
}

impl ExtractReadsArgs {
    #[must_use]
    pub fn to_call(&self) -> ActionCall {
        let call = ActionCall::new("extract-reads").input("sequences", &self.sequences);
        self.alignment
            .apply(self.reference.apply(call))
            .param_if_some("extract", self.extract.map(ReadSelection::as_str))
            .output("extracted_seqs", &self.extracted_seqs)
    }
}

#[derive(Args, Debug)]
pub struct ClassifyConsensusArgs {
    /// Query sequences artifact (FeatureData[Sequence])
    #[arg(long = "i-query", value_name = "ARTIFACT")]
    pub query: PathBuf,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Reference taxonomy artifact (FeatureData[Taxonomy])
    #[arg(long = "i-reference-taxonomy", value_name = "ARTIFACT")]
    pub reference_taxonomy: PathBuf,

    #[command(flatten)]
    pub thresholds: SearchThresholdArgs,

    #[command(flatten)]
    pub consensus: ConsensusArgs,

    /// Where to save the search results artifact
    #[arg(long = "o-search-results", value_name = "PATH")]
    pub search_results: PathBuf,

    /// Where to save the classification artifact
    #[arg(long = "o-classification", value_name = "PATH")]
    pub classification: PathBuf,
}

impl ClassifyConsensusArgs {
    #[must_use]
    pub fn to_call(&self) -> ActionCall {
        let call = ActionCall::new("classify-consensus")
            .input("query", &self.query)
            .input("reference_taxonomy", &self.reference_taxonomy);
        let call = self.thresholds.apply(self.reference.apply(call));
        self.consensus
            .apply(call)
            .output("search_results", &self.search_results)
            .output("classification", &self.classification)
    }
}

#[derive(Args, Debug)]
pub struct FindConsensusAnnotationArgs {
    /// Search results artifact (FeatureData[PAFAlignments])
    #[arg(long = "i-search-results", value_name = "ARTIFACT")]
    pub search_results: PathBuf,

    /// Reference taxonomy artifact (FeatureData[Taxonomy])
    #[arg(long = "i-reference-taxonomy", value_name = "ARTIFACT")]
    pub reference_taxonomy: PathBuf,

    #[command(flatten)]
    pub consensus: ConsensusArgs,

    /// Where to save the consensus taxonomy artifact
    #[arg(long = "o-consensus-taxonomy", value_name = "PATH")]
    pub consensus_taxonomy: PathBuf,
}

impl FindConsensusAnnotationArgs {
    #[must_use]
    pub fn to_call(&self) -> ActionCall {
        let call = ActionCall::new("find-consensus-annotation")
            .input("search_results", &self.search_results)
            .input("reference_taxonomy", &self.reference_taxonomy);
        self.consensus
            .apply(call)
            .output("consensus_taxonomy", &self.consensus_taxonomy)
    }
}

#[derive(Args, Debug)]
pub struct TrimArgs {
    /// Per-sample reads artifact with quality scores
    #[arg(long = "i-query-reads", value_name = "ARTIFACT")]
    pub query_reads: PathBuf,

    /// Number of threads
    #[arg(long = "p-n-threads", allow_negative_numbers = true)]
    pub n_threads: Option<i64>,

    /// Minimum mean read quality
    #[arg(long = "p-min-quality", allow_negative_numbers = true)]
    pub min_quality: Option<i64>,

    /// Maximum mean read quality
    #[arg(long = "p-max-quality", allow_negative_numbers = true)]
    pub max_quality: Option<i64>,

    /// Minimum read length
    #[arg(long = "p-min-length", allow_negative_numbers = true)]
    pub min_length: Option<i64>,

    /// Maximum read length
    #[arg(long = "p-max-length", allow_negative_numbers = true)]
    pub max_length: Option<i64>,

    /// Bases removed from the start of each read
    #[arg(long = "p-headcrop", allow_negative_numbers = true)]
    pub headcrop: Option<i64>,

    /// Bases removed from the end of each read
    #[arg(long = "p-tailcrop", allow_negative_numbers = true)]
    pub tailcrop: Option<i64>,

    /// Where to save the trimmed reads artifact
    #[arg(long = "o-trimmed-query-reads", value_name = "PATH")]
    pub trimmed_query_reads: PathBuf,
}

impl TrimArgs {
    #[must_use]
    pub fn to_call(&self) -> ActionCall {
        ActionCall::new("trim")
            .input("query_reads", &self.query_reads)
            .param_if_some("n_threads", self.n_threads)
            .param_if_some("min_quality", self.min_quality)
            .param_if_some("max_quality", self.max_quality)
            .param_if_some("min_length", self.min_length)
            .param_if_some("max_length", self.max_length)
            .param_if_some("headcrop", self.headcrop)
            .param_if_some("tailcrop", self.tailcrop)
            .output("trimmed_query_reads", &self.trimmed_query_reads)
    }
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Per-sample reads artifact
    #[arg(long = "i-sequences", value_name = "ARTIFACT")]
    pub sequences: PathBuf,

    /// Where to save the visualization artifact
    #[arg(long = "o-visualization", value_name = "PATH")]
    pub visualization: PathBuf,
}

impl StatsArgs {
    #[must_use]
    pub fn to_call(&self) -> ActionCall {
        ActionCall::new("stats")
            .input("sequences", &self.sequences)
            .output("visualization", &self.visualization)
    }
}

/// Dispatch a call through the builtin registry and report what was saved
///
/// # Errors
///
/// Returns an error if validation, a tool, or saving an output fails. No
/// output is left behind in that case.
#[allow(clippy::needless_pass_by_value)]
pub fn run(call: ActionCall, format: OutputFormat, verbose: bool) -> Result<()> {
    let registry = ActionRegistry::new();
    if verbose {
        eprintln!("Running {}...", call.action);
    }
    let outputs = registry.dispatch(&call)?;
    print_outputs(&outputs, format);
    Ok(())
}

fn print_outputs(outputs: &BTreeMap<String, Artifact>, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for artifact in outputs.values() {
                println!(
                    "Saved {} to: {}",
                    artifact.artifact_type(),
                    artifact.path().display()
                );
            }
        }
        OutputFormat::Json => {
            let json: Vec<_> = outputs
                .iter()
                .map(|(name, artifact)| {
                    serde_json::json!({
                        "output": name,
                        "type": artifact.artifact_type().as_str(),
                        "path": artifact.path().display().to_string(),
                        "signature": artifact.signature(),
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
        OutputFormat::Tsv => {
            println!("output\ttype\tpath");
            for (name, artifact) in outputs {
                println!(
                    "{}\t{}\t{}",
                    name,
                    artifact.artifact_type(),
                    artifact.path().display()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ParamValue;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("longread-qc").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_filter_reads_call() {
        let cli = parse(&[
            "filter-reads",
            "--i-query-reads",
            "reads.qza",
            "--i-index-database",
            "idx.qza",
            "--p-keep",
            "unmapped",
            "--p-min-per-identity",
            "0.9",
            "--p-mapping-preset",
            "map-hifi",
            "--o-filtered-query-reads",
            "out.qza",
        ]);
        let Commands::FilterReads(args) = cli.command else {
            panic!("wrong subcommand");
        };
        let call = args.to_call();
        assert_eq!(call.action, "filter-reads");
        assert_eq!(call.inputs["query_reads"], PathBuf::from("reads.qza"));
        assert_eq!(call.inputs["index_database"], PathBuf::from("idx.qza"));
        assert!(!call.inputs.contains_key("reference_reads"));
        assert_eq!(call.params["keep"], ParamValue::from("unmapped"));
        assert_eq!(call.params["min_per_identity"], ParamValue::Float(0.9));
        assert_eq!(call.params["mapping_preset"], ParamValue::from("map-hifi"));
        assert!(!call.params.contains_key("n_threads"));
        assert_eq!(call.outputs["filtered_query_reads"], PathBuf::from("out.qza"));
    }

    #[test]
    fn test_negative_parameter_reaches_registry() {
        let cli = parse(&[
            "extract-reads",
            "--i-sequences",
            "seqs.qza",
            "--i-reference-reads",
            "ref.qza",
            "--p-min-per-identity",
            "-0.5",
            "--o-extracted-seqs",
            "out.qza",
        ]);
        let Commands::ExtractReads(args) = cli.command else {
            panic!("wrong subcommand");
        };
        assert_eq!(
            args.to_call().params["min_per_identity"],
            ParamValue::Float(-0.5)
        );
    }

    #[test]
    fn test_classify_call_has_both_outputs() {
        let cli = parse(&[
            "classify-consensus",
            "--i-query",
            "q.qza",
            "--i-reference-reads",
            "ref.qza",
            "--i-reference-taxonomy",
            "tax.qza",
            "--p-output-no-hits",
            "false",
            "--p-unassignable-label",
            "NA",
            "--o-search-results",
            "hits.qza",
            "--o-classification",
            "cls.qza",
        ]);
        let Commands::ClassifyConsensus(args) = cli.command else {
            panic!("wrong subcommand");
        };
        let call = args.to_call();
        assert_eq!(call.params["output_no_hits"], ParamValue::Bool(false));
        assert_eq!(call.params["unassignable_label"], ParamValue::from("NA"));
        assert_eq!(call.outputs.len(), 2);
    }

    #[test]
    fn test_missing_output_is_a_usage_error() {
        let result = Cli::try_parse_from(["longread-qc", "stats", "--i-sequences", "reads.qza"]);
        assert!(result.is_err());
    }
}
