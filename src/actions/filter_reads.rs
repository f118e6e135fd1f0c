//! `filter-reads` and `extract-reads`: align reads, select mapped or
//! unmapped ones, and convert the selection back to sequences.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::actions::common::{
    n_threads, read_files, reference_target, require_fastq, scoring_options, selection,
    GAP_EXTENSION_PENALTY, GAP_OPEN_PENALTY, INDEX_DATABASE_INPUT, MAPPING_PRESET,
    MATCHING_SCORE, MIN_PER_IDENTITY, MISMATCHING_PENALTY, REFERENCE_CHOICE,
    REFERENCE_READS_INPUT, SAMPLE_READS,
};
use crate::actions::schema::{ActionSignature, InputSpec, OutputSpec, OutputType};
use crate::actions::{ActionContext, ActionError, ActionOutputs};
use crate::artifact::manifest::{samples, SampleSetWriter};
use crate::artifact::SEQUENCES_FILE;
use crate::core::types::{ArtifactType, MappingPreset, ReadDirection, ReadSelection};
use crate::formats::fasta::{read_fasta, write_fasta};
use crate::formats::fastq::read_fastq;
use crate::formats::sam::{read_sam, write_sam};
use crate::formats::ParseError;
use crate::results::sam_filter::{select, AlignmentFilter};
use crate::tools::minimap2::{self, ReferenceTarget, ScoringOptions};
use crate::tools::samtools::{self, ConvertFormat, ConvertOutputs};

pub static FILTER_SIGNATURE: ActionSignature = ActionSignature {
    name: "filter-reads",
    description: "Keep reads that do or do not align to a reference",
    inputs: &[
        InputSpec {
            name: "query_reads",
            types: SAMPLE_READS,
            required: true,
            description: "Per-sample reads with quality scores",
        },
        INDEX_DATABASE_INPUT,
        REFERENCE_READS_INPUT,
    ],
    parameters: &[
        n_threads(3),
        MAPPING_PRESET,
        selection("keep", "Keep mapped or unmapped reads"),
        MIN_PER_IDENTITY,
        MATCHING_SCORE,
        MISMATCHING_PENALTY,
        GAP_OPEN_PENALTY,
        GAP_EXTENSION_PENALTY,
    ],
    outputs: &[OutputSpec {
        name: "filtered_query_reads",
        output_type: OutputType::SameAs("query_reads"),
        description: "Selected reads",
    }],
    exclusive_inputs: REFERENCE_CHOICE,
};

pub static EXTRACT_SIGNATURE: ActionSignature = ActionSignature {
    name: "extract-reads",
    description: "Extract sequences that do or do not align to a reference",
    inputs: &[
        InputSpec {
            name: "sequences",
            types: &[ArtifactType::FeatureSequences],
            required: true,
            description: "Sequences to screen",
        },
        INDEX_DATABASE_INPUT,
        REFERENCE_READS_INPUT,
    ],
    parameters: &[
        n_threads(3),
        MAPPING_PRESET,
        selection("extract", "Extract mapped or unmapped sequences"),
        MIN_PER_IDENTITY,
        MATCHING_SCORE,
        MISMATCHING_PENALTY,
        GAP_OPEN_PENALTY,
        GAP_EXTENSION_PENALTY,
    ],
    outputs: &[OutputSpec {
        name: "extracted_seqs",
        output_type: OutputType::Fixed(ArtifactType::FeatureSequences),
        description: "Selected sequences",
    }],
    exclusive_inputs: REFERENCE_CHOICE,
};

/// Alignment settings shared by both actions
struct Alignment {
    preset: MappingPreset,
    target: ReferenceTarget,
    n_threads: i64,
    scoring: ScoringOptions,
    filter: AlignmentFilter,
}

impl Alignment {
    fn from_context(ctx: &ActionContext<'_>, selection_param: &str) -> Result<Self, ActionError> {
        let params = ctx.params();
        Ok(Self {
            preset: params.choice("mapping_preset")?,
            target: reference_target(ctx)?,
            n_threads: params.int("n_threads")?,
            scoring: scoring_options(ctx),
            filter: AlignmentFilter {
                keep: params.choice::<ReadSelection>(selection_param)?,
                min_identity: params.opt_float(MIN_PER_IDENTITY.name),
            },
        })
    }

    /// Align `reads`, select records and write the selection as SAM.
    ///
    /// Two read files are aligned as mates of one pair.
    fn select_to_sam(
        &self,
        ctx: &ActionContext<'_>,
        reads: &[PathBuf],
        label: &str,
    ) -> Result<PathBuf, ActionError> {
        let aligned = ctx.scratch().join(format!("{label}.sam"));
        ctx.runner().run(&minimap2::align(
            self.preset,
            &self.target,
            reads,
            self.n_threads,
            &self.scoring,
            &aligned,
        ))?;

        let sam = read_sam(&aligned)?;
        let paired = reads.len() > 1;
        let (kept, summary) = select(&sam.records, &self.filter, paired);
        info!(
            "{}: kept {} of {} primary alignments ({})",
            label, summary.kept, summary.primary, self.filter.keep
        );

        let selected = ctx.scratch().join(format!("{label}.selected.sam"));
        write_sam(&selected, &sam.header, &kept)?;
        Ok(selected)
    }

    fn convert(
        &self,
        ctx: &ActionContext<'_>,
        format: ConvertFormat,
        sam: &Path,
        outputs: &ConvertOutputs,
        label: &str,
    ) -> Result<(), ActionError> {
        let singletons = ctx
            .scratch()
            .join(format!("{label}.singletons.{}", format.subcommand()));
        ctx.runner().run(&samtools::convert(
            format,
            sam,
            outputs,
            &singletons,
            self.n_threads,
        ))?;
        Ok(())
    }
}

fn require_output(path: &Path) -> Result<(), ParseError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ParseError::MissingOutput(path.display().to_string()))
    }
}

/// # Errors
///
/// Returns a `FormatError` if any read file lacks quality scores (before
/// any tool runs), a tool error, or a `ParseError` for missing output.
pub fn run_filter(ctx: &ActionContext<'_>) -> Result<ActionOutputs, ActionError> {
    let input = ctx.input("query_reads")?;
    let samples = samples(input)?;
    require_fastq(&samples)?;

    let alignment = Alignment::from_context(ctx, "keep")?;
    let staged = ctx.stage("filtered_query_reads", input.artifact_type())?;
    let mut writer = SampleSetWriter::new(staged.data_dir());

    for sample in &samples {
        let label = format!("sample-{}", sample.sample_id);
        let selected = alignment.select_to_sam(ctx, &read_files(sample), &label)?;

        if sample.reverse.is_some() {
            let forward = ctx.scratch().join(format!("{label}.R1.fastq"));
            let reverse = ctx.scratch().join(format!("{label}.R2.fastq"));
            let outputs = ConvertOutputs::Paired {
                forward: forward.clone(),
                reverse: reverse.clone(),
            };
            alignment.convert(ctx, ConvertFormat::Fastq, &selected, &outputs, &label)?;
            for (path, direction) in [
                (&forward, ReadDirection::Forward),
                (&reverse, ReadDirection::Reverse),
            ] {
                require_output(path)?;
                let reads = read_fastq(path).map_err(ParseError::from)?;
                writer.write_reads(&sample.sample_id, direction, &reads)?;
            }
        } else {
            let single = ctx.scratch().join(format!("{label}.fastq"));
            let outputs = ConvertOutputs::Single(single.clone());
            alignment.convert(ctx, ConvertFormat::Fastq, &selected, &outputs, &label)?;
            require_output(&single)?;
            let reads = read_fastq(&single).map_err(ParseError::from)?;
            writer.write_reads(&sample.sample_id, ReadDirection::Forward, &reads)?;
        }
    }
    writer.finish()?;

    Ok(ActionOutputs::from([("filtered_query_reads", staged)]))
}

/// # Errors
///
/// Returns a tool error, or a `ParseError` for missing or malformed output.
pub fn run_extract(ctx: &ActionContext<'_>) -> Result<ActionOutputs, ActionError> {
    let sequences = ctx.input("sequences")?.payload(SEQUENCES_FILE)?;
    let alignment = Alignment::from_context(ctx, "extract")?;

    let selected = alignment.select_to_sam(ctx, &[sequences], "sequences")?;
    let fasta = ctx.scratch().join("extracted.fasta");
    alignment.convert(
        ctx,
        ConvertFormat::Fasta,
        &selected,
        &ConvertOutputs::Single(fasta.clone()),
        "sequences",
    )?;
    require_output(&fasta)?;
    let records = read_fasta(&fasta).map_err(ParseError::from)?;

    let staged = ctx.stage("extracted_seqs", ArtifactType::FeatureSequences)?;
    write_fasta(&staged.file(SEQUENCES_FILE), &records)?;
    Ok(ActionOutputs::from([("extracted_seqs", staged)]))
}
