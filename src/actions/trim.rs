//! `trim`: quality and length trimming of per-sample reads with chopper.

use std::io::{self, Read};

use tracing::{debug, info};

use crate::actions::common::{at_least, n_threads, read_files, require_fastq, SAMPLE_READS};
use crate::actions::schema::{
    ActionSignature, InputSpec, OutputSpec, OutputType, ParamDefault, ParamSpec,
};
use crate::actions::{ActionContext, ActionError, ActionOutputs};
use crate::artifact::manifest::{samples, SampleSetWriter};
use crate::core::sequence::SequenceCollection;
use crate::core::types::ReadDirection;
use crate::formats::fastq::read_fastq_from;
use crate::formats::{open_reader, ParseError};
use crate::results::resync::resync_mates;
use crate::tools::chopper::{self, TrimOptions};

const fn int_param(
    name: &'static str,
    min: i64,
    default: i64,
    description: &'static str,
) -> ParamSpec {
    ParamSpec {
        name,
        kind: at_least(min),
        default: ParamDefault::Int(default),
        description,
    }
}

pub static SIGNATURE: ActionSignature = ActionSignature {
    name: "trim",
    description: "Filter and trim long reads by quality and length with chopper",
    inputs: &[InputSpec {
        name: "query_reads",
        types: SAMPLE_READS,
        required: true,
        description: "Per-sample reads with quality scores",
    }],
    parameters: &[
        n_threads(4),
        int_param("min_quality", 0, 0, "Minimum mean read quality"),
        int_param("max_quality", 0, 1000, "Maximum mean read quality"),
        int_param("min_length", 1, 1, "Minimum read length"),
        int_param("max_length", 1, 2_147_483_647, "Maximum read length"),
        int_param("headcrop", 0, 0, "Bases removed from the start of each read"),
        int_param("tailcrop", 0, 0, "Bases removed from the end of each read"),
    ],
    outputs: &[OutputSpec {
        name: "trimmed_query_reads",
        output_type: OutputType::SameAs("query_reads"),
        description: "Trimmed reads",
    }],
    exclusive_inputs: &[],
};

fn trim_options(ctx: &ActionContext<'_>) -> Result<TrimOptions, ActionError> {
    let params = ctx.params();
    Ok(TrimOptions {
        min_quality: params.int("min_quality")?,
        max_quality: params.int("max_quality")?,
        min_length: params.int("min_length")?,
        max_length: params.int("max_length")?,
        headcrop: params.int("headcrop")?,
        tailcrop: params.int("tailcrop")?,
        n_threads: params.int("n_threads")?,
    })
}

/// Stream one gzip FASTQ file through chopper and parse what comes out
fn trim_file(
    ctx: &ActionContext<'_>,
    options: &TrimOptions,
    path: &std::path::Path,
) -> Result<SequenceCollection, ActionError> {
    let input = path.to_path_buf();
    let (stdout, _) = ctx.runner().run_streaming(
        &chopper::trim(options),
        move |mut stdin| {
            let mut reader = open_reader(&input)?;
            io::copy(&mut reader, &mut stdin)?;
            Ok(())
        },
        |stdout| {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf)?;
            Ok(buf)
        },
    )?;
    let reads = read_fastq_from(stdout.as_slice()).map_err(ParseError::from)?;
    Ok(reads)
}

/// # Errors
///
/// Returns a `FormatError` if any read file lacks quality scores (before
/// chopper runs), a tool error, or a `ParseError` if chopper's output is
/// not FASTQ.
pub fn run(ctx: &ActionContext<'_>) -> Result<ActionOutputs, ActionError> {
    let input = ctx.input("query_reads")?;
    let samples = samples(input)?;
    require_fastq(&samples)?;
    let options = trim_options(ctx)?;

    let staged = ctx.stage("trimmed_query_reads", input.artifact_type())?;
    let mut writer = SampleSetWriter::new(staged.data_dir());

    for sample in &samples {
        let mut trimmed = read_files(sample)
            .iter()
            .map(|path| trim_file(ctx, &options, path))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Sample {}: {:?} reads after trimming",
            sample.sample_id,
            trimmed.iter().map(SequenceCollection::len).collect::<Vec<_>>()
        );

        match (trimmed.pop(), trimmed.pop()) {
            (Some(reverse), Some(forward)) => {
                let synced = resync_mates(forward, reverse);
                if synced.orphans > 0 {
                    info!(
                        "Sample {}: dropped {} reads whose mate was trimmed away",
                        sample.sample_id, synced.orphans
                    );
                }
                writer.write_reads(&sample.sample_id, ReadDirection::Forward, &synced.forward)?;
                writer.write_reads(&sample.sample_id, ReadDirection::Reverse, &synced.reverse)?;
            }
            (Some(forward), None) => {
                writer.write_reads(&sample.sample_id, ReadDirection::Forward, &forward)?;
            }
            (None, _) => {}
        }
    }
    writer.finish()?;

    Ok(ActionOutputs::from([("trimmed_query_reads", staged)]))
}
