//! `stats`: NanoPlot report over per-sample reads.

use crate::actions::common::{read_files, require_fastq, SAMPLE_READS};
use crate::actions::schema::{ActionSignature, InputSpec, OutputSpec, OutputType};
use crate::actions::{ActionContext, ActionError, ActionOutputs};
use crate::artifact::manifest::samples;
use crate::core::types::ArtifactType;
use crate::results::report::build_visualization;
use crate::tools::nanoplot;

pub static SIGNATURE: ActionSignature = ActionSignature {
    name: "stats",
    description: "Summary statistics and plots of read quality with NanoPlot",
    inputs: &[InputSpec {
        name: "sequences",
        types: SAMPLE_READS,
        required: true,
        description: "Per-sample reads with quality scores",
    }],
    parameters: &[],
    outputs: &[OutputSpec {
        name: "visualization",
        output_type: OutputType::Fixed(ArtifactType::Visualization),
        description: "NanoPlot report",
    }],
    exclusive_inputs: &[],
};

/// # Errors
///
/// Returns a `FormatError` for FASTA input, a tool error if NanoPlot fails,
/// or a `ParseError` if it produced no report.
pub fn run(ctx: &ActionContext<'_>) -> Result<ActionOutputs, ActionError> {
    let samples = samples(ctx.input("sequences")?)?;
    require_fastq(&samples)?;

    let files: Vec<_> = samples.iter().flat_map(read_files).collect();
    let report = ctx.scratch().join("nanoplot");
    ctx.runner().run(&nanoplot::stats(&files, &report))?;

    let staged = ctx.stage("visualization", ArtifactType::Visualization)?;
    build_visualization(&report, staged.data_dir())?;
    Ok(ActionOutputs::from([("visualization", staged)]))
}
