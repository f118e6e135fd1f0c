//! NanoPlot command line.

use std::path::{Path, PathBuf};

use crate::tools::{Tool, ToolInvocation};

/// `NanoPlot --fastq <files...> -o <dir>`
#[must_use]
pub fn stats(fastq_files: &[PathBuf], output_dir: &Path) -> ToolInvocation {
    ToolInvocation::new(Tool::NanoPlot)
        .arg("--fastq")
        .args(fastq_files)
        .arg("-o")
        .arg(output_dir)
}
