//! samtools command lines: SAM to FASTA/FASTQ conversion.

use std::path::{Path, PathBuf};

use crate::tools::{Tool, ToolInvocation};

/// Output flavour of `samtools fasta|fastq`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertFormat {
    Fasta,
    Fastq,
}

impl ConvertFormat {
    #[must_use]
    pub fn subcommand(self) -> &'static str {
        match self {
            Self::Fasta => "fasta",
            Self::Fastq => "fastq",
        }
    }
}

/// Where converted reads go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutputs {
    /// Reads flagged neither READ1 nor READ2 (`-0`)
    Single(PathBuf),
    /// READ1 / READ2 mates (`-1`, `-2`)
    Paired { forward: PathBuf, reverse: PathBuf },
}

/// `samtools fasta|fastq [-0 f] [-1 f -2 f] -s <singletons> -@ <n> -n <in.sam>`
///
/// `-n` keeps read names as they are (no `/1`, `/2` suffixes).
#[must_use]
pub fn convert(
    format: ConvertFormat,
    input: &Path,
    outputs: &ConvertOutputs,
    singletons: &Path,
    n_threads: i64,
) -> ToolInvocation {
    let invocation = ToolInvocation::new(Tool::Samtools).arg(format.subcommand());
    let invocation = match outputs {
        ConvertOutputs::Single(path) => invocation.arg("-0").arg(path),
        ConvertOutputs::Paired { forward, reverse } => {
            invocation.arg("-1").arg(forward).arg("-2").arg(reverse)
        }
    };
    invocation
        .arg("-s")
        .arg(singletons)
        .option("-@", n_threads)
        .arg("-n")
        .arg(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_single() {
        let inv = convert(
            ConvertFormat::Fasta,
            Path::new("kept.sam"),
            &ConvertOutputs::Single(PathBuf::from("out.fasta")),
            Path::new("singletons.fasta"),
            3,
        );
        assert_eq!(
            inv.to_string(),
            "samtools fasta -0 out.fasta -s singletons.fasta -@ 3 -n kept.sam"
        );
    }

    #[test]
    fn test_convert_paired() {
        let inv = convert(
            ConvertFormat::Fastq,
            Path::new("kept.sam"),
            &ConvertOutputs::Paired {
                forward: PathBuf::from("R1.fastq"),
                reverse: PathBuf::from("R2.fastq"),
            },
            Path::new("singletons.fastq"),
            2,
        );
        assert_eq!(
            inv.args_lossy(),
            vec![
                "fastq",
                "-1",
                "R1.fastq",
                "-2",
                "R2.fastq",
                "-s",
                "singletons.fastq",
                "-@",
                "2",
                "-n",
                "kept.sam"
            ]
        );
    }
}
