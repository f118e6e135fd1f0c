//! chopper command line. Reads FASTQ on stdin and writes FASTQ on stdout.

use crate::tools::{Tool, ToolInvocation};

/// Trimming thresholds, passed through verbatim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimOptions {
    pub min_quality: i64,
    pub max_quality: i64,
    pub min_length: i64,
    pub max_length: i64,
    pub headcrop: i64,
    pub tailcrop: i64,
    pub n_threads: i64,
}

impl Default for TrimOptions {
    fn default() -> Self {
        Self {
            min_quality: 0,
            max_quality: 1000,
            min_length: 1,
            max_length: 2_147_483_647,
            headcrop: 0,
            tailcrop: 0,
            n_threads: 4,
        }
    }
}

/// `chopper --quality q --maxqual Q --minlength l --maxlength L --headcrop h --tailcrop t --threads n`
#[must_use]
pub fn trim(options: &TrimOptions) -> ToolInvocation {
    ToolInvocation::new(Tool::Chopper)
        .option("--quality", options.min_quality)
        .option("--maxqual", options.max_quality)
        .option("--minlength", options.min_length)
        .option("--maxlength", options.max_length)
        .option("--headcrop", options.headcrop)
        .option("--tailcrop", options.tailcrop)
        .option("--threads", options.n_threads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_trim_command() {
        assert_eq!(
            trim(&TrimOptions::default()).to_string(),
            "chopper --quality 0 --maxqual 1000 --minlength 1 --maxlength 2147483647 \
             --headcrop 0 --tailcrop 0 --threads 4"
        );
    }

    #[test]
    fn test_custom_trim_command() {
        let options = TrimOptions {
            min_quality: 10,
            headcrop: 25,
            n_threads: 1,
            ..TrimOptions::default()
        };
        let args = trim(&options).args_lossy();
        assert_eq!(&args[0..2], &["--quality", "10"]);
        assert_eq!(&args[8..10], &["--headcrop", "25"]);
        assert_eq!(&args[12..14], &["--threads", "1"]);
    }
}
