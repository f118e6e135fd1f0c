//! External binaries and how to call them.
//!
//! The set of programs is closed: every invocation names a [`Tool`] variant,
//! so a binary name is never taken from user data. Arguments are kept as a
//! discrete `OsString` list and passed straight to `execve`; no shell is
//! involved.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;

use thiserror::Error;

pub mod chopper;
pub mod minimap2;
pub mod nanoplot;
pub mod runner;
pub mod samtools;

pub use runner::{ToolOutput, ToolRunner};

/// Environment variable naming a directory that holds the tool binaries
pub const TOOLS_DIR_ENV: &str = "LONGREAD_QC_TOOLS_DIR";

/// External programs this crate knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Minimap2,
    Samtools,
    Chopper,
    NanoPlot,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Self::Minimap2, Self::Samtools, Self::Chopper, Self::NanoPlot];

    /// Executable file name
    #[must_use]
    pub fn binary_name(self) -> &'static str {
        match self {
            Self::Minimap2 => "minimap2",
            Self::Samtools => "samtools",
            Self::Chopper => "chopper",
            Self::NanoPlot => "NanoPlot",
        }
    }

    /// What the tool is used for, for `tools` listings
    #[must_use]
    pub fn purpose(self) -> &'static str {
        match self {
            Self::Minimap2 => "index building, search and read alignment",
            Self::Samtools => "SAM to FASTA/FASTQ conversion",
            Self::Chopper => "quality and length trimming",
            Self::NanoPlot => "read statistics report",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}

/// An external tool could not be run or reported failure
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{tool} not found ({source}); install it or point {TOOLS_DIR_ENV} at its directory")]
    NotFound { tool: Tool, source: io::Error },

    #[error("Failed to start {tool}: {source}")]
    Spawn { tool: Tool, source: io::Error },

    #[error("{tool} failed with {}:\n{stderr}", describe_exit(.code))]
    Failed {
        tool: Tool,
        code: Option<i32>,
        stderr: String,
    },

    #[error("IO error while streaming data through {tool}: {source}")]
    Stream { tool: Tool, source: io::Error },
}

/// A fully built command line for one tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    tool: Tool,
    args: Vec<OsString>,
}

impl ToolInvocation {
    #[must_use]
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Append `flag value`
    #[must_use]
    pub fn option(self, flag: &str, value: impl fmt::Display) -> Self {
        self.arg(flag).arg(value.to_string())
    }

    /// Append `flag value` only when a value is given
    #[must_use]
    pub fn option_if_some<T: fmt::Display>(self, flag: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.option(flag, v),
            None => self,
        }
    }

    /// Append `flag` only when `enabled`
    #[must_use]
    pub fn flag_if(self, flag: &str, enabled: bool) -> Self {
        if enabled {
            self.arg(flag)
        } else {
            self
        }
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    #[must_use]
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Arguments as lossy strings, for assertions and logs
    #[must_use]
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tool)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
