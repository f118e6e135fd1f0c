//! Actions: typed signatures, validation and dispatch to handlers.
//!
//! Every action is a static [`ActionSignature`] paired with a handler
//! function. [`ActionRegistry`] validates an [`ActionCall`] against the
//! signature before any scratch directory or subprocess exists, then runs
//! the handler in a scoped working directory and commits its outputs.
//!
//! | Action | Module |
//! |--------|--------|
//! | `build-index` | [`build_index`] |
//! | `search` | [`search`] |
//! | `filter-reads`, `extract-reads` | [`filter_reads`] |
//! | `classify-consensus`, `find-consensus-annotation` | [`classify`] |
//! | `trim` | [`trim`] |
//! | `stats` | [`stats`] |

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::artifact::{Artifact, ArtifactError, StagedArtifact};
use crate::core::types::ArtifactType;
use crate::formats::{FormatError, ParseError};
use crate::tools::{ToolError, ToolRunner};

pub mod build_index;
pub mod classify;
pub mod common;
pub mod filter_reads;
pub mod registry;
pub mod schema;
pub mod search;
pub mod stats;
pub mod trim;

pub use registry::ActionRegistry;
pub use schema::{ActionSignature, ParamValue, ResolvedParams};

/// A call was rejected before anything ran
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    #[error("Missing required input '{0}'")]
    MissingInput(String),

    #[error("Unknown input '{0}'")]
    UnknownInput(String),

    #[error("Input '{input}' must be one of [{expected}], got {actual}")]
    InputType {
        input: String,
        expected: String,
        actual: ArtifactType,
    },

    #[error("Exactly one of '{0}' or '{1}' must be provided")]
    ExclusiveInputs(&'static str, &'static str),

    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("Parameter '{0}' is not set")]
    MissingParameter(String),

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Missing output path for '{0}'")]
    MissingOutput(String),

    #[error("Unknown output '{0}'")]
    UnknownOutput(String),

    #[error("Output path already exists: {0}")]
    OutputExists(String),

    #[error("Outputs '{0}' and '{1}' use the same path")]
    DuplicateOutputPath(String, String),
}

/// Anything that can stop an action
#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Action '{action}' did not produce output '{output}'")]
    OutputNotProduced { action: String, output: String },

    #[error("Action '{action}' produced {actual} for output '{output}', declared {expected}")]
    OutputTypeMismatch {
        action: String,
        output: String,
        expected: ArtifactType,
        actual: ArtifactType,
    },
}

/// A request to run one action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionCall {
    pub action: String,
    /// Input name → artifact path
    pub inputs: BTreeMap<String, PathBuf>,
    pub params: BTreeMap<String, ParamValue>,
    /// Output name → destination path (must not exist)
    pub outputs: BTreeMap<String, PathBuf>,
}

impl ActionCall {
    #[must_use]
    pub fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn input(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.inputs.insert(name.to_string(), path.into());
        self
    }

    #[must_use]
    pub fn input_if_some(self, name: &str, path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => self.input(name, path),
            None => self,
        }
    }

    #[must_use]
    pub fn param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn param_if_some<T: Into<ParamValue>>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    #[must_use]
    pub fn output(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.outputs.insert(name.to_string(), path.into());
        self
    }
}

/// Staged outputs returned by a handler, keyed by output name
pub type ActionOutputs = BTreeMap<&'static str, StagedArtifact>;

/// Handler entry point
pub type Handler = fn(&ActionContext<'_>) -> Result<ActionOutputs, ActionError>;

/// Everything a handler may use: validated inputs and parameters, the
/// scratch directory and the tool runner
#[derive(Debug)]
pub struct ActionContext<'a> {
    signature: &'static ActionSignature,
    inputs: BTreeMap<String, Artifact>,
    params: ResolvedParams,
    scratch: &'a Path,
    runner: &'a ToolRunner,
}

impl<'a> ActionContext<'a> {
    pub(crate) fn new(
        signature: &'static ActionSignature,
        inputs: BTreeMap<String, Artifact>,
        params: ResolvedParams,
        scratch: &'a Path,
        runner: &'a ToolRunner,
    ) -> Self {
        Self {
            signature,
            inputs,
            params,
            scratch,
            runner,
        }
    }

    #[must_use]
    pub fn action_name(&self) -> &'static str {
        self.signature.name
    }

    /// A required input
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingInput` if the input was not given.
    pub fn input(&self, name: &str) -> Result<&Artifact, ValidationError> {
        self.inputs
            .get(name)
            .ok_or_else(|| ValidationError::MissingInput(name.to_string()))
    }

    #[must_use]
    pub fn optional_input(&self, name: &str) -> Option<&Artifact> {
        self.inputs.get(name)
    }

    #[must_use]
    pub fn params(&self) -> &ResolvedParams {
        &self.params
    }

    #[must_use]
    pub fn scratch(&self) -> &Path {
        self.scratch
    }

    #[must_use]
    pub fn runner(&self) -> &ToolRunner {
        self.runner
    }

    /// Create a staged artifact for an output
    ///
    /// # Errors
    ///
    /// Returns an IO error if the staging directory cannot be created.
    pub fn stage(&self, output: &str, artifact_type: ArtifactType) -> io::Result<StagedArtifact> {
        StagedArtifact::new(artifact_type, self.scratch, &format!("output-{output}"))
    }
}
