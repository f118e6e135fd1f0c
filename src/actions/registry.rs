//! Action registry and dispatch.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::actions::schema::{ActionSignature, OutputType, ResolvedParams};
use crate::actions::{
    build_index, classify, filter_reads, search, stats, trim, ActionCall, ActionContext,
    ActionError, Handler, ValidationError,
};
use crate::artifact::{Artifact, Provenance};
use crate::core::types::ArtifactType;
use crate::tools::ToolRunner;

/// A signature together with its handler
#[derive(Clone, Copy)]
pub struct RegisteredAction {
    pub signature: &'static ActionSignature,
    handler: Handler,
}

impl std::fmt::Debug for RegisteredAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredAction")
            .field("name", &self.signature.name)
            .finish_non_exhaustive()
    }
}

/// A call that passed validation; nothing has run yet
#[derive(Debug)]
pub struct ValidatedCall {
    pub action: RegisteredAction,
    pub inputs: BTreeMap<String, Artifact>,
    pub params: ResolvedParams,
    /// Output name, destination and the type it must have
    pub outputs: Vec<(&'static str, PathBuf, ArtifactType)>,
}

/// Map from action name to signature and handler
#[derive(Debug)]
pub struct ActionRegistry {
    actions: BTreeMap<&'static str, RegisteredAction>,
    runner: ToolRunner,
    scratch_root: Option<PathBuf>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    /// Registry with every built-in action, resolving tools from the environment
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty(ToolRunner::from_env());
        registry.register(&build_index::SIGNATURE, build_index::run);
        registry.register(&search::SIGNATURE, search::run);
        registry.register(&filter_reads::FILTER_SIGNATURE, filter_reads::run_filter);
        registry.register(&filter_reads::EXTRACT_SIGNATURE, filter_reads::run_extract);
        registry.register(&classify::CLASSIFY_SIGNATURE, classify::run_classify);
        registry.register(&classify::CONSENSUS_SIGNATURE, classify::run_find_consensus);
        registry.register(&trim::SIGNATURE, trim::run);
        registry.register(&stats::SIGNATURE, stats::run);
        registry
    }

    /// Registry without any actions
    #[must_use]
    pub fn empty(runner: ToolRunner) -> Self {
        Self {
            actions: BTreeMap::new(),
            runner,
            scratch_root: None,
        }
    }

    #[must_use]
    pub fn with_runner(mut self, runner: ToolRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Create per-call scratch directories under `root` instead of the
    /// system temporary directory
    #[must_use]
    pub fn with_scratch_root(mut self, root: &Path) -> Self {
        self.scratch_root = Some(root.to_path_buf());
        self
    }

    pub fn register(&mut self, signature: &'static ActionSignature, handler: Handler) {
        self.actions
            .insert(signature.name, RegisteredAction { signature, handler });
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static ActionSignature> {
        self.actions.get(name).map(|a| a.signature)
    }

    /// Signatures sorted by action name
    pub fn signatures(&self) -> impl Iterator<Item = &'static ActionSignature> + '_ {
        self.actions.values().map(|a| a.signature)
    }

    #[must_use]
    pub fn runner(&self) -> &ToolRunner {
        &self.runner
    }

    /// Check a call against its signature and load its inputs.
    ///
    /// Nothing is written and no tool is started.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Validation` for unknown actions, inputs,
    /// parameters or outputs, missing or mistyped inputs, out-of-range
    /// values and existing output paths, or `ActionError::Artifact` if an
    /// input cannot be loaded.
    pub fn validate(&self, call: &ActionCall) -> Result<ValidatedCall, ActionError> {
        let action = *self
            .actions
            .get(call.action.as_str())
            .ok_or_else(|| ValidationError::UnknownAction(call.action.clone()))?;
        let signature = action.signature;

        let params = resolve_params(signature, call)?;
        check_inputs(signature, call)?;

        let mut inputs = BTreeMap::new();
        for (name, path) in &call.inputs {
            let spec = signature
                .input(name)
                .ok_or_else(|| ValidationError::UnknownInput(name.clone()))?;
            let artifact = Artifact::load(path)?;
            if !spec.types.contains(&artifact.artifact_type()) {
                return Err(ValidationError::InputType {
                    input: name.clone(),
                    expected: spec
                        .types
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                    actual: artifact.artifact_type(),
                }
                .into());
            }
            inputs.insert(name.clone(), artifact);
        }

        let outputs = resolve_outputs(signature, call, &inputs)?;
        Ok(ValidatedCall {
            action,
            inputs,
            params,
            outputs,
        })
    }

    /// Validate, run the handler in a scratch directory and commit outputs.
    ///
    /// The scratch directory is removed on every exit path. If committing
    /// one output fails, outputs already committed by this call are removed.
    ///
    /// # Errors
    ///
    /// Returns the validation error, or whatever the handler, a tool or
    /// the artifact store reported.
    pub fn dispatch(&self, call: &ActionCall) -> Result<BTreeMap<String, Artifact>, ActionError> {
        let validated = self.validate(call)?;
        let signature = validated.action.signature;

        let scratch = match &self.scratch_root {
            Some(root) => {
                fs::create_dir_all(root)?;
                TempDir::new_in(root)?
            }
            None => TempDir::new()?,
        };
        info!("Running action {}", signature.name);
        debug!("Scratch directory: {}", scratch.path().display());

        let provenance = Provenance {
            action: signature.name.to_string(),
            parameters: validated.params.to_json(),
            inputs: validated
                .inputs
                .iter()
                .map(|(name, artifact)| (name.clone(), artifact.signature()))
                .collect(),
        };

        let context = ActionContext::new(
            signature,
            validated.inputs,
            validated.params,
            scratch.path(),
            &self.runner,
        );
        let mut staged = (validated.action.handler)(&context)?;

        for (name, _, expected) in &validated.outputs {
            let output = staged
                .get(name)
                .ok_or_else(|| ActionError::OutputNotProduced {
                    action: signature.name.to_string(),
                    output: (*name).to_string(),
                })?;
            if output.artifact_type() != *expected {
                return Err(ActionError::OutputTypeMismatch {
                    action: signature.name.to_string(),
                    output: (*name).to_string(),
                    expected: *expected,
                    actual: output.artifact_type(),
                });
            }
        }

        let mut committed: BTreeMap<String, Artifact> = BTreeMap::new();
        for (name, dest, _) in validated.outputs {
            let Some(output) = staged.remove(name) else {
                continue;
            };
            match output.commit(&dest, provenance.clone()) {
                Ok(artifact) => {
                    info!("Saved {} to {}", artifact.artifact_type(), dest.display());
                    committed.insert(name.to_string(), artifact);
                }
                Err(e) => {
                    for artifact in committed.values() {
                        let _ = fs::remove_dir_all(artifact.path());
                    }
                    return Err(e.into());
                }
            }
        }
        Ok(committed)
    }
}

fn check_inputs(signature: &ActionSignature, call: &ActionCall) -> Result<(), ValidationError> {
    if let Some(name) = call.inputs.keys().find(|n| signature.input(n).is_none()) {
        return Err(ValidationError::UnknownInput(name.clone()));
    }
    for &(a, b) in signature.exclusive_inputs {
        if call.inputs.contains_key(a) == call.inputs.contains_key(b) {
            return Err(ValidationError::ExclusiveInputs(a, b));
        }
    }
    for spec in signature.inputs.iter().filter(|s| s.required) {
        if !call.inputs.contains_key(spec.name) {
            return Err(ValidationError::MissingInput(spec.name.to_string()));
        }
    }
    Ok(())
}

fn resolve_params(
    signature: &ActionSignature,
    call: &ActionCall,
) -> Result<ResolvedParams, ValidationError> {
    if let Some(name) = call.params.keys().find(|n| signature.parameter(n).is_none()) {
        return Err(ValidationError::UnknownParameter(name.clone()));
    }

    let mut params = ResolvedParams::default();
    for spec in signature.parameters {
        let value = match call.params.get(spec.name) {
            Some(value) => Some(spec.check(value.clone())?),
            None => spec.default.value(),
        };
        params.insert(spec.name, value);
    }
    Ok(params)
}

fn resolve_outputs(
    signature: &ActionSignature,
    call: &ActionCall,
    inputs: &BTreeMap<String, Artifact>,
) -> Result<Vec<(&'static str, PathBuf, ArtifactType)>, ValidationError> {
    if let Some(name) = call.outputs.keys().find(|n| signature.output(n).is_none()) {
        return Err(ValidationError::UnknownOutput(name.clone()));
    }

    let mut seen: HashSet<&Path> = HashSet::new();
    let mut outputs = Vec::new();
    for spec in signature.outputs {
        let dest = call
            .outputs
            .get(spec.name)
            .ok_or_else(|| ValidationError::MissingOutput(spec.name.to_string()))?;
        if dest.exists() {
            return Err(ValidationError::OutputExists(dest.display().to_string()));
        }
        if !seen.insert(dest.as_path()) {
            let other = signature
                .outputs
                .iter()
                .find(|o| call.outputs.get(o.name) == Some(dest))
                .map_or("", |o| o.name);
            return Err(ValidationError::DuplicateOutputPath(
                other.to_string(),
                spec.name.to_string(),
            ));
        }

        let artifact_type = match spec.output_type {
            OutputType::Fixed(ty) => ty,
            OutputType::SameAs(input) => inputs
                .get(input)
                .map(Artifact::artifact_type)
                .ok_or_else(|| ValidationError::MissingInput(input.to_string()))?,
        };
        outputs.push((spec.name, dest.clone(), artifact_type));
    }
    Ok(outputs)
}
