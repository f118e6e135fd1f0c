//! Static action signatures and parameter validation.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::actions::ValidationError;
use crate::core::types::ArtifactType;

/// Declared interface of an action
#[derive(Debug)]
pub struct ActionSignature {
    pub name: &'static str,
    pub description: &'static str,
    pub inputs: &'static [InputSpec],
    pub parameters: &'static [ParamSpec],
    pub outputs: &'static [OutputSpec],
    /// Pairs of inputs of which exactly one must be given
    pub exclusive_inputs: &'static [(&'static str, &'static str)],
}

impl ActionSignature {
    #[must_use]
    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn output(&self, name: &str) -> Option<&OutputSpec> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

#[derive(Debug)]
pub struct InputSpec {
    pub name: &'static str,
    /// Accepted artifact types
    pub types: &'static [ArtifactType],
    pub required: bool,
    pub description: &'static str,
}

/// Type of an output, fixed or taken from an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Fixed(ArtifactType),
    SameAs(&'static str),
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(ty) => write!(f, "{ty}"),
            Self::SameAs(input) => write!(f, "same type as {input}"),
        }
    }
}

#[derive(Debug)]
pub struct OutputSpec {
    pub name: &'static str,
    pub output_type: OutputType,
    pub description: &'static str,
}

/// End of a float range
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Inclusive(f64),
    Exclusive(f64),
}

/// Accepted values of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Int {
        min: Option<i64>,
        max: Option<i64>,
    },
    Float {
        min: Option<Bound>,
        max: Option<Bound>,
    },
    Choice(&'static [&'static str]),
    Bool,
    Str,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int { min, max } => {
                write!(f, "Int")?;
                match (min, max) {
                    (Some(lo), Some(hi)) => write!(f, " in [{lo}, {hi}]"),
                    (Some(lo), None) => write!(f, " >= {lo}"),
                    (None, Some(hi)) => write!(f, " <= {hi}"),
                    (None, None) => Ok(()),
                }
            }
            Self::Float { min, max } => {
                write!(f, "Float")?;
                if min.is_none() && max.is_none() {
                    return Ok(());
                }
                let open = match min {
                    Some(Bound::Inclusive(v)) => format!("[{v}"),
                    Some(Bound::Exclusive(v)) => format!("({v}"),
                    None => "(-inf".to_string(),
                };
                let close = match max {
                    Some(Bound::Inclusive(v)) => format!("{v}]"),
                    Some(Bound::Exclusive(v)) => format!("{v})"),
                    None => "inf)".to_string(),
                };
                write!(f, " in {open}, {close}")
            }
            Self::Choice(choices) => write!(f, "one of {}", choices.join("|")),
            Self::Bool => write!(f, "Bool"),
            Self::Str => write!(f, "Str"),
        }
    }
}

/// Default of a parameter; `None` leaves the parameter unset
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    None,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(&'static str),
}

impl ParamDefault {
    #[must_use]
    pub fn value(self) -> Option<ParamValue> {
        match self {
            Self::None => None,
            Self::Int(v) => Some(ParamValue::Int(v)),
            Self::Float(v) => Some(ParamValue::Float(v)),
            Self::Bool(v) => Some(ParamValue::Bool(v)),
            Self::Str(v) => Some(ParamValue::Str(v.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: ParamDefault,
    pub description: &'static str,
}

/// A parameter value supplied by a caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

fn below(value: f64, bound: Bound) -> bool {
    match bound {
        Bound::Inclusive(b) => value < b,
        Bound::Exclusive(b) => value <= b,
    }
}

fn above(value: f64, bound: Bound) -> bool {
    match bound {
        Bound::Inclusive(b) => value > b,
        Bound::Exclusive(b) => value >= b,
    }
}

impl ParamSpec {
    /// Check a value against this parameter's kind, normalising integers
    /// given for float parameters.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidParameter` if the value has the
    /// wrong type, lies outside the range, or is not one of the choices.
    pub fn check(&self, value: ParamValue) -> Result<ParamValue, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidParameter {
            name: self.name.to_string(),
            reason,
        };

        match (self.kind, value) {
            (ParamKind::Int { min, max }, ParamValue::Int(v)) => {
                if min.is_some_and(|lo| v < lo) || max.is_some_and(|hi| v > hi) {
                    return Err(invalid(format!("{v} is outside {}", self.kind)));
                }
                Ok(ParamValue::Int(v))
            }
            (ParamKind::Float { min, max }, value @ (ParamValue::Float(_) | ParamValue::Int(_))) => {
                let v = value_as_float(&value).unwrap_or(f64::NAN);
                if !v.is_finite() {
                    return Err(invalid(format!("{v} is not a finite number")));
                }
                if min.is_some_and(|b| below(v, b)) || max.is_some_and(|b| above(v, b)) {
                    return Err(invalid(format!("{v} is outside {}", self.kind)));
                }
                Ok(ParamValue::Float(v))
            }
            (ParamKind::Choice(choices), ParamValue::Str(v)) => {
                if choices.contains(&v.as_str()) {
                    Ok(ParamValue::Str(v))
                } else {
                    Err(invalid(format!(
                        "'{v}' is not one of: {}",
                        choices.join(", ")
                    )))
                }
            }
            (ParamKind::Bool, ParamValue::Bool(v)) => Ok(ParamValue::Bool(v)),
            (ParamKind::Str, ParamValue::Str(v)) => Ok(ParamValue::Str(v)),
            (kind, other) => Err(invalid(format!("expected {kind}, got '{other}'"))),
        }
    }
}

/// Resolved parameters of one call: every declared parameter, with
/// defaults filled in and unset optional parameters as `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedParams {
    values: BTreeMap<String, Option<ParamValue>>,
}

impl ResolvedParams {
    pub(crate) fn insert(&mut self, name: &str, value: Option<ParamValue>) {
        self.values.insert(name.to_string(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    fn required(&self, name: &str) -> Result<&ParamValue, ValidationError> {
        self.get(name)
            .ok_or_else(|| ValidationError::MissingParameter(name.to_string()))
    }

    fn wrong_type(name: &str, expected: &str) -> ValidationError {
        ValidationError::InvalidParameter {
            name: name.to_string(),
            reason: format!("expected {expected}"),
        }
    }

    /// # Errors
    ///
    /// Returns a `ValidationError` if the parameter is unset or not an integer.
    pub fn int(&self, name: &str) -> Result<i64, ValidationError> {
        match self.required(name)? {
            ParamValue::Int(v) => Ok(*v),
            _ => Err(Self::wrong_type(name, "Int")),
        }
    }

    #[must_use]
    pub fn opt_int(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(ParamValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// # Errors
    ///
    /// Returns a `ValidationError` if the parameter is unset or not a number.
    pub fn float(&self, name: &str) -> Result<f64, ValidationError> {
        self.opt_float(name)
            .ok_or_else(|| match self.get(name) {
                None => ValidationError::MissingParameter(name.to_string()),
                Some(_) => Self::wrong_type(name, "Float"),
            })
    }

    #[must_use]
    pub fn opt_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(value_as_float)
    }

    /// # Errors
    ///
    /// Returns a `ValidationError` if the parameter is unset or not a bool.
    pub fn flag(&self, name: &str) -> Result<bool, ValidationError> {
        match self.required(name)? {
            ParamValue::Bool(v) => Ok(*v),
            _ => Err(Self::wrong_type(name, "Bool")),
        }
    }

    /// # Errors
    ///
    /// Returns a `ValidationError` if the parameter is unset or not a string.
    pub fn string(&self, name: &str) -> Result<&str, ValidationError> {
        match self.required(name)? {
            ParamValue::Str(v) => Ok(v),
            _ => Err(Self::wrong_type(name, "Str")),
        }
    }

    /// Parse a choice parameter into its enum
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the parameter is unset or unparseable.
    pub fn choice<T: std::str::FromStr>(&self, name: &str) -> Result<T, ValidationError> {
        let value = self.string(name)?;
        value.parse().map_err(|_| ValidationError::InvalidParameter {
            name: name.to_string(),
            reason: format!("unrecognised value '{value}'"),
        })
    }

    /// Parameters as JSON for provenance; unset parameters become `null`
    #[must_use]
    pub fn to_json(&self) -> BTreeMap<String, serde_json::Value> {
        self.values
            .iter()
            .map(|(name, value)| {
                let json = match value {
                    Some(v) => serde_json::to_value(v).unwrap_or(serde_json::Value::Null),
                    None => serde_json::Value::Null,
                };
                (name.clone(), json)
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ParamValue>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

#[allow(clippy::cast_precision_loss)]
fn value_as_float(value: &ParamValue) -> Option<f64> {
    match value {
        ParamValue::Float(v) => Some(*v),
        ParamValue::Int(v) => Some(*v as f64),
        _ => None,
    }
}
