//! src/params.rs
//!
//! The keyword surface transforms are configured through.
//!
//! Every transform can be built from a [`Params`] map, the dynamic
//! counterpart of its typed constructor. Validation happens here, once,
//! at construction time:
//!
//! ```text
//! p             None | int | float in [0, 1]        (absent → 0.5)
//! data_indices  None | tuple of non-negative ints   (absent → all)
//! *_range       number v → (v, v) | tuple (lo, hi)  (bounds per transform)
//! ```
//!
//! A list is never accepted where a tuple is required.

use crate::error::TransformError;
use anyhow::{bail, ensure, Result};
use std::collections::BTreeMap;

/// A dynamically-typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ParamValue>),
    Tuple(Vec<ParamValue>),
}

impl ParamValue {
    /// Builds a tuple value.
    pub fn tuple<T: Into<ParamValue>>(values: impl IntoIterator<Item = T>) -> Self {
        Self::Tuple(values.into_iter().map(Into::into).collect())
    }

    /// Builds a list value.
    pub fn list<T: Into<ParamValue>>(values: impl IntoIterator<Item = T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
        }
    }

    /// Numeric view of ints and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}

/// Named parameters for building a transform.
///
/// # Example
/// ```ignore
/// let params = Params::new()
///     .set("p", 1.0)
///     .set("data_indices", ParamValue::tuple([0, 1, 4]))
///     .set("brightness_range", ParamValue::tuple([10, 20]));
/// let brightness = Brightness::from_params(&params)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or overwrites a parameter.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Rejects any parameter not in `accepted`.
    pub fn check_names(&self, transform: &'static str, accepted: &[&str]) -> Result<()> {
        if let Some(name) = self.names().find(|n| !accepted.contains(n)) {
            bail!(TransformError::UnknownParameter {
                transform,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Activation probability; absent or `None` resolves to 0.5.
    pub fn probability(&self) -> Result<f64> {
        match self.get("p") {
            None | Some(ParamValue::None) => Ok(DEFAULT_PROBABILITY),
            Some(value) => {
                let p = value
                    .as_f64()
                    .ok_or_else(|| TransformError::parameter_type("p", "a number", value.kind_name()))?;
                validate_probability(p)
            }
        }
    }

    /// Targeted container positions; absent or `None` means all.
    pub fn data_indices(&self) -> Result<Option<Vec<usize>>> {
        let elements = match self.get("data_indices") {
            None | Some(ParamValue::None) => return Ok(None),
            Some(ParamValue::Tuple(elements)) => elements,
            Some(other) => bail!(TransformError::IndicesNotTuple(other.kind_name())),
        };
        elements
            .iter()
            .enumerate()
            .map(|(position, element)| match element {
                ParamValue::Int(i) if *i < 0 => bail!(TransformError::NegativeIndex(*i)),
                ParamValue::Int(i) => Ok(*i as usize),
                other => bail!(TransformError::IndexNotInteger {
                    position,
                    kind: other.kind_name(),
                }),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// A numeric `(lo, hi)` range within `[min, max]`.
    ///
    /// A single number `v` is read as the fixed range `(v, v)`.
    pub fn range(&self, name: &str, default: (f64, f64), min: f64, max: f64) -> Result<(f64, f64)> {
        let (lo, hi) = match self.get(name) {
            None | Some(ParamValue::None) => return Ok(default),
            Some(ParamValue::Int(_) | ParamValue::Float(_)) => {
                let v = self.number(name)?;
                (v, v)
            }
            Some(ParamValue::Tuple(pair)) if pair.len() == 2 => {
                let lo = pair[0].as_f64().ok_or_else(|| {
                    TransformError::parameter_type(name, "numeric bounds", pair[0].kind_name())
                })?;
                let hi = pair[1].as_f64().ok_or_else(|| {
                    TransformError::parameter_type(name, "numeric bounds", pair[1].kind_name())
                })?;
                (lo, hi)
            }
            Some(ParamValue::Tuple(pair)) => bail!(TransformError::parameter_value(
                name,
                format!("a range needs exactly 2 bounds, got {}", pair.len())
            )),
            Some(other) => bail!(TransformError::parameter_type(
                name,
                "a number or a (lo, hi) tuple",
                other.kind_name()
            )),
        };
        check_range(name, (lo, hi), min, max)
    }

    /// A single number.
    pub fn number(&self, name: &str) -> Result<f64> {
        let value = self
            .get(name)
            .ok_or_else(|| TransformError::parameter_value(name, "missing"))?;
        value
            .as_f64()
            .ok_or_else(|| TransformError::parameter_type(name, "a number", value.kind_name()).into())
    }

    /// An integer, or `default` when absent.
    pub fn int_or(&self, name: &str, default: i64) -> Result<i64> {
        match self.get(name) {
            None | Some(ParamValue::None) => Ok(default),
            Some(ParamValue::Int(v)) => Ok(*v),
            Some(other) => bail!(TransformError::parameter_type(name, "an int", other.kind_name())),
        }
    }

    /// A string, or `default` when absent.
    pub fn str_or<'a>(&'a self, name: &str, default: &'a str) -> Result<&'a str> {
        match self.get(name) {
            None | Some(ParamValue::None) => Ok(default),
            Some(ParamValue::Str(s)) => Ok(s.as_str()),
            Some(other) => bail!(TransformError::parameter_type(name, "a str", other.kind_name())),
        }
    }
}

pub const DEFAULT_PROBABILITY: f64 = 0.5;

/// Checks a `(lo, hi)` range is finite, ordered and inside `[min, max]`.
pub(crate) fn check_range(name: &str, (lo, hi): (f64, f64), min: f64, max: f64) -> Result<(f64, f64)> {
    ensure!(
        lo.is_finite() && hi.is_finite() && lo <= hi,
        TransformError::parameter_value(name, format!("expected lo <= hi, got ({lo}, {hi})"))
    );
    ensure!(
        lo >= min && hi <= max,
        TransformError::parameter_value(
            name,
            format!("({lo}, {hi}) is outside the allowed [{min}, {max}]")
        )
    );
    Ok((lo, hi))
}

pub(crate) fn validate_probability(p: f64) -> Result<f64> {
    ensure!(
        p.is_finite() && (0.0..=1.0).contains(&p),
        TransformError::InvalidProbability(p)
    );
    Ok(p)
}
