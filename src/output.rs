//! Output finalizers applied to evaluated values.
//!
//! An [`OutputFunctor`] turns the plain value computed by an evaluator into the value handed
//! to the caller. The default, [`PlainOutput`], passes it through. [`FrameLabels`] attaches
//! source and destination frame labels to it; the labels are carried, never checked.

use crate::value::Value;

/// Post-processing applied to an evaluated value.
///
/// The output must still expose the underlying [`Value`], since finite-difference
/// Jacobians are measured on the wrapped result.
pub trait OutputFunctor {
    type Output: AsRef<Value>;

    fn apply(&self, value: Value) -> Self::Output;
}

/// The identity finalizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlainOutput;

impl OutputFunctor for PlainOutput {
    type Output = Value;

    fn apply(&self, value: Value) -> Value {
        value
    }
}

/// Attaches frame labels to every output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLabels {
    pub left: String,
    pub right: String,
}

impl FrameLabels {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// A value tagged with the frames it maps between.
#[derive(Debug, Clone, PartialEq)]
pub struct Framed {
    pub value: Value,
    pub left: String,
    pub right: String,
}

impl AsRef<Value> for Framed {
    fn as_ref(&self) -> &Value {
        &self.value
    }
}

impl OutputFunctor for FrameLabels {
    type Output = Framed;

    fn apply(&self, value: Value) -> Framed {
        Framed {
            value,
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }
}

impl std::fmt::Display for Framed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_T_{} = {}", self.left, self.right, self.value)
    }
}
