/*!
kubectl - the operation dispatch and result-normalization layer.

Module layout:
  catalog.rs   Operation descriptors (the fixed catalog, defined at compile time)
  build.rs     Command Builder: descriptor + arguments -> kubectl token lists
  invoke.rs    Invoker & Normalizer: subprocess execution + outcome classification

Shared vocabulary (this file):
  Response     the single value returned per invocation
  Failure      what went wrong, with its class
  FailureKind  validation vs execution vs malformed-output

Every invocation yields exactly one Response. Nothing here persists across
requests; the only process-wide value is the Invoker's read-only kubeconfig
override.
*/

use serde::Serialize;
use std::fmt;

pub mod build;
pub mod catalog;
pub mod invoke;

pub use build::{Plan, Step, build_plan};
pub use catalog::{CATALOG, OpId, OpSpec, OutputShape, ParamKind, ParamSpec};
pub use invoke::Invoker;

/// Failure classes (kept distinct so callers can tell "the cluster rejected
/// this" apart from "the tool's output format changed unexpectedly").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Arguments were insufficient to build a meaningful command. No
    /// subprocess was started.
    InvalidArguments,
    /// kubectl exited non-zero, or could not be launched at all.
    CommandFailed,
    /// kubectl exited zero but a structured-output operation produced
    /// something that is not JSON.
    MalformedOutput,
}

/// A classified failure with a human-readable description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::InvalidArguments,
            message: message.into(),
        }
    }

    pub fn command_failed(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::CommandFailed,
            message: message.into(),
        }
    }

    pub fn malformed_output(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::MalformedOutput,
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// The uniform result shape. This is the only value ever returned to the
/// hosting layer or the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    /// Parsed JSON tree from kubectl's `-o json` mode.
    Structured(serde_json::Value),
    /// Free-text output passed through for human reading.
    Diagnostic(String),
    /// Recovered failure; never propagates as an uncaught fault.
    Failure(Failure),
}

impl Response {
    pub fn is_failure(&self) -> bool {
        matches!(self, Response::Failure(_))
    }
}

impl From<Failure> for Response {
    fn from(failure: Failure) -> Self {
        Response::Failure(failure)
    }
}
