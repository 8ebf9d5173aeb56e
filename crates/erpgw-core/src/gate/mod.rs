//! SQL Safety Gate
//!
//! Turns a raw ad-hoc query and its loosely-typed JSON parameters into an
//! executable, parameter-bound statement, or a rejection reason. Nothing
//! that fails here ever reaches the database.

pub mod params;
pub mod validate;

use serde_json::{Map, Value};

use crate::errors::RejectReason;
use crate::value::SqlValue;

pub use params::{bind_params, detect_integer_params, normalize_param_value, parse_plain_int};
pub use validate::{strip_string_literals, validate_read_only};

/// An ad-hoc query as received from a caller
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub text: String,
    pub parameters: Map<String, Value>,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Map::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }
}

/// Result of running a request through the gate
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Accepted {
        normalized_text: String,
        bound_args: Vec<(String, SqlValue)>,
    },
    Rejected {
        reason: RejectReason,
    },
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted { .. })
    }

    /// Convert into a `Result` for `?`-style callers
    pub fn into_result(self) -> Result<(String, Vec<(String, SqlValue)>), RejectReason> {
        match self {
            ValidationOutcome::Accepted {
                normalized_text,
                bound_args,
            } => Ok((normalized_text, bound_args)),
            ValidationOutcome::Rejected { reason } => Err(reason),
        }
    }
}

/// Validate the query text, then normalize and bind its parameters.
///
/// Integer hints are detected on the original text, so a hint inside a
/// string literal still counts.
pub fn evaluate(request: &QueryRequest) -> ValidationOutcome {
    if let Err(reason) = validate_read_only(&request.text) {
        return ValidationOutcome::Rejected { reason };
    }

    let hints = detect_integer_params(&request.text);
    match bind_params(&request.parameters, &hints) {
        Ok(bound_args) => ValidationOutcome::Accepted {
            normalized_text: request.text.trim().to_string(),
            bound_args,
        },
        Err(reason) => ValidationOutcome::Rejected { reason },
    }
}
