//! error.rs
//! The single error taxonomy for the inference core.

use crate::potential::Role;
use thiserror::Error;

/// Errors surfaced by potential construction, heuristics, and inference runs.
///
/// Construction- and lookup-time failures are returned to the immediate
/// caller. Mid-run failures (`NotEvaluableNetwork`) abort the whole
/// elimination: an intermediate potential set is not a valid answer to the
/// original query, so partial results are discarded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("unknown potential type '{type_id}'")]
    UnknownType { type_id: String },

    #[error("cannot construct potential type '{type_id}': {message}")]
    Construction { type_id: String, message: String },

    #[error("cannot combine a {left:?} potential with a {right:?} potential")]
    IncompatibleRoles { left: Role, right: Role },

    #[error("variable '{variable}' is not part of this potential")]
    VariableNotPresent { variable: String },

    #[error("network is not evaluable: {message}")]
    NotEvaluableNetwork { message: String },

    #[error("no elimination order: heuristic exhausted with {remaining} variable(s) remaining")]
    NoEliminationOrder { remaining: usize },

    #[error("external elimination order matched no known variable ({} unmatched name(s))", .unmatched.len())]
    MalformedExternalOrder { unmatched: Vec<String> },
}
