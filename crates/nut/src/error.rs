//! Error types for marshalling, dispatch and host calls

use crate::stack::Position;
use acorn::{ObjectType, VmError};
use thiserror::Error;

/// A stack slot did not hold the requested type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected {expected} at stack position {position}, found {found}")]
pub struct TypeMismatch {
    pub position: Position,
    pub expected: ObjectType,
    pub found: ObjectType,
}

/// Why a native call was refused or failed
///
/// Raised into the runtime by the trampoline; scripts observe the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{function} expects {expected} argument(s), got {supplied}")]
    ArityMismatch {
        function: String,
        expected: usize,
        supplied: usize,
    },

    #[error("{function}: argument {index} has unsupported type '{found}'")]
    UnsupportedArgument {
        function: String,
        index: usize,
        found: ObjectType,
    },

    #[error("{function}: argument {index} expected {expected}, got {found}")]
    ArgumentType {
        function: String,
        index: usize,
        expected: ObjectType,
        found: ObjectType,
    },

    #[error("{function}: argument {index} is out of range for {parameter}")]
    ArgumentRange {
        function: String,
        index: usize,
        parameter: ObjectType,
    },

    /// The host function itself returned an error
    #[error("{function}: {message}")]
    Host { function: String, message: String },

    #[error("native function called without a dispatch record")]
    MissingRecord,
}

/// Failure of [`crate::Session::call`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    #[error("function '{name}' is not defined")]
    NotFound { name: String },

    #[error("'{name}' is a {found}, not a function")]
    NotCallable { name: String, found: ObjectType },

    #[error("call to '{name}' failed: {source}")]
    Runtime {
        name: String,
        #[source]
        source: VmError,
    },

    #[error("a call returns one value, {requested} were requested")]
    TooManyResults { requested: usize },

    #[error(transparent)]
    ResultType(#[from] TypeMismatch),
}
