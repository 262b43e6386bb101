//! Runtime errors

use crate::diagnostic::Diagnostic;
use crate::value::ObjectType;
use std::fmt;
use thiserror::Error;

/// Script location of a runtime error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub label: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.label, self.line, self.column)
    }
}

/// Errors produced by the runtime
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmError {
    /// Error raised while executing a script or native function
    #[error("{message}")]
    Runtime {
        message: String,
        location: Option<Location>,
    },
    /// Lexer or parser errors
    #[error("compilation failed with {} error(s)", diagnostics.len())]
    Compile { diagnostics: Vec<Diagnostic> },
    /// Typed getter applied to a value of another type
    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: ObjectType,
        found: ObjectType,
    },
    /// Table lookup of an absent key
    #[error("the index '{key}' does not exist")]
    MissingSlot { key: String },
}

impl VmError {
    pub fn runtime(message: impl Into<String>) -> Self {
        VmError::Runtime {
            message: message.into(),
            location: None,
        }
    }

    /// Attach a location unless the error already carries one
    pub fn at(self, location: impl FnOnce() -> Location) -> Self {
        match self {
            VmError::Runtime {
                message,
                location: None,
            } => VmError::Runtime {
                message,
                location: Some(location()),
            },
            other => other,
        }
    }

    /// Text handed to the error sink
    pub fn report(&self) -> String {
        match self {
            VmError::Runtime {
                message,
                location: Some(location),
            } => format!("{}: runtime error: {}", location, message),
            VmError::Runtime {
                message,
                location: None,
            } => format!("runtime error: {}", message),
            VmError::Compile { diagnostics } => diagnostics
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
            other => format!("runtime error: {}", other),
        }
    }
}

/// Proof that a native function recorded an error with [`crate::Vm::throw_error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Raised {
    _private: (),
}

impl Raised {
    pub(crate) fn new() -> Self {
        Raised { _private: () }
    }
}
