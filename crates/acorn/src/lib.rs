//! acorn - a small embeddable scripting runtime
//!
//! acorn runs Squirrel-flavoured scripts and exposes a positional value
//! stack to its host:
//! - Lexical analysis and parsing into an AST
//! - Tree-walking interpretation with a root table of globals
//! - A stack API for pushing, inspecting and popping values
//! - Native closures that hosts register as script-callable functions
//!
//! ```
//! use acorn::Vm;
//!
//! let vm = Vm::open(1024);
//! acorn::stdlib::register_base_library(&vm);
//! vm.compile_buffer("answer <- 6 * 7;", "example", true).unwrap();
//! vm.call(0, false, true).unwrap();
//! assert_eq!(vm.top(), 0);
//! ```

/// acorn runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod ast;
pub mod diagnostic;
pub mod error;
mod interpreter;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod stdlib;
pub mod token;
pub mod value;
pub mod vm;

pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use error::{Location, Raised, VmError};
pub use lexer::Lexer;
pub use parser::Parser;
pub use span::Span;
pub use token::{Token, TokenKind};
pub use value::{NativeFn, NativeResult, ObjectType, UserPointer, Value};
pub use vm::{MessageSink, Vm, DEFAULT_MAX_CALL_DEPTH};
