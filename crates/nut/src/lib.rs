//! nut - type-safe marshalling for the acorn scripting runtime
//!
//! nut sits between host Rust code and an embedded [`acorn`] runtime:
//! - [`Stack`]: typed push and read over the runtime's value stack
//! - [`StackGuard`]: restores the stack top when a scope ends
//! - [`PushValues`] / [`PopValues`]: push and pop tuples of scalars in one step
//! - [`HostFunction`]: arity and signature of Rust functions, known from their type
//! - [`bridge`]: dispatch of script calls into registered Rust functions
//! - [`Session`]: owns a runtime, runs scripts and registers host functions
//!
//! ```
//! use nut::{ScriptStatus, Session};
//!
//! let mut session = Session::new();
//! session.register_function("add", |a: f64, b: f64| a + b);
//!
//! assert_eq!(session.run_script("total <- add(1, 2.5);"), ScriptStatus::Completed);
//! assert_eq!(session.global::<f64>("total"), Some(3.5));
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod guard;
pub mod marshal;
pub mod session;
pub mod signature;
pub mod stack;
pub mod value;

pub use acorn;
pub use acorn::{ObjectType, UserPointer};
pub use bridge::{FunctionEntry, FunctionTable};
pub use config::{ConfigError, ConfigResult, SessionConfig};
pub use error::{CallError, DispatchError, TypeMismatch};
pub use guard::StackGuard;
pub use marshal::{PopValues, PushValues};
pub use session::{ScriptStatus, Session, SessionBuilder};
pub use signature::{arity_of, signature_of, HostFunction, ReturnKind, Returns, Signature};
pub use stack::{Position, Stack};
pub use value::{FromStack, Null, ScalarValue, ToStack};
