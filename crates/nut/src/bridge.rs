//! Native call bridge
//!
//! Every registered host function becomes a [`FunctionEntry`] that owns the
//! function and its signature. The entry is bound to a native closure as its
//! context, and one shared [`trampoline`] dispatches all calls: it recovers
//! the entry, validates the arguments, converts them, invokes the function
//! and pushes its result.
//!
//! Failed validation raises a script-level error; the host function is not
//! invoked and the process is never aborted.

use crate::error::DispatchError;
use crate::signature::{ArgumentMismatch, HostFunction, Signature};
use crate::stack::{Position, Stack};
use crate::value::ScalarValue;
use acorn::{NativeResult, Vm, VmError};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Type-erased host function
trait Dispatch {
    fn check(&self, stack: &Stack<'_>, first: Position) -> Result<(), ArgumentMismatch>;

    fn invoke(&self, stack: &Stack<'_>, first: Position) -> Result<usize, String>;
}

struct Callable<F, M> {
    func: F,
    marker: PhantomData<fn() -> M>,
}

impl<F, M> Dispatch for Callable<F, M>
where
    F: HostFunction<M>,
{
    fn check(&self, stack: &Stack<'_>, first: Position) -> Result<(), ArgumentMismatch> {
        F::check_arguments(stack, first)
    }

    fn invoke(&self, stack: &Stack<'_>, first: Position) -> Result<usize, String> {
        self.func.invoke(stack, first)
    }
}

/// Dispatch record of one registered host function
pub struct FunctionEntry {
    name: Rc<str>,
    signature: Signature,
    dispatch: Box<dyn Dispatch>,
}

impl FunctionEntry {
    pub fn new<M: 'static, F: HostFunction<M>>(name: &str, func: F) -> Self {
        FunctionEntry {
            name: Rc::from(name),
            signature: F::signature(),
            dispatch: Box::new(Callable {
                func,
                marker: PhantomData,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of parameters, fixed at registration
    pub fn arity(&self) -> usize {
        self.signature.arity
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Validate and run a call whose arguments fill the current frame
    ///
    /// On success returns the number of values pushed. Nothing is invoked
    /// unless the argument count matches the arity and every argument
    /// converts to its parameter type.
    pub fn dispatch(&self, stack: &Stack<'_>) -> Result<usize, DispatchError> {
        let supplied = stack.top();
        if supplied != self.arity() {
            return Err(DispatchError::ArityMismatch {
                function: self.name.to_string(),
                expected: self.arity(),
                supplied,
            });
        }

        for position in 1..=supplied {
            let found = stack.type_of(position as Position);
            if !ScalarValue::supports(found) {
                return Err(DispatchError::UnsupportedArgument {
                    function: self.name.to_string(),
                    index: position,
                    found,
                });
            }
        }

        self.dispatch
            .check(stack, 1)
            .map_err(|mismatch| match mismatch {
                ArgumentMismatch::Type {
                    index,
                    expected,
                    found,
                } => DispatchError::ArgumentType {
                    function: self.name.to_string(),
                    index,
                    expected,
                    found,
                },
                ArgumentMismatch::Range { index, expected } => DispatchError::ArgumentRange {
                    function: self.name.to_string(),
                    index,
                    parameter: expected,
                },
            })?;

        self.dispatch
            .invoke(stack, 1)
            .map_err(|message| DispatchError::Host {
                function: self.name.to_string(),
                message,
            })
    }
}

impl fmt::Debug for FunctionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionEntry")
            .field("name", &self.name)
            .field("signature", &self.signature.to_string())
            .finish()
    }
}

/// Registered host functions by name
///
/// Entries are shared with the closures installed in the runtime, so an
/// overwritten entry stays alive for as long as a script still holds the
/// old closure.
#[derive(Debug, Default)]
pub struct FunctionTable {
    entries: HashMap<String, Rc<FunctionEntry>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the one it replaces
    pub fn insert(&mut self, entry: Rc<FunctionEntry>) -> Option<Rc<FunctionEntry>> {
        self.entries.insert(entry.name().to_string(), entry)
    }

    pub fn get(&self, name: &str) -> Option<&Rc<FunctionEntry>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether `name` can be bound as a script identifier
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Bind `entry` in the root table under its name
///
/// An existing binding with the same name is replaced. The stack is left as
/// it was found.
pub fn install(vm: &Vm, entry: Rc<FunctionEntry>) -> Result<(), VmError> {
    let stack = Stack::new(vm);
    let _guard = stack.guard();
    let name = Rc::clone(&entry.name);

    vm.push_root_table();
    vm.push_string(&name);
    vm.new_closure_with_context(trampoline, &name, entry);
    vm.new_slot(-3)
}

/// Shared entry point for every registered host function
pub fn trampoline(vm: &Vm) -> NativeResult {
    let stack = Stack::new(vm);
    let entry = match vm
        .native_context()
        .and_then(|context| context.downcast::<FunctionEntry>().ok())
    {
        Some(entry) => entry,
        None => return Err(vm.throw_error(DispatchError::MissingRecord.to_string())),
    };

    tracing::trace!(function = entry.name(), arguments = stack.top(), "native call");

    match entry.dispatch(&stack) {
        Ok(count) => Ok(count),
        Err(err) => {
            tracing::debug!(function = entry.name(), error = %err, "native call refused");
            Err(vm.throw_error(err.to_string()))
        }
    }
}
