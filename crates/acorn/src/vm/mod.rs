//! Runtime instance and its value stack
//!
//! Hosts talk to a [`Vm`] through a positional stack: values are pushed,
//! inspected by position and popped, and calls consume a callee plus its
//! arguments from the top.
//!
//! ## Positions
//!
//! ```text
//! [root frame values] | [native arg1][arg2][pushed result]
//!                       ^ position 1         ^ position -1
//! ```
//!
//! Positive positions count from the base of the current frame (1 is the
//! first value), negative positions count from the top (-1 is the top).
//! Inside a native function the frame starts at its first argument.
//! Position 0 and positions outside the frame are contract violations.

mod frame;

use crate::error::{Raised, VmError};
use crate::interpreter::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::{
    NativeClosure, NativeFn, ObjectType, ScriptFunction, Source, Table, UserPointer, Value,
};
use frame::Frame;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Receiver for `print` and error output
pub type MessageSink = Rc<dyn Fn(&str)>;

/// Default limit on nested calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Remaining native stack below which evaluation moves to a fresh segment
pub(crate) const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each fresh stack segment
pub(crate) const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// An acorn runtime instance
///
/// All operations take `&self`: native functions receive the same `&Vm`
/// and may push, call back into scripts and pop while the caller's frame
/// is suspended. The instance is single-threaded.
pub struct Vm {
    stack: RefCell<Vec<Value>>,
    frames: RefCell<Vec<Frame>>,
    root: Rc<RefCell<Table>>,
    print_sink: RefCell<Option<MessageSink>>,
    error_sink: RefCell<Option<MessageSink>>,
    pending_error: RefCell<Option<String>>,
    depth: Cell<usize>,
    max_call_depth: usize,
}

impl Vm {
    /// Create an instance with room for `initial_stack_size` values
    pub fn open(initial_stack_size: usize) -> Self {
        Self::with_limits(initial_stack_size, DEFAULT_MAX_CALL_DEPTH)
    }

    pub fn with_limits(initial_stack_size: usize, max_call_depth: usize) -> Self {
        Vm {
            stack: RefCell::new(Vec::with_capacity(initial_stack_size)),
            frames: RefCell::new(vec![Frame::root()]),
            root: Rc::new(RefCell::new(Table::new())),
            print_sink: RefCell::new(None),
            error_sink: RefCell::new(None),
            pending_error: RefCell::new(None),
            depth: Cell::new(0),
            max_call_depth,
        }
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Number of calls currently executing
    pub fn call_depth(&self) -> usize {
        self.depth.get()
    }

    // === Stack ===

    fn base(&self) -> usize {
        self.frames.borrow().last().map_or(0, |frame| frame.base)
    }

    /// Number of values in the current frame
    pub fn top(&self) -> usize {
        self.stack.borrow().len() - self.base()
    }

    /// Truncate the frame to `top` values, or extend it with nulls
    pub fn set_top(&self, top: usize) {
        let len = self.base() + top;
        self.stack.borrow_mut().resize(len, Value::Null);
    }

    /// Remove `count` values from the top
    pub fn pop(&self, count: usize) {
        let top = self.top();
        assert!(count <= top, "cannot pop {} values from a frame of {}", count, top);
        let len = self.stack.borrow().len();
        self.stack.borrow_mut().truncate(len - count);
    }

    /// Absolute stack index of a frame position
    fn absolute(&self, position: isize) -> usize {
        let len = self.stack.borrow().len();
        let base = self.base();
        let top = len - base;

        let index = match position {
            0 => None,
            p if p > 0 => {
                let offset = p.unsigned_abs();
                (offset <= top).then(|| base + offset - 1)
            }
            p => {
                let back = p.unsigned_abs();
                (back <= top).then(|| len - back)
            }
        };

        match index {
            Some(index) => index,
            None => panic!("invalid stack position {} (top is {})", position, top),
        }
    }

    pub(crate) fn value_at(&self, position: isize) -> Value {
        let index = self.absolute(position);
        self.stack.borrow()[index].clone()
    }

    pub(crate) fn push(&self, value: Value) {
        self.stack.borrow_mut().push(value);
    }

    fn pop_value(&self) -> Value {
        assert!(self.top() > 0, "cannot pop from an empty frame");
        self.stack.borrow_mut().pop().unwrap_or(Value::Null)
    }

    pub fn push_null(&self) {
        self.push(Value::Null);
    }

    pub fn push_bool(&self, value: bool) {
        self.push(Value::Bool(value));
    }

    pub fn push_integer(&self, value: i64) {
        self.push(Value::Integer(value));
    }

    pub fn push_float(&self, value: f64) {
        self.push(Value::Float(value));
    }

    pub fn push_string(&self, value: &str) {
        self.push(Value::string(value));
    }

    pub fn push_user_pointer(&self, value: UserPointer) {
        self.push(Value::UserPointer(value));
    }

    pub fn push_root_table(&self) {
        self.push(Value::Table(Rc::clone(&self.root)));
    }

    /// Push a new empty table
    pub fn new_table(&self) {
        self.push(Value::Table(Rc::new(RefCell::new(Table::new()))));
    }

    pub fn type_of(&self, position: isize) -> ObjectType {
        let index = self.absolute(position);
        self.stack.borrow()[index].type_of()
    }

    // === Typed getters ===

    pub fn get_bool(&self, position: isize) -> Result<bool, VmError> {
        match self.value_at(position) {
            Value::Bool(b) => Ok(b),
            other => Err(wrong_type(ObjectType::Bool, &other)),
        }
    }

    /// Read an integer; floats are truncated
    pub fn get_integer(&self, position: isize) -> Result<i64, VmError> {
        match self.value_at(position) {
            Value::Integer(n) => Ok(n),
            Value::Float(n) => Ok(n as i64),
            other => Err(wrong_type(ObjectType::Integer, &other)),
        }
    }

    /// Read a float; integers are widened
    pub fn get_float(&self, position: isize) -> Result<f64, VmError> {
        match self.value_at(position) {
            Value::Float(n) => Ok(n),
            Value::Integer(n) => Ok(n as f64),
            other => Err(wrong_type(ObjectType::Float, &other)),
        }
    }

    pub fn get_string(&self, position: isize) -> Result<Rc<str>, VmError> {
        match self.value_at(position) {
            Value::String(s) => Ok(s),
            other => Err(wrong_type(ObjectType::String, &other)),
        }
    }

    pub fn get_user_pointer(&self, position: isize) -> Result<UserPointer, VmError> {
        match self.value_at(position) {
            Value::UserPointer(p) => Ok(p),
            other => Err(wrong_type(ObjectType::UserPointer, &other)),
        }
    }

    /// Printable form of any value
    pub fn stringify(&self, position: isize) -> String {
        self.value_at(position).to_string()
    }

    pub fn is_truthy(&self, position: isize) -> bool {
        self.value_at(position).is_truthy()
    }

    // === Tables ===

    /// Pop a value and then a key, and create or overwrite that slot in the
    /// table at `table_position`
    ///
    /// The position is resolved before popping. Key and value are popped
    /// even when the slot cannot be created.
    pub fn new_slot(&self, table_position: isize) -> Result<(), VmError> {
        let table = self.value_at(table_position);
        let value = self.pop_value();
        let key = self.pop_value();

        let table = match table {
            Value::Table(table) => table,
            other => return Err(wrong_type(ObjectType::Table, &other)),
        };
        let key = match key {
            Value::String(key) => key,
            other => return Err(wrong_type(ObjectType::String, &other)),
        };

        table.borrow_mut().insert(key, value);
        Ok(())
    }

    /// Pop a key and push the matching slot of the table at `table_position`
    ///
    /// On failure the key is popped and nothing is pushed.
    pub fn get_slot(&self, table_position: isize) -> Result<(), VmError> {
        let table = self.value_at(table_position);
        let key = self.pop_value();

        let table = match table {
            Value::Table(table) => table,
            other => return Err(wrong_type(ObjectType::Table, &other)),
        };
        let key = match key {
            Value::String(key) => key,
            other => return Err(wrong_type(ObjectType::String, &other)),
        };

        let value = table.borrow().get(&key).cloned();
        match value {
            Some(value) => {
                self.push(value);
                Ok(())
            }
            None => Err(VmError::MissingSlot {
                key: key.to_string(),
            }),
        }
    }

    pub(crate) fn root(&self) -> &Rc<RefCell<Table>> {
        &self.root
    }

    // === Native closures ===

    /// Push a native closure
    pub fn new_closure(&self, func: NativeFn, name: &str) {
        self.push_native(func, name, None);
    }

    /// Push a native closure bound to a host context
    ///
    /// While the closure runs, [`Vm::native_context`] returns `context`.
    pub fn new_closure_with_context(&self, func: NativeFn, name: &str, context: Rc<dyn Any>) {
        self.push_native(func, name, Some(context));
    }

    fn push_native(&self, func: NativeFn, name: &str, context: Option<Rc<dyn Any>>) {
        self.push(Value::NativeClosure(Rc::new(NativeClosure {
            name: Rc::from(name),
            func,
            context,
        })));
    }

    /// Context bound to the running native closure
    pub fn native_context(&self) -> Option<Rc<dyn Any>> {
        self.frames
            .borrow()
            .last()
            .and_then(|frame| frame.callee.as_ref())
            .and_then(|callee| callee.context.clone())
    }

    /// Context bound to the native closure at `position`
    ///
    /// `None` for any other value or a closure without context.
    pub fn closure_context(&self, position: isize) -> Option<Rc<dyn Any>> {
        match self.value_at(position) {
            Value::NativeClosure(closure) => closure.context.clone(),
            _ => None,
        }
    }

    /// Name of the running native closure
    pub fn callee_name(&self) -> Option<Rc<str>> {
        self.frames
            .borrow()
            .last()
            .and_then(|frame| frame.callee.as_ref())
            .map(|callee| Rc::clone(&callee.name))
    }

    /// Record an error for the running native function to raise
    ///
    /// Return the result as `Err` from the native function.
    pub fn throw_error(&self, message: impl Into<String>) -> Raised {
        *self.pending_error.borrow_mut() = Some(message.into());
        Raised::new()
    }

    // === Execution ===

    /// Compile `source` and push the resulting closure
    ///
    /// Nothing is pushed on failure. With `raise_error`, each diagnostic is
    /// reported through the error sink.
    pub fn compile_buffer(&self, source: &str, label: &str, raise_error: bool) -> Result<(), VmError> {
        let (tokens, mut diagnostics) = Lexer::new(source).tokenize();
        let (program, parse_diagnostics) = Parser::new(tokens).parse();
        diagnostics.extend(parse_diagnostics);

        if !diagnostics.is_empty() {
            let diagnostics: Vec<_> = diagnostics
                .into_iter()
                .map(|diagnostic| diagnostic.located(label, source))
                .collect();
            if raise_error {
                for diagnostic in &diagnostics {
                    self.report_error(&diagnostic.to_string());
                }
            }
            return Err(VmError::Compile { diagnostics });
        }

        let source = Rc::new(Source {
            label: label.to_string(),
            text: source.to_string(),
        });
        self.push(Value::Closure(Rc::new(ScriptFunction {
            name: "main".to_string(),
            params: Vec::new(),
            body: program.statements,
            source,
        })));
        Ok(())
    }

    /// Call the closure sitting below `nparams` arguments
    ///
    /// The callee and its arguments are popped. With `retval` the result is
    /// pushed. With `raise_error` a failure is reported through the error sink.
    pub fn call(&self, nparams: usize, retval: bool, raise_error: bool) -> Result<(), VmError> {
        let top = self.top();
        assert!(
            nparams < top,
            "call needs a callee below {} arguments (top is {})",
            nparams,
            top
        );

        let (callee, args) = {
            let mut stack = self.stack.borrow_mut();
            let start = stack.len() - nparams - 1;
            let mut drained = stack.drain(start..);
            let callee = drained.next().unwrap_or(Value::Null);
            (callee, drained.collect::<Vec<_>>())
        };

        match self.invoke(&callee, args) {
            Ok(result) => {
                if retval {
                    self.push(result);
                }
                Ok(())
            }
            Err(err) => {
                if raise_error {
                    self.report_error(&err.report());
                }
                Err(err)
            }
        }
    }

    /// Call `callee` with `args`, enforcing the call depth limit
    pub(crate) fn invoke(&self, callee: &Value, args: Vec<Value>) -> Result<Value, VmError> {
        if self.depth.get() >= self.max_call_depth {
            return Err(VmError::runtime("stack overflow"));
        }

        self.depth.set(self.depth.get() + 1);
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || match callee {
            Value::Closure(function) => self.call_script(function, args),
            Value::NativeClosure(closure) => self.call_native(closure, args),
            other => Err(VmError::runtime(format!(
                "attempt to call '{}'",
                other.type_of()
            ))),
        });
        self.depth.set(self.depth.get() - 1);

        result
    }

    fn call_script(&self, function: &Rc<ScriptFunction>, args: Vec<Value>) -> Result<Value, VmError> {
        if args.len() != function.params.len() {
            return Err(VmError::runtime(format!(
                "wrong number of parameters for '{}' (expected {}, got {})",
                function.name,
                function.params.len(),
                args.len()
            )));
        }
        Interpreter::new(self, Rc::clone(function)).run(args)
    }

    fn call_native(&self, closure: &Rc<NativeClosure>, args: Vec<Value>) -> Result<Value, VmError> {
        let base = self.stack.borrow().len();
        self.frames
            .borrow_mut()
            .push(Frame::native(base, Rc::clone(closure)));
        self.stack.borrow_mut().extend(args);

        let result = match (closure.func)(self) {
            Ok(0) => Ok(Value::Null),
            Ok(count) => {
                let stack = self.stack.borrow();
                if count > stack.len() - base {
                    Err(VmError::runtime(format!(
                        "native function '{}' returned {} values but left {}",
                        closure.name,
                        count,
                        stack.len() - base
                    )))
                } else {
                    Ok(stack.last().cloned().unwrap_or(Value::Null))
                }
            }
            Err(_) => {
                let message = self
                    .pending_error
                    .borrow_mut()
                    .take()
                    .unwrap_or_else(|| format!("native function '{}' failed", closure.name));
                Err(VmError::runtime(message))
            }
        };

        self.stack.borrow_mut().truncate(base);
        self.frames.borrow_mut().pop();
        result
    }

    // === Output ===

    /// Install the sinks for `print` output and error reports
    pub fn set_print_handlers(&self, print: Option<MessageSink>, error: Option<MessageSink>) {
        *self.print_sink.borrow_mut() = print;
        *self.error_sink.borrow_mut() = error;
    }

    pub(crate) fn print(&self, text: &str) {
        let sink = self.print_sink.borrow().clone();
        if let Some(sink) = sink {
            sink(text);
        }
    }

    pub(crate) fn report_error(&self, text: &str) {
        let sink = self.error_sink.borrow().clone();
        if let Some(sink) = sink {
            sink(text);
        }
    }
}

fn wrong_type(expected: ObjectType, found: &Value) -> VmError {
    VmError::WrongType {
        expected,
        found: found.type_of(),
    }
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("top", &self.top())
            .field("frames", &self.frames.borrow().len())
            .field("root_slots", &self.root.borrow().len())
            .finish()
    }
}

impl Drop for Vm {
    fn drop(&mut self) {
        // Tables may reference themselves; empty the root to break cycles
        self.stack.get_mut().clear();
        self.root.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::NativeResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_push_and_inspect() {
        let vm = Vm::open(16);
        vm.push_string("blah");
        vm.push_float(1998.1);
        assert_eq!(vm.top(), 2);
        assert_eq!(vm.type_of(1), ObjectType::String);
        assert_eq!(vm.type_of(-1), ObjectType::Float);
        assert_eq!(&*vm.get_string(-2).unwrap(), "blah");
        assert_eq!(vm.get_float(2).unwrap(), 1998.1);
    }

    #[test]
    fn test_set_top_extends_with_null() {
        let vm = Vm::open(16);
        vm.push_integer(1);
        vm.set_top(3);
        assert_eq!(vm.top(), 3);
        assert_eq!(vm.type_of(-1), ObjectType::Null);
        vm.set_top(0);
        assert_eq!(vm.top(), 0);
    }

    #[test]
    #[should_panic(expected = "invalid stack position 0")]
    fn test_position_zero_panics() {
        let vm = Vm::open(16);
        vm.push_null();
        vm.type_of(0);
    }

    #[test]
    #[should_panic(expected = "invalid stack position -2")]
    fn test_position_past_frame_panics() {
        let vm = Vm::open(16);
        vm.push_null();
        vm.type_of(-2);
    }

    #[test]
    fn test_getters_report_wrong_type() {
        let vm = Vm::open(16);
        vm.push_bool(true);
        assert_eq!(
            vm.get_string(-1),
            Err(VmError::WrongType {
                expected: ObjectType::String,
                found: ObjectType::Bool
            })
        );
    }

    #[test]
    fn test_numeric_getters_convert() {
        let vm = Vm::open(16);
        vm.push_integer(3);
        vm.push_float(2.9);
        assert_eq!(vm.get_float(1).unwrap(), 3.0);
        assert_eq!(vm.get_integer(2).unwrap(), 2);
    }

    #[test]
    fn test_slots_on_root_table() {
        let vm = Vm::open(16);
        vm.push_root_table();
        vm.push_string("answer");
        vm.push_integer(42);
        vm.new_slot(-3).unwrap();
        assert_eq!(vm.top(), 1);

        vm.push_string("answer");
        vm.get_slot(-2).unwrap();
        assert_eq!(vm.get_integer(-1).unwrap(), 42);

        vm.push_string("missing");
        assert_eq!(
            vm.get_slot(-3),
            Err(VmError::MissingSlot {
                key: "missing".to_string()
            })
        );
        assert_eq!(vm.top(), 2);
    }

    fn add(vm: &Vm) -> NativeResult {
        let a = vm.get_integer(1).map_err(|e| vm.throw_error(e.to_string()))?;
        let b = vm.get_integer(2).map_err(|e| vm.throw_error(e.to_string()))?;
        vm.push_integer(a + b);
        Ok(1)
    }

    fn fail(vm: &Vm) -> NativeResult {
        Err(vm.throw_error("nope"))
    }

    #[test]
    fn test_native_call_consumes_callee_and_args() {
        let vm = Vm::open(16);
        vm.push_bool(false);
        vm.new_closure(add, "add");
        vm.push_integer(2);
        vm.push_integer(3);
        vm.call(2, true, false).unwrap();
        assert_eq!(vm.top(), 2);
        assert_eq!(vm.get_integer(-1).unwrap(), 5);
    }

    #[test]
    fn test_native_error_is_reported() {
        let vm = Vm::open(16);
        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&reports);
        vm.set_print_handlers(None, Some(Rc::new(move |text: &str| sink.borrow_mut().push(text.to_string()))));

        vm.new_closure(fail, "fail");
        let err = vm.call(0, false, true).unwrap_err();
        assert_eq!(err, VmError::runtime("nope"));
        assert_eq!(reports.borrow().as_slice(), ["runtime error: nope"]);
        assert_eq!(vm.top(), 0);
    }

    #[test]
    fn test_native_context_is_scoped_to_call() {
        fn read_context(vm: &Vm) -> NativeResult {
            let value = vm
                .native_context()
                .and_then(|ctx| ctx.downcast_ref::<i64>().copied())
                .unwrap_or(-1);
            vm.push_integer(value);
            Ok(1)
        }

        let vm = Vm::open(16);
        vm.new_closure_with_context(read_context, "ctx", Rc::new(7_i64));
        vm.call(0, true, false).unwrap();
        assert_eq!(vm.get_integer(-1).unwrap(), 7);
        assert!(vm.native_context().is_none());
    }

    #[test]
    fn test_compile_error_pushes_nothing() {
        let vm = Vm::open(16);
        let err = vm.compile_buffer("local = ;", "bad.nut", false).unwrap_err();
        assert!(matches!(err, VmError::Compile { .. }));
        assert_eq!(vm.top(), 0);
    }
}
