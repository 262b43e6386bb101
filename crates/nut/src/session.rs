//! Runtime session
//!
//! A [`Session`] exclusively owns one acorn runtime together with the
//! host functions registered into its root table. Script failures are
//! reported through the error sink and returned as a [`ScriptStatus`];
//! they never unwind into the host.
//!
//! ```
//! use nut::{ScriptStatus, Session};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let mut session = Session::new();
//! let hits = Rc::new(Cell::new(0_i64));
//! let counter = Rc::clone(&hits);
//! session.register_function("hit", move |n: i64| counter.set(counter.get() + n));
//!
//! assert_eq!(session.run_script("hit(2); hit(3);"), ScriptStatus::Completed);
//! assert_eq!(hits.get(), 5);
//! ```

use crate::bridge::{self, FunctionEntry, FunctionTable};
use crate::config::{ConfigError, ConfigResult, SessionConfig};
use crate::error::CallError;
use crate::marshal::{PopValues, PushValues};
use crate::signature::{HostFunction, Signature};
use crate::stack::Stack;
use crate::value::{FromStack, ToStack};
use acorn::{MessageSink, ObjectType, Vm, VmError};
use std::rc::Rc;

/// Outcome of running a script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStatus {
    Completed,
    /// The source did not compile; nothing ran
    CompileFailed,
    /// The script raised an error part way through
    ExecutionFailed,
}

impl ScriptStatus {
    pub fn is_success(self) -> bool {
        self == ScriptStatus::Completed
    }
}

/// An embedded runtime with its registered host functions
#[derive(Debug)]
pub struct Session {
    vm: Vm,
    config: SessionConfig,
    functions: FunctionTable,
}

impl Session {
    /// Session with default configuration, logging script output through
    /// `tracing`
    pub fn new() -> Self {
        Session::assemble(SessionConfig::default(), None, None)
    }

    pub fn with_config(config: SessionConfig) -> ConfigResult<Self> {
        Session::builder().config(config).build()
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    fn assemble(config: SessionConfig, print: Option<MessageSink>, error: Option<MessageSink>) -> Self {
        let vm = Vm::with_limits(config.initial_stack_size(), config.max_call_depth());
        acorn::stdlib::register_base_library(&vm);

        let print: MessageSink = match print {
            Some(sink) => sink,
            None => Rc::new(|text: &str| tracing::info!(target: "nut::print", "{}", text)),
        };
        let error: MessageSink = match error {
            Some(sink) => sink,
            None => Rc::new(|text: &str| tracing::error!(target: "nut::script", "{}", text)),
        };
        vm.set_print_handlers(Some(print), Some(error));

        Session {
            vm,
            config,
            functions: FunctionTable::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The underlying runtime
    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    /// A view over the runtime's value stack
    pub fn stack(&self) -> Stack<'_> {
        Stack::new(&self.vm)
    }

    // === Scripts ===

    /// Compile and run `source` under the configured default label
    pub fn run_script(&self, source: &str) -> ScriptStatus {
        let label = self.config.default_label().to_string();
        self.run_script_named(source, &label)
    }

    /// Compile and run `source`; `label` only appears in diagnostics
    ///
    /// The stack top is the same before and after, whatever the outcome.
    pub fn run_script_named(&self, source: &str, label: &str) -> ScriptStatus {
        let stack = self.stack();
        let _guard = stack.guard();

        if let Err(err) = self.vm.compile_buffer(source, label, true) {
            tracing::debug!(label, error = %err, "script failed to compile");
            return ScriptStatus::CompileFailed;
        }

        match self.vm.call(0, false, true) {
            Ok(()) => {
                tracing::debug!(label, "script completed");
                ScriptStatus::Completed
            }
            Err(err) => {
                tracing::debug!(label, error = %err, "script failed");
                ScriptStatus::ExecutionFailed
            }
        }
    }

    // === Host functions ===

    /// Make `func` callable from scripts as `name`
    ///
    /// A previous binding of `name`, host or script, is replaced.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not an identifier (`[A-Za-z_][A-Za-z0-9_]*`).
    pub fn register_function<M: 'static, F: HostFunction<M>>(&mut self, name: &str, func: F) {
        assert!(
            bridge::is_valid_name(name),
            "invalid function name '{}'",
            name
        );

        let entry = Rc::new(FunctionEntry::new(name, func));
        tracing::debug!(name, arity = entry.arity(), signature = %entry.signature(), "registering host function");

        if let Err(err) = bridge::install(&self.vm, Rc::clone(&entry)) {
            tracing::error!(name, error = %err, "failed to bind host function");
            return;
        }
        if let Some(previous) = self.functions.insert(entry) {
            tracing::debug!(name, previous_arity = previous.arity(), "replaced host function");
        }
    }

    /// Whether `name` is bound to a host function
    ///
    /// A script that rebinds the name (`f <- 1;`) unregisters it.
    pub fn is_registered(&self, name: &str) -> bool {
        self.bound_entry(name).is_some()
    }

    pub fn registered_arity(&self, name: &str) -> Option<usize> {
        self.bound_entry(name).map(|entry| entry.arity())
    }

    pub fn registered_signature(&self, name: &str) -> Option<&Signature> {
        self.bound_entry(name).map(|entry| entry.signature())
    }

    /// Names bound to host functions, in sorted order
    pub fn registered_names(&self) -> Vec<&str> {
        self.functions
            .names()
            .into_iter()
            .filter(|name| self.bound_entry(name).is_some())
            .collect()
    }

    /// The registration of `name`, if its root slot still holds that closure
    fn bound_entry(&self, name: &str) -> Option<&Rc<FunctionEntry>> {
        let entry = self.functions.get(name)?;
        let stack = self.stack();
        let _guard = stack.guard();

        self.vm.push_root_table();
        self.vm.push_string(name);
        self.vm.get_slot(-2).ok()?;
        let bound = self.vm.closure_context(-1)?.downcast::<FunctionEntry>().ok()?;
        Rc::ptr_eq(&bound, entry).then_some(entry)
    }

    // === Calls into scripts ===

    /// Call the root-table function `name` with `args`
    ///
    /// `R` is `()` to discard the result, or a single scalar type. Errors are
    /// returned rather than reported through the error sink.
    pub fn call<A: PushValues, R: PopValues>(&self, name: &str, args: A) -> Result<R, CallError> {
        if R::COUNT > 1 {
            return Err(CallError::TooManyResults { requested: R::COUNT });
        }

        let stack = self.stack();
        let _guard = stack.guard();

        self.vm.push_root_table();
        self.vm.push_string(name);
        if self.vm.get_slot(-2).is_err() {
            return Err(CallError::NotFound { name: name.to_string() });
        }

        let found = stack.type_of(-1);
        if !matches!(found, ObjectType::Closure | ObjectType::NativeClosure) {
            return Err(CallError::NotCallable {
                name: name.to_string(),
                found,
            });
        }

        let count = stack.push_values(args);
        tracing::trace!(name, supplied = count, "calling script function");
        self.vm
            .call(count, R::COUNT > 0, false)
            .map_err(|source| CallError::Runtime {
                name: name.to_string(),
                source,
            })?;

        Ok(stack.try_pop_values::<R>()?)
    }

    // === Globals ===

    /// Create or overwrite a root-table slot
    pub fn set_global<T: ToStack>(&self, name: &str, value: T) -> Result<(), VmError> {
        let stack = self.stack();
        let _guard = stack.guard();

        self.vm.push_root_table();
        self.vm.push_string(name);
        stack.push(value);
        self.vm.new_slot(-3)
    }

    /// Read a root-table slot; `None` if it is absent or not a `T`
    pub fn global<T: FromStack>(&self, name: &str) -> Option<T> {
        let stack = self.stack();
        let _guard = stack.guard();

        self.vm.push_root_table();
        self.vm.push_string(name);
        self.vm.get_slot(-2).ok()?;
        stack.try_read(-1).ok()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for sessions with custom configuration or sinks
#[derive(Default)]
pub struct SessionBuilder {
    config: SessionConfig,
    print: Option<MessageSink>,
    error: Option<MessageSink>,
}

impl SessionBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Receive `print` output
    pub fn on_print(mut self, sink: impl Fn(&str) + 'static) -> Self {
        self.print = Some(Rc::new(sink));
        self
    }

    /// Receive compile diagnostics and runtime error reports
    pub fn on_error(mut self, sink: impl Fn(&str) + 'static) -> Self {
        self.error = Some(Rc::new(sink));
        self
    }

    pub fn build(self) -> Result<Session, ConfigError> {
        self.config.validate()?;
        Ok(Session::assemble(self.config, self.print, self.error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    fn capturing() -> (Session, Rc<RefCell<Vec<String>>>) {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&errors);
        let session = Session::builder()
            .on_error(move |text| sink.borrow_mut().push(text.to_string()))
            .build()
            .unwrap();
        (session, errors)
    }

    #[test]
    fn test_status_is_success() {
        assert!(ScriptStatus::Completed.is_success());
        assert!(!ScriptStatus::CompileFailed.is_success());
        assert!(!ScriptStatus::ExecutionFailed.is_success());
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = Session::builder()
            .config(SessionConfig::new().with_max_call_depth(0))
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_compile_failure_uses_default_label() {
        let config = SessionConfig::new().with_default_label("boot.nut");
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&errors);
        let session = Session::builder()
            .config(config)
            .on_error(move |text| sink.borrow_mut().push(text.to_string()))
            .build()
            .unwrap();

        assert_eq!(session.run_script("local = ;"), ScriptStatus::CompileFailed);
        assert!(errors.borrow()[0].starts_with("boot.nut:1:"));
    }

    #[test]
    fn test_register_replaces_previous_entry() {
        let (mut session, _) = capturing();
        session.register_function("f", || 1_i64);
        session.register_function("f", |a: i64, b: i64| a * b);

        assert_eq!(session.registered_arity("f"), Some(2));
        assert_eq!(session.registered_names(), vec!["f"]);
        assert_eq!(session.call::<_, i64>("f", (6_i64, 7_i64)), Ok(42));
    }

    #[test]
    #[should_panic(expected = "invalid function name 'not valid'")]
    fn test_register_rejects_bad_name() {
        let mut session = Session::new();
        session.register_function("not valid", || {});
    }

    #[test]
    fn test_call_errors() {
        let (session, errors) = capturing();
        session.run_script("function boom() { throw \"bang\"; } answer <- 42;");

        assert_eq!(
            session.call::<_, ()>("missing", ()),
            Err(CallError::NotFound { name: "missing".to_string() })
        );
        assert_eq!(
            session.call::<_, ()>("answer", ()),
            Err(CallError::NotCallable {
                name: "answer".to_string(),
                found: ObjectType::Integer,
            })
        );
        assert!(matches!(
            session.call::<_, ()>("boom", ()),
            Err(CallError::Runtime { .. })
        ));
        assert_eq!(
            session.call::<_, (i64, i64)>("boom", ()),
            Err(CallError::TooManyResults { requested: 2 })
        );
        assert!(errors.borrow().is_empty());
        assert_eq!(session.stack().top(), 0);
    }

    #[test]
    fn test_globals() {
        let session = Session::new();
        session.set_global("speed", 2.5).unwrap();
        assert_eq!(session.global::<f64>("speed"), Some(2.5));
        assert_eq!(session.global::<String>("speed"), None);
        assert_eq!(session.global::<f64>("absent"), None);
        assert_eq!(session.stack().top(), 0);
    }
}
