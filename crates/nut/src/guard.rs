//! Scoped stack restoration

use crate::stack::Stack;

/// Restores the stack top captured at construction when dropped
///
/// Every exit path of the enclosing scope runs the restore, including `?`
/// returns and unwinding. Nested guards restore in reverse order of
/// construction, each to its own baseline.
///
/// ```
/// use nut::Session;
///
/// let session = Session::new();
/// let stack = session.stack();
/// {
///     let _guard = stack.guard();
///     stack.push(1_i64);
///     stack.push("scratch");
/// }
/// assert_eq!(stack.top(), 0);
/// ```
#[must_use = "the stack is restored when the guard is dropped"]
pub struct StackGuard<'vm> {
    stack: Stack<'vm>,
    saved: usize,
}

impl<'vm> StackGuard<'vm> {
    pub fn new(stack: Stack<'vm>) -> Self {
        let saved = stack.top();
        StackGuard { stack, saved }
    }

    /// Top that will be restored
    pub fn saved_top(&self) -> usize {
        self.saved
    }

    pub fn stack(&self) -> Stack<'vm> {
        self.stack
    }
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.stack.set_top(self.saved);
    }
}
