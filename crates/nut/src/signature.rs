//! Host function signatures
//!
//! [`HostFunction`] is implemented for every `Fn(A1, ..., An) -> R` with up to
//! ten parameters, where each `Ai: FromStack` and `R: Returns`. The marker
//! type parameter is the function-pointer shape `fn(A1, ..., An) -> R`, which
//! keeps the implementations for different arities apart.
//!
//! The arity is an associated constant: it is known from the function's
//! type alone and the function is never called to find it.
//!
//! ```
//! use nut::signature::arity_of;
//!
//! fn nothing() {}
//! fn mix(_a: f64, _b: String, _c: bool) -> i64 { 0 }
//!
//! assert_eq!(arity_of(&nothing), 0);
//! assert_eq!(arity_of(&mix), 3);
//! ```

use crate::error::TypeMismatch;
use crate::stack::{Position, Stack};
use crate::value::{FromStack, Null, ScalarValue, ToStack};
use acorn::{ObjectType, UserPointer};
use std::fmt;

/// What a host function leaves on the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// Nothing is pushed
    Void,
    /// One value with a fixed tag
    Scalar(ObjectType),
    /// One value whose tag is chosen at run time
    Dynamic,
}

/// Parameter and return types of a host function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub arity: usize,
    pub params: Vec<ObjectType>,
    pub returns: ReturnKind,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|tag| tag.name())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "fn({})", params)?;
        match self.returns {
            ReturnKind::Void => Ok(()),
            ReturnKind::Scalar(tag) => write!(f, " -> {}", tag),
            ReturnKind::Dynamic => write!(f, " -> any"),
        }
    }
}

/// Return values of host functions
pub trait Returns {
    const KIND: ReturnKind;

    /// Push the return values and report how many were pushed, or the
    /// message of a host error
    fn push_returns(self, stack: &Stack<'_>) -> Result<usize, String>;
}

impl Returns for () {
    const KIND: ReturnKind = ReturnKind::Void;

    fn push_returns(self, _stack: &Stack<'_>) -> Result<usize, String> {
        Ok(0)
    }
}

macro_rules! impl_returns {
    ($($ty:ty => $kind:expr),* $(,)?) => {
        $(
            impl Returns for $ty {
                const KIND: ReturnKind = $kind;

                fn push_returns(self, stack: &Stack<'_>) -> Result<usize, String> {
                    self.push_to(stack);
                    Ok(1)
                }
            }
        )*
    };
}

impl_returns! {
    bool => ReturnKind::Scalar(ObjectType::Bool),
    i64 => ReturnKind::Scalar(ObjectType::Integer),
    i32 => ReturnKind::Scalar(ObjectType::Integer),
    f64 => ReturnKind::Scalar(ObjectType::Float),
    f32 => ReturnKind::Scalar(ObjectType::Float),
    String => ReturnKind::Scalar(ObjectType::String),
    &'static str => ReturnKind::Scalar(ObjectType::String),
    UserPointer => ReturnKind::Scalar(ObjectType::UserPointer),
    Null => ReturnKind::Scalar(ObjectType::Null),
    ScalarValue => ReturnKind::Dynamic,
}

/// `None` returns null
impl<T: ToStack + Returns> Returns for Option<T> {
    const KIND: ReturnKind = T::KIND;

    fn push_returns(self, stack: &Stack<'_>) -> Result<usize, String> {
        self.push_to(stack);
        Ok(1)
    }
}

/// `Err` becomes a script-level error
impl<T: Returns, E: fmt::Display> Returns for Result<T, E> {
    const KIND: ReturnKind = T::KIND;

    fn push_returns(self, stack: &Stack<'_>) -> Result<usize, String> {
        match self {
            Ok(value) => value.push_returns(stack),
            Err(err) => Err(err.to_string()),
        }
    }
}

/// An argument that does not convert to its parameter type
///
/// Indices are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentMismatch {
    /// The argument has the wrong tag
    Type {
        index: usize,
        expected: ObjectType,
        found: ObjectType,
    },
    /// The tag fits but the value does not, e.g. a 64-bit integer for `i32`
    Range { index: usize, expected: ObjectType },
}

/// A host function callable from scripts
pub trait HostFunction<Marker>: 'static {
    /// Number of parameters
    const ARITY: usize;

    fn signature() -> Signature;

    /// Verify that the `ARITY` arguments starting at `first` convert to the
    /// parameter types
    fn check_arguments(stack: &Stack<'_>, first: Position) -> Result<(), ArgumentMismatch>;

    /// Convert the arguments starting at `first`, call the function and push
    /// its results
    fn invoke(&self, stack: &Stack<'_>, first: Position) -> Result<usize, String>;
}

/// Arity of `f`, without calling it
pub fn arity_of<M, F: HostFunction<M>>(_f: &F) -> usize {
    F::ARITY
}

/// Signature of `f`, without calling it
pub fn signature_of<M, F: HostFunction<M>>(_f: &F) -> Signature {
    F::signature()
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_host_function {
    ($($arg:ident $var:ident),*) => {
        impl<Func, Ret, $($arg,)*> HostFunction<fn($($arg,)*) -> Ret> for Func
        where
            Func: Fn($($arg),*) -> Ret + 'static,
            Ret: Returns,
            $($arg: FromStack,)*
        {
            const ARITY: usize = count!($($arg)*);

            fn signature() -> Signature {
                Signature {
                    arity: Self::ARITY,
                    params: vec![$(<$arg as FromStack>::TAG),*],
                    returns: Ret::KIND,
                }
            }

            #[allow(unused_variables, unused_mut, unused_assignments)]
            fn check_arguments(stack: &Stack<'_>, first: Position) -> Result<(), ArgumentMismatch> {
                let mut position = first;
                $(
                    let index = (position - first) as usize + 1;
                    let found = stack.type_of(position);
                    if !<$arg as FromStack>::accepts(found) {
                        return Err(ArgumentMismatch::Type {
                            index,
                            expected: <$arg as FromStack>::TAG,
                            found,
                        });
                    }
                    if !<$arg as FromStack>::in_range(stack.vm(), position) {
                        return Err(ArgumentMismatch::Range {
                            index,
                            expected: <$arg as FromStack>::TAG,
                        });
                    }
                    position += 1;
                )*
                Ok(())
            }

            #[allow(unused_variables, unused_mut, unused_assignments)]
            fn invoke(&self, stack: &Stack<'_>, first: Position) -> Result<usize, String> {
                let mut position = first;
                $(
                    let $var = <$arg as FromStack>::extract(stack.vm(), position).ok_or_else(|| {
                        TypeMismatch {
                            position,
                            expected: <$arg as FromStack>::TAG,
                            found: stack.type_of(position),
                        }
                        .to_string()
                    })?;
                    position += 1;
                )*
                (self)($($var),*).push_returns(stack)
            }
        }
    };
}

impl_host_function!();
impl_host_function!(A1 a1);
impl_host_function!(A1 a1, A2 a2);
impl_host_function!(A1 a1, A2 a2, A3 a3);
impl_host_function!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_host_function!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_host_function!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
impl_host_function!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);
impl_host_function!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8);
impl_host_function!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8, A9 a9);
impl_host_function!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8, A9 a9, A10 a10);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn three(_a: f64, _b: String, _c: bool) -> Option<i64> {
        None
    }

    #[test]
    fn test_arity_without_calling() {
        let called = Rc::new(Cell::new(false));
        let flag = Rc::clone(&called);
        let zero = move || flag.set(true);

        assert_eq!(arity_of(&zero), 0);
        assert_eq!(arity_of(&three), 3);
        assert!(!called.get());
    }

    #[test]
    fn test_arity_is_a_constant() {
        const ARITY: usize = <fn(i64, i64) -> i64 as HostFunction<fn(i64, i64) -> i64>>::ARITY;
        assert_eq!(ARITY, 2);
    }

    #[test]
    fn test_signature() {
        let signature = signature_of(&three);
        assert_eq!(
            signature,
            Signature {
                arity: 3,
                params: vec![ObjectType::Float, ObjectType::String, ObjectType::Bool],
                returns: ReturnKind::Scalar(ObjectType::Integer),
            }
        );
        assert_eq!(signature.to_string(), "fn(float, string, bool) -> integer");
    }

    #[test]
    fn test_result_signature_uses_ok_type() {
        fn parse(text: String) -> Result<f64, std::num::ParseFloatError> {
            text.parse()
        }
        assert_eq!(signature_of(&parse).to_string(), "fn(string) -> float");
        assert_eq!(signature_of(&|| {}).to_string(), "fn()");
    }

    #[test]
    fn test_ten_parameters() {
        let sum = |a: i64, b: i64, c: i64, d: i64, e: i64, f: i64, g: i64, h: i64, i: i64, j: i64| {
            a + b + c + d + e + f + g + h + i + j
        };
        assert_eq!(arity_of(&sum), 10);
    }
}
