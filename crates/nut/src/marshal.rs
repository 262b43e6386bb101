//! Variadic push and pop
//!
//! [`PushValues`] pushes a tuple of heterogeneous scalars in argument order.
//! [`PopValues`] reads the top `n` slots oldest-first into a tuple and pops
//! them. Both are implemented for tuples of up to twelve elements and for
//! single scalars, which take a direct path with the same contract.
//!
//! ```
//! use nut::Session;
//!
//! let session = Session::new();
//! let stack = session.stack();
//!
//! stack.push_values((1.0, "hello", 2.0, 3.0));
//! let (a, s, b, c): (f64, String, f64, f64) = stack.pop_values();
//! assert_eq!((a, s.as_str(), b, c), (1.0, "hello", 2.0, 3.0));
//! assert_eq!(stack.top(), 0);
//! ```

use crate::error::TypeMismatch;
use crate::stack::{Position, Stack};
use crate::value::{FromStack, Null, ScalarValue, ToStack};
use acorn::UserPointer;

/// A group of values pushed left to right
pub trait PushValues {
    /// Number of slots pushed
    const COUNT: usize;

    fn push_all(self, stack: &Stack<'_>);
}

/// A group of typed values read from consecutive slots
pub trait PopValues: Sized {
    /// Number of slots consumed
    const COUNT: usize;

    /// Verify every slot from `first` without reading or popping
    fn check(stack: &Stack<'_>, first: Position) -> Result<(), TypeMismatch>;

    /// Read every slot from `first`; tags must already be verified
    fn read(stack: &Stack<'_>, first: Position) -> Self;
}

impl<'vm> Stack<'vm> {
    /// Push every value in order; returns the number of slots pushed
    pub fn push_values<V: PushValues>(&self, values: V) -> usize {
        values.push_all(self);
        V::COUNT
    }

    /// Read the top `T::COUNT` values into `T` and pop them
    ///
    /// # Panics
    ///
    /// Panics without popping anything if any slot has the wrong tag or the
    /// frame holds fewer than `T::COUNT` values.
    pub fn pop_values<T: PopValues>(&self) -> T {
        match self.try_pop_values() {
            Ok(values) => values,
            Err(mismatch) => panic!("multi-pop failed: {}", mismatch),
        }
    }

    /// Read the top `T::COUNT` values into `T` and pop them
    ///
    /// On a tag mismatch nothing is popped.
    pub fn try_pop_values<T: PopValues>(&self) -> Result<T, TypeMismatch> {
        let top = self.top();
        assert!(
            T::COUNT <= top,
            "cannot pop {} values from a frame of {}",
            T::COUNT,
            top
        );
        if T::COUNT == 0 {
            return Ok(T::read(self, 0));
        }

        let first = (top - T::COUNT + 1) as Position;
        T::check(self, first)?;
        let values = T::read(self, first);
        self.pop(T::COUNT);
        Ok(values)
    }
}

fn check_one<T: FromStack>(stack: &Stack<'_>, position: Position) -> Result<(), TypeMismatch> {
    let found = stack.type_of(position);
    if found == T::TAG && T::in_range(stack.vm(), position) {
        Ok(())
    } else {
        Err(TypeMismatch {
            position,
            expected: T::TAG,
            found,
        })
    }
}

impl PushValues for () {
    const COUNT: usize = 0;

    fn push_all(self, _stack: &Stack<'_>) {}
}

impl PopValues for () {
    const COUNT: usize = 0;

    fn check(_stack: &Stack<'_>, _first: Position) -> Result<(), TypeMismatch> {
        Ok(())
    }

    fn read(_stack: &Stack<'_>, _first: Position) -> Self {}
}

macro_rules! impl_single {
    (push: $($ty:ty),*) => {
        $(
            impl PushValues for $ty {
                const COUNT: usize = 1;

                fn push_all(self, stack: &Stack<'_>) {
                    self.push_to(stack);
                }
            }
        )*
    };
    (pop: $($ty:ty),*) => {
        $(
            impl PopValues for $ty {
                const COUNT: usize = 1;

                fn check(stack: &Stack<'_>, first: Position) -> Result<(), TypeMismatch> {
                    check_one::<$ty>(stack, first)
                }

                fn read(stack: &Stack<'_>, first: Position) -> Self {
                    stack.read(first)
                }
            }
        )*
    };
}

impl_single!(push: bool, i64, i32, f64, f32, &str, String, UserPointer, Null, ScalarValue);
impl_single!(pop: bool, i64, i32, f64, f32, String, UserPointer, Null);

impl<T: ToStack> PushValues for Option<T> {
    const COUNT: usize = 1;

    fn push_all(self, stack: &Stack<'_>) {
        self.push_to(stack);
    }
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_tuple {
    ($($name:ident),+) => {
        impl<$($name: ToStack),+> PushValues for ($($name,)+) {
            const COUNT: usize = count!($($name)+);

            #[allow(non_snake_case)]
            fn push_all(self, stack: &Stack<'_>) {
                let ($($name,)+) = self;
                $($name.push_to(stack);)+
            }
        }

        impl<$($name: FromStack),+> PopValues for ($($name,)+) {
            const COUNT: usize = count!($($name)+);

            #[allow(unused_assignments)]
            fn check(stack: &Stack<'_>, first: Position) -> Result<(), TypeMismatch> {
                let mut position = first;
                $(
                    check_one::<$name>(stack, position)?;
                    position += 1;
                )+
                Ok(())
            }

            fn read(stack: &Stack<'_>, first: Position) -> Self {
                let mut position = first - 1;
                ($(
                    {
                        position += 1;
                        stack.read::<$name>(position)
                    },
                )+)
            }
        }
    };
}

impl_tuple!(A);
impl_tuple!(A, B);
impl_tuple!(A, B, C);
impl_tuple!(A, B, C, D);
impl_tuple!(A, B, C, D, E);
impl_tuple!(A, B, C, D, E, F);
impl_tuple!(A, B, C, D, E, F, G);
impl_tuple!(A, B, C, D, E, F, G, H);
impl_tuple!(A, B, C, D, E, F, G, H, I);
impl_tuple!(A, B, C, D, E, F, G, H, I, J);
impl_tuple!(A, B, C, D, E, F, G, H, I, J, K);
impl_tuple!(A, B, C, D, E, F, G, H, I, J, K, L);
