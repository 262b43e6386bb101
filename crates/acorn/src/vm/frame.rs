//! Call frames

use crate::value::NativeClosure;
use std::rc::Rc;

/// A window over the value stack
///
/// Position 1 of the frame is `stack[base]`. The root frame has base 0 and
/// no callee; native calls push a frame whose callee is the running closure.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub(crate) base: usize,
    pub(crate) callee: Option<Rc<NativeClosure>>,
}

impl Frame {
    pub(crate) fn root() -> Self {
        Frame {
            base: 0,
            callee: None,
        }
    }

    pub(crate) fn native(base: usize, callee: Rc<NativeClosure>) -> Self {
        Frame {
            base,
            callee: Some(callee),
        }
    }
}
