#![forbid(unsafe_code)]

//! Recorded calls into a source, for assertions.

use std::cell::RefCell;
use std::fmt;

use bindery_core::{Arg, Value};

/// One recorded call: method name, arguments and, for setters, the value.
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub method: String,
    pub args: Vec<Arg>,
    pub value: Value,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.method)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match arg {
                Arg::Absent => f.write_str("*")?,
                Arg::Id(id) => write!(f, "{id:?}")?,
                Arg::Flag(flag) => write!(f, "{flag}")?,
                Arg::Index(index) => write!(f, "{index}")?,
            }
        }
        f.write_str(")")
    }
}

/// Append-only call log.
#[derive(Debug, Default)]
pub struct CallLog {
    calls: RefCell<Vec<Call>>,
}

impl CallLog {
    pub fn record(&self, method: impl Into<String>, args: &[Arg], value: Value) {
        let call = Call {
            method: method.into(),
            args: args.to_vec(),
            value,
        };
        tracing::trace!(call = %call, "source call");
        self.calls.borrow_mut().push(call);
    }

    /// Every call so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// How many calls named `method` were recorded.
    #[must_use]
    pub fn count(&self, method: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    /// The most recent call, if any.
    #[must_use]
    pub fn last(&self) -> Option<Call> {
        self.calls.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}
