// TestbedBinding: Reserving lab devices for abstract testbeds
// Copyright (C) 2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Error types, and a collector to report many independent errors at once.

use std::fmt;

use binding_proto::{EndpointError, LoadError, Role};
use portgraph::{GraphError, RegexError, SolveError};
use thiserror::Error;

/// Collects errors during a validation pass that should not stop at the first problem.
#[derive(Debug)]
pub struct ErrorList<E> {
    errs: Vec<E>,
}

impl<E> Default for ErrorList<E> {
    fn default() -> Self {
        Self { errs: Vec::new() }
    }
}

impl<E> ErrorList<E> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error to the list.
    pub fn push(&mut self, err: impl Into<E>) {
        self.errs.push(err.into());
    }

    /// Number of collected errors
    pub fn len(&self) -> usize {
        self.errs.len()
    }

    /// Returns `true` if no error was collected.
    pub fn is_empty(&self) -> bool {
        self.errs.is_empty()
    }

    /// Iterate over all collected errors.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.errs.iter()
    }

    /// Returns `Ok(())` if no error was collected, and all errors otherwise.
    pub fn into_result(self) -> Result<(), ListError<E>> {
        if self.errs.is_empty() {
            Ok(())
        } else {
            Err(ListError(self.errs))
        }
    }
}

impl<E> Extend<E> for ErrorList<E> {
    fn extend<T: IntoIterator<Item = E>>(&mut self, iter: T) {
        self.errs.extend(iter)
    }
}

/// A non-empty list of errors, rendered as a single error.
///
/// A list with a single error is rendered exactly like that error. Otherwise, the message starts
/// with `"N errors occurred:"`, followed by each error on its own line, prefixed with `"  * "`.
/// Multi-line messages are indented, such that nested lists stay readable.
#[derive(Debug, Clone, PartialEq)]
pub struct ListError<E>(Vec<E>);

impl<E> ListError<E> {
    /// All errors of the list
    pub fn errors(&self) -> &[E] {
        &self.0
    }

    /// Take all errors out of the list.
    pub fn into_errors(self) -> Vec<E> {
        self.0
    }

    /// Number of errors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for lists created by [`ErrorList::into_result`].
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<E: fmt::Display> fmt::Display for ListError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [err] = self.0.as_slice() {
            return write!(f, "{err}");
        }
        write!(f, "{} errors occurred:", self.0.len())?;
        for err in self.0.iter() {
            write!(f, "\n  * {}", err.to_string().replace('\n', "\n    "))?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for ListError<E> {}

/// Which input a graph error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    /// The abstract testbed
    Testbed,
    /// The binding of the lab
    Binding,
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Testbed => f.write_str("testbed"),
            Input::Binding => f.write_str("binding"),
        }
    }
}

/// Error thrown while building, holding or releasing a reservation.
#[derive(Debug, Error)]
pub enum BindingError {
    /// A testbed device has no binding device with the same id.
    #[error("missing binding for {role} {id:?}")]
    MissingBinding {
        /// Role of the device
        role: Role,
        /// Id of the testbed device
        id: String,
    },
    /// A testbed port has no binding port with the same id.
    #[error("{role} {device:?}: testbed port {port:?} is missing in binding")]
    MissingPort {
        /// Role of the device
        role: Role,
        /// Id of the device
        device: String,
        /// Id of the testbed port
        port: String,
    },
    /// A binding device is not referenced by the testbed.
    #[error("binding {role} {id:?} not found in testbed")]
    NotInTestbed {
        /// Role of the device
        role: Role,
        /// Id of the binding device
        id: String,
    },
    /// A link endpoint is not of the form `device:port`.
    #[error("{input} link: {source}")]
    MalformedEndpoint {
        /// Input containing the link
        input: Input,
        /// Underlying error
        source: EndpointError,
    },
    /// A link references a device that is not declared.
    #[error("{input} link {link} references undeclared device {device:?}")]
    UnknownLinkDevice {
        /// Input containing the link
        input: Input,
        /// The link, formatted as `a <-> b`
        link: String,
        /// Device part of the endpoint
        device: String,
    },
    /// A link references a port that is not declared on its device.
    #[error("{input} link {link} references undeclared port {port:?} of device {device:?}")]
    UnknownLinkPort {
        /// Input containing the link
        input: Input,
        /// The link, formatted as `a <-> b`
        link: String,
        /// Device part of the endpoint
        device: String,
        /// Port part of the endpoint
        port: String,
    },
    /// A link uses a port that is already linked, or connects a port with itself.
    #[error("{input} link {link} is invalid: {source}")]
    DuplicateLink {
        /// Input containing the link
        input: Input,
        /// The link, formatted as `a <-> b`
        link: String,
        /// Underlying error
        source: GraphError,
    },
    /// A testbed device requires an attribute to match a pattern that is not a valid regular
    /// expression.
    #[error("{role} {id:?}: invalid {attribute} pattern: {source}")]
    InvalidPattern {
        /// Role of the device
        role: Role,
        /// Id of the testbed device
        id: String,
        /// The constrained attribute
        attribute: &'static str,
        /// Underlying error
        source: RegexError,
    },
    /// A port graph cannot be constructed.
    #[error("invalid port graph: {0}")]
    Graph(#[from] GraphError),
    /// No assignment of lab devices satisfies the testbed.
    #[error("cannot find a dynamic reservation: {0}")]
    Solve(#[from] SolveError),
    /// `reserve` was called while a reservation is held.
    #[error("only one reservation is allowed at a time")]
    AlreadyReserved,
    /// `release` was called while no reservation is held.
    #[error("no reservation is held")]
    NotReserved,
    /// The requested reservation is not held by this binder.
    #[error("reservation {0:?} not found")]
    ReservationNotFound(String),
    /// A reset or release hook failed on a device.
    #[error("{action} of {role} {id:?} failed: {source}")]
    Hook {
        /// Either `"reset"` or `"release"`
        action: &'static str,
        /// Role of the device
        role: Role,
        /// Id of the device
        id: String,
        /// Error returned by the hook
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A binding, testbed or configuration file cannot be read.
    #[error("{0}")]
    Load(#[from] LoadError),
    /// Several independent errors occurred.
    #[error("{0}")]
    Multiple(ListError<BindingError>),
}

impl From<ListError<BindingError>> for BindingError {
    fn from(list: ListError<BindingError>) -> Self {
        let mut errs = list.0;
        if errs.len() == 1 {
            if let Some(err) = errs.pop() {
                return err;
            }
        }
        Self::Multiple(ListError(errs))
    }
}

impl BindingError {
    /// All errors contained in this error. For [`BindingError::Multiple`], these are the
    /// collected errors, otherwise it is the error itself.
    pub fn errors(&self) -> Vec<&BindingError> {
        match self {
            Self::Multiple(list) => list.errors().iter().collect(),
            e => vec![e],
        }
    }
}
