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

use binding_proto::Role;
use pretty_assertions::assert_eq;

use crate::errors::{BindingError, ErrorList};

fn missing_ate() -> BindingError {
    BindingError::MissingBinding {
        role: Role::Ate,
        id: "ate".to_string(),
    }
}

fn unused_dut() -> BindingError {
    BindingError::NotInTestbed {
        role: Role::Dut,
        id: "q".to_string(),
    }
}

#[test]
fn empty_list_is_ok() {
    let errors: ErrorList<BindingError> = ErrorList::new();
    assert!(errors.is_empty());
    assert!(errors.into_result().is_ok());
}

#[test]
fn single_error_renders_as_itself() {
    let mut errors: ErrorList<BindingError> = ErrorList::new();
    errors.push(missing_ate());
    assert_eq!(errors.len(), 1);

    let list = errors.into_result().unwrap_err();
    assert_eq!(list.to_string(), "missing binding for ATE \"ate\"");

    let err = BindingError::from(list);
    assert!(matches!(err, BindingError::MissingBinding { role: Role::Ate, .. }));
    assert_eq!(err.to_string(), "missing binding for ATE \"ate\"");
}

#[test]
fn multiple_errors_are_enumerated() {
    let mut errors: ErrorList<BindingError> = ErrorList::new();
    errors.push(missing_ate());
    errors.extend([unused_dut()]);

    let err = BindingError::from(errors.into_result().unwrap_err());
    assert_eq!(
        err.to_string(),
        "2 errors occurred:\n  * missing binding for ATE \"ate\"\n  * binding DUT \"q\" not found in testbed"
    );
    assert_eq!(err.errors().len(), 2);
}

#[test]
fn nested_errors_are_indented() {
    let mut inner: ErrorList<BindingError> = ErrorList::new();
    inner.push(missing_ate());
    inner.push(unused_dut());

    let mut outer: ErrorList<BindingError> = ErrorList::new();
    outer.push(inner.into_result().unwrap_err());
    outer.push(BindingError::NotReserved);

    assert_eq!(
        outer.into_result().unwrap_err().to_string(),
        "2 errors occurred:\n  \
         * 2 errors occurred:\n      \
         * missing binding for ATE \"ate\"\n      \
         * binding DUT \"q\" not found in testbed\n  \
         * no reservation is held"
    );
}
