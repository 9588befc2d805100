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

//! # TestbedBinding: Reserving lab devices for abstract testbeds
//!
//! Conformance tests describe the devices they need as an abstract *testbed*: a set of DUTs
//! (devices under test) and ATEs (traffic generators), their ports, and the links between them.
//! The *binding* describes what actually exists in a lab: concrete devices, how to reach them, and
//! how they are cabled. This library maps the testbed onto the lab, and produces a
//! [`Reservation`] from which each device can be dialed.
//!
//! ## Structure
//! - The module [`options`] resolves the dial [`Options`](binding_proto::Options) of a device and
//!   [`Protocol`] by merging the default target, the binding options, the device options, and the
//!   protocol-specific options.
//! - The module [`static_binding`] binds testbed devices to the binding devices with the same id.
//! - The module [`dynamic_binding`] finds an assignment that maps every testbed link onto a cable
//!   in the lab, using the [`portgraph`] solver.
//! - The module [`binder`] holds at most one [`Reservation`] at a time, and runs the reset and
//!   release [`Hooks`](binder::Hooks).
//! - The module [`errors`] contains the error types, and the [`ErrorList`] used to report all
//!   problems of a binding at once.
//! - The data model of the binding and the testbed is defined in a separate crate:
//!   [`binding_proto`].
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use binding_proto::{Binding, Testbed};
//! use testbed_binding::{Binder, BindingConfig, Protocol};
//!
//! let binding = Binding::from_toml_str(r#"
//!     [[duts]]
//!     id = "dut"
//!     name = "r1.lab"
//!     ports = [{ id = "port1", name = "Ethernet1" }]
//! "#).unwrap();
//! let testbed = Testbed::from_toml_str(r#"
//!     id = "example"
//!     [[duts]]
//!     id = "dut"
//!     ports = [{ id = "port1" }]
//! "#).unwrap();
//!
//! let mut binder = Binder::new(binding, Arc::new(BindingConfig::default()));
//! let reservation = binder.reserve(&testbed).unwrap();
//! let dut = reservation.device("dut").unwrap();
//! assert_eq!(dut.port("port1").unwrap().name, "Ethernet1");
//! assert_eq!(dut.options(Protocol::Gnmi).target, "r1.lab:9339");
//! binder.release().unwrap();
//! ```

#![deny(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod binder;
pub mod config;
pub mod dynamic_binding;
pub mod errors;
pub mod options;
pub mod reservation;
pub mod static_binding;
#[cfg(test)]
mod test;

pub use binder::{Binder, HookError, Hooks, NoHooks};
pub use config::{BindingConfig, DefaultPorts};
pub use dynamic_binding::build_dynamic_reservation;
pub use errors::{BindingError, ErrorList, ListError};
pub use options::{Protocol, Resolver};
pub use reservation::{BoundDevice, DialTarget, Dialer, Dims, PortDims, Reservation};
pub use static_binding::{build_static_reservation, STATIC_RESERVATION_ID};
