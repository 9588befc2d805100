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

//! The reservation: logical testbed devices bound to concrete lab devices.

use std::{collections::BTreeMap, sync::Arc};

use binding_proto::{
    Device, Options, Port, PortSpeed, ResetConfig, Role, TestbedDevice, TestbedPort,
};
use log::debug;
use serde::Serialize;

use crate::options::{Protocol, Resolver};

/// Descriptive attributes of a bound device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dims {
    /// Hostname of the concrete device
    pub name: String,
    /// Vendor of the device
    pub vendor: String,
    /// Hardware model of the device
    pub hardware_model: String,
    /// Software version running on the device
    pub software_version: String,
    /// Concrete ports, indexed by the testbed port id.
    pub ports: BTreeMap<String, PortDims>,
}

impl Dims {
    /// Attributes of `device` bound to `testbed`. Attributes that the binding leaves empty are
    /// taken from the testbed.
    pub(crate) fn new(
        device: &Device,
        testbed: &TestbedDevice,
        ports: BTreeMap<String, PortDims>,
    ) -> Self {
        fn pick(bound: &str, requested: &Option<String>) -> String {
            if bound.is_empty() {
                requested.clone().unwrap_or_default()
            } else {
                bound.to_string()
            }
        }
        Self {
            name: device.name.clone(),
            vendor: pick(&device.vendor, &testbed.vendor),
            hardware_model: pick(&device.hardware_model, &testbed.hardware_model),
            software_version: pick(&device.software_version, &testbed.software_version),
            ports,
        }
    }
}

/// Attributes of a bound port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PortDims {
    /// Name of the interface on the concrete device
    pub name: String,
    /// Speed of the port, if known.
    pub speed: Option<PortSpeed>,
    /// Physical medium dependent, if known.
    pub pmd: Option<String>,
}

impl PortDims {
    /// Attributes of `port` bound to `testbed`, falling back to the testbed attributes.
    pub(crate) fn new(port: &Port, testbed: &TestbedPort) -> Self {
        Self {
            name: port.name.clone(),
            speed: port.speed.or(testbed.speed),
            pmd: port.pmd.clone().or_else(|| testbed.pmd.clone()),
        }
    }
}

/// A testbed device bound to a concrete lab device.
#[derive(Debug, Clone)]
pub struct BoundDevice {
    id: String,
    role: Role,
    dims: Dims,
    device: Arc<Device>,
    resolver: Resolver,
}

impl BoundDevice {
    pub(crate) fn new(
        id: impl Into<String>,
        role: Role,
        dims: Dims,
        device: &Device,
        resolver: Resolver,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            dims,
            device: Arc::new(device.clone()),
            resolver,
        }
    }

    /// Logical id of the testbed device.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Role of the device
    pub fn role(&self) -> Role {
        self.role
    }

    /// Resolved attributes of the device.
    pub fn dims(&self) -> &Dims {
        &self.dims
    }

    /// Hostname of the concrete device.
    pub fn name(&self) -> &str {
        &self.dims.name
    }

    /// Concrete port bound to the testbed port `id`.
    pub fn port(&self, id: &str) -> Option<&PortDims> {
        self.dims.ports.get(id)
    }

    /// The concrete device of the binding.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// The reset configuration of the device, exactly as written in the binding.
    pub fn reset_config(&self) -> Option<&ResetConfig> {
        self.device.config.as_ref()
    }

    /// Effective options to dial `protocol`. These are recomputed on every call.
    pub fn options(&self, protocol: Protocol) -> Options {
        self.resolver.resolve(&self.device, protocol)
    }

    /// Open a connection to the device using `dialer`.
    pub fn dial<D: Dialer>(
        &self,
        dialer: &D,
        protocol: Protocol,
    ) -> Result<D::Connection, D::Error> {
        let options = self.options(protocol);
        debug!("dial {protocol} on {} {} at {}", self.role, self.id, options.target);
        dialer.dial(&DialTarget {
            device: self,
            protocol,
            options: &options,
        })
    }
}

/// Everything a [`Dialer`] needs to open a connection.
#[derive(Debug, Clone, Copy)]
pub struct DialTarget<'a> {
    /// The device to dial
    pub device: &'a BoundDevice,
    /// The protocol to speak
    pub protocol: Protocol,
    /// Effective options for this device and protocol
    pub options: &'a Options,
}

/// Opens connections to bound devices. Implemented by the transport layer (gRPC, SSH, ...).
pub trait Dialer {
    /// Handle to an open connection
    type Connection;
    /// Error returned when the connection cannot be established.
    type Error;

    /// Open a connection to the target.
    fn dial(&self, target: &DialTarget<'_>) -> Result<Self::Connection, Self::Error>;
}

/// Mapping of every logical testbed device onto a concrete lab device.
///
/// A reservation is only ever constructed complete: every device of the testbed is bound.
#[derive(Debug, Clone)]
pub struct Reservation {
    id: String,
    duts: BTreeMap<String, BoundDevice>,
    ates: BTreeMap<String, BoundDevice>,
}

impl Reservation {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            duts: BTreeMap::new(),
            ates: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, device: BoundDevice) {
        let map = match device.role {
            Role::Dut => &mut self.duts,
            Role::Ate => &mut self.ates,
        };
        map.insert(device.id.clone(), device);
    }

    /// Identifier of the reservation.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All bound DUTs, indexed by their logical id.
    pub fn duts(&self) -> &BTreeMap<String, BoundDevice> {
        &self.duts
    }

    /// All bound ATEs, indexed by their logical id.
    pub fn ates(&self) -> &BTreeMap<String, BoundDevice> {
        &self.ates
    }

    /// All bound devices of the given role.
    pub fn devices(&self, role: Role) -> &BTreeMap<String, BoundDevice> {
        match role {
            Role::Dut => &self.duts,
            Role::Ate => &self.ates,
        }
    }

    /// Get a bound DUT or ATE by its logical id. DUTs are searched first.
    pub fn device(&self, id: &str) -> Option<&BoundDevice> {
        self.duts.get(id).or_else(|| self.ates.get(id))
    }

    /// Iterate over all bound devices, DUTs first.
    pub fn iter(&self) -> impl Iterator<Item = &BoundDevice> {
        self.duts.values().chain(self.ates.values())
    }

    /// Number of bound devices
    pub fn len(&self) -> usize {
        self.duts.len() + self.ates.len()
    }

    /// Returns `true` if no device is bound.
    pub fn is_empty(&self) -> bool {
        self.duts.is_empty() && self.ates.is_empty()
    }

    /// Serializable summary of the reservation, including the dial target of each of the given
    /// protocols.
    pub fn summary(&self, protocols: &[Protocol]) -> ReservationSummary {
        let summarize = |devices: &BTreeMap<String, BoundDevice>| {
            devices
                .iter()
                .map(|(id, d)| {
                    let targets = protocols
                        .iter()
                        .map(|p| (*p, d.options(*p).target))
                        .collect();
                    (
                        id.clone(),
                        DeviceSummary {
                            dims: d.dims.clone(),
                            targets,
                        },
                    )
                })
                .collect()
        };
        ReservationSummary {
            id: self.id.clone(),
            duts: summarize(&self.duts),
            ates: summarize(&self.ates),
        }
    }
}

/// Serializable view of a [`Reservation`]. Credentials are never part of the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationSummary {
    /// Identifier of the reservation
    pub id: String,
    /// Bound DUTs
    pub duts: BTreeMap<String, DeviceSummary>,
    /// Bound ATEs
    pub ates: BTreeMap<String, DeviceSummary>,
}

/// Serializable view of a [`BoundDevice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    /// Resolved attributes
    #[serde(flatten)]
    pub dims: Dims,
    /// Dial target of each requested protocol
    pub targets: BTreeMap<Protocol, String>,
}
