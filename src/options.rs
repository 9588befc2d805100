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

//! Resolution of the dial options of a device.
//!
//! The effective [`Options`] of a device and protocol are computed by merging four layers, in
//! increasing precedence:
//!
//! 1. the synthesized default target (`"<name>:<port>"`, or just `"<name>"` for SSH and
//!    IxNetwork),
//! 2. the options of the binding,
//! 3. the options of the device,
//! 4. the protocol-specific options of the device.
//!
//! A field of a layer only takes effect if it is set (non-zero). Options are never cached; they
//! are recomputed every time they are requested.

use std::{fmt, str::FromStr, sync::Arc};

use binding_proto::{Binding, Device, Options, Role};
use clap::ValueEnum;
use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{BindingConfig, DefaultPorts};

/// Management protocol used to talk to a device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// SSH (CLI)
    Ssh,
    /// gNMI on a DUT
    Gnmi,
    /// gNOI
    Gnoi,
    /// gNSI
    Gnsi,
    /// gRIBI
    Gribi,
    /// P4Runtime
    P4rt,
    /// IxNetwork REST API of an ATE
    #[value(name = "ixnetwork")]
    #[serde(rename = "ixnetwork")]
    IxNetwork,
    /// Open Traffic Generator API of an ATE
    Otg,
    /// gNMI on an ATE
    AteGnmi,
}

/// Per-protocol behavior: where to find the default port, and where to find the protocol-specific
/// options of a device.
struct ProtocolInfo {
    name: &'static str,
    default_port: Option<fn(&DefaultPorts) -> u16>,
    options: fn(&Device) -> Option<&Options>,
}

/// Create an accessor for a protocol-specific options field of a [`Device`].
macro_rules! device_options {
    ($field:ident) => {{
        fn get(device: &Device) -> Option<&Options> {
            device.$field.as_ref()
        }
        get
    }};
}

/// Ordered by the discriminant of [`Protocol`].
const PROTOCOLS: [ProtocolInfo; 9] = [
    ProtocolInfo {
        name: "ssh",
        default_port: None,
        options: device_options!(ssh),
    },
    ProtocolInfo {
        name: "gnmi",
        default_port: Some(|p| p.gnmi),
        options: device_options!(gnmi),
    },
    ProtocolInfo {
        name: "gnoi",
        default_port: Some(|p| p.gnoi),
        options: device_options!(gnoi),
    },
    ProtocolInfo {
        name: "gnsi",
        default_port: Some(|p| p.gnsi),
        options: device_options!(gnsi),
    },
    ProtocolInfo {
        name: "gribi",
        default_port: Some(|p| p.gribi),
        options: device_options!(gribi),
    },
    ProtocolInfo {
        name: "p4rt",
        default_port: Some(|p| p.p4rt),
        options: device_options!(p4rt),
    },
    ProtocolInfo {
        name: "ixnetwork",
        default_port: None,
        options: device_options!(ixnetwork),
    },
    ProtocolInfo {
        name: "otg",
        default_port: Some(|p| p.otg),
        options: device_options!(otg),
    },
    ProtocolInfo {
        name: "ate-gnmi",
        default_port: Some(|p| p.ate_gnmi),
        options: device_options!(gnmi),
    },
];

impl Protocol {
    /// All protocols
    pub const ALL: [Protocol; 9] = [
        Protocol::Ssh,
        Protocol::Gnmi,
        Protocol::Gnoi,
        Protocol::Gnsi,
        Protocol::Gribi,
        Protocol::P4rt,
        Protocol::IxNetwork,
        Protocol::Otg,
        Protocol::AteGnmi,
    ];

    fn info(self) -> &'static ProtocolInfo {
        &PROTOCOLS[self as usize]
    }

    /// Lowercase name of the protocol, as accepted by [`Protocol::from_str`].
    pub fn as_str(self) -> &'static str {
        self.info().name
    }

    /// Default port of the protocol. `None` for protocols that dial the bare device name.
    pub fn default_port(self, ports: &DefaultPorts) -> Option<u16> {
        self.info().default_port.map(|f| f(ports))
    }

    /// The dial target used when no layer sets one.
    pub fn default_target(self, name: &str, ports: &DefaultPorts) -> String {
        match self.default_port(ports) {
            Some(port) => format!("{name}:{port}"),
            None => name.to_string(),
        }
    }

    /// The protocol-specific options of `device`, if any. ATE gNMI shares the `gnmi` options.
    pub fn device_options(self, device: &Device) -> Option<&Options> {
        (self.info().options)(device)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Protocol::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| UnknownProtocol(s.to_string()))
    }
}

/// The name does not correspond to any [`Protocol`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown protocol {0:?}")]
pub struct UnknownProtocol(pub String);

/// Computes the effective dial options of devices of a binding.
///
/// The resolver is cheap to clone; the binding and the configuration are shared.
#[derive(Debug, Clone)]
pub struct Resolver {
    binding: Arc<Binding>,
    config: Arc<BindingConfig>,
}

impl Resolver {
    /// Create a resolver for the devices of `binding`.
    pub fn new(binding: Arc<Binding>, config: Arc<BindingConfig>) -> Self {
        Self { binding, config }
    }

    /// The binding whose options are resolved.
    pub fn binding(&self) -> &Arc<Binding> {
        &self.binding
    }

    /// The configuration used for the default ports.
    pub fn config(&self) -> &Arc<BindingConfig> {
        &self.config
    }

    /// Get a device of the binding by its logical id.
    pub fn device(&self, role: Role, id: &str) -> Option<&Device> {
        self.binding.device(role, id)
    }

    /// Compute the effective options to dial `protocol` on `device`. This never fails: missing
    /// layers contribute nothing.
    pub fn resolve(&self, device: &Device, protocol: Protocol) -> Options {
        let target = protocol.default_target(&device.name, &self.config.ports);
        let default = Options::with_target(target);
        let options = Options::merged([
            Some(&default),
            self.binding.options.as_ref(),
            device.options.as_ref(),
            protocol.device_options(device),
        ]);
        trace!(
            "resolved {protocol} options of {} (user {:?}): target {}",
            device.name,
            options.username,
            options.target
        );
        options
    }
}
