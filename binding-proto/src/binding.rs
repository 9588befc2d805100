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

//! The binding: concrete lab devices, their credentials and their cabling.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{load_file, Link, LoadError, PortSpeed, Role};

/// Root of a binding file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Binding {
    /// All devices under test available in the lab.
    pub duts: Vec<Device>,
    /// All traffic generators available in the lab.
    pub ates: Vec<Device>,
    /// Dial options that apply to every device and every protocol.
    pub options: Option<Options>,
    /// Whether the devices must be assigned by matching the topology instead of by their id.
    pub dynamic: bool,
    /// Physical cables in the lab. Only used for dynamic reservations.
    pub links: Vec<Link>,
}

impl Binding {
    /// Read a binding from a TOML or JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        load_file(path.as_ref())
    }

    /// Parse a binding from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// All devices of the given role.
    pub fn devices(&self, role: Role) -> &[Device] {
        match role {
            Role::Dut => &self.duts,
            Role::Ate => &self.ates,
        }
    }

    /// Get the device of the given role with the logical id `id`.
    pub fn device(&self, role: Role, id: &str) -> Option<&Device> {
        self.devices(role).iter().find(|d| d.id == id)
    }

    /// Iterate over all devices together with their role, DUTs first.
    pub fn all_devices(&self) -> impl Iterator<Item = (Role, &Device)> {
        self.duts
            .iter()
            .map(|d| (Role::Dut, d))
            .chain(self.ates.iter().map(|d| (Role::Ate, d)))
    }
}

/// A concrete device in the lab.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    /// Logical id, matched against the testbed id in static reservations.
    pub id: String,
    /// Hostname of the device.
    pub name: String,
    /// Vendor of the device.
    pub vendor: String,
    /// Hardware model of the device.
    pub hardware_model: String,
    /// Software version running on the device.
    pub software_version: String,
    /// Dial options that apply to every protocol of this device.
    pub options: Option<Options>,
    /// Ports of the device.
    pub ports: Vec<Port>,
    /// Configuration used to reset the device after it was reserved.
    pub config: Option<ResetConfig>,
    /// SSH specific options
    pub ssh: Option<Options>,
    /// gNMI specific options
    pub gnmi: Option<Options>,
    /// gNOI specific options
    pub gnoi: Option<Options>,
    /// gNSI specific options
    pub gnsi: Option<Options>,
    /// gRIBI specific options
    pub gribi: Option<Options>,
    /// P4RT specific options
    pub p4rt: Option<Options>,
    /// IxNetwork specific options
    pub ixnetwork: Option<Options>,
    /// OTG specific options
    pub otg: Option<Options>,
}

impl Device {
    /// Get the port with the logical id `id`.
    pub fn port(&self, id: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == id)
    }

    /// Get the port with the concrete name `name`.
    pub fn port_by_name(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }
}

/// A concrete port of a lab device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Port {
    /// Logical id, matched against the testbed port id in static reservations.
    pub id: String,
    /// Name of the interface on the device.
    pub name: String,
    /// Speed of the port, if known.
    pub speed: Option<PortSpeed>,
    /// Physical medium dependent (transceiver type), if known.
    pub pmd: Option<String>,
}

/// Commands used to bring a device back into a known state after reserving it. The content is
/// not interpreted, but handed to the reset hooks as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetConfig {
    /// CLI configuration snippets to push.
    pub cli: Vec<String>,
    /// Files containing a gNMI `SetRequest` to apply.
    pub gnmi_set_file: Vec<String>,
    /// Whether all gRIBI entries must be flushed.
    pub gribi_flush: bool,
}

impl ResetConfig {
    /// Returns `true` if the reset would not do anything.
    pub fn is_empty(&self) -> bool {
        self.cli.is_empty() && self.gnmi_set_file.is_empty() && !self.gribi_flush
    }
}

/// Dial options of a device. Any field left at its zero value (empty string, `false` or `0`) is
/// unset, and can be overwritten by a layer of higher precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Address to dial, as `host` or `host:port`.
    pub target: String,
    /// Dial without TLS.
    pub insecure: bool,
    /// Use TLS, but do not verify the certificate of the device.
    pub skip_verify: bool,
    /// Username for authentication
    pub username: String,
    /// Password for authentication
    pub password: String,
    /// Session to connect to (IxNetwork)
    pub session_id: u64,
    /// Dial timeout in seconds
    pub timeout: u32,
    /// Maximum size of a received message, in bytes
    pub max_recv_msg_size: u32,
    /// Use mutual TLS.
    pub mutual_tls: bool,
    /// File containing the trusted CA certificates.
    pub trust_bundle_file: String,
    /// File containing the client certificate.
    pub cert_file: String,
    /// File containing the client key.
    pub key_file: String,
    /// Use keyboard-interactive authentication (SSH).
    pub keyboard_interactive: bool,
}

/// Overwrite every field of `$this` with the one of `$other`, unless the field of `$other` is
/// zero.
macro_rules! merge_fields {
    ($this:ident, $other:ident; strings: $($s:ident),*; flags: $($b:ident),*; numbers: $($n:ident),*;) => {
        $(
            if !$other.$s.is_empty() {
                $this.$s.clone_from(&$other.$s);
            }
        )*
        $(
            if $other.$b {
                $this.$b = true;
            }
        )*
        $(
            if $other.$n != 0 {
                $this.$n = $other.$n;
            }
        )*
    };
}

impl Options {
    /// Create options that only set the target.
    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    /// Overwrite all fields of `self` with the fields of `other` that are set (non-zero).
    pub fn merge_from(&mut self, other: &Options) {
        merge_fields!(self, other;
            strings: target, username, password, trust_bundle_file, cert_file, key_file;
            flags: insecure, skip_verify, mutual_tls, keyboard_interactive;
            numbers: session_id, timeout, max_recv_msg_size;
        );
    }

    /// Merge all layers in order. Later layers take precedence over earlier ones, and missing
    /// layers contribute nothing.
    pub fn merged<'a>(layers: impl IntoIterator<Item = Option<&'a Options>>) -> Options {
        layers
            .into_iter()
            .flatten()
            .fold(Options::default(), |mut acc, layer| {
                acc.merge_from(layer);
                acc
            })
    }
}
