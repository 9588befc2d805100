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

//! The testbed: what a test requires, described with logical ids only.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{load_file, Link, LoadError, PortSpeed, Role};

/// Root of a testbed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Testbed {
    /// Name of the testbed
    pub id: String,
    /// Required devices under test
    pub duts: Vec<TestbedDevice>,
    /// Required traffic generators
    pub ates: Vec<TestbedDevice>,
    /// Required links between the ports, written as `"device_id:port_id"`.
    pub links: Vec<Link>,
}

impl Testbed {
    /// Read a testbed from a TOML or JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        load_file(path.as_ref())
    }

    /// Parse a testbed from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// All required devices of the given role.
    pub fn devices(&self, role: Role) -> &[TestbedDevice] {
        match role {
            Role::Dut => &self.duts,
            Role::Ate => &self.ates,
        }
    }

    /// Get the device of the given role with the id `id`.
    pub fn device(&self, role: Role, id: &str) -> Option<&TestbedDevice> {
        self.devices(role).iter().find(|d| d.id == id)
    }

    /// Iterate over all devices together with their role, DUTs first.
    pub fn all_devices(&self) -> impl Iterator<Item = (Role, &TestbedDevice)> {
        self.duts
            .iter()
            .map(|d| (Role::Dut, d))
            .chain(self.ates.iter().map(|d| (Role::Ate, d)))
    }
}

/// A device required by the testbed. All attributes except the id and the ports are optional
/// constraints; an unset attribute matches any device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestbedDevice {
    /// Logical id
    pub id: String,
    /// Required vendor
    pub vendor: Option<String>,
    /// Required hardware model
    pub hardware_model: Option<String>,
    /// Required software version
    pub software_version: Option<String>,
    /// Regular expression the entire hardware model must match. Replaces `hardware_model` if both
    /// are set.
    pub hardware_model_regex: Option<String>,
    /// Regular expression the entire software version must match. Replaces `software_version` if
    /// both are set.
    pub software_version_regex: Option<String>,
    /// Required ports
    pub ports: Vec<TestbedPort>,
}

impl TestbedDevice {
    /// Get the port with the id `id`.
    pub fn port(&self, id: &str) -> Option<&TestbedPort> {
        self.ports.iter().find(|p| p.id == id)
    }
}

/// A port required by the testbed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestbedPort {
    /// Logical id
    pub id: String,
    /// Required speed
    pub speed: Option<PortSpeed>,
    /// Required physical medium dependent (transceiver type)
    pub pmd: Option<String>,
}
