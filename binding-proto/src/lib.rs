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

//! This library contains the data model of both inputs of a reservation: the *binding* (which lab
//! devices exist, how to reach them, and how they are cabled) and the *testbed* (which devices,
//! ports and links a test requires).
//!
//! Both trees are plain data. They are read from TOML or JSON files (see [`Binding::from_file`]
//! and [`Testbed::from_file`]), and treated as immutable snapshots afterwards. Only the
//! well-formedness of the file is checked here; whether the ids of both trees refer to each other
//! is the job of the reservation builders.

#![deny(missing_docs, missing_debug_implementations)]

use std::{fmt, path::Path};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

mod binding;
mod testbed;

pub use binding::{Binding, Device, Options, Port, ResetConfig};
pub use testbed::{Testbed, TestbedDevice, TestbedPort};

#[cfg(test)]
mod test;

/// Role of a device in the testbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Device under test
    #[serde(rename = "DUT")]
    Dut,
    /// Automated test equipment (traffic generator)
    #[serde(rename = "ATE")]
    Ate,
}

impl Role {
    /// Both roles, DUTs first.
    pub const ALL: [Role; 2] = [Role::Dut, Role::Ate];

    /// Attribute value used for the role in the port graphs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Dut => "DUT",
            Role::Ate => "ATE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speed of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PortSpeed {
    /// 1 Gbit/s
    #[serde(rename = "S_1GB")]
    S1Gb,
    /// 10 Gbit/s
    #[serde(rename = "S_10GB")]
    S10Gb,
    /// 25 Gbit/s
    #[serde(rename = "S_25GB")]
    S25Gb,
    /// 40 Gbit/s
    #[serde(rename = "S_40GB")]
    S40Gb,
    /// 100 Gbit/s
    #[serde(rename = "S_100GB")]
    S100Gb,
    /// 400 Gbit/s
    #[serde(rename = "S_400GB")]
    S400Gb,
}

impl PortSpeed {
    /// Attribute value used for the speed in the port graphs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PortSpeed::S1Gb => "S_1GB",
            PortSpeed::S10Gb => "S_10GB",
            PortSpeed::S25Gb => "S_25GB",
            PortSpeed::S40Gb => "S_40GB",
            PortSpeed::S100Gb => "S_100GB",
            PortSpeed::S400Gb => "S_400GB",
        }
    }
}

impl fmt::Display for PortSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cable between two ports. Both endpoints are written as `"device:port"`.
///
/// In a [`Binding`], the device part is the concrete device *name* and the port part is the
/// concrete port name. In a [`Testbed`], both parts are logical ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    /// First endpoint
    pub a: String,
    /// Second endpoint
    pub b: String,
}

impl Link {
    /// Create a new link from two endpoint strings.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    /// Parse both endpoints of the link.
    pub fn endpoints(&self) -> Result<(Endpoint<'_>, Endpoint<'_>), EndpointError> {
        Ok((Endpoint::parse(&self.a)?, Endpoint::parse(&self.b)?))
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.a, self.b)
    }
}

/// A parsed link endpoint, borrowing from the [`Link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint<'a> {
    /// Device part (before the first `:`)
    pub device: &'a str,
    /// Port part (after the first `:`)
    pub port: &'a str,
}

impl<'a> Endpoint<'a> {
    /// Split `"device:port"` at the first colon. Port names may themselves contain colons (e.g.,
    /// breakout ports like `Ethernet1/1:2`).
    pub fn parse(s: &'a str) -> Result<Self, EndpointError> {
        match s.split_once(':') {
            Some((device, port)) if !device.is_empty() && !port.is_empty() => {
                Ok(Self { device, port })
            }
            _ => Err(EndpointError(s.to_string())),
        }
    }
}

impl fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.port)
    }
}

/// A link endpoint that is not of the form `"device:port"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed link endpoint {0:?}, expected \"device:port\"")]
pub struct EndpointError(pub String);

/// Error thrown while reading a binding or testbed file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file cannot be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Path of the file
        path: String,
        /// Underlying error
        source: std::io::Error,
    },
    /// The file is not valid TOML.
    #[error("cannot parse {path}: {source}")]
    Toml {
        /// Path of the file
        path: String,
        /// Underlying error
        source: toml::de::Error,
    },
    /// The file is not valid JSON.
    #[error("cannot parse {path}: {source}")]
    Json {
        /// Path of the file
        path: String,
        /// Underlying error
        source: serde_json::Error,
    },
}

/// Read and decode a file. Files ending in `.json` are decoded as JSON, everything else as TOML.
pub(crate) fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;
    if path.extension().map(|e| e == "json").unwrap_or(false) {
        serde_json::from_str(&content).map_err(|source| LoadError::Json {
            path: display,
            source,
        })
    } else {
        toml::from_str(&content).map_err(|source| LoadError::Toml {
            path: display,
            source,
        })
    }
}
