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

//! This module contains the process-wide configuration of the binding.
//!
//! The configuration is constructed once when the process starts (either with
//! [`BindingConfig::default`] or read from a TOML file using [`BindingConfig::from_file`]) and is
//! immutable afterwards. It is handed to the resolver and the builders explicitly.

use std::{path::Path, time::Duration};

use binding_proto::LoadError;
use serde::{Deserialize, Serialize};

/// Configuration of the binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Default ports used to synthesize the dial target of each protocol.
    pub ports: DefaultPorts,
    /// Maximum time in seconds to search for a dynamic reservation. `None` means no limit.
    pub solve_timeout_secs: Option<u64>,
    /// Run the reset hooks on all devices after a reservation was made.
    pub reset: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            ports: DefaultPorts::default(),
            solve_timeout_secs: None,
            reset: true,
        }
    }
}

impl BindingConfig {
    /// Read the configuration from a TOML file. Missing keys take their default value.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| LoadError::Toml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parse the configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Timeout for the dynamic solve, if any.
    pub fn solve_timeout(&self) -> Option<Duration> {
        self.solve_timeout_secs.map(Duration::from_secs)
    }
}

/// Default port of each gRPC based protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultPorts {
    /// gNMI on DUTs
    pub gnmi: u16,
    /// gNOI on DUTs
    pub gnoi: u16,
    /// gNSI on DUTs
    pub gnsi: u16,
    /// gRIBI on DUTs
    pub gribi: u16,
    /// P4Runtime on DUTs
    pub p4rt: u16,
    /// gNMI on ATEs
    pub ate_gnmi: u16,
    /// Open Traffic Generator on ATEs
    pub otg: u16,
}

impl Default for DefaultPorts {
    fn default() -> Self {
        Self {
            gnmi: 9339,
            gnoi: 9339,
            gnsi: 9339,
            gribi: 9340,
            p4rt: 9559,
            ate_gnmi: 50051,
            otg: 40051,
        }
    }
}
