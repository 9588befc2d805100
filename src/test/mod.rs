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

use std::sync::Arc;

use binding_proto::{Binding, Testbed};

use crate::{BindingConfig, Resolver};

mod binder;
mod errors;

/// Binding of a small lab, in which every device has the id used by [`TESTBED`]. `dut1` has an
/// additional port and a reset configuration.
const BINDING: &str = r#"
[options]
username = "admin"
password = "secret"
timeout = 30

[[duts]]
id = "dut1"
name = "r1.lab"
vendor = "ARISTA"
hardware_model = "7280R3"
software_version = "4.30"

[duts.options]
skip_verify = true

[duts.gnmi]
target = "r1-mgmt.lab:6030"
username = "gnmi"

[duts.config]
cli = ["hostname r1"]
gribi_flush = true

[[duts.ports]]
id = "port1"
name = "Ethernet1/1"
speed = "S_100GB"

[[duts.ports]]
id = "port2"
name = "Ethernet1/2"

[[duts.ports]]
id = "port3"
name = "Ethernet1/3"

[[duts]]
id = "dut2"
name = "r2.lab"

[[duts.ports]]
id = "port1"
name = "GigabitEthernet0/0/0/1"

[[ates]]
id = "ate"
name = "ixia.lab"

[ates.otg]
target = "otg.lab:443"

[[ates.ports]]
id = "port1"
name = "1/1"

[[ates.ports]]
id = "port2"
name = "1/2"
"#;

/// # Testbed
///
/// ```text
/// dut1 ---- ate
///   \       /
///    \     /
///     dut2
/// ```
const TESTBED: &str = r#"
id = "triangle"

[[duts]]
id = "dut1"
ports = [{ id = "port1" }, { id = "port2" }]

[[duts]]
id = "dut2"
vendor = "CISCO"
ports = [{ id = "port1", speed = "S_10GB" }]

[[ates]]
id = "ate"
ports = [{ id = "port1" }, { id = "port2" }]

[[links]]
a = "dut1:port1"
b = "ate:port1"

[[links]]
a = "dut1:port2"
b = "dut2:port1"
"#;

/// # Lab for dynamic reservations
///
/// ```text
/// r1 ---- r2 ---- r3
///  \      |      /
///   \     |     /
///    `-- ixia -'
/// ```
///
/// `r1` is the only CISCO router, and the only one with a 400G port.
const LAB: &str = r#"
dynamic = true

[[duts]]
id = "r1"
name = "r1.lab"
vendor = "CISCO"
ports = [
    { id = "e1", name = "Ethernet1" },
    { id = "e2", name = "Ethernet2" },
    { id = "e3", name = "Ethernet3", speed = "S_400GB" },
]

[[duts]]
id = "r2"
name = "r2.lab"
vendor = "ARISTA"
ports = [
    { id = "e1", name = "Ethernet1" },
    { id = "e2", name = "Ethernet2" },
    { id = "e3", name = "Ethernet3" },
    { id = "e4", name = "Ethernet4" },
]

[[duts]]
id = "r3"
name = "r3.lab"
vendor = "ARISTA"
ports = [
    { id = "e1", name = "Ethernet1" },
    { id = "e2", name = "Ethernet2" },
    { id = "e3", name = "Ethernet3" },
]

[[ates]]
id = "ixia"
name = "ixia.lab"
ports = [
    { id = "p1", name = "1/1" },
    { id = "p2", name = "1/2" },
    { id = "p3", name = "1/3" },
]

[[links]]
a = "r1.lab:Ethernet1"
b = "r2.lab:Ethernet1"

[[links]]
a = "r2.lab:Ethernet2"
b = "r3.lab:Ethernet1"

[[links]]
a = "r1.lab:Ethernet2"
b = "ixia.lab:1/1"

[[links]]
a = "r2.lab:Ethernet3"
b = "ixia.lab:1/2"

[[links]]
a = "r3.lab:Ethernet2"
b = "ixia.lab:1/3"
"#;

/// # Abstract triangle
///
/// ```text
/// dut1 ---- dut2
///    \      /
///     \    /
///      ate
/// ```
const TRIANGLE: &str = r#"
id = "triangle"

[[duts]]
id = "dut1"
ports = [{ id = "port1" }, { id = "port2" }]

[[duts]]
id = "dut2"
ports = [{ id = "port1" }, { id = "port2" }]

[[ates]]
id = "ate"
ports = [{ id = "port1" }, { id = "port2" }]

[[links]]
a = "dut1:port1"
b = "dut2:port1"

[[links]]
a = "dut1:port2"
b = "ate:port1"

[[links]]
a = "dut2:port2"
b = "ate:port2"
"#;

fn binding() -> Binding {
    Binding::from_toml_str(BINDING).unwrap()
}

fn testbed() -> Testbed {
    Testbed::from_toml_str(TESTBED).unwrap()
}

fn lab() -> Binding {
    Binding::from_toml_str(LAB).unwrap()
}

fn triangle() -> Testbed {
    Testbed::from_toml_str(TRIANGLE).unwrap()
}

fn resolver(binding: Binding) -> Resolver {
    Resolver::new(Arc::new(binding), Arc::new(BindingConfig::default()))
}
