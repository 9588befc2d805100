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

use std::io::Write;

use pretty_assertions::assert_eq;

use crate::*;

const BINDING: &str = r#"
dynamic = false

[options]
username = "admin"
password = "admin"

[[duts]]
id = "dut"
name = "r1.lab"
vendor = "ARISTA"

[duts.options]
skip_verify = true

[duts.gnmi]
target = "r1-mgmt.lab:6030"

[duts.config]
cli = ["hostname r1"]
gribi_flush = true

[[duts.ports]]
id = "port1"
name = "Ethernet1/1"
speed = "S_100GB"

[[duts.ports]]
id = "port2"
name = "Ethernet1/2:1"
pmd = "PMD_100GBASE_LR4"

[[ates]]
id = "ate"
name = "ixia.lab"

[[ates.ports]]
id = "port1"
name = "1/1"

[[links]]
a = "r1.lab:Ethernet1/1"
b = "ixia.lab:1/1"
"#;

#[test]
fn parse_binding() {
    let b = Binding::from_toml_str(BINDING).unwrap();
    assert_eq!(b.duts.len(), 1);
    assert_eq!(b.ates.len(), 1);
    assert!(!b.dynamic);
    assert_eq!(b.options.as_ref().unwrap().username, "admin");

    let dut = b.device(Role::Dut, "dut").unwrap();
    assert_eq!(dut.name, "r1.lab");
    assert_eq!(dut.vendor, "ARISTA");
    assert!(dut.options.as_ref().unwrap().skip_verify);
    assert_eq!(dut.gnmi.as_ref().unwrap().target, "r1-mgmt.lab:6030");
    assert!(dut.gnoi.is_none());
    assert_eq!(
        dut.config,
        Some(ResetConfig {
            cli: vec!["hostname r1".to_string()],
            gnmi_set_file: vec![],
            gribi_flush: true,
        })
    );
    assert_eq!(dut.port("port1").unwrap().speed, Some(PortSpeed::S100Gb));
    assert_eq!(
        dut.port("port2").unwrap().pmd.as_deref(),
        Some("PMD_100GBASE_LR4")
    );
    assert_eq!(dut.port_by_name("Ethernet1/2:1").unwrap().id, "port2");

    assert!(b.device(Role::Ate, "dut").is_none());
    assert_eq!(b.links, vec![Link::new("r1.lab:Ethernet1/1", "ixia.lab:1/1")]);
}

#[test]
fn parse_testbed() {
    let tb = Testbed::from_toml_str(
        r#"
id = "dut_ate"

[[duts]]
id = "dut"
vendor = "ARISTA"

[[duts.ports]]
id = "port1"
speed = "S_400GB"

[[ates]]
id = "ate"

[[ates.ports]]
id = "port1"

[[links]]
a = "dut:port1"
b = "ate:port1"
"#,
    )
    .unwrap();
    assert_eq!(tb.id, "dut_ate");
    let dut = tb.device(Role::Dut, "dut").unwrap();
    assert_eq!(dut.vendor.as_deref(), Some("ARISTA"));
    assert_eq!(dut.hardware_model, None);
    assert_eq!(dut.port("port1").unwrap().speed, Some(PortSpeed::S400Gb));
    assert_eq!(
        tb.all_devices().map(|(r, d)| (r, d.id.as_str())).collect::<Vec<_>>(),
        vec![(Role::Dut, "dut"), (Role::Ate, "ate")]
    );
}

#[test]
fn endpoint_parsing() {
    assert_eq!(
        Endpoint::parse("dut:port1").unwrap(),
        Endpoint {
            device: "dut",
            port: "port1"
        }
    );
    assert_eq!(
        Endpoint::parse("r1:Ethernet1/1:2").unwrap(),
        Endpoint {
            device: "r1",
            port: "Ethernet1/1:2"
        }
    );
    assert_eq!(
        Endpoint::parse("dut"),
        Err(EndpointError("dut".to_string()))
    );
    assert!(Endpoint::parse(":port1").is_err());
    assert!(Endpoint::parse("dut:").is_err());
    assert!(Link::new("dut:port1", "ate").endpoints().is_err());
}

#[test]
fn merge_overwrites_set_fields_only() {
    let mut opts = Options {
        target: "a:1".to_string(),
        username: "user".to_string(),
        insecure: true,
        timeout: 30,
        ..Default::default()
    };
    opts.merge_from(&Options {
        target: "b:2".to_string(),
        password: "pass".to_string(),
        ..Default::default()
    });
    assert_eq!(
        opts,
        Options {
            target: "b:2".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            insecure: true,
            timeout: 30,
            ..Default::default()
        }
    );
}

#[test]
fn merged_skips_missing_layers() {
    let a = Options::with_target("a");
    let b = Options {
        username: "b".to_string(),
        ..Default::default()
    };
    let c = Options {
        target: "c".to_string(),
        max_recv_msg_size: 1 << 20,
        ..Default::default()
    };

    let abc = Options::merged([Some(&a), None, Some(&b), Some(&c)]);
    assert_eq!(abc.target, "c");
    assert_eq!(abc.username, "b");
    assert_eq!(abc.max_recv_msg_size, 1 << 20);

    // merging is associative over the layers
    let ab = Options::merged([Some(&a), Some(&b)]);
    assert_eq!(Options::merged([Some(&ab), Some(&c)]), abc);
    assert_eq!(Options::merged([None, None]), Options::default());
}

#[test]
fn load_from_json_and_toml_files() {
    let dir = std::env::temp_dir().join(format!("binding-proto-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let toml_path = dir.join("binding.toml");
    std::fs::File::create(&toml_path)
        .unwrap()
        .write_all(BINDING.as_bytes())
        .unwrap();
    let from_toml = Binding::from_file(&toml_path).unwrap();

    let json_path = dir.join("binding.json");
    std::fs::File::create(&json_path)
        .unwrap()
        .write_all(serde_json::to_string(&from_toml).unwrap().as_bytes())
        .unwrap();
    let from_json = Binding::from_file(&json_path).unwrap();
    assert_eq!(from_toml, from_json);

    let missing = dir.join("missing.toml");
    assert!(matches!(
        Testbed::from_file(missing),
        Err(LoadError::Io { .. })
    ));

    let broken = dir.join("broken.json");
    std::fs::File::create(&broken)
        .unwrap()
        .write_all(b"{ \"duts\": 3 }")
        .unwrap();
    assert!(matches!(
        Testbed::from_file(&broken),
        Err(LoadError::Json { .. })
    ));

    std::fs::remove_dir_all(&dir).unwrap();
}
