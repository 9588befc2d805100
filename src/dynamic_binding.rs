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

//! Dynamic reservations: the testbed is matched against the cabling of the lab.
//!
//! The testbed is turned into an [`AbstractGraph`], in which every device requires its role (and
//! optionally its vendor, hardware model and software version, the latter two either exactly or as
//! a regular expression), and every port optionally requires a speed and a PMD. The binding is turned into a [`ConcreteGraph`] with the actual attributes of
//! each device and port, linked according to [`Binding::links`]. Any assignment found by
//! [`portgraph::solve`] maps every testbed link onto a cable in the lab.
//!
//! Links of the testbed refer to devices and ports by their id, while links of the binding refer to
//! them by their concrete name.

use std::collections::{BTreeMap, HashMap};

use binding_proto::{
    Binding, Device, Endpoint, Link, Port, Role, Testbed, TestbedDevice, TestbedPort,
};
use log::debug;
use portgraph::{
    AbstractGraph, Assignment, Attrs, ConcreteGraph, Constraint, Constraints, NodeId, PortGraph,
    PortId, SolveContext, SolveError,
};
use rand::Rng;

use crate::{
    errors::{BindingError, ErrorList, Input},
    options::Resolver,
    reservation::{BoundDevice, Dims, PortDims, Reservation},
};

const ROLE: &str = "role";
const NAME: &str = "name";
const VENDOR: &str = "vendor";
const HARDWARE_MODEL: &str = "hardware_model";
const SOFTWARE_VERSION: &str = "software_version";
const SPEED: &str = "speed";
const PMD: &str = "pmd";

/// Ports of a graph, indexed by the device and port part of a link endpoint.
type EndpointLookup<'a> = HashMap<&'a str, HashMap<&'a str, PortId>>;

/// Find an assignment of lab devices to the devices of `testbed`, such that every testbed link is
/// mapped onto a cable in the lab, and bind the devices accordingly.
///
/// Both graphs are validated before solving, and all problems of both are reported together. The
/// reservation gets a fresh random id.
pub fn build_dynamic_reservation(
    ctx: &SolveContext,
    testbed: &Testbed,
    resolver: &Resolver,
) -> Result<Reservation, BindingError> {
    let mut errors: ErrorList<BindingError> = ErrorList::new();
    let requested = TestbedGraph::new(testbed, &mut errors)?;
    let lab = LabGraph::new(resolver.binding(), &mut errors)?;
    errors.into_result()?;

    debug!(
        "match testbed {:?} ({} devices, {} links) against the lab ({} devices, {} links)",
        testbed.id,
        requested.graph.node_count(),
        requested.graph.edge_count(),
        lab.graph.node_count(),
        lab.graph.edge_count(),
    );
    let assignment = portgraph::solve(ctx, &requested.graph, &lab.graph)?;

    let id = format!("{:016x}", rand::thread_rng().gen::<u64>());
    let reservation = materialize(id, &requested, &lab, &assignment, resolver)?;
    debug!(
        "dynamically bound {} DUTs and {} ATEs in reservation {}",
        reservation.duts().len(),
        reservation.ates().len(),
        reservation.id()
    );
    Ok(reservation)
}

/// The testbed as an abstract port graph.
struct TestbedGraph<'a> {
    graph: AbstractGraph,
    devices: BTreeMap<NodeId, (Role, &'a TestbedDevice)>,
    ports: HashMap<PortId, &'a TestbedPort>,
}

impl<'a> TestbedGraph<'a> {
    fn new(
        testbed: &'a Testbed,
        errors: &mut ErrorList<BindingError>,
    ) -> Result<Self, BindingError> {
        let mut graph = AbstractGraph::new();
        let mut devices = BTreeMap::new();
        let mut ports = HashMap::new();
        let mut lookup: EndpointLookup<'a> = HashMap::new();

        for (role, device) in testbed.all_devices() {
            let mut constraints = Constraints::new();
            constraints.insert(ROLE.to_string(), Constraint::equal(role.as_str()));
            for (key, value) in [
                (VENDOR, &device.vendor),
                (HARDWARE_MODEL, &device.hardware_model),
                (SOFTWARE_VERSION, &device.software_version),
            ] {
                if let Some(value) = value {
                    constraints.insert(key.to_string(), Constraint::equal(value.as_str()));
                }
            }
            for (key, pattern) in [
                (HARDWARE_MODEL, &device.hardware_model_regex),
                (SOFTWARE_VERSION, &device.software_version_regex),
            ] {
                match pattern.as_deref().map(Constraint::regex) {
                    Some(Ok(c)) => {
                        constraints.insert(key.to_string(), c);
                    }
                    Some(Err(source)) => errors.push(BindingError::InvalidPattern {
                        role,
                        id: device.id.clone(),
                        attribute: key,
                        source,
                    }),
                    None => {}
                }
            }
            let node = graph.add_node(device.id.as_str(), constraints);
            devices.insert(node, (role, device));

            let device_ports = lookup.entry(device.id.as_str()).or_default();
            for port in device.ports.iter() {
                let mut constraints = Constraints::new();
                if let Some(speed) = port.speed {
                    constraints.insert(SPEED.to_string(), Constraint::equal(speed.as_str()));
                }
                if let Some(pmd) = port.pmd.as_ref() {
                    constraints.insert(PMD.to_string(), Constraint::equal(pmd.as_str()));
                }
                let id = graph.add_port(node, port.id.as_str(), constraints)?;
                ports.insert(id, port);
                device_ports.insert(port.id.as_str(), id);
            }
        }

        add_links(&mut graph, Input::Testbed, &testbed.links, &lookup, errors);

        Ok(Self {
            graph,
            devices,
            ports,
        })
    }
}

/// The lab as a concrete port graph.
struct LabGraph<'a> {
    graph: ConcreteGraph,
    devices: HashMap<NodeId, &'a Device>,
    ports: HashMap<PortId, &'a Port>,
}

impl<'a> LabGraph<'a> {
    fn new(
        binding: &'a Binding,
        errors: &mut ErrorList<BindingError>,
    ) -> Result<Self, BindingError> {
        let mut graph = ConcreteGraph::new();
        let mut devices = HashMap::new();
        let mut ports = HashMap::new();
        let mut lookup: EndpointLookup<'a> = HashMap::new();

        for (role, device) in binding.all_devices() {
            let mut attrs = Attrs::new();
            attrs.insert(ROLE.to_string(), role.as_str().to_string());
            for (key, value) in [
                (NAME, &device.name),
                (VENDOR, &device.vendor),
                (HARDWARE_MODEL, &device.hardware_model),
                (SOFTWARE_VERSION, &device.software_version),
            ] {
                if !value.is_empty() {
                    attrs.insert(key.to_string(), value.clone());
                }
            }
            let node = graph.add_node(device.name.as_str(), attrs);
            devices.insert(node, device);

            let device_ports = lookup.entry(device.name.as_str()).or_default();
            for port in device.ports.iter() {
                let mut attrs = Attrs::new();
                if let Some(speed) = port.speed {
                    attrs.insert(SPEED.to_string(), speed.as_str().to_string());
                }
                if let Some(pmd) = port.pmd.as_ref() {
                    attrs.insert(PMD.to_string(), pmd.clone());
                }
                let id = graph.add_port(node, port.name.as_str(), attrs)?;
                ports.insert(id, port);
                device_ports.insert(port.name.as_str(), id);
            }
        }

        add_links(&mut graph, Input::Binding, &binding.links, &lookup, errors);

        Ok(Self {
            graph,
            devices,
            ports,
        })
    }
}

/// Add all links to the graph. Links that cannot be added are reported in `errors`.
fn add_links<A>(
    graph: &mut PortGraph<A>,
    input: Input,
    links: &[Link],
    lookup: &EndpointLookup<'_>,
    errors: &mut ErrorList<BindingError>,
) {
    for link in links {
        let (a, b) = match link.endpoints() {
            Ok(endpoints) => endpoints,
            Err(source) => {
                errors.push(BindingError::MalformedEndpoint { input, source });
                continue;
            }
        };
        let a = lookup_endpoint(input, link, a, lookup, errors);
        let b = lookup_endpoint(input, link, b, lookup, errors);
        if let (Some(a), Some(b)) = (a, b) {
            if let Err(source) = graph.add_edge(a, b) {
                errors.push(BindingError::DuplicateLink {
                    input,
                    link: link.to_string(),
                    source,
                });
            }
        }
    }
}

fn lookup_endpoint(
    input: Input,
    link: &Link,
    endpoint: Endpoint<'_>,
    lookup: &EndpointLookup<'_>,
    errors: &mut ErrorList<BindingError>,
) -> Option<PortId> {
    let ports = match lookup.get(endpoint.device) {
        Some(ports) => ports,
        None => {
            errors.push(BindingError::UnknownLinkDevice {
                input,
                link: link.to_string(),
                device: endpoint.device.to_string(),
            });
            return None;
        }
    };
    match ports.get(endpoint.port) {
        Some(port) => Some(*port),
        None => {
            errors.push(BindingError::UnknownLinkPort {
                input,
                link: link.to_string(),
                device: endpoint.device.to_string(),
                port: endpoint.port.to_string(),
            });
            None
        }
    }
}

/// Translate the assignment back into a reservation.
fn materialize(
    id: String,
    requested: &TestbedGraph<'_>,
    lab: &LabGraph<'_>,
    assignment: &Assignment,
    resolver: &Resolver,
) -> Result<Reservation, BindingError> {
    let mut reservation = Reservation::new(id);
    for (node, (role, wanted)) in requested.devices.iter() {
        let device = assignment
            .node(*node)
            .and_then(|n| lab.devices.get(&n))
            .ok_or(SolveError::NoAssignment)?;

        let mut ports = BTreeMap::new();
        let node_ports = requested
            .graph
            .node(*node)
            .map(|n| n.ports())
            .unwrap_or_default();
        for abstract_port in node_ports {
            let testbed_port = requested
                .ports
                .get(abstract_port)
                .ok_or(SolveError::NoAssignment)?;
            let bound = assignment
                .port(*abstract_port)
                .and_then(|p| lab.ports.get(&p))
                .ok_or(SolveError::NoAssignment)?;
            ports.insert(testbed_port.id.clone(), PortDims::new(bound, testbed_port));
        }

        let dims = Dims::new(device, wanted, ports);
        reservation.insert(BoundDevice::new(
            wanted.id.clone(),
            *role,
            dims,
            device,
            resolver.clone(),
        ));
    }
    Ok(reservation)
}
