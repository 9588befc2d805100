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

use std::collections::HashSet;

use crate::{AbstractGraph, Assignment, ConcreteGraph};


/// Assert that the assignment is injective, that every port is mapped onto a port of the assigned
/// node, and that every abstract edge is mapped onto a concrete edge.
fn assert_valid(abs: &AbstractGraph, con: &ConcreteGraph, assignment: &Assignment) {
    let nodes: HashSet<_> = assignment.nodes().map(|(_, c)| c).collect();
    assert_eq!(nodes.len(), abs.node_count(), "nodes are not mapped injectively");
    let ports: HashSet<_> = assignment.ports().map(|(_, c)| c).collect();
    assert_eq!(ports.len(), abs.port_count(), "ports are not mapped injectively");

    for p in abs.port_ids() {
        let ap = abs.port(p).unwrap();
        let cp = con.port(assignment.port(p).unwrap()).unwrap();
        assert_eq!(assignment.node(ap.node()), Some(cp.node()));
        if let Some(q) = ap.peer() {
            assert_eq!(cp.peer(), assignment.port(q), "abstract edge is not preserved");
        }
    }
}
