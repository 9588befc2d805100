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

#![deny(missing_docs, missing_debug_implementations)]

//! # PortGraph
//!
//! Graphs whose edges connect *ports* of nodes rather than the nodes themselves, and a solver that
//! embeds an abstract port graph into a concrete one.
//!
//! ## Main Concepts
//!
//! An [`AbstractGraph`] describes what is required: nodes and ports carry [`Constraint`]s on
//! named attributes, and edges are links that must exist. A [`ConcreteGraph`] describes what is
//! available: nodes and ports carry plain attribute values, and edges are the links that actually
//! exist. Both are stored on a [Petgraph](https://docs.rs/petgraph/latest/petgraph/index.html)
//! graph, where each edge is annotated with the two ports it connects.
//!
//! [`solve`] searches for an [`Assignment`] that maps every abstract node to a distinct concrete
//! node, and every abstract port to a distinct port of the assigned concrete node, such that all
//! constraints are satisfied and every abstract edge maps onto a concrete edge. The search is a
//! backtracking search. The first valid assignment is returned; no ranking between several valid
//! assignments is done.
//!
//! ## Example usage
//!
//! ```
//! use portgraph::*;
//!
//! let mut abs = AbstractGraph::default();
//! let role = |r: &str| Constraints::from([("role".to_string(), Constraint::equal(r))]);
//! let a = abs.add_node("dut", role("DUT"));
//! let a1 = abs.add_port(a, "port1", Constraints::new()).unwrap();
//! let b = abs.add_node("ate", role("ATE"));
//! let b1 = abs.add_port(b, "port1", Constraints::new()).unwrap();
//! abs.add_edge(a1, b1).unwrap();
//!
//! let mut con = ConcreteGraph::default();
//! let role = |r: &str| Attrs::from([("role".to_string(), r.to_string())]);
//! let r = con.add_node("r1", role("DUT"));
//! let r1 = con.add_port(r, "Ethernet1", Attrs::new()).unwrap();
//! let x = con.add_node("ixia", role("ATE"));
//! let x1 = con.add_port(x, "1/1", Attrs::new()).unwrap();
//! con.add_edge(r1, x1).unwrap();
//!
//! let assignment = solve(&SolveContext::default(), &abs, &con).unwrap();
//! assert_eq!(assignment.node(a), Some(r));
//! assert_eq!(assignment.port(b1), Some(x1));
//! ```

mod constraint;
mod graph;
mod solve;

pub use constraint::{Attrs, Constraint, Constraints};
pub use regex::Error as RegexError;
pub use graph::{
    AbstractGraph, ConcreteGraph, GraphError, NodeId, PortGraph, PortGraphNode, PortGraphPort,
    PortId,
};
pub use solve::{solve, Assignment, CancelToken, SolveContext, SolveError};

#[cfg(test)]
mod test;
