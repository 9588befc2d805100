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

//! Module containing the port graph datastructure.

use petgraph::{graph::UnGraph, prelude::*};
use thiserror::Error;

use crate::constraint::{Attrs, Constraints};

pub(crate) type IndexType = u32;
/// Node identification (and index into the graph)
pub type NodeId = NodeIndex<IndexType>;

/// Port identification. Ports are only valid for the graph that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortId(IndexType);

impl PortId {
    /// Index of the port in the graph.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Graph describing the required nodes, ports and links.
pub type AbstractGraph = PortGraph<Constraints>;
/// Graph describing the available nodes, ports and links.
pub type ConcreteGraph = PortGraph<Attrs>;

/// A node of a [`PortGraph`].
#[derive(Debug, Clone)]
pub struct PortGraphNode<A> {
    /// Description of the node, used for logging and error messages.
    pub desc: String,
    /// Constraints (abstract graph) or attributes (concrete graph) of the node.
    pub props: A,
    ports: Vec<PortId>,
}

impl<A> PortGraphNode<A> {
    /// All ports of this node, in the order they were added.
    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }
}

/// A port of a [`PortGraph`].
#[derive(Debug, Clone)]
pub struct PortGraphPort<A> {
    /// Description of the port, used for logging and error messages.
    pub desc: String,
    /// Constraints (abstract graph) or attributes (concrete graph) of the port.
    pub props: A,
    node: NodeId,
    peer: Option<PortId>,
}

impl<A> PortGraphPort<A> {
    /// Node to which the port belongs.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Port on the other end of the link, if the port is linked.
    pub fn peer(&self) -> Option<PortId> {
        self.peer
    }
}

/// Graph in which edges connect ports instead of nodes. Each port is part of at most one edge.
///
/// The topology is stored in an undirected petgraph graph; each edge is annotated with the two
/// ports that it connects.
#[derive(Debug, Clone)]
pub struct PortGraph<A> {
    graph: UnGraph<PortGraphNode<A>, (PortId, PortId), IndexType>,
    ports: Vec<PortGraphPort<A>>,
}

impl<A> Default for PortGraph<A> {
    fn default() -> Self {
        Self {
            graph: Default::default(),
            ports: Default::default(),
        }
    }
}

impl<A> PortGraph<A> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node without any ports.
    pub fn add_node(&mut self, desc: impl Into<String>, props: A) -> NodeId {
        self.graph.add_node(PortGraphNode {
            desc: desc.into(),
            props,
            ports: Vec::new(),
        })
    }

    /// Add a port to an existing node.
    pub fn add_port(
        &mut self,
        node: NodeId,
        desc: impl Into<String>,
        props: A,
    ) -> Result<PortId, GraphError> {
        let id = PortId(self.ports.len() as IndexType);
        self.graph
            .node_weight_mut(node)
            .ok_or(GraphError::UnknownNode(node))?
            .ports
            .push(id);
        self.ports.push(PortGraphPort {
            desc: desc.into(),
            props,
            node,
            peer: None,
        });
        Ok(id)
    }

    /// Connect two ports. Each port can only be connected once, and a port cannot be connected to
    /// itself.
    pub fn add_edge(&mut self, a: PortId, b: PortId) -> Result<EdgeIndex<IndexType>, GraphError> {
        let pa = self.ports.get(a.index()).ok_or(GraphError::UnknownPort(a))?;
        let pb = self.ports.get(b.index()).ok_or(GraphError::UnknownPort(b))?;
        if a == b {
            return Err(GraphError::SelfLink(self.port_desc(a)));
        }
        if pa.peer.is_some() {
            return Err(GraphError::PortInUse(self.port_desc(a)));
        }
        if pb.peer.is_some() {
            return Err(GraphError::PortInUse(self.port_desc(b)));
        }
        let (na, nb) = (pa.node, pb.node);
        self.ports[a.index()].peer = Some(b);
        self.ports[b.index()].peer = Some(a);
        Ok(self.graph.add_edge(na, nb, (a, b)))
    }

    /// Get a node.
    pub fn node(&self, id: NodeId) -> Option<&PortGraphNode<A>> {
        self.graph.node_weight(id)
    }

    /// Get a port.
    pub fn port(&self, id: PortId) -> Option<&PortGraphPort<A>> {
        self.ports.get(id.index())
    }

    /// Iterate over all nodes, in the order they were added.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    /// Iterate over all ports, in the order they were added.
    pub fn port_ids(&self) -> impl Iterator<Item = PortId> {
        (0..self.ports.len()).map(|i| PortId(i as IndexType))
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of ports
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of edges between the two nodes. Edges from a node to itself are counted once.
    pub fn edges_between(&self, a: NodeId, b: NodeId) -> usize {
        self.graph.edges_connecting(a, b).count()
    }

    /// Reference to the underlying petgraph graph.
    pub fn graph(&self) -> &UnGraph<PortGraphNode<A>, (PortId, PortId), IndexType> {
        &self.graph
    }

    /// Description of a port including its node, as `"node:port"`.
    pub fn port_desc(&self, id: PortId) -> String {
        match self.port(id) {
            Some(p) => format!(
                "{}:{}",
                self.node(p.node).map(|n| n.desc.as_str()).unwrap_or("?"),
                p.desc
            ),
            None => format!("{id:?}"),
        }
    }
}

/// Error thrown while building a port graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The node does not exist in this graph.
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
    /// The port does not exist in this graph.
    #[error("port {0:?} does not exist")]
    UnknownPort(PortId),
    /// The port is already part of another edge.
    #[error("port {0} is already linked")]
    PortInUse(String),
    /// Both ends of the edge are the same port.
    #[error("port {0} cannot be linked to itself")]
    SelfLink(String),
}
