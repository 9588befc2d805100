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

//! Module to embed an abstract port graph into a concrete port graph.

use std::{
    cmp::Reverse,
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use itertools::Itertools;
use petgraph::visit::Bfs;
use thiserror::Error;

use crate::{
    constraint::satisfied,
    graph::{AbstractGraph, ConcreteGraph, NodeId, PortId},
};

/// Number of search steps between two checks of the deadline and the cancel token.
const CHECK_INTERVAL: usize = 256;

/// Handle to cancel a running [`solve`] from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a new token that is not yet cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel all solves that use this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` if [`CancelToken::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Deadline and cancellation of a single [`solve`] call. The default context never expires.
#[derive(Debug, Clone, Default)]
pub struct SolveContext {
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl SolveContext {
    /// Create a context that never expires.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire the context after `timeout`, starting now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Expire the context at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Expire the context as soon as `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Get the deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns an error if the context was cancelled or the deadline has passed.
    pub fn check(&self) -> Result<(), SolveError> {
        if self.cancel.as_ref().map(|c| c.is_cancelled()).unwrap_or(false) {
            Err(SolveError::Cancelled)
        } else if self.deadline.map(|d| Instant::now() >= d).unwrap_or(false) {
            Err(SolveError::Timeout)
        } else {
            Ok(())
        }
    }
}

/// Result of [`solve`]: a mapping from abstract nodes and ports to concrete nodes and ports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    nodes: BTreeMap<NodeId, NodeId>,
    ports: BTreeMap<PortId, PortId>,
}

impl Assignment {
    /// Concrete node assigned to the abstract node `node`.
    pub fn node(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).copied()
    }

    /// Concrete port assigned to the abstract port `port`.
    pub fn port(&self, port: PortId) -> Option<PortId> {
        self.ports.get(&port).copied()
    }

    /// Iterate over all `(abstract, concrete)` node pairs.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes.iter().map(|(a, c)| (*a, *c))
    }

    /// Iterate over all `(abstract, concrete)` port pairs.
    pub fn ports(&self) -> impl Iterator<Item = (PortId, PortId)> + '_ {
        self.ports.iter().map(|(a, c)| (*a, *c))
    }
}

/// Error thrown by [`solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolveError {
    /// The search space was exhausted.
    #[error("no assignment satisfies all topology and attribute constraints")]
    NoAssignment,
    /// The deadline of the context has passed.
    #[error("solve did not finish before the deadline")]
    Timeout,
    /// The context was cancelled.
    #[error("solve was cancelled")]
    Cancelled,
}

/// Find an assignment of the abstract graph onto the concrete graph. The assignment is injective
/// on both nodes and ports, respects all node and port constraints, and maps every abstract edge
/// onto a concrete edge. The first assignment that is found is returned.
///
/// The search is a backtracking search over one variable per abstract node and port. Nodes are
/// visited in breadth-first order, starting at the node with the highest degree, such that
/// neighboring nodes are assigned close to each other and inconsistent choices are detected
/// early. Each node is directly followed by its ports, linked ports first.
pub fn solve(
    ctx: &SolveContext,
    abs: &AbstractGraph,
    con: &ConcreteGraph,
) -> Result<Assignment, SolveError> {
    log::debug!(
        "Solving {} nodes, {} ports and {} edges onto {} nodes, {} ports and {} edges",
        abs.node_count(),
        abs.port_count(),
        abs.edge_count(),
        con.node_count(),
        con.port_count(),
        con.edge_count(),
    );
    ctx.check()?;

    if abs.node_count() > con.node_count()
        || abs.port_count() > con.port_count()
        || abs.edge_count() > con.edge_count()
    {
        log::debug!("Concrete graph is too small.");
        return Err(SolveError::NoAssignment);
    }

    let node_candidates: Vec<Vec<NodeId>> = abs
        .node_ids()
        .map(|a| {
            con.node_ids()
                .filter(|c| node_compatible(abs, a, con, *c))
                .collect()
        })
        .collect();

    if let Some(a) = abs
        .node_ids()
        .find(|a| node_candidates[a.index()].is_empty())
    {
        log::debug!(
            "No candidate for {}",
            abs.node(a).map(|n| n.desc.as_str()).unwrap_or("?")
        );
        return Err(SolveError::NoAssignment);
    }

    let mut search = Search {
        ctx,
        abs,
        con,
        order: variable_order(abs),
        node_candidates,
        node_map: vec![None; abs.node_count()],
        port_map: vec![None; abs.port_count()],
        node_used: vec![false; con.node_count()],
        port_used: vec![false; con.port_count()],
        steps: 0,
    };

    let found = search.run(0);
    log::debug!("Search explored {} states", search.steps);

    if found? {
        Ok(search.assignment())
    } else {
        Err(SolveError::NoAssignment)
    }
}

/// A single decision of the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Var {
    Node(NodeId),
    Port(PortId),
}

/// Compute the order in which variables are assigned. Each connected component is traversed in
/// BFS order starting from the node with the highest degree.
fn variable_order(abs: &AbstractGraph) -> Vec<Var> {
    let g = abs.graph();
    let mut visited = vec![false; abs.node_count()];
    let mut order = Vec::with_capacity(abs.node_count() + abs.port_count());

    while let Some(start) = g
        .node_indices()
        .filter(|n| !visited[n.index()])
        .max_by_key(|n| (g.neighbors(*n).count(), Reverse(n.index())))
    {
        let mut bfs = Bfs::new(g, start);
        while let Some(n) = bfs.next(g) {
            if visited[n.index()] {
                continue;
            }
            visited[n.index()] = true;
            order.push(Var::Node(n));
            let ports = abs.node(n).map(|x| x.ports()).unwrap_or_default();
            order.extend(
                ports
                    .iter()
                    .copied()
                    .sorted_by_key(|p| abs.port(*p).and_then(|x| x.peer()).is_none())
                    .map(Var::Port),
            );
        }
    }

    order
}

/// Static check whether the concrete node `c` could ever be assigned to the abstract node `a`.
fn node_compatible(abs: &AbstractGraph, a: NodeId, con: &ConcreteGraph, c: NodeId) -> bool {
    let (Some(an), Some(cn)) = (abs.node(a), con.node(c)) else {
        return false;
    };
    if !satisfied(&an.props, &cn.props) || an.ports().len() > cn.ports().len() {
        return false;
    }
    // every abstract port needs at least one candidate port
    an.ports().iter().filter_map(|p| abs.port(*p)).all(|ap| {
        cn.ports().iter().filter_map(|p| con.port(*p)).any(|cp| {
            satisfied(&ap.props, &cp.props) && (ap.peer().is_none() || cp.peer().is_some())
        })
    })
}

/// State of the backtracking search.
struct Search<'a> {
    ctx: &'a SolveContext,
    abs: &'a AbstractGraph,
    con: &'a ConcreteGraph,
    order: Vec<Var>,
    node_candidates: Vec<Vec<NodeId>>,
    node_map: Vec<Option<NodeId>>,
    port_map: Vec<Option<PortId>>,
    node_used: Vec<bool>,
    port_used: Vec<bool>,
    steps: usize,
}

impl<'a> Search<'a> {
    /// Assign the variable at `depth` and all following ones. Returns `Ok(true)` if a complete
    /// assignment was found, in which case the state is left as is.
    fn run(&mut self, depth: usize) -> Result<bool, SolveError> {
        self.steps += 1;
        if self.steps % CHECK_INTERVAL == 0 {
            self.ctx.check()?;
        }

        let Some(var) = self.order.get(depth).copied() else {
            return Ok(true);
        };

        match var {
            Var::Node(a) => {
                for i in 0..self.node_candidates[a.index()].len() {
                    let c = self.node_candidates[a.index()][i];
                    if self.node_used[c.index()] || !self.node_consistent(a, c) {
                        continue;
                    }
                    self.node_map[a.index()] = Some(c);
                    self.node_used[c.index()] = true;
                    if self.run(depth + 1)? {
                        return Ok(true);
                    }
                    self.node_map[a.index()] = None;
                    self.node_used[c.index()] = false;
                }
            }
            Var::Port(p) => {
                let con = self.con;
                let Some(c) = self
                    .abs
                    .port(p)
                    .and_then(|ap| self.node_map[ap.node().index()])
                else {
                    return Ok(false);
                };
                let ports = con.node(c).map(|n| n.ports()).unwrap_or_default();
                for &cp in ports {
                    if self.port_used[cp.index()] || !self.port_consistent(p, cp) {
                        continue;
                    }
                    self.port_map[p.index()] = Some(cp);
                    self.port_used[cp.index()] = true;
                    if self.run(depth + 1)? {
                        return Ok(true);
                    }
                    self.port_map[p.index()] = None;
                    self.port_used[cp.index()] = false;
                }
            }
        }

        Ok(false)
    }

    /// Check that assigning `c` to `a` is consistent with all nodes and ports assigned so far.
    fn node_consistent(&self, a: NodeId, c: NodeId) -> bool {
        let g = self.abs.graph();

        // there must be enough links towards every neighbor that is already assigned
        for b in g.neighbors(a).unique() {
            let cb = if b == a {
                Some(c)
            } else {
                self.node_map[b.index()]
            };
            if let Some(cb) = cb {
                if self.abs.edges_between(a, b) > self.con.edges_between(c, cb) {
                    return false;
                }
            }
        }

        // ports linked to an already assigned port must find their peer on `c`.
        let ports = self.abs.node(a).map(|n| n.ports()).unwrap_or_default();
        ports
            .iter()
            .filter_map(|p| self.abs.port(*p).and_then(|x| x.peer()))
            .filter_map(|q| self.port_map[q.index()])
            .all(|cq| {
                self.con
                    .port(cq)
                    .and_then(|x| x.peer())
                    .and_then(|x| self.con.port(x).map(|y| (x, y.node())))
                    .map(|(x, node)| node == c && !self.port_used[x.index()])
                    .unwrap_or(false)
            })
    }

    /// Check that assigning `cp` to `p` is consistent with all nodes and ports assigned so far.
    fn port_consistent(&self, p: PortId, cp: PortId) -> bool {
        let (Some(ap), Some(cport)) = (self.abs.port(p), self.con.port(cp)) else {
            return false;
        };
        if !satisfied(&ap.props, &cport.props) {
            return false;
        }
        let Some(q) = ap.peer() else {
            return true;
        };
        let Some(cpeer) = cport.peer() else {
            return false;
        };
        if let Some(cq) = self.port_map[q.index()] {
            return cpeer == cq;
        }
        if self.port_used[cpeer.index()] {
            return false;
        }
        let Some(peer_node) = self.con.port(cpeer).map(|x| x.node()) else {
            return false;
        };
        match self.abs.port(q).and_then(|x| self.node_map[x.node().index()]) {
            Some(cn) => peer_node == cn,
            None => !self.node_used[peer_node.index()],
        }
    }

    /// Extract the assignment from the current state.
    fn assignment(&self) -> Assignment {
        Assignment {
            nodes: self
                .abs
                .node_ids()
                .filter_map(|a| self.node_map[a.index()].map(|c| (a, c)))
                .collect(),
            ports: self
                .abs
                .port_ids()
                .filter_map(|p| self.port_map[p.index()].map(|c| (p, c)))
                .collect(),
        }
    }
}
