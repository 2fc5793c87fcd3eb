//! Projected road graph used for shortest-path search

use petgraph::graph::{DiGraph, EdgeIndex, EdgeReference};
use petgraph::Direction;

use super::components::{RoadEdge, RoadNode};
use crate::model::Crs;
use crate::{Error, NodeId};

/// Directed road graph with node coordinates in `crs`.
///
/// Two-way roads are stored as a pair of opposite directed edges.
#[derive(Debug, Clone)]
pub struct RoadGraph {
    pub(crate) graph: DiGraph<RoadNode, RoadEdge>,
    crs: Crs,
}

impl RoadGraph {
    pub fn new(crs: Crs) -> Self {
        Self {
            graph: DiGraph::new(),
            crs,
        }
    }

    pub fn with_capacity(crs: Crs, nodes: usize, edges: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(nodes, edges),
            crs,
        }
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn add_node(&mut self, node: RoadNode) -> NodeId {
        self.graph.add_node(node)
    }

    /// Adds a one-way segment from `from` to `to`
    ///
    /// # Errors
    ///
    /// Returns `InvalidNodeIndex` if either endpoint is not in the graph
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, length: f64) -> Result<EdgeIndex, Error> {
        self.validate_node(from)?;
        self.validate_node(to)?;
        Ok(self.graph.add_edge(from, to, RoadEdge { length }))
    }

    /// Adds a two-way segment between `a` and `b`
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length: f64) -> Result<(), Error> {
        self.add_edge(a, b, length)?;
        self.add_edge(b, a, length)?;
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&RoadNode> {
        self.graph.node_weight(id)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Iterates over all nodes with their identifiers
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &RoadNode)> {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// Outgoing edges of `node`
    pub fn edges(&self, node: NodeId) -> impl Iterator<Item = EdgeReference<'_, RoadEdge>> {
        self.graph.edges_directed(node, Direction::Outgoing)
    }

    pub fn edge_weights(&self) -> impl Iterator<Item = &RoadEdge> {
        self.graph.edge_weights()
    }

    pub(crate) fn validate_node(&self, node: NodeId) -> Result<(), Error> {
        if node.index() < self.graph.node_count() {
            Ok(())
        } else {
            Err(Error::InvalidNodeIndex)
        }
    }
}
