use std::collections::BinaryHeap;

use hashbrown::HashMap;
use petgraph::visit::EdgeRef;

use super::state::State;
use crate::{Distance, Error, NodeId, RoadGraph};

/// Minimum distance from any source to every node reached within the cutoff.
/// Nodes beyond the cutoff are absent rather than stored as infinite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceField {
    distances: HashMap<NodeId, Distance>,
}

impl DistanceField {
    pub fn get(&self, node: NodeId) -> Option<Distance> {
        self.distances.get(&node).copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.distances.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Reached nodes in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Distance)> + '_ {
        self.distances.iter().map(|(node, dist)| (*node, *dist))
    }

    /// Reached nodes ordered by node index
    pub fn sorted(&self) -> Vec<(NodeId, Distance)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by_key(|(node, _)| *node);
        entries
    }
}

/// Multi-source Dijkstra over the road graph.
///
/// Every source is pushed onto the heap at distance 0 before the first pop,
/// so the frontier is shared and each node settles at its minimum distance
/// over all sources. Duplicate sources are ignored.
///
/// # Errors
///
/// * `InvalidGraph` if any edge weight or the cutoff is negative or NaN
/// * `InvalidNodeIndex` if a source is not part of the graph
pub fn compute_field(
    graph: &RoadGraph,
    sources: &[NodeId],
    cutoff: Distance,
) -> Result<DistanceField, Error> {
    if cutoff.is_nan() || cutoff < 0.0 {
        return Err(Error::InvalidGraph(format!(
            "cutoff must be a non-negative distance, got {cutoff}"
        )));
    }
    validate_weights(graph)?;
    for &source in sources {
        graph.validate_node(source)?;
    }

    let estimated_nodes = graph.node_count().min(4096);
    let mut distances: HashMap<NodeId, Distance> = HashMap::with_capacity(estimated_nodes);
    let mut heap = BinaryHeap::with_capacity(sources.len().max(estimated_nodes / 4));

    // All sources start at distance 0
    for &source in sources {
        if distances.insert(source, 0.0).is_none() {
            heap.push(State {
                cost: 0.0,
                node: source,
            });
        }
    }

    while let Some(State { cost, node }) = heap.pop() {
        // Skip if we've found a better path
        if let Some(&best) = distances.get(&node)
            && cost > best
        {
            continue;
        }

        for edge in graph.edges(node) {
            let next = edge.target();
            let next_cost = cost + edge.weight().length;

            if next_cost > cutoff {
                continue;
            }

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    Ok(DistanceField { distances })
}

/// Distances from a single source, same semantics as [`compute_field`]
pub fn single_source_distances(
    graph: &RoadGraph,
    source: NodeId,
    cutoff: Distance,
) -> Result<DistanceField, Error> {
    compute_field(graph, &[source], cutoff)
}

fn validate_weights(graph: &RoadGraph) -> Result<(), Error> {
    match graph
        .edge_weights()
        .find(|edge| edge.length.is_nan() || edge.length < 0.0)
    {
        Some(edge) => Err(Error::InvalidGraph(format!(
            "edge weight {} is negative or not a number",
            edge.length
        ))),
        None => Ok(()),
    }
}
