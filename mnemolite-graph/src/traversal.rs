//! Graph Traversal: bounded-depth, cycle-safe traversal and shortest-path
//! search over a built graph.
//!
//! Plain visited-set plus `VecDeque` BFS, direction-aware edge iteration
//! over the builder's persisted nodes and edges.

use std::collections::{HashMap, HashSet, VecDeque};

use uuid::Uuid;

use crate::model::{Edge, GraphStats, Node, RelationType};

pub const DEFAULT_MAX_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outbound,
    Inbound,
}

/// A node reached during traversal, with the depth at which it was first
/// seen (ties resolved in BFS order, so this is always the minimal depth).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reached {
    pub node_id: Uuid,
    pub depth: usize,
}

/// An adjacency view over one repository's nodes/edges, built once and
/// reused across traversal calls.
pub struct GraphView<'a> {
    nodes: HashMap<Uuid, &'a Node>,
    outbound: HashMap<Uuid, Vec<&'a Edge>>,
    inbound: HashMap<Uuid, Vec<&'a Edge>>,
}

impl<'a> GraphView<'a> {
    pub fn new(nodes: &'a [Node], edges: &'a [Edge]) -> Self {
        let mut node_map = HashMap::with_capacity(nodes.len());
        for n in nodes {
            node_map.insert(n.id, n);
        }
        let mut outbound: HashMap<Uuid, Vec<&Edge>> = HashMap::new();
        let mut inbound: HashMap<Uuid, Vec<&Edge>> = HashMap::new();
        for e in edges {
            outbound.entry(e.source_node_id).or_default().push(e);
            inbound.entry(e.target_node_id).or_default().push(e);
        }
        Self { nodes: node_map, outbound, inbound }
    }

    fn edges_from(&self, node: Uuid, direction: Direction) -> &[&'a Edge] {
        let map = match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        };
        map.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns nodes reachable from `start` within `max_depth` hops,
    /// deduplicated, each tagged with the depth at which it was first
    /// reached. Cycle-safe: a node already visited on this walk is never
    /// re-expanded, so a cycle in the underlying graph cannot loop forever
    /// or produce duplicate entries.
    pub fn traverse(
        &self,
        start: Uuid,
        direction: Direction,
        relation_type: Option<RelationType>,
        max_depth: usize,
    ) -> Vec<Reached> {
        let max_depth = max_depth.min(DEFAULT_MAX_DEPTH);
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut out = Vec::new();

        visited.insert(start);
        queue.push_back((start, 0usize));

        while let Some((node, depth)) = queue.pop_front() {
            if depth == max_depth {
                continue;
            }
            for edge in self.edges_from(node, direction) {
                if let Some(rt) = relation_type {
                    if edge.relation_type != rt {
                        continue;
                    }
                }
                let neighbor = match direction {
                    Direction::Outbound => edge.target_node_id,
                    Direction::Inbound => edge.source_node_id,
                };
                if visited.insert(neighbor) {
                    out.push(Reached { node_id: neighbor, depth: depth + 1 });
                    queue.push_back((neighbor, depth + 1));
                }
            }
        }

        out
    }

    /// Minimal-hop path from `from` to `to` following outbound edges, or
    /// `None` if no path exists within the graph's current edge set.
    pub fn shortest_path(
        &self,
        from: Uuid,
        to: Uuid,
        relation_type: Option<RelationType>,
    ) -> Option<Vec<Uuid>> {
        if from == to {
            return Some(vec![from]);
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut parent: HashMap<Uuid, Uuid> = HashMap::new();

        visited.insert(from);
        queue.push_back(from);

        while let Some(node) = queue.pop_front() {
            for edge in self.edges_from(node, Direction::Outbound) {
                if let Some(rt) = relation_type {
                    if edge.relation_type != rt {
                        continue;
                    }
                }
                let neighbor = edge.target_node_id;
                if visited.insert(neighbor) {
                    parent.insert(neighbor, node);
                    if neighbor == to {
                        return Some(reconstruct_path(&parent, from, to));
                    }
                    queue.push_back(neighbor);
                }
            }
        }

        None
    }

    pub fn stats(&self, repository: &str) -> GraphStats {
        let mut nodes_by_type: HashMap<String, usize> = HashMap::new();
        let mut node_count = 0;
        for n in self.nodes.values() {
            if n.repository != repository {
                continue;
            }
            node_count += 1;
            *nodes_by_type.entry(format!("{:?}", n.node_type).to_lowercase()).or_insert(0) += 1;
        }

        let mut edges_by_relation: HashMap<String, usize> = HashMap::new();
        let mut edge_count = 0;
        for edges in self.outbound.values() {
            for e in edges {
                if self.nodes.get(&e.source_node_id).map(|n| n.repository.as_str()) != Some(repository) {
                    continue;
                }
                edge_count += 1;
                *edges_by_relation.entry(format!("{:?}", e.relation_type).to_lowercase()).or_insert(0) += 1;
            }
        }

        GraphStats { node_count, edge_count, edges_by_relation, nodes_by_type }
    }
}

fn reconstruct_path(parent: &HashMap<Uuid, Uuid>, from: Uuid, to: Uuid) -> Vec<Uuid> {
    let mut path = vec![to];
    let mut cur = to;
    while cur != from {
        cur = parent[&cur];
        path.push(cur);
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeType;

    fn node(repo: &str) -> Node {
        Node {
            id: Uuid::new_v4(),
            repository: repo.to_string(),
            node_type: NodeType::Function,
            label: "n".to_string(),
            properties: HashMap::new(),
        }
    }

    fn edge(source: Uuid, target: Uuid) -> Edge {
        Edge {
            source_node_id: source,
            target_node_id: target,
            relation_type: RelationType::Calls,
            properties: HashMap::new(),
        }
    }

    #[test]
    fn traverse_is_cycle_safe_and_depth_bounded() {
        let a = node("repo");
        let b = node("repo");
        let c = node("repo");
        let (ida, idb, idc) = (a.id, b.id, c.id);
        let nodes = vec![a, b, c];
        let edges = vec![edge(ida, idb), edge(idb, idc), edge(idc, ida)];
        let view = GraphView::new(&nodes, &edges);

        let reached = view.traverse(ida, Direction::Outbound, None, 3);
        assert_eq!(reached.len(), 2);
        assert!(reached.iter().all(|r| r.node_id != ida));
    }

    #[test]
    fn shortest_path_finds_minimal_hop_route() {
        let a = node("repo");
        let b = node("repo");
        let c = node("repo");
        let (ida, idb, idc) = (a.id, b.id, c.id);
        let nodes = vec![a, b, c];
        let edges = vec![edge(ida, idb), edge(idb, idc)];
        let view = GraphView::new(&nodes, &edges);

        let path = view.shortest_path(ida, idc, None).unwrap();
        assert_eq!(path, vec![ida, idb, idc]);
    }

    #[test]
    fn shortest_path_none_when_unreachable() {
        let a = node("repo");
        let b = node("repo");
        let (ida, idb) = (a.id, b.id);
        let nodes = vec![a, b];
        let view = GraphView::new(&nodes, &[]);
        assert_eq!(view.shortest_path(ida, idb, None), None);
    }
}
