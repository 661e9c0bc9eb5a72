//! The simulation context: single owner of node state and the edge list.
//!
//! Force engine, layouts and interaction all borrow the same [`SimulationContext`] in program
//! order on one thread, so no locking is involved.

use std::collections::{HashMap, HashSet};

use eframe::egui::{Pos2, Vec2};
use tracing::{debug, warn};

use crate::model::{EdgeKind, EdgeRecord, GraphData, NodeKind, NodeRecord};

const RADIUS_PER_SQRT_CONNECTION: f32 = 2.5;
const MAX_RADIUS_FACTOR: f32 = 2.4;

#[derive(Clone, Debug, PartialEq)]
pub struct NodeState {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub file_path: Option<String>,
    pub position: Pos2,
    pub velocity: Vec2,
    /// When set the simulation leaves the node at this position.
    pub pinned: Option<Pos2>,
    pub radius: f32,
    pub connections: usize,
}

impl NodeState {
    fn from_record(record: &NodeRecord, position: Pos2) -> Self {
        Self {
            id: record.id.clone(),
            name: record.display_name().to_owned(),
            kind: record.kind,
            file_path: record.file_path.clone(),
            position,
            velocity: Vec2::ZERO,
            pinned: None,
            radius: 0.0,
            connections: 0,
        }
    }

    pub fn pin(&mut self, at: Pos2) {
        self.position = at;
        self.pinned = Some(at);
        self.velocity = Vec2::ZERO;
    }

    pub fn unpin(&mut self) {
        self.pinned = None;
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub kind: EdgeKind,
    pub weight: f32,
}

impl Link {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub nodes: usize,
    pub links: usize,
    pub dangling_edges: usize,
    pub duplicate_nodes: usize,
    pub new_nodes: usize,
}

#[derive(Clone, Debug, Default)]
pub struct SimulationContext {
    nodes: Vec<NodeState>,
    index_by_id: HashMap<String, usize>,
    edges: Vec<EdgeRecord>,
    links: Vec<Link>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl SimulationContext {
    pub fn from_data(data: &GraphData, node_size: f32) -> Self {
        let mut context = Self::default();
        context.replace(data, Pos2::ZERO, node_size);
        context
    }

    /// Replaces nodes and edges wholesale.
    ///
    /// Nodes whose id survives keep position, velocity and pin; new nodes start at `spawn_at`
    /// with zero velocity.
    pub fn replace(&mut self, data: &GraphData, spawn_at: Pos2, node_size: f32) -> RefreshSummary {
        let mut prior_nodes = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect::<HashMap<_, _>>();

        let mut summary = RefreshSummary::default();
        let mut nodes = Vec::with_capacity(data.nodes.len());
        let mut index_by_id = HashMap::with_capacity(data.nodes.len());
        for record in &data.nodes {
            if index_by_id.contains_key(&record.id) {
                summary.duplicate_nodes += 1;
                continue;
            }

            let node = match prior_nodes.remove(&record.id) {
                Some(prior) => NodeState {
                    name: record.display_name().to_owned(),
                    kind: record.kind,
                    file_path: record.file_path.clone(),
                    ..prior
                },
                None => {
                    summary.new_nodes += 1;
                    NodeState::from_record(record, spawn_at)
                }
            };
            index_by_id.insert(record.id.clone(), nodes.len());
            nodes.push(node);
        }

        let mut links = Vec::with_capacity(data.edges.len());
        for edge in &data.edges {
            match (index_by_id.get(&edge.source), index_by_id.get(&edge.target)) {
                (Some(&source), Some(&target)) => links.push(Link {
                    source,
                    target,
                    kind: edge.kind,
                    weight: if edge.weight.is_finite() && edge.weight > 0.0 {
                        edge.weight
                    } else {
                        1.0
                    },
                }),
                _ => summary.dangling_edges += 1,
            }
        }

        self.nodes = nodes;
        self.index_by_id = index_by_id;
        self.edges = data.edges.clone();
        self.links = links;
        self.rebuild_adjacency(node_size);

        summary.nodes = self.nodes.len();
        summary.links = self.links.len();
        if summary.duplicate_nodes > 0 {
            warn!(
                duplicates = summary.duplicate_nodes,
                "ignoring nodes with duplicate ids"
            );
        }
        if summary.dangling_edges > 0 {
            warn!(
                dangling = summary.dangling_edges,
                "edges reference unknown nodes and will not be drawn"
            );
        }
        debug!(
            nodes = summary.nodes,
            links = summary.links,
            new_nodes = summary.new_nodes,
            "graph data refreshed"
        );
        summary
    }

    fn rebuild_adjacency(&mut self, node_size: f32) {
        let count = self.nodes.len();
        let mut outgoing = vec![Vec::new(); count];
        let mut incoming = vec![Vec::new(); count];
        let mut seen = HashSet::new();
        for link in &self.links {
            if link.is_self_loop() || !seen.insert((link.source, link.target)) {
                continue;
            }
            outgoing[link.source].push(link.target);
            incoming[link.target].push(link.source);
        }

        for (index, node) in self.nodes.iter_mut().enumerate() {
            node.connections = outgoing[index].len() + incoming[index].len();
            node.radius = node_radius(node_size, node.connections);
        }
        self.outgoing = outgoing;
        self.incoming = incoming;
    }

    pub fn set_node_size(&mut self, node_size: f32) {
        for node in &mut self.nodes {
            node.radius = node_radius(node_size, node.connections);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NodeState] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [NodeState] {
        &mut self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&NodeState> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut NodeState> {
        self.nodes.get_mut(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&NodeState> {
        self.index_of(id).and_then(|index| self.nodes.get(index))
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn outgoing(&self, index: usize) -> &[usize] {
        self.outgoing.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incoming(&self, index: usize) -> &[usize] {
        self.incoming.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.outgoing(index)
            .iter()
            .chain(self.incoming(index))
            .copied()
    }

    pub fn positions(&self) -> Vec<Pos2> {
        self.nodes.iter().map(|node| node.position).collect()
    }

    pub fn apply_positions(&mut self, positions: &[Pos2], pin: bool) {
        for (node, &position) in self.nodes.iter_mut().zip(positions) {
            if pin {
                node.pin(position);
            } else {
                node.position = position;
                node.velocity = Vec2::ZERO;
                node.pinned = None;
            }
        }
    }

    pub fn unpin_all(&mut self) {
        for node in &mut self.nodes {
            node.unpin();
        }
    }
}

fn node_radius(node_size: f32, connections: usize) -> f32 {
    (node_size + (connections as f32).sqrt() * RADIUS_PER_SQRT_CONNECTION)
        .min(node_size * MAX_RADIUS_FACTOR)
}
