use crate::model::{NodeType, StepId, StepStatus};

pub const TERMINAL_NODE_ID: &str = "__goal_complete";
const FORK_PREFIX: &str = "__fork_";
const JOIN_PREFIX: &str = "__join_";

pub fn fork_node_id(group: usize) -> String {
    format!("{FORK_PREFIX}{group}")
}

pub fn join_node_id(group: usize) -> String {
    format!("{JOIN_PREFIX}{group}")
}

/// Ids the engine gives to junctions and the terminal. Steps may not use them.
pub fn is_reserved_node_id(id: &str) -> bool {
    id == TERMINAL_NODE_ID || id.starts_with(FORK_PREFIX) || id.starts_with(JOIN_PREFIX)
}

pub fn edge_id(from: &str, to: &str) -> String {
    format!("{from}->{to}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JunctionKind {
    Fork,
    Join,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Step(NodeType),
    Junction(JunctionKind),
    Terminal,
}

impl NodeKind {
    pub fn is_junction(self) -> bool {
        matches!(self, NodeKind::Junction(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    /// `None` for junctions, which carry no progress state.
    pub status: Option<StepStatus>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Position came from the server rather than the engine.
    pub pinned: bool,
}

impl NodeLayout {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn step_id(&self) -> Option<StepId> {
        match self.kind {
            NodeKind::Step(_) => Some(StepId::new(self.id.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub id: String,
    pub from: String,
    pub to: String,
    pub points: Vec<(f32, f32)>,
    pub is_completed: bool,
    /// Only the edge entering the terminal node.
    pub critical: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParallelGroupLayout {
    pub index: usize,
    pub members: Vec<StepId>,
    pub fork: String,
    pub join: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestLayout {
    /// Placement order: left to right, parallel members top to bottom.
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub groups: Vec<ParallelGroupLayout>,
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl QuestLayout {
    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn terminal(&self) -> Option<&NodeLayout> {
        self.node(TERMINAL_NODE_ID)
    }

    pub fn terminal_status(&self) -> StepStatus {
        self.terminal()
            .and_then(|node| node.status)
            .unwrap_or(StepStatus::Locked)
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&EdgeLayout> {
        self.edges.iter().find(|edge| edge.from == from && edge.to == to)
    }

    pub fn step_nodes(&self) -> impl Iterator<Item = &NodeLayout> {
        self.nodes
            .iter()
            .filter(|node| matches!(node.kind, NodeKind::Step(_)))
    }
}
