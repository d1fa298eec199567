mod parallel;
pub(crate) mod types;
pub use parallel::{Segment, detect_parallel_groups, segment_steps};
pub use types::*;

use crate::config::LayoutConfig;
use crate::model::{NodeType, Step, StepStatus, sort_steps};

/// Maps a step list to the positioned quest graph.
///
/// Pure: the result depends only on `steps` (order, flags, statuses and any
/// persisted positions) and `config`.
pub fn compute_layout(steps: &[Step], config: &LayoutConfig) -> QuestLayout {
    let sorted: Vec<&Step> = sort_steps(steps)
        .into_iter()
        .filter(|step| {
            let reserved = step.id.is_reserved();
            if reserved {
                tracing::warn!(step = %step.id, "skipping step with a reserved node id");
            }
            !reserved
        })
        .collect();
    let segments = segment_steps(&sorted);

    let mut builder = LayoutBuilder::new(config);
    let mut tail: Option<String> = None;

    for segment in segments {
        match segment {
            Segment::Single(step) => {
                let placed = builder.place_step_column(std::slice::from_ref(&step));
                let Some(id) = placed.into_iter().next() else {
                    continue;
                };
                if let Some(prev) = tail.take() {
                    builder.connect(&prev, &id);
                }
                tail = Some(id);
            }
            Segment::Parallel { group, members } => {
                let fork = fork_node_id(group);
                let join = join_node_id(group);
                builder.place_junction(&fork, JunctionKind::Fork);
                if let Some(prev) = tail.take() {
                    builder.connect(&prev, &fork);
                }
                let member_ids = builder.place_step_column(members);
                for id in &member_ids {
                    builder.connect(&fork, id);
                }
                builder.place_junction(&join, JunctionKind::Join);
                for id in &member_ids {
                    builder.connect(id, &join);
                }
                builder.groups.push(ParallelGroupLayout {
                    index: group,
                    members: members.iter().map(|step| step.id.clone()).collect(),
                    fork,
                    join: join.clone(),
                });
                tail = Some(join);
            }
        }
    }

    let all_completed = !sorted.is_empty() && sorted.iter().all(|step| step.is_completed());
    let terminal_status = if all_completed {
        StepStatus::Completed
    } else {
        StepStatus::Locked
    };
    builder.place_terminal(terminal_status);
    if let Some(prev) = tail {
        builder.connect(&prev, TERMINAL_NODE_ID);
        if let Some(edge) = builder.edges.last_mut() {
            edge.critical = true;
        }
    }

    builder.finish()
}

struct LayoutBuilder<'c> {
    config: &'c LayoutConfig,
    nodes: Vec<NodeLayout>,
    edges: Vec<EdgeLayout>,
    groups: Vec<ParallelGroupLayout>,
    /// Centre x of the most recently placed column.
    cursor: Option<f32>,
    last_half_stride: f32,
}

impl<'c> LayoutBuilder<'c> {
    fn new(config: &'c LayoutConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            edges: Vec::new(),
            groups: Vec::new(),
            cursor: None,
            last_half_stride: 0.0,
        }
    }

    /// Advances to the next column. Step columns occupy `step_stride`,
    /// junction columns `junction_stride`; neighbours share half of each.
    fn advance(&mut self, stride: f32) -> f32 {
        let half = stride / 2.0;
        let x = match self.cursor {
            Some(prev) => prev + self.last_half_stride + half,
            None => self.config.origin_x,
        };
        self.cursor = Some(x);
        self.last_half_stride = half;
        x
    }

    /// Places one or more steps in a single column, stacked and centred on
    /// the main axis. Returns their node ids top to bottom.
    fn place_step_column(&mut self, steps: &[&Step]) -> Vec<String> {
        let center_x = self.advance(self.config.step_stride);
        let count = steps.len();
        let mut ids = Vec::with_capacity(count);
        for (idx, step) in steps.iter().enumerate() {
            let offset = idx as f32 - (count as f32 - 1.0) / 2.0;
            let center_y = self.config.axis_y + offset * self.config.parallel_spacing;
            let (width, height) = match step.node_type {
                NodeType::Task => (self.config.task_width, self.config.task_height),
                NodeType::Milestone => (self.config.milestone_width, self.config.milestone_height),
            };
            let (x, y, pinned) = match step.position {
                Some(pos) => (pos.x, pos.y, true),
                None => (center_x - width / 2.0, center_y - height / 2.0, false),
            };
            let id = step.id.as_str().to_string();
            self.nodes.push(NodeLayout {
                id: id.clone(),
                kind: NodeKind::Step(step.node_type),
                label: step.title.clone(),
                status: Some(step.status),
                x,
                y,
                width,
                height,
                pinned,
            });
            ids.push(id);
        }
        ids
    }

    fn place_junction(&mut self, id: &str, kind: JunctionKind) {
        let center_x = self.advance(self.config.junction_stride);
        let size = self.config.junction_size;
        self.nodes.push(NodeLayout {
            id: id.to_string(),
            kind: NodeKind::Junction(kind),
            label: String::new(),
            status: None,
            x: center_x - size / 2.0,
            y: self.config.axis_y - size / 2.0,
            width: size,
            height: size,
            pinned: false,
        });
    }

    fn place_terminal(&mut self, status: StepStatus) {
        let center_x = self.advance(self.config.step_stride);
        let width = self.config.terminal_width;
        let height = self.config.terminal_height;
        self.nodes.push(NodeLayout {
            id: TERMINAL_NODE_ID.to_string(),
            kind: NodeKind::Terminal,
            label: "Goal complete".to_string(),
            status: Some(status),
            x: center_x - width / 2.0,
            y: self.config.axis_y - height / 2.0,
            width,
            height,
            pinned: false,
        });
    }

    fn connect(&mut self, from: &str, to: &str) {
        let (Some(source), Some(target)) = (self.node(from), self.node(to)) else {
            return;
        };
        let is_completed = source.kind.is_junction()
            || target.kind.is_junction()
            || source.status == Some(StepStatus::Completed);
        let points = route_edge(source, target);
        self.edges.push(EdgeLayout {
            id: edge_id(from, to),
            from: from.to_string(),
            to: to.to_string(),
            points,
            is_completed,
            critical: false,
        });
    }

    fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().rev().find(|node| node.id == id)
    }

    fn finish(self) -> QuestLayout {
        let padding = self.config.padding;
        let (min_x, min_y, max_x, max_y) = bounds(&self.nodes);
        QuestLayout {
            nodes: self.nodes,
            edges: self.edges,
            groups: self.groups,
            min_x: min_x - padding,
            min_y: min_y - padding,
            width: (max_x - min_x) + padding * 2.0,
            height: (max_y - min_y) + padding * 2.0,
        }
    }
}

/// Right-centre of the source to left-centre of the target, with an
/// orthogonal elbow when the two sit on different rows.
fn route_edge(source: &NodeLayout, target: &NodeLayout) -> Vec<(f32, f32)> {
    let start = (source.x + source.width, source.y + source.height / 2.0);
    let end = (target.x, target.y + target.height / 2.0);
    if (start.1 - end.1).abs() < 0.5 {
        return vec![start, end];
    }
    let mid_x = (start.0 + end.0) / 2.0;
    vec![start, (mid_x, start.1), (mid_x, end.1), end]
}

fn bounds(nodes: &[NodeLayout]) -> (f32, f32, f32, f32) {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for node in nodes {
        min_x = min_x.min(node.x);
        min_y = min_y.min(node.y);
        max_x = max_x.max(node.x + node.width);
        max_y = max_y.max(node.y + node.height);
    }
    if nodes.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    (min_x, min_y, max_x, max_y)
}
