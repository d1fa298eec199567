use crate::layout::{JunctionKind, NodeKind, QuestLayout};
use crate::model::NodeType;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub min_x: f32,
    pub min_y: f32,
    pub terminal_status: String,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub groups: Vec<GroupDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: String,
    pub label: String,
    pub status: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub from: String,
    pub to: String,
    pub completed: bool,
    pub critical: bool,
    pub points: Vec<[f32; 2]>,
}

#[derive(Debug, Serialize)]
pub struct GroupDump {
    pub index: usize,
    pub fork: String,
    pub join: String,
    pub members: Vec<String>,
}

fn kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Step(NodeType::Task) => "task",
        NodeKind::Step(NodeType::Milestone) => "milestone",
        NodeKind::Junction(JunctionKind::Fork) => "fork",
        NodeKind::Junction(JunctionKind::Join) => "join",
        NodeKind::Terminal => "terminal",
    }
}

impl LayoutDump {
    pub fn from_layout(layout: &QuestLayout) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                kind: kind_name(node.kind).to_string(),
                label: node.label.clone(),
                status: node.status.map(|status| status.as_str().to_string()),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                pinned: node.pinned,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                from: edge.from.clone(),
                to: edge.to.clone(),
                completed: edge.is_completed,
                critical: edge.critical,
                points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
            })
            .collect();

        let groups = layout
            .groups
            .iter()
            .map(|group| GroupDump {
                index: group.index,
                fork: group.fork.clone(),
                join: group.join.clone(),
                members: group.members.iter().map(ToString::to_string).collect(),
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            min_x: layout.min_x,
            min_y: layout.min_y,
            terminal_status: layout.terminal_status().as_str().to_string(),
            nodes,
            edges,
            groups,
        }
    }
}

pub fn layout_dump_json(layout: &QuestLayout) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&LayoutDump::from_layout(layout))?)
}

pub fn write_layout_dump(path: &Path, layout: &QuestLayout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &LayoutDump::from_layout(layout))?;
    Ok(())
}
