use crate::config::RenderConfig;
use crate::layout::{EdgeLayout, JunctionKind, NodeKind, NodeLayout, QuestLayout};
use crate::model::{NodeType, Step, StepId, StepStatus, progress_percent};
use crate::text_metrics::wrap_text;
use crate::theme::Theme;
use anyhow::Result;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

const HEADER_HEIGHT: f32 = 64.0;
const CARD_PAD_X: f32 = 14.0;
const CARD_PAD_Y: f32 = 14.0;
const MAX_PARTICLES: usize = 24;

/// Visual template a node is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTemplate {
    Task,
    Milestone,
    Junction,
    Terminal,
}

impl NodeTemplate {
    pub fn for_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Step(NodeType::Task) => Self::Task,
            NodeKind::Step(NodeType::Milestone) => Self::Milestone,
            NodeKind::Junction(_) => Self::Junction,
            NodeKind::Terminal => Self::Terminal,
        }
    }
}

pub fn status_color(theme: &Theme, status: StepStatus) -> &str {
    match status {
        StepStatus::Active => &theme.palette.active,
        StepStatus::Completed => &theme.palette.completed,
        StepStatus::Locked => &theme.palette.locked,
        StepStatus::Failed => &theme.palette.failed,
    }
}

pub fn edge_color<'a>(theme: &'a Theme, edge: &EdgeLayout) -> &'a str {
    if edge.is_completed {
        &theme.palette.completed
    } else {
        &theme.palette.locked
    }
}

/// Progress header text, e.g. `2 / 3 steps · 67%`. `None` for an empty plan.
pub fn progress_label(steps: &[Step]) -> Option<String> {
    let percent = progress_percent(steps)?;
    let completed = steps.iter().filter(|step| step.is_completed()).count();
    Some(format!(
        "{completed} / {} steps \u{00B7} {:.0}%",
        steps.len(),
        percent
    ))
}

pub fn render_svg(layout: &QuestLayout, steps: &[Step], theme: &Theme, config: &RenderConfig) -> String {
    let by_id: HashMap<&StepId, &Step> = steps.iter().map(|step| (&step.id, step)).collect();
    let header = if config.show_progress {
        progress_label(steps)
    } else {
        None
    };
    let header_height = if header.is_some() { HEADER_HEIGHT } else { 0.0 };

    let view_x = layout.min_x;
    let view_y = layout.min_y - header_height;
    let width = layout.width.max(200.0);
    let height = (layout.height + header_height).max(200.0);

    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"{view_x:.2} {view_y:.2} {width:.2} {height:.2}\" data-theme=\"{}\">",
        theme.kind.key()
    );

    svg.push_str("<defs>");
    let _ = write!(
        svg,
        "<linearGradient id=\"qm-bg\" x1=\"0\" y1=\"0\" x2=\"0\" y2=\"1\"><stop offset=\"0%\" stop-color=\"{}\"/><stop offset=\"100%\" stop-color=\"{}\"/></linearGradient>",
        theme.background_top, theme.background_bottom
    );
    for (id, color) in [
        ("qm-arrow-done", theme.palette.completed.as_str()),
        ("qm-arrow-todo", theme.palette.locked.as_str()),
    ] {
        let _ = write!(
            svg,
            "<marker id=\"{id}\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"7\" markerHeight=\"7\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{color}\"/></marker>"
        );
    }
    svg.push_str("</defs>");

    let background = config.background.as_deref().unwrap_or("url(#qm-bg)");
    let _ = write!(
        svg,
        "<rect x=\"{view_x:.2}\" y=\"{view_y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{background}\"/>"
    );

    if config.show_particles {
        render_particles(&mut svg, theme, (view_x, view_y, width, height), layout.nodes.len());
    }

    if let Some(label) = &header {
        render_header(&mut svg, theme, steps, label, (view_x, view_y, width));
    }

    for edge in &layout.edges {
        render_edge(&mut svg, theme, edge);
    }

    for node in &layout.nodes {
        let step = node
            .step_id()
            .and_then(|id| by_id.get(&id).copied());
        match NodeTemplate::for_kind(node.kind) {
            NodeTemplate::Task => render_task(&mut svg, theme, config, node, step),
            NodeTemplate::Milestone => render_milestone(&mut svg, theme, config, node),
            NodeTemplate::Junction => render_junction(&mut svg, theme, node),
            NodeTemplate::Terminal => render_terminal(&mut svg, theme, node),
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Ambient glyphs on a low-discrepancy grid so repeated renders match.
fn render_particles(svg: &mut String, theme: &Theme, (x, y, width, height): (f32, f32, f32, f32), nodes: usize) {
    if theme.particles.is_empty() {
        return;
    }
    let count = (nodes * 2).clamp(6, MAX_PARTICLES);
    svg.push_str("<g class=\"qm-particles\" opacity=\"0.35\">");
    for idx in 0..count {
        let fx = (0.5 + idx as f32 * 0.618_034).fract();
        let fy = (0.25 + idx as f32 * 0.754_877_7).fract();
        let glyph = &theme.particles[idx % theme.particles.len()];
        let size = 14.0 + (idx % 3) as f32 * 4.0;
        let _ = write!(
            svg,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{size}\" text-anchor=\"middle\">{}</text>",
            x + fx * width,
            y + fy * height,
            escape_xml(glyph)
        );
    }
    svg.push_str("</g>");
}

fn render_header(svg: &mut String, theme: &Theme, steps: &[Step], label: &str, (x, y, width): (f32, f32, f32)) {
    let percent = progress_percent(steps).unwrap_or(0.0);
    let bar_x = x + 24.0;
    let bar_y = y + 44.0;
    let bar_width = (width - 48.0).max(0.0);
    let _ = write!(
        svg,
        "<g class=\"qm-header\"><text x=\"{bar_x:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"600\" fill=\"{}\">{} {} \u{2014} {}</text>",
        y + 30.0,
        escape_xml(&theme.font_family),
        theme.font_size + 2.0,
        theme.text_color,
        escape_xml(&theme.icon),
        escape_xml(&theme.name),
        escape_xml(label)
    );
    let _ = write!(
        svg,
        "<rect x=\"{bar_x:.2}\" y=\"{bar_y:.2}\" width=\"{bar_width:.2}\" height=\"8\" rx=\"4\" fill=\"{}\" opacity=\"0.4\"/>",
        theme.palette.locked
    );
    let _ = write!(
        svg,
        "<rect x=\"{bar_x:.2}\" y=\"{bar_y:.2}\" width=\"{:.2}\" height=\"8\" rx=\"4\" fill=\"{}\"/></g>",
        bar_width * percent / 100.0,
        theme.palette.completed
    );
}

fn render_edge(svg: &mut String, theme: &Theme, edge: &EdgeLayout) {
    let color = edge_color(theme, edge);
    let stroke_width = if edge.critical { 3.5 } else { 2.0 };
    let dash = if edge.is_completed {
        ""
    } else {
        " stroke-dasharray=\"8 6\""
    };
    let marker = if edge.is_completed {
        "qm-arrow-done"
    } else {
        "qm-arrow-todo"
    };
    let mut class = String::from("qm-edge");
    if edge.is_completed {
        class.push_str(" completed");
    }
    if edge.critical {
        class.push_str(" critical");
    }
    let _ = write!(
        svg,
        "<path class=\"{class}\" data-edge-id=\"{}\" d=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{stroke_width}\"{dash} marker-end=\"url(#{marker})\"/>",
        escape_xml(&edge.id),
        points_to_path(&edge.points)
    );
}

fn open_node_group(svg: &mut String, node: &NodeLayout, template: &str) {
    let status = node.status.map(StepStatus::as_str).unwrap_or("none");
    let opacity = if node.status == Some(StepStatus::Locked) && node.kind != NodeKind::Terminal {
        " opacity=\"0.65\""
    } else {
        ""
    };
    let _ = write!(
        svg,
        "<g class=\"qm-node qm-{template}\" data-node-id=\"{}\" data-status=\"{status}\"{opacity}>",
        escape_xml(&node.id)
    );
}

fn render_task(svg: &mut String, theme: &Theme, config: &RenderConfig, node: &NodeLayout, step: Option<&Step>) {
    let status = node.status.unwrap_or(StepStatus::Locked);
    let color = status_color(theme, status);
    open_node_group(svg, node, "task");
    let _ = write!(
        svg,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"14\" ry=\"14\" fill=\"{}\" stroke=\"{color}\" stroke-width=\"2.5\"/>",
        node.x, node.y, node.width, node.height, theme.card_background
    );
    let _ = write!(
        svg,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"6\" height=\"{:.2}\" rx=\"3\" fill=\"{color}\"/>",
        node.x, node.y + 10.0, node.height - 20.0
    );
    let title_bottom = render_title(svg, theme, config, node, node.x + CARD_PAD_X, "start");

    let mut meta = vec![status_badge(status).to_string()];
    if let Some(step) = step {
        let checklist = step.checklist();
        if !checklist.is_empty() {
            let done = checklist.iter().filter(|item| item.done).count();
            meta.push(format!("\u{2611} {done}/{}", checklist.len()));
        }
        if let Some(duration) = step.duration_label() {
            meta.push(format!("\u{23F1} {duration}"));
        }
    }
    let meta_y = (node.y + node.height - CARD_PAD_Y).max(title_bottom + 4.0);
    let _ = write!(
        svg,
        "<text x=\"{:.2}\" y=\"{meta_y:.2}\" font-family=\"{}\" font-size=\"{:.1}\" fill=\"{}\">{}</text>",
        node.x + CARD_PAD_X,
        escape_xml(&theme.font_family),
        theme.font_size - 2.0,
        theme.muted_text_color,
        escape_xml(&meta.join("  "))
    );
    svg.push_str("</g>");
}

fn render_milestone(svg: &mut String, theme: &Theme, config: &RenderConfig, node: &NodeLayout) {
    let status = node.status.unwrap_or(StepStatus::Locked);
    let color = status_color(theme, status);
    let notch = 18.0;
    let (x, y, w, h) = (node.x, node.y, node.width, node.height);
    open_node_group(svg, node, "milestone");
    let _ = write!(
        svg,
        "<polygon points=\"{:.2},{:.2} {:.2},{:.2} {:.2},{:.2} {:.2},{:.2} {:.2},{:.2} {:.2},{:.2}\" fill=\"{}\" stroke=\"{color}\" stroke-width=\"3\"/>",
        x + notch, y,
        x + w - notch, y,
        x + w, y + h / 2.0,
        x + w - notch, y + h,
        x + notch, y + h,
        x, y + h / 2.0,
        theme.card_background
    );
    let (cx, _) = node.center();
    let _ = write!(
        svg,
        "<text x=\"{cx:.2}\" y=\"{:.2}\" font-size=\"20\" text-anchor=\"middle\">\u{1F3C1}</text>",
        y + 28.0
    );
    render_title(svg, theme, config, node, cx, "middle");
    svg.push_str("</g>");
}

fn render_junction(svg: &mut String, theme: &Theme, node: &NodeLayout) {
    let (cx, cy) = node.center();
    let r = node.width / 2.0;
    let template = match node.kind {
        NodeKind::Junction(JunctionKind::Fork) => "fork",
        _ => "join",
    };
    open_node_group(svg, node, template);
    let _ = write!(
        svg,
        "<polygon points=\"{cx:.2},{:.2} {:.2},{cy:.2} {cx:.2},{:.2} {:.2},{cy:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\"/>",
        cy - r,
        cx + r,
        cy + r,
        cx - r,
        theme.palette.completed,
        theme.card_background
    );
    svg.push_str("</g>");
}

fn render_terminal(svg: &mut String, theme: &Theme, node: &NodeLayout) {
    let status = node.status.unwrap_or(StepStatus::Locked);
    let color = status_color(theme, status);
    let (cx, _) = node.center();
    open_node_group(svg, node, "terminal");
    let _ = write!(
        svg,
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{:.2}\" fill=\"{color}\" stroke=\"{}\" stroke-width=\"3\"/>",
        node.x,
        node.y,
        node.width,
        node.height,
        node.height / 2.0,
        theme.card_background
    );
    let _ = write!(
        svg,
        "<text x=\"{cx:.2}\" y=\"{:.2}\" font-size=\"26\" text-anchor=\"middle\">\u{1F3C6}</text>",
        node.y + 44.0
    );
    let _ = write!(
        svg,
        "<text x=\"{cx:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"600\" text-anchor=\"middle\" fill=\"#FFFFFF\">{}</text>",
        node.y + node.height - 22.0,
        escape_xml(&theme.font_family),
        theme.font_size,
        escape_xml(&node.label)
    );
    svg.push_str("</g>");
}

/// Writes the wrapped node title and returns the baseline of its last line.
fn render_title(svg: &mut String, theme: &Theme, config: &RenderConfig, node: &NodeLayout, x: f32, anchor: &str) -> f32 {
    let max_width = (node.width - CARD_PAD_X * 2.0).max(10.0);
    let lines = wrap_text(
        &node.label,
        max_width,
        config.max_title_lines,
        theme.font_size,
        &theme.font_family,
        config.fast_text_metrics,
    );
    let line_height = theme.font_size * config.label_line_height;
    let start_y = match node.kind {
        NodeKind::Step(NodeType::Milestone) => node.y + node.height / 2.0 + theme.font_size * 0.6,
        _ => node.y + CARD_PAD_Y + theme.font_size,
    };
    let _ = write!(
        svg,
        "<text x=\"{x:.2}\" y=\"{start_y:.2}\" text-anchor=\"{anchor}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"600\" fill=\"{}\">",
        escape_xml(&theme.font_family),
        theme.font_size,
        theme.text_color
    );
    for (idx, line) in lines.iter().enumerate() {
        let dy = if idx == 0 { 0.0 } else { line_height };
        let _ = write!(svg, "<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}</tspan>", escape_xml(line));
    }
    svg.push_str("</text>");
    start_y + line_height * (lines.len().saturating_sub(1)) as f32
}

fn status_badge(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Locked => "\u{1F512} Locked",
        StepStatus::Active => "\u{25B6} Active",
        StepStatus::Completed => "\u{2714} Done",
        StepStatus::Failed => "\u{2716} Failed",
    }
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    let mut d = String::new();
    for (idx, (x, y)) in points.iter().enumerate() {
        let cmd = if idx == 0 { "M" } else { " L" };
        let _ = write!(d, "{cmd} {x:.2} {y:.2}");
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|family| family.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| "Inter".to_string());
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("invalid render size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig, _theme: &Theme) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
