pub mod api;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod interaction;
pub mod layout;
pub mod layout_dump;
pub mod model;
pub mod persist;
pub mod render;
pub mod session;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, InteractionConfig, LayoutConfig, RenderConfig, ThemeOverrides, load_config};
pub use controller::QuestMapController;
pub use error::{ApiError, QuestMapError};
pub use layout::{QuestLayout, compute_layout};
pub use model::{GoalId, NodeType, Position, Step, StepId, StepStatus};
pub use render::render_svg;
pub use theme::{Theme, ThemeKind};

use serde::Deserialize;

/// Everything needed to turn a step list into an SVG in one call.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl RenderOptions {
    pub fn themed(kind: ThemeKind) -> Self {
        Self {
            theme: kind.theme(),
            ..Default::default()
        }
    }

    pub fn with_fast_text(mut self, fast: bool) -> Self {
        self.render.fast_text_metrics = fast;
        self
    }
}

impl From<&Config> for RenderOptions {
    fn from(config: &Config) -> Self {
        Self {
            theme: config.theme.clone(),
            layout: config.layout.clone(),
            render: config.render.clone(),
        }
    }
}

/// A goal's steps as written to disk: either a bare array or an object that
/// also names the goal's theme.
#[derive(Debug, Clone, Default)]
pub struct StepsDocument {
    pub theme: Option<String>,
    pub steps: Vec<Step>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StepsDocumentRepr {
    Bare(Vec<Step>),
    Wrapped {
        #[serde(default)]
        theme: Option<String>,
        steps: Vec<Step>,
    },
}

impl From<StepsDocumentRepr> for StepsDocument {
    fn from(repr: StepsDocumentRepr) -> Self {
        match repr {
            StepsDocumentRepr::Bare(steps) => Self { theme: None, steps },
            StepsDocumentRepr::Wrapped { theme, steps } => Self { theme, steps },
        }
    }
}

/// Parses a steps document as JSON, falling back to JSON5.
pub fn parse_steps_document(input: &str) -> anyhow::Result<StepsDocument> {
    let repr: StepsDocumentRepr = config::parse_lenient(input)?;
    Ok(repr.into())
}

pub fn render_steps_svg(steps: &[Step], options: &RenderOptions) -> String {
    let layout = compute_layout(steps, &options.layout);
    render_svg(&layout, steps, &options.theme, &options.render)
}

pub fn render_document(input: &str, options: RenderOptions) -> anyhow::Result<String> {
    let document = parse_steps_document(input)?;
    let mut options = options;
    if let Some(key) = document.theme.as_deref() {
        options.theme = ThemeKind::from_key(Some(key)).theme();
    }
    Ok(render_steps_svg(&document.steps, &options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_and_wrapped_documents() {
        let bare = r#"[{"id": "a", "title": "A", "order": 1, "status": "active"}]"#;
        let doc = parse_steps_document(bare).expect("bare array");
        assert_eq!(doc.steps.len(), 1);
        assert!(doc.theme.is_none());

        let wrapped = r#"{
            // hand-written
            theme: "space",
            steps: [{id: "a", title: "A", order: 1, status: "completed"},],
        }"#;
        let doc = parse_steps_document(wrapped).expect("json5 object");
        assert_eq!(doc.theme.as_deref(), Some("space"));
        assert_eq!(doc.steps[0].status, StepStatus::Completed);
    }

    #[test]
    fn document_theme_overrides_options() {
        let input = r#"{"theme": "ocean", "steps": []}"#;
        let svg = render_document(input, RenderOptions::default().with_fast_text(true))
            .expect("render");
        assert!(svg.contains("data-theme=\"ocean\""));
    }
}
