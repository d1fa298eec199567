use questmap_renderer::{RenderOptions, ThemeKind, parse_steps_document, render_steps_svg};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestMapRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    fast_text: Option<bool>,
    show_particles: Option<bool>,
    show_progress: Option<bool>,
}

fn build_render_options(options: &QuestMapRenderOptions, document_theme: Option<&str>) -> RenderOptions {
    let key = options.theme.as_deref().or(document_theme);
    let mut render_options = RenderOptions::themed(ThemeKind::from_key(key));

    if let Some(font_family) = &options.font_family {
        render_options.theme.font_family = font_family.clone();
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    // No system fonts inside the browser sandbox.
    render_options.render.fast_text_metrics = options.fast_text.unwrap_or(true);
    if let Some(show) = options.show_particles {
        render_options.render.show_particles = show;
    }
    if let Some(show) = options.show_progress {
        render_options.render.show_progress = show;
    }

    render_options
}

fn render(steps_json: &str, options: &QuestMapRenderOptions) -> Result<String, String> {
    let document = parse_steps_document(steps_json).map_err(|error| error.to_string())?;
    let render_options = build_render_options(options, document.theme.as_deref());
    Ok(render_steps_svg(&document.steps, &render_options))
}

/// Renders a steps document (bare array or `{theme, steps}`) to SVG. A theme
/// in `options_json` wins over the document's own.
#[wasm_bindgen]
pub fn render_quest_map_svg(steps_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<QuestMapRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        QuestMapRenderOptions::default()
    };

    render(steps_json, &options).map_err(|error| JsValue::from_str(&error))
}

/// Theme keys the host can offer in a picker.
#[wasm_bindgen]
pub fn quest_map_themes() -> Vec<String> {
    ThemeKind::ALL.iter().map(|kind| kind.key().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use crate::{QuestMapRenderOptions, render};

    const PLAN: &str = r#"{
        "theme": "desert",
        "steps": [
            {"id": "a", "title": "Find water", "order": 1, "status": "completed"},
            {"id": "b", "title": "Cross dunes", "order": 2, "status": "active", "can_parallel": true},
            {"id": "c", "title": "Map stars", "order": 3, "status": "locked", "can_parallel": true}
        ]
    }"#;

    #[test]
    fn renders_document_theme_by_default() {
        let svg = render(PLAN, &QuestMapRenderOptions::default()).expect("quest map should render");
        assert!(svg.contains("<svg"));
        assert!(svg.contains("data-theme=\"desert\""));
        assert!(svg.contains("Cross dunes"));
    }

    #[test]
    fn option_theme_overrides_document() {
        let options = QuestMapRenderOptions {
            theme: Some("castle".to_string()),
            ..Default::default()
        };
        let svg = render(PLAN, &options).expect("quest map should render");
        assert!(svg.contains("data-theme=\"castle\""));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(render("{not steps", &QuestMapRenderOptions::default()).is_err());
    }
}
