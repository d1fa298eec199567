use crate::theme::{Theme, ThemeKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Centre x of the first column.
    pub origin_x: f32,
    /// y of the main horizontal axis every sequential node is centred on.
    pub axis_y: f32,
    pub step_stride: f32,
    pub junction_stride: f32,
    /// Distance between the centres of stacked parallel members.
    pub parallel_spacing: f32,
    pub task_width: f32,
    pub task_height: f32,
    pub milestone_width: f32,
    pub milestone_height: f32,
    pub junction_size: f32,
    pub terminal_width: f32,
    pub terminal_height: f32,
    pub padding: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin_x: 160.0,
            axis_y: 300.0,
            step_stride: 280.0,
            junction_stride: 140.0,
            parallel_spacing: 160.0,
            task_width: 200.0,
            task_height: 96.0,
            milestone_width: 220.0,
            milestone_height: 120.0,
            junction_size: 28.0,
            terminal_width: 180.0,
            terminal_height: 100.0,
            padding: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: Option<String>,
    pub label_line_height: f32,
    pub max_title_lines: usize,
    pub show_particles: bool,
    pub show_progress: bool,
    /// Skip font lookup and use calibrated per-character widths.
    pub fast_text_metrics: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: None,
            label_line_height: 1.3,
            max_title_lines: 2,
            show_particles: true,
            show_progress: true,
            fast_text_metrics: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionConfig {
    pub debounce_ms: u64,
    pub saved_indicator_ms: u64,
}

impl InteractionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn saved_indicator(&self) -> Duration {
        Duration::from_millis(self.saved_indicator_ms)
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            saved_indicator_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    /// `themeVariables` from the config file, kept so they survive a theme switch.
    pub theme_overrides: ThemeOverrides,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
    pub interaction: InteractionConfig,
}

impl Config {
    /// The theme for `key` with the configured overrides on top. `None`
    /// returns the configured theme.
    pub fn theme_for(&self, key: Option<&str>) -> Theme {
        match key {
            Some(key) => {
                let mut theme = ThemeKind::from_key(Some(key)).theme();
                self.theme_overrides.apply_to(&mut theme);
                theme
            }
            None => self.theme.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeOverrides {
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub active_color: Option<String>,
    pub completed_color: Option<String>,
    pub locked_color: Option<String>,
    pub failed_color: Option<String>,
    pub text_color: Option<String>,
    pub card_background: Option<String>,
}

impl ThemeOverrides {
    pub fn apply_to(&self, theme: &mut Theme) {
        if let Some(v) = &self.font_family {
            theme.font_family = v.clone();
        }
        if let Some(v) = self.font_size {
            theme.font_size = v;
        }
        if let Some(v) = &self.active_color {
            theme.palette.active = v.clone();
        }
        if let Some(v) = &self.completed_color {
            theme.palette.completed = v.clone();
        }
        if let Some(v) = &self.locked_color {
            theme.palette.locked = v.clone();
        }
        if let Some(v) = &self.failed_color {
            theme.palette.failed = v.clone();
        }
        if let Some(v) = &self.text_color {
            theme.text_color = v.clone();
        }
        if let Some(v) = &self.card_background {
            theme.card_background = v.clone();
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    origin_x: Option<f32>,
    axis_y: Option<f32>,
    step_stride: Option<f32>,
    junction_stride: Option<f32>,
    parallel_spacing: Option<f32>,
    padding: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    background: Option<String>,
    max_title_lines: Option<usize>,
    show_particles: Option<bool>,
    show_progress: Option<bool>,
    fast_text_metrics: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionConfigFile {
    debounce_ms: Option<u64>,
    saved_indicator_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeOverrides>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
    interaction: Option<InteractionConfigFile>,
}

/// Parses strict JSON first, then JSON5 so hand-written files may carry
/// comments and trailing commas.
pub(crate) fn parse_lenient<T: serde::de::DeserializeOwned>(contents: &str) -> anyhow::Result<T> {
    match serde_json::from_str(contents) {
        Ok(value) => Ok(value),
        Err(strict) => json5::from_str(contents)
            .map_err(|lenient| anyhow::anyhow!("invalid JSON ({strict}); JSON5 fallback: {lenient}")),
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = parse_lenient(&contents)?;
    apply_config_file(&mut config, parsed);
    Ok(config)
}

fn apply_config_file(config: &mut Config, parsed: ConfigFile) {
    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = ThemeKind::from_key(Some(theme_name)).theme();
    }

    if let Some(vars) = parsed.theme_variables {
        vars.apply_to(&mut config.theme);
        config.theme_overrides = vars;
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.origin_x {
            config.layout.origin_x = v;
        }
        if let Some(v) = layout.axis_y {
            config.layout.axis_y = v;
        }
        if let Some(v) = layout.step_stride {
            config.layout.step_stride = v;
        }
        if let Some(v) = layout.junction_stride {
            config.layout.junction_stride = v;
        }
        if let Some(v) = layout.parallel_spacing {
            config.layout.parallel_spacing = v;
        }
        if let Some(v) = layout.padding {
            config.layout.padding = v;
        }
    }

    if let Some(render) = parsed.render {
        if render.background.is_some() {
            config.render.background = render.background;
        }
        if let Some(v) = render.max_title_lines {
            config.render.max_title_lines = v.max(1);
        }
        if let Some(v) = render.show_particles {
            config.render.show_particles = v;
        }
        if let Some(v) = render.show_progress {
            config.render.show_progress = v;
        }
        if let Some(v) = render.fast_text_metrics {
            config.render.fast_text_metrics = v;
        }
    }

    if let Some(interaction) = parsed.interaction {
        if let Some(v) = interaction.debounce_ms {
            config.interaction.debounce_ms = v;
        }
        if let Some(v) = interaction.saved_indicator_ms {
            config.interaction.saved_indicator_ms = v;
        }
    }
}
