use crate::config::{Config, load_config};
use crate::layout::compute_layout;
use crate::layout_dump::{layout_dump_json, write_layout_dump};
use crate::parse_steps_document;
use crate::render::{render_svg, write_output_png, write_output_svg};
use crate::theme::ThemeKind;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "qmap", version, about = "Render a goal's steps as a quest map")]
pub struct Args {
    /// Steps file (JSON or JSON5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Theme key; overrides the theme named in the input document
    #[arg(short = 't', long = "theme")]
    pub theme: Option<String>,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Height
    #[arg(short = 'H', long = "height", default_value_t = 800.0)]
    pub height: f32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    /// Layout dump: node boxes, edge polylines, parallel groups
    Json,
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    config.render.width = args.width;
    config.render.height = args.height;

    let input = read_input(args.input.as_deref())?;
    let document = parse_steps_document(&input)?;
    apply_theme(&mut config, args.theme.as_deref(), document.theme.as_deref());
    tracing::debug!(
        steps = document.steps.len(),
        theme = config.theme.kind.key(),
        "rendering quest map"
    );

    let layout = compute_layout(&document.steps, &config.layout);
    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(&layout, &document.steps, &config.theme, &config.render);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            let svg = render_svg(&layout, &document.steps, &config.theme, &config.render);
            write_output_png(&svg, &output, &config.render, &config.theme)?;
        }
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_layout_dump(path, &layout)?,
            None => println!("{}", layout_dump_json(&layout)?),
        },
    }
    Ok(())
}

/// Logs go to stderr so SVG on stdout stays clean. `RUST_LOG` controls the level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

/// The command-line flag wins over the document's theme, which wins over the
/// config file.
fn apply_theme(config: &mut Config, flag: Option<&str>, document: Option<&str>) {
    if let Some(key) = flag.or(document) {
        let kind = ThemeKind::from_key(Some(key));
        if !kind.key().eq_ignore_ascii_case(key.trim()) {
            tracing::warn!(theme = key, fallback = kind.key(), "unknown theme");
        }
        config.theme = config.theme_for(Some(key));
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let args = Args::try_parse_from([
            "qmap", "-i", "steps.json", "-e", "json", "-t", "forest", "-w", "900",
        ])
        .expect("valid args");
        assert_eq!(args.input.as_deref(), Some(Path::new("steps.json")));
        assert_eq!(args.output_format, OutputFormat::Json);
        assert_eq!(args.theme.as_deref(), Some("forest"));
        assert_eq!(args.width, 900.0);
        assert_eq!(args.height, 800.0);
    }

    #[test]
    fn theme_flag_beats_document() {
        let mut config = Config::default();
        apply_theme(&mut config, Some("castle"), Some("ocean"));
        assert_eq!(config.theme.kind, ThemeKind::Castle);

        apply_theme(&mut config, None, Some("ocean"));
        assert_eq!(config.theme.kind, ThemeKind::Ocean);

        apply_theme(&mut config, None, Some("volcano"));
        assert_eq!(config.theme.kind, ThemeKind::Mountain);
    }

    #[test]
    fn theme_flag_keeps_configured_font() {
        let mut config = Config::default();
        config.theme_overrides.font_family = Some("Lexend".to_string());
        apply_theme(&mut config, Some("space"), None);
        assert_eq!(config.theme.kind, ThemeKind::Space);
        assert_eq!(config.theme.font_family, "Lexend");
    }

    #[test]
    fn png_requires_output_path() {
        assert!(ensure_output(&None, "png").is_err());
        assert!(ensure_output(&Some(PathBuf::from("out.png")), "png").is_ok());
    }
}
