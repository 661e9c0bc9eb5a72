mod app;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use code_atlas::GraphConfig;
use code_atlas::grouping::GroupingMode;
use code_atlas::layout::LayoutMode;
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph JSON with `nodes` and `edges` (or `links`).
    input: PathBuf,

    /// JSON file with viewer settings; command-line flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// force, hierarchical, circular or grouped
    #[arg(long, value_parser = parse_setting::<LayoutMode>)]
    layout: Option<LayoutMode>,

    /// none, by_file or by_parent
    #[arg(long, value_parser = parse_setting::<GroupingMode>)]
    grouping: Option<GroupingMode>,

    #[arg(long)]
    spacing: Option<f32>,

    #[arg(long)]
    node_size: Option<f32>,

    #[arg(long)]
    no_animation: bool,
}

fn main() -> Result<()> {
    init_tracing()?;

    let args = Args::parse();
    let config = resolve_config(&args)?;
    info!(input = %args.input.display(), layout = config.layout_mode.label(), "starting viewer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let input = args.input;
    eframe::run_native(
        "code-atlas",
        options,
        Box::new(move |cc| Ok(Box::new(app::CodeAtlasApp::new(cc, input, config)))),
    )
    .map_err(|error| anyhow::anyhow!("viewer exited with an error: {error}"))
}

fn resolve_config(args: &Args) -> Result<GraphConfig> {
    let mut config = match &args.config {
        Some(path) => GraphConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GraphConfig::default(),
    };

    if let Some(layout) = args.layout {
        config.layout_mode = layout;
    }
    if let Some(grouping) = args.grouping {
        config.grouping_mode = grouping;
    }
    if let Some(spacing) = args.spacing {
        config.node_spacing = spacing;
    }
    if let Some(node_size) = args.node_size {
        config.node_size = node_size;
    }
    if args.no_animation {
        config.animation_enabled = false;
    }

    config.validate().context("invalid viewer settings")?;
    Ok(config)
}

/// Parses a flag using the same snake_case names the config file uses.
fn parse_setting<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_owned()))
        .map_err(|_| format!("unknown value `{raw}`"))
}

fn init_tracing() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,code_atlas=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}
