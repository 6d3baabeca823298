//! sdpanel desktop host
//!
//! Shows image layers and opens one docked panel per plugin.

mod app;
mod canvas;
mod dock;
mod menu;
mod panels;

use anyhow::anyhow;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use app::{SdPanelApp, StartupOptions};

#[derive(Parser, Debug)]
#[command(name = "sdpanel")]
#[command(version, about = "Schema-driven plugin panels for image layers")]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Start without the synthetic sample image
    #[arg(long)]
    no_sample: bool,

    /// Open a plugin panel at start-up (repeatable)
    #[arg(long = "open", value_name = "PLUGIN")]
    open: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let options = StartupOptions {
        load_sample: !cli.no_sample,
        open: cli.open,
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("sdpanel")
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([720.0, 480.0]),
        renderer: eframe::Renderer::Glow,
        ..Default::default()
    };

    eframe::run_native(
        "sdpanel",
        native_options,
        Box::new(move |cc| Ok(Box::new(SdPanelApp::new(cc, options)))),
    )
    .map_err(|e| anyhow!("GUI terminated: {e}"))
}
