mod app;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use clap::Parser;
use h5view::JsonFileStore;
use h5view::store::demo_document;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Data file to open. A demo file is generated when omitted.
    file: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
    #[arg(long)]
    log_json: bool,
    /// How often to check the file for outside modifications.
    #[arg(long, default_value_t = 1000)]
    watch_interval_ms: u64,
    #[arg(long)]
    hide_attributes: bool,
    #[arg(long)]
    show_junk: bool,
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn write_demo_file() -> anyhow::Result<PathBuf> {
    let path = std::env::temp_dir().join("h5view-demo.json");
    let document = demo_document().context("failed to build demo document")?;
    JsonFileStore::create(&path, document)
        .with_context(|| format!("failed to write demo file {}", path.display()))?;
    info!(path = %path.display(), "no file given, opened demo file");
    Ok(path)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json);

    let file = match args.file {
        Some(file) => file,
        None => write_demo_file()?,
    };
    let config = app::ViewerConfig {
        file,
        watch_interval: Duration::from_millis(args.watch_interval_ms.max(100)),
        show_attributes: !args.hide_attributes,
        show_junk: args.show_junk,
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "h5view",
        options,
        Box::new(move |cc| Ok(Box::new(app::ViewerApp::new(cc, config)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
