//! `sketch`: compose a scene from a JSON script and export it as an image.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use sketch_host::{
    drain_events, BroadcastNotifier, FanoutNotifier, LogNotifier, SceneManager, SceneScript,
    SketchError,
};
use sketch_renderer::{GlyphFont, RasterFormat};

/// Compose a scene from a JSON script and export it as an image
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene script (JSON)
    script: PathBuf,

    /// Output image file
    #[arg(short, long, default_value = "scene.png")]
    output: PathBuf,

    /// Raster format (png, jpeg, bmp); defaults to the output extension
    #[arg(short, long)]
    format: Option<String>,

    /// Settings file (JSON); overrides settings in the script
    #[arg(long)]
    settings: Option<PathBuf>,

    /// TrueType/OpenType font for text layers
    #[arg(long)]
    font: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), SketchError> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let script = SceneScript::from_json(&tokio::fs::read_to_string(&args.script).await?)?;
    let settings = match &args.settings {
        Some(path) => sketch_io::load_settings(path)?,
        None => script.settings.clone().unwrap_or_default(),
    };

    let format = match &args.format {
        Some(name) => name.parse::<RasterFormat>()?,
        None => args
            .output
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::parse::<RasterFormat>)
            .transpose()?
            .unwrap_or(RasterFormat::Png),
    };

    // One added event per product plus slack for removals.
    let broadcast = Arc::new(BroadcastNotifier::new(script.products.len() + 64));
    let mut events = broadcast.subscribe();
    let mut notifier = FanoutNotifier::default().with(broadcast);
    if args.verbose {
        notifier = notifier.with(Arc::new(LogNotifier));
    }

    let mut builder = SceneManager::builder()
        .with_settings(settings)
        .with_notifier(Arc::new(notifier));
    if let Some(path) = &args.font {
        builder = builder.with_font(GlyphFont::from_file(path)?);
    }
    let manager = builder.build()?;

    log::info!("Applying {}", args.script.display());
    let outcomes = script.apply(&manager).await?;
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            log::error!("Failed to place '{}': {}", outcome.target, e);
        }
    }

    for event in drain_events(&mut events) {
        println!("{} {}", event.name(), serde_json::to_string(event.descriptor())?);
    }

    let bytes = manager.export_bytes(format.mime_type())?;
    tokio::fs::write(&args.output, &bytes).await?;
    log::info!(
        "Wrote {} ({} layers, {} bytes, {} failed loads)",
        args.output.display(),
        manager.layer_count()?,
        bytes.len(),
        failed
    );
    Ok(())
}
