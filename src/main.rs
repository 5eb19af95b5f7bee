use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use touchjoy::config::Loader;
use touchjoy::executor::{EnigoSynthesizer, EventLoop, Runtime};
use touchjoy::gamepad::geometry::ScreenBounds;
use touchjoy::host::{self, HeadlessSurface, Surface};
use touchjoy::sources::{
    self, ChangeSource, EventSource, HostEvent, NotifyWatcher, PollWatcher, StdinSource,
    WatchGuard,
};
use touchjoy::utils::paths;

/// How config file changes are detected.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum WatchMode {
    /// OS change notifications
    Notify,
    /// Periodic length + mtime polling
    Poll,
    /// No hot reload
    Off,
}

/// touchjoy CLI
#[derive(Debug, Parser)]
#[command(
    name = touchjoy::PKG_NAME,
    version = touchjoy::PKG_VERSION,
    about = "On-screen virtual gamepad that turns touches into keyboard and mouse input"
)]
struct Args {
    /// Path to the INI layout file
    #[arg(default_value = paths::DEFAULT_CONFIG)]
    config: PathBuf,

    /// Enable dry-run mode (log input instead of synthesizing it)
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Screen size as WIDTHxHEIGHT instead of the detected main display
    #[arg(long = "screen")]
    screen: Option<ScreenBounds>,

    /// How to watch the layout file for changes
    #[arg(long = "watch", value_enum, default_value_t = WatchMode::Notify)]
    watch: WatchMode,

    /// Poll interval in milliseconds for `--watch poll`
    #[arg(long = "poll-ms")]
    poll_ms: Option<u64>,

    /// Print the resolved layout as JSON and exit
    #[arg(long = "dump")]
    dump: bool,
}

fn start_watcher(args: &Args, path: &Path, signal: Arc<Notify>) -> Option<WatchGuard> {
    let poll = || PollWatcher::new(path, args.poll_ms);
    let watcher: Box<dyn ChangeSource> = match args.watch {
        WatchMode::Off => {
            info!("Hot reload disabled");
            return None;
        }
        WatchMode::Notify => Box::new(NotifyWatcher::new(path)),
        WatchMode::Poll => Box::new(poll()),
    };
    match watcher.start(signal.clone()) {
        Ok(guard) => Some(guard),
        Err(err) if args.watch == WatchMode::Notify => {
            warn!(error = %err, "File notifications unavailable; falling back to polling");
            poll().start(signal).ok()
        }
        Err(err) => {
            warn!(error = %err, watcher = watcher.name(), "Failed to start config watcher");
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    touchjoy::init_tracing(args.log_level.as_deref());

    info!(
        version = touchjoy::PKG_VERSION,
        config = %args.config.display(),
        dry_run = args.dry_run,
        "Starting touchjoy"
    );

    let config = paths::enter_config_dir(&args.config)?;
    let loader = Loader::new().with_base_dir(paths::config_dir(&config));

    let model = match loader.load_from_path(&config) {
        Ok(model) => model,
        Err(err) => {
            HeadlessSurface::new().report("Error while loading config", &err);
            std::process::exit(-1);
        }
    };
    debug!(buttons = model.len(), "Layout loaded successfully");

    let screen = match args.screen {
        Some(screen) => screen,
        None => host::detect_screen().unwrap_or_else(|err| {
            warn!(error = %err, fallback = %host::FALLBACK_SCREEN, "Screen detection failed");
            host::FALLBACK_SCREEN
        }),
    };

    if args.dump {
        let json = serde_json::to_string_pretty(&host::layout(&model, screen))?;
        println!("{json}");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let synth = EnigoSynthesizer::new(args.dry_run, shutdown.clone());
    let runtime = Runtime::new(model, screen, synth, HeadlessSurface::new());

    // Channel for contact events produced by sources
    let (tx, rx) = mpsc::channel::<HostEvent>(256);
    let contact_sources: Vec<Box<dyn EventSource>> = vec![Box::new(StdinSource::new())];
    let _handles = sources::spawn_all_sources(&contact_sources, tx);

    let reload = Arc::new(Notify::new());
    let _watch = start_watcher(&args, &config, reload.clone());

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
            ctrl_c.cancel();
        }
    });

    EventLoop::new(runtime, rx, reload, loader, &config, shutdown)
        .run()
        .await;

    info!("touchjoy exited");
    Ok(())
}
