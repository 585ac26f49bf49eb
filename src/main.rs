//! Camera Session CLI
//!
//! Demonstrates the full session lifecycle against the mock camera
//! SDK: initialization through the binder, frame streaming from a
//! simulated hardware thread, and teardown.

use camera_session::{
    AspectRatio, CameraMode, FileConfig, HostServices, LifecycleBinder, MockCamera, MockHost,
    OutputConfig, SessionConfig, UiExecutor,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "camera-session")]
#[command(about = "Camera session lifecycle demo using the mock SDK")]
struct Args {
    /// Camera mode: preview, barcode-scan, or capture.
    #[arg(long, default_value = "barcode-scan")]
    mode: String,

    /// Aspect ratio: square or three-by-four.
    #[arg(long, default_value = "three-by-four")]
    ratio: String,

    /// Turn the flash on at session start.
    #[arg(long)]
    flash: bool,

    /// Number of synthetic frames to stream.
    #[arg(long, default_value_t = 20)]
    frames: u32,

    /// Stream until Ctrl+C instead of a fixed frame count.
    #[arg(long)]
    continuous: bool,

    /// TOML config file; takes precedence over the other flags.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_mode(value: &str) -> Option<CameraMode> {
    match value {
        "preview" => Some(CameraMode::Preview),
        "barcode-scan" => Some(CameraMode::BarcodeScan),
        "capture" => Some(CameraMode::Capture),
        _ => None,
    }
}

fn parse_ratio(value: &str) -> Option<AspectRatio> {
    match value {
        "square" => Some(AspectRatio::Square),
        "three-by-four" => Some(AspectRatio::ThreeByFour),
        _ => None,
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let (session_config, output) = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(file) => (file.session, file.output),
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            let mode = match parse_mode(&args.mode) {
                Some(mode) => mode,
                None => {
                    eprintln!("Unknown mode: {}", args.mode);
                    std::process::exit(2);
                }
            };
            let ratio = match parse_ratio(&args.ratio) {
                Some(ratio) => ratio,
                None => {
                    eprintln!("Unknown ratio: {}", args.ratio);
                    std::process::exit(2);
                }
            };
            (
                SessionConfig::new(mode, ratio, args.flash),
                OutputConfig {
                    continuous: args.continuous,
                    frame_count: args.frames,
                    ..OutputConfig::default()
                },
            )
        }
    };

    info!("Camera Session v{}", camera_session::VERSION);
    info!("This is a demonstration using the mock camera SDK");

    let (executor, ui) = UiExecutor::new();
    let sdk = MockCamera::new();
    let host: Arc<dyn HostServices> = Arc::new(MockHost::new(true));
    let host_ref: Weak<dyn HostServices> = Arc::downgrade(&host);
    let mut binder = LifecycleBinder::new(Arc::new(sdk.clone()), host_ref, ui);

    binder.on_create();
    binder.on_start();
    if let Err(e) = binder.initialize(
        session_config.mode,
        session_config.aspect_ratio,
        session_config.flash_enabled,
    ) {
        eprintln!("Failed to initialize camera: {}", e);
        std::process::exit(1);
    }
    executor.drain();

    let session = match binder.session() {
        Some(session) => session.clone(),
        None => {
            eprintln!("No session after initialize");
            std::process::exit(1);
        }
    };

    session.subscribe_frames(|frame| {
        tracing::debug!(sequence = frame.sequence(), "frame delivered");
    });
    let decoded_count = Arc::new(AtomicU32::new(0));
    {
        let decoded_count = Arc::clone(&decoded_count);
        session.subscribe_results(move |decoded| {
            if let Some(text) = decoded {
                info!(text = %text, "barcode decoded");
                decoded_count.fetch_add(1, Ordering::SeqCst);
            }
        });
    }
    session.subscribe_errors(|fault| warn!(fault = %fault, "camera fault"));

    #[cfg(feature = "metrics")]
    if output.metrics_port != 0 {
        spawn_metrics_server(output.metrics_port, session.clone());
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
            warn!(error = %e, "could not install Ctrl+C handler");
        }
    }

    // Simulated hardware capture thread; every tenth frame carries a
    // decode result.
    info!("Streaming frames...");
    let emitter = {
        let sdk = sdk.clone();
        let running = Arc::clone(&running);
        let output = output.clone();
        std::thread::spawn(move || {
            let mut emitted = 0u32;
            while running.load(Ordering::SeqCst)
                && (output.continuous || emitted < output.frame_count)
            {
                let frame = sdk.synthesize_frame(640, 480);
                let decoded = if frame.sequence() % 10 == 0 {
                    Some(format!("DEMO-{:04}", frame.sequence()))
                } else {
                    None
                };
                sdk.emit_frame(Some(frame), decoded);
                emitted += 1;
                std::thread::sleep(Duration::from_millis(33));
            }
        })
    };

    // This loop is the UI thread.
    while running.load(Ordering::SeqCst) && !emitter.is_finished() {
        executor.drain();
        std::thread::sleep(Duration::from_millis(10));
    }
    if emitter.join().is_err() {
        warn!("hardware emitter thread panicked");
    }
    executor.drain();

    match (session.min_zoom(), session.max_zoom()) {
        (Ok(min), Ok(max)) => info!(min, max, "zoom range"),
        _ => warn!("zoom range unavailable"),
    }

    match binder.take_picture() {
        Ok(bytes) => info!(bytes = bytes.len(), "still captured"),
        Err(e) => warn!(error = %e, "still capture failed"),
    }

    let stats = session.stats();
    info!(
        frames = stats.frames_published,
        results = stats.results_published,
        errors = stats.errors_published,
        decoded = decoded_count.load(Ordering::SeqCst),
        "stream finished"
    );

    binder.on_pause();
    binder.on_destroy(true);
    executor.drain();

    info!("Done");
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(port: u16, session: camera_session::CameraSession) {
    use camera_session::{MetricsRegistry, MetricsServer, MetricsServerConfig};

    std::thread::spawn(move || {
        let registry = match MetricsRegistry::new() {
            Ok(registry) => registry,
            Err(e) => {
                warn!(error = %e, "metrics registry creation failed");
                return;
            }
        };
        let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry, session);
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "tokio runtime creation failed");
                return;
            }
        };
        if let Err(e) = runtime.block_on(server.run()) {
            warn!(error = %e, "metrics server failed");
        }
    });
}
