use annotator::render::{LabelFont, Renderer};
use annotator::server::config::ServerConfig;
use annotator::server::logging::init_logging;
use annotator::version::VERSION;
use annotator::web::create_axum_router;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Annotate a single image file and write the PNG result
    Render {
        /// Input image
        #[arg(long)]
        image: PathBuf,
        /// JSON file with the annotations
        #[arg(long)]
        spec: PathBuf,
        /// Where to write the PNG
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn build_renderer(config: &ServerConfig) -> Renderer {
    let candidates = LabelFont::candidate_paths(&config.font_path);
    let font = LabelFont::load(&candidates, config.font_size).map(Arc::new);
    if font.is_none() {
        warn!(
            font_path = %config.font_path,
            "No usable label font found. Boxes will be drawn without labels."
        );
    }
    Renderer::new(font, config.render_options())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C.");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining connections.");
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let renderer = build_renderer(&config);
    let router = create_axum_router(&config, renderer);

    let addr = config.bind_address;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4()?
    } else {
        tokio::net::TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.set_keepalive(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(1024)?;
    info!(address = %addr, max_upload_bytes = config.max_upload_bytes, "HTTP server listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn render_file(
    config: ServerConfig,
    image: PathBuf,
    spec: PathBuf,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let image_bytes = tokio::fs::read(&image).await?;
    let spec_json = tokio::fs::read_to_string(&spec).await?;
    let renderer = build_renderer(&config);

    let png = tokio::task::spawn_blocking(move || renderer.render_spec_json(&image_bytes, &spec_json)).await??;
    tokio::fs::write(&output, &png).await?;
    info!(output = %output.display(), bytes = png.len(), "Wrote annotated image.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Manually check for --version before full parsing to keep the simple output.
    if std::env::args().any(|arg| arg == "--version") {
        println!("annotator version: {VERSION}");
        return Ok(());
    }

    let args = Args::parse();

    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return Err(e.into());
        }
    };

    let _log_guard = match init_logging(&server_config.log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging in '{}': {e}", server_config.log_dir);
            return Err(e.into());
        }
    };
    info!("Starting annotator, version: {}", VERSION);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(server_config).await,
        Command::Render { image, spec, output } => render_file(server_config, image, spec, output).await,
    }
}
