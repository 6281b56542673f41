use anyhow::Context;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use video_composer::app;
use video_composer::config::settings::AppConfig;
use video_composer::infrastructure::encoder::ffmpeg::FfmpegEncoder;
use video_composer::infrastructure::storage::artifacts::ArtifactStore;
use video_composer::state::AppState;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    info!("Starting server...");

    let config = AppConfig::new();
    let storage = ArtifactStore::new(&config.uploads_dir, &config.output_dir, &config.templates_dir);

    if let Err(e) = storage.ensure_directories().await {
        warn!("Directory creation error: {}", e);
    }
    info!(
        uploads = %storage.uploads_dir().display(),
        outputs = %storage.output_dir().display(),
        templates = %storage.templates_dir().display(),
        "Artifact store ready"
    );

    let encoder = FfmpegEncoder::new(&config.ffmpeg_path, config.encoder_timeout);
    match encoder.version().await {
        Ok(version) => info!("Encoder available: {}", version),
        Err(e) => warn!("Encoder check failed, jobs will fail until it is installed: {}", e),
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let state = AppState::new(config, storage, Arc::new(encoder));
    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Video processing service running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /upload-template/intro - Upload intro template");
    info!("  POST /upload-template/outro - Upload outro template");
    info!("  POST /process-video - Process video with customer name");
    info!("  GET /videos - List processed videos");
    info!("  GET /download/{{filename}} - Download video");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
