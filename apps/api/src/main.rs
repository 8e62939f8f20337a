use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_api::analysis::{AiAnalyzer, AiError, ResumeAnalyzer};
use resume_api::config::{Config, StorageConfig};
use resume_api::db::create_pool;
use resume_api::resumes::{
    AnalysisOrchestrator, FileStore, LocalFileStore, MemoryResumeStore, PgResumeStore,
    PipelineSettings, ResumeStore, S3FileStore,
};
use resume_api::routes::build_router;
use resume_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on incomplete S3 settings)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // Record store: PostgreSQL when configured, otherwise in-process
    let store: Arc<dyn ResumeStore> = match &config.database_url {
        Some(url) => Arc::new(PgResumeStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set; resumes are kept in memory and lost on restart");
            Arc::new(MemoryResumeStore::new())
        }
    };

    // File store: S3 / MinIO when configured, otherwise a local directory
    let files: Arc<dyn FileStore> = match &config.storage {
        StorageConfig::S3 {
            bucket,
            endpoint,
            region,
            access_key_id,
            secret_access_key,
        } => {
            let s3 =
                S3FileStore::connect(bucket, endpoint, region, access_key_id, secret_access_key)
                    .await;
            info!("S3 file store initialized (bucket: {bucket})");
            Arc::new(s3)
        }
        StorageConfig::Local { root } => {
            info!("Local file store initialized ({})", root.display());
            Arc::new(LocalFileStore::new(root.clone()))
        }
    };

    // AI analyzer: optional, heuristic analysis stands in without it
    let ai: Option<Arc<dyn ResumeAnalyzer>> = match AiAnalyzer::from_config(&config.ai) {
        Ok(analyzer) => {
            info!("AI analyzer initialized (model: {})", config.ai.model);
            Some(Arc::new(analyzer))
        }
        Err(AiError::Unavailable) => {
            warn!("GROQ_API_KEY not set; using heuristic analysis only");
            None
        }
        Err(e) => {
            warn!("AI analyzer could not be initialized, using heuristic analysis only: {e}");
            None
        }
    };

    let resumes = AnalysisOrchestrator::new(
        store,
        files,
        ai,
        PipelineSettings {
            min_text_length: config.min_text_length,
            max_file_size: config.max_file_size,
        },
    );

    // Build app state
    let state = AppState {
        resumes,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
