use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod handlers;
mod state;
mod storage;

use crate::handlers::api_routes;
use crate::state::AppState;
use crate::storage::{FileStorage, S3Storage, S3StorageConfig, Storage};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
    /// Local image directory, used when no S3 bucket is given.
    #[arg(long, env = "STORAGE_DIR")]
    storage_dir: Option<PathBuf>,
    #[arg(long, env = "S3_BUCKET")]
    s3_bucket: Option<String>,
    #[arg(long, env = "S3_PREFIX")]
    s3_prefix: Option<String>,
    #[arg(long, env = "S3_REGION")]
    s3_region: Option<String>,
    #[arg(long, env = "S3_ENDPOINT")]
    s3_endpoint: Option<String>,
    #[arg(long, env = "S3_FORCE_PATH_STYLE")]
    s3_force_path_style: bool,
    #[arg(long, env = "S3_ACCESS_KEY_ID")]
    s3_access_key_id: Option<String>,
    #[arg(long, env = "S3_SECRET_ACCESS_KEY", hide_env_values = true)]
    s3_secret_access_key: Option<String>,
    #[arg(long, env = "PUBLIC_DIR")]
    public_dir: Option<PathBuf>,
}

async fn build_storage(args: &Args) -> std::io::Result<Arc<dyn Storage>> {
    if let Some(bucket) = args.s3_bucket.clone() {
        let config = S3StorageConfig {
            prefix: args.s3_prefix.clone(),
            region: args.s3_region.clone(),
            endpoint_url: args.s3_endpoint.clone(),
            force_path_style: args.s3_force_path_style,
            access_key_id: args.s3_access_key_id.clone(),
            secret_access_key: args.s3_secret_access_key.clone(),
            ..S3StorageConfig::new(bucket)
        };
        tracing::info!(bucket = %config.bucket, "storing images in s3");
        return Ok(Arc::new(S3Storage::new(config).await));
    }

    let storage_dir = args
        .storage_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../images"));
    tokio::fs::create_dir_all(&storage_dir).await?;
    tracing::info!(dir = %storage_dir.display(), "storing images on disk");
    Ok(Arc::new(FileStorage::new(storage_dir)))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let state = AppState::new(build_storage(&args).await?);

    let public_dir = args
        .public_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"));

    let app = api_routes()
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!("Sketchshare running at http://localhost:{}", args.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
