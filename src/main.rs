use axum::{
    http::HeaderValue,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

mod authentication;
mod config;
mod crud_ops;
mod entities;
mod error;
mod filters;
mod storage;
mod validation;

use config::Config;
use crud_ops::SharedStorage;
use storage::MemStorage;

#[derive(Debug, thiserror::Error)]
enum ServerError {
    #[error("invalid CORS origin {0:?}")]
    CorsOrigin(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn app(store: SharedStorage, cors: CorsLayer) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route(
            "/api/tasks",
            get(crud_ops::get_tasks).post(crud_ops::create_task),
        )
        .route("/api/tasks/summary", get(crud_ops::task_summary))
        .route(
            "/api/tasks/{id}",
            get(crud_ops::get_task)
                .put(crud_ops::update_task)
                .delete(crud_ops::delete_task),
        )
        .route(
            "/api/categories",
            get(crud_ops::get_categories).post(crud_ops::create_category),
        )
        .route("/api/users", post(authentication::sign_up))
        .route("/api/users/{id}", get(authentication::get_user))
        .route("/api/login", post(authentication::sign_in))
        .layer(Extension(store))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, ServerError> {
    let Some(origin) = origin else {
        return Ok(CorsLayer::permissive());
    };
    let origin = origin
        .parse::<HeaderValue>()
        .map_err(|_| ServerError::CorsOrigin(origin.to_string()))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

async fn run_server(config: Config) -> Result<(), ServerError> {
    let cors = cors_layer(config.cors_origin.as_deref())?;

    // one store for the whole process, seeded with the default categories
    let store: SharedStorage = Arc::new(MemStorage::new());
    let app = app(store, cors);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    if let Err(e) = run_server(config).await {
        tracing::error!("run server error: {e}");
        std::process::exit(1);
    };
}
