//! Taskboard Server Library
//!
//! A single JSON task document served over HTTP: Basic-Auth admission,
//! durable local persistence, and best-effort replication to a content host
//! and a row store when they are configured.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod store;
pub mod sync;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, Method};
use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::{AppState, ServerConfig};
use handlers::{get_tasks, put_tasks};
use store::LocalTaskStore;
use sync::{GithubContentRemote, Replica, SupabaseRowRemote, SyncBroker};

/// Build the application state, wiring up whichever backends the
/// configuration enables.
pub async fn build_state(config: ServerConfig) -> anyhow::Result<AppState> {
    let local = LocalTaskStore::new(&config.tasks_path);
    local.ensure_dirs().await?;

    let content: Option<Arc<dyn Replica>> = match &config.github {
        Some(github) => {
            info!(
                "[Sync] content host enabled: {}/{} ({})",
                github.owner, github.repo, github.branch
            );
            Some(Arc::new(GithubContentRemote::new(github.clone())?))
        }
        None => {
            info!("[Sync] content host disabled");
            None
        }
    };

    let rows: Option<Arc<dyn Replica>> = match &config.supabase {
        Some(supabase) => {
            info!(
                "[Sync] row store enabled: {} (table {})",
                supabase.url, supabase.table
            );
            Some(Arc::new(SupabaseRowRemote::new(supabase.clone())?))
        }
        None => {
            info!("[Sync] row store disabled");
            None
        }
    };

    let broker = Arc::new(SyncBroker::new(local, content, rows));

    Ok(AppState { config, broker })
}

/// Build the router: the task API plus the static UI fallback, everything
/// behind Basic-Auth except OPTIONS.
///
/// The CORS layer answers every OPTIONS request on the API path itself, so
/// preflights succeed without credentials.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let api = Router::new()
        .route("/api/tasks", get(get_tasks).put(put_tasks))
        .layer(cors);

    let static_dir = state.config.static_dir.clone();

    Router::new()
        .merge(api)
        .fallback_service(ServeDir::new(static_dir))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::mw_require_basic_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        // Already set, ignore
    }

    let config = ServerConfig::from_env();

    info!("=== Taskboard Server ===");
    info!("Document: {:?}", config.tasks_path);
    info!("Static root: {:?}", config.static_dir);
    if config.auth.is_none() {
        warn!("[Auth] TASKBOARD_USER/TASKBOARD_PASS unset, all requests will be rejected");
    }

    let port = config.port;
    let state = build_state(config).await?;
    let router = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
