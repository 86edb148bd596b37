//! Taskboard server configuration
//!
//! Everything environment-derived is read once at startup into an immutable
//! `ServerConfig`; nothing reads the environment after that. A backend whose
//! settings are absent is disabled, never an error.

use std::path::PathBuf;
use std::sync::Arc;

use crate::sync::SyncBroker;

/// Basic-Auth credentials. The server fails closed until both are set.
#[derive(Clone, Debug)]
pub struct BasicAuth {
    pub user: String,
    pub pass: String,
}

/// Content-host replication target (GitHub contents API).
#[derive(Clone, Debug)]
pub struct GithubConfig {
    pub owner: String,
    pub repo: String,
    /// Path of the document within the repository
    pub path: String,
    /// Target branch for every update
    pub branch: String,
    pub token: String,
}

/// Row-store replication target (PostgREST endpoint).
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    /// Base URL, no trailing slash
    pub url: String,
    pub service_key: String,
    pub table: String,
    /// Fixed row id; exactly one document is ever tracked
    pub row_id: String,
}

/// Configuration for the Taskboard server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen port
    pub port: u16,
    /// Local task document path
    pub tasks_path: PathBuf,
    /// Static UI root
    pub static_dir: PathBuf,
    /// Basic-Auth credentials; `None` rejects every request
    pub auth: Option<BasicAuth>,
    /// Content-host backend; `None` disables it
    pub github: Option<GithubConfig>,
    /// Row-store backend; `None` disables it
    pub supabase: Option<SupabaseConfig>,
}

impl ServerConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Self {
        let auth = match (env_nonempty("TASKBOARD_USER"), env_nonempty("TASKBOARD_PASS")) {
            (Some(user), Some(pass)) => Some(BasicAuth { user, pass }),
            _ => None,
        };

        let github = match (
            env_nonempty("GITHUB_TOKEN"),
            env_nonempty("GITHUB_OWNER"),
            env_nonempty("GITHUB_REPO"),
        ) {
            (Some(token), Some(owner), Some(repo)) => Some(GithubConfig {
                owner,
                repo,
                path: env_or("GITHUB_PATH", "data/tasks.json"),
                branch: env_or("GITHUB_BRANCH", "main"),
                token,
            }),
            _ => None,
        };

        let supabase = match (
            env_nonempty("SUPABASE_URL"),
            env_nonempty("SUPABASE_SERVICE_ROLE_KEY"),
        ) {
            (Some(url), Some(service_key)) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                service_key,
                table: env_or("SUPABASE_TABLE", "taskboard"),
                row_id: env_or("SUPABASE_ID", "default"),
            }),
            _ => None,
        };

        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            tasks_path: PathBuf::from(env_or("TASKS_FILE", "data/tasks.json")),
            static_dir: PathBuf::from(env_or("STATIC_DIR", ".")),
            auth,
            github,
            supabase,
        }
    }

    /// Config rooted in a custom base directory: local storage only, no
    /// credentials, no remotes.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base = base_dir.into();
        Self {
            port: 0,
            tasks_path: base.join("data").join("tasks.json"),
            static_dir: base,
            auth: None,
            github: None,
            supabase: None,
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_nonempty(key).unwrap_or_else(|| default.to_string())
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub broker: Arc<SyncBroker>,
}
