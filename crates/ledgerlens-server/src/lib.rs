//! LedgerLens Web Server
//!
//! Axum-based REST API for the LedgerLens finance backend.
//!
//! Security posture:
//! - Identity arrives from a trusted proxy header (secure by default,
//!   use --no-auth for local dev)
//! - Restrictive CORS policy
//! - Input validation (file size and type limits)
//! - Sanitized error responses
//!
//! Authentication itself happens upstream (a reverse proxy or access
//! gateway). This server only resolves the owner identity from headers
//! and scopes every query by it.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use ledgerlens_core::ai::{AiClient, AiProvider, RetryPolicy};
use ledgerlens_core::db::Database;

mod handlers;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Header carrying the owner identity set by the local client or proxy
const OWNER_HEADER: &str = "x-ledgerlens-user";

/// Cloudflare Access header for authenticated user email (when deployed
/// behind an access gateway)
const CF_ACCESS_USER_HEADER: &str = "cf-access-authenticated-user-email";

/// Owner identity used when authentication is disabled
const LOCAL_OWNER: &str = "local-dev";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether an owner header is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    pub ai: Option<AiClient>,
    /// Retry policy for AI calls made on behalf of requests
    pub retry: RetryPolicy,
    /// Directory for storing uploaded files
    pub uploads_dir: std::path::PathBuf,
}

/// Resolve the owner identity from request headers
fn resolve_owner(headers: &HeaderMap) -> Option<String> {
    for name in [OWNER_HEADER, CF_ACCESS_USER_HEADER] {
        if let Some(owner) = headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
        {
            return Some(owner.to_string());
        }
    }
    None
}

/// Owner identity for a request, falling back to the local-dev identity
/// when authentication is disabled
pub fn request_owner(headers: &HeaderMap) -> String {
    resolve_owner(headers).unwrap_or_else(|| LOCAL_OWNER.to_string())
}

/// Authentication middleware: when auth is required, reject requests
/// without an owner identity
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    if resolve_owner(request.headers()).is_some() {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no owner identity");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let ai = AiClient::from_env();
    create_router_with_options(db, config, ai, None)
}

/// Create the application router with additional options (for testing)
pub fn create_router_with_options(
    db: Database,
    config: ServerConfig,
    ai: Option<AiClient>,
    uploads_dir: Option<std::path::PathBuf>,
) -> Router {
    if let Some(ref client) = ai {
        info!(
            "AI provider configured: {} (model: {})",
            client.name(),
            client.model()
        );
    } else {
        info!("AI provider not configured (set GEMINI_API_KEY or OPENAI_API_KEY to enable processing)");
    }

    let uploads_dir = uploads_dir.unwrap_or_else(|| std::path::PathBuf::from("uploads"));

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        ai,
        retry: RetryPolicy::default(),
        uploads_dir,
    });

    let api_routes = Router::new()
        // Identity and health
        .route("/me", get(handlers::get_me))
        .route("/health", get(handlers::get_health))
        // Documents
        .route(
            "/documents",
            get(handlers::list_documents).post(handlers::upload_document),
        )
        .route(
            "/documents/:id",
            get(handlers::get_document).delete(handlers::delete_document),
        )
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/transactions/summary",
            get(handlers::get_transaction_summary),
        )
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        // Reminders
        .route(
            "/reminders",
            get(handlers::list_reminders).post(handlers::create_reminder),
        )
        .route(
            "/reminders/:id",
            get(handlers::get_reminder)
                .put(handlers::update_reminder)
                .delete(handlers::delete_reminder),
        )
        // Anomalies
        .route("/anomalies", get(handlers::list_anomalies))
        .route(
            "/anomalies/:id",
            get(handlers::get_anomaly).delete(handlers::delete_anomaly),
        )
        .route("/anomalies/:id/status", put(handlers::update_anomaly_status))
        // Analytics
        .route("/analytics/summary", get(handlers::get_analytics_summary))
        .route("/analytics/insights", get(handlers::get_insights))
        // Admin (operational stats; restrict at the proxy)
        .route("/admin/dashboard", get(handlers::get_admin_dashboard));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(db, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    serve_with_options(db, host, port, config, None).await
}

/// Start the server with custom configuration and uploads directory
pub async fn serve_with_options(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
    uploads_dir: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("Authentication disabled - do not expose to network!");
    }

    check_ai_connection().await;

    let ai = AiClient::from_env();
    let app = create_router_with_options(db, config, ai, uploads_dir);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI provider connection status
async fn check_ai_connection() {
    match AiClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "AI provider connected: {} (model: {})",
                    client.name(),
                    client.model()
                );
            } else {
                warn!(
                    "AI provider configured but not responding: {} (model: {})",
                    client.name(),
                    client.model()
                );
            }
        }
        None => {
            info!("AI provider not configured (set GEMINI_API_KEY or OPENAI_API_KEY to enable processing)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn payload_too_large(msg: &str) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<ledgerlens_core::Error> for AppError {
    fn from(err: ledgerlens_core::Error) -> Self {
        use ledgerlens_core::Error as CoreError;

        match err {
            CoreError::NotFound(msg) => Self::not_found(&msg),
            CoreError::InvalidData(msg) => Self::bad_request(&msg),
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(other.into()),
            },
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err.into()),
        }
    }
}
