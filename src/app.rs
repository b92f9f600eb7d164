use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::TokenVerifier;
use crate::config::{AppConfig, SecurityConfig};
use crate::database::{DatabaseManager, ExpenseRepository, ExpenseStore};
use crate::handlers::{protected, public};
use crate::middleware::bearer_auth_middleware;

/// Shared by every request: the store handle and the token verifier.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ExpenseStore>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn ExpenseStore>, verifier: TokenVerifier) -> Self {
        Self {
            store,
            verifier: Arc::new(verifier),
        }
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let base_path = config.api.base_path.trim_end_matches('/');

    let api = Router::new()
        .merge(test_routes())
        .merge(expense_routes(state.clone()));

    let app = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health));

    let app = if base_path.is_empty() {
        app.merge(api)
    } else {
        app.nest(base_path, api)
    };

    app
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn test_routes() -> Router<AppState> {
    Router::new()
        .route("/test", get(public::test_ping))
        .route("/test/auth-check", get(public::test_auth_check))
}

fn expense_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/expenses",
            get(protected::expenses_list).post(protected::expenses_create),
        )
        .route("/expenses/total", get(protected::expenses_total))
        .route(
            "/expenses/:id",
            get(protected::expense_get)
                .put(protected::expense_put)
                .delete(protected::expense_delete),
        )
        .route_layer(middleware::from_fn_with_state(state, bearer_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Connect, optionally migrate, then serve until Ctrl-C.
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    config.validate()?;
    tracing::info!("Starting Expense Tracker API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect_lazy(&config.database)?;
    if config.database.run_migrations {
        DatabaseManager::run_migrations(&pool).await?;
    }

    let verifier = TokenVerifier::from_config(&config.auth).await?;
    let state = AppState::new(Arc::new(ExpenseRepository::new(pool.clone())), verifier);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Expense Tracker API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state, config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
