use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;

use auth::rate_limit::RateLimitState;
use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimitState,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindloom_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    let db = db::create_pool(&config.database_url).await;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let rate_limiter = RateLimitState::new();

    let state = AppState {
        db,
        config: config.clone(),
        rate_limiter,
    };

    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        // Journal entries
        .route("/api/entries", get(handlers::entries::list_entries))
        .route("/api/entries", post(handlers::entries::create_entry))
        .route("/api/entries/:id", put(handlers::entries::update_entry))
        .route("/api/entries/:id", delete(handlers::entries::delete_entry))
        .route(
            "/api/entries/date/:year/:month/:day",
            get(handlers::entries::get_entries_by_date),
        )
        .route(
            "/api/entries/session/:year/:month/:day",
            get(handlers::entries::resolve_session),
        )
        .route(
            "/api/entries/:id/regenerate-ai",
            post(handlers::reflections::regenerate_reflection),
        )
        // Derived stats
        .route("/api/stats", get(handlers::stats::get_stats))
        // Goals & activity log
        .route("/api/goals", get(handlers::goals::list_goals))
        .route("/api/goals", post(handlers::goals::create_goal))
        .route("/api/goals/:id", get(handlers::goals::get_goal))
        .route("/api/goals/:id", put(handlers::goals::update_goal))
        .route("/api/goals/:id", delete(handlers::goals::delete_goal))
        .route(
            "/api/goals/:id/activities",
            post(handlers::goals::log_activity),
        )
        .route(
            "/api/goals/:id/activities",
            get(handlers::goals::list_activities),
        )
        // Check-ins
        .route("/api/check-ins", post(handlers::check_ins::create_check_in))
        .route("/api/check-ins", get(handlers::check_ins::list_check_ins))
        .route(
            "/api/check-ins/:id/respond",
            put(handlers::check_ins::respond_check_in),
        )
        .route(
            "/api/check-ins/:id/resolve",
            put(handlers::check_ins::resolve_check_in),
        )
        .route(
            "/api/check-ins/:id",
            delete(handlers::check_ins::delete_check_in),
        )
        // Challenges & badges
        .route("/api/challenges", get(handlers::challenges::list_challenges))
        .route(
            "/api/challenges/mine",
            get(handlers::challenges::list_my_challenges),
        )
        .route(
            "/api/challenges/:id/join",
            post(handlers::challenges::join_challenge),
        )
        .route(
            "/api/challenges/:id/progress",
            post(handlers::challenges::record_progress),
        )
        .route("/api/badges", get(handlers::challenges::list_badges))
        // Blueprint export audit
        .route(
            "/api/blueprints/:kind/downloads",
            post(handlers::blueprints::record_download),
        )
        // Auth actions requiring a session
        .route("/api/auth/logout", post(handlers::auth::logout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .unwrap()];
        // In dev, also allow LAN access (e.g. testing from another device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    // Client IP is needed for rate limiting on the auth routes
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .unwrap();
}
