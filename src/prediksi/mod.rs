//! Server wiring: pool, migration, admin bootstrap, router, and listener.

use anyhow::{Context, Result};
use axum::{
    Router,
    body::Body,
    extract::{Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
};
use secrecy::{ExposeSecret, SecretString};
use std::{path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;

use crate::classifier::{CentroidModel, Classifier};
use crate::policy;
use crate::session::SessionManager;
use crate::store::{self, users};

pub mod handlers;
mod openapi;
pub mod service;

pub struct ServerConfig {
    pub port: u16,
    pub db: PathBuf,
    pub session_secret: SecretString,
    pub admin_password: SecretString,
}

/// Start the server
/// # Errors
/// Return error if the store cannot be prepared or the listener fails
pub async fn new(config: ServerConfig) -> Result<()> {
    let pool = store::connect(&config.db)
        .await
        .context("Failed to open database")?;

    // Schema and admin account must be in place before the listener binds.
    store::migrate(&pool)
        .await
        .context("Failed to run startup migration")?;
    users::ensure_admin(
        &pool,
        policy::ADMIN_USERNAME,
        config.admin_password.expose_secret(),
    )
    .await
    .context("Failed to bootstrap admin account")?;

    let sessions = Arc::new(SessionManager::new(config.session_secret));
    let classifier: Arc<dyn Classifier> = Arc::new(CentroidModel::pretrained());

    let app = router().layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &Request<Body>| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(Extension(sessions))
            .layer(Extension(classifier))
            .layer(Extension(pool)),
    );

    let listener = TcpListener::bind(format!("::0:{}", config.port)).await?;

    info!("Listening on [::]:{}", config.port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn router() -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health::health))
        .route(
            "/login",
            get(handlers::auth::login_page).post(handlers::auth::login),
        )
        .route(
            "/register",
            get(handlers::auth::register_page).post(handlers::auth::register),
        )
        .route("/logout", get(handlers::auth::logout))
        .route(
            "/prediksi",
            get(handlers::predict::page).post(handlers::predict::submit),
        )
        .route("/users", get(handlers::profile::page))
        .route(
            "/users/update-password",
            post(handlers::profile::update_password),
        )
        .route(
            "/users/update-username",
            post(handlers::profile::update_username),
        )
        .route("/predict", post(handlers::predict::api))
        .route("/api-docs/openapi.json", get(openapi::serve))
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
