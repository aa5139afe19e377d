use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::error;

use crate::GIT_COMMIT_HASH;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service name, version, build, and store status"),
        (status = 503, description = "The store is unreachable"),
    ),
    tag = "health"
)]
pub async fn health(Extension(pool): Extension<SqlitePool>) -> impl IntoResponse {
    let store_ok = match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => true,
        Err(err) => {
            error!("health probe failed against the store: {err}");
            false
        }
    };

    let body = Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "build": GIT_COMMIT_HASH,
        "store": if store_ok { "ok" } else { "unavailable" },
    }));

    let short_hash = if GIT_COMMIT_HASH.len() > 7 {
        &GIT_COMMIT_HASH[0..7]
    } else {
        ""
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        "X-App",
        format!(
            "{}:{}:{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            short_hash
        )
        .parse()
        .unwrap(),
    );

    let status = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, headers, body)
}
