//! OpenAPI document for the JSON surface. The HTML pages are deliberately
//! undocumented; only the stateless endpoints belong here.

use axum::Json;
use utoipa::OpenApi;

use super::handlers::predict::{PredictRequest, PredictResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "prediksi",
        description = "Iris classification service: stateless prediction API and liveness probe."
    ),
    paths(
        crate::prediksi::handlers::health::health,
        crate::prediksi::handlers::predict::api,
    ),
    components(schemas(PredictRequest, PredictResponse)),
    tags(
        (name = "health", description = "Build and store status"),
        (name = "predict", description = "Stateless classification")
    )
)]
pub struct ApiDoc;

/// Serve the generated document; clients can point any OpenAPI viewer at it.
pub(super) async fn serve() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
