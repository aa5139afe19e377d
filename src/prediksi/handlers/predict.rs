//! Prediction page and the stateless JSON API.

use axum::{
    Form, Json,
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::{extract_session_cookie, pages};
use crate::classifier::Classifier;
use crate::error::Error;
use crate::prediksi::service;
use crate::session::{Flash, SessionManager};

#[derive(Debug, Deserialize)]
pub struct PredictForm {
    pub sepal_length: String,
    pub sepal_width: String,
    pub petal_length: String,
    pub petal_width: String,
}

impl PredictForm {
    fn raw(&self) -> [&str; 4] {
        [
            &self.sepal_length,
            &self.sepal_width,
            &self.petal_length,
            &self.petal_width,
        ]
    }
}

pub async fn page(
    headers: HeaderMap,
    Extension(pool): Extension<SqlitePool>,
    Extension(sessions): Extension<Arc<SessionManager>>,
) -> Response {
    let cookie = extract_session_cookie(&headers);
    let Some(user) = sessions.current(cookie.as_deref()).await else {
        return Redirect::to("/login").into_response();
    };
    let flash = sessions.pop_flash(cookie.as_deref()).await;
    let (history, flash) = match service::history(&pool, user.user_id).await {
        Ok(history) => (history, flash),
        Err(err) => {
            error!("failed to load history: {err}");
            (
                Vec::new(),
                Some(Flash {
                    message: err.flash_message(),
                    category: "error".to_string(),
                }),
            )
        }
    };
    pages::predict(&user, flash.as_ref(), None, ["", "", "", ""], &history).into_response()
}

/// Form submission renders inline (no redirect) so failed input can be
/// echoed back exactly as typed.
pub async fn submit(
    headers: HeaderMap,
    Extension(pool): Extension<SqlitePool>,
    Extension(sessions): Extension<Arc<SessionManager>>,
    Extension(classifier): Extension<Arc<dyn Classifier>>,
    Form(form): Form<PredictForm>,
) -> Response {
    let cookie = extract_session_cookie(&headers);
    let Some(user) = sessions.current(cookie.as_deref()).await else {
        return Redirect::to("/login").into_response();
    };

    let (result, flash) =
        match service::submit_prediction(&pool, classifier.as_ref(), user.user_id, form.raw())
            .await
        {
            Ok((outcome, _record)) => (Some(outcome), None),
            Err(err) => {
                if let Error::Store(source) = &err {
                    error!("failed to persist prediction: {source}");
                }
                (
                    None,
                    Some(Flash {
                        message: err.flash_message(),
                        category: "error".to_string(),
                    }),
                )
            }
        };

    let history = match service::history(&pool, user.user_id).await {
        Ok(history) => history,
        Err(err) => {
            error!("failed to load history: {err}");
            Vec::new()
        }
    };

    pages::predict(&user, flash.as_ref(), result.as_ref(), form.raw(), &history).into_response()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PredictRequest {
    #[schema(example = 5.1)]
    pub sepal_length: f64,
    #[schema(example = 3.5)]
    pub sepal_width: f64,
    #[schema(example = 1.4)]
    pub petal_length: f64,
    #[schema(example = 0.2)]
    pub petal_width: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PredictResponse {
    pub status: String,
    pub prediction: i64,
    pub label: String,
}

#[utoipa::path(
    post,
    path = "/predict",
    request_body = PredictRequest,
    responses(
        (status = 200, description = "Classification result", body = PredictResponse),
    ),
    tag = "predict"
)]
pub async fn api(
    Extension(classifier): Extension<Arc<dyn Classifier>>,
    Json(payload): Json<PredictRequest>,
) -> impl IntoResponse {
    let outcome = classifier.classify([
        payload.sepal_length,
        payload.sepal_width,
        payload.petal_length,
        payload.petal_width,
    ]);
    Json(PredictResponse {
        status: "success".to_string(),
        prediction: outcome.class_id,
        label: outcome.label,
    })
}
