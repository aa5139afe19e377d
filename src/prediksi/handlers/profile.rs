//! Account page and self-service credential/username updates.

use axum::{
    Form,
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::error;

use super::{extract_session_cookie, flash_redirect, pages};
use crate::clock;
use crate::error::Error;
use crate::prediksi::service;
use crate::session::SessionManager;
use crate::store::users;

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UsernameForm {
    pub username: String,
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

    let account = match users::find_by_id(&pool, user.user_id).await {
        Ok(Some(account)) => account,
        // A session pointing at a deleted row is just "not logged in".
        Ok(None) => return Redirect::to("/login").into_response(),
        Err(err) => {
            error!("failed to load profile: {err}");
            let set = sessions
                .set_flash(cookie.as_deref(), &err.flash_message(), "error")
                .await;
            return flash_redirect(set, "/prediksi");
        }
    };

    let mut view = account;
    view.created_at = clock::format_wib(&view.created_at);
    view.updated_at = clock::format_wib(&view.updated_at);

    let history = match service::history(&pool, user.user_id).await {
        Ok(history) => history,
        Err(err) => {
            error!("failed to load history: {err}");
            Vec::new()
        }
    };

    pages::profile(&user, &view, flash.as_ref(), &history).into_response()
}

pub async fn update_password(
    headers: HeaderMap,
    Extension(pool): Extension<SqlitePool>,
    Extension(sessions): Extension<Arc<SessionManager>>,
    Form(form): Form<PasswordForm>,
) -> Response {
    let cookie = extract_session_cookie(&headers);
    let Some(user) = sessions.current(cookie.as_deref()).await else {
        return Redirect::to("/login").into_response();
    };

    let (message, category) = match service::change_password(&pool, user.user_id, &form.password)
        .await
    {
        Ok(()) => ("Password updated.".to_string(), "success"),
        Err(err) => {
            if let Error::Store(source) = &err {
                error!("failed to update password: {source}");
            }
            (err.flash_message(), "error")
        }
    };
    let set = sessions.set_flash(cookie.as_deref(), &message, category).await;
    flash_redirect(set, "/users")
}

pub async fn update_username(
    headers: HeaderMap,
    Extension(pool): Extension<SqlitePool>,
    Extension(sessions): Extension<Arc<SessionManager>>,
    Form(form): Form<UsernameForm>,
) -> Response {
    let cookie = extract_session_cookie(&headers);
    let Some(user) = sessions.current(cookie.as_deref()).await else {
        return Redirect::to("/login").into_response();
    };

    let current = match users::find_by_id(&pool, user.user_id).await {
        Ok(Some(current)) => current,
        Ok(None) => return Redirect::to("/login").into_response(),
        Err(err) => {
            error!("failed to load account for rename: {err}");
            let set = sessions
                .set_flash(cookie.as_deref(), &err.flash_message(), "error")
                .await;
            return flash_redirect(set, "/users");
        }
    };

    let (message, category) = match service::change_username(&pool, &current, &form.username).await
    {
        Ok(stored) => {
            // Keep the displayed name on the live session in step.
            sessions.rename(cookie.as_deref(), &stored).await;
            ("Username updated.".to_string(), "success")
        }
        Err(err) => {
            if let Error::Store(source) = &err {
                error!("failed to update username: {source}");
            }
            (err.flash_message(), "error")
        }
    };
    let set = sessions.set_flash(cookie.as_deref(), &message, category).await;
    flash_redirect(set, "/users")
}
