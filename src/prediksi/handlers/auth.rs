//! Login, registration, and logout.

use axum::{
    Form,
    extract::Extension,
    http::{HeaderMap, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::error;

use super::{clear_session_cookie, extract_session_cookie, flash_redirect, pages};
use crate::error::Error;
use crate::prediksi::service;
use crate::session::SessionManager;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
}

pub async fn login_page(
    headers: HeaderMap,
    Extension(sessions): Extension<Arc<SessionManager>>,
) -> Response {
    let cookie = extract_session_cookie(&headers);
    if sessions.current(cookie.as_deref()).await.is_some() {
        return Redirect::to("/prediksi").into_response();
    }
    let flash = sessions.pop_flash(cookie.as_deref()).await;
    pages::login(flash.as_ref()).into_response()
}

pub async fn login(
    headers: HeaderMap,
    Extension(pool): Extension<SqlitePool>,
    Extension(sessions): Extension<Arc<SessionManager>>,
    Form(form): Form<LoginForm>,
) -> Response {
    let cookie = extract_session_cookie(&headers);
    match service::login(&pool, &form.username, &form.password).await {
        Ok(user) => {
            let value = sessions.start(cookie.as_deref(), user.id, &user.username).await;
            flash_redirect(Some(value), "/prediksi")
        }
        Err(err) => {
            if let Error::Store(source) = &err {
                error!("login failed: {source}");
            }
            let set = sessions
                .set_flash(cookie.as_deref(), &err.flash_message(), "error")
                .await;
            flash_redirect(set, "/login")
        }
    }
}

pub async fn register_page(
    headers: HeaderMap,
    Extension(sessions): Extension<Arc<SessionManager>>,
) -> Response {
    let cookie = extract_session_cookie(&headers);
    if sessions.current(cookie.as_deref()).await.is_some() {
        return Redirect::to("/prediksi").into_response();
    }
    let flash = sessions.pop_flash(cookie.as_deref()).await;
    pages::register(flash.as_ref()).into_response()
}

pub async fn register(
    headers: HeaderMap,
    Extension(pool): Extension<SqlitePool>,
    Extension(sessions): Extension<Arc<SessionManager>>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let cookie = extract_session_cookie(&headers);
    if sessions.current(cookie.as_deref()).await.is_some() {
        return Redirect::to("/prediksi").into_response();
    }
    match service::register(&pool, &form.username, &form.password, &form.password_confirm).await {
        Ok(user) => {
            // A fresh account goes straight to an authenticated session.
            let value = sessions.start(cookie.as_deref(), user.id, &user.username).await;
            flash_redirect(Some(value), "/prediksi")
        }
        Err(err) => {
            if let Error::Store(source) = &err {
                error!("registration failed: {source}");
            }
            let set = sessions
                .set_flash(cookie.as_deref(), &err.flash_message(), "error")
                .await;
            flash_redirect(set, "/register")
        }
    }
}

pub async fn logout(
    headers: HeaderMap,
    Extension(sessions): Extension<Arc<SessionManager>>,
) -> Response {
    let cookie = extract_session_cookie(&headers);
    sessions.end(cookie.as_deref()).await;

    // Always clear the cookie, even without a live session behind it.
    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, clear_session_cookie());
    (response_headers, Redirect::to("/login")).into_response()
}
