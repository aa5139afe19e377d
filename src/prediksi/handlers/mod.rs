//! HTTP handlers and the session-cookie plumbing they share.

pub mod auth;
pub mod health;
pub mod pages;
pub mod predict;
pub mod profile;

use axum::{
    extract::Extension,
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
    },
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::session::SessionManager;

pub(crate) const SESSION_COOKIE_NAME: &str = "prediksi_session";

/// Landing page: authenticated users go to the prediction page, everyone
/// else to login.
pub async fn root(
    headers: HeaderMap,
    Extension(sessions): Extension<Arc<SessionManager>>,
) -> Redirect {
    let cookie = extract_session_cookie(&headers);
    if sessions.current(cookie.as_deref()).await.is_some() {
        Redirect::to("/prediksi")
    } else {
        Redirect::to("/login")
    }
}

pub(crate) fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

pub(crate) fn session_cookie(value: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE_NAME}={value}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}

pub(crate) fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("prediksi_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Redirect, attaching a freshly issued session cookie when one was created
/// to carry the flash.
pub(crate) fn flash_redirect(set_cookie: Option<String>, to: &str) -> Response {
    let mut headers = HeaderMap::new();
    if let Some(value) = set_cookie.as_deref().and_then(session_cookie) {
        headers.insert(SET_COOKIE, value);
    }
    (headers, Redirect::to(to)).into_response()
}
