//! Server-side session store with a signed cookie handle.
//!
//! The cookie value is `token.signature`: an opaque random token plus its
//! HMAC-SHA256 under the process-wide secret. Session state (the
//! authenticated user and the one-slot flash) lives only in this map; a
//! tampered or unknown cookie is simply "no session", and rotating the
//! secret invalidates every outstanding session.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::collections::HashMap;
use tokio::sync::Mutex;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_BYTES: usize = 32;

/// The authenticated binding carried by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
}

/// One-shot notification carried across exactly one redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub message: String,
    pub category: String,
}

#[derive(Debug, Default)]
struct SessionData {
    user: Option<SessionUser>,
    flash: Option<Flash>,
}

pub struct SessionManager {
    key: SecretString,
    sessions: Mutex<HashMap<String, SessionData>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self {
            key: secret,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Bind a fresh session to the user and return its cookie value. Any
    /// prior session presented by the requester is dropped, not merged.
    pub async fn start(&self, prior_cookie: Option<&str>, user_id: i64, username: &str) -> String {
        let mut sessions = self.sessions.lock().await;
        if let Some(token) = prior_cookie.and_then(|cookie| self.verify(cookie)) {
            sessions.remove(&token);
        }
        let token = issue_token();
        sessions.insert(
            token.clone(),
            SessionData {
                user: Some(SessionUser {
                    user_id,
                    username: username.to_string(),
                }),
                flash: None,
            },
        );
        let signature = self.sign(&token);
        drop(sessions);
        format!("{token}.{signature}")
    }

    /// Resolve a cookie to its authenticated user, if any. Absent cookies,
    /// bad signatures, and unknown tokens are all `None`.
    pub async fn current(&self, cookie: Option<&str>) -> Option<SessionUser> {
        let token = self.verify(cookie?)?;
        self.sessions
            .lock()
            .await
            .get(&token)
            .and_then(|data| data.user.clone())
    }

    /// Drop every trace of the requester's session. Idempotent.
    pub async fn end(&self, cookie: Option<&str>) {
        if let Some(token) = cookie.and_then(|value| self.verify(value)) {
            self.sessions.lock().await.remove(&token);
        }
    }

    /// Set the one-slot flash, overwriting any unread one. When the
    /// requester has no session yet, an anonymous one is created and its
    /// cookie value returned so the caller can attach it to the response.
    pub async fn set_flash(
        &self,
        cookie: Option<&str>,
        message: &str,
        category: &str,
    ) -> Option<String> {
        let flash = Flash {
            message: message.to_string(),
            category: category.to_string(),
        };
        let mut sessions = self.sessions.lock().await;
        if let Some(token) = cookie.and_then(|value| self.verify(value)) {
            if let Some(data) = sessions.get_mut(&token) {
                data.flash = Some(flash);
                return None;
            }
        }
        let token = issue_token();
        sessions.insert(
            token.clone(),
            SessionData {
                user: None,
                flash: Some(flash),
            },
        );
        let signature = self.sign(&token);
        drop(sessions);
        Some(format!("{token}.{signature}"))
    }

    /// Read and clear the flash; the next pop returns `None`.
    pub async fn pop_flash(&self, cookie: Option<&str>) -> Option<Flash> {
        let token = self.verify(cookie?)?;
        self.sessions
            .lock()
            .await
            .get_mut(&token)
            .and_then(|data| data.flash.take())
    }

    /// Update the displayed username on the live session after a rename.
    pub async fn rename(&self, cookie: Option<&str>, username: &str) {
        if let Some(token) = cookie.and_then(|value| self.verify(value)) {
            if let Some(user) = self
                .sessions
                .lock()
                .await
                .get_mut(&token)
                .and_then(|data| data.user.as_mut())
            {
                user.username = username.to_string();
            }
        }
    }

    fn sign(&self, token: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(token.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    fn verify(&self, cookie: &str) -> Option<String> {
        let (token, signature) = cookie.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(token.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(token.to_string())
    }
}

fn issue_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new(SecretString::from("test-secret".to_string()))
    }

    #[tokio::test]
    async fn start_then_current_returns_the_binding() {
        let sessions = manager();
        let cookie = sessions.start(None, 7, "alice").await;
        let user = sessions.current(Some(&cookie)).await.expect("session");
        assert_eq!(user.user_id, 7);
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn end_clears_all_session_state() {
        let sessions = manager();
        let cookie = sessions.start(None, 7, "alice").await;
        sessions.end(Some(&cookie)).await;
        assert_eq!(sessions.current(Some(&cookie)).await, None);
    }

    #[tokio::test]
    async fn tampered_cookies_resolve_to_no_session() {
        let sessions = manager();
        let cookie = sessions.start(None, 7, "alice").await;
        let mut forged = cookie.clone();
        forged.replace_range(0..1, if cookie.starts_with('A') { "B" } else { "A" });
        assert_eq!(sessions.current(Some(&forged)).await, None);
        assert_eq!(sessions.current(Some("no-signature")).await, None);
        assert_eq!(sessions.current(None).await, None);
    }

    #[tokio::test]
    async fn a_new_key_invalidates_old_cookies() {
        let sessions = manager();
        let cookie = sessions.start(None, 7, "alice").await;
        let rotated = SessionManager::new(SecretString::from("other-secret".to_string()));
        assert_eq!(rotated.current(Some(&cookie)).await, None);
    }

    #[tokio::test]
    async fn starting_again_overwrites_the_prior_session() {
        let sessions = manager();
        let first = sessions.start(None, 7, "alice").await;
        let second = sessions.start(Some(&first), 8, "bob").await;
        assert_eq!(sessions.current(Some(&first)).await, None);
        let user = sessions.current(Some(&second)).await.expect("session");
        assert_eq!(user.user_id, 8);
    }

    #[tokio::test]
    async fn flash_is_single_use() {
        let sessions = manager();
        let cookie = sessions.start(None, 7, "alice").await;
        assert!(
            sessions
                .set_flash(Some(&cookie), "saved", "success")
                .await
                .is_none()
        );
        let flash = sessions.pop_flash(Some(&cookie)).await.expect("flash");
        assert_eq!(flash.message, "saved");
        assert_eq!(flash.category, "success");
        assert_eq!(sessions.pop_flash(Some(&cookie)).await, None);
    }

    #[tokio::test]
    async fn a_second_flash_overwrites_the_first() {
        let sessions = manager();
        let cookie = sessions.start(None, 7, "alice").await;
        sessions.set_flash(Some(&cookie), "first", "info").await;
        sessions.set_flash(Some(&cookie), "second", "error").await;
        let flash = sessions.pop_flash(Some(&cookie)).await.expect("flash");
        assert_eq!(flash.message, "second");
    }

    #[tokio::test]
    async fn flash_without_a_session_creates_an_anonymous_one() {
        let sessions = manager();
        let cookie = sessions
            .set_flash(None, "bad credentials", "error")
            .await
            .expect("anonymous session cookie");
        assert_eq!(sessions.current(Some(&cookie)).await, None);
        let flash = sessions.pop_flash(Some(&cookie)).await.expect("flash");
        assert_eq!(flash.message, "bad credentials");
    }

    #[tokio::test]
    async fn rename_updates_the_live_session() {
        let sessions = manager();
        let cookie = sessions.start(None, 7, "alice").await;
        sessions.rename(Some(&cookie), "alice2").await;
        let user = sessions.current(Some(&cookie)).await.expect("session");
        assert_eq!(user.username, "alice2");
    }
}
