//! # Prediksi
//!
//! Session-authenticated iris classification service. Registered users
//! submit four measurements, get a class label from a pre-trained model,
//! and keep a per-user prediction history in a local SQLite store.
//!
//! ## Authentication & sessions
//!
//! Credentials are PBKDF2-HMAC-SHA256 (`salt$digest` stored form). Sessions
//! live server-side, keyed by an opaque cookie whose value is signed with
//! HMAC-SHA256; a tampered cookie is treated as no session at all.
//!
//! ## Roles
//!
//! Exactly one `admin` account exists from process start. Its username is
//! pinned, and the reserved name can never be registered or adopted by a
//! regular user.

pub mod classifier;
pub mod cli;
pub mod clock;
pub mod error;
pub mod password;
pub mod policy;
pub mod prediksi;
pub mod session;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
