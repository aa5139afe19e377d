//! Password credential derivation and verification.
//!
//! Stored form is `salt$digest`: a random hex salt and the hex PBKDF2 digest
//! derived under it. Verification re-derives with the embedded salt and
//! compares in constant time.

use pbkdf2::pbkdf2_hmac;
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;
use subtle::ConstantTimeEq;

const PBKDF2_ROUNDS: u32 = 120_000;
const SALT_BYTES: usize = 16;
const DIGEST_BYTES: usize = 32;

/// Derive the stored form for a password under a fresh random salt.
#[must_use]
pub fn hash(password: &str) -> String {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    hash_with_salt(password, &hex::encode(salt))
}

/// Derive the stored form under a caller-supplied salt.
#[must_use]
pub fn hash_with_salt(password: &str, salt: &str) -> String {
    format!("{salt}${}", hex::encode(derive(password, salt)))
}

/// Check a password against a stored form.
///
/// A malformed stored form (missing separator, bad hex) is `false`, never an
/// error.
#[must_use]
pub fn verify(password: &str, stored: &str) -> bool {
    let Some((salt, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(expected) = hex::decode(digest_hex) else {
        return false;
    };
    derive(password, salt).ct_eq(expected.as_slice()).into()
}

fn derive(password: &str, salt: &str) -> [u8; DIGEST_BYTES] {
    let mut digest = [0u8; DIGEST_BYTES];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ROUNDS,
        &mut digest,
    );
    digest
}
