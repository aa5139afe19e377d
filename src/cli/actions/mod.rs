pub mod server;

use secrecy::SecretString;
use std::path::PathBuf;

/// What the CLI resolved to run.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        db: PathBuf,
        session_secret: SecretString,
        admin_password: SecretString,
    },
}
