use crate::cli::actions::Action;
use anyhow::Result;
use secrecy::SecretString;
use std::path::PathBuf;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        db: matches
            .get_one::<String>("db")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --db"))?,
        session_secret: matches
            .get_one::<String>("session-secret")
            .cloned()
            .map(SecretString::from)
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --session-secret"))?,
        admin_password: matches
            .get_one::<String>("admin-password")
            .cloned()
            .map(SecretString::from)
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --admin-password"))?,
    })
}
