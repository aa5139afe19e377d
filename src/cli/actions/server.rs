use crate::cli::actions::Action;
use crate::prediksi::{self, ServerConfig};
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            db,
            session_secret,
            admin_password,
        } => {
            prediksi::new(ServerConfig {
                port,
                db,
                session_secret,
                admin_password,
            })
            .await?;
        }
    }

    Ok(())
}
