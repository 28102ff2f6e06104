mod catalog;
mod command_line;
mod config;
mod logging;
mod utils;


use anyhow::Result;
use tracing::info;

use crate::catalog::Session;
use crate::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging()?;
    dotenv::dotenv().ok();

    let settings = Settings::from_env()?;
    let mut session = Session::new(settings.loader.clone());

    if let Some(bundle) = &settings.bundle {
        session
            .connect(
                bundle,
                settings.credentials.username(),
                settings.credentials.password(),
                &settings.keyspace,
            )
            .await?;
        session.create_tables().await?;
        session.initialize().await?;
    } else {
        info!("CATALOG_BUNDLE is not set; use `connect` to open a session");
    }

    command_line::run(&mut session, &settings).await?;

    if session.is_connected() {
        session.close().await?;
    }
    Ok(())
}
