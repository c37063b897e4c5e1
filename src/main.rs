use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use forumd::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("forumd=info,tower_http=info")),
        )
        .try_init()
        .map_err(|err| anyhow!(err))?;

    let config = Config::from_env()?;

    forumd::run(config).await
}
