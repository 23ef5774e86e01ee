use std::sync::Arc;

use modbot_core::{
    config::Config,
    store::{ConfigStore, JsonFileBackend},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    modbot_core::logging::init("modbot")?;

    let cfg = match Config::load() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            tracing::error!("{e}");
            return Err(e.into());
        }
    };

    let backend = Arc::new(JsonFileBackend::new(&cfg.config_path));
    tracing::info!("using config document {}", backend.path().display());
    let store = Arc::new(ConfigStore::open(backend).await);

    modbot_discord::router::run_gateway(cfg, store)
        .await
        .map_err(|e| anyhow::anyhow!("discord bot failed: {e}"))
}
