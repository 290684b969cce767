use std::sync::Arc;

use crate::{config::Config, store::CatalogStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CatalogStore>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = CatalogStore::new(&config.database.url).await?;
        store.init().await?;

        Ok(Self {
            store: Arc::new(store),
            config,
        })
    }
}
