use std::sync::Arc;

use craftstats_core::cache::TtlCache;
use craftstats_core::catalog::CatalogService;
use craftstats_core::rcon::RconClient;
use craftstats_core::save::SaveData;

use crate::config::ServerConfig;

/// Shared application state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub cache: Arc<TtlCache>,
    pub rcon: Arc<RconClient>,
    pub save: Arc<SaveData>,
    pub catalog: Arc<CatalogService>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        rcon: RconClient,
        save: SaveData,
        catalog: CatalogService,
    ) -> Self {
        Self {
            config: Arc::new(config),
            cache: Arc::new(TtlCache::new()),
            rcon: Arc::new(rcon),
            save: Arc::new(save),
            catalog: Arc::new(catalog),
        }
    }
}
