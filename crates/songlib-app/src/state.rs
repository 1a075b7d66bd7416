use std::sync::Arc;

use songlib_dal::{song::SongRepository, PagingDefaults, Pool};

use crate::{catalog::SongCatalog, music_info::MusicInfoClient};

pub type Catalog = SongCatalog<MusicInfoClient, SongRepository>;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool, music_info: MusicInfoClient) -> Self {
        let repository = SongRepository::new(pool).with_paging_defaults(app_config.paging);
        let catalog = SongCatalog::new(music_info, repository, app_config.paging);
        AppState {
            state: Arc::new(AppStateInner {
                catalog,
                app_config,
            }),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.state.catalog
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }
}

struct AppStateInner {
    catalog: Catalog,
    app_config: AppConfig,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub paging: PagingDefaults,
}
