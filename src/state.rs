use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::local::LocalIdentity;
use crate::auth::IdentityProvider;
use crate::beers::sqlite::SqliteBeerRepository;
use crate::beers::BeerRepository;
use crate::config::{BackendKind, Config};
use crate::storage::local::LocalImageStore;
use crate::storage::ImageStore;
use crate::supabase::SupabaseClient;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub identity: Arc<dyn IdentityProvider>,
    pub beers: Arc<dyn BeerRepository>,
    pub images: Arc<dyn ImageStore>,
}

impl AppState {
    /// Wires the SQLite-backed identity and beer store plus on-disk images.
    pub fn local(config: Config, pool: DbPool) -> Self {
        let images = LocalImageStore::new(
            config.uploads_path(),
            format!("{}/uploads", config.public_url()),
        );
        Self {
            identity: Arc::new(LocalIdentity::new(pool.clone(), config.auth.session_hours)),
            beers: Arc::new(SqliteBeerRepository::new(pool)),
            images: Arc::new(images),
            config,
        }
    }

    /// Wires every capability to the hosted Supabase project.
    pub fn supabase(config: Config, client: SupabaseClient) -> Self {
        Self {
            identity: Arc::new(client.clone()),
            beers: Arc::new(client.clone()),
            images: Arc::new(client),
            config,
        }
    }

    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        match config.backend.kind {
            BackendKind::Local => {
                std::fs::create_dir_all(config.uploads_path())?;
                let pool = crate::db::create_pool(&config.db_path())?;
                crate::db::run_migrations(&pool)?;
                Ok(Self::local(config, pool))
            }
            BackendKind::Supabase => {
                let client = SupabaseClient::new(&config.supabase)?;
                Ok(Self::supabase(config, client))
            }
        }
    }
}
