use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::{AuthService, SessionCodec};
use crate::blog::BlogService;
use crate::cdn::ImageHost;
use crate::config::Config;
use crate::db::{self, SqliteContentStore, SqliteCredentialStore};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
    pub blog: BlogService,
    pub images: Arc<dyn ImageHost>,
    pub sessions: SessionCodec,
}

/// Connection pools for the two backing stores. Opened once at start-up and
/// closed after the server has drained.
pub struct Stores {
    pub content: DbPool,
    pub credentials: DbPool,
}

impl Stores {
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            content: db::open_store(&config.content_db_path(), db::CONTENT_MIGRATIONS)?,
            credentials: db::open_store(
                &config.credentials_db_path(),
                db::CREDENTIAL_MIGRATIONS,
            )?,
        })
    }

    /// Flush WAL files back into the databases and drop the pools.
    pub fn close(self) {
        for (name, pool) in [("content", &self.content), ("credentials", &self.credentials)] {
            match pool.get() {
                Ok(conn) => {
                    if let Err(e) = conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);") {
                        tracing::warn!("Checkpoint of {} store failed: {}", name, e);
                    }
                }
                Err(e) => tracing::warn!("Could not reach {} store on close: {}", name, e),
            }
        }
        tracing::info!("Stores closed");
    }
}

impl AppState {
    pub fn new(
        config: Config,
        stores: &Stores,
        images: Arc<dyn ImageHost>,
    ) -> anyhow::Result<Self> {
        let sessions = SessionCodec::from_config(&config.session);
        Ok(Self {
            auth: AuthService::new(Arc::new(SqliteCredentialStore::new(
                stores.credentials.clone(),
            ))),
            blog: BlogService::new(Arc::new(SqliteContentStore::new(stores.content.clone()))),
            images,
            sessions,
            config,
        })
    }
}
