use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::config::GameSettings;
use crate::error::AppServicesError;
use crate::game_service::GameService;
use crate::player_service::PlayerService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    game: Arc<GameService>,
    players: Arc<PlayerService>,
    catalog: Arc<CatalogService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: GameSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        tracing::debug!(
            session_seconds = settings.session_seconds(),
            auto_complete = settings.auto_complete(),
            "app services ready"
        );
        Ok(Self::from_storage(&storage, clock, settings))
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, settings: GameSettings) -> Self {
        let game = Arc::new(GameService::new(
            clock,
            settings,
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.players),
        ));
        let players = Arc::new(PlayerService::new(clock, Arc::clone(&storage.players)));
        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.trophies),
        ));
        Self {
            game,
            players,
            catalog,
        }
    }

    #[must_use]
    pub fn game(&self) -> Arc<GameService> {
        Arc::clone(&self.game)
    }

    #[must_use]
    pub fn players(&self) -> Arc<PlayerService> {
        Arc::clone(&self.players)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }
}
