#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod config;
pub mod error;
pub mod game_service;
pub mod player_service;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::{CatalogService, CategoryView, QuestionView, TrophyView};
pub use config::GameSettings;
pub use error::{AppServicesError, CatalogError, GameError, PlayerServiceError, SettingsError};
pub use game_service::{GameService, SessionOutcome, SessionView, SubmittedAttempt};
pub use player_service::PlayerService;
