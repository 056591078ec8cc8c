//! Адаптер между хостом автоматизации и API публикации Blotato.
//!
//! Собирает тела запросов под каждую платформу, загружает медиа
//! и переводит ответы/ошибки бэкенда в записи по каждому элементу батча.

pub mod account;
pub mod api;
pub mod config;
pub mod error;
pub mod media;
pub mod models;
pub mod orchestrator;
pub mod params;
pub mod payload;

pub use error::{AppError, AppResult};
pub use models::{Platform, PostEnvelope, SocialAccountDefaults, Target};
