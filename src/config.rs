use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::BLOTATO_API_URL;
use crate::media::UploadMode;
use crate::models::{AccountsFormat, Platform, SocialAccountDefaults};

#[derive(Parser, Debug, Clone)]
#[command(name = "blotato-bridge")]
#[command(author = "Dabe Vlohn")]
#[command(version = "0.1.0")]
#[command(about = "Publish posts and media through the Blotato API")]
pub struct Config {
    /// Ключ API Blotato
    /// env: BLOTATO_API_KEY
    #[arg(long, env = "BLOTATO_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Базовый URL API
    /// env: BLOTATO_BASE_URL
    #[arg(long, env = "BLOTATO_BASE_URL", default_value = BLOTATO_API_URL)]
    pub base_url: String,

    /// Не прерывать батч при ошибке элемента, а записывать ошибку в его результат
    #[arg(long, env = "BLOTATO_CONTINUE_ON_FAIL")]
    pub continue_on_fail: bool,

    /// Как загружать бинарные вложения: json (data URI) или multipart
    #[arg(long, env = "BLOTATO_UPLOAD_MODE", value_enum, default_value = "json")]
    pub upload_mode: UploadMode,

    /// Поле optimize для multipart-загрузки
    #[arg(long, env = "BLOTATO_OPTIMIZE")]
    pub optimize: Option<bool>,

    /// Аккаунты по умолчанию
    #[command(flatten)]
    pub accounts: SocialAccountDefaults,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Опубликовать посты из батча (JSON-массив элементов)
    Post {
        /// Файл с батчем; без него читается stdin
        #[arg(long, short)]
        input: Option<PathBuf>,
    },

    /// Загрузить медиа из батча
    Upload {
        #[arg(long, short)]
        input: Option<PathBuf>,
    },

    /// Вывести идентификаторы аккаунтов по умолчанию
    SocialAccounts {
        /// Выводить и пустые идентификаторы
        #[arg(long)]
        keep_empty: bool,

        #[arg(long, value_enum, default_value = "nested")]
        format: AccountsFormat,
    },

    /// Запросить подключённые аккаунты у бэкенда
    Accounts {
        #[arg(long, conflicts_with = "id")]
        platform: Option<Platform>,

        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        include_analytics: bool,

        #[arg(long)]
        include_recent_posts: bool,
    },
}

impl Config {
    /// Валидирует конфигурацию при запуске
    pub fn validate(&self) -> crate::error::AppResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "API key is empty. Provide --api-key or BLOTATO_API_KEY".to_string(),
            ));
        }

        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(crate::error::AppError::Config(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }

        if self.optimize.is_some() && self.upload_mode != UploadMode::Multipart {
            return Err(crate::error::AppError::Config(
                "--optimize only applies to --upload-mode multipart".to_string(),
            ));
        }

        Ok(())
    }
}
