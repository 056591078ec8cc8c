// account.rs - явный идентификатор или значение по умолчанию из учётных данных

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{Platform, SocialAccountDefaults};

/// Общий помощник для account/page/board id.
///
/// Непустой `explicit` всегда выигрывает и возвращается как есть, затем `defaults[key]`.
/// Если ничего нет: при `required` ошибка, иначе `None` (поле не выводится).
pub fn resolve_identifier(
    platform: Platform,
    key: &'static str,
    explicit: Option<&str>,
    defaults: &SocialAccountDefaults,
    required: bool,
) -> AppResult<Option<String>> {
    if let Some(id) = explicit.filter(|id| !id.trim().is_empty()) {
        return Ok(Some(id.to_string()));
    }

    if let Some(id) = defaults.get(key) {
        debug!("Using default {} for {}", key, platform);
        return Ok(Some(id.to_string()));
    }

    if required {
        return Err(AppError::MissingAccountIdentifier { platform, key });
    }
    Ok(None)
}

/// Аккаунт публикации (`<platform>_id`)
pub fn resolve(
    platform: Platform,
    explicit: Option<&str>,
    defaults: &SocialAccountDefaults,
    required: bool,
) -> AppResult<Option<String>> {
    match platform.account_key() {
        Some(key) => resolve_identifier(platform, key, explicit, defaults, required),
        // у webhook нет ключа по умолчанию
        None => Ok(explicit
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)),
    }
}

/// Аккаунт для поста: обязателен везде кроме webhook
pub fn resolve_account(
    platform: Platform,
    explicit: Option<&str>,
    defaults: &SocialAccountDefaults,
) -> AppResult<Option<String>> {
    resolve(platform, explicit, defaults, platform.requires_account())
}
