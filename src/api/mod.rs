pub mod accounts;
pub mod blotato;
pub mod mock;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::config::Config;
use crate::error::AppResult;

pub use blotato::BlotatoClient;
pub use mock::MockTransport;

pub const BLOTATO_API_URL: &str = "https://backend.blotato.com/v2";
pub const API_KEY_HEADER: &str = "blotato-api-key";

/// Файловая часть multipart-запроса
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Абстрактный транспорт к бэкенду Blotato.
/// Один вызов - один запрос, без повторов.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Отправляет JSON-запрос и возвращает разобранное тело ответа
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(String, String)],
    ) -> AppResult<Value>;

    /// Отправляет multipart-форму с текстовыми полями и одним файлом
    async fn send_multipart(
        &self,
        method: Method,
        path: &str,
        fields: &[(String, String)],
        file: FilePart,
    ) -> AppResult<Value>;
}

/// Фабрика для создания HTTP клиента на основе конфигурации
pub fn create_api_client(config: &Config) -> AppResult<Box<dyn Transport>> {
    Ok(Box::new(BlotatoClient::new(&config.api_key, &config.base_url)?))
}
