// media.rs - загрузка медиа на бэкенд (POST /media) по URL или из вложения

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use clap::ValueEnum;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::api::{FilePart, Transport};
use crate::error::{AppError, AppResult};
use crate::models::MediaUploadResult;
use crate::params::InputItem;

const MEDIA_PATH: &str = "/media";

/// Как отправлять бинарные данные
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum UploadMode {
    /// data URI в JSON `{url}`
    #[default]
    #[value(name = "json")]
    Json,
    /// multipart с полем `file`
    #[value(name = "multipart")]
    Multipart,
}

/// `data:<mime>;base64,<data>`
pub fn data_uri(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
}

pub struct MediaResolver<'a> {
    transport: &'a dyn Transport,
    mode: UploadMode,
    optimize: Option<bool>,
}

impl<'a> MediaResolver<'a> {
    pub fn new(transport: &'a dyn Transport, mode: UploadMode) -> Self {
        MediaResolver {
            transport,
            mode,
            optimize: None,
        }
    }

    /// Поле `optimize` для multipart-загрузки
    pub fn with_optimize(mut self, optimize: Option<bool>) -> Self {
        self.optimize = optimize;
        self
    }

    /// Загружает медиа по внешнему URL или data URI
    pub async fn resolve_from_url(&self, source_url: &str) -> AppResult<MediaUploadResult> {
        let source_url = source_url.trim();
        if source_url.is_empty() {
            return Err(AppError::ValidationError("media URL is empty".to_string()));
        }

        // data URI может быть огромным, в лог пишем только начало
        debug!(
            "Uploading media from URL: {}",
            source_url.chars().take(64).collect::<String>()
        );

        let body = json!({ "url": source_url });
        let response = self
            .transport
            .send(Method::POST, MEDIA_PATH, Some(&body), &[])
            .await?;

        Self::parse_upload(response)
    }

    /// Загружает байты: multipart или data URI, в зависимости от режима
    pub async fn resolve_from_binary(
        &self,
        bytes: &[u8],
        mime_type: &str,
        file_name: Option<&str>,
    ) -> AppResult<MediaUploadResult> {
        debug!(
            "Uploading {} bytes of {} ({:?}) via {:?}",
            bytes.len(),
            mime_type,
            file_name,
            self.mode
        );

        match self.mode {
            UploadMode::Json => self.resolve_from_url(&data_uri(bytes, mime_type)).await,
            UploadMode::Multipart => {
                let mut fields = Vec::new();
                if let Some(optimize) = self.optimize {
                    fields.push(("optimize".to_string(), optimize.to_string()));
                }

                let file = FilePart {
                    field: "file".to_string(),
                    file_name: file_name.unwrap_or("upload").to_string(),
                    mime_type: mime_type.to_string(),
                    data: bytes.to_vec(),
                };

                let response = self
                    .transport
                    .send_multipart(Method::POST, MEDIA_PATH, &fields, file)
                    .await?;
                Self::parse_upload(response)
            }
        }
    }

    /// Загружает именованное вложение элемента. Если у вложения есть исходный URL,
    /// отправляем его вместо байтов.
    pub async fn resolve_attachment(
        &self,
        item: &InputItem,
        property: &str,
        file_name: Option<&str>,
    ) -> AppResult<MediaUploadResult> {
        let binary = item
            .binary
            .get(property)
            .ok_or_else(|| AppError::MissingBinaryData(property.to_string()))?;

        if let Some(url) = binary.url.as_deref().filter(|u| !u.trim().is_empty()) {
            debug!("Attachment {} has source URL, uploading by URL", property);
            return self.resolve_from_url(url).await;
        }

        if binary.data.is_empty() {
            return Err(AppError::MissingBinaryData(property.to_string()));
        }

        let file_name = file_name
            .filter(|n| !n.trim().is_empty())
            .or(binary.file_name.as_deref());
        self.resolve_from_binary(&binary.data, binary.mime_type(), file_name)
            .await
    }

    fn parse_upload(response: Value) -> AppResult<MediaUploadResult> {
        let has_url = response
            .get("url")
            .and_then(Value::as_str)
            .map(|u| !u.is_empty())
            .unwrap_or(false);
        if !has_url {
            return Err(AppError::ApiError("No media URL in response".to_string()));
        }

        let result: MediaUploadResult = serde_json::from_value(response)?;
        info!("Successfully uploaded media: {}", result.url);
        Ok(result)
    }
}
