// params.rs - параметры элементов батча в том виде, в каком их отдаёт хост

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::models::{Platform, ReplyControl, TikTokPrivacyLevel, YoutubePrivacyStatus};

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Бинарное вложение элемента (данные хоста в base64)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryData {
    #[serde(default, deserialize_with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    /// Исходный URL, если вложение было скачано предыдущим шагом
    #[serde(default)]
    pub url: Option<String>,
}

impl BinaryData {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        BinaryData {
            data,
            mime_type: Some(mime_type.into()),
            file_name: None,
            url: None,
        }
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
    }
}

/// Элемент батча: JSON-параметры плюс именованные вложения
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputItem {
    #[serde(default)]
    pub json: Value,
    #[serde(default)]
    pub binary: HashMap<String, BinaryData>,
}

impl InputItem {
    pub fn new(json: Value) -> Self {
        InputItem {
            json,
            binary: HashMap::new(),
        }
    }

    pub fn with_binary(mut self, name: impl Into<String>, data: BinaryData) -> Self {
        self.binary.insert(name.into(), data);
        self
    }

    /// Принимает либо `{json, binary}`, либо голый объект параметров
    pub fn from_value(value: Value) -> AppResult<Self> {
        let wrapped = value
            .as_object()
            .map(|obj| obj.contains_key("json") || obj.contains_key("binary"))
            .unwrap_or(false);

        if wrapped {
            Ok(serde_json::from_value(value)?)
        } else {
            Ok(InputItem::new(value))
        }
    }

    /// Разбирает параметры элемента; ошибка разбора считается ошибкой валидации
    pub fn params<T: DeserializeOwned>(&self) -> AppResult<T> {
        let json = if self.json.is_null() {
            Value::Object(Default::default())
        } else {
            self.json.clone()
        };
        serde_json::from_value(json)
            .map_err(|e| AppError::ValidationError(format!("invalid parameters: {}", e)))
    }
}

/// Разбирает батч: JSON-массив элементов или один элемент
pub fn parse_batch(raw: &str) -> AppResult<Vec<InputItem>> {
    let value: Value = serde_json::from_str(raw)?;
    match value {
        Value::Array(values) => values.into_iter().map(InputItem::from_value).collect(),
        other => Ok(vec![InputItem::from_value(other)?]),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalPostParams {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub media_urls: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdditionalPostsParams {
    #[serde(default)]
    pub posts: Vec<AdditionalPostParams>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TikTokOptions {
    pub disabled_comments: Option<bool>,
    pub disabled_duet: Option<bool>,
    pub disabled_stitch: Option<bool>,
    pub is_branded_content: Option<bool>,
    pub is_your_brand: Option<bool>,
    pub is_ai_generated: Option<bool>,
}

/// Поля, которые имеют смысл только для конкретной платформы
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformFields {
    #[serde(default)]
    pub facebook_page_id: Option<String>,
    #[serde(default)]
    pub linkedin_page_id: Option<String>,
    #[serde(default)]
    pub pinterest_board_id: Option<String>,
    #[serde(default)]
    pub pinterest_title: Option<String>,
    #[serde(default)]
    pub pinterest_alt_text: Option<String>,
    #[serde(default)]
    pub pinterest_link: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub tiktok_privacy_level: Option<TikTokPrivacyLevel>,
    #[serde(default)]
    pub tiktok_options: TikTokOptions,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub threads_reply_control: Option<ReplyControl>,
    #[serde(default)]
    pub youtube_title: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub youtube_privacy_status: Option<YoutubePrivacyStatus>,
    #[serde(default)]
    pub youtube_notify_subscribers: Option<bool>,
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Параметры публикации поста
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostParams {
    pub platform: Platform,
    pub text: String,
    /// Уже загруженные на бэкенд медиа, через запятую
    #[serde(default)]
    pub media_urls: String,
    /// Внешние URL, которые нужно сначала загрузить через `/media`
    #[serde(default)]
    pub media_source_urls: String,
    /// Имена вложений, которые нужно загрузить через `/media`
    #[serde(default)]
    pub media_binary_properties: Vec<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub schedule_post: bool,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub create_thread: bool,
    #[serde(default)]
    pub additional_posts: AdditionalPostsParams,
    #[serde(flatten)]
    pub fields: PlatformFields,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UploadMethod {
    #[default]
    Url,
    BinaryData,
}

fn default_binary_property() -> String {
    "data".to_string()
}

fn default_output_field() -> String {
    "mediaUrl".to_string()
}

fn default_true() -> bool {
    true
}

/// Параметры загрузки медиа
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParams {
    #[serde(default)]
    pub upload_method: UploadMethod,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_binary_property")]
    pub binary_property_name: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default = "default_output_field")]
    pub output_field: String,
    #[serde(default = "default_true")]
    pub include_social_accounts: bool,
}

/// Пустая строка от хоста означает "не задано"
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(de::Error::custom),
    }
}

fn base64_bytes<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    BASE64.decode(encoded.trim()).map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_object_becomes_json_item() {
        let item = InputItem::from_value(json!({"platform": "twitter", "text": "hi"})).unwrap();
        assert_eq!(item.json["platform"], "twitter");
        assert!(item.binary.is_empty());
    }

    #[test]
    fn wrapped_item_decodes_binary() {
        let item = InputItem::from_value(json!({
            "json": {"uploadMethod": "binaryData"},
            "binary": {"data": {"data": "aGVsbG8=", "mimeType": "text/plain", "fileName": "a.txt"}}
        }))
        .unwrap();
        let binary = &item.binary["data"];
        assert_eq!(binary.data, b"hello");
        assert_eq!(binary.mime_type(), "text/plain");
        assert_eq!(binary.file_name.as_deref(), Some("a.txt"));
    }

    #[test]
    fn missing_mime_falls_back_to_octet_stream() {
        let binary = BinaryData {
            data: vec![1, 2],
            mime_type: Some(String::new()),
            file_name: None,
            url: None,
        };
        assert_eq!(binary.mime_type(), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn parse_batch_accepts_single_object() {
        let items = parse_batch(r#"{"platform": "bluesky", "text": "x"}"#).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn blank_enum_fields_are_unset() {
        let params: PostParams = InputItem::new(json!({
            "platform": "threads",
            "text": "hi",
            "threadsReplyControl": "",
            "tiktokPrivacyLevel": "SELF_ONLY"
        }))
        .params()
        .unwrap();
        assert_eq!(params.fields.threads_reply_control, None);
        assert_eq!(
            params.fields.tiktok_privacy_level,
            Some(TikTokPrivacyLevel::SelfOnly)
        );
    }

    #[test]
    fn unknown_enum_value_is_validation_error() {
        let result: AppResult<PostParams> = InputItem::new(json!({
            "platform": "youtube",
            "text": "hi",
            "youtubePrivacyStatus": "friends"
        }))
        .params();
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn missing_text_is_validation_error() {
        let result: AppResult<PostParams> =
            InputItem::new(json!({"platform": "twitter"})).params();
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn upload_params_defaults() {
        let params: UploadParams = InputItem::default().params().unwrap();
        assert_eq!(params.upload_method, UploadMethod::Url);
        assert_eq!(params.binary_property_name, "data");
        assert_eq!(params.output_field, "mediaUrl");
        assert!(params.include_social_accounts);
    }
}
