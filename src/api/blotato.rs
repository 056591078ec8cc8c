use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, error};

use super::{FilePart, Transport, API_KEY_HEADER};
use crate::error::{AppError, AppResult};

const USER_AGENT: &str = "blotato-bridge/0.1";

pub struct BlotatoClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl BlotatoClient {
    /// Таймаут не задаём: полагаемся на значения reqwest по умолчанию
    pub fn new(api_key: &str, base_url: &str) -> AppResult<Self> {
        let http_client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(BlotatoClient {
            http_client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str, query: &[(String, String)]) -> RequestBuilder {
        let mut request = self
            .http_client
            .request(method, self.endpoint(path))
            .header(API_KEY_HEADER, &self.api_key);

        if !query.is_empty() {
            request = request.query(query);
        }
        request
    }

    async fn execute(&self, request: RequestBuilder, path: &str) -> AppResult<Value> {
        let response = request.send().await.map_err(|e| {
            error!("Request to {} failed: {}", path, e);
            AppError::Network(e)
        })?;

        Self::read_response(response, path).await
    }

    async fn read_response(response: Response, path: &str) -> AppResult<Value> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Blotato API returned status {} for {}", status, path);
            return Err(classify_failure(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse response from {}: {}", path, e);
            AppError::Json(e)
        })
    }
}

#[async_trait]
impl Transport for BlotatoClient {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(String, String)],
    ) -> AppResult<Value> {
        debug!("{} {} (query: {:?})", method, path, query);

        let mut request = self.request(method, path, query);
        if let Some(body) = body {
            request = request.json(body);
        }

        self.execute(request, path).await
    }

    async fn send_multipart(
        &self,
        method: Method,
        path: &str,
        fields: &[(String, String)],
        file: FilePart,
    ) -> AppResult<Value> {
        debug!(
            "{} {} multipart: {} ({}, {} bytes)",
            method,
            path,
            file.file_name,
            file.mime_type,
            file.data.len()
        );

        let part = reqwest::multipart::Part::bytes(file.data)
            .file_name(file.file_name)
            .mime_str(&file.mime_type)
            .map_err(|e| AppError::ValidationError(format!("Invalid MIME type: {}", e)))?;

        let form = fields
            .iter()
            .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            })
            .part(file.field, part);

        let request = self.request(method, path, &[]).multipart(form);
        self.execute(request, path).await
    }
}

/// Переводит не-2xx ответ в ошибку по HTTP статусу
pub fn classify_failure(status: StatusCode, body: &str) -> AppError {
    match status.as_u16() {
        429 => AppError::RateLimited,
        400 => AppError::InvalidRequest(backend_message(body)),
        401 => AppError::AuthenticationFailed,
        413 => AppError::PayloadTooLarge,
        code => AppError::RemoteError {
            status: code,
            body: body.to_string(),
        },
    }
}

/// Сообщение бэкенда из тела ошибки (`message` или `error`), иначе тело как есть
fn backend_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        ["message", "error"]
            .iter()
            .find_map(|key| v.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    });

    match message {
        Some(message) => message,
        None if body.trim().is_empty() => "the backend rejected the request".to_string(),
        None => body.trim().to_string(),
    }
}
