//! Mock-транспорт для тестов
//!
//! Записывает все запросы и отвечает заранее заданными ответами по очереди.
//! Если очередь пуста, отвечает значением по умолчанию для пути
//! (`/media` -> `{url}`, `/posts` -> `{postSubmissionId}`).

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::blotato::classify_failure;
use super::{FilePart, Transport};
use crate::error::AppResult;

/// Запрос, который увидел мок
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

/// Заготовленный ответ: JSON при 2xx, иначе статус и тело ошибки
#[derive(Debug, Clone)]
pub enum MockResponse {
    Json(Value),
    Status(u16, String),
}

#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_json(&self, value: Value) -> &Self {
        self.push(MockResponse::Json(value))
    }

    pub fn respond_status(&self, status: u16, body: impl Into<String>) -> &Self {
        self.push(MockResponse::Status(status, body.into()))
    }

    fn push(&self, response: MockResponse) -> &Self {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Запросы к заданному пути
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    fn respond(&self, request: RecordedRequest) -> AppResult<Value> {
        let scripted = self.responses.lock().ok().and_then(|mut q| q.pop_front());
        let path = request.path.clone();
        let count = self.requests.lock().map(|r| r.len()).unwrap_or(0);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        match scripted {
            Some(MockResponse::Json(value)) => Ok(value),
            Some(MockResponse::Status(code, body)) => {
                let status =
                    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Err(classify_failure(status, &body))
            }
            None => Ok(default_response(&path, count + 1)),
        }
    }
}

fn default_response(path: &str, n: usize) -> Value {
    match path {
        "/media" => json!({ "url": format!("https://database.blotato.com/media-{}.png", n) }),
        "/posts" => json!({ "postSubmissionId": format!("submission-{}", n) }),
        _ => json!({}),
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(String, String)],
    ) -> AppResult<Value> {
        self.respond(RecordedRequest {
            method,
            path: path.to_string(),
            body: body.cloned(),
            query: query.to_vec(),
            fields: Vec::new(),
            file: None,
        })
    }

    async fn send_multipart(
        &self,
        method: Method,
        path: &str,
        fields: &[(String, String)],
        file: FilePart,
    ) -> AppResult<Value> {
        self.respond(RecordedRequest {
            method,
            path: path.to_string(),
            body: None,
            query: Vec::new(),
            fields: fields.to_vec(),
            file: Some(file),
        })
    }
}
