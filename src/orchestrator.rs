// orchestrator.rs - последовательная обработка батча: медиа -> аккаунт -> тело -> отправка

use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::api::Transport;
use crate::error::{AppError, AppResult};
use crate::media::MediaResolver;
use crate::models::{FailedItem, PostOutcome, PublishedPost, SocialAccountDefaults};
use crate::params::{InputItem, PostParams, UploadMethod, UploadParams};
use crate::payload::{build_post, is_hosted_media, split_media_urls};

const POSTS_PATH: &str = "/posts";

pub struct PostOrchestrator<'a> {
    transport: &'a dyn Transport,
    media: MediaResolver<'a>,
    defaults: &'a SocialAccountDefaults,
    continue_on_fail: bool,
}

impl<'a> PostOrchestrator<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        media: MediaResolver<'a>,
        defaults: &'a SocialAccountDefaults,
    ) -> Self {
        PostOrchestrator {
            transport,
            media,
            defaults,
            continue_on_fail: false,
        }
    }

    /// Ошибка элемента превращается в запись `{success: false}` вместо прерывания батча
    pub fn continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }

    /// Публикует элементы строго по очереди. Результаты в исходном порядке.
    pub async fn publish_batch(&self, items: &[InputItem]) -> AppResult<Vec<PostOutcome>> {
        let mut outcomes = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            match self.publish_item(item).await {
                Ok(published) => outcomes.push(PostOutcome::Published(published)),
                Err(e) if self.continue_on_fail => {
                    warn!(remote = e.is_remote(), "Item {} failed, continuing: {}", index, e);
                    outcomes.push(PostOutcome::Failed(FailedItem::new(&e)));
                }
                Err(e) => {
                    warn!(remote = e.is_remote(), "Item {} failed, aborting batch: {}", index, e);
                    return Err(e);
                }
            }
        }

        info!(
            "Processed {} items, {} published",
            outcomes.len(),
            outcomes.iter().filter(|o| o.is_success()).count()
        );
        Ok(outcomes)
    }

    pub async fn publish_item(&self, item: &InputItem) -> AppResult<PublishedPost> {
        let mut params: PostParams = item.params()?;
        let media_urls = self.collect_media(item, &params).await?;
        self.host_thread_media(&mut params).await?;
        let envelope = build_post(&params, media_urls, self.defaults)?;

        let body = serde_json::to_value(&envelope)?;
        let response = self
            .transport
            .send(Method::POST, POSTS_PATH, Some(&body), &[])
            .await?;

        let post_submission_id = response
            .get("postSubmissionId")
            .and_then(|id| match id {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
        if post_submission_id.is_none() {
            warn!("Backend response has no postSubmissionId: {}", response);
        }

        info!(
            "Submitted {} post: {:?}",
            envelope.platform(),
            post_submission_id
        );

        Ok(PublishedPost {
            success: true,
            post_submission_id,
            platform: envelope.platform(),
            scheduled_time: envelope.scheduled_time,
        })
    }

    /// Явные `mediaUrls` плюс загруженные внешние URL и вложения
    async fn collect_media(&self, item: &InputItem, params: &PostParams) -> AppResult<Vec<String>> {
        let mut media_urls = self.host_media(&params.media_urls).await?;

        for source in split_media_urls(&params.media_source_urls) {
            let uploaded = self.media.resolve_from_url(&source).await?;
            media_urls.push(uploaded.url);
        }

        for property in &params.media_binary_properties {
            let uploaded = self.media.resolve_attachment(item, property, None).await?;
            media_urls.push(uploaded.url);
        }

        debug!("Resolved {} media URLs", media_urls.len());
        Ok(media_urls)
    }

    /// Явный список медиа: уже размещённые URL остаются как есть,
    /// внешние URL и data URI сначала загружаются через `/media`
    async fn host_media(&self, raw: &str) -> AppResult<Vec<String>> {
        let mut hosted = Vec::new();
        for url in split_media_urls(raw) {
            if is_hosted_media(&url) {
                hosted.push(url);
            } else {
                hosted.push(self.media.resolve_from_url(&url).await?.url);
            }
        }
        Ok(hosted)
    }

    /// Медиа постов цепочки. Загружаем только если цепочка уйдёт в запрос.
    async fn host_thread_media(&self, params: &mut PostParams) -> AppResult<()> {
        if !params.create_thread || !params.platform.supports_threads() {
            return Ok(());
        }

        for post in &mut params.additional_posts.posts {
            post.media_urls = self.host_media(&post.media_urls).await?.join(",");
        }
        Ok(())
    }
}

/// Отдельная операция загрузки медиа
pub struct UploadOrchestrator<'a> {
    media: MediaResolver<'a>,
    defaults: &'a SocialAccountDefaults,
    continue_on_fail: bool,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(media: MediaResolver<'a>, defaults: &'a SocialAccountDefaults) -> Self {
        UploadOrchestrator {
            media,
            defaults,
            continue_on_fail: false,
        }
    }

    pub fn continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }

    pub async fn upload_batch(&self, items: &[InputItem]) -> AppResult<Vec<Value>> {
        let mut outputs = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            match self.upload_item(item).await {
                Ok(output) => outputs.push(output),
                Err(e) if self.continue_on_fail => {
                    warn!("Upload {} failed, continuing: {}", index, e);
                    outputs.push(serde_json::to_value(FailedItem::new(&e))?);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outputs)
    }

    pub async fn upload_item(&self, item: &InputItem) -> AppResult<Value> {
        let params: UploadParams = item.params()?;

        let output_field = params.output_field.trim();
        if output_field.is_empty() {
            return Err(AppError::ValidationError(
                "outputField must not be empty".to_string(),
            ));
        }

        let result = match params.upload_method {
            UploadMethod::Url => {
                let url = params.url.as_deref().unwrap_or_default();
                self.media.resolve_from_url(url).await?
            }
            UploadMethod::BinaryData => {
                self.media
                    .resolve_attachment(
                        item,
                        &params.binary_property_name,
                        params.file_name.as_deref(),
                    )
                    .await?
            }
        };

        let mut output = Map::new();
        output.insert(output_field.to_string(), Value::String(result.url.clone()));
        output.insert("mediaUploadResponse".to_string(), serde_json::to_value(&result)?);
        if params.include_social_accounts {
            output.insert(
                "socialAccounts".to_string(),
                Value::Object(self.defaults.to_json(false)),
            );
        }

        Ok(Value::Object(output))
    }
}
