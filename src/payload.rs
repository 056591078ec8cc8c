// payload.rs - сборка тела POST /posts под конкретную платформу.
// Чистые функции, без сети.

use chrono::{DateTime, NaiveDateTime};
use tracing::debug;

use crate::account::{resolve_account, resolve_identifier};
use crate::error::{AppError, AppResult};
use crate::models::{
    AdditionalPost, Content, Platform, PostEnvelope, PostRequest, SocialAccountDefaults, Target,
};
use crate::params::{AdditionalPostsParams, PlatformFields, PostParams};

const MEDIA_DOMAIN: &str = "blotato.com";

/// Строка URL через запятую -> список без пробелов и пустых элементов.
/// У data URI запятая отделяет заголовок от данных, такой элемент склеиваем обратно.
pub fn split_media_urls(raw: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let mut parts = raw.split(',').map(str::trim);

    while let Some(part) = parts.next() {
        if part.is_empty() {
            continue;
        }
        if part.starts_with("data:") {
            let payload = parts.next().unwrap_or_default();
            urls.push(format!("{},{}", part, payload));
        } else {
            urls.push(part.to_string());
        }
    }
    urls
}

/// Медиа уже лежит на бэкенде (`blotato.com` или его поддомен)
pub fn is_hosted_media(url: &str) -> bool {
    reqwest::Url::parse(url)
        .ok()
        .filter(|parsed| matches!(parsed.scheme(), "https" | "http"))
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        .map(|host| host == MEDIA_DOMAIN || host.ends_with(&format!(".{}", MEDIA_DOMAIN)))
        .unwrap_or(false)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn require(value: &Option<String>, what: &str, platform: Platform) -> AppResult<String> {
    non_empty(value).ok_or_else(|| {
        AppError::ValidationError(format!("{} is required for posting to {}", what, platform))
    })
}

/// Дополнительные посты цепочки. `None`, если платформа цепочки не умеет,
/// флаг не выставлен или постов нет.
pub fn build_additional_posts(
    platform: Platform,
    create_thread: bool,
    posts: &AdditionalPostsParams,
) -> Option<Vec<AdditionalPost>> {
    if !platform.supports_threads() || !create_thread || posts.posts.is_empty() {
        return None;
    }

    Some(
        posts
            .posts
            .iter()
            .map(|post| AdditionalPost {
                text: post.text.clone(),
                media_urls: split_media_urls(&post.media_urls),
            })
            .collect(),
    )
}

/// Target для платформы. Page/board id разрешаются через учётные данные.
pub fn build_target(
    platform: Platform,
    fields: &PlatformFields,
    defaults: &SocialAccountDefaults,
) -> AppResult<Target> {
    let target = match platform {
        Platform::Twitter => Target::Twitter,
        Platform::Instagram => Target::Instagram,
        Platform::Bluesky => Target::Bluesky,
        Platform::Facebook => {
            let page_id = resolve_identifier(
                platform,
                "facebook_page_id",
                fields.facebook_page_id.as_deref(),
                defaults,
                true,
            )?
            .unwrap_or_default();
            Target::Facebook { page_id }
        }
        Platform::Linkedin => Target::Linkedin {
            page_id: non_empty(&fields.linkedin_page_id),
        },
        Platform::Pinterest => {
            let board_id = resolve_identifier(
                platform,
                "pinterest_board_id",
                fields.pinterest_board_id.as_deref(),
                defaults,
                true,
            )?
            .unwrap_or_default();
            Target::Pinterest {
                board_id,
                title: non_empty(&fields.pinterest_title),
                alt_text: non_empty(&fields.pinterest_alt_text),
                link: non_empty(&fields.pinterest_link),
            }
        }
        Platform::Tiktok => {
            let options = &fields.tiktok_options;
            Target::Tiktok {
                privacy_level: fields.tiktok_privacy_level.unwrap_or_default(),
                disabled_comments: options.disabled_comments.unwrap_or(false),
                disabled_duet: options.disabled_duet.unwrap_or(false),
                disabled_stitch: options.disabled_stitch.unwrap_or(false),
                is_branded_content: options.is_branded_content.unwrap_or(false),
                is_your_brand: options.is_your_brand.unwrap_or(false),
                is_ai_generated: options.is_ai_generated.unwrap_or(false),
            }
        }
        Platform::Threads => Target::Threads {
            reply_control: fields.threads_reply_control,
        },
        Platform::Youtube => Target::Youtube {
            title: require(&fields.youtube_title, "YouTube video title", platform)?,
            privacy_status: fields.youtube_privacy_status.unwrap_or_default(),
            should_notify_subscribers: fields.youtube_notify_subscribers.unwrap_or(true),
        },
        Platform::Webhook => Target::Webhook {
            url: require(&fields.webhook_url, "Webhook URL", platform)?,
        },
    };

    debug_assert_eq!(target.platform(), platform);
    Ok(target)
}

/// Время публикации передаётся бэкенду как есть, но должно быть разбираемым
pub fn validate_scheduled_time(raw: &str) -> AppResult<()> {
    let raw = raw.trim();
    if DateTime::parse_from_rfc3339(raw).is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
    {
        return Ok(());
    }
    Err(AppError::ValidationError(format!(
        "scheduledTime '{}' is not an ISO-8601 timestamp",
        raw
    )))
}

fn scheduled_time(params: &PostParams) -> AppResult<Option<String>> {
    if !params.schedule_post {
        return Ok(None);
    }

    let time = non_empty(&params.scheduled_time).ok_or_else(|| {
        AppError::ValidationError("scheduledTime is required when schedulePost is set".to_string())
    })?;
    validate_scheduled_time(&time)?;
    Ok(Some(time))
}

/// Полное тело запроса. `media_urls` и медиа цепочки уже должны быть размещены на бэкенде.
pub fn build_post(
    params: &PostParams,
    media_urls: Vec<String>,
    defaults: &SocialAccountDefaults,
) -> AppResult<PostEnvelope> {
    let platform = params.platform;

    let account_id = resolve_account(platform, params.account_id.as_deref(), defaults)?;
    let target = build_target(platform, &params.fields, defaults)?;
    let scheduled_time = scheduled_time(params)?;

    let additional_posts =
        build_additional_posts(platform, params.create_thread, &params.additional_posts);

    debug!(
        "Built {} post: {} media, {} thread posts, scheduled: {:?}",
        platform,
        media_urls.len(),
        additional_posts.as_ref().map_or(0, Vec::len),
        scheduled_time
    );

    Ok(PostEnvelope {
        post: PostRequest {
            account_id,
            content: Content {
                text: params.text.clone(),
                media_urls,
                platform,
                additional_posts,
            },
            target,
        },
        scheduled_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReplyControl, TikTokPrivacyLevel, YoutubePrivacyStatus};
    use crate::params::{AdditionalPostParams, InputItem};
    use serde_json::{json, Value};

    fn params(value: Value) -> PostParams {
        InputItem::new(value).params().unwrap()
    }

    fn target_json(platform: Platform, fields: Value, defaults: &SocialAccountDefaults) -> Value {
        let mut input = json!({"platform": platform.as_str(), "text": "t"});
        if let (Some(obj), Some(extra)) = (input.as_object_mut(), fields.as_object()) {
            obj.extend(extra.clone());
        }
        let p = params(input);
        serde_json::to_value(build_target(platform, &p.fields, defaults).unwrap()).unwrap()
    }

    #[test]
    fn media_urls_are_trimmed_and_compacted() {
        assert_eq!(split_media_urls("a, b ,, c"), vec!["a", "b", "c"]);
        assert!(split_media_urls("").is_empty());
        assert!(split_media_urls(" , ,").is_empty());
    }

    #[test]
    fn data_uri_is_not_split_on_its_comma() {
        assert_eq!(
            split_media_urls("data:image/png;base64,AAAA, https://example.com/raw.jpg"),
            vec!["data:image/png;base64,AAAA", "https://example.com/raw.jpg"]
        );
    }

    #[test]
    fn hosted_media_is_recognized_by_domain() {
        assert!(is_hosted_media("https://database.blotato.com/a.png"));
        assert!(is_hosted_media("https://blotato.com/media1.jpg"));
        assert!(!is_hosted_media("https://example.com/raw.jpg"));
        assert!(!is_hosted_media("https://notblotato.com/a.png"));
        assert!(!is_hosted_media("data:image/png;base64,AAAA"));
        assert!(!is_hosted_media("not a url"));
    }

    #[test]
    fn facebook_page_from_defaults() {
        let defaults = SocialAccountDefaults {
            facebook_page_id: Some("page-7".to_string()),
            ..Default::default()
        };
        let value = target_json(Platform::Facebook, json!({}), &defaults);
        assert_eq!(value, json!({"targetType": "facebook", "pageId": "page-7"}));
    }

    #[test]
    fn facebook_without_page_fails() {
        let p = params(json!({"platform": "facebook", "text": "t"}));
        let err = build_target(Platform::Facebook, &p.fields, &SocialAccountDefaults::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingAccountIdentifier {
                key: "facebook_page_id",
                ..
            }
        ));
    }

    #[test]
    fn pinterest_optional_fields_only_when_present() {
        let defaults = SocialAccountDefaults {
            pinterest_board_id: Some("board-1".to_string()),
            ..Default::default()
        };
        let bare = target_json(Platform::Pinterest, json!({"pinterestTitle": ""}), &defaults);
        assert_eq!(bare, json!({"targetType": "pinterest", "boardId": "board-1"}));

        let full = target_json(
            Platform::Pinterest,
            json!({
                "pinterestBoardId": "board-2",
                "pinterestTitle": "Title",
                "pinterestAltText": "Alt",
                "pinterestLink": "https://example.com"
            }),
            &defaults,
        );
        assert_eq!(
            full,
            json!({
                "targetType": "pinterest",
                "boardId": "board-2",
                "title": "Title",
                "altText": "Alt",
                "link": "https://example.com"
            })
        );
    }

    #[test]
    fn pinterest_without_board_fails() {
        let p = params(json!({"platform": "pinterest", "text": "t"}));
        let err = build_target(Platform::Pinterest, &p.fields, &SocialAccountDefaults::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingAccountIdentifier {
                platform: Platform::Pinterest,
                key: "pinterest_board_id"
            }
        ));
    }

    #[test]
    fn tiktok_always_emits_all_flags() {
        let value = target_json(
            Platform::Tiktok,
            json!({"tiktokOptions": {"disabledDuet": true}}),
            &SocialAccountDefaults::default(),
        );
        assert_eq!(
            value,
            json!({
                "targetType": "tiktok",
                "privacyLevel": "PUBLIC_TO_EVERYONE",
                "disabledComments": false,
                "disabledDuet": true,
                "disabledStitch": false,
                "isBrandedContent": false,
                "isYourBrand": false,
                "isAiGenerated": false
            })
        );
    }

    #[test]
    fn tiktok_keeps_explicit_privacy() {
        let p = params(json!({
            "platform": "tiktok",
            "text": "t",
            "tiktokPrivacyLevel": "FOLLOWER_OF_CREATOR"
        }));
        match build_target(Platform::Tiktok, &p.fields, &SocialAccountDefaults::default()).unwrap()
        {
            Target::Tiktok { privacy_level, .. } => {
                assert_eq!(privacy_level, TikTokPrivacyLevel::FollowerOfCreator)
            }
            other => panic!("unexpected target {:?}", other),
        }
    }

    #[test]
    fn linkedin_and_threads_optional_fields() {
        let empty = SocialAccountDefaults::default();
        assert_eq!(
            target_json(Platform::Linkedin, json!({}), &empty),
            json!({"targetType": "linkedin"})
        );
        assert_eq!(
            target_json(Platform::Linkedin, json!({"linkedinPageId": "org-1"}), &empty),
            json!({"targetType": "linkedin", "pageId": "org-1"})
        );
        assert_eq!(
            target_json(Platform::Threads, json!({}), &empty),
            json!({"targetType": "threads"})
        );

        let p = params(json!({
            "platform": "threads",
            "text": "t",
            "threadsReplyControl": "mentioned_only"
        }));
        assert_eq!(
            build_target(Platform::Threads, &p.fields, &empty).unwrap(),
            Target::Threads {
                reply_control: Some(ReplyControl::MentionedOnly)
            }
        );
    }

    #[test]
    fn youtube_requires_title() {
        let p = params(json!({"platform": "youtube", "text": "t"}));
        let err = build_target(Platform::Youtube, &p.fields, &SocialAccountDefaults::default())
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn webhook_requires_url() {
        let p = params(json!({"platform": "webhook", "text": "t", "webhookUrl": " "}));
        let err = build_target(Platform::Webhook, &p.fields, &SocialAccountDefaults::default())
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn youtube_scenario_uses_default_account() {
        let defaults = SocialAccountDefaults {
            youtube_id: Some("UC123".to_string()),
            ..Default::default()
        };
        let p = params(json!({
            "platform": "youtube",
            "text": "hello",
            "youtubeTitle": "My video",
            "youtubePrivacyStatus": "unlisted",
            "youtubeNotifySubscribers": false
        }));

        let envelope = build_post(&p, vec![], &defaults).unwrap();
        assert_eq!(envelope.post.account_id.as_deref(), Some("UC123"));
        assert_eq!(
            envelope.post.target,
            Target::Youtube {
                title: "My video".to_string(),
                privacy_status: YoutubePrivacyStatus::Unlisted,
                should_notify_subscribers: false,
            }
        );

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "post": {
                    "accountId": "UC123",
                    "content": {"text": "hello", "mediaUrls": [], "platform": "youtube"},
                    "target": {
                        "targetType": "youtube",
                        "title": "My video",
                        "privacyStatus": "unlisted",
                        "shouldNotifySubscribers": false
                    }
                }
            })
        );
    }

    #[test]
    fn webhook_post_may_omit_account() {
        let p = params(json!({
            "platform": "webhook",
            "text": "ping",
            "webhookUrl": "https://hooks.example.com/x"
        }));
        let envelope = build_post(&p, vec![], &SocialAccountDefaults::default()).unwrap();
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value["post"].get("accountId").is_none());
        assert_eq!(value["post"]["target"]["url"], "https://hooks.example.com/x");
    }

    #[test]
    fn thread_posts_only_for_thread_platforms() {
        let posts = AdditionalPostsParams {
            posts: vec![AdditionalPostParams {
                text: "second".to_string(),
                media_urls: " https://database.blotato.com/1.png ,, ".to_string(),
            }],
        };

        let built = build_additional_posts(Platform::Bluesky, true, &posts).unwrap();
        assert_eq!(built[0].media_urls, vec!["https://database.blotato.com/1.png"]);

        assert!(build_additional_posts(Platform::Bluesky, false, &posts).is_none());
        assert!(build_additional_posts(Platform::Instagram, true, &posts).is_none());
        assert!(
            build_additional_posts(Platform::Twitter, true, &AdditionalPostsParams::default())
                .is_none()
        );
    }

    #[test]
    fn thread_is_attached_to_content() {
        let defaults = SocialAccountDefaults {
            twitter_id: Some("tw".to_string()),
            ..Default::default()
        };
        let p = params(json!({
            "platform": "twitter",
            "text": "1/2",
            "createThread": true,
            "additionalPosts": {"posts": [{"text": "2/2", "mediaUrls": ""}]}
        }));
        let value = serde_json::to_value(build_post(&p, vec![], &defaults).unwrap()).unwrap();
        assert_eq!(
            value["post"]["content"]["additionalPosts"],
            json!([{"text": "2/2", "mediaUrls": []}])
        );
    }

    #[test]
    fn scheduling_passes_time_through() {
        let defaults = SocialAccountDefaults {
            twitter_id: Some("tw".to_string()),
            ..Default::default()
        };
        let p = params(json!({
            "platform": "twitter",
            "text": "later",
            "schedulePost": true,
            "scheduledTime": "2026-11-01T09:30:00Z"
        }));
        let envelope = build_post(&p, vec![], &defaults).unwrap();
        assert_eq!(envelope.scheduled_time.as_deref(), Some("2026-11-01T09:30:00Z"));

        let unscheduled = params(json!({
            "platform": "twitter",
            "text": "now",
            "scheduledTime": "2026-11-01T09:30:00Z"
        }));
        assert_eq!(build_post(&unscheduled, vec![], &defaults).unwrap().scheduled_time, None);
    }

    #[test]
    fn scheduling_rejects_missing_or_garbage_time() {
        let defaults = SocialAccountDefaults {
            twitter_id: Some("tw".to_string()),
            ..Default::default()
        };
        let missing = params(json!({"platform": "twitter", "text": "x", "schedulePost": true}));
        assert!(matches!(
            build_post(&missing, vec![], &defaults),
            Err(AppError::ValidationError(_))
        ));

        let garbage = params(json!({
            "platform": "twitter",
            "text": "x",
            "schedulePost": true,
            "scheduledTime": "next tuesday"
        }));
        assert!(matches!(
            build_post(&garbage, vec![], &defaults),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn scheduled_time_formats() {
        assert!(validate_scheduled_time("2026-01-02T03:04:05+02:00").is_ok());
        assert!(validate_scheduled_time("2026-01-02T03:04:05.123Z").is_ok());
        assert!(validate_scheduled_time("2026-01-02T03:04:05").is_ok());
        assert!(validate_scheduled_time("2026-01-02").is_err());
    }

    #[test]
    fn hosted_media_urls_are_opaque() {
        let defaults = SocialAccountDefaults {
            instagram_id: Some("ig".to_string()),
            ..Default::default()
        };
        let p = params(json!({"platform": "instagram", "text": "pic"}));
        let urls = vec!["https://database.blotato.com/x.png".to_string()];
        let envelope = build_post(&p, urls.clone(), &defaults).unwrap();
        assert_eq!(envelope.post.content.media_urls, urls);
    }
}
