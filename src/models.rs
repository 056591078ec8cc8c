use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Платформы, поддерживаемые бэкендом Blotato
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Linkedin,
    Facebook,
    Instagram,
    Pinterest,
    Tiktok,
    Threads,
    Bluesky,
    Youtube,
    Webhook,
}

impl Platform {
    pub const ALL: [Platform; 10] = [
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Facebook,
        Platform::Instagram,
        Platform::Pinterest,
        Platform::Tiktok,
        Platform::Threads,
        Platform::Bluesky,
        Platform::Youtube,
        Platform::Webhook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Pinterest => "pinterest",
            Platform::Tiktok => "tiktok",
            Platform::Threads => "threads",
            Platform::Bluesky => "bluesky",
            Platform::Youtube => "youtube",
            Platform::Webhook => "webhook",
        }
    }

    /// Ключ аккаунта по умолчанию в учётных данных (`<platform>_id`).
    /// У webhook своего аккаунта нет.
    pub fn account_key(&self) -> Option<&'static str> {
        match self {
            Platform::Twitter => Some("twitter_id"),
            Platform::Linkedin => Some("linkedin_id"),
            Platform::Facebook => Some("facebook_id"),
            Platform::Instagram => Some("instagram_id"),
            Platform::Pinterest => Some("pinterest_id"),
            Platform::Tiktok => Some("tiktok_id"),
            Platform::Threads => Some("threads_id"),
            Platform::Bluesky => Some("bluesky_id"),
            Platform::Youtube => Some("youtube_id"),
            Platform::Webhook => None,
        }
    }

    pub fn requires_account(&self) -> bool {
        !matches!(self, Platform::Webhook)
    }

    /// Платформы с цепочками ответов
    pub fn supports_threads(&self) -> bool {
        matches!(self, Platform::Twitter | Platform::Bluesky | Platform::Threads)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown platform '{}'", s))
    }
}

/// Идентификаторы аккаунтов по умолчанию из учётных данных.
/// Неизменяемы в течение всего батча.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Args)]
pub struct SocialAccountDefaults {
    #[arg(long, env = "BLOTATO_INSTAGRAM_ID")]
    pub instagram_id: Option<String>,

    #[arg(long, env = "BLOTATO_YOUTUBE_ID")]
    pub youtube_id: Option<String>,

    #[arg(long, env = "BLOTATO_TIKTOK_ID")]
    pub tiktok_id: Option<String>,

    #[arg(long, env = "BLOTATO_FACEBOOK_ID")]
    pub facebook_id: Option<String>,

    /// Страница Facebook, отдельно от аккаунта
    #[arg(long, env = "BLOTATO_FACEBOOK_PAGE_ID")]
    pub facebook_page_id: Option<String>,

    #[arg(long, env = "BLOTATO_THREADS_ID")]
    pub threads_id: Option<String>,

    #[arg(long, env = "BLOTATO_TWITTER_ID")]
    pub twitter_id: Option<String>,

    #[arg(long, env = "BLOTATO_LINKEDIN_ID")]
    pub linkedin_id: Option<String>,

    #[arg(long, env = "BLOTATO_PINTEREST_ID")]
    pub pinterest_id: Option<String>,

    /// Доска Pinterest, отдельно от аккаунта
    #[arg(long, env = "BLOTATO_PINTEREST_BOARD_ID")]
    pub pinterest_board_id: Option<String>,

    #[arg(long, env = "BLOTATO_BLUESKY_ID")]
    pub bluesky_id: Option<String>,
}

impl SocialAccountDefaults {
    /// Все ключи в том порядке, в котором их отдаёт листинг аккаунтов
    pub fn entries(&self) -> [(&'static str, Option<&str>); 11] {
        [
            ("instagram_id", self.instagram_id.as_deref()),
            ("youtube_id", self.youtube_id.as_deref()),
            ("tiktok_id", self.tiktok_id.as_deref()),
            ("facebook_id", self.facebook_id.as_deref()),
            ("facebook_page_id", self.facebook_page_id.as_deref()),
            ("threads_id", self.threads_id.as_deref()),
            ("twitter_id", self.twitter_id.as_deref()),
            ("linkedin_id", self.linkedin_id.as_deref()),
            ("pinterest_id", self.pinterest_id.as_deref()),
            ("pinterest_board_id", self.pinterest_board_id.as_deref()),
            ("bluesky_id", self.bluesky_id.as_deref()),
        ]
    }

    /// Значение по ключу; пустые строки считаются отсутствующими
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries()
            .into_iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v)
            .filter(|v| !v.trim().is_empty())
    }

    /// JSON-объект `{ключ: id}`. При `filter_empty` пустые ключи пропускаются,
    /// иначе выводятся как пустая строка.
    pub fn to_json(&self, filter_empty: bool) -> Map<String, Value> {
        let mut map = Map::new();
        for (key, value) in self.entries() {
            let value = value.unwrap_or_default();
            if !filter_empty || !value.trim().is_empty() {
                map.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
        map
    }
}

/// Формат вывода листинга аккаунтов
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AccountsFormat {
    /// `{platform_id: "value"}`
    #[value(name = "standard")]
    Standard,
    /// `{socialAccounts: {platform_id: "value"}}`
    #[value(name = "nested")]
    Nested,
}

pub fn social_accounts_output(
    defaults: &SocialAccountDefaults,
    filter_empty: bool,
    format: AccountsFormat,
) -> Value {
    let accounts = defaults.to_json(filter_empty);
    match format {
        AccountsFormat::Standard => Value::Object(accounts),
        AccountsFormat::Nested => serde_json::json!({ "socialAccounts": accounts }),
    }
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(format!(
                        "unknown {} '{}', expected one of: {}",
                        stringify!($name),
                        other,
                        [$($wire),+].join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum!(
    /// Видимость поста в TikTok
    TikTokPrivacyLevel {
        SelfOnly => "SELF_ONLY",
        PublicToEveryone => "PUBLIC_TO_EVERYONE",
        MutualFollowFriends => "MUTUAL_FOLLOW_FRIENDS",
        FollowerOfCreator => "FOLLOWER_OF_CREATOR",
    }
);

wire_enum!(
    /// Кто может отвечать на пост в Threads
    ReplyControl {
        Everyone => "everyone",
        AccountsYouFollow => "accounts_you_follow",
        MentionedOnly => "mentioned_only",
    }
);

wire_enum!(
    YoutubePrivacyStatus {
        Private => "private",
        Public => "public",
        Unlisted => "unlisted",
    }
);

impl Default for TikTokPrivacyLevel {
    fn default() -> Self {
        TikTokPrivacyLevel::PublicToEveryone
    }
}

impl Default for YoutubePrivacyStatus {
    fn default() -> Self {
        YoutubePrivacyStatus::Public
    }
}

/// Платформенная часть поста. Тег `targetType` всегда совпадает с платформой,
/// поля одной платформы не могут попасть в чужой target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "targetType", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Target {
    Twitter,
    Linkedin {
        #[serde(skip_serializing_if = "Option::is_none")]
        page_id: Option<String>,
    },
    Facebook {
        page_id: String,
    },
    Instagram,
    Pinterest {
        board_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        alt_text: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        link: Option<String>,
    },
    Tiktok {
        privacy_level: TikTokPrivacyLevel,
        disabled_comments: bool,
        disabled_duet: bool,
        disabled_stitch: bool,
        is_branded_content: bool,
        is_your_brand: bool,
        is_ai_generated: bool,
    },
    Threads {
        #[serde(skip_serializing_if = "Option::is_none")]
        reply_control: Option<ReplyControl>,
    },
    Bluesky,
    Youtube {
        title: String,
        privacy_status: YoutubePrivacyStatus,
        should_notify_subscribers: bool,
    },
    Webhook {
        url: String,
    },
}

impl Target {
    pub fn platform(&self) -> Platform {
        match self {
            Target::Twitter => Platform::Twitter,
            Target::Linkedin { .. } => Platform::Linkedin,
            Target::Facebook { .. } => Platform::Facebook,
            Target::Instagram => Platform::Instagram,
            Target::Pinterest { .. } => Platform::Pinterest,
            Target::Tiktok { .. } => Platform::Tiktok,
            Target::Threads { .. } => Platform::Threads,
            Target::Bluesky => Platform::Bluesky,
            Target::Youtube { .. } => Platform::Youtube,
            Target::Webhook { .. } => Platform::Webhook,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalPost {
    pub text: String,
    pub media_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub text: String,
    pub media_urls: Vec<String>,
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_posts: Option<Vec<AdditionalPost>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub content: Content,
    pub target: Target,
}

/// Тело `POST /posts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEnvelope {
    pub post: PostRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
}

impl PostEnvelope {
    pub fn platform(&self) -> Platform {
        self.post.content.platform
    }
}

/// Ответ `POST /media`. Переиспользовать в посте можно только `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUploadResult {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Результат обработки одного элемента батча публикации
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PostOutcome {
    Published(PublishedPost),
    Failed(FailedItem),
}

impl PostOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PostOutcome::Published(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedPost {
    pub success: bool,
    pub post_submission_id: Option<String>,
    pub platform: Platform,
    pub scheduled_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedItem {
    pub success: bool,
    pub error: String,
}

impl FailedItem {
    pub fn new(error: impl fmt::Display) -> Self {
        FailedItem {
            success: false,
            error: error.to_string(),
        }
    }
}
