// api/accounts.rs - чтение подключённых аккаунтов (GET /accounts...)

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use super::Transport;
use crate::error::{AppError, AppResult};
use crate::models::Platform;

/// Дополнительные данные в ответе
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountQuery {
    pub include_analytics: bool,
    pub include_recent_posts: bool,
}

impl AccountQuery {
    /// Флаги уходят в query только если включены
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if self.include_analytics {
            pairs.push(("includeAnalytics".to_string(), "true".to_string()));
        }
        if self.include_recent_posts {
            pairs.push(("includeRecentPosts".to_string(), "true".to_string()));
        }
        pairs
    }
}

/// Что именно запрашиваем
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountLookup {
    All,
    ByPlatform(Platform),
    ById(String),
}

impl AccountLookup {
    pub fn path(&self) -> AppResult<String> {
        match self {
            AccountLookup::All => Ok("/accounts".to_string()),
            AccountLookup::ByPlatform(platform) => {
                Ok(format!("/accounts/platform/{}", platform.as_str()))
            }
            AccountLookup::ById(id) => {
                let id = id.trim();
                if id.is_empty() || id.contains('/') {
                    return Err(AppError::ValidationError(format!(
                        "invalid account id '{}'",
                        id
                    )));
                }
                Ok(format!("/accounts/{}", id))
            }
        }
    }
}

pub async fn fetch_accounts(
    transport: &dyn Transport,
    lookup: &AccountLookup,
    query: AccountQuery,
) -> AppResult<Value> {
    let path = lookup.path()?;
    debug!("Fetching accounts from {}", path);

    let response = transport
        .send(Method::GET, &path, None, &query.to_pairs())
        .await?;

    info!("Fetched account metadata from {}", path);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockTransport;
    use serde_json::json;

    #[test]
    fn lookup_paths() {
        assert_eq!(AccountLookup::All.path().unwrap(), "/accounts");
        assert_eq!(
            AccountLookup::ByPlatform(Platform::Pinterest).path().unwrap(),
            "/accounts/platform/pinterest"
        );
        assert_eq!(
            AccountLookup::ById("acc-9".to_string()).path().unwrap(),
            "/accounts/acc-9"
        );
        assert!(AccountLookup::ById("  ".to_string()).path().is_err());
        assert!(AccountLookup::ById("a/b".to_string()).path().is_err());
    }

    #[test]
    fn query_flags_only_when_set() {
        assert!(AccountQuery::default().to_pairs().is_empty());
        let pairs = AccountQuery {
            include_analytics: true,
            include_recent_posts: false,
        }
        .to_pairs();
        assert_eq!(pairs, vec![("includeAnalytics".to_string(), "true".to_string())]);
    }

    #[tokio::test]
    async fn fetch_sends_get_with_flags() {
        let mock = MockTransport::new();
        mock.respond_json(json!({"items": []}));

        let query = AccountQuery {
            include_analytics: true,
            include_recent_posts: true,
        };
        let result = fetch_accounts(&mock, &AccountLookup::ByPlatform(Platform::Twitter), query)
            .await
            .unwrap();
        assert_eq!(result, json!({"items": []}));

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].path, "/accounts/platform/twitter");
        assert_eq!(requests[0].query.len(), 2);
    }
}
