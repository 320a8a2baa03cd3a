use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::{ApiError, ApiResult};
use super::types::{
    FolderDeleted, FolderSettings, FolderSettingsUpdate, LoginUrl, MagicFolder, ProcessingStats,
    Rule, RuleCreate, RuleUpdate, SetupResult, TokenResponse, UserSettings, UserSettingsUpdate,
    WatchStatus,
};
use crate::auth::TokenStore;

/// The backend surface the stores talk to. A trait so tests can run the
/// stores against a scripted backend.
#[async_trait]
pub trait SweepApi: Send + Sync {
    async fn list_rules(&self) -> ApiResult<Vec<Rule>>;
    async fn create_rule(&self, rule: &RuleCreate) -> ApiResult<Rule>;
    async fn update_rule(&self, id: &str, update: &RuleUpdate) -> ApiResult<Rule>;
    async fn delete_rule(&self, id: &str) -> ApiResult<()>;

    async fn list_folders(&self) -> ApiResult<Vec<MagicFolder>>;
    async fn create_folders(&self, names: &[String]) -> ApiResult<()>;
    async fn delete_folder(&self, id: &str) -> ApiResult<FolderDeleted>;
    async fn folder_settings(&self, id: &str) -> ApiResult<FolderSettings>;
    async fn update_folder_settings(
        &self,
        id: &str,
        update: &FolderSettingsUpdate,
    ) -> ApiResult<FolderSettings>;
    async fn setup_folders(&self) -> ApiResult<SetupResult>;

    async fn settings(&self) -> ApiResult<UserSettings>;
    async fn update_settings(&self, update: &UserSettingsUpdate) -> ApiResult<UserSettings>;

    async fn watch_status(&self) -> ApiResult<WatchStatus>;
    async fn start_watch(&self) -> ApiResult<()>;
    async fn stop_watch(&self) -> ApiResult<()>;

    async fn stats(&self) -> ApiResult<ProcessingStats>;
}

/// Shape of the backend's error bodies.
#[derive(serde::Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Bearer-authenticated JSON client for the Sweep backend.
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("sweeptui/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/v1{}", self.base_url, endpoint)
    }

    /// Core request path: token lookup, bearer + JSON headers, 401 forced
    /// sign-out, detail-message decoding. Returns the raw body text; an
    /// empty 2xx body is an empty string, never a parse attempt.
    async fn request<B>(&self, method: Method, endpoint: &str, body: Option<&B>) -> ApiResult<String>
    where
        B: Serialize + Sync + ?Sized,
    {
        let token = self
            .tokens
            .access_token()
            .await
            .ok()
            .flatten()
            .ok_or(ApiError::Unauthenticated)?;

        debug!(%method, endpoint, "api request");

        let mut req = self
            .http
            .request(method, self.url(endpoint))
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            // The only automatic sign-out trigger.
            warn!(endpoint, "got 401, clearing stored tokens");
            if let Err(e) = self.tokens.clear().await {
                warn!(error = %e, "failed to clear tokens after 401");
            }
            return Err(ApiError::SessionExpired);
        }

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.detail);
            return Err(match message {
                Some(detail) => ApiError::RequestFailed {
                    status: status.as_u16(),
                    message: detail,
                },
                None => ApiError::from_status(status.as_u16()),
            });
        }

        resp.text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    async fn request_json<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> ApiResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.request(method, endpoint, body).await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Network(format!("bad response: {}", e)))
    }

    async fn request_empty<B>(&self, method: Method, endpoint: &str, body: Option<&B>) -> ApiResult<()>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.request(method, endpoint, body).await.map(|_| ())
    }

    // Unauthenticated auth endpoints (not under /api/v1, no bearer).

    pub async fn login_url(&self) -> ApiResult<LoginUrl> {
        let resp = self
            .http
            .get(format!("{}/auth/login", self.base_url))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ApiError::from_status(resp.status().as_u16()));
        }
        resp.json()
            .await
            .map_err(|e| ApiError::Network(format!("bad response: {}", e)))
    }

    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> ApiResult<TokenResponse> {
        let resp = self
            .http
            .post(format!("{}/auth/callback", self.base_url))
            .json(&serde_json::json!({ "code": code, "redirect_uri": redirect_uri }))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.detail);
            return Err(match message {
                Some(detail) => ApiError::RequestFailed {
                    status: status.as_u16(),
                    message: detail,
                },
                None => ApiError::from_status(status.as_u16()),
            });
        }
        resp.json()
            .await
            .map_err(|e| ApiError::Network(format!("bad response: {}", e)))
    }
}

#[async_trait]
impl SweepApi for ApiClient {
    async fn list_rules(&self) -> ApiResult<Vec<Rule>> {
        self.request_json(Method::GET, "/rules", None::<&()>).await
    }

    async fn create_rule(&self, rule: &RuleCreate) -> ApiResult<Rule> {
        self.request_json(Method::POST, "/rules", Some(rule)).await
    }

    async fn update_rule(&self, id: &str, update: &RuleUpdate) -> ApiResult<Rule> {
        self.request_json(Method::PUT, &format!("/rules/{}", id), Some(update))
            .await
    }

    async fn delete_rule(&self, id: &str) -> ApiResult<()> {
        self.request_empty(Method::DELETE, &format!("/rules/{}", id), None::<&()>)
            .await
    }

    async fn list_folders(&self) -> ApiResult<Vec<MagicFolder>> {
        self.request_json(Method::GET, "/magic-folders/list", None::<&()>)
            .await
    }

    async fn create_folders(&self, names: &[String]) -> ApiResult<()> {
        self.request_empty(
            Method::POST,
            "/magic-folders/create",
            Some(&serde_json::json!({ "folders": names })),
        )
        .await
    }

    async fn delete_folder(&self, id: &str) -> ApiResult<FolderDeleted> {
        self.request_json(Method::DELETE, &format!("/magic-folders/{}", id), None::<&()>)
            .await
    }

    async fn folder_settings(&self, id: &str) -> ApiResult<FolderSettings> {
        self.request_json(
            Method::GET,
            &format!("/magic-folders/{}/settings", id),
            None::<&()>,
        )
        .await
    }

    async fn update_folder_settings(
        &self,
        id: &str,
        update: &FolderSettingsUpdate,
    ) -> ApiResult<FolderSettings> {
        self.request_json(
            Method::PUT,
            &format!("/magic-folders/{}/settings", id),
            Some(update),
        )
        .await
    }

    async fn setup_folders(&self) -> ApiResult<SetupResult> {
        self.request_json(Method::POST, "/magic-folders/setup", None::<&()>)
            .await
    }

    async fn settings(&self) -> ApiResult<UserSettings> {
        self.request_json(Method::GET, "/settings", None::<&()>).await
    }

    async fn update_settings(&self, update: &UserSettingsUpdate) -> ApiResult<UserSettings> {
        self.request_json(Method::PUT, "/settings", Some(update)).await
    }

    async fn watch_status(&self) -> ApiResult<WatchStatus> {
        self.request_json(Method::GET, "/watch/status", None::<&()>)
            .await
    }

    async fn start_watch(&self) -> ApiResult<()> {
        self.request_empty(Method::POST, "/watch/start", None::<&()>)
            .await
    }

    async fn stop_watch(&self) -> ApiResult<()> {
        self.request_empty(Method::POST, "/watch/stop", None::<&()>)
            .await
    }

    async fn stats(&self) -> ApiResult<ProcessingStats> {
        self.request_json(Method::GET, "/stats", None::<&()>).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::MatchType;
    use crate::auth::tokens::MemoryStore;
    use std::sync::Arc;
    use std::thread;
    use tiny_http::{Response, Server};

    /// Serve exactly one request on an ephemeral port, then exit.
    fn serve_once(
        status: u16,
        body: &'static str,
    ) -> (String, thread::JoinHandle<(String, Option<String>)>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let handle = thread::spawn(move || {
            let request = server.recv().unwrap();
            let url = request.url().to_string();
            let auth = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string());
            request
                .respond(Response::from_string(body).with_status_code(status))
                .unwrap();
            (url, auth)
        });
        (format!("http://127.0.0.1:{}", port), handle)
    }

    async fn authed_client(base_url: &str) -> (ApiClient, TokenStore) {
        let tokens = TokenStore::new(Arc::new(MemoryStore::default()));
        tokens.store_access_token("test-token").await.unwrap();
        (ApiClient::new(base_url, tokens.clone()), tokens)
    }

    #[tokio::test]
    async fn fails_fast_without_a_token() {
        // Unroutable base URL: if the client tried the network this would
        // come back as a Network error, not Unauthenticated.
        let tokens = TokenStore::new(Arc::new(MemoryStore::default()));
        let client = ApiClient::new("http://127.0.0.1:1", tokens);
        match client.stats().await {
            Err(ApiError::Unauthenticated) => {}
            other => panic!("expected Unauthenticated, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn sends_bearer_header_and_versioned_path() {
        let (base, handle) = serve_once(200, "[]");
        let (client, _) = authed_client(&base).await;
        client.list_rules().await.unwrap();
        let (url, auth) = handle.join().unwrap();
        assert_eq!(url, "/api/v1/rules");
        assert_eq!(auth.as_deref(), Some("Bearer test-token"));
    }

    #[tokio::test]
    async fn unauthorized_clears_tokens_and_reports_session_expired() {
        let (base, handle) = serve_once(401, "{}");
        let (client, tokens) = authed_client(&base).await;
        tokens.store_refresh_token("rt").await.unwrap();

        match client.stats().await {
            Err(ApiError::SessionExpired) => {}
            other => panic!("expected SessionExpired, got {:?}", other),
        }
        handle.join().unwrap();
        assert!(tokens.access_token().await.unwrap().is_none());
        assert!(tokens.refresh_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn decodes_detail_message_from_error_body() {
        let (base, handle) = serve_once(409, r#"{"detail":"rule already exists"}"#);
        let (client, _) = authed_client(&base).await;
        match client.delete_rule("r1").await {
            Err(ApiError::RequestFailed { status, message }) => {
                assert_eq!(status, 409);
                assert_eq!(message, "rule already exists");
            }
            other => panic!("expected RequestFailed, got {:?}", other),
        }
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn falls_back_to_generic_status_message() {
        let (base, handle) = serve_once(500, "not json at all");
        let (client, _) = authed_client(&base).await;
        match client.stats().await {
            Err(ApiError::RequestFailed { message, .. }) => {
                assert_eq!(message, "API error: 500");
            }
            other => panic!("expected RequestFailed, got {:?}", other),
        }
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn empty_success_body_is_ok() {
        let (base, handle) = serve_once(204, "");
        let (client, _) = authed_client(&base).await;
        client.delete_rule("r1").await.unwrap();
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn parses_rule_list() {
        let (base, handle) = serve_once(
            200,
            r#"[{"id":"r1","email_pattern":"a@b.com","match_type":"exact",
                 "action":"move","destination_label_name":"@Work",
                 "enabled":true,"times_applied":3,
                 "created_at":"2026-01-05T10:00:00Z"}]"#,
        );
        let (client, _) = authed_client(&base).await;
        let rules = client.list_rules().await.unwrap();
        handle.join().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "r1");
        assert_eq!(rules[0].match_type, MatchType::Exact);
        assert_eq!(rules[0].times_applied, 3);
    }
}
