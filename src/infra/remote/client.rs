use std::time::Instant;

use async_trait::async_trait;
use postdeck_api_types::{Post, PostDraft, User};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::application::repos::ResourceApi;
use crate::config::ApiSettings;
use crate::domain::error::ResourceError;
use crate::infra::error::InfraError;

const JSON: &str = "application/json";

#[derive(Debug, Clone)]
pub struct HttpResourceApi {
    client: Client,
    base: Url,
}

impl HttpResourceApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        Ok(Self {
            client,
            base: with_trailing_slash(settings.base_url.clone()),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("postdeck/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ResourceError> {
        self.base
            .join(path)
            .map_err(|err| ResourceError::unknown(format!("invalid URL `{path}`: {err}")))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ResourceError> {
        let url = self.url(path)?;
        debug!(method = %method, url = %url, "Sending API request");
        Ok(self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON))
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ResourceError> {
        let req = self.request(Method::GET, path)?;
        Self::handle(Self::send(req).await?).await
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ResourceError> {
        let req = self.request(method, path)?.json(body);
        Self::handle(Self::send(req).await?).await
    }

    async fn send(req: RequestBuilder) -> Result<Response, ResourceError> {
        let started = Instant::now();
        let resp = req.send().await.map_err(map_transport)?;
        debug!(
            status = resp.status().as_u16(),
            url = %resp.url(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "API response received"
        );
        if let Some(err) = map_status(resp.status()) {
            return Err(err);
        }
        Ok(resp)
    }

    async fn handle<T: DeserializeOwned>(resp: Response) -> Result<T, ResourceError> {
        let bytes = resp.bytes().await.map_err(map_transport)?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ResourceError::unknown(format!("failed to parse response body: {err}")))
    }
}

#[async_trait]
impl ResourceApi for HttpResourceApi {
    async fn list_posts(&self) -> Result<Vec<Post>, ResourceError> {
        self.fetch("posts").await
    }

    async fn get_post(&self, id: u64) -> Result<Post, ResourceError> {
        self.fetch(&format!("posts/{id}")).await
    }

    async fn create_post(&self, draft: &PostDraft) -> Result<Post, ResourceError> {
        self.send_json(Method::POST, "posts", draft).await
    }

    async fn update_post(&self, post: &Post) -> Result<Post, ResourceError> {
        self.send_json(Method::PUT, &format!("posts/{}", post.id), post)
            .await
    }

    async fn delete_post(&self, id: u64) -> Result<(), ResourceError> {
        let req = self.request(Method::DELETE, &format!("posts/{id}"))?;
        Self::send(req).await.map(|_| ())
    }

    async fn list_users(&self) -> Result<Vec<User>, ResourceError> {
        self.fetch("users").await
    }

    async fn get_user(&self, id: u64) -> Result<User, ResourceError> {
        self.fetch(&format!("users/{id}")).await
    }
}

fn map_transport(err: reqwest::Error) -> ResourceError {
    if err.is_timeout() {
        ResourceError::Timeout
    } else {
        ResourceError::unknown(err.to_string())
    }
}

fn map_status(status: StatusCode) -> Option<ResourceError> {
    if status.is_success() {
        None
    } else if status == StatusCode::NOT_FOUND {
        Some(ResourceError::NotFound)
    } else if status.is_server_error() {
        Some(ResourceError::ServerUnavailable)
    } else {
        Some(ResourceError::unknown(format!(
            "request failed with status {status}"
        )))
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use httpmock::MockServer;
    use serde_json::json;

    use super::*;

    fn api(server: &MockServer) -> HttpResourceApi {
        api_with_timeout(server, Duration::from_secs(5))
    }

    fn api_with_timeout(server: &MockServer, timeout: Duration) -> HttpResourceApi {
        let settings = ApiSettings {
            base_url: Url::parse(&server.base_url()).expect("base url"),
            timeout,
        };
        HttpResourceApi::new(&settings).expect("client")
    }

    #[tokio::test]
    async fn list_posts_decodes_camel_case_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/posts")
                    .header("content-type", "application/json")
                    .header("user-agent", HttpResourceApi::user_agent());
                then.status(200).json_body(json!([
                    {"id": 1, "title": "first", "body": "one", "userId": 7}
                ]));
            })
            .await;

        let posts = api(&server).list_posts().await.expect("posts");

        mock.assert_async().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].user_id, 7);
    }

    #[tokio::test]
    async fn create_sends_draft_and_returns_server_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST").path("/posts").json_body(json!({
                    "title": "Hello World",
                    "body": "This is a test post",
                    "userId": 1
                }));
                then.status(201).json_body(json!({
                    "id": 101,
                    "title": "Hello World",
                    "body": "This is a test post",
                    "userId": 1
                }));
            })
            .await;

        let draft = PostDraft {
            title: "Hello World".into(),
            body: "This is a test post".into(),
            user_id: 1,
        };
        let post = api(&server).create_post(&draft).await.expect("created");

        mock.assert_async().await;
        assert_eq!(post.id, 101);
    }

    #[tokio::test]
    async fn update_puts_to_post_path() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("PUT").path("/posts/5");
                then.status(200)
                    .json_body(json!({"id": 5, "title": "t", "body": "b", "userId": 2}));
            })
            .await;

        let post = Post {
            id: 5,
            title: "t".into(),
            body: "b".into(),
            user_id: 2,
        };
        let updated = api(&server).update_post(&post).await.expect("updated");

        mock.assert_async().await;
        assert_eq!(updated, post);
    }

    #[tokio::test]
    async fn delete_accepts_empty_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("DELETE").path("/posts/3");
                then.status(200).body("");
            })
            .await;

        api(&server).delete_post(3).await.expect("deleted");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_maps_to_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/posts/999");
                then.status(404).json_body(json!({}));
            })
            .await;

        let err = api(&server).get_post(999).await.expect_err("missing");
        assert_eq!(err, ResourceError::NotFound);
    }

    #[tokio::test]
    async fn server_errors_map_to_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/users");
                then.status(503);
            })
            .await;

        let err = api(&server).list_users().await.expect_err("unavailable");
        assert_eq!(err, ResourceError::ServerUnavailable);
    }

    #[tokio::test]
    async fn other_statuses_map_to_unknown() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/users/1");
                then.status(403);
            })
            .await;

        let err = api(&server).get_user(1).await.expect_err("forbidden");
        assert!(matches!(err, ResourceError::Unknown { ref message } if message.contains("403")));
    }

    #[tokio::test]
    async fn slow_responses_map_to_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/posts");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!([]));
            })
            .await;

        let err = api_with_timeout(&server, Duration::from_millis(50))
            .list_posts()
            .await
            .expect_err("timeout");
        assert_eq!(err, ResourceError::Timeout);
    }

    #[tokio::test]
    async fn undecodable_body_maps_to_unknown() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/posts/1");
                then.status(200).body("<html>");
            })
            .await;

        let err = api(&server).get_post(1).await.expect_err("bad body");
        assert!(matches!(err, ResourceError::Unknown { .. }));
    }

    #[test]
    fn base_url_keeps_path_prefix() {
        let base = with_trailing_slash(Url::parse("https://example.com/api/v1").expect("url"));
        assert_eq!(
            base.join("posts/1").expect("join").as_str(),
            "https://example.com/api/v1/posts/1"
        );
    }
}
