use crate::api::{StreamDirectory, TokenExchange, TokenGrant};
use crate::core::error::{AuthError, FetchError};
use crate::core::models::{Category, LiveStream, Page};
use crate::core::settings::TwitchSettings;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    token_type: String,
}

#[derive(Debug, Deserialize)]
struct HelixResponse<T> {
    data: Vec<T>,
    #[serde(default)]
    pagination: Option<HelixPagination>,
}

#[derive(Debug, Deserialize)]
struct HelixPagination {
    cursor: Option<String>,
}

/// Twitch Helix API client: token exchange, streams by category, category lookup.
pub struct HelixClient {
    client: reqwest::Client,
    auth_url: String,
    api_url: String,
    client_id: String,
    client_secret: String,
    page_size: u32,
}

impl HelixClient {
    pub fn new(settings: &TwitchSettings, client: reqwest::Client) -> Self {
        Self {
            client,
            auth_url: settings.auth_url.trim_end_matches('/').to_string(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            page_size: settings.page_size,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        token: &str,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<HelixResponse<T>, FetchError> {
        let url = format!("{}/helix/{}", self.api_url, endpoint);
        let response = self
            .client
            .get(&url)
            .header("Client-Id", &self.client_id)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl TokenExchange for HelixClient {
    async fn exchange(&self) -> Result<TokenGrant, AuthError> {
        let url = format!("{}/oauth2/token", self.auth_url);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
        tracing::debug!(token_type = %token.token_type, "Token exchange succeeded");

        Ok(TokenGrant {
            access_token: token.access_token,
            expires_in_secs: token.expires_in,
        })
    }
}

#[async_trait]
impl StreamDirectory for HelixClient {
    async fn find_categories(
        &self,
        token: &str,
        name: &str,
    ) -> Result<Vec<Category>, FetchError> {
        tracing::info!(name, "Looking up games by name");
        let response: HelixResponse<Category> = self
            .get(token, "games", &[("name", name.to_string())])
            .await?;
        Ok(response.data)
    }

    async fn streams_page(
        &self,
        token: &str,
        game_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page<LiveStream>, FetchError> {
        let mut query = vec![
            ("game_id", game_id.to_string()),
            ("first", self.page_size.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("after", cursor.to_string()));
        }

        let response: HelixResponse<LiveStream> = self.get(token, "streams", &query).await?;
        Ok(Page {
            items: response.data,
            next_cursor: response.pagination.and_then(|p| p.cursor),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{fetch_all, GameStreams};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HelixClient {
        let settings = TwitchSettings {
            client_id: "cid".to_string(),
            client_secret: "csecret".to_string(),
            auth_url: server.uri(),
            api_url: format!("{}/", server.uri()),
            page_size: 2,
        };
        HelixClient::new(&settings, reqwest::Client::new())
    }

    fn stream_json(id: &str, login: &str) -> serde_json::Value {
        json!({
            "id": id,
            "user_login": login,
            "user_name": login,
            "title": "title",
            "started_at": "2021-03-10T03:18:11Z",
            "language": "en",
            "tags": [],
            "thumbnail_url": "https://example/{width}x{height}.jpg",
            "is_mature": false
        })
    }

    #[tokio::test]
    async fn test_exchange_posts_form() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("client_id=cid"))
            .and(body_string_contains("client_secret=csecret"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "abc123",
                "expires_in": 5011271,
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let grant = client_for(&server).exchange().await.unwrap();
        assert_eq!(grant.access_token, "abc123");
        assert_eq!(grant.expires_in_secs, 5011271);
    }

    #[tokio::test]
    async fn test_exchange_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid client"))
            .mount(&server)
            .await;

        let err = client_for(&server).exchange().await.unwrap_err();
        assert_eq!(
            err,
            AuthError::Rejected {
                status: 400,
                body: "invalid client".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_streams_walk_all_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/helix/streams"))
            .and(query_param("after", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [stream_json("3", "c")],
                "pagination": {}
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/helix/streams"))
            .and(query_param("game_id", "509658"))
            .and(query_param("first", "2"))
            .and(header("Client-Id", "cid"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [stream_json("1", "a"), stream_json("2", "b")],
                "pagination": { "cursor": "page2" }
            })))
            .mount(&server)
            .await;

        let helix = client_for(&server);
        let source = GameStreams {
            directory: &helix,
            token: "tok",
            game_id: "509658",
        };
        let streams = fetch_all(&source).await.unwrap();

        let ids: Vec<&str> = streams.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_streams_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/helix/streams"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid OAuth token"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .streams_page("tok", "1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_streams_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/helix/streams"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"pagination\": 3}"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .streams_page("tok", "1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_find_categories() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/helix/games"))
            .and(query_param("name", "Fortnite"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "33214", "name": "Fortnite", "box_art_url": "x", "igdb_id": "1905" }]
            })))
            .mount(&server)
            .await;

        let categories = client_for(&server)
            .find_categories("tok", "Fortnite")
            .await
            .unwrap();
        assert_eq!(
            categories,
            vec![Category {
                id: "33214".to_string(),
                name: "Fortnite".to_string()
            }]
        );
    }
}
