mod auth;
mod helix;
mod pagination;

use crate::core::error::{AuthError, FetchError};
use crate::core::models::{Category, LiveStream, Page};
use async_trait::async_trait;

pub use auth::TokenCache;
pub use helix::HelixClient;
pub use pagination::fetch_all;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in_secs: u64,
}

/// Client-credentials exchange against the identity provider.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self) -> Result<TokenGrant, AuthError>;
}

/// One cursor-addressed page of a listing. `None` requests the first page.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page<Self::Item>, FetchError>;
}

/// Live streams filtered by category, and the categories themselves.
#[async_trait]
pub trait StreamDirectory: Send + Sync {
    async fn find_categories(&self, token: &str, name: &str)
        -> Result<Vec<Category>, FetchError>;

    async fn streams_page(
        &self,
        token: &str,
        game_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page<LiveStream>, FetchError>;
}

/// Binds a directory to one category and token so it can be walked with [`fetch_all`].
pub struct GameStreams<'a> {
    pub directory: &'a dyn StreamDirectory,
    pub token: &'a str,
    pub game_id: &'a str,
}

#[async_trait]
impl<'a> PageSource for GameStreams<'a> {
    type Item = LiveStream;

    async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page<LiveStream>, FetchError> {
        self.directory
            .streams_page(self.token, self.game_id, cursor)
            .await
    }
}
