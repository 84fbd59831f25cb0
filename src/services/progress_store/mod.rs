//! Progress Store abstraction
//!
//! The server of record for watched state. Every store instance is bound to
//! one signed-in user through its [`Session`], so reads and writes are implicitly
//! scoped to that user.
use reqwest::{header::COOKIE, RequestBuilder};

use crate::{
    error::AppResult,
    models::{EpisodeRef, ProgressOverview, TvProgress},
};

pub mod http;

pub use http::HttpProgressStore;

/// Authenticated session supplied by the auth subsystem
#[derive(Clone)]
pub struct Session {
    pub user_id: String,
    cookie: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, cookie: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            cookie: cookie.filter(|c| !c.trim().is_empty()),
        }
    }

    pub fn anonymous() -> Self {
        Self::new("anonymous", None)
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.cookie.is_some()
    }

    /// Attaches the session cookie to an outgoing backend request, when there is one
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.cookie() {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProgressStore: Send + Sync {
    /// Everything the user has progress for, used by list screens
    async fn read_all(&self) -> AppResult<ProgressOverview>;

    /// Episode records and season layout of one show
    async fn read_tv(&self, imdb_id: &str) -> AppResult<TvProgress>;

    async fn write_episode(
        &self,
        imdb_id: &str,
        episode: EpisodeRef,
        is_watched: bool,
    ) -> AppResult<()>;

    /// Sets every listed episode to `is_watched` in one request
    async fn write_episodes_batch(
        &self,
        imdb_id: &str,
        episodes: &[EpisodeRef],
        is_watched: bool,
    ) -> AppResult<()>;

    async fn write_movie(&self, imdb_id: &str, is_watched: bool) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_cookie_is_unauthenticated() {
        assert!(!Session::new("u1", Some("  ".to_string())).is_authenticated());
        assert!(!Session::anonymous().is_authenticated());
        assert!(Session::new("u1", Some("session=abc".to_string())).is_authenticated());
    }

    #[test]
    fn test_authorize_attaches_cookie_only_with_session() {
        let client = reqwest::Client::new();

        let session = Session::new("u1", Some("session=abc".to_string()));
        let request = session
            .authorize(client.get("http://test.local/"))
            .build()
            .unwrap();
        assert_eq!(request.headers().get(COOKIE).unwrap(), "session=abc");

        let request = Session::anonymous()
            .authorize(client.get("http://test.local/"))
            .build()
            .unwrap();
        assert!(request.headers().get(COOKIE).is_none());
    }

    #[test]
    fn test_debug_redacts_cookie() {
        let session = Session::new("u1", Some("session=secret".to_string()));
        let printed = format!("{:?}", session);
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("secret"));
    }
}
