//! Progress Store client backed by the app backend's progress endpoints
use crate::{
    error::{AppError, AppResult},
    models::{
        EpisodeRef, EpisodeWriteRequest, EpisodesBatchWriteRequest, MovieWriteRequest,
        ProgressOverview, TvProgress,
    },
    services::progress_store::{ProgressStore, Session},
};
use reqwest::{Client as HttpClient, Response, StatusCode};

#[derive(Clone)]
pub struct HttpProgressStore {
    http_client: HttpClient,
    api_url: String,
    session: Session,
}

impl HttpProgressStore {
    pub fn new(http_client: HttpClient, api_url: impl Into<String>, session: Session) -> Self {
        Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/progress/{}", self.api_url, path)
    }

    /// Writes are refused locally when no session is present
    fn require_session(&self) -> AppResult<()> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(AppError::Unauthenticated)
        }
    }

    async fn check(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthenticated);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Progress store returned status {}: {}",
                status, body
            )));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl ProgressStore for HttpProgressStore {
    async fn read_all(&self) -> AppResult<ProgressOverview> {
        let request = self.session.authorize(self.http_client.get(self.url("all")));
        let response = Self::check(request.send().await?).await?;
        let overview: ProgressOverview = response.json().await?;

        tracing::debug!(
            user_id = %self.session.user_id,
            movies = overview.movies.len(),
            tv_shows = overview.tv_shows.len(),
            "Progress overview read"
        );

        Ok(overview)
    }

    async fn read_tv(&self, imdb_id: &str) -> AppResult<TvProgress> {
        let request = self.session.authorize(
            self.http_client
                .get(self.url("tv"))
                .query(&[("imdbId", imdb_id)]),
        );
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn write_episode(
        &self,
        imdb_id: &str,
        episode: EpisodeRef,
        is_watched: bool,
    ) -> AppResult<()> {
        self.require_session()?;

        let body = EpisodeWriteRequest {
            imdb_id: imdb_id.to_string(),
            season_number: episode.season_number,
            episode_number: episode.episode_number,
            is_watched,
        };
        let request = self
            .session
            .authorize(self.http_client.put(self.url("episode")).json(&body));
        Self::check(request.send().await?).await?;

        tracing::info!(
            user_id = %self.session.user_id,
            imdb_id = %imdb_id,
            episode = %episode,
            is_watched,
            "Episode progress saved"
        );

        Ok(())
    }

    async fn write_episodes_batch(
        &self,
        imdb_id: &str,
        episodes: &[EpisodeRef],
        is_watched: bool,
    ) -> AppResult<()> {
        self.require_session()?;

        let body = EpisodesBatchWriteRequest {
            imdb_id: imdb_id.to_string(),
            episodes: episodes.to_vec(),
            is_watched,
        };
        let request = self
            .session
            .authorize(self.http_client.post(self.url("mark-all-tv")).json(&body));
        Self::check(request.send().await?).await?;

        tracing::info!(
            user_id = %self.session.user_id,
            imdb_id = %imdb_id,
            episodes = episodes.len(),
            is_watched,
            "Episode batch saved"
        );

        Ok(())
    }

    async fn write_movie(&self, imdb_id: &str, is_watched: bool) -> AppResult<()> {
        self.require_session()?;

        let body = MovieWriteRequest {
            imdb_id: imdb_id.to_string(),
            is_watched,
        };
        let request = self
            .session
            .authorize(self.http_client.put(self.url("movie")).json(&body));
        Self::check(request.send().await?).await?;

        tracing::info!(
            user_id = %self.session.user_id,
            imdb_id = %imdb_id,
            is_watched,
            "Movie progress saved"
        );

        Ok(())
    }
}
