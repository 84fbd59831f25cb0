//! Catalog client backed by the app backend's media endpoints
use crate::{
    error::{AppError, AppResult},
    models::{
        catalog::{ApiTitleEpisodesResponse, ApiTitleSeasonsResponse},
        EpisodeEntry, SeasonEntry,
    },
    services::{catalog::CatalogService, progress_store::Session},
};
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};

#[derive(Clone)]
pub struct HttpCatalogService {
    http_client: HttpClient,
    api_url: String,
    session: Session,
}

impl HttpCatalogService {
    pub fn new(http_client: HttpClient, api_url: impl Into<String>, session: Session) -> Self {
        Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/media/{}", self.api_url, path)
    }

    /// Media endpoints sit behind the same session as progress
    fn request(&self, path: &str, query: &[(&str, String)]) -> RequestBuilder {
        self.session
            .authorize(self.http_client.get(self.url(path)).query(query))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self.request(path, query).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthenticated);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Catalog returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl CatalogService for HttpCatalogService {
    async fn list_seasons(&self, imdb_id: &str) -> AppResult<Vec<SeasonEntry>> {
        let response: ApiTitleSeasonsResponse = self
            .get_json("getTitleSeasons", &[("tt", imdb_id.to_string())])
            .await?;
        let seasons = response.into_seasons();

        tracing::debug!(imdb_id = %imdb_id, seasons = seasons.len(), "Seasons listed");

        Ok(seasons)
    }

    async fn list_episodes(
        &self,
        imdb_id: &str,
        season_number: u32,
    ) -> AppResult<Vec<EpisodeEntry>> {
        let response: ApiTitleEpisodesResponse = self
            .get_json(
                "getTitleEpisodes",
                &[
                    ("tt", imdb_id.to_string()),
                    ("seasonNumber", season_number.to_string()),
                ],
            )
            .await?;
        let episodes = response.into_episodes();

        tracing::debug!(
            imdb_id = %imdb_id,
            season = season_number,
            episodes = episodes.len(),
            "Episodes listed"
        );

        Ok(episodes)
    }
}
