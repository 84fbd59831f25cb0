//! Catalog service abstraction
//!
//! Read-only access to the season and episode structure of a show. The engine
//! never writes through this interface; it only needs to know which episodes
//! exist so bulk marks cover episodes that are not rendered yet.
use crate::{
    error::AppResult,
    models::{EpisodeEntry, SeasonEntry},
};

pub mod http;

pub use http::HttpCatalogService;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// List the seasons of a show
    async fn list_seasons(&self, imdb_id: &str) -> AppResult<Vec<SeasonEntry>>;

    /// List the episodes of one season
    async fn list_episodes(&self, imdb_id: &str, season_number: u32)
        -> AppResult<Vec<EpisodeEntry>>;
}
