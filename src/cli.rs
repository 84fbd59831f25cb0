use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::{
    config::Config,
    models::{EpisodeRef, SeasonProgressSummary, ShowProgressSummary, Title, TvShowProgress},
    services::{
        CatalogService, HttpCatalogService, HttpProgressStore, MutationCoordinator,
        MutationOutcome, OverviewRepository, ProgressStore, Session,
    },
};

#[derive(Parser, Debug)]
#[command(name = "watch-progress", about = "Track and reconcile watch progress")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print season and show progress for a TV title
    Show { imdb_id: String },
    /// Flip one episode's watched flag
    ToggleEpisode {
        imdb_id: String,
        #[arg(long)]
        season: u32,
        #[arg(long)]
        episode: u32,
    },
    /// Mark every episode up to and including the given one
    MarkRange {
        imdb_id: String,
        #[arg(long)]
        season: u32,
        #[arg(long)]
        episode: u32,
        /// Clear the range instead of marking it watched
        #[arg(long)]
        unwatched: bool,
    },
    /// Mark (or with --unwatched, clear) a whole show
    MarkShow {
        imdb_id: String,
        #[arg(long)]
        unwatched: bool,
    },
    /// Set a movie's watched flag
    ToggleMovie {
        imdb_id: String,
        #[arg(long)]
        unwatched: bool,
    },
    /// Print the progress overview for the session's user
    Overview {
        /// Only shows that are started but not finished
        #[arg(long)]
        in_progress: bool,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowReport {
    pub imdb_id: String,
    pub seasons: Vec<SeasonProgressSummary>,
    pub show: ShowProgressSummary,
    /// The server's aggregate for the show, as list screens display it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listed: Option<TvShowProgress>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationReport {
    pub imdb_id: String,
    #[serde(flatten)]
    pub outcome: MutationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<ShowProgressSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_watched: Option<bool>,
}

/// Backend clients shared by every command
pub struct Backend {
    catalog: Arc<dyn CatalogService>,
    store: Arc<dyn ProgressStore>,
    overview: OverviewRepository,
}

impl Backend {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http_client = config.http_client()?;
        let session = Session::new(config.user_id.clone(), config.session_cookie.clone());

        let catalog: Arc<dyn CatalogService> = Arc::new(HttpCatalogService::new(
            http_client.clone(),
            config.backend_base_url.clone(),
            session.clone(),
        ));
        let store: Arc<dyn ProgressStore> = Arc::new(HttpProgressStore::new(
            http_client,
            config.backend_base_url.clone(),
            session,
        ));

        Ok(Self::new(catalog, store))
    }

    pub fn new(catalog: Arc<dyn CatalogService>, store: Arc<dyn ProgressStore>) -> Self {
        let overview = OverviewRepository::new(Arc::clone(&store));
        Self {
            catalog,
            store,
            overview,
        }
    }

    async fn view(&self, title: Title) -> anyhow::Result<MutationCoordinator> {
        let view = MutationCoordinator::new(
            title,
            Arc::clone(&self.catalog),
            Arc::clone(&self.store),
            self.overview.clone(),
        );
        view.load().await?;
        Ok(view)
    }
}

async fn show_report(view: &MutationCoordinator, listed: Option<TvShowProgress>) -> ShowReport {
    ShowReport {
        imdb_id: view.title().imdb_id.clone(),
        seasons: view.season_summaries().await.into_values().collect(),
        show: view.show_summary().await,
        listed,
    }
}

async fn mutation_report(
    view: &MutationCoordinator,
    outcome: MutationOutcome,
) -> MutationReport {
    let (show, movie_watched) = if view.title().is_tv() {
        (Some(view.show_summary().await), None)
    } else {
        (None, Some(view.movie_is_watched().await))
    };

    MutationReport {
        imdb_id: view.title().imdb_id.clone(),
        outcome,
        show,
        movie_watched,
    }
}

impl Command {
    /// Runs the command and returns its JSON output
    pub async fn run(self, backend: &Backend) -> anyhow::Result<serde_json::Value> {
        let value = match self {
            Command::Show { imdb_id } => {
                let view = backend.view(Title::tv(imdb_id)?).await?;
                backend.overview.refetch().await?;
                let listed = backend.overview.tv_show(&view.title().imdb_id).await;
                serde_json::to_value(show_report(&view, listed).await)?
            }
            Command::ToggleEpisode {
                imdb_id,
                season,
                episode,
            } => {
                let view = backend.view(Title::tv(imdb_id)?).await?;
                let outcome = view
                    .toggle_episode(EpisodeRef::try_new(season, episode)?)
                    .await?;
                serde_json::to_value(mutation_report(&view, outcome).await)?
            }
            Command::MarkRange {
                imdb_id,
                season,
                episode,
                unwatched,
            } => {
                let view = backend.view(Title::tv(imdb_id)?).await?;
                let outcome = view
                    .mark_range(EpisodeRef::try_new(season, episode)?, !unwatched)
                    .await?;
                serde_json::to_value(mutation_report(&view, outcome).await)?
            }
            Command::MarkShow { imdb_id, unwatched } => {
                let view = backend.view(Title::tv(imdb_id)?).await?;
                let outcome = view.toggle_show_fully_watched(!unwatched).await?;
                serde_json::to_value(mutation_report(&view, outcome).await)?
            }
            Command::ToggleMovie { imdb_id, unwatched } => {
                let view = backend.view(Title::movie(imdb_id)?).await?;
                let outcome = view.toggle_movie(!unwatched).await?;
                serde_json::to_value(mutation_report(&view, outcome).await)?
            }
            Command::Overview { in_progress } => {
                let overview = backend.overview.refetch().await?;
                if in_progress {
                    let shows: Vec<TvShowProgress> = backend.overview.in_progress_shows().await;
                    serde_json::to_value(shows)?
                } else {
                    serde_json::to_value(overview)?
                }
            }
        };

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mark_range() {
        let cli = Cli::try_parse_from([
            "watch-progress",
            "mark-range",
            "tt0944947",
            "--season",
            "2",
            "--episode",
            "3",
        ])
        .unwrap();

        match cli.command {
            Command::MarkRange {
                imdb_id,
                season,
                episode,
                unwatched,
            } => {
                assert_eq!(imdb_id, "tt0944947");
                assert_eq!((season, episode), (2, 3));
                assert!(!unwatched);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_toggle_episode_requires_coordinates() {
        assert!(Cli::try_parse_from(["watch-progress", "toggle-episode", "tt0944947"]).is_err());
    }

    #[test]
    fn test_mutation_report_json_shape() {
        let report = MutationReport {
            imdb_id: "tt0000001".to_string(),
            outcome: MutationOutcome::Applied {
                episodes: 1,
                aggregate_stale: false,
            },
            show: None,
            movie_watched: Some(true),
        };

        let value = serde_json::to_value(report).unwrap();
        assert_eq!(value["outcome"], "applied");
        assert_eq!(value["episodes"], 1);
        assert_eq!(value["aggregateStale"], false);
        assert_eq!(value["movieWatched"], true);
        assert!(value.get("show").is_none());
    }

    #[test]
    fn test_show_report_includes_listed_aggregate() {
        let report = ShowReport {
            imdb_id: "tt0944947".to_string(),
            seasons: Vec::new(),
            show: ShowProgressSummary {
                total_seasons: 2,
                total_episodes: 18,
                watched_episodes: 3,
                last_watched: Some(EpisodeRef::new(2, 3)),
                is_fully_watched: false,
            },
            listed: Some(TvShowProgress {
                imdb_id: "tt0944947".to_string(),
                watched_episodes: 3,
                total_episodes: 18,
                ..Default::default()
            }),
        };

        let value = serde_json::to_value(report).unwrap();
        assert_eq!(value["listed"]["watchedEpisodes"], 3);
        assert_eq!(value["show"]["totalEpisodes"], 18);
    }
}
