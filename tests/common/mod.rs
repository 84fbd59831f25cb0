#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use watch_progress::{
    error::{AppError, AppResult},
    models::{
        EpisodeEntry, EpisodeProgress, EpisodeRef, MovieProgress, ProgressOverview, SeasonEntry,
        Title, TvProgress, TvShowProgress,
    },
    services::{CatalogService, MutationCoordinator, OverviewRepository, ProgressStore},
};

pub const SHOW: &str = "tt0944947";
pub const MOVIE: &str = "tt0111161";

/// In-memory catalog: season number to episode count
#[derive(Default)]
pub struct FakeCatalog {
    pub seasons: BTreeMap<u32, u32>,
    pub fail_seasons: bool,
    pub failing_episode_listings: BTreeSet<u32>,
}

impl FakeCatalog {
    pub fn with_layout(layout: &[u32]) -> Self {
        Self {
            seasons: layout
                .iter()
                .enumerate()
                .map(|(index, count)| (index as u32 + 1, *count))
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn list_seasons(&self, _imdb_id: &str) -> AppResult<Vec<SeasonEntry>> {
        if self.fail_seasons {
            return Err(AppError::ExternalApi("catalog unavailable".to_string()));
        }
        Ok(self
            .seasons
            .keys()
            .map(|season_number| SeasonEntry {
                season_number: *season_number,
            })
            .collect())
    }

    async fn list_episodes(
        &self,
        _imdb_id: &str,
        season_number: u32,
    ) -> AppResult<Vec<EpisodeEntry>> {
        if self.failing_episode_listings.contains(&season_number) {
            return Err(AppError::ExternalApi(format!(
                "season {season_number} unavailable"
            )));
        }
        let count = self.seasons.get(&season_number).copied().unwrap_or(0);
        Ok((1..=count)
            .map(|episode_number| EpisodeEntry { episode_number })
            .collect())
    }
}

/// One write the store accepted
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedWrite {
    Episode(EpisodeRef, bool),
    Batch(Vec<EpisodeRef>, bool),
    Movie(bool),
}

/// Holds a write in flight until released
pub struct WriteGate {
    pub entered: Notify,
    pub release: Notify,
}

/// In-memory progress backend holding server truth for one show and one movie
pub struct FakeStore {
    pub layout: Vec<u32>,
    pub episodes: Mutex<BTreeMap<EpisodeRef, bool>>,
    pub movie_watched: Mutex<Option<bool>>,
    pub writes: Mutex<Vec<RecordedWrite>>,
    pub gate: Option<Arc<WriteGate>>,
    pub read_gate: Option<Arc<WriteGate>>,
    /// Arms `read_gate` for the next `read_tv` only
    pub gate_next_read: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl FakeStore {
    pub fn new(layout: &[u32]) -> Self {
        Self {
            layout: layout.to_vec(),
            episodes: Mutex::new(BTreeMap::new()),
            movie_watched: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            gate: None,
            read_gate: None,
            gate_next_read: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn gated(layout: &[u32]) -> (Self, Arc<WriteGate>) {
        let gate = Arc::new(WriteGate {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let mut store = Self::new(layout);
        store.gate = Some(Arc::clone(&gate));
        (store, gate)
    }

    /// Adds a gate that holds one armed `read_tv` after it has read server truth
    pub fn with_read_gate(mut self) -> (Self, Arc<WriteGate>) {
        let gate = Arc::new(WriteGate {
            entered: Notify::new(),
            release: Notify::new(),
        });
        self.read_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn with_watched(self, watched: &[(u32, u32)]) -> Self {
        {
            let mut episodes = self.episodes.lock().unwrap();
            for (season, episode) in watched {
                episodes.insert(EpisodeRef::new(*season, *episode), true);
            }
        }
        self
    }

    pub fn server_watched(&self, episode: EpisodeRef) -> bool {
        self.episodes
            .lock()
            .unwrap()
            .get(&episode)
            .copied()
            .unwrap_or(false)
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }

    fn check_write(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(AppError::ExternalApi("write rejected".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_read(&self) -> AppResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(AppError::ExternalApi("read timed out".to_string()))
        } else {
            Ok(())
        }
    }

    fn show_progress(&self) -> TvShowProgress {
        let episodes = self.episodes.lock().unwrap();
        let watched = episodes.values().filter(|w| **w).count() as u32;
        let total = self.layout.iter().sum();
        TvShowProgress {
            imdb_id: SHOW.to_string(),
            watched_episodes: watched,
            total_episodes: total,
            is_fully_watched: total > 0 && watched >= total,
            episodes_per_season: self.layout.clone(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ProgressStore for FakeStore {
    async fn read_all(&self) -> AppResult<ProgressOverview> {
        self.check_read()?;
        let movie_watched = *self.movie_watched.lock().unwrap();
        let movies = movie_watched
            .map(|is_watched| MovieProgress {
                imdb_id: MOVIE.to_string(),
                is_watched,
                updated_at: None,
            })
            .into_iter()
            .collect();

        Ok(ProgressOverview {
            movies,
            tv_shows: vec![self.show_progress()],
            episodes: Vec::new(),
        })
    }

    async fn read_tv(&self, imdb_id: &str) -> AppResult<TvProgress> {
        self.check_read()?;
        let episodes = self
            .episodes
            .lock()
            .unwrap()
            .iter()
            .map(|(episode, watched)| EpisodeProgress::new(imdb_id, *episode, *watched))
            .collect();

        let progress = TvProgress {
            episodes,
            tv_show_progress: Some(self.show_progress()),
        };

        if self.gate_next_read.swap(false, Ordering::SeqCst) {
            if let Some(gate) = &self.read_gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
        }

        Ok(progress)
    }

    async fn write_episode(
        &self,
        _imdb_id: &str,
        episode: EpisodeRef,
        is_watched: bool,
    ) -> AppResult<()> {
        self.pass_gate().await;
        self.check_write()?;
        self.episodes.lock().unwrap().insert(episode, is_watched);
        self.writes
            .lock()
            .unwrap()
            .push(RecordedWrite::Episode(episode, is_watched));
        Ok(())
    }

    async fn write_episodes_batch(
        &self,
        _imdb_id: &str,
        episodes: &[EpisodeRef],
        is_watched: bool,
    ) -> AppResult<()> {
        self.pass_gate().await;
        self.check_write()?;
        {
            let mut server = self.episodes.lock().unwrap();
            for episode in episodes {
                server.insert(*episode, is_watched);
            }
        }
        self.writes
            .lock()
            .unwrap()
            .push(RecordedWrite::Batch(episodes.to_vec(), is_watched));
        Ok(())
    }

    async fn write_movie(&self, _imdb_id: &str, is_watched: bool) -> AppResult<()> {
        self.pass_gate().await;
        self.check_write()?;
        *self.movie_watched.lock().unwrap() = Some(is_watched);
        self.writes
            .lock()
            .unwrap()
            .push(RecordedWrite::Movie(is_watched));
        Ok(())
    }
}

pub fn show_view(catalog: FakeCatalog, store: Arc<FakeStore>) -> MutationCoordinator {
    view(Title::tv(SHOW).unwrap(), catalog, store)
}

pub fn movie_view(store: Arc<FakeStore>) -> MutationCoordinator {
    view(Title::movie(MOVIE).unwrap(), FakeCatalog::default(), store)
}

fn view(title: Title, catalog: FakeCatalog, store: Arc<FakeStore>) -> MutationCoordinator {
    let store: Arc<dyn ProgressStore> = store;
    let overview = OverviewRepository::new(Arc::clone(&store));
    MutationCoordinator::new(title, Arc::new(catalog), store, overview)
}
