use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::Instrument;

use crate::{
    error::{AppError, AppResult},
    models::{
        EpisodeRef, MovieProgress, SeasonProgressSummary, ShowProgressSummary, Title, TvProgress,
    },
    services::{
        aggregator,
        catalog::CatalogService,
        enumerator::{EpisodeEnumerator, ShowEpisodes},
        optimistic_cache::OptimisticProgressCache,
        overview::OverviewRepository,
        progress_store::ProgressStore,
    },
    telemetry::{mutation_span, MutationId},
};

/// What happened to a requested mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    /// The server confirmed the write for `episodes` units (1 for a movie)
    Applied {
        episodes: usize,
        /// The follow-up refetch failed; summaries may lag until the next refresh
        #[serde(rename = "aggregateStale")]
        aggregate_stale: bool,
    },
    /// Another mutation was in flight for this title
    Dropped,
    /// The view was unmounted; the server result was not applied locally
    Discarded,
}

/// Lifecycle of one title view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Mutating,
}

/// Everything the view renders from, guarded together
#[derive(Debug)]
struct ViewData {
    cache: OptimisticProgressCache,
    episodes_per_season: Vec<u32>,
    movie: Option<MovieProgress>,
    aggregate_stale: bool,
}

/// Clears the busy flag when the mutation ends, whatever the exit path
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Serializes progress mutations for one title view
///
/// Owns the view's [`OptimisticProgressCache`]. At most one mutation runs at a
/// time; a request made while busy is dropped, not queued. Each mutation
/// writes optimistically, sends one network write, confirms locally, then
/// reconciles against the server and refetches the shared overview.
pub struct MutationCoordinator {
    title: Title,
    store: Arc<dyn ProgressStore>,
    enumerator: EpisodeEnumerator,
    overview: OverviewRepository,
    data: RwLock<ViewData>,
    busy: AtomicBool,
    mounted: AtomicBool,
    /// Bumped when a mutation starts; lets an outside refresh detect it raced one
    generation: AtomicU64,
}

impl MutationCoordinator {
    pub fn new(
        title: Title,
        catalog: Arc<dyn CatalogService>,
        store: Arc<dyn ProgressStore>,
        overview: OverviewRepository,
    ) -> Self {
        Self {
            data: RwLock::new(ViewData {
                cache: OptimisticProgressCache::new(title.imdb_id.clone()),
                episodes_per_season: Vec::new(),
                movie: None,
                aggregate_stale: false,
            }),
            title,
            store,
            enumerator: EpisodeEnumerator::new(catalog),
            overview,
            busy: AtomicBool::new(false),
            mounted: AtomicBool::new(true),
            generation: AtomicU64::new(0),
        }
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn state(&self) -> ViewState {
        if self.is_busy() {
            ViewState::Mutating
        } else {
            ViewState::Idle
        }
    }

    /// UI controls should be disabled while this is true
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| {
                self.generation.fetch_add(1, Ordering::AcqRel);
                BusyGuard(&self.busy)
            })
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Seeds the view from the server; called once on mount
    ///
    /// Skipped while a mutation is in flight, like [`refresh`](Self::refresh).
    pub async fn load(&self) -> AppResult<()> {
        if self.seed_from_server().await? {
            let data = self.data.read().await;
            tracing::info!(
                imdb_id = %self.title,
                records = data.cache.len(),
                seasons = data.episodes_per_season.len(),
                "Title view seeded"
            );
        }
        Ok(())
    }

    /// Reconciles with the server outside of a mutation
    ///
    /// Returns `false` when skipped because a mutation is (or became) in
    /// flight, leaving the optimistic display untouched.
    pub async fn refresh(&self) -> AppResult<bool> {
        self.seed_from_server().await
    }

    /// Discards the view; any in-flight result is dropped on arrival
    pub async fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
        let mut data = self.data.write().await;
        data.cache.clear();
        data.episodes_per_season.clear();
        data.movie = None;
    }

    /// True when no mutation started since `generation` was read
    ///
    /// Callers hold the data write lock, so a mutation beginning afterwards
    /// cannot apply its optimistic write until the seed is done.
    fn can_seed(&self, generation: u64) -> bool {
        !self.is_busy()
            && self.generation.load(Ordering::Acquire) == generation
            && self.is_mounted()
    }

    async fn seed_from_server(&self) -> AppResult<bool> {
        if self.is_busy() || !self.is_mounted() {
            tracing::debug!(imdb_id = %self.title, "Seed skipped while mutating");
            return Ok(false);
        }

        let generation = self.generation.load(Ordering::Acquire);

        if self.title.is_tv() {
            let tv = self.store.read_tv(&self.title.imdb_id).await?;
            let mut data = self.data.write().await;
            if !self.can_seed(generation) {
                tracing::debug!(imdb_id = %self.title, "Seed raced a mutation, result dropped");
                return Ok(false);
            }
            apply_tv_progress(&mut data, &tv);
            data.aggregate_stale = false;
        } else {
            self.overview.refetch().await?;
            let movie = self.overview.movie(&self.title.imdb_id).await;
            let mut data = self.data.write().await;
            if !self.can_seed(generation) {
                tracing::debug!(imdb_id = %self.title, "Seed raced a mutation, result dropped");
                return Ok(false);
            }
            data.movie = movie;
            data.aggregate_stale = false;
        }

        Ok(true)
    }

    /// Post-write reconciliation; returns true when anything failed to refetch
    async fn reconcile(&self) -> bool {
        let mut stale = false;

        if self.title.is_tv() {
            match self.store.read_tv(&self.title.imdb_id).await {
                Ok(tv) if self.is_mounted() => {
                    apply_tv_progress(&mut *self.data.write().await, &tv);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Progress refetch failed, summaries may be stale");
                    stale = true;
                }
            }
        }

        match self.overview.refetch().await {
            Ok(overview) => {
                if !self.title.is_tv() && self.is_mounted() {
                    let movie = overview
                        .movies
                        .into_iter()
                        .find(|m| m.imdb_id == self.title.imdb_id);
                    self.data.write().await.movie = movie;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Overview refetch failed, list screens may be stale");
                stale = true;
            }
        }

        if self.is_mounted() {
            self.data.write().await.aggregate_stale = stale;
        }
        stale
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Watched flag as the UI should display it right now
    pub async fn is_watched(&self, episode: EpisodeRef) -> bool {
        self.data.read().await.cache.get(episode)
    }

    pub async fn episodes_per_season(&self) -> Vec<u32> {
        self.data.read().await.episodes_per_season.clone()
    }

    pub async fn season_summaries(&self) -> BTreeMap<u32, SeasonProgressSummary> {
        let data = self.data.read().await;
        aggregator::summarize_seasons(&data.cache.snapshot(), &data.episodes_per_season)
    }

    pub async fn season_summary(&self, season_number: u32) -> Option<SeasonProgressSummary> {
        self.season_summaries().await.remove(&season_number)
    }

    pub async fn show_summary(&self) -> ShowProgressSummary {
        let data = self.data.read().await;
        aggregator::summarize_show(&data.cache.snapshot(), &data.episodes_per_season)
    }

    pub async fn movie_is_watched(&self) -> bool {
        aggregator::movie_is_watched(self.data.read().await.movie.as_ref())
    }

    pub async fn is_aggregate_stale(&self) -> bool {
        self.data.read().await.aggregate_stale
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    fn require_tv(&self) -> AppResult<()> {
        if self.title.is_tv() {
            Ok(())
        } else {
            Err(AppError::InvalidInput(format!(
                "{} is a movie and has no episodes",
                self.title
            )))
        }
    }

    fn require_movie(&self) -> AppResult<()> {
        if self.title.is_tv() {
            Err(AppError::InvalidInput(format!(
                "{} is a TV show, mark its episodes instead",
                self.title
            )))
        } else {
            Ok(())
        }
    }

    /// Flips one episode's watched flag
    pub async fn toggle_episode(&self, episode: EpisodeRef) -> AppResult<MutationOutcome> {
        self.require_tv()?;
        let episode = EpisodeRef::try_new(episode.season_number, episode.episode_number)?;

        let Some(_guard) = self.try_begin() else {
            tracing::debug!(imdb_id = %self.title, episode = %episode, "Toggle dropped, mutation in flight");
            return Ok(MutationOutcome::Dropped);
        };

        let span = mutation_span(MutationId::new(), &self.title.imdb_id, "toggle_episode");
        async {
            let watched = !self.data.read().await.cache.get(episode);
            let write = || {
                self.store
                    .write_episode(&self.title.imdb_id, episode, watched)
            };

            self.drive(
                |data: &mut ViewData| data.cache.set_local(episode, watched),
                write,
                1,
            )
            .await
        }
        .instrument(span)
        .await
    }

    /// Marks everything up to and including `up_to` as `watched`
    ///
    /// Covers every episode of every earlier season plus the target season's
    /// episodes numbered `<= up_to.episode_number`, sent as one batch.
    pub async fn mark_range(
        &self,
        up_to: EpisodeRef,
        watched: bool,
    ) -> AppResult<MutationOutcome> {
        self.require_tv()?;
        let up_to = EpisodeRef::try_new(up_to.season_number, up_to.episode_number)?;

        let Some(_guard) = self.try_begin() else {
            tracing::debug!(imdb_id = %self.title, up_to = %up_to, "Range mark dropped, mutation in flight");
            return Ok(MutationOutcome::Dropped);
        };

        let span = mutation_span(MutationId::new(), &self.title.imdb_id, "mark_range");
        async {
            let show = self.enumerator.enumerate(&self.title.imdb_id).await;
            if show.is_empty() {
                return Err(AppError::NothingToMark(self.title.imdb_id.clone()));
            }

            let layout = self.episodes_per_season().await;
            if !show.failed_seasons.is_empty() {
                tracing::warn!(
                    failed_seasons = ?show.failed_seasons,
                    listed_seasons = show.seasons.len(),
                    layout_seasons = layout.len(),
                    "Filling unlisted seasons from the season layout"
                );
            }
            let targets = range_targets(&show, &layout, up_to);
            if targets.is_empty() {
                return Err(AppError::NothingToMark(self.title.imdb_id.clone()));
            }

            tracing::info!(up_to = %up_to, episodes = targets.len(), watched, "Marking range");

            let write = || {
                self.store
                    .write_episodes_batch(&self.title.imdb_id, &targets, watched)
            };

            self.drive(
                |data: &mut ViewData| data.cache.set_local_many(&targets, watched),
                write,
                targets.len(),
            )
            .await
        }
        .instrument(span)
        .await
    }

    /// Marks every known episode of the show as `watched`
    pub async fn toggle_show_fully_watched(&self, watched: bool) -> AppResult<MutationOutcome> {
        self.require_tv()?;

        let Some(_guard) = self.try_begin() else {
            tracing::debug!(imdb_id = %self.title, "Show mark dropped, mutation in flight");
            return Ok(MutationOutcome::Dropped);
        };

        let span = mutation_span(
            MutationId::new(),
            &self.title.imdb_id,
            "toggle_show_fully_watched",
        );
        async {
            let show = self.enumerator.enumerate(&self.title.imdb_id).await;
            if show.is_empty() {
                return Err(AppError::NothingToMark(self.title.imdb_id.clone()));
            }

            let layout = self.episodes_per_season().await;
            if !show.failed_seasons.is_empty() {
                tracing::warn!(
                    failed_seasons = ?show.failed_seasons,
                    listed_seasons = show.seasons.len(),
                    layout_seasons = layout.len(),
                    "Filling unlisted seasons from the season layout"
                );
            }
            let targets = all_targets(&show, &layout);

            tracing::info!(episodes = targets.len(), watched, "Marking whole show");

            let write = || {
                self.store
                    .write_episodes_batch(&self.title.imdb_id, &targets, watched)
            };

            self.drive(
                |data: &mut ViewData| data.cache.set_local_many(&targets, watched),
                write,
                targets.len(),
            )
            .await
        }
        .instrument(span)
        .await
    }

    /// Sets a movie's watched flag
    pub async fn toggle_movie(&self, watched: bool) -> AppResult<MutationOutcome> {
        self.require_movie()?;

        let Some(_guard) = self.try_begin() else {
            tracing::debug!(imdb_id = %self.title, "Movie toggle dropped, mutation in flight");
            return Ok(MutationOutcome::Dropped);
        };

        let span = mutation_span(MutationId::new(), &self.title.imdb_id, "toggle_movie");
        async {
            let imdb_id = self.title.imdb_id.clone();
            let write = || self.store.write_movie(&self.title.imdb_id, watched);

            self.drive(
                move |data: &mut ViewData| {
                    data.movie = Some(MovieProgress {
                        imdb_id: imdb_id.clone(),
                        is_watched: watched,
                        updated_at: Some(Utc::now()),
                    })
                },
                write,
                1,
            )
            .await
        }
        .instrument(span)
        .await
    }

    /// Optimistic apply, network write, confirm, reconcile
    ///
    /// `apply` runs before the write and again once the server confirms. A
    /// failed write is not rolled back; one reconciliation pass is attempted
    /// so the next seed can correct the display.
    async fn drive<F, W, Fut>(
        &self,
        apply: F,
        write: W,
        affected: usize,
    ) -> AppResult<MutationOutcome>
    where
        F: Fn(&mut ViewData),
        W: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<()>>,
    {
        if !self.is_mounted() {
            return Ok(MutationOutcome::Discarded);
        }

        apply(&mut *self.data.write().await);

        let result = write().await;

        if !self.is_mounted() {
            tracing::debug!("View unmounted during write, result discarded");
            return Ok(MutationOutcome::Discarded);
        }

        match result {
            Ok(()) => {
                apply(&mut *self.data.write().await);
                let aggregate_stale = self.reconcile().await;

                tracing::info!(affected, aggregate_stale, "Progress mutation applied");

                Ok(MutationOutcome::Applied {
                    episodes: affected,
                    aggregate_stale,
                })
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    network = e.is_network(),
                    affected,
                    "Progress write failed"
                );
                self.reconcile().await;
                Err(e)
            }
        }
    }
}

/// Seeds the cache with server truth; a response without show progress keeps the known layout
fn apply_tv_progress(data: &mut ViewData, tv: &TvProgress) {
    data.cache.seed(&tv.episodes);
    if tv.tv_show_progress.is_some() {
        data.episodes_per_season = tv.episodes_per_season().to_vec();
    }
}

/// Episodes the season layout knows about for seasons the catalog could not list
fn layout_episodes(layout: &[u32]) -> impl Iterator<Item = EpisodeRef> + '_ {
    aggregator::known_episodes(layout).into_iter()
}

/// Union of enumerated and layout-known episodes at or before `up_to`
fn range_targets(show: &ShowEpisodes, layout: &[u32], up_to: EpisodeRef) -> Vec<EpisodeRef> {
    let in_range = |e: &EpisodeRef| {
        e.season_number < up_to.season_number
            || (e.season_number == up_to.season_number
                && e.episode_number <= up_to.episode_number)
    };

    show.episodes
        .iter()
        .copied()
        .chain(layout_episodes(layout))
        .filter(in_range)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Union of enumerated and layout-known episodes
fn all_targets(show: &ShowEpisodes, layout: &[u32]) -> Vec<EpisodeRef> {
    show.episodes
        .iter()
        .copied()
        .chain(layout_episodes(layout))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
