use std::collections::{BTreeMap, HashSet};

use crate::models::{
    EpisodeProgress, EpisodeRef, MovieProgress, SeasonProgressSummary, ShowProgressSummary,
};

/// Watched coordinates, duplicates and unwatched records removed
fn watched_set(episodes: &[EpisodeProgress]) -> HashSet<EpisodeRef> {
    episodes
        .iter()
        .filter(|e| e.is_watched)
        .map(EpisodeProgress::episode)
        .collect()
}

/// Builds one summary, the single place the `is_watched` rule lives
fn season_summary(season_number: u32, total_episodes: u32, watched_episodes: u32) -> SeasonProgressSummary {
    let progress = if total_episodes == 0 {
        0.0
    } else {
        f64::from(watched_episodes) / f64::from(total_episodes)
    };

    SeasonProgressSummary {
        season_number,
        total_episodes,
        watched_episodes,
        progress,
        is_watched: total_episodes > 0 && watched_episodes >= total_episodes,
    }
}

/// Derives per-season progress from raw episode records
///
/// Season `n` takes its total from `episodes_per_season[n - 1]`. Only distinct
/// watched episodes numbered `1..=total` are counted, so `watched_episodes`
/// never exceeds `total_episodes`.
pub fn summarize_seasons(
    episodes: &[EpisodeProgress],
    episodes_per_season: &[u32],
) -> BTreeMap<u32, SeasonProgressSummary> {
    let watched = watched_set(episodes);

    episodes_per_season
        .iter()
        .enumerate()
        .map(|(index, total)| {
            let season_number = index as u32 + 1;
            let watched_episodes = watched
                .iter()
                .filter(|e| {
                    e.season_number == season_number
                        && e.episode_number >= 1
                        && e.episode_number <= *total
                })
                .count() as u32;
            (
                season_number,
                season_summary(season_number, *total, watched_episodes),
            )
        })
        .collect()
}

/// Every episode the season layout says exists
pub fn known_episodes(episodes_per_season: &[u32]) -> Vec<EpisodeRef> {
    episodes_per_season
        .iter()
        .enumerate()
        .flat_map(|(index, total)| {
            let season_number = index as u32 + 1;
            (1..=*total).map(move |n| EpisodeRef::new(season_number, n))
        })
        .collect()
}

/// True iff at least one episode is known and every known episode is watched
///
/// Seasons with an unknown (zero) episode count add nothing to `known`, so
/// they can neither complete nor block the show.
pub fn is_fully_watched(episodes: &[EpisodeProgress], known: &[EpisodeRef]) -> bool {
    if known.is_empty() {
        return false;
    }
    let watched = watched_set(episodes);
    known.iter().all(|e| watched.contains(e))
}

/// Show-level reduction over the season layout
pub fn summarize_show(
    episodes: &[EpisodeProgress],
    episodes_per_season: &[u32],
) -> ShowProgressSummary {
    let seasons = summarize_seasons(episodes, episodes_per_season);
    let known = known_episodes(episodes_per_season);
    let watched = watched_set(episodes);

    let last_watched = known.iter().rev().find(|e| watched.contains(e)).copied();

    ShowProgressSummary {
        total_seasons: seasons.len() as u32,
        total_episodes: seasons.values().map(|s| s.total_episodes).sum(),
        watched_episodes: seasons.values().map(|s| s.watched_episodes).sum(),
        last_watched,
        is_fully_watched: is_fully_watched(episodes, &known),
    }
}

/// Movies have no sub-structure; a missing record means unwatched
pub fn movie_is_watched(progress: Option<&MovieProgress>) -> bool {
    progress.map(|p| p.is_watched).unwrap_or(false)
}
