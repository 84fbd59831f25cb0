use std::collections::BTreeMap;
use std::fmt::Display;

use crate::models::{EpisodeProgress, EpisodeRef};

/// Key of one cache entry, rendered as `"{season}-{episode}"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(pub EpisodeRef);

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.cache_key())
    }
}

/// Locally-optimistic watched flags for one show, owned by one title view
///
/// `seed` replaces everything with server truth, `set_local` writes ahead of
/// (or on) server confirmation, and `get` reads with `false` for unknown keys.
/// Nothing here persists beyond the owning view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimisticProgressCache {
    imdb_id: String,
    entries: BTreeMap<CacheKey, bool>,
}

impl OptimisticProgressCache {
    pub fn new(imdb_id: impl Into<String>) -> Self {
        Self {
            imdb_id: imdb_id.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Full overwrite with the server's records for this show
    ///
    /// Records belonging to another title are skipped.
    pub fn seed(&mut self, records: &[EpisodeProgress]) {
        let mut entries = BTreeMap::new();
        let mut foreign = 0usize;

        for record in records {
            if record.imdb_id != self.imdb_id {
                foreign += 1;
                continue;
            }
            entries.insert(CacheKey(record.episode()), record.is_watched);
        }

        if foreign > 0 {
            tracing::warn!(
                imdb_id = %self.imdb_id,
                skipped = foreign,
                "Seed contained records for other titles"
            );
        }

        self.entries = entries;
    }

    pub fn set_local(&mut self, episode: EpisodeRef, watched: bool) {
        self.entries.insert(CacheKey(episode), watched);
    }

    pub fn set_local_many<'a, I>(&mut self, episodes: I, watched: bool)
    where
        I: IntoIterator<Item = &'a EpisodeRef>,
    {
        for episode in episodes {
            self.set_local(*episode, watched);
        }
    }

    pub fn get(&self, episode: EpisodeRef) -> bool {
        self.entries
            .get(&CacheKey(episode))
            .copied()
            .unwrap_or(false)
    }

    /// Current view as progress records, suitable for the aggregator
    pub fn snapshot(&self) -> Vec<EpisodeProgress> {
        self.entries
            .iter()
            .map(|(key, watched)| EpisodeProgress::new(self.imdb_id.clone(), key.0, *watched))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW: &str = "tt0944947";

    fn record(season: u32, episode: u32, watched: bool) -> EpisodeProgress {
        EpisodeProgress::new(SHOW, EpisodeRef::new(season, episode), watched)
    }

    #[test]
    fn test_cache_key_display() {
        assert_eq!(format!("{}", CacheKey(EpisodeRef::new(3, 12))), "3-12");
    }

    #[test]
    fn test_get_defaults_to_unwatched() {
        let cache = OptimisticProgressCache::new(SHOW);
        assert!(!cache.get(EpisodeRef::new(1, 1)));
    }

    #[test]
    fn test_seed_is_full_overwrite() {
        let mut cache = OptimisticProgressCache::new(SHOW);
        cache.set_local(EpisodeRef::new(1, 5), true);
        cache.set_local(EpisodeRef::new(1, 6), true);

        cache.seed(&[record(1, 1, true), record(1, 6, false)]);

        assert!(cache.get(EpisodeRef::new(1, 1)));
        assert!(!cache.get(EpisodeRef::new(1, 5)));
        assert!(!cache.get(EpisodeRef::new(1, 6)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_seed_converges_after_optimistic_writes() {
        let server = vec![record(1, 1, true), record(1, 2, true), record(2, 1, false)];

        let mut cache = OptimisticProgressCache::new(SHOW);
        cache.seed(&server);
        cache.set_local(EpisodeRef::new(1, 2), false);
        cache.set_local_many(&[EpisodeRef::new(2, 1), EpisodeRef::new(2, 2)], true);
        cache.seed(&server);

        let mut expected = OptimisticProgressCache::new(SHOW);
        expected.seed(&server);
        assert_eq!(cache, expected);
        assert_eq!(cache.snapshot(), server);
    }

    #[test]
    fn test_seed_skips_other_titles() {
        let mut cache = OptimisticProgressCache::new(SHOW);
        cache.seed(&[
            record(1, 1, true),
            EpisodeProgress::new("tt0903747", EpisodeRef::new(1, 2), true),
        ]);
        assert_eq!(cache.len(), 1);
        assert!(!cache.get(EpisodeRef::new(1, 2)));
    }

    #[test]
    fn test_snapshot_is_season_major() {
        let mut cache = OptimisticProgressCache::new(SHOW);
        cache.set_local(EpisodeRef::new(2, 1), true);
        cache.set_local(EpisodeRef::new(1, 10), true);
        cache.set_local(EpisodeRef::new(1, 2), false);

        let order: Vec<EpisodeRef> = cache.snapshot().iter().map(|r| r.episode()).collect();
        assert_eq!(
            order,
            vec![
                EpisodeRef::new(1, 2),
                EpisodeRef::new(1, 10),
                EpisodeRef::new(2, 1)
            ]
        );
    }
}
