pub mod catalog;
pub mod progress;
pub mod title;

pub use catalog::{EpisodeEntry, SeasonEntry};
pub use progress::{
    EpisodeProgress, EpisodeWriteRequest, EpisodesBatchWriteRequest, MovieProgress,
    MovieWriteRequest, ProgressOverview, SeasonProgressSummary, ShowProgressSummary, TvProgress,
    TvShowProgress,
};
pub use title::{EpisodeRef, MediaType, Title};
