pub mod aggregator;
pub mod catalog;
pub mod coordinator;
pub mod enumerator;
pub mod optimistic_cache;
pub mod overview;
pub mod progress_store;

pub use catalog::{CatalogService, HttpCatalogService};
pub use coordinator::{MutationCoordinator, MutationOutcome, ViewState};
pub use enumerator::{EpisodeEnumerator, ShowEpisodes};
pub use optimistic_cache::{CacheKey, OptimisticProgressCache};
pub use overview::OverviewRepository;
pub use progress_store::{HttpProgressStore, ProgressStore, Session};
