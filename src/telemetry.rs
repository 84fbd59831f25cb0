use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "watch_progress=info";

/// Installs the global tracing subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Correlates the optimistic write, network write and reconciliation of one mutation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutationId(pub Uuid);

impl MutationId {
    /// Creates a new random mutation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MutationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Span wrapping one progress mutation
pub fn mutation_span(mutation_id: MutationId, imdb_id: &str, operation: &'static str) -> tracing::Span {
    tracing::info_span!(
        "progress_mutation",
        mutation_id = %mutation_id,
        imdb_id = %imdb_id,
        operation = operation,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_ids_are_unique() {
        assert_ne!(MutationId::new(), MutationId::new());
    }

    #[test]
    fn test_display_is_uuid() {
        let id = MutationId::new();
        assert!(Uuid::parse_str(&id.to_string()).is_ok());
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
