use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripError {
    /// The store failed for a reason other than the key being absent, or
    /// returned something that is not a list of identifiers.
    #[error("failed to read preference {key}")]
    StoreRead {
        key: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A section write or the final synchronize failed. Which one is not
    /// reported; earlier sections may already be written.
    #[error("failed to save control strip preferences")]
    Persistence,
}
