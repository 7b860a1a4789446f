#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    /// Missing resource and ownership mismatch are deliberately conflated so a
    /// caller can never probe for conversations it does not own.
    #[error("not found")]
    NotFound,
}
