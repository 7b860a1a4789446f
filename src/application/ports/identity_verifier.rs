use async_trait::async_trait;

use crate::domain::UserId;

/// Boundary to the external auth provider. We only ever check tokens it
/// issued; account management lives entirely on the provider's side.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserId, IdentityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid token: {0}")]
    InvalidToken(String),
}
