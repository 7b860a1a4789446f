use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::application::ports::{IdentityError, IdentityVerifier};
use crate::domain::UserId;

/// Checks bearer tokens issued by the external auth provider (HS256 shared
/// secret). The `sub` claim becomes the owner identity; nothing else about
/// the account is interpreted here.
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, IdentityError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        Ok(UserId::new(data.claims.sub))
    }
}
