mod jwt_verifier;

pub use jwt_verifier::JwtIdentityVerifier;
