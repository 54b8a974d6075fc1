//! HMAC JWT signing shared with the external editor.

use jsonwebtoken::errors::Error as JwtError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use serde_json::Value;

use crate::config::EditorConfig;
use crate::{DocError, Result};

/// Signs session configs and verifies callback tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    /// Create a signer for a secret and HMAC algorithm.
    pub fn new(secret: &str, algorithm: Algorithm) -> Self {
        // Editor tokens carry no registered claims; `exp` is still honoured
        // when present.
        let mut validation = Validation::new(algorithm);
        validation.required_spec_claims.clear();
        validation.validate_aud = false;

        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Build a signer from configuration, or `None` when no secret is set.
    pub fn from_config(config: &EditorConfig) -> Result<Option<Self>> {
        let algorithm = config.algorithm()?;
        if !config.signing_enabled() {
            return Ok(None);
        }
        Ok(Some(Self::new(&config.jwt_secret, algorithm)))
    }

    /// Algorithm used for signing and verification.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Sign a serializable value as the token claims.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign editor token: {}", e);
            DocError::Config(format!("failed to sign token: {e}"))
        })
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> std::result::Result<Value, JwtError> {
        decode::<Value>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
