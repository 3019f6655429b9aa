/// JWT Token Generation and Validation
///
/// Access tokens carry an [`IdentityPayload`]; refresh tokens carry the
/// access token they were issued with. Both are HS256-signed with one
/// server-held secret.
///
/// Neither token has an `exp` claim. Lifetimes are bounded only by the
/// cookie max-age set by the web layer, so a token lifted out of a cookie
/// keeps verifying here for as long as the secret is unchanged.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::claims::{IdentityPayload, RefreshClaims};
use crate::error::TokenError;

/// Environment variable holding the signing secret.
pub const SECRET_ENV_VAR: &str = "JWT_SECRET";

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;
const HMAC_FAMILY: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Access and refresh token issued together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies signed tokens with a single shared secret.
#[derive(Clone)]
pub struct TokenAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenAuthenticator {
    /// Create an authenticator for the given HMAC secret.
    ///
    /// # Errors
    /// Returns `TokenError::Config` if the secret is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(TokenError::Config(format!("{} is empty", SECRET_ENV_VAR)));
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = HMAC_FAMILY.to_vec();
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Create an authenticator from the `JWT_SECRET` environment variable.
    pub fn from_env() -> Result<Self, TokenError> {
        let secret = std::env::var(SECRET_ENV_VAR)
            .map_err(|_| TokenError::Config(format!("{} is not set", SECRET_ENV_VAR)))?;
        Self::new(secret)
    }

    /// Issue a fresh access/refresh token pair for `payload`.
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if either token cannot be encoded.
    pub fn generate_tokens(&self, payload: &IdentityPayload) -> Result<TokenPair, TokenError> {
        let access_token = self.sign(payload)?;
        let refresh_token = self.sign(&RefreshClaims {
            jwt_token: access_token.clone(),
        })?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Validate an access token and recover its identity payload.
    ///
    /// # Errors
    /// - `TokenError::AlgorithmMismatch` if the header names a non-HMAC algorithm
    /// - `TokenError::InvalidToken` for bad signatures or claim sets
    pub fn verify_access_token(&self, token: &str) -> Result<IdentityPayload, TokenError> {
        self.verify(token)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub(crate) fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        // Check the declared algorithm before touching the signature.
        let header = decode_header(token).map_err(|e| {
            tracing::debug!(error = %e, "Token header could not be decoded");
            TokenError::InvalidToken
        })?;
        if !HMAC_FAMILY.contains(&header.alg) {
            tracing::warn!(alg = ?header.alg, "Token with unexpected signing algorithm");
            return Err(TokenError::AlgorithmMismatch(format!("{:?}", header.alg)));
        }

        decode::<T>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidAlgorithm => {
                    TokenError::AlgorithmMismatch(format!("{:?}", header.alg))
                }
                _ => {
                    tracing::debug!(error = %e, "JWT validation error");
                    TokenError::InvalidToken
                }
            })
    }
}
