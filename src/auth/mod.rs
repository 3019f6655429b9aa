/// Authentication module
///
/// Handles Argon2 password hashing, signed access/refresh token issuance
/// and verification, and the cookies that carry the tokens.

mod claims;
mod cookies;
mod jwt;
mod password;
mod refresh_token;

pub use claims::{IdentityPayload, RefreshClaims};
pub use cookies::{auth_cookies, removal_cookies, ACCESS_COOKIE, REFRESH_COOKIE};
pub use jwt::{TokenAuthenticator, TokenPair, SECRET_ENV_VAR};
pub use password::{
    decoy_hash, hash_password, verify_password, HashRecord, Variant, APP_TAG, KDF_VERSION,
    MAX_ITERATIONS, MAX_MEMORY_COST, MAX_PARALLELISM,
};
pub use refresh_token::SessionState;
