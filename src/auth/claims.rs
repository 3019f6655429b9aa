/// JWT Claims structures
///
/// Both claim sets are fixed-shape: a token carrying extra, missing or
/// mistyped claims fails to deserialize and is rejected.

use serde::{Deserialize, Serialize};

/// Claims of an access token: the authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityPayload {
    pub username: String,
    pub admin: bool,
    #[serde(rename = "userId")]
    pub user_id: u64,
    pub theme: String,
}

impl IdentityPayload {
    pub fn new(
        username: impl Into<String>,
        admin: bool,
        user_id: u64,
        theme: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            admin,
            user_id,
            theme: theme.into(),
        }
    }
}

/// Claims of a refresh token: the access token it was issued alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    #[serde(rename = "jwtToken")]
    pub jwt_token: String,
}
