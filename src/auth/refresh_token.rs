/// Refresh Token Handling
///
/// A refresh token wraps the access token it was issued with. When the
/// access cookie has expired, the refresh token is verified, the inner access
/// token is verified again (so tampering after signing is still caught), and
/// a brand-new pair is issued for the recovered identity.
///
/// There is no server-side revocation: a leaked refresh token stays usable
/// for as long as its cookie would have lived.

use crate::auth::claims::{IdentityPayload, RefreshClaims};
use crate::auth::jwt::{TokenAuthenticator, TokenPair};
use crate::error::TokenError;

/// Outcome of authenticating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The access token verified on its own; nothing to reissue.
    AccessValid(IdentityPayload),
    /// The refresh token was used; the caller must overwrite both cookies.
    Reissued {
        payload: IdentityPayload,
        tokens: TokenPair,
    },
}

impl SessionState {
    pub fn payload(&self) -> &IdentityPayload {
        match self {
            SessionState::AccessValid(payload) => payload,
            SessionState::Reissued { payload, .. } => payload,
        }
    }

    /// New tokens to hand back to the client, if any were issued.
    pub fn reissued_tokens(&self) -> Option<&TokenPair> {
        match self {
            SessionState::AccessValid(_) => None,
            SessionState::Reissued { tokens, .. } => Some(tokens),
        }
    }
}

impl TokenAuthenticator {
    /// Validate a refresh token and return the access token embedded in it.
    ///
    /// The embedded token itself is not checked here.
    pub fn verify_refresh_token(&self, token: &str) -> Result<String, TokenError> {
        self.verify::<RefreshClaims>(token)
            .map(|claims| claims.jwt_token)
    }

    /// Authenticate a request from its access and refresh cookies.
    ///
    /// A present, valid access token wins outright. Otherwise the refresh
    /// token is required and, if everything inside it checks out, a new
    /// token pair is issued for the same identity.
    ///
    /// # Errors
    /// - `TokenError::MissingToken` when no usable access token and no refresh token exist
    /// - any verification error from the refresh chain
    pub fn refresh_flow(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<SessionState, TokenError> {
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            match self.verify_access_token(token) {
                Ok(payload) => return Ok(SessionState::AccessValid(payload)),
                Err(e) => {
                    tracing::debug!(error = %e, "Access token rejected, trying refresh token");
                }
            }
        }

        let refresh_token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(TokenError::MissingToken)?;

        let inner = self.verify_refresh_token(refresh_token)?;
        let payload = self.verify_access_token(&inner)?;
        let tokens = self.generate_tokens(&payload)?;

        tracing::info!(user_id = payload.user_id, "Session refreshed");

        Ok(SessionState::Reissued { payload, tokens })
    }
}
