/// Error Handling Module
///
/// Unified error handling for the authentication core and the web layer:
/// 1. Domain-Specific Error Types (password hashing, tokens)
/// 2. Unified Application Error Type
/// 3. HTTP Response Mapping
/// 4. Error Context Enrichment

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Errors produced while hashing or verifying a password.
#[derive(Debug, Error)]
pub enum HashError {
    /// The OS random source could not produce a salt.
    #[error("secure random generation failed: {0}")]
    Randomness(String),

    /// The stored hash string is malformed.
    #[error("malformed password hash: {0}")]
    Parse(String),

    /// The stored hash was produced by a different KDF version.
    #[error("incompatible argon2 version: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// The key derivation function rejected its inputs.
    #[error("key derivation failed: {0}")]
    Kdf(#[from] argon2::Error),
}

/// Errors produced while issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The signing secret is unset or empty.
    #[error("token signing secret is not configured: {0}")]
    Config(String),

    /// The token declares a signing algorithm outside the HMAC family.
    #[error("unexpected signing algorithm: {0}")]
    AlgorithmMismatch(String),

    /// Signature check failed or the claim set has the wrong shape.
    #[error("invalid token")]
    InvalidToken,

    /// Neither an access token nor a refresh token was presented.
    #[error("missing authentication token")]
    MissingToken,

    /// Encoding a token failed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Authentication failures surfaced to the client.
///
/// Deliberately coarse: the end user never learns which check failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Insufficient permissions")]
    Forbidden,
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that all application errors map to
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Auth(AuthError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<HashError> for AppError {
    fn from(err: HashError) -> Self {
        match err {
            // A corrupt or outdated stored hash looks like a failed login to the client.
            HashError::Parse(_) | HashError::VersionMismatch { .. } => {
                tracing::warn!(error = %err, "Stored password hash rejected");
                AppError::Auth(AuthError::InvalidCredentials)
            }
            HashError::Randomness(_) | HashError::Kdf(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Config(msg) => AppError::Config(msg),
            TokenError::Signing(msg) => AppError::Internal(msg),
            TokenError::AlgorithmMismatch(_) | TokenError::InvalidToken | TokenError::MissingToken => {
                AppError::Auth(AuthError::Unauthenticated)
            }
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::Internal(format!("blocking task failed: {}", err))
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Auth(AuthError::InvalidCredentials) => "INVALID_CREDENTIALS",
            AppError::Auth(AuthError::Unauthenticated) => "UNAUTHENTICATED",
            AppError::Auth(AuthError::Forbidden) => "FORBIDDEN",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        match self {
            AppError::Auth(e) => e.to_string(),
            AppError::Config(_) => "Server configuration error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            AppError::Config(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let status = self.status_code();
        let body = ErrorResponse::new(
            request_id,
            self.public_message(),
            self.code().to_string(),
            status.as_u16(),
        );

        HttpResponse::build(status).json(body)
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Error context for request-scoped logging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            operation: operation.into(),
        }
    }

    pub fn log_error(&self, error: &AppError) {
        match error {
            AppError::Auth(_) => {
                tracing::warn!(
                    request_id = %self.request_id,
                    operation = %self.operation,
                    error = %error,
                    "Authentication error"
                );
            }
            _ => {
                tracing::error!(
                    request_id = %self.request_id,
                    operation = %self.operation,
                    error = %error,
                    "Request failed"
                );
            }
        }
    }
}
