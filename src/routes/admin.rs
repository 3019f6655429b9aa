/// Admin Routes
///
/// Everything under `/admin` sits behind the required cookie middleware;
/// handlers additionally insist on the admin claim.

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::auth::IdentityPayload;
use crate::error::{AppError, AuthError};

#[derive(Serialize)]
pub struct DashboardResponse {
    pub username: String,
    pub user_id: u64,
    pub theme: String,
}

fn require_admin(identity: Option<web::ReqData<IdentityPayload>>) -> Result<IdentityPayload, AppError> {
    let identity = identity
        .ok_or(AppError::Auth(AuthError::Unauthenticated))?
        .into_inner();
    if !identity.admin {
        tracing::warn!(user_id = identity.user_id, "Non-admin user attempted admin access");
        return Err(AppError::Auth(AuthError::Forbidden));
    }
    Ok(identity)
}

/// GET /admin
pub async fn dashboard(
    identity: Option<web::ReqData<IdentityPayload>>,
) -> Result<HttpResponse, AppError> {
    let identity = require_admin(identity)?;

    Ok(HttpResponse::Ok().json(DashboardResponse {
        username: identity.username,
        user_id: identity.user_id,
        theme: identity.theme,
    }))
}
