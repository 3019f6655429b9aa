/// Authentication Routes
///
/// Login with username and password, logout, and the identity of the
/// current session.

use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;

use crate::auth::{
    auth_cookies, decoy_hash, removal_cookies, verify_password, IdentityPayload, TokenAuthenticator,
};
use crate::configuration::{AccountSettings, Settings};
use crate::error::{AppError, AuthError, ErrorContext};

/// Login form submitted by the browser
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

/// Only same-site absolute paths are followed after login.
fn safe_redirect(target: Option<&str>) -> &str {
    match target {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(|c| c.is_control()) =>
        {
            path
        }
        _ => "/",
    }
}

/// Query of the login page
#[derive(Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub redirect: Option<String>,
}

/// GET /login
///
/// Visitors who already hold a session are sent to `/`. Everyone else gets
/// the login form, carrying the same-site `redirect` target along.
pub async fn login_page(
    query: web::Query<LoginQuery>,
    identity: Option<web::ReqData<IdentityPayload>>,
) -> HttpResponse {
    if identity.is_some() {
        return HttpResponse::Found()
            .insert_header((header::LOCATION, "/"))
            .finish();
    }

    let redirect = escape_attribute(safe_redirect(query.redirect.as_deref()));
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(format!(
            r#"<!DOCTYPE html>
<html>
<head><title>Log in</title></head>
<body>
<form method="post" action="/login">
<input type="hidden" name="redirect" value="{}">
<label>Username <input type="text" name="username" autocomplete="username"></label>
<label>Password <input type="password" name="password" autocomplete="current-password"></label>
<button type="submit">Log in</button>
</form>
</body>
</html>
"#,
            redirect
        ))
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// POST /login
///
/// Verifies the password against the account's stored hash, issues a token
/// pair and sets both cookies before redirecting.
///
/// # Errors
/// - 401: Unknown user or wrong password (same message for both)
/// - 500: Hashing or signing failure
pub async fn login(
    form: web::Form<LoginForm>,
    settings: web::Data<Settings>,
    authenticator: web::Data<TokenAuthenticator>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("login");
    let form = form.into_inner();

    let result = authenticate(&form, &settings).await;
    let identity = match result {
        Ok(identity) => identity,
        Err(e) => {
            context.log_error(&e);
            return Err(e);
        }
    };

    let tokens = authenticator.generate_tokens(&identity)?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = identity.user_id,
        "User logged in successfully"
    );

    let mut response = HttpResponse::Found();
    response.insert_header((header::LOCATION, safe_redirect(form.redirect.as_deref())));
    for cookie in auth_cookies(&tokens, &settings.cookies) {
        response.cookie(cookie);
    }
    Ok(response.finish())
}

async fn authenticate(form: &LoginForm, settings: &Settings) -> Result<IdentityPayload, AppError> {
    let account = settings.find_account(&form.username);

    let password = form.password.clone();
    let stored = stored_hash(account).to_string();

    // Argon2 is deliberately slow; keep it off the async workers.
    let matched = web::block(move || verify_password(&password, &stored)).await??;

    match account {
        Some(account) if matched => Ok(account.identity()),
        _ => Err(AppError::Auth(AuthError::InvalidCredentials)),
    }
}

/// Hash to verify against. Unknown users get the decoy so both failures
/// cost one derivation at the default parameters.
fn stored_hash(account: Option<&AccountSettings>) -> &str {
    account.map_or(decoy_hash(), |account| account.password_hash.as_str())
}

/// POST /logout
///
/// Overwrites both token cookies with expired empty values.
pub async fn logout(settings: web::Data<Settings>) -> HttpResponse {
    let mut response = HttpResponse::Found();
    response.insert_header((header::LOCATION, "/"));
    for cookie in removal_cookies(&settings.cookies) {
        response.cookie(cookie);
    }
    response.finish()
}

/// GET /me
///
/// Identity of the current session, as injected by the cookie middleware.
pub async fn current_user(
    identity: Option<web::ReqData<IdentityPayload>>,
) -> Result<HttpResponse, AppError> {
    let identity = identity.ok_or(AppError::Auth(AuthError::Unauthenticated))?;
    Ok(HttpResponse::Ok().json(identity.into_inner()))
}
