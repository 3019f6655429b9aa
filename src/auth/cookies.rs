/// Authentication cookies
///
/// Tokens travel as HttpOnly, SameSite=Strict cookies on path `/`. The
/// access cookie lives about a minute, the refresh cookie about three hours.

use actix_web::cookie::{time::Duration, Cookie, SameSite};

use crate::auth::jwt::TokenPair;
use crate::configuration::CookieSettings;

pub const ACCESS_COOKIE: &str = "token";
pub const REFRESH_COOKIE: &str = "refreshToken";

fn build(name: &'static str, value: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(Duration::seconds(max_age_secs))
        .finish()
}

/// Cookies carrying a freshly issued token pair.
pub fn auth_cookies(tokens: &TokenPair, settings: &CookieSettings) -> [Cookie<'static>; 2] {
    [
        build(
            ACCESS_COOKIE,
            tokens.access_token.clone(),
            settings.access_max_age_secs,
            settings.secure,
        ),
        build(
            REFRESH_COOKIE,
            tokens.refresh_token.clone(),
            settings.refresh_max_age_secs,
            settings.secure,
        ),
    ]
}

/// Empty cookies that overwrite and expire both tokens (logout).
pub fn removal_cookies(settings: &CookieSettings) -> [Cookie<'static>; 2] {
    [
        build(ACCESS_COOKIE, String::new(), 0, settings.secure),
        build(REFRESH_COOKIE, String::new(), 0, settings.secure),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> TokenPair {
        TokenPair {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
        }
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let [access, refresh] = auth_cookies(&tokens(), &CookieSettings::default());

        assert_eq!(access.name(), "token");
        assert_eq!(access.value(), "access");
        assert_eq!(access.max_age(), Some(Duration::seconds(60)));

        assert_eq!(refresh.name(), "refreshToken");
        assert_eq!(refresh.value(), "refresh");
        assert_eq!(refresh.max_age(), Some(Duration::seconds(3 * 60 * 60)));

        for cookie in [&access, &refresh] {
            assert_eq!(cookie.path(), Some("/"));
            assert_eq!(cookie.http_only(), Some(true));
            assert_eq!(cookie.secure(), Some(true));
            assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        }
    }

    #[test]
    fn test_removal_cookies_are_empty_and_expired() {
        let cookies = removal_cookies(&CookieSettings::default());

        assert_eq!(cookies[0].name(), ACCESS_COOKIE);
        assert_eq!(cookies[1].name(), REFRESH_COOKIE);
        for cookie in &cookies {
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        }
    }

    #[test]
    fn test_insecure_cookies_for_local_development() {
        let settings = CookieSettings {
            secure: false,
            ..CookieSettings::default()
        };
        let [access, _] = auth_cookies(&tokens(), &settings);

        assert_eq!(access.secure(), Some(false));
    }
}
