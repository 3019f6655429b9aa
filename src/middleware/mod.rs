/// Middleware module
///
/// Cookie-based session authentication with silent token refresh.

mod session_middleware;

pub use session_middleware::{CookieAuth, LOGIN_PATH};
