mod admin;
mod auth;
mod health_check;

pub use admin::dashboard;
pub use auth::{current_user, login, login_page, logout, LoginForm, LoginQuery};
pub use health_check::health_check;
