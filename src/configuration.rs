use config::ConfigError;

use crate::auth::{IdentityPayload, SECRET_ENV_VAR};

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub cookies: CookieSettings,
    #[serde(default)]
    pub accounts: Vec<AccountSettings>,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

/// Token signing settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
}

/// Lifetimes and flags of the authentication cookies
#[derive(serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct CookieSettings {
    pub access_max_age_secs: i64,  // seconds (60 = one minute)
    pub refresh_max_age_secs: i64, // seconds (10800 = three hours)
    pub secure: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            access_max_age_secs: 60,
            refresh_max_age_secs: 60 * 60 * 3,
            secure: true,
        }
    }
}

/// A user allowed to log in, with its stored password hash
#[derive(serde::Deserialize, Clone)]
pub struct AccountSettings {
    pub username: String,
    pub password_hash: String,
    pub user_id: u64,
    #[serde(default)]
    pub admin: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_theme() -> String {
    "dark".to_string()
}

impl AccountSettings {
    pub fn identity(&self) -> IdentityPayload {
        IdentityPayload::new(self.username.clone(), self.admin, self.user_id, self.theme.clone())
    }
}

impl Settings {
    pub fn find_account(&self, username: &str) -> Option<&AccountSettings> {
        self.accounts.iter().find(|account| account.username == username)
    }
}

/// Load settings from `configuration.*`, `APP__*` variables and `JWT_SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8080)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .set_override_option("jwt.secret", std::env::var(SECRET_ENV_VAR).ok())?
        .build()?;
    settings.try_deserialize::<Settings>()
}
