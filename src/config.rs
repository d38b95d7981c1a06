use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use chrono::Duration;
use thiserror::Error;

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;
const MAX_TOKEN_TTL_SECONDS: i64 = 30 * 24 * 3600;
const DEFAULT_COOKIE_NAME: &str = "accessToken";
const DEFAULT_WHATSAPP_API_BASE: &str = "https://graph.facebook.com/v20.0";
const DEFAULT_WHATSAPP_TEMPLATE: &str = "template_codigo";
const DEFAULT_WHATSAPP_LANGUAGE: &str = "pt_PT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not found in secrets")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct WhatsAppSettings {
    pub api_base: String,
    pub phone_number_id: String,
    pub access_token: String,
    pub template: String,
    pub language: String,
}

/// Attributes of the access-token cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
    pub same_site: SameSite,
}

impl SessionCookie {
    pub fn build(&self, token: &str, max_age: Duration) -> Cookie<'static> {
        Cookie::build(self.name.clone(), token.to_string())
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .max_age(CookieDuration::seconds(max_age.num_seconds()))
            .finish()
    }

    pub fn removal(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(self.name.clone(), "")
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .finish();
        cookie.make_removal();
        cookie
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub cookie: SessionCookie,
    pub whatsapp: WhatsAppSettings,
}

impl Config {
    /// Builds the configuration from a key lookup (the Shuttle secret store
    /// in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let token_ttl = match lookup("TOKEN_TTL_SECONDS") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(secs) if (1..=MAX_TOKEN_TTL_SECONDS).contains(&secs) => {
                    Duration::try_seconds(secs).ok_or_else(|| ConfigError::Invalid {
                        key: "TOKEN_TTL_SECONDS",
                        value: raw.clone(),
                    })?
                }
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "TOKEN_TTL_SECONDS",
                        value: raw,
                    })
                }
            },
            None => Duration::seconds(DEFAULT_TOKEN_TTL_SECONDS),
        };

        let same_site = match lookup("COOKIE_SAME_SITE") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "none" => SameSite::None,
                "lax" => SameSite::Lax,
                "strict" => SameSite::Strict,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "COOKIE_SAME_SITE",
                        value: raw,
                    })
                }
            },
            None => SameSite::None,
        };

        let secure = match lookup("COOKIE_SECURE") {
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| ConfigError::Invalid {
                key: "COOKIE_SECURE",
                value: raw.clone(),
            })?,
            None => true,
        };

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            token_ttl,
            cookie: SessionCookie {
                name: lookup("ACCESS_COOKIE_NAME").unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string()),
                secure,
                same_site,
            },
            whatsapp: WhatsAppSettings {
                api_base: lookup("WHATSAPP_API_BASE")
                    .unwrap_or_else(|| DEFAULT_WHATSAPP_API_BASE.to_string()),
                phone_number_id: required("WHATSAPP_PHONE_NUMBER_ID")?,
                access_token: required("WHATSAPP_TOKEN")?,
                template: lookup("WHATSAPP_TEMPLATE")
                    .unwrap_or_else(|| DEFAULT_WHATSAPP_TEMPLATE.to_string()),
                language: lookup("WHATSAPP_LANGUAGE")
                    .unwrap_or_else(|| DEFAULT_WHATSAPP_LANGUAGE.to_string()),
            },
        })
    }
}
