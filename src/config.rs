use std::env;
use std::fmt;

const DEFAULT_FRONTEND_URL: &str = "http://127.0.0.1:5173";
const DEFAULT_MAIL_SERVER: &str = "smtp.gmail.com";
const DEFAULT_MAIL_PORT: u16 = 465;
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;
const MIN_SECRET_KEY_LEN: usize = 32;

/// Reasons the process refuses to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is absent or empty.
    Missing(&'static str),
    /// A variable is present but unusable.
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => write!(f, "{} must be set", name),
            ConfigError::Invalid(name, reason) => write!(f, "{} is invalid: {}", name, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Google OAuth client registration.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// SMTP credentials for the task-created notification.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    /// Master key for the session cookie.
    pub secret_key: String,
    /// HMAC secret for bearer tokens.
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
    pub bcrypt_cost: u32,
    pub google: GoogleConfig,
    pub frontend_url: String,
    /// `None` disables outbound mail.
    pub mail: Option<MailConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let secret_key = require("SECRET_KEY")?;
        if secret_key.len() < MIN_SECRET_KEY_LEN {
            return Err(ConfigError::Invalid(
                "SECRET_KEY",
                format!("must be at least {} bytes", MIN_SECRET_KEY_LEN),
            ));
        }

        let google = GoogleConfig {
            client_id: require("GOOGLE_OAUTH_CLIENT_ID")?,
            client_secret: require("GOOGLE_OAUTH_CLIENT_SECRET")?,
            redirect_uri: require("GOOGLE_OAUTH_REDIRECT_URI")?,
        };

        let mail = match (get("MAIL_USERNAME"), get("MAIL_PASSWORD")) {
            (Some(username), Some(password)) => Some(MailConfig {
                server: get("MAIL_SERVER").unwrap_or_else(|| DEFAULT_MAIL_SERVER.to_string()),
                port: parse_or("MAIL_PORT", get("MAIL_PORT"), DEFAULT_MAIL_PORT)?,
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            server_port: parse_or("SERVER_PORT", get("SERVER_PORT"), 5000)?,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            secret_key,
            jwt_secret: require("JWT_SECRET_KEY")?,
            token_ttl_seconds: parse_or(
                "TOKEN_TTL_SECONDS",
                get("TOKEN_TTL_SECONDS"),
                DEFAULT_TOKEN_TTL_SECONDS,
            )?,
            bcrypt_cost: parse_or("BCRYPT_COST", get("BCRYPT_COST"), bcrypt::DEFAULT_COST)?,
            google,
            frontend_url: get("FRONTEND_URL")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            mail,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    /// Session cookies only travel over https when the OAuth callback does.
    pub fn secure_cookies(&self) -> bool {
        self.google.redirect_uri.starts_with("https://")
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, format!("cannot parse {:?}", raw))),
        None => Ok(default),
    }
}
