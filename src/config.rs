//! Application configuration: optional TOML file plus environment overrides.
//!
//! Non-secret knobs (port, origins, leaderboard size) may come from a TOML
//! file pointed to by `APP_CONFIG_PATH`. Secrets (JWT secret, Google OAuth
//! client credentials) are environment-only:
//!
//!   PORT                  : u16 (default 8080)
//!   JWT_SECRET            : required, HS256 signing key
//!   GOOGLE_CLIENT_ID      : OAuth client id
//!   GOOGLE_CLIENT_SECRET  : OAuth client secret
//!   GOOGLE_REDIRECT_URL   : OAuth callback URL
//!   FRONTEND_URL          : where the callback redirects with the token
//!   LOG_LEVEL / LOG_FORMAT: see telemetry

use serde::Deserialize;
use tracing::{error, info};

/// Knobs accepted in the optional TOML file.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub frontend_url: Option<String>,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub leaderboard_top: Option<usize>,
    #[serde(default)]
    pub jwt_ttl_hours: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct GoogleOAuth {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub frontend_url: String,
    pub allowed_origins: Vec<String>,
    pub leaderboard_top: usize,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub google: GoogleOAuth,
}

impl AppConfig {
    /// Build config from APP_CONFIG_PATH (optional) and environment variables.
    /// Fails only on a missing JWT secret; OAuth creds may be empty, which
    /// disables login but keeps the rest of the API serving.
    pub fn load() -> Result<Self, String> {
        let file = load_file_config();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .or(file.port)
            .unwrap_or(8080);

        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| "JWT_SECRET environment variable not set")?;

        let google = GoogleOAuth {
            client_id: std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: std::env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            redirect_url: std::env::var("GOOGLE_REDIRECT_URL").unwrap_or_default(),
        };
        if google.client_id.is_empty() {
            info!(target: "brew_detective", "GOOGLE_CLIENT_ID not set; OAuth login disabled");
        }

        Ok(Self {
            port,
            frontend_url: std::env::var("FRONTEND_URL")
                .ok()
                .or(file.frontend_url)
                .unwrap_or_else(|| "http://localhost:8080".into()),
            allowed_origins: file.allowed_origins,
            leaderboard_top: file.leaderboard_top.unwrap_or(50),
            jwt_secret,
            jwt_ttl_hours: file.jwt_ttl_hours.unwrap_or(24),
            google,
        })
    }
}

/// Attempt to load the TOML file from APP_CONFIG_PATH. On any parsing/IO
/// error, fall back to defaults (logged, not fatal).
fn load_file_config() -> FileConfig {
    let Some(path) = std::env::var("APP_CONFIG_PATH").ok() else {
        return FileConfig::default();
    };
    match std::fs::read_to_string(&path) {
        Ok(s) => match toml::from_str::<FileConfig>(&s) {
            Ok(cfg) => {
                info!(target: "brew_detective", %path, "Loaded config file (TOML)");
                cfg
            }
            Err(e) => {
                error!(target: "brew_detective", %path, error = %e, "Failed to parse TOML config");
                FileConfig::default()
            }
        },
        Err(e) => {
            error!(target: "brew_detective", %path, error = %e, "Failed to read TOML config file");
            FileConfig::default()
        }
    }
}

#[cfg(test)]
impl AppConfig {
    /// Config with safe defaults for tests; no env access.
    pub fn test_default() -> Self {
        Self {
            port: 0,
            frontend_url: "http://localhost:8080".into(),
            allowed_origins: vec![],
            leaderboard_top: 50,
            jwt_secret: "test-secret".into(),
            jwt_ttl_hours: 24,
            google: GoogleOAuth {
                client_id: String::new(),
                client_secret: String::new(),
                redirect_url: String::new(),
            },
        }
    }
}
