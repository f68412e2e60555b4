use super::*;
use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

/// Deployment-wide values fixed at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub secret: String,
    pub canonical_url: String,
    pub tls: bool,
    pub base_path: String,
    pub session_cookie: String,
    pub lookup_timeout: Duration,
    pub touch_rate: f64,
    pub bind_addr: String,
    pub db_url: Option<String>,
}

impl Settings {
    pub fn new(secret: &str, canonical_url: &str) -> Self {
        Self {
            secret: secret.to_string(),
            canonical_url: canonical_url.to_string(),
            tls: canonical_url.starts_with("https://"),
            base_path: gk_core::DEFAULT_BASE_PATH.to_string(),
            session_cookie: gk_core::SESSION_COOKIE.to_string(),
            lookup_timeout: gk_core::LOOKUP_TIMEOUT,
            touch_rate: gk_core::TOUCH_RATE,
            bind_addr: "127.0.0.1:4567".to_string(),
            db_url: None,
        }
    }
    /// Probability in `[0, 1]`; anything unusable disables sampling.
    pub fn touch_rate(&self) -> f64 {
        match self.touch_rate.is_finite() {
            true => self.touch_rate.clamp(0.0, 1.0),
            false => 0.0,
        }
    }
}

/// `jwt` section of the persisted config file.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, rename = "tokenExpiry", skip_serializing_if = "Option::is_none")]
    pub token_expiry: Option<u64>,
    #[serde(default, rename = "rememberTokenExpiry", skip_serializing_if = "Option::is_none")]
    pub remember_token_expiry: Option<u64>,
}

/// `session` section of the persisted config file.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// On-disk JSON configuration. Unknown keys survive a read/write cycle.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    #[serde(default)]
    pub jwt: JwtSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl ConfigFile {
    /// Missing files read as empty.
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text + "\n").with_context(|| format!("writing {}", path.display()))
    }
    pub fn policy(&self) -> Policy {
        let defaults = Policy::default();
        Policy {
            jwt_enabled: self.jwt.enabled.unwrap_or(defaults.jwt_enabled),
            token_expiry_secs: self.jwt.token_expiry.unwrap_or(defaults.token_expiry_secs),
            remember_expiry_days: self
                .jwt
                .remember_token_expiry
                .unwrap_or(defaults.remember_expiry_days),
            session_enabled: self.session.enabled.unwrap_or(defaults.session_enabled),
        }
    }
    pub fn set_policy(&mut self, policy: &Policy) {
        self.jwt.enabled = Some(policy.jwt_enabled);
        self.jwt.token_expiry = Some(policy.token_expiry_secs);
        self.jwt.remember_token_expiry = Some(policy.remember_expiry_days);
        self.session.enabled = Some(policy.session_enabled);
    }
}

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub policy: Policy,
}

impl Config {
    /// `CONFIG_PATH`, default `config.json`.
    pub fn path() -> PathBuf {
        std::env::var_os("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }
    /// Reads the config file then applies environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::path();
        log::info!("loading configuration from {}", path.display());
        let file = ConfigFile::read(&path)?;
        Self::resolve(file, |key| std::env::var(key).ok())
    }
    /// Environment wins over the file. Secret and URL are mandatory.
    pub fn resolve<F>(file: ConfigFile, env: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = env("JWT_SECRET")
            .or_else(|| file.secret.clone())
            .filter(|s| !s.is_empty())
            .context("no signing secret (set JWT_SECRET or `secret`)")?;
        let url = env("CANONICAL_URL")
            .or_else(|| file.url.clone())
            .filter(|s| !s.is_empty())
            .context("no canonical url (set CANONICAL_URL or `url`)")?;
        let mut settings = Settings::new(&secret, &url);
        if let Some(ssl) = file.ssl {
            settings.tls = ssl;
        }
        if let Some(path) = file.relative_path.clone().filter(|p| !p.is_empty()) {
            settings.base_path = path;
        }
        if let Some(addr) = env("BIND_ADDR") {
            settings.bind_addr = addr;
        }
        settings.db_url = env("DB_URL");
        Ok(Self {
            settings,
            policy: file.policy(),
        })
    }
}
