//! Runtime configuration for the tutor pipeline and HTTP server.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tutor_core::{defaults, Error, PromptProfile, Result};

/// How card images reach the answer generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageStrategy {
    /// Images are transcribed; only text goes to the generator.
    #[default]
    TranscribeOnly,
    /// Images are transcribed and also attached to the generation call.
    AttachImages,
}

impl fmt::Display for ImageStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageStrategy::TranscribeOnly => write!(f, "transcribe"),
            ImageStrategy::AttachImages => write!(f, "attach"),
        }
    }
}

impl FromStr for ImageStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "transcribe" | "transcribe_only" | "text" => Ok(ImageStrategy::TranscribeOnly),
            "attach" | "attach_images" | "multimodal" => Ok(ImageStrategy::AttachImages),
            _ => Err(format!("Invalid image strategy: {}", s)),
        }
    }
}

/// Pipeline tuning.
#[derive(Debug, Clone)]
pub struct TutorConfig {
    pub top_k: usize,
    pub query_char_cap: usize,
    pub stage_timeout: Duration,
    pub image_strategy: ImageStrategy,
    /// Active prompt profiles; empty means all.
    pub profiles: Vec<PromptProfile>,
    /// Put the underlying error text in 500 bodies.
    pub expose_error_details: bool,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            top_k: defaults::TOP_K,
            query_char_cap: defaults::QUERY_CHAR_CAP,
            stage_timeout: Duration::from_secs(defaults::STAGE_TIMEOUT_SECS),
            image_strategy: ImageStrategy::default(),
            profiles: PromptProfile::ALL.to_vec(),
            expose_error_details: false,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{}: {}", name, e))),
        _ => Ok(None),
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Parse a comma-separated profile list.
pub fn parse_profiles(raw: &str) -> Result<Vec<PromptProfile>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<PromptProfile>().map_err(Error::Config))
        .collect()
}

impl TutorConfig {
    /// Load from `TUTOR_*` and `EXPOSE_ERROR_DETAILS`. Malformed values are
    /// a startup error rather than a silent fallback.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(top_k) = env_parse::<usize>("TUTOR_TOP_K")? {
            if top_k == 0 {
                return Err(Error::Config("TUTOR_TOP_K must be at least 1".into()));
            }
            config.top_k = top_k;
        }
        if let Some(cap) = env_parse::<usize>("TUTOR_QUERY_CHAR_CAP")? {
            if cap == 0 {
                return Err(Error::Config("TUTOR_QUERY_CHAR_CAP must be at least 1".into()));
            }
            config.query_char_cap = cap;
        }
        if let Some(secs) = env_parse::<u64>("TUTOR_STAGE_TIMEOUT_SECS")? {
            config.stage_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(strategy) = env_parse::<ImageStrategy>("TUTOR_IMAGE_STRATEGY")? {
            config.image_strategy = strategy;
        }
        if let Ok(raw) = std::env::var("TUTOR_PROFILES") {
            let profiles = parse_profiles(&raw)?;
            if !profiles.is_empty() {
                config.profiles = profiles;
            }
        }
        config.expose_error_details = env_flag("EXPOSE_ERROR_DETAILS");

        Ok(config)
    }
}

/// Listener and HTTP-layer settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CORS allow-list; `None` allows any origin.
    pub allowed_origins: Option<Vec<String>>,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: defaults::SERVER_PORT,
            allowed_origins: None,
            max_body_bytes: defaults::MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("HOST") {
            if !host.trim().is_empty() {
                config.host = host.trim().to_string();
            }
        }
        if let Some(port) = env_parse::<u16>("PORT")? {
            config.port = port;
        }
        if let Some(limit) = env_parse::<usize>("MAX_BODY_BYTES")? {
            config.max_body_bytes = limit;
        }
        config.allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|raw| parse_origin_list(&raw))
            .filter(|list| !list.is_empty());
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Split a comma-separated origin list, dropping blanks and `*`.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "*")
        .map(str::to_string)
        .collect()
}
