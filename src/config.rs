use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_IDEOGRAM_BASE_URL: &str = "https://api.ideogram.ai";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RESULT_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct IdeogramConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_concurrency: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct UpstashConfig {
    pub url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: Option<u16>,
    pub use_upstash: bool,
    pub ideogram: IdeogramConfig,
    pub upstash: Option<UpstashConfig>,
    pub media_root: PathBuf,
    pub result_ttl_secs: u64,
}

impl Default for IdeogramConfig {
    fn default() -> Self {
        IdeogramConfig {
            api_key: None,
            base_url: DEFAULT_IDEOGRAM_BASE_URL.to_string(),
            max_concurrency: 1,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl IdeogramConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_key = env::var("IDEOGRAM_API_KEY").ok();
        let base_url = env::var("IDEOGRAM_BASE_URL").unwrap_or(defaults.base_url);
        let max_concurrency = env::var("IDEOGRAM_MAX_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_concurrency);
        let request_timeout_secs = env::var("IDEOGRAM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.request_timeout_secs);

        IdeogramConfig {
            api_key,
            base_url,
            max_concurrency,
            request_timeout_secs,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for UpstashConfig {
    fn default() -> Self {
        UpstashConfig {
            url: None,
            token: None,
        }
    }
}

impl UpstashConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, url: impl Into<String>, token: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self.token = Some(token.into());
        self
    }

    pub fn from_env() -> Self {
        let url = env::var("UPSTASH_URL").ok();
        let token = env::var("UPSTASH_TOKEN").ok();

        UpstashConfig { url, token }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: None,
            use_upstash: false,
            ideogram: IdeogramConfig::default(),
            upstash: None,
            media_root: PathBuf::from("media"),
            result_ttl_secs: DEFAULT_RESULT_TTL_SECS,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn from_env() -> Self {
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let use_upstash = env::var("USE_UPSTASH")
            .ok()
            .map_or(false, |val| val == "true");
        let media_root = env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));
        let result_ttl_secs = env::var("TASK_RESULT_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RESULT_TTL_SECS);

        Config {
            port,
            use_upstash,
            ideogram: IdeogramConfig::from_env(),
            upstash: if use_upstash {
                Some(UpstashConfig::from_env())
            } else {
                None
            },
            media_root,
            result_ttl_secs,
        }
    }

    pub fn with_ideogram(mut self, config: IdeogramConfig) -> Self {
        self.ideogram = config;
        self
    }

    pub fn with_upstash(mut self, config: UpstashConfig) -> Self {
        self.upstash = Some(config);
        self.use_upstash = true;
        self
    }

    pub fn with_media_root(mut self, media_root: impl Into<PathBuf>) -> Self {
        self.media_root = media_root.into();
        self
    }

    pub fn with_result_ttl(mut self, secs: u64) -> Self {
        self.result_ttl_secs = secs;
        self
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }
}
