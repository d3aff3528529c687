use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{Args, Command, FromArgMatches};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Settings for the remote completion provider.
#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Model used for completions
    #[arg(long, env = "GROQ_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature
    #[arg(long, env = "GROQ_TEMPERATURE", default_value_t = 0.7)]
    pub temperature: f32,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "GROQ_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Timeout for a single completion request, in seconds
    #[arg(long, env = "GROQ_TIMEOUT_SECS", default_value_t = 120)]
    pub timeout_secs: u64,

    /// Keep at most this many turns per conversation (unbounded if unset)
    #[arg(long, env = "CHAT_MAX_HISTORY_TURNS")]
    pub max_history_turns: Option<usize>,
}

impl LlmArgs {
    /// The per-conversation turn cap, which must fit at least one exchange.
    pub fn history_window(&self) -> Result<Option<usize>, ConfigError> {
        match self.max_history_turns {
            Some(max) if max < 2 => Err(ConfigError::InvalidHistoryWindow(max)),
            window => Ok(window),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Interface to bind
    #[arg(long, env = "CHAT_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "CHAT_PORT", default_value_t = 8080)]
    pub port: u16,
}

impl ServeArgs {
    /// Settings for a bare invocation with no `serve` subcommand: env vars, then defaults.
    pub fn from_env() -> Result<Self, clap::Error> {
        let matches = Self::augment_args(Command::new("serve")).try_get_matches_from(["serve"])?;
        Self::from_arg_matches(&matches)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub base_url: Url,
    pub timeout: Duration,
}

impl TryFrom<&LlmArgs> for GroqConfig {
    type Error = ConfigError;

    fn try_from(args: &LlmArgs) -> Result<Self, Self::Error> {
        if args.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if !(0.0..=2.0).contains(&args.temperature) {
            return Err(ConfigError::InvalidTemperature(args.temperature));
        }

        let base_url = Url::parse(&args.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: args.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: args.base_url.clone(),
                reason: "not a base URL".to_string(),
            });
        }

        Ok(Self {
            api_key: args.api_key.trim().to_string(),
            model: args.model.clone(),
            temperature: args.temperature,
            base_url,
            timeout: Duration::from_secs(args.timeout_secs),
        })
    }
}
