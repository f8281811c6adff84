use std::net::SocketAddr;

use anyhow::Context;

const DEFAULT_ORIGINS: &[&str] = &[
    "http://localhost",
    "http://localhost:3000",
    "http://localhost:5173",
];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub groq_api_key: String,
    pub groq_model: String,
    /// Base URL of the OpenAI-compatible API, without the `/chat/completions` suffix
    pub groq_api_base: String,
    pub llm_temperature: f32,

    /// Postgres connection string. Without it the store runs disabled.
    pub database_url: Option<String>,

    pub bind_addr: SocketAddr,
    /// Origins allowed by the CORS layer
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let groq_api_key = var("GROQ_API_KEY").context("GROQ_API_KEY must be set")?;

        let cors_origins = match var("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            groq_api_key,
            groq_model: var("GROQ_MODEL").unwrap_or_else(|| "openai/gpt-oss-120b".to_string()),
            groq_api_base: var("GROQ_API_BASE")
                .unwrap_or_else(|| "https://api.groq.com/openai/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            llm_temperature: var("LLM_TEMPERATURE")
                .unwrap_or_else(|| "0".to_string())
                .parse()
                .context("LLM_TEMPERATURE must be a number")?,
            database_url: var("DATABASE_URL"),
            bind_addr: var("BIND_ADDR")
                .unwrap_or_else(|| "127.0.0.1:8000".to_string())
                .parse()
                .context("BIND_ADDR must be a socket address")?,
            cors_origins,
        })
    }
}
