use std::env;

/// Model provider settings for the agent's AI client
#[derive(Clone)]
pub struct ModelSettings {
    /// "claude" or "openai" (any OpenAI-compatible endpoint)
    pub provider: String,
    pub api_key: String,
    /// Custom endpoint override; provider default when unset
    pub endpoint: Option<String>,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub model: ModelSettings,
    /// Cap on reasoning/tool round trips per agent invocation
    pub max_tool_iterations: usize,
    /// Cron expression for the daily overdue-task reschedule job
    pub reschedule_cron: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "./.db/behflow.db".to_string()),
            model: ModelSettings {
                provider: env::var("MODEL_PROVIDER").unwrap_or_else(|_| "openai".to_string()),
                api_key: env::var("MODEL_API_KEY").unwrap_or_default(),
                endpoint: env::var("MODEL_ENDPOINT").ok(),
                model: env::var("MODEL_NAME").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                max_tokens: env::var("MODEL_MAX_TOKENS")
                    .unwrap_or_else(|_| "4096".to_string())
                    .parse()
                    .expect("MODEL_MAX_TOKENS must be a valid number"),
            },
            max_tool_iterations: env::var("MAX_TOOL_ITERATIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("MAX_TOOL_ITERATIONS must be a valid number"),
            // Seconds-resolution cron (sec min hour dom month dow): daily at midnight UTC
            reschedule_cron: env::var("RESCHEDULE_CRON")
                .unwrap_or_else(|_| "0 0 0 * * *".to_string()),
        }
    }
}
