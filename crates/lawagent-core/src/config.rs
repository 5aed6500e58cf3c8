//! Process-wide configuration.
//!
//! Loaded once at construction: `.env` (if present, via `dotenvy`) then
//! `std::env`, with hard defaults for every tunable. There is no hot
//! reloading; env vars are read exactly once and the result is an
//! immutable, owned struct passed down to every component.

use crate::error::{CoreError, Result};

/// Runtime configuration for the whole agent process.
#[derive(Debug, Clone)]
pub struct Config {
    // -- secrets / endpoints --
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub embedding_api_key: String,
    pub embedding_base_url: String,
    pub bocha_api_key: Option<String>,
    pub weather_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub google_cx: Option<String>,

    // -- memory tunables --
    pub session_memory_size: usize,
    pub context_window_size: usize,
    pub context_refine_threshold: usize,

    // -- agent tunables --
    pub max_critic_rounds: usize,
    pub duplicate_threshold: usize,
    pub max_observe: usize,

    // -- resilience tunables --
    pub max_retries: u32,
    pub llm_timeout_secs: u64,
    pub embedding_timeout_secs: u64,
    pub tool_http_timeout_secs: u64,

    // -- storage --
    pub vector_db_path: String,
    pub vector_db_collection: String,
    pub data_dir: String,
    pub output_dir: String,

    // -- observability --
    /// Emit structured JSON log lines instead of the compact human format.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_base_url: "https://api.openai.com/v1".to_string(),
            embedding_api_key: String::new(),
            embedding_base_url: "https://api.openai.com/v1".to_string(),
            bocha_api_key: None,
            weather_api_key: None,
            google_api_key: None,
            google_cx: None,

            session_memory_size: 50,
            context_window_size: 10,
            context_refine_threshold: 5,

            max_critic_rounds: 2,
            duplicate_threshold: 2,
            max_observe: 2000,

            max_retries: 3,
            llm_timeout_secs: 120,
            embedding_timeout_secs: 300,
            tool_http_timeout_secs: 15,

            vector_db_path: "./data/vector_db".to_string(),
            vector_db_collection: "lawagent".to_string(),
            data_dir: "./data".to_string(),
            output_dir: "./output".to_string(),

            log_json: false,
        }
    }
}

impl Config {
    /// Load `.env` (best-effort, missing file is not an error), then layer
    /// environment variables over the defaults. Fails with `ConfigError`
    /// if `LLM_API_KEY` is absent — the one secret this runtime cannot
    /// operate without.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();

        cfg.llm_api_key = require_env("LLM_API_KEY")?;
        cfg.llm_base_url = env_or("LLM_BASE_URL", cfg.llm_base_url);
        cfg.embedding_api_key = env_or("EMBEDDING_API_KEY", cfg.embedding_api_key);
        cfg.embedding_base_url = env_or("EMBEDDING_BASE_URL", cfg.embedding_base_url);
        cfg.bocha_api_key = std::env::var("BOCHA_API_KEY").ok();
        cfg.weather_api_key = std::env::var("WEATHER_API_KEY").ok();
        cfg.google_api_key = std::env::var("GOOGLE_API_KEY").ok();
        cfg.google_cx = std::env::var("GOOGLE_CX").ok();

        cfg.session_memory_size = env_usize_or("SESSION_MEMORY_SIZE", cfg.session_memory_size);
        cfg.context_window_size = env_usize_or("CONTEXT_WINDOW_SIZE", cfg.context_window_size);
        cfg.context_refine_threshold =
            env_usize_or("CONTEXT_REFINE_THRESHOLD", cfg.context_refine_threshold);

        cfg.max_critic_rounds = env_usize_or("MAX_CRITIC_ROUNDS", cfg.max_critic_rounds);
        cfg.duplicate_threshold = env_usize_or("DUPLICATE_THRESHOLD", cfg.duplicate_threshold);
        cfg.max_observe = env_usize_or("MAX_OBSERVE", cfg.max_observe);

        cfg.max_retries = env_usize_or("MAX_RETRIES", cfg.max_retries as usize) as u32;
        cfg.llm_timeout_secs = env_usize_or("LLM_TIMEOUT_SECS", cfg.llm_timeout_secs as usize) as u64;
        cfg.embedding_timeout_secs =
            env_usize_or("EMBEDDING_TIMEOUT_SECS", cfg.embedding_timeout_secs as usize) as u64;
        cfg.tool_http_timeout_secs =
            env_usize_or("TOOL_HTTP_TIMEOUT_SECS", cfg.tool_http_timeout_secs as usize) as u64;

        cfg.vector_db_path = env_or("VECTOR_DB_PATH", cfg.vector_db_path);
        cfg.vector_db_collection = env_or("VECTOR_DB_COLLECTION", cfg.vector_db_collection);
        cfg.data_dir = env_or("LAWAGENT_DATA_DIR", cfg.data_dir);
        cfg.output_dir = env_or("LAWAGENT_OUTPUT_DIR", cfg.output_dir);

        cfg.log_json = std::env::var("LOG_JSON").map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(cfg.log_json);

        Ok(cfg)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| CoreError::config(format!("missing required env var {key}")))
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_usize_or(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_documented_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.session_memory_size, 50);
        assert_eq!(cfg.context_window_size, 10);
        assert_eq!(cfg.context_refine_threshold, 5);
        assert_eq!(cfg.max_critic_rounds, 2);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.llm_timeout_secs, 120);
        assert_eq!(cfg.embedding_timeout_secs, 300);
        assert_eq!(cfg.max_observe, 2000);
        assert!(!cfg.log_json);
    }

    #[test]
    fn missing_llm_api_key_is_config_error() {
        // SAFETY: test runs single-threaded w.r.t. this var within the process;
        // acceptable in a narrowly-scoped unit test.
        unsafe {
            std::env::remove_var("LLM_API_KEY");
        }
        let result = Config::from_env();
        assert!(matches!(result, Err(CoreError::ConfigError(_))));
    }
}
