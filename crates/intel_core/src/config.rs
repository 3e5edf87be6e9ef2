use std::env;
use std::net::SocketAddr;

use crate::error::Error;
use crate::Result;

/// Process configuration, loaded once at startup and passed by reference into
/// each pipeline stage. Invalid settings are fatal before any stage runs.
#[derive(Debug, Clone)]
pub struct Settings {
    /// SQLite database path used when the sqlite storage backend is selected.
    pub database_path: String,
    /// Base URL of the inference service.
    pub llm_url: String,
    /// Model identifier sent with every generate request.
    pub llm_model: String,
    /// Extra attempts the inference client may make on transient failures.
    pub llm_max_retries: u32,
    /// Address the query API binds to.
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Upper bound on candidate articles per pipeline run.
    pub max_articles: usize,
    /// Per-request timeout for page fetches and browser navigation, seconds.
    pub scrape_timeout_secs: u64,
    /// Per-request timeout for inference calls, seconds.
    pub analyzer_timeout_secs: u64,
    /// Content truncation bound for prompts, characters.
    pub max_content_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: "intel.db".to_string(),
            llm_url: "http://localhost:11434".to_string(),
            llm_model: "llama3".to_string(),
            llm_max_retries: 1,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            log_level: "info".to_string(),
            max_articles: 100,
            scrape_timeout_secs: 30,
            analyzer_timeout_secs: 30,
            max_content_chars: 16_000,
        }
    }
}

impl Settings {
    /// Loads settings from environment variables, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Settings::default();

        let settings = Settings {
            database_path: env_string("INTEL_DB_PATH", defaults.database_path),
            llm_url: env_string("LLM_SERVICE_URL", defaults.llm_url),
            llm_model: env_string("LLM_MODEL", defaults.llm_model),
            llm_max_retries: env_parse("LLM_MAX_RETRIES", defaults.llm_max_retries)?,
            bind_addr: env_parse("BIND_ADDR", defaults.bind_addr)?,
            log_level: env_string("LOG_LEVEL", defaults.log_level),
            max_articles: env_parse("SCRAPER_MAX_ARTICLES", defaults.max_articles)?,
            scrape_timeout_secs: env_parse("SCRAPER_TIMEOUT", defaults.scrape_timeout_secs)?,
            analyzer_timeout_secs: env_parse("ANALYZER_TIMEOUT", defaults.analyzer_timeout_secs)?,
            max_content_chars: env_parse(
                "ANALYZER_MAX_CONTENT_CHARS",
                defaults.max_content_chars,
            )?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.llm_url)
            .map_err(|e| Error::Config(format!("LLM_SERVICE_URL is not a valid URL: {}", e)))?;
        if self.llm_model.trim().is_empty() {
            return Err(Error::Config("LLM_MODEL must not be empty".to_string()));
        }
        if self.max_articles == 0 {
            return Err(Error::Config(
                "SCRAPER_MAX_ARTICLES must be at least 1".to_string(),
            ));
        }
        if self.scrape_timeout_secs == 0 || self.analyzer_timeout_secs == 0 {
            return Err(Error::Config("timeouts must be at least 1 second".to_string()));
        }
        if self.max_content_chars < 100 {
            return Err(Error::Config(
                "ANALYZER_MAX_CONTENT_CHARS must be at least 100".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_string(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("{} is invalid: {}", key, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_bad_llm_url() {
        let settings = Settings {
            llm_url: "not a url".to_string(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_zero_article_limit() {
        let settings = Settings {
            max_articles: 0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        let settings = Settings {
            scrape_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }
}
