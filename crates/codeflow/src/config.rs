// codeflow/crates/codeflow/src/config.rs

use anyhow::{bail, Context, Result};
use std::env;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::utils::TextUtils;

pub const DEFAULT_API_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_MAX_SIZE_MB: u64 = 10;
pub const DEFAULT_SUPPORTED_EXTENSIONS: &str = "pdf,doc,docx,txt";
pub const DEFAULT_SUPPORTED_MIME_TYPES: &str = "application/pdf,\
    application/msword,\
    application/vnd.openxmlformats-officedocument.wordprocessingml.document,\
    text/plain";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_EXTRACTION_MAX_CHARS: usize = 12_000;
/// Upper bound on MAX_SIZE_MB so byte limits stay well inside `usize`.
pub const MAX_UPLOAD_SIZE_MB: u64 = 4096;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,
    pub cors_origins: Vec<String>,
    pub upload_dir: PathBuf,
    pub max_size_mb: u64,
    pub supported_extensions: Vec<String>,
    pub supported_mime_types: Vec<String>,
    pub llm_base_url: String,
    pub openai_model: String,
    pub openai_api_key: Option<String>,
    pub extraction_max_chars: usize,
    pub llm_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("Failed to load .env file: {}. Using system environment variables.", e);
        } else {
            info!("Loaded environment variables from .env file");
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build and validate a config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_host = get("API_HOST", DEFAULT_API_HOST).trim().to_string();
        if api_host.is_empty() {
            bail!("API_HOST must not be empty");
        }

        let api_port: u16 = get("PORT", &DEFAULT_PORT.to_string())
            .trim()
            .parse()
            .context("PORT must be between 1 and 65535")?;
        if api_port == 0 {
            bail!("PORT must be between 1 and 65535");
        }

        let cors_origins = Self::parse_cors_origins(&get("CORS_ORIGINS", DEFAULT_CORS_ORIGINS))?;
        let upload_dir = Self::parse_upload_dir(&get("UPLOAD_DIR", DEFAULT_UPLOAD_DIR))?;

        let max_size_mb: u64 = get("MAX_SIZE_MB", &DEFAULT_MAX_SIZE_MB.to_string())
            .trim()
            .parse()
            .context("MAX_SIZE_MB must be a positive integer")?;
        if max_size_mb == 0 {
            bail!("MAX_SIZE_MB must be a positive integer");
        }
        if max_size_mb > MAX_UPLOAD_SIZE_MB {
            bail!("MAX_SIZE_MB must be at most {}", MAX_UPLOAD_SIZE_MB);
        }

        let supported_extensions =
            Self::parse_extensions(&get("SUPPORTED_EXTENSIONS", DEFAULT_SUPPORTED_EXTENSIONS));
        if supported_extensions.is_empty() {
            bail!("SUPPORTED_EXTENSIONS must list at least one extension");
        }
        let supported_mime_types =
            Self::parse_mime_types(&get("SUPPORTED_MIME_TYPES", DEFAULT_SUPPORTED_MIME_TYPES))?;

        let llm_base_url = get("LLM_BASE_URL", DEFAULT_LLM_BASE_URL)
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !(llm_base_url.starts_with("http://") || llm_base_url.starts_with("https://")) {
            bail!("LLM_BASE_URL must start with http:// or https://: {}", llm_base_url);
        }

        let openai_model = get("OPENAI_MODEL", DEFAULT_OPENAI_MODEL).trim().to_string();
        if openai_model.is_empty() {
            bail!("OPENAI_MODEL cannot be empty");
        }

        let openai_api_key = lookup("OPENAI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if openai_api_key.is_none() {
            warn!("OPENAI_API_KEY not set; LLM requests will be sent unauthenticated");
        }

        Ok(Self {
            api_host,
            api_port,
            cors_origins,
            upload_dir,
            max_size_mb,
            supported_extensions,
            supported_mime_types,
            llm_base_url,
            openai_model,
            openai_api_key,
            extraction_max_chars: Self::positive(
                "EXTRACTION_MAX_CHARS",
                &get("EXTRACTION_MAX_CHARS", &DEFAULT_EXTRACTION_MAX_CHARS.to_string()),
            )?,
            llm_timeout_seconds: Self::positive("LLM_TIMEOUT_SECONDS", &get("LLM_TIMEOUT_SECONDS", "60"))?,
            request_timeout_seconds: Self::positive(
                "REQUEST_TIMEOUT_SECONDS",
                &get("REQUEST_TIMEOUT_SECONDS", "120"),
            )?,
        })
    }

    fn positive<T>(name: &str, raw: &str) -> Result<T>
    where
        T: std::str::FromStr + PartialEq + Default,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let value: T = raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a positive integer", name))?;
        if value == T::default() {
            bail!("{} must be a positive integer", name);
        }
        Ok(value)
    }

    fn parse_cors_origins(raw: &str) -> Result<Vec<String>> {
        let origins = TextUtils::split_list(raw);
        for origin in &origins {
            if !(origin.starts_with("http://") || origin.starts_with("https://") || origin == "*") {
                bail!("Invalid CORS origin format: {}", origin);
            }
        }
        Ok(origins)
    }

    fn parse_upload_dir(raw: &str) -> Result<PathBuf> {
        let normalized = raw
            .trim()
            .trim_matches(|c: char| c == '\'' || c == '"')
            .trim_end_matches(|c: char| c == '/' || c == '\\');
        if normalized.replace('\\', "/").contains("..") {
            bail!("UPLOAD_DIR: path traversal ('..') is not allowed");
        }
        if normalized.trim().is_empty() {
            bail!("UPLOAD_DIR must not be empty");
        }
        Ok(PathBuf::from(normalized))
    }

    fn parse_extensions(raw: &str) -> Vec<String> {
        let lowered: Vec<String> = TextUtils::split_list(raw)
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        TextUtils::split_list(&lowered.join(","))
    }

    fn parse_mime_types(raw: &str) -> Result<Vec<String>> {
        let mime_types = TextUtils::split_list(raw);
        for mime_type in &mime_types {
            if !mime_type.contains('/') {
                bail!("Invalid MIME type format: {}", mime_type);
            }
        }
        Ok(mime_types)
    }

    pub fn max_size_bytes(&self) -> usize {
        (self.max_size_mb as usize) * 1024 * 1024
    }

    pub fn print_config(&self) {
        info!("Current Configuration:");
        info!("- API: {}:{}", self.api_host, self.api_port);
        info!("- CORS Origins: {}", self.cors_origins.join(", "));
        info!("- Upload Dir: {}", self.upload_dir.display());
        info!("- Max Upload Size: {} MB", self.max_size_mb);
        info!("- Extensions: {}", self.supported_extensions.join(", "));
        info!("- LLM Backend: {} (model: {})", self.llm_base_url, self.openai_model);
        info!("- LLM API Key: {}", if self.openai_api_key.is_some() { "set" } else { "not set" });
        info!("- Extraction Budget: {} chars", self.extraction_max_chars);
        info!("- LLM Timeout: {}s", self.llm_timeout_seconds);
        info!("- Request Timeout: {}s", self.request_timeout_seconds);
    }

    pub fn api_addr(&self) -> Result<SocketAddr> {
        (self.api_host.as_str(), self.api_port)
            .to_socket_addrs()
            .with_context(|| format!("Invalid API address {}:{}", self.api_host, self.api_port))?
            .next()
            .with_context(|| format!("No address resolved for {}", self.api_host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    // ===== Defaults =====

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.api_host, "127.0.0.1");
        assert_eq!(config.api_port, 8081);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.supported_extensions, vec!["pdf", "doc", "docx", "txt"]);
        assert_eq!(config.supported_mime_types.len(), 4);
        assert_eq!(config.openai_model, "gpt-4-turbo");
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.extraction_max_chars, 12_000);
    }

    #[test]
    fn test_max_size_bytes() {
        let config = config_from(&[("MAX_SIZE_MB", "3")]).unwrap();
        assert_eq!(config.max_size_bytes(), 3 * 1024 * 1024);
    }

    #[test]
    fn test_api_addr_parsing() {
        let config = config_from(&[("API_HOST", "0.0.0.0"), ("PORT", "5000")]).unwrap();
        let addr = config.api_addr().unwrap();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 5000);
    }

    // ===== Validation =====

    #[test]
    fn test_port_out_of_range_rejected() {
        assert!(config_from(&[("PORT", "0")]).is_err());
        assert!(config_from(&[("PORT", "70000")]).is_err());
        assert!(config_from(&[("PORT", "http")]).is_err());
    }

    #[test]
    fn test_cors_origins_normalized_and_validated() {
        let config = config_from(&[(
            "CORS_ORIGINS",
            " https://a.example , http://b.example,https://a.example,,",
        )])
        .unwrap();
        assert_eq!(config.cors_origins, vec!["https://a.example", "http://b.example"]);

        assert!(config_from(&[("CORS_ORIGINS", "*")]).is_ok());
        assert!(config_from(&[("CORS_ORIGINS", "ftp://nope")]).is_err());
    }

    #[test]
    fn test_upload_dir_rules() {
        let config = config_from(&[("UPLOAD_DIR", "\"data/uploads/\"")]).unwrap();
        assert_eq!(config.upload_dir, PathBuf::from("data/uploads"));

        assert!(config_from(&[("UPLOAD_DIR", "../etc")]).is_err());
        assert!(config_from(&[("UPLOAD_DIR", "a\\..\\b")]).is_err());
        assert!(config_from(&[("UPLOAD_DIR", "  ")]).is_err());
    }

    #[test]
    fn test_extensions_lowercased_and_deduplicated() {
        let config = config_from(&[("SUPPORTED_EXTENSIONS", ".PDF, txt, .Txt, md")]).unwrap();
        assert_eq!(config.supported_extensions, vec!["pdf", "txt", "md"]);
    }

    #[test]
    fn test_mime_types_must_have_slash() {
        assert!(config_from(&[("SUPPORTED_MIME_TYPES", "text/plain, plain")]).is_err());
    }

    #[test]
    fn test_positive_limits() {
        assert!(config_from(&[("MAX_SIZE_MB", "0")]).is_err());
        assert!(config_from(&[("MAX_SIZE_MB", "18446744073709551615")]).is_err());
        assert!(config_from(&[("MAX_SIZE_MB", "4097")]).is_err());
        let config = config_from(&[("MAX_SIZE_MB", "4096")]).unwrap();
        assert_eq!(config.max_size_bytes(), 4096 * 1024 * 1024);
        assert!(config_from(&[("EXTRACTION_MAX_CHARS", "0")]).is_err());
        assert!(config_from(&[("LLM_TIMEOUT_SECONDS", "-1")]).is_err());
    }

    #[test]
    fn test_llm_settings() {
        let config = config_from(&[
            ("LLM_BASE_URL", "http://localhost:8000/"),
            ("OPENAI_API_KEY", " sk-test "),
            ("OPENAI_MODEL", "local-llm"),
        ])
        .unwrap();
        assert_eq!(config.llm_base_url, "http://localhost:8000");
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai_model, "local-llm");

        assert!(config_from(&[("LLM_BASE_URL", "localhost:8000")]).is_err());
        assert!(config_from(&[("OPENAI_MODEL", "  ")]).is_err());
    }
}
