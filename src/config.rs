use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::Url;

pub const DEFAULT_TOKEN_PATH: &str = "tokens.json";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub token_path: PathBuf,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str, token_path: PathBuf, timeout_ms: u64) -> Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            bail!("base URL must not be empty");
        }
        let base_url =
            Url::parse(trimmed).with_context(|| format!("invalid base URL '{trimmed}'"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "base URL '{trimmed}' must use http or https, not {}",
                base_url.scheme()
            );
        }
        if base_url.query().is_some() {
            bail!("base URL '{trimmed}' must not carry a query string");
        }
        if timeout_ms == 0 {
            bail!("--timeout-ms must be greater than zero");
        }

        Ok(Self {
            base_url,
            token_path,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Absolute URL of `path` under the base URL. `path` starts with `/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }
}
