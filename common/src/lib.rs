/*!
common/src/lib.rs

Shared configuration types and loaders for Portfolio Monitor.

This file provides:
- Settings data structures (deserialized from TOML, every section optional)
- A loader that layers an override settings file on top of a default one
- The portfolio company list (deserialized from YAML)
- Secrets read from the process environment
*/

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_NEWS_URL: &str = "https://news.google.com/rss/search";
pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search";
pub const DEFAULT_USER_AGENT: &str = "PortfolioMonitor/0.1.0";
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_COMPANIES_PATH: &str = "config/companies.yaml";

/// News feed search configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsConfig {
    /// RSS search endpoint, queried with `q=<"company">` plus locale params
    pub base_url: Option<String>,
    /// Trailing window in days; articles with an older parsed date are dropped
    pub days_back: Option<i64>,
    /// Number of feed entries considered per company
    pub max_articles: Option<usize>,
    pub language: Option<String>,
    pub region: Option<String>,
    pub ceid: Option<String>,
}

/// Funding heuristic configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundingConfig {
    pub enabled: Option<bool>,
    pub search_url: Option<String>,
    pub user_agent: Option<String>,
    /// "token_bucket" (default) or "fixed"
    pub throttle: Option<String>,
    pub min_interval_seconds: Option<u64>,
    pub burst: Option<u32>,
}

/// Politeness / fetching configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolitenessConfig {
    pub fetch_timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
}

/// Remote LLM endpoint config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteLlmConfig {
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
}

/// LLM top-level config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub adapter: Option<String>, // "anthropic", "remote", "none"
    pub remote: Option<RemoteLlmConfig>,
}

/// Outgoing mail configuration (credentials come from the environment)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub timeout_seconds: Option<u64>,
}

/// Digest archive configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: Option<String>,
}

/// Top-level application settings (deserialized from config.default.toml / config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub news: Option<NewsConfig>,
    pub funding: Option<FundingConfig>,
    pub politeness: Option<PolitenessConfig>,
    pub llm: Option<LlmConfig>,
    pub email: Option<EmailConfig>,
    pub output: Option<OutputConfig>,
}

impl Settings {
    /// Load settings from a single TOML file asynchronously.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read settings file: {}", path.as_ref().display()))?;
        let settings: Settings =
            toml::from_str(&data).context("Failed to parse TOML settings")?;
        Ok(settings)
    }

    /// Load settings with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    /// With neither present every section falls back to built-in defaults.
    pub async fn load_with_defaults(
        default_path: Option<&Path>,
        override_path: Option<&Path>,
    ) -> Result<Self> {
        let mut value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read settings: {}", path.display()))?;
            let layer: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse settings: {}", path.display()))?;
            merge_toml(&mut value, layer);
        }

        let settings: Settings = value
            .try_into()
            .context("Failed to parse merged settings")?;
        Ok(settings)
    }

    pub fn news(&self) -> NewsConfig {
        self.news.clone().unwrap_or_default()
    }

    pub fn funding(&self) -> FundingConfig {
        self.funding.clone().unwrap_or_default()
    }

    pub fn email(&self) -> EmailConfig {
        self.email.clone().unwrap_or_default()
    }

    pub fn fetch_timeout_seconds(&self) -> u64 {
        self.politeness
            .as_ref()
            .and_then(|p| p.fetch_timeout_seconds)
            .unwrap_or(10)
    }

    pub fn user_agent(&self) -> String {
        self.politeness
            .as_ref()
            .and_then(|p| p.user_agent.clone())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    pub fn output_dir(&self) -> String {
        self.output
            .as_ref()
            .and_then(|o| o.dir.clone())
            .unwrap_or_else(|| "output".to_string())
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// A portfolio company: either a bare name or a name with a search override.
///
/// ```yaml
/// companies:
///   - Acme
///   - name: Globex
///     search: Globex Corporation
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Company {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        search: Option<String>,
    },
}

impl Company {
    /// Display name; the identity used to key every per-company mapping.
    pub fn name(&self) -> &str {
        match self {
            Company::Name(name) => name,
            Company::Detailed { name, .. } => name,
        }
    }

    /// News search query: the override when present, else the display name.
    pub fn query(&self) -> &str {
        match self {
            Company::Name(name) => name,
            Company::Detailed { name, search } => search.as_deref().unwrap_or(name),
        }
    }
}

impl From<&str> for Company {
    fn from(name: &str) -> Self {
        Company::Name(name.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CompanyFile {
    #[serde(default)]
    companies: Vec<Company>,
}

/// Parse a YAML company list. Entries with an empty name are skipped;
/// a list with no usable entries is an error.
pub fn parse_companies(yaml: &str) -> Result<Vec<Company>> {
    let file: CompanyFile =
        serde_yaml::from_str(yaml).context("Error parsing YAML configuration")?;
    let companies: Vec<Company> = file
        .companies
        .into_iter()
        .filter(|c| !c.name().trim().is_empty())
        .collect();
    if companies.is_empty() {
        bail!("No companies found in configuration file");
    }
    Ok(companies)
}

/// Load the company list from a YAML file.
pub async fn load_companies<P: AsRef<Path>>(path: P) -> Result<Vec<Company>> {
    let path = path.as_ref();
    if !path.exists() {
        bail!(
            "Configuration file not found: {} (create it with your portfolio companies)",
            path.display()
        );
    }
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    parse_companies(&data).with_context(|| format!("Invalid configuration: {}", path.display()))
}

/// Mail credentials, read from the environment.
#[derive(Clone)]
pub struct Secrets {
    pub smtp_email: String,
    pub smtp_password: String,
    pub recipient_email: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("smtp_email", &self.smtp_email)
            .field("smtp_password", &"<redacted>")
            .field("recipient_email", &self.recipient_email)
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `SMTP_EMAIL` and `SMTP_PASSWORD` are required; `RECIPIENT_EMAIL`
    /// defaults to the sender. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).with_context(|| {
                format!("Required environment variable {} not set", key)
            })
        };

        let smtp_email = required("SMTP_EMAIL")?;
        let smtp_password = required("SMTP_PASSWORD")?;
        let recipient_email = get("RECIPIENT_EMAIL").unwrap_or_else(|| smtp_email.clone());

        Ok(Self {
            smtp_email,
            smtp_password,
            recipient_email,
        })
    }
}
