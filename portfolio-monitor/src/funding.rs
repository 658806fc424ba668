//! Funding signal lookup.
//!
//! This is an unreliable heuristic, not a funding-data integration: it runs a
//! generic web search for the company and only reports whether
//! funding-related words appear anywhere in the result page. Round, amount and
//! valuation fields are never extracted.

use anyhow::Context;
use common::{Company, FundingConfig, BROWSER_USER_AGENT, DEFAULT_SEARCH_URL};
use reqwest::Client;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::FetchError;
use crate::models::{FundingLookup, FundingMap, FundingRecord, FundingStatus};
use crate::throttle::{self, Throttle};

pub const FUNDING_KEYWORDS: [&str; 6] =
    ["raised", "funding", "valuation", "Series", "million", "billion"];

/// Seconds between lookups when settings don't say otherwise.
pub const DEFAULT_MIN_INTERVAL_SECS: u64 = 3;

pub struct FundingTracker {
    client: Client,
    search_url: String,
    throttle: Arc<dyn Throttle>,
}

impl FundingTracker {
    pub fn new(
        search_url: impl Into<String>,
        timeout_secs: u64,
        user_agent: &str,
        throttle: Arc<dyn Throttle>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            client,
            search_url: search_url.into(),
            throttle,
        })
    }

    pub fn from_config(config: &FundingConfig, timeout_secs: u64) -> anyhow::Result<Self> {
        let interval = Duration::from_secs(
            config
                .min_interval_seconds
                .unwrap_or(DEFAULT_MIN_INTERVAL_SECS),
        );
        let throttle = throttle::from_settings(
            config.throttle.as_deref(),
            interval,
            config.burst.unwrap_or(1),
        )?;

        Self::new(
            config
                .search_url
                .clone()
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            timeout_secs,
            config.user_agent.as_deref().unwrap_or(BROWSER_USER_AGENT),
            throttle,
        )
    }

    /// Searches for `company` and flags whether funding keywords show up.
    pub async fn lookup(&self, company: &str) -> FundingLookup {
        self.throttle.acquire().await;

        let query = format!("{} funding round valuation", company);
        let url = url::Url::parse_with_params(&self.search_url, &[("q", query.as_str())])?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        let mut record = FundingRecord::no_data(company);
        if mentions_funding(&page_text(&body)) {
            record.status = FundingStatus::MaybeAvailable;
        }
        Ok(record)
    }

    /// Looks up every company in order, keyed by display name. The display
    /// name is searched even when the company has a news query override.
    pub async fn lookup_all(&self, companies: &[Company]) -> FundingMap {
        let mut results = FundingMap::new();

        for company in companies {
            let name = company.name();
            info!("Checking funding info for: {}", name);
            let lookup = self.lookup(name).await;
            if let Err(e) = &lookup {
                warn!("Could not fetch funding info for {}: {}", name, e);
            }
            results.insert(name.to_string(), lookup);
        }

        results
    }
}

/// Visible text of an HTML page.
fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document.root_element().text().collect::<Vec<_>>().join(" ")
}

/// Case-sensitive keyword presence check.
pub fn mentions_funding(text: &str) -> bool {
    FUNDING_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}
