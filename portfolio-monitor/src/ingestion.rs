use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use common::{Company, NewsConfig, DEFAULT_NEWS_URL};
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use reqwest::Client;
use scraper::Html;
use tracing::{error, info};

use crate::error::FetchError;
use crate::models::{Article, CompanyNews, UNKNOWN_DATE, UNKNOWN_SOURCE};

pub const DEFAULT_DAYS_BACK: i64 = 7;
pub const DEFAULT_MAX_ARTICLES: usize = 10;
const SUMMARY_MAX_CHARS: usize = 200;

/// RSS news search adapter (Google News style endpoint).
pub struct NewsSource {
    client: Client,
    base_url: String,
    language: String,
    region: String,
    ceid: String,
    days_back: i64,
    max_articles: usize,
}

impl NewsSource {
    pub fn new(config: &NewsConfig, timeout_secs: u64, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_NEWS_URL.to_string()),
            language: config.language.clone().unwrap_or_else(|| "en-US".to_string()),
            region: config.region.clone().unwrap_or_else(|| "US".to_string()),
            ceid: config.ceid.clone().unwrap_or_else(|| "US:en".to_string()),
            days_back: config.days_back.unwrap_or(DEFAULT_DAYS_BACK),
            max_articles: config.max_articles.unwrap_or(DEFAULT_MAX_ARTICLES),
        })
    }

    /// Override the recency window (the `--days` flag).
    pub fn with_days_back(mut self, days: i64) -> Self {
        self.days_back = days;
        self
    }

    pub fn days_back(&self) -> i64 {
        self.days_back
    }

    /// Search URL for an exact-phrase query.
    pub fn search_url(&self, query: &str) -> Result<url::Url, FetchError> {
        let quoted = format!("\"{}\"", query);
        let url = url::Url::parse_with_params(
            &self.base_url,
            &[
                ("q", quoted.as_str()),
                ("hl", self.language.as_str()),
                ("gl", self.region.as_str()),
                ("ceid", self.ceid.as_str()),
            ],
        )?;
        Ok(url)
    }

    /// Fetches the feed for `query` and returns the recent articles.
    pub async fn fetch_company_news(&self, query: &str) -> Result<Vec<Article>, FetchError> {
        let url = self.search_url(query)?;
        info!("Fetching news for: {}", query);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let bytes = response.bytes().await?;
        let feed = parser::parse(bytes.as_ref())?;

        let cutoff = recency_cutoff(Utc::now(), self.days_back);
        let articles = articles_from_feed(&feed, cutoff, self.max_articles);
        if feed.entries.is_empty() {
            info!("No news found for {}", query);
        } else {
            info!("Found {} recent articles for {}", articles.len(), query);
        }
        Ok(articles)
    }

    /// Fetches news for every company in order. One company's failure is
    /// recorded and logged; the remaining companies are still fetched.
    pub async fn fetch_all(&self, companies: &[Company]) -> Vec<CompanyNews> {
        let mut results = Vec::with_capacity(companies.len());

        for company in companies {
            info!(
                "Searching for: {} (query: {})",
                company.name(),
                company.query()
            );
            let articles = self.fetch_company_news(company.query()).await;
            if let Err(e) = &articles {
                error!("Error fetching news for {}: {}", company.name(), e);
            }
            results.push(CompanyNews::new(company.name(), articles));
        }

        results
    }
}

/// Start of the recency window. Negative windows count as zero; a window
/// reaching past the representable range keeps every dated entry.
pub fn recency_cutoff(now: DateTime<Utc>, days_back: i64) -> DateTime<Utc> {
    Duration::try_days(days_back.max(0))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Turns parsed feed entries into articles.
///
/// Only the first `max` entries are considered, in feed order. Entries without
/// a title or link are dropped. An entry is excluded for age only when its date
/// parsed and is older than `cutoff`; a missing or unparseable date keeps it.
pub fn articles_from_feed(feed: &Feed, cutoff: DateTime<Utc>, max: usize) -> Vec<Article> {
    feed.entries
        .iter()
        .take(max)
        .filter_map(|entry| article_from_entry(entry, cutoff))
        .collect()
}

fn article_from_entry(entry: &Entry, cutoff: DateTime<Utc>) -> Option<Article> {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())?;
    let link = entry
        .links
        .first()
        .map(|l| l.href.trim().to_string())
        .filter(|l| !l.is_empty())?;

    let published = match entry.published.or(entry.updated) {
        Some(date) if date < cutoff => return None,
        Some(date) => date.format("%Y-%m-%d %H:%M").to_string(),
        None => UNKNOWN_DATE.to_string(),
    };

    let summary = entry
        .summary
        .as_ref()
        .map(|s| clean_summary(&s.content))
        .unwrap_or_default();

    Some(Article {
        title,
        link,
        published,
        source: UNKNOWN_SOURCE.to_string(),
        summary,
    })
}

/// Strips markup from a feed description and caps its length.
pub fn clean_summary(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text: String = fragment.root_element().text().collect::<Vec<_>>().join("");

    // Length is measured on the raw text; trimming happens after the cut.
    let text = if text.chars().count() > SUMMARY_MAX_CHARS {
        let cut: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
        format!("{}...", cut)
    } else {
        text
    };
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rss(items: &str) -> Feed {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>"Acme" - Google News</title>
<link>https://news.google.com</link><description>Google News</description>
{}
</channel></rss>"#,
            items
        );
        parser::parse(xml.as_bytes()).expect("parse rss")
    }

    fn item(title: &str, link: &str, pub_date: Option<&str>) -> String {
        let date = pub_date
            .map(|d| format!("<pubDate>{}</pubDate>", d))
            .unwrap_or_default();
        format!(
            "<item><title>{}</title><link>{}</link>{}<description>&lt;a href=\"{}\"&gt;{}&lt;/a&gt;</description></item>",
            title, link, date, link, title
        )
    }

    #[test]
    fn unparseable_dates_are_kept_and_old_dates_dropped() {
        let recent = (Utc::now() - Duration::days(1)).to_rfc2822();
        let old = (Utc::now() - Duration::days(30)).to_rfc2822();
        let feed = rss(&[
            item("Acme raises Series B", "https://example.com/a", Some(&recent)),
            item("Acme launches product", "https://example.com/b", Some("sometime last week")),
            item("Acme founded", "https://example.com/c", Some(&old)),
            item("Acme hires", "https://example.com/d", None),
        ]
        .join("\n"));

        let cutoff = Utc::now() - Duration::days(7);
        let articles = articles_from_feed(&feed, cutoff, DEFAULT_MAX_ARTICLES);

        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Acme raises Series B", "Acme launches product", "Acme hires"]
        );
        assert_ne!(articles[0].published, UNKNOWN_DATE);
        assert_eq!(articles[1].published, UNKNOWN_DATE);
        assert_eq!(articles[2].published, UNKNOWN_DATE);
        assert!(articles.iter().all(|a| a.source == UNKNOWN_SOURCE));
        assert_eq!(articles[0].summary, "Acme raises Series B");
    }

    #[test]
    fn only_first_entries_in_feed_order_are_kept() {
        let items: Vec<String> = (1..=12)
            .map(|i| item(&format!("Story {}", i), &format!("https://example.com/{}", i), None))
            .collect();
        let feed = rss(&items.join("\n"));

        let articles = articles_from_feed(&feed, Utc::now(), DEFAULT_MAX_ARTICLES);
        assert_eq!(articles.len(), 10);
        assert_eq!(articles[0].title, "Story 1");
        assert_eq!(articles[9].title, "Story 10");
    }

    #[test]
    fn entries_without_title_or_link_are_dropped() {
        let feed = rss(
            "<item><link>https://example.com/no-title</link></item>\n\
             <item><title>No link here</title></item>\n\
             <item><title>Complete</title><link>https://example.com/ok</link></item>",
        );
        let articles = articles_from_feed(&feed, Utc::now(), DEFAULT_MAX_ARTICLES);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Complete");
        assert_eq!(articles[0].summary, "");
    }

    #[test]
    fn summary_is_stripped_and_truncated() {
        let long = format!("<p>{}</p>", "word ".repeat(80));
        let cleaned = clean_summary(&long);
        assert!(cleaned.ends_with("..."));
        assert!(cleaned.chars().count() <= SUMMARY_MAX_CHARS + 3);
        assert!(!cleaned.contains('<'));

        assert_eq!(clean_summary("<b>Acme</b> ships"), "Acme ships");
    }

    #[test]
    fn summary_cut_keeps_raw_text_before_ellipsis() {
        let raw = format!("  {}", "a ".repeat(150));
        let cleaned = clean_summary(&raw);
        let expected = format!("{}...", "a ".repeat(99));
        assert_eq!(cleaned, expected.trim_start());

        let short = format!("{}  ", "b".repeat(197));
        assert_eq!(clean_summary(&short), "b".repeat(197));
    }

    #[test]
    fn cutoff_saturates_for_huge_windows() {
        let now = Utc::now();
        assert_eq!(recency_cutoff(now, 7), now - Duration::days(7));
        assert_eq!(recency_cutoff(now, -3), now);
        assert_eq!(recency_cutoff(now, 100_000_000), DateTime::<Utc>::MIN_UTC);
        assert_eq!(recency_cutoff(now, i64::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn date_only_pub_dates_read_as_unknown() {
        let feed = rss(&item(
            "Acme annual report",
            "https://example.com/report",
            Some("2024-01-01"),
        ));
        let articles = articles_from_feed(&feed, Utc::now(), DEFAULT_MAX_ARTICLES);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].published, UNKNOWN_DATE);
    }

    #[test]
    fn search_url_quotes_and_encodes_query() {
        let source = NewsSource::new(&NewsConfig::default(), 10, "test").expect("source");
        let url = source.search_url("Acme & Co").expect("url");
        assert!(url.as_str().starts_with(DEFAULT_NEWS_URL));
        let q = url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned());
        assert_eq!(q.as_deref(), Some("\"Acme & Co\""));
        assert!(url.as_str().contains("hl=en-US"));
        assert!(url.as_str().contains("ceid=US%3Aen"));
    }
}
