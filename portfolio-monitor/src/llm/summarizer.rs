// Per-company news summaries
use std::sync::Arc;
use tracing::{info, warn};

use super::{LlmProvider, LlmRequest};
use crate::models::{Article, CompanyNews, SummaryMap};

/// Articles included in the prompt
const PROMPT_ARTICLE_LIMIT: usize = 10;
/// Headlines quoted by the fallback text
const FALLBACK_HEADLINES: usize = 3;

/// Produces one paragraph per company: model-written when a provider is
/// configured and answers, otherwise the deterministic headline fallback.
pub struct Summarizer {
    provider: Option<Arc<dyn LlmProvider>>,
}

impl Summarizer {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { provider }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// `None` when there are no articles. Provider errors are logged and
    /// replaced by [`fallback_summary`].
    pub async fn summarize_company(&self, company: &str, articles: &[Article]) -> Option<String> {
        if articles.is_empty() {
            return None;
        }

        let Some(provider) = &self.provider else {
            return Some(fallback_summary(company, articles));
        };

        let request = LlmRequest {
            prompt: company_news_prompt(company, articles),
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        };

        match provider.generate(request).await {
            Ok(response) if !response.content.trim().is_empty() => {
                info!(
                    "Generated AI summary for {} ({} tokens)",
                    company, response.usage.total_tokens
                );
                Some(response.content.trim().to_string())
            }
            Ok(_) => {
                warn!("Empty AI summary for {}, falling back to headlines", company);
                Some(fallback_summary(company, articles))
            }
            Err(e) => {
                warn!("Error generating AI summary for {}: {}, falling back to headlines", company, e);
                Some(fallback_summary(company, articles))
            }
        }
    }

    /// Summaries for every company; companies without articles get `None`
    /// and never reach the provider.
    pub async fn summarize_all(&self, news: &[CompanyNews]) -> SummaryMap {
        let mut summaries = SummaryMap::new();

        for company in news {
            let summary = if company.has_news() {
                info!("Generating summary for {}...", company.name);
                self.summarize_company(&company.name, company.articles()).await
            } else {
                None
            };
            summaries.insert(company.name.clone(), summary);
        }

        summaries
    }
}

/// Prompt asking for a short investor-focused paragraph.
pub fn company_news_prompt(company: &str, articles: &[Article]) -> String {
    let listing = articles
        .iter()
        .take(PROMPT_ARTICLE_LIMIT)
        .enumerate()
        .map(|(i, article)| {
            let summary = if article.summary.is_empty() {
                "No summary available"
            } else {
                article.summary.as_str()
            };
            format!(
                "{}. {}\n   Date: {}\n   Summary: {}\n",
                i + 1,
                article.title,
                article.published,
                summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are analyzing news articles for a portfolio company. Generate a concise, informative paragraph (2-4 sentences) summarizing the key developments for {company} based on the following articles from the past week.

Focus on:
- Major announcements, funding, partnerships, or product launches
- Significant business developments
- Market activity or notable achievements

Keep it factual, concise, and investor-focused.

Articles:
{listing}

Generate a brief summary paragraph:"#
    )
}

/// Headline-based summary; a pure function of the name and article titles.
pub fn fallback_summary(company: &str, articles: &[Article]) -> String {
    let headlines: Vec<&str> = articles
        .iter()
        .take(FALLBACK_HEADLINES)
        .map(|a| a.title.as_str())
        .collect();

    match articles.len() {
        0 => format!("{} had no news this week.", company),
        1 => format!("{} made headlines with: {}", company, headlines[0]),
        2 => format!(
            "{} had 2 news items: {} and {}",
            company, headlines[0], headlines[1]
        ),
        n => {
            let mut summary = format!(
                "{} had {} news items this week, including: {}",
                company,
                n,
                headlines.join(", ")
            );
            if n > FALLBACK_HEADLINES {
                summary.push_str(&format!(", and {} more.", n - FALLBACK_HEADLINES));
            }
            summary
        }
    }
}
