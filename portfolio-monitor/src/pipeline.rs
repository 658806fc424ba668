use chrono::NaiveDateTime;
use common::Company;
use tracing::info;

use crate::digest::{DigestInput, DigestRenderer};
use crate::funding::FundingTracker;
use crate::ingestion::NewsSource;
use crate::llm::summarizer::Summarizer;
use crate::models::{CompanyNews, Digest, FundingMap, SummaryMap};

/// Collaborators for one digest run. Funding and summaries are optional
/// stages; leaving one out is how `--skip-funding` / `--skip-summary` work.
pub struct DigestPipeline<'a> {
    pub news: &'a NewsSource,
    pub funding: Option<&'a FundingTracker>,
    pub summarizer: Option<&'a Summarizer>,
}

/// Intermediate results and the rendered digest.
pub struct DigestRun {
    pub news: Vec<CompanyNews>,
    pub funding: Option<FundingMap>,
    pub summaries: Option<SummaryMap>,
    pub digest: Digest,
}

impl DigestRun {
    pub fn total_articles(&self) -> usize {
        self.news.iter().map(|c| c.articles().len()).sum()
    }

    pub fn failed_fetches(&self) -> usize {
        self.news.iter().filter(|c| c.fetch_failed()).count()
    }
}

impl DigestPipeline<'_> {
    /// Fetch news, then funding, then summaries, one company at a time, and
    /// render the result with `generated_at` as the report date.
    pub async fn run(&self, companies: &[Company], generated_at: NaiveDateTime) -> DigestRun {
        info!("Fetching news for {} portfolio companies...", companies.len());
        let news = self.news.fetch_all(companies).await;

        let funding = match self.funding {
            Some(tracker) => {
                info!("Fetching funding information...");
                Some(tracker.lookup_all(companies).await)
            }
            None => {
                info!("Skipping funding information");
                None
            }
        };

        let summaries = match self.summarizer {
            Some(summarizer) => Some(summarizer.summarize_all(&news).await),
            None => None,
        };

        info!("Generating digest...");
        let digest = DigestRenderer::new(generated_at).render(&DigestInput {
            news: &news,
            funding: funding.as_ref(),
            summaries: summaries.as_ref(),
        });

        DigestRun {
            news,
            funding,
            summaries,
            digest,
        }
    }
}
