use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::FetchError;

pub const UNKNOWN_DATE: &str = "Unknown date";
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Sentinel returned by [`FundingRecord::summary_line`] when nothing was found.
/// The renderer omits the funding line when it sees this exact text.
pub const NO_FUNDING_SUMMARY: &str = "No recent public funding data available";

/// A news item as it appears in the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    /// `%Y-%m-%d %H:%M` (UTC) or [`UNKNOWN_DATE`]
    pub published: String,
    pub source: String,
    /// Feed description with markup stripped, at most 200 chars plus "..."
    pub summary: String,
}

/// News fetched for one company, or the reason it could not be fetched.
#[derive(Debug)]
pub struct CompanyNews {
    pub name: String,
    pub articles: Result<Vec<Article>, FetchError>,
}

impl CompanyNews {
    pub fn new(name: impl Into<String>, articles: Result<Vec<Article>, FetchError>) -> Self {
        Self {
            name: name.into(),
            articles,
        }
    }

    /// Articles for rendering; a failed fetch reads as an empty list.
    pub fn articles(&self) -> &[Article] {
        self.articles.as_deref().unwrap_or(&[])
    }

    pub fn has_news(&self) -> bool {
        !self.articles().is_empty()
    }

    pub fn fetch_failed(&self) -> bool {
        self.articles.is_err()
    }
}

/// Outcome of the funding heuristic. Only two states exist because the
/// lookup detects keyword presence; it never extracts figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FundingStatus {
    #[default]
    NoData,
    MaybeAvailable,
}

impl FundingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundingStatus::NoData => "No public funding data available",
            FundingStatus::MaybeAvailable => {
                "Some funding information may be available in search results"
            }
        }
    }
}

impl std::fmt::Display for FundingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Funding signal for one company.
///
/// `last_round`, `total_raised`, `valuation` and `source` exist for
/// structured data, but the keyword heuristic leaves them empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRecord {
    pub company: String,
    pub status: FundingStatus,
    pub last_round: Option<String>,
    pub total_raised: Option<String>,
    pub valuation: Option<String>,
    pub source: Option<String>,
}

impl FundingRecord {
    pub fn no_data(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            status: FundingStatus::NoData,
            last_round: None,
            total_raised: None,
            valuation: None,
            source: None,
        }
    }

    /// One-line summary for the digest.
    pub fn summary_line(&self) -> String {
        if self.status == FundingStatus::NoData {
            return NO_FUNDING_SUMMARY.to_string();
        }

        let parts: Vec<String> = [
            ("Last Round", &self.last_round),
            ("Total Raised", &self.total_raised),
            ("Valuation", &self.valuation),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}: {}", label, v)))
        .collect();

        if parts.is_empty() {
            self.status.to_string()
        } else {
            parts.join(" | ")
        }
    }
}

pub type FundingLookup = Result<FundingRecord, FetchError>;

/// Funding results keyed by company display name.
pub type FundingMap = BTreeMap<String, FundingLookup>;

/// Summaries keyed by company display name; `None` when skipped.
pub type SummaryMap = BTreeMap<String, Option<String>>;

/// Rendered report plus its subject line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_yields_sentinel() {
        let record = FundingRecord::no_data("Acme");
        assert_eq!(record.summary_line(), NO_FUNDING_SUMMARY);
    }

    #[test]
    fn maybe_available_without_figures_reports_status() {
        let mut record = FundingRecord::no_data("Acme");
        record.status = FundingStatus::MaybeAvailable;
        assert_eq!(
            record.summary_line(),
            "Some funding information may be available in search results"
        );
    }

    #[test]
    fn populated_figures_are_joined() {
        let mut record = FundingRecord::no_data("Acme");
        record.status = FundingStatus::MaybeAvailable;
        record.last_round = Some("Series B".into());
        record.valuation = Some("$1B".into());
        assert_eq!(record.summary_line(), "Last Round: Series B | Valuation: $1B");
    }

    #[test]
    fn failed_fetch_reads_as_no_news() {
        let news = CompanyNews::new("Acme", Err(FetchError::Feed("bad xml".into())));
        assert!(news.articles().is_empty());
        assert!(!news.has_news());
        assert!(news.fetch_failed());
    }
}
