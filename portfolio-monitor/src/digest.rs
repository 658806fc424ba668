use chrono::NaiveDateTime;

use crate::models::{
    Article, CompanyNews, Digest, FundingMap, FundingRecord, SummaryMap, NO_FUNDING_SUMMARY,
};

const WIDTH: usize = 80;

/// Everything the renderer reads. Funding and summaries are optional as a
/// whole and may also lack entries for individual companies.
pub struct DigestInput<'a> {
    pub news: &'a [CompanyNews],
    pub funding: Option<&'a FundingMap>,
    pub summaries: Option<&'a SummaryMap>,
}

/// Formats the weekly plain-text report. Output depends only on the input
/// and the timestamp given to [`DigestRenderer::new`].
pub struct DigestRenderer {
    generated_at: NaiveDateTime,
}

impl DigestRenderer {
    pub fn new(generated_at: NaiveDateTime) -> Self {
        Self { generated_at }
    }

    pub fn render(&self, input: &DigestInput<'_>) -> Digest {
        Digest {
            subject: self.subject_line(input.news),
            body: self.body(input),
        }
    }

    pub fn body(&self, input: &DigestInput<'_>) -> String {
        let mut lines: Vec<String> = Vec::new();

        lines.push(rule('='));
        lines.push("PORTFOLIO WEEKLY DIGEST".to_string());
        lines.push(format!("Week of {}", self.generated_at.format("%B %d, %Y")));
        lines.push(rule('='));
        lines.push(String::new());

        executive_summary(&mut lines, input.news);
        lines.push(String::new());

        lines.push(rule('='));
        lines.push("DETAILED COMPANY REPORTS".to_string());
        lines.push(rule('='));
        lines.push(String::new());

        let (mut with_news, mut without_news): (Vec<&CompanyNews>, Vec<&CompanyNews>) =
            input.news.iter().partition(|c| c.has_news());
        with_news.sort_by(|a, b| a.name.cmp(&b.name));
        without_news.sort_by(|a, b| a.name.cmp(&b.name));

        for company in with_news {
            let funding = input
                .funding
                .and_then(|f| f.get(&company.name))
                .and_then(|lookup| lookup.as_ref().ok());
            let summary = input
                .summaries
                .and_then(|s| s.get(&company.name))
                .and_then(|s| s.as_deref());
            company_section(&mut lines, &company.name, company.articles(), funding, summary);
            lines.push(String::new());
        }

        if !without_news.is_empty() {
            lines.push(rule('-'));
            lines.push("NO NEWS THIS WEEK".to_string());
            lines.push(rule('-'));
            lines.push(String::new());
            for company in without_news {
                if company.fetch_failed() {
                    lines.push(format!("  • {} (news unavailable)", company.name));
                } else {
                    lines.push(format!("  • {}", company.name));
                }
            }
            lines.push(String::new());
        }

        lines.push(rule('='));
        lines.push(format!(
            "End of digest - Generated on {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        lines.push(rule('='));

        lines.join("\n")
    }

    pub fn subject_line(&self, news: &[CompanyNews]) -> String {
        let companies_with_news = news.iter().filter(|c| c.has_news()).count();
        let total_articles: usize = news.iter().map(|c| c.articles().len()).sum();
        let week_of = self.generated_at.format("%m/%d/%Y");

        let tail = match (total_articles, companies_with_news) {
            (0, _) => "Quiet Week".to_string(),
            (_, 1) => "1 Company Update".to_string(),
            (_, n) => format!("{} Companies with News", n),
        };
        format!("Portfolio Digest - Week of {} - {}", week_of, tail)
    }
}

fn rule(c: char) -> String {
    c.to_string().repeat(WIDTH)
}

fn executive_summary(lines: &mut Vec<String>, news: &[CompanyNews]) {
    let companies_with_news = news.iter().filter(|c| c.has_news()).count();
    let total_articles: usize = news.iter().map(|c| c.articles().len()).sum();

    lines.push(rule('-'));
    lines.push("EXECUTIVE SUMMARY".to_string());
    lines.push(rule('-'));
    lines.push(String::new());
    lines.push(format!("  Portfolio Companies: {}", news.len()));
    lines.push(format!("  Companies with News: {}", companies_with_news));
    lines.push(format!("  Total Articles: {}", total_articles));
    lines.push(String::new());

    if companies_with_news == 0 {
        lines.push("  No companies had news this week.".to_string());
        return;
    }

    lines.push("  Companies in the news this week:".to_string());
    for company in news.iter().filter(|c| c.has_news()) {
        lines.push(format!(
            "    • {} ({} articles)",
            company.name,
            company.articles().len()
        ));
    }
}

fn company_section(
    lines: &mut Vec<String>,
    name: &str,
    articles: &[Article],
    funding: Option<&FundingRecord>,
    summary: Option<&str>,
) {
    lines.push(rule('-'));
    lines.push(name.to_uppercase());
    lines.push(rule('-'));
    lines.push(String::new());

    if let Some(record) = funding {
        let funding_line = record.summary_line();
        if funding_line != NO_FUNDING_SUMMARY {
            lines.push(format!("Funding: {}", funding_line));
            lines.push(String::new());
        }
    }

    if let Some(summary) = summary.filter(|s| !s.trim().is_empty()) {
        lines.push("SUMMARY:".to_string());
        lines.push(String::new());
        lines.push(format!("  {}", summary));
        lines.push(String::new());
    }

    lines.push(format!("LINKS ({} articles):", articles.len()));
    lines.push(String::new());
    for (i, article) in articles.iter().enumerate() {
        lines.push(format!("  [{}] {}", i + 1, article.title));
        lines.push(format!("      {}", article.link));
        lines.push(format!("      {} | {}", article.source, article.published));
        lines.push(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::{FundingStatus, UNKNOWN_DATE, UNKNOWN_SOURCE};
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .expect("valid timestamp")
    }

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            link: format!("https://example.com/{}", title.replace(' ', "-")),
            published: UNKNOWN_DATE.to_string(),
            source: UNKNOWN_SOURCE.to_string(),
            summary: String::new(),
        }
    }

    fn news(name: &str, titles: &[&str]) -> CompanyNews {
        CompanyNews::new(name, Ok(titles.iter().map(|t| article(t)).collect()))
    }

    fn render(
        news: &[CompanyNews],
        funding: Option<&FundingMap>,
        summaries: Option<&SummaryMap>,
    ) -> Digest {
        DigestRenderer::new(at()).render(&DigestInput {
            news,
            funding,
            summaries,
        })
    }

    #[test]
    fn subject_variants() {
        let renderer = DigestRenderer::new(at());
        assert_eq!(
            renderer.subject_line(&[news("Acme", &[]), news("Globex", &[])]),
            "Portfolio Digest - Week of 03/04/2024 - Quiet Week"
        );
        assert_eq!(
            renderer.subject_line(&[news("Acme", &["One", "Two"]), news("Globex", &[])]),
            "Portfolio Digest - Week of 03/04/2024 - 1 Company Update"
        );
        let three = [
            news("Acme", &["One"]),
            news("Globex", &["Two"]),
            news("Initech", &["Three"]),
        ];
        assert!(renderer
            .subject_line(&three)
            .ends_with("3 Companies with News"));
        assert!(renderer.subject_line(&[]).ends_with("Quiet Week"));
    }

    #[test]
    fn companies_are_partitioned_and_sorted() {
        let list = vec![
            news("Zeta", &["Zeta ships"]),
            news("Initech", &[]),
            news("Acme", &["Acme raises Series B"]),
            CompanyNews::new("Globex", Err(FetchError::Feed("bad".into()))),
        ];
        let digest = render(&list, None, None);
        let body = &digest.body;

        let acme = body.find("\nACME\n").expect("acme section");
        let zeta = body.find("\nZETA\n").expect("zeta section");
        assert!(acme < zeta);

        let no_news = body.find("NO NEWS THIS WEEK").expect("no news block");
        assert!(zeta < no_news);
        assert!(body.contains("  • Globex (news unavailable)\n  • Initech"));
        assert!(!body.contains("\nINITECH\n"));

        // executive summary keeps configuration order
        assert!(body.contains("    • Zeta (1 articles)\n    • Acme (1 articles)"));
        assert!(body.contains("  Portfolio Companies: 4"));
        assert!(body.contains("  Companies with News: 2"));
        assert!(body.contains("  Total Articles: 2"));
        assert!(body.starts_with(&"=".repeat(80)));
        assert!(body.contains("Week of March 04, 2024"));
        assert!(body.contains("End of digest - Generated on 2024-03-04 09:30:00"));
    }

    #[test]
    fn funding_line_hidden_for_sentinel() {
        let list = vec![news("Acme", &["Acme ships"]), news("Globex", &["Globex ships"])];
        let mut funding = FundingMap::new();
        funding.insert("Acme".into(), Ok(FundingRecord::no_data("Acme")));
        let mut maybe = FundingRecord::no_data("Globex");
        maybe.status = FundingStatus::MaybeAvailable;
        funding.insert("Globex".into(), Ok(maybe));

        let body = render(&list, Some(&funding), None).body;
        assert_eq!(body.matches("Funding: ").count(), 1);
        assert!(body.contains("\nGLOBEX\n"));
        assert!(body.contains("Funding: Some funding information may be available in search results"));
        assert!(!body.contains(NO_FUNDING_SUMMARY));
    }

    #[test]
    fn article_entries_and_summary_are_rendered() {
        let list = vec![news("Acme", &["Acme raises Series B", "Acme launches product"])];
        let mut summaries = SummaryMap::new();
        summaries.insert("Acme".into(), Some("Acme had a busy week.".into()));

        let body = render(&list, None, Some(&summaries)).body;
        assert!(body.contains("SUMMARY:\n\n  Acme had a busy week.\n"));
        assert!(body.contains("LINKS (2 articles):"));
        assert!(body.contains(
            "  [1] Acme raises Series B\n      https://example.com/Acme-raises-Series-B\n      Unknown | Unknown date\n"
        ));
        assert!(body.contains("  [2] Acme launches product"));
    }

    #[test]
    fn quiet_week_has_no_company_sections() {
        let list = vec![news("Acme", &[])];
        let digest = render(&list, None, None);
        assert!(digest.body.contains("  No companies had news this week."));
        assert!(!digest.body.contains("LINKS ("));
        assert!(digest.subject.ends_with("Quiet Week"));
    }
}
