use common::{Company, NewsConfig, DEFAULT_USER_AGENT};
use portfolio_monitor::ingestion::NewsSource;

// Manual smoke test: fetch and print news for the company names given on the
// command line (no funding lookup, no email).
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut companies: Vec<Company> = std::env::args()
        .skip(1)
        .map(Company::Name)
        .collect();
    if companies.is_empty() {
        companies = vec![Company::from("Anthropic"), Company::from("Rust Foundation")];
    }

    let source = NewsSource::new(&NewsConfig::default(), 10, DEFAULT_USER_AGENT)?;

    for company in &companies {
        println!("\n{}", "=".repeat(60));
        println!("Testing: {}", company.name());
        println!("URL: {}", source.search_url(company.query())?);
        println!("{}", "=".repeat(60));

        match source.fetch_company_news(company.query()).await {
            Ok(articles) => {
                println!("✓ Success! {} recent articles", articles.len());
                for (i, article) in articles.iter().take(3).enumerate() {
                    println!("    {}. {}", i + 1, article.title);
                    println!("       URL: {}", article.link);
                    println!("       Published: {}", article.published);
                    println!("       Summary: {} chars", article.summary.len());
                }
            }
            Err(e) => {
                println!("✗ Failed: {}", e);
            }
        }
    }

    Ok(())
}
