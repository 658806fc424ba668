/*
portfolio-monitor - main.rs
Generates the weekly portfolio digest and emails it, or sends a connectivity test email.
*/

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use common::{load_companies, Secrets, Settings, DEFAULT_COMPANIES_PATH};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use portfolio_monitor::archive;
use portfolio_monitor::email::EmailSender;
use portfolio_monitor::funding::FundingTracker;
use portfolio_monitor::ingestion::NewsSource;
use portfolio_monitor::llm::{self, summarizer::Summarizer};
use portfolio_monitor::pipeline::DigestPipeline;

#[derive(Parser, Debug)]
#[command(
    name = "portfolio-monitor",
    about = "Portfolio Monitor - Weekly Digest Generator"
)]
struct Args {
    /// Send a test email to verify configuration
    #[arg(long)]
    test: bool,

    /// Path to the company list
    #[arg(long, value_name = "FILE", default_value = DEFAULT_COMPANIES_PATH)]
    config: PathBuf,

    /// Settings file layered over config.default.toml (default: config.toml if present)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Skip funding information lookup (faster)
    #[arg(long)]
    skip_funding: bool,

    /// Skip per-company summaries
    #[arg(long)]
    skip_summary: bool,

    /// Number of days to look back for news (default: 7)
    #[arg(long, value_parser = clap::value_parser!(i64).range(0..))]
    days: Option<i64>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    info!("{}", "=".repeat(80));
    info!("Portfolio Monitor - Starting");
    info!("{}", "=".repeat(80));

    let settings = load_settings(args.settings.as_deref()).await?;

    let companies = match load_companies(&args.config).await {
        Ok(companies) => companies,
        Err(e) => {
            error!("{:#}", e);
            return Err(e);
        }
    };
    info!(path = %args.config.display(), "Monitoring {} companies", companies.len());

    let secrets = match Secrets::from_env() {
        Ok(secrets) => secrets,
        Err(e) => {
            error!("{:#}", e);
            return Err(e);
        }
    };

    let email_sender = EmailSender::new(
        &settings.email(),
        &secrets.smtp_email,
        &secrets.smtp_password,
    )
    .context("failed to configure SMTP transport")?;

    if args.test {
        info!("Running in TEST mode");
        email_sender
            .send_test_email(&secrets.recipient_email)
            .await
            .context("Test email failed")?;
        info!("Test email sent successfully! Check your inbox to confirm receipt");
        return Ok(());
    }

    let timeout = settings.fetch_timeout_seconds();
    let mut news_source = NewsSource::new(&settings.news(), timeout, &settings.user_agent())?;
    if let Some(days) = args.days {
        news_source = news_source.with_days_back(days);
    }
    info!("Looking back {} days for news", news_source.days_back());

    let funding_config = settings.funding();
    let funding_tracker = if args.skip_funding {
        info!("Skipping funding information (--skip-funding flag set)");
        None
    } else if !funding_config.enabled.unwrap_or(true) {
        info!("Funding lookup disabled in settings");
        None
    } else {
        Some(FundingTracker::from_config(&funding_config, timeout)?)
    };

    let summarizer = if args.skip_summary {
        info!("Skipping summaries (--skip-summary flag set)");
        None
    } else {
        Some(Summarizer::new(create_llm_provider(&settings)))
    };

    let pipeline = DigestPipeline {
        news: &news_source,
        funding: funding_tracker.as_ref(),
        summarizer: summarizer.as_ref(),
    };

    let generated_at = Local::now().naive_local();
    let run = pipeline.run(&companies, generated_at).await;
    info!(
        articles = run.total_articles(),
        failed_fetches = run.failed_fetches(),
        "Digest generated"
    );

    let output_dir = PathBuf::from(settings.output_dir());
    match archive::save_digest(&output_dir, &run.digest.body, generated_at).await {
        Ok(path) => info!("Digest saved to: {}", path.display()),
        Err(e) => warn!("{:#}", e),
    }

    info!("Sending digest to: {}", secrets.recipient_email);
    if let Err(e) = email_sender
        .send_digest(&secrets.recipient_email, &run.digest.subject, &run.digest.body)
        .await
    {
        error!("{}", "=".repeat(80));
        error!("Failed to send portfolio digest");
        error!("{}", "=".repeat(80));
        return Err(e).context("Failed to send portfolio digest");
    }

    info!("{}", "=".repeat(80));
    info!("Portfolio digest sent successfully!");
    info!("{}", "=".repeat(80));
    Ok(())
}

/// config.default.toml, then the `--settings` file (or config.toml when present).
async fn load_settings(override_arg: Option<&Path>) -> Result<Settings> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = match override_arg {
        Some(p) if !p.exists() => {
            error!(path = ?p, "specified settings file not found");
            anyhow::bail!("Settings file not found: {}", p.display());
        }
        Some(p) => Some(p.to_path_buf()),
        None => {
            let p = PathBuf::from("config.toml");
            if p.exists() {
                Some(p)
            } else {
                None
            }
        }
    };

    let settings = Settings::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await
    .map_err(|e| {
        error!(%e, "failed to load settings");
        e
    })?;
    info!(default = ?default_path, settings_override = ?override_path, "settings loaded");
    Ok(settings)
}

/// The configured LLM provider, or `None` (headline fallback) when none is
/// configured or it cannot be initialized.
fn create_llm_provider(settings: &Settings) -> Option<std::sync::Arc<dyn llm::LlmProvider>> {
    let llm_config = settings.llm.as_ref()?;
    match llm::provider_from_config(llm_config) {
        Ok(Some(provider)) => {
            info!(
                "LLM provider initialized: {}",
                llm_config.adapter.as_deref().unwrap_or("none")
            );
            Some(provider)
        }
        Ok(None) => None,
        Err(e) => {
            warn!(
                "LLM provider unavailable, using headline summaries: {:#}",
                e
            );
            None
        }
    }
}
