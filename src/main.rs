use anyhow::Context;
use clap::Parser;
use moodle_scrape::utils::logger;
use moodle_scrape::{CliConfig, LocalStorage, MoodleScraper};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let settings = match cli.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    logger::init_logger(Path::new(&settings.log_file), cli.verbose)
        .with_context(|| format!("failed to open log file {}", settings.log_file))?;

    tracing::info!("Starting moodle-scrape for course {}", cli.course_id);
    if cli.verbose {
        tracing::debug!(
            "Resolved settings: base_url={}, cookies={}, store={}/{}",
            settings.base_url,
            settings.cookies.len(),
            settings.output_path,
            settings.store_file
        );
    }

    let storage = LocalStorage::new(&settings.output_path);
    let store_path = storage.full_path(&settings.store_file);
    let scraper = MoodleScraper::new(storage, settings).context("failed to build scraper")?;

    let emails = scraper.scrape_course_emails(&cli.course_id).await;

    tracing::info!("✅ Scrape finished: {} emails found this run", emails.len());
    tracing::info!("📁 Email store: {}", store_path.display());

    for email in &emails {
        println!("{}", email);
    }

    Ok(())
}
