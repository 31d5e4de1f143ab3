mod api;
mod scraper;
mod storage;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "wiki_scraper",
    about = "Scrape wiki page metadata and raw text over an incremental page ID range"
)]
struct Cli {
    /// First page ID (inclusive)
    start_page_id: u64,

    /// Last page ID (exclusive)
    end_page_id: u64,

    /// Maximum retry attempts per page
    #[arg(long, default_value_t = 5)]
    max_retries: u32,

    /// Output CSV file
    #[arg(long, default_value = "output.csv")]
    output: PathBuf,

    /// Folder to store raw page content
    #[arg(long, default_value = "pages")]
    output_folder: PathBuf,

    /// Site language subdomain (e.g. "it" for it.vikidia.org)
    #[arg(long, default_value = "it")]
    lang: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut config = scraper::ScrapeConfig::for_language(&cli.lang);
    config.max_retries = cli.max_retries;
    config.output_folder = cli.output_folder;

    let client = scraper::build_client()?;
    let (records, stats) =
        scraper::run(&client, &config, cli.start_page_id, cli.end_page_id).await?;

    println!(
        "Done: {} ids ({} scraped, {} missing, {} skipped, {} files saved).",
        stats.total, stats.scraped, stats.missing, stats.skipped, stats.saved
    );

    storage::export_csv(&records, &cli.output)?;

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
