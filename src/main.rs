// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Crawl the site, stopping early on Ctrl-C
// 3. Build sitemap.xml from the pages we found and write it
// 4. Print a summary (or a JSON report) and exit with a proper code
//    (0 = sitemap written, 2 = fatal error)
// =============================================================================

mod cli;
mod config;
mod crawl;
mod logging;
mod sitemap;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};

use cli::Cli;
use crawl::{CancellationFlag, CrawlOutcome, HttpFetcher};
use sitemap::SitemapEntry;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging()?;

    let config = cli.to_config()?;
    let fetcher = HttpFetcher::new(&config).context("Failed to create HTTP client")?;

    // Ctrl-C stops the crawl, but we still write what we have so far
    let cancel = CancellationFlag::default();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, finishing with the pages crawled so far");
            on_ctrl_c.cancel();
        }
    });

    if !cli.json {
        println!("🔍 Crawling website: {}", config.seed_url);
    }

    let outcome = crawl::crawl(&fetcher, &config, &cancel).await?;

    if cli.json {
        // The report lists the same entries the sitemap is rendered from
        let entries = sitemap::entries(&outcome.pages)?;
        write_output(&cli.output, &sitemap::render(&entries)?)?;
        print_report(&outcome, &cli.output, entries)?;
    } else {
        write_output(&cli.output, &sitemap::build(&outcome.pages)?)?;
        print_summary(&outcome, &cli.output);
    }

    Ok(())
}

fn write_output(path: &Path, xml: &str) -> Result<()> {
    sitemap::write_sitemap(path, xml).with_context(|| format!("Failed to write {}", path.display()))
}

/// Machine-readable summary printed with --json
#[derive(Debug, Serialize)]
struct CrawlReport {
    site: String,
    output: PathBuf,
    fetch_failures: usize,
    cancelled: bool,
    pages: Vec<SitemapEntry>,
}

fn print_report(outcome: &CrawlOutcome, output: &Path, pages: Vec<SitemapEntry>) -> Result<()> {
    let report = CrawlReport {
        site: outcome.root_url.clone(),
        output: output.to_path_buf(),
        fetch_failures: outcome.fetch_failures,
        cancelled: outcome.cancelled,
        pages,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_summary(outcome: &CrawlOutcome, output: &Path) {
    if outcome.cancelled {
        println!("⚠️  Crawl interrupted, sitemap covers the pages reached so far");
    }
    if outcome.fetch_failures > 0 {
        println!("⚠️  {} page(s) could not be fetched and were skipped", outcome.fetch_failures);
    }
    println!(
        "✅ Generated {} with {} URLs",
        output.display(),
        outcome.pages.len()
    );
}
