use colored::Colorize;

use seo_booster::config::Config;
use seo_booster::document::PageDocument;
use seo_booster::error::Result;
use seo_booster::fetch::{self, HttpFetcher, PageSource};
use seo_booster::report::{self, ScanFailure, ScanReport};
use seo_booster::scan::{CompetitorOutcome, Scanner};
use seo_booster::text_stats::TextStats;

pub fn cmd_scan(url: &str, keyword: Option<&str>, competitor: Option<&str>, json: bool) -> Result<()> {
    let config = Config::load()?;
    let scanner = Scanner::from_config(config);

    if !json {
        println!("\n{} {}", "Scanning".cyan().bold(), url);
        if let Some(c) = competitor {
            println!("  Competitor: {}", c);
        }
    }

    match scanner.scan(url, keyword, competitor) {
        Ok(scan) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ScanReport::from_scan(&scan))?);
            } else {
                print!("{}", report::render_text(&scan));
            }
            Ok(())
        }
        Err(failed) => {
            // Hosts parsing stdout still get the failure shape
            if json {
                println!("{}", serde_json::to_string_pretty(&ScanFailure::from_failed(&failed))?);
            } else if let CompetitorOutcome::Scanned(theirs) = &failed.competitor {
                println!("  Competitor {} scored {}/100", theirs.url, theirs.score);
            }
            Err(failed.into())
        }
    }
}

pub fn cmd_terms(url: &str, top: usize, json: bool) -> Result<()> {
    let config = Config::load()?;
    let target = fetch::parse_scan_url(url)?;
    let raw = HttpFetcher::new(&config.fetch).fetch_page(&target)?;

    let doc = PageDocument::parse(&raw.html, &raw.final_url);
    let stats = TextStats::compute(&doc.raw_text, None, top);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats.top_terms)?);
        return Ok(());
    }

    println!("\n{} {} ({} words)\n", "Top terms for".bold(), raw.final_url.cyan(), stats.word_count);
    if stats.top_terms.is_empty() {
        println!("  {}", "No candidate terms found".dimmed());
        return Ok(());
    }
    for (i, term) in stats.top_terms.iter().enumerate() {
        println!("  {:>2}. {:<24} {:>4}x  {:.4}", i + 1, term.term, term.count, term.score);
    }
    Ok(())
}
