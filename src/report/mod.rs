pub mod chart;

use std::fmt::Write;

use tracing::info;

use crate::db::BankRecord;
use crate::query::QueryResults;

pub use chart::{render_charts, ChartPaths};

/// Plain-text rendering of all three result sets, in fixed order.
pub fn render_text(results: &QueryResults) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Top {} Banks by Market Cap in INR:", results.top_by_inr.len());
    write_table(&mut out, &results.top_by_inr);

    let _ = writeln!(out, "\nAverage Market Cap in US$ billion:");
    match results.average_usd {
        Some(avg) => {
            let _ = writeln!(out, "  {:.2}", avg);
        }
        None => {
            let _ = writeln!(out, "  n/a (no rows)");
        }
    }

    let _ = writeln!(
        out,
        "\nBanks with Market Cap > {} Billion INR:",
        results.threshold
    );
    write_table(&mut out, &results.above_inr_threshold);
    out
}

fn write_table(out: &mut String, rows: &[BankRecord]) {
    if rows.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }
    let _ = writeln!(
        out,
        "{:>4} | {:<40} | {:>10} | {:>12} | {:>10} | {:>10}",
        "Rank", "Bank name", "USD bn", "INR bn", "EUR bn", "GBP bn"
    );
    let _ = writeln!(out, "{}", "-".repeat(100));
    for r in rows {
        let _ = writeln!(
            out,
            "{:>4} | {:<40} | {:>10.2} | {:>12.2} | {:>10.2} | {:>10.2}",
            r.rank,
            truncate(&r.name, 40),
            r.market_cap_usd,
            r.market_cap_inr,
            r.market_cap_eur,
            r.market_cap_gbp
        );
    }
}

/// Print the results to stdout and log a one-line summary of each set.
pub fn print_results(results: &QueryResults) {
    println!("{}", render_text(results));
    info!(
        rows = results.top_by_inr.len(),
        leader = results.top_by_inr.first().map(|r| r.name.as_str()).unwrap_or("-"),
        "Leaderboard by INR market cap"
    );
    info!(average_usd = ?results.average_usd, "Average USD market cap");
    info!(
        rows = results.above_inr_threshold.len(),
        threshold = results.threshold,
        "Banks above INR threshold"
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}
