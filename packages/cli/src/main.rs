#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the brigade service statistics toolchain.
//!
//! Decodes a CSV export of the service log, normalizes it and prints the
//! requested report as JSON on stdout. Diagnostics go through `log`
//! (`RUST_LOG=info` shows the normalization summary).

mod input;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fire_stats_analytics::{
    StatisticsReport, monthly_breakdown, statistics_report, summary_counts,
};
use fire_stats_analytics_models::{CountSummary, MonthlyBreakdown};
use fire_stats_classify::{DEFAULT_TAXONOMY_ID, builtin_taxonomies, builtin_taxonomy};
use fire_stats_streets::{
    DEFAULT_GROUP_LIMIT, StreetGroup, StreetsByCategory, build_street_groups, streets_by_category,
};
use serde::Serialize;

use crate::input::{CliError, load_records, parse_delimiter};

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// Statistics over a fire brigade's service log.
#[derive(Parser)]
#[command(name = "fire_stats")]
#[command(about = "Statistics over a fire brigade's service log")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Input file options shared by every data subcommand.
#[derive(Args)]
struct InputArgs {
    /// CSV export of the service log, header row first.
    csv: PathBuf,

    /// Field delimiter (`,`, `;`, `\t`).
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Yearly fire/accident/rescue statistics, trends and code counts.
    Stats {
        #[command(flatten)]
        input: InputArgs,

        /// Built-in taxonomy used to classify records.
        #[arg(long, default_value = DEFAULT_TAXONOMY_ID)]
        taxonomy: String,
    },

    /// Busiest streets, with similar spellings grouped.
    Streets {
        #[command(flatten)]
        input: InputArgs,

        /// Maximum number of groups to print.
        #[arg(long, default_value_t = DEFAULT_GROUP_LIMIT)]
        limit: usize,

        /// Built-in taxonomy used for the per-category street lists.
        #[arg(long, default_value = DEFAULT_TAXONOMY_ID)]
        taxonomy: String,
    },

    /// Normalized records and row diagnostics.
    Records {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Tallies by code, type and locality plus the per-month breakdown.
    Counts {
        #[command(flatten)]
        input: InputArgs,
    },

    /// List the built-in taxonomies.
    Taxonomies,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport {
    taxonomy: String,
    #[serde(flatten)]
    report: StatisticsReport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StreetsReport {
    groups: Vec<StreetGroup>,
    by_category: StreetsByCategory,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CountsReport {
    summary: CountSummary,
    monthly: MonthlyBreakdown,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaxonomyListing {
    id: String,
    name: String,
    basis: String,
    categories: Vec<String>,
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { input, taxonomy } => cmd_stats(&input, &taxonomy)?,
        Commands::Streets {
            input,
            limit,
            taxonomy,
        } => cmd_streets(&input, limit, &taxonomy)?,
        Commands::Records { input } => {
            print_json(&load_records(&input.csv, input.delimiter)?)?;
        }
        Commands::Counts { input } => cmd_counts(&input)?,
        Commands::Taxonomies => cmd_taxonomies()?,
    }

    Ok(())
}

fn cmd_stats(input: &InputArgs, taxonomy_id: &str) -> Result<(), CliError> {
    let taxonomy = builtin_taxonomy(taxonomy_id)?;
    let records = load_records(&input.csv, input.delimiter)?.records;

    let report = statistics_report(&records, &taxonomy);
    log::info!(
        "Computed statistics for {} year(s) with taxonomy {} ({} undated record(s) left out)",
        report.statistics.len(),
        taxonomy.id,
        report.excluded.len()
    );

    print_json(&StatsReport {
        taxonomy: taxonomy.id,
        report,
    })
}

fn cmd_streets(input: &InputArgs, limit: usize, taxonomy_id: &str) -> Result<(), CliError> {
    let taxonomy = builtin_taxonomy(taxonomy_id)?;
    let report = load_records(&input.csv, input.delimiter)?;

    print_json(&StreetsReport {
        groups: build_street_groups(&report.records, limit),
        by_category: streets_by_category(&report.records, &taxonomy),
    })
}

fn cmd_counts(input: &InputArgs) -> Result<(), CliError> {
    let report = load_records(&input.csv, input.delimiter)?;

    print_json(&CountsReport {
        summary: summary_counts(&report.records),
        monthly: monthly_breakdown(&report.records),
    })
}

fn cmd_taxonomies() -> Result<(), CliError> {
    let listing: Vec<TaxonomyListing> = builtin_taxonomies()
        .into_iter()
        .map(|t| TaxonomyListing {
            basis: t.basis.to_string(),
            categories: t.categories().iter().map(ToString::to_string).collect(),
            id: t.id,
            name: t.name,
        })
        .collect();
    print_json(&listing)
}
