use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use corpus_stats::persist::{encode, encode_nested, load_nested_file, load_stats_file, save_stats_file};
use corpus_stats::{check_nested, check_stats, CorpusStats, CorpusStatsGroup, CorpusStatsGrouping, StatsError};
use tracing_subscriber::{fmt, EnvFilter};

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

#[derive(Parser)]
#[command(name = "inspect")]
#[command(about = "Validate and summarize corpus stats.json files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a stats file and report inconsistent totals
    Validate {
        /// Path to stats.json
        #[arg(long)]
        input: String,
        /// Fail when any warning is reported
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Print groupings with docs, tokens and each group's share of its parent
    Show {
        /// Path to stats.json
        #[arg(long)]
        input: String,
        /// Only print this grouping
        #[arg(long)]
        grouping: Option<String>,
        /// Maximum number of group levels to print
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Convert one grouping into the nested representation, keyed by a field
    Nest {
        #[arg(long)]
        input: String,
        #[arg(long)]
        grouping: String,
        /// Identity field that becomes the nested group identity
        #[arg(long)]
        field: String,
        /// Output file; stdout when omitted
        #[arg(long)]
        output: Option<String>,
    },
    /// Turn a nested grouping back into a single-grouping stats.json
    Flatten {
        #[arg(long)]
        input: String,
        #[arg(long)]
        field: String,
        /// Grouping name to store the result under
        #[arg(long)]
        name: String,
        #[arg(long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { input, strict } => validate(&input, strict),
        Commands::Show { input, grouping, depth } => {
            let stats = load_stats_file(&input)?;
            print!("{}", render(&stats, grouping.as_deref(), depth)?);
            Ok(())
        }
        Commands::Nest { input, grouping, field, output } => nest(&input, &grouping, &field, output.as_deref()),
        Commands::Flatten { input, field, name, output } => flatten(&input, &field, &name, output.as_deref()),
    }
}

fn validate(input: &str, strict: bool) -> Result<()> {
    let stats = load_stats_file(input)?;
    let warnings = check_stats(&stats);
    for w in &warnings {
        tracing::warn!(path = w.path(), "{w}");
        println!("warning: {w}");
    }
    println!("{input}: {} groupings, {} warnings", stats.len(), warnings.len());
    if strict && !warnings.is_empty() {
        bail!("{} warnings in {input}", warnings.len());
    }
    Ok(())
}

fn nest(input: &str, grouping: &str, field: &str, output: Option<&str>) -> Result<()> {
    let stats = load_stats_file(input)?;
    let source = stats
        .get(grouping)
        .ok_or_else(|| StatsError::UnknownGrouping(grouping.to_string()))?;
    let nested = source.nest_by(field)?;
    tracing::info!(grouping, field, buckets = nested.groups.len(), "nested grouping");
    let json = encode_nested(&nested)?;
    match output {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn flatten(input: &str, field: &str, name: &str, output: Option<&str>) -> Result<()> {
    let nested = load_nested_file(input)?;
    for w in check_nested(name, &nested) {
        tracing::warn!(path = w.path(), "{w}");
    }
    let mut stats = CorpusStats::new();
    stats.insert(name, nested.flatten(field)?);
    match output {
        Some(path) => save_stats_file(Path::new(path), &stats)?,
        None => println!("{}", encode(&stats)?),
    }
    Ok(())
}

fn render(stats: &CorpusStats, only: Option<&str>, depth: Option<usize>) -> Result<String> {
    let mut out = String::new();
    match only {
        Some(name) => {
            let grouping = stats.get(name).ok_or_else(|| StatsError::UnknownGrouping(name.to_string()))?;
            render_grouping(&mut out, name, grouping, depth);
        }
        None => {
            for (name, grouping) in stats {
                render_grouping(&mut out, name, grouping, depth);
            }
        }
    }
    Ok(out)
}

fn render_grouping(out: &mut String, name: &str, grouping: &CorpusStatsGrouping, depth: Option<usize>) {
    let _ = writeln!(out, "{name}  docs={} tokens={} groups={}", grouping.docs, grouping.tokens, grouping.groups.len());
    render_groups(out, &grouping.groups, (grouping.docs, grouping.tokens), 1, depth);
}

fn render_groups(out: &mut String, groups: &[CorpusStatsGroup], parent: (u64, u64), level: usize, depth: Option<usize>) {
    if depth.is_some_and(|d| level > d) {
        return;
    }
    for g in groups {
        let _ = writeln!(
            out,
            "{:indent$}{}  docs={} ({}) tokens={} ({})",
            "",
            g.label(),
            g.docs,
            share(g.docs, parent.0),
            g.tokens,
            share(g.tokens, parent.1),
            indent = level * 2
        );
        render_groups(out, g.children(), (g.docs, g.tokens), level + 1, depth);
    }
}

fn share(part: u64, whole: u64) -> String {
    if whole == 0 {
        return "-".into();
    }
    format!("{:.1}%", part as f64 * 100.0 / whole as f64)
}
