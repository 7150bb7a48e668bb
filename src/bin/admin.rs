//! CLI administration tool for redirect-manager.
//!
//! Manages redirect rules, runs external scans and live tests without
//! going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # List rules in evaluation order
//! cargo run --bin admin -- rules list
//!
//! # Add a rule interactively
//! cargo run --bin admin -- rules add
//!
//! # Bulk import "from,to[,note]" lines
//! cargo run --bin admin -- rules import redirects.csv
//!
//! # Delete a rule
//! cargo run --bin admin -- rules delete r_6650f0c2a1b3c
//!
//! # Scan plugin tables and .htaccess
//! cargo run --bin admin -- scan
//!
//! # Probe a path, follow a chain
//! cargo run --bin admin -- test /old-page
//! cargo run --bin admin -- chain https://example.com/old-page
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server; see [`redirect_manager::config`].

use redirect_manager::application::services::ChainReport;
use redirect_manager::config::{self, Config};
use redirect_manager::domain::entities::{MatchType, RuleInput};
use redirect_manager::infrastructure::persistence::PgRuleRepository;
use redirect_manager::server::{build_sources, connect_cache};
use redirect_manager::state::{AppState, ServiceSettings};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// CLI tool for managing redirect-manager.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage redirect rules
    Rules {
        #[command(subcommand)]
        action: RuleAction,
    },

    /// Scan external redirect sources
    Scan,

    /// Request a site path once and show the response
    Test {
        /// Site-relative path, e.g. /old-page
        path: String,
    },

    /// Follow a redirect chain
    Chain {
        /// Starting URL
        url: String,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MatchArg {
    Exact,
    Wildcard,
    Regex,
}

impl From<MatchArg> for MatchType {
    fn from(arg: MatchArg) -> Self {
        match arg {
            MatchArg::Exact => MatchType::Exact,
            MatchArg::Wildcard => MatchType::Wildcard,
            MatchArg::Regex => MatchType::Regex,
        }
    }
}

/// Rule management subcommands.
#[derive(Subcommand)]
enum RuleAction {
    /// List all rules
    List,

    /// Add a rule
    Add {
        /// Source path (prompted if omitted)
        #[arg(short, long)]
        from: Option<String>,

        /// Target path or URL (prompted if omitted)
        #[arg(short, long)]
        to: Option<String>,

        /// Redirect status code (301, 302 or 307)
        #[arg(short, long, default_value_t = 301)]
        status: u16,

        /// How `from` is matched
        #[arg(short, long, value_enum, default_value_t = MatchArg::Exact)]
        match_type: MatchArg,

        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Import rules from a file with one `from,to[,note]` per line
    Import {
        file: PathBuf,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Delete a rule
    Delete {
        /// Rule ID
        id: String,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env().context("Invalid configuration")?;

    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Db { action } => handle_db_action(action, &pool).await?,
        command => {
            let (state, _hits) = build_state(&config, pool).await?;
            match command {
                Commands::Rules { action } => handle_rule_action(action, &state).await?,
                Commands::Scan => handle_scan(&state).await?,
                Commands::Test { path } => handle_test(&state, &path).await?,
                Commands::Chain { url } => handle_chain(&state, &url).await?,
                Commands::Db { .. } => unreachable!("handled above"),
            }
        }
    }

    Ok(())
}

/// Builds the same services the server uses.
///
/// The hit receiver is returned so the channel stays open for the lifetime
/// of the command; nothing consumes it.
async fn build_state(
    config: &Config,
    pool: PgPool,
) -> Result<(AppState, mpsc::Receiver<redirect_manager::domain::hit_event::HitEvent>)> {
    let pool = Arc::new(pool);
    let cache = connect_cache(config).await;
    let sources = build_sources(config, &pool);
    let (tx, rx) = mpsc::channel(1);

    let state = AppState::new(
        Arc::new(PgRuleRepository::new(pool)),
        cache,
        sources,
        tx,
        &ServiceSettings::from(config),
    )
    .context("Failed to build services")?;

    Ok((state, rx))
}

/// Dispatches rule management commands.
async fn handle_rule_action(action: RuleAction, state: &AppState) -> Result<()> {
    match action {
        RuleAction::List => list_rules(state).await?,
        RuleAction::Add {
            from,
            to,
            status,
            match_type,
            note,
        } => add_rule(state, from, to, status, match_type.into(), note).await?,
        RuleAction::Import { file, yes } => import_rules(state, file, yes).await?,
        RuleAction::Delete { id } => delete_rule(state, id).await?,
    }

    Ok(())
}

/// Lists all rules in evaluation order.
///
/// # Output Format
///
/// ```text
/// Redirect Rules
///
///   ID               Status Type     From                           To                             Hits
///   -----------------------------------------------------------------------------------------------------
///   r_6650f0c2a1b3c  301    exact    /old-page/                     /new-page/                     12
/// ```
async fn list_rules(state: &AppState) -> Result<()> {
    println!("{}", "Redirect Rules".bright_blue().bold());
    println!();

    let rules = state
        .rule_service
        .get_all()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list rules: {}", e))?;

    if rules.is_empty() {
        println!("{}", "  No rules found".yellow());
        println!();
        println!(
            "  Create one with: {} admin rules add",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<16} {:<6} {:<8} {:<30} {:<30} {}",
        "ID".bright_white().bold(),
        "Status".bright_white().bold(),
        "Type".bright_white().bold(),
        "From".bright_white().bold(),
        "To".bright_white().bold(),
        "Hits".bright_white().bold()
    );
    println!("  {}", "-".repeat(101).bright_black());

    for rule in &rules {
        let from = if rule.enabled {
            rule.from.cyan()
        } else {
            rule.from.bright_black().strikethrough()
        };

        println!(
            "  {:<16} {:<6} {:<8} {:<30} {:<30} {}",
            rule.id.bright_black(),
            rule.status_code,
            rule.match_type.as_str(),
            from,
            rule.to,
            rule.hits.to_string().bright_green()
        );
    }

    println!();
    println!("  Total: {}", rules.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Adds a rule, prompting for missing paths.
async fn add_rule(
    state: &AppState,
    from: Option<String>,
    to: Option<String>,
    status: u16,
    match_type: MatchType,
    note: Option<String>,
) -> Result<()> {
    println!("{}", "Add Redirect Rule".bright_blue().bold());
    println!();

    let from = match from {
        Some(f) => f,
        None => Input::new().with_prompt("From").interact_text()?,
    };
    let to = match to {
        Some(t) => t,
        None => Input::new().with_prompt("To").interact_text()?,
    };

    let rule = state
        .rule_service
        .save(RuleInput {
            id: None,
            from,
            to,
            enabled: true,
            status_code: Some(status),
            match_type,
            note,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to save rule: {}", e))?;

    println!(
        "{} {} {} {} ({})",
        "Created".green().bold(),
        rule.from.cyan(),
        "->".bright_black(),
        rule.to.cyan(),
        rule.id.bright_black()
    );
    println!();

    Ok(())
}

/// Imports a delimited file after showing how many lines it holds.
async fn import_rules(state: &AppState, file: PathBuf, skip_confirm: bool) -> Result<()> {
    println!("{}", "Import Redirect Rules".bright_blue().bold());
    println!();

    let text = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    println!("  File:  {}", file.display().to_string().cyan());
    println!("  Lines: {}", lines.to_string().bright_white());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Import these rules?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    let summary = state
        .rule_service
        .import(&text)
        .await
        .map_err(|e| anyhow::anyhow!("Import failed: {}", e))?;

    println!(
        "  Imported: {}",
        summary.imported.to_string().bright_green().bold()
    );
    println!("  Skipped:  {}", summary.skipped.to_string().yellow().bold());

    for line_error in &summary.errors {
        println!(
            "    line {}: {}",
            line_error.line.to_string().bright_black(),
            line_error.error.message.red()
        );
    }
    println!();

    Ok(())
}

/// Deletes a rule after confirmation (default: No).
async fn delete_rule(state: &AppState, id: String) -> Result<()> {
    println!("{}", "Delete Redirect Rule".bright_blue().bold());
    println!();

    let rule = state
        .rule_service
        .get(&id)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("  From: {}", rule.from.cyan());
    println!("  To:   {}", rule.to.cyan());
    println!("  Hits: {}", rule.hits.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Delete this rule?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "Cancelled".red());
        return Ok(());
    }

    state
        .rule_service
        .delete(&id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete rule: {}", e))?;

    println!();
    println!("{}", "Rule deleted".green().bold());
    println!();

    Ok(())
}

/// Scans every external source and prints what was found.
async fn handle_scan(state: &AppState) -> Result<()> {
    println!("{}", "External Redirect Scan".bright_blue().bold());
    println!();

    let report = state.scan_service.scan_all_sources().await;

    for (source, status) in &report.sources_checked {
        let availability = if status.available {
            "available".green()
        } else {
            "unavailable".bright_black()
        };
        println!(
            "  {:<24} {:<12} {}",
            source.bright_white(),
            availability,
            status.found
        );
    }
    println!();

    for record in &report.results {
        println!(
            "  {} {} {} {} [{}]",
            record.status.to_string().bright_black(),
            record.from.cyan(),
            "->".bright_black(),
            record.to,
            record.source.bright_black()
        );
    }

    println!();
    println!(
        "  Total: {}",
        report.results.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Probes one path and prints status and `Location`.
async fn handle_test(state: &AppState, path: &str) -> Result<()> {
    let outcome = state
        .tester_service
        .test_url(path)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let status = if outcome.redirected {
        outcome.status_code.to_string().yellow().bold()
    } else {
        outcome.status_code.to_string().green().bold()
    };

    println!("  {} {}", status, outcome.url.cyan());
    if let Some(location) = &outcome.location {
        println!("  {} {}", "Location:".bright_black(), location);
    }
    println!();

    Ok(())
}

/// Follows a redirect chain and prints every hop.
async fn handle_chain(state: &AppState, url: &str) -> Result<()> {
    let report: ChainReport = state
        .tester_service
        .check_redirect_chain(url)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    for (i, hop) in report.chain.iter().enumerate() {
        println!(
            "  {}. {} {} {} {} [{}]",
            i + 1,
            hop.status.to_string().yellow(),
            hop.from.cyan(),
            "->".bright_black(),
            hop.to.cyan(),
            hop.source.bright_black()
        );
    }

    if report.chain.is_empty() {
        println!("{}", "  No redirect".green());
    }

    println!();
    println!("  Final: {}", report.final_url.bright_white().bold());
    if let Some(error) = &report.error {
        println!("  {} {}", "Error:".red().bold(), error);
    }
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let rules: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM redirect_rules")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Rules:      {}", rules.to_string().bright_green());
            println!();
        }
    }

    Ok(())
}
