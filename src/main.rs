use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use accreport::config::{
    config_dir, load_config, load_ledger, resolve_path, Config, CONFIG_TEMPLATE, LEDGER_TEMPLATE,
};
use accreport::error::{ReportError, Result};
use accreport::html::{format_amount, render, RenderContext, TemplateKind};
use accreport::ledger::{parse_date, Interval, ItemFilter, Ledger};
use accreport::report::{DatasetView, Report, SortKey};

#[derive(Parser)]
#[command(name = "accreport")]
#[command(version, about = "Accounting reports from a ledger", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.accreport or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Ledger file to read instead of the one named in config.toml
    #[arg(short = 'L', long, global = true)]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with template files
    Init,

    /// List accounts of the ledger
    Accounts,

    /// List booked items
    Transactions {
        /// Only items on this account or its children (can be repeated)
        #[arg(short, long, value_name = "PATH")]
        account: Vec<String>,

        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Print per-period totals of the selected accounts
    Summary {
        /// Account to report on (can be repeated)
        #[arg(short, long, value_name = "PATH")]
        account: Vec<String>,

        /// First day to include (YYYY-MM-DD, default: start of current month)
        #[arg(long)]
        from: Option<String>,

        /// Last day to include (YYYY-MM-DD, default: end of the month of --from)
        #[arg(long)]
        to: Option<String>,

        /// Aggregation: accounts, expanded, types
        #[arg(long, default_value = "accounts")]
        view: String,

        /// Grouping: daily, weekly, monthly, yearly
        #[arg(long, default_value = "monthly")]
        interval: String,
    },

    /// Write an HTML report with tables and pie charts
    Report {
        /// Account to report on (can be repeated)
        #[arg(short, long, value_name = "PATH")]
        account: Vec<String>,

        /// First day to include (YYYY-MM-DD, default: start of current month)
        #[arg(long)]
        from: Option<String>,

        /// Last day to include (YYYY-MM-DD, default: end of the month of --from)
        #[arg(long)]
        to: Option<String>,

        /// Layout: monthly-pct, monthly-expanded, monthly-types
        #[arg(short, long, default_value = "monthly-pct")]
        template: String,

        /// Custom output file path (default: output_dir/<from>_<to>_<template>.html)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open the generated report with the system default viewer
        #[arg(long)]
        open: bool,
    },
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("accreport=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };
    let ledger_path = cli.ledger.as_deref();

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Accounts => cmd_accounts(&cfg_dir, ledger_path),
        Commands::Transactions { account, from, to } => {
            cmd_transactions(&cfg_dir, ledger_path, &account, from, to)
        }
        Commands::Summary {
            account,
            from,
            to,
            view,
            interval,
        } => cmd_summary(&cfg_dir, ledger_path, &account, from, to, &view, &interval),
        Commands::Report {
            account,
            from,
            to,
            template,
            output,
            open,
        } => cmd_report(&cfg_dir, ledger_path, &account, from, to, &template, output, open),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(ReportError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;

    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;
    fs::write(cfg_dir.join("ledger.toml"), LEDGER_TEMPLATE)?;

    println!("Initialized accreport config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Adjust report settings:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!(
        "  2. Record your bookings:    $EDITOR {}/ledger.toml",
        cfg_dir.display()
    );
    println!();
    println!("Then generate your first report:");
    println!("  accreport report --account Expenses --from 2024-03-01 --to 2024-03-31");

    Ok(())
}

/// Load config.toml and the ledger it points to
fn load(cfg_dir: &Path, ledger_path: Option<&Path>) -> Result<(Config, Ledger)> {
    if !cfg_dir.exists() {
        return Err(ReportError::ConfigNotFound(cfg_dir.to_path_buf()));
    }
    let config = load_config(cfg_dir)?;
    let ledger = load_ledger(cfg_dir, &config, ledger_path)?;
    Ok((config, ledger))
}

/// Dates of `--from` / `--to`. A missing end defaults to the end of the
/// start's month, a missing start to the start of the end's month, both
/// missing to the current month.
fn resolve_range(from: Option<String>, to: Option<String>) -> Result<(NaiveDate, NaiveDate)> {
    let from = from.as_deref().map(parse_date).transpose()?;
    let till = to.as_deref().map(parse_date).transpose()?;
    let month = Interval::Monthly;
    Ok(match (from, till) {
        (Some(from), Some(till)) => (from, till),
        (Some(from), None) => (from, month.end_of(from)),
        (None, Some(till)) => (month.start_of(till), till),
        (None, None) => {
            let today = Local::now().date_naive();
            (month.start_of(today), month.end_of(today))
        }
    })
}

fn build_report<'a>(
    ledger: &'a Ledger,
    accounts: &[String],
    from: Option<String>,
    to: Option<String>,
) -> Result<Report<'a>> {
    if accounts.is_empty() {
        return Err(ReportError::NoAccounts);
    }
    let (from, till) = resolve_range(from, to)?;
    let mut report = Report::new(ledger, from, till)?;
    for name in accounts {
        report.add_account(ledger.lookup(name)?);
    }
    Ok(report)
}

// Table row structs for tabled
#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "ACCOUNT")]
    fullname: String,
    #[tabled(rename = "TYPE")]
    kind: String,
    #[tabled(rename = "ITEMS")]
    items: usize,
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "TRANSACTION")]
    transaction: String,
    #[tabled(rename = "ACCOUNT")]
    account: String,
    #[tabled(rename = "DESCRIPTION")]
    descr: String,
    #[tabled(rename = "VALUE")]
    value: String,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ENTRY")]
    label: String,
    #[tabled(rename = "VALUE")]
    value: String,
    #[tabled(rename = "%")]
    percent: String,
    #[tabled(rename = "ITEMS")]
    items: usize,
}

#[derive(Tabled)]
struct TypeRow {
    #[tabled(rename = "TYPE")]
    label: String,
    #[tabled(rename = "VALUE")]
    value: String,
    #[tabled(rename = "ITEMS")]
    items: usize,
}

/// List accounts in tree order
fn cmd_accounts(cfg_dir: &Path, ledger_path: Option<&Path>) -> Result<()> {
    let (_, ledger) = load(cfg_dir, ledger_path)?;

    let accounts = ledger.accounts();
    if accounts.is_empty() {
        println!("No accounts in ledger.");
        return Ok(());
    }

    let rows: Vec<AccountRow> = accounts
        .iter()
        .map(|a| AccountRow {
            fullname: a.fullname().to_string(),
            kind: a.kind().to_string(),
            items: ledger.item_count(a.id()),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// List items, optionally restricted to accounts and dates
fn cmd_transactions(
    cfg_dir: &Path,
    ledger_path: Option<&Path>,
    accounts: &[String],
    from: Option<String>,
    to: Option<String>,
) -> Result<()> {
    let (config, ledger) = load(cfg_dir, ledger_path)?;

    let mut filter = ItemFilter::All;
    if !accounts.is_empty() {
        let ids = accounts
            .iter()
            .map(|name| ledger.lookup(name))
            .collect::<Result<Vec<_>>>()?;
        filter = filter.and(ItemFilter::AccountsAndChildren(ids));
    }
    if let Some(from) = from.as_deref() {
        filter = filter.and(ItemFilter::DateFrom(parse_date(from)?));
    }
    if let Some(to) = to.as_deref() {
        filter = filter.and(ItemFilter::DateTill(parse_date(to)?));
    }

    let rows: Vec<ItemRow> = ledger
        .filter_items(&filter)
        .map(|v| ItemRow {
            date: v.date().format("%Y-%m-%d").to_string(),
            transaction: v.transaction.descr.clone(),
            account: v.account.fullname().to_string(),
            descr: v.item.descr.clone(),
            value: format!("{}{}", config.report.currency_symbol, format_amount(v.value())),
        })
        .collect();

    if rows.is_empty() {
        println!("No items found with the given filters.");
        return Ok(());
    }

    let count = rows.len();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!("{count} item(s)");

    Ok(())
}

/// Print every group of a dataset as a table
fn cmd_summary(
    cfg_dir: &Path,
    ledger_path: Option<&Path>,
    accounts: &[String],
    from: Option<String>,
    to: Option<String>,
    view: &str,
    interval: &str,
) -> Result<()> {
    let view: DatasetView = view.parse()?;
    let interval: Interval = interval.parse()?;
    let (config, ledger) = load(cfg_dir, ledger_path)?;
    let report = build_report(&ledger, accounts, from, to)?;
    let symbol = config.report.currency_symbol.as_str();

    let dataset = report.dataset(view, interval);
    for group in &dataset {
        println!();
        let table = match view {
            DatasetView::Types => {
                let balance = group.balance.unwrap_or_default();
                println!("{}  Balance: {}{}", group.label, symbol, format_amount(balance));
                let rows: Vec<TypeRow> = group
                    .visible()
                    .map(|e| TypeRow {
                        label: e.label.clone(),
                        value: format!("{}{}", symbol, format_amount(e.value)),
                        items: e.items.len(),
                    })
                    .collect();
                (!rows.is_empty()).then(|| Table::new(rows).with(Style::rounded()).to_string())
            }
            _ => {
                println!("{}  {}{}", group.label, symbol, format_amount(group.sum()));
                let rows: Vec<EntryRow> = group
                    .sorted_by(SortKey::Value, true)
                    .into_iter()
                    .filter(|e| !e.value.is_zero())
                    .map(|e| EntryRow {
                        label: e.label.clone(),
                        value: format!("{}{}", symbol, format_amount(e.value)),
                        percent: format!("{:.1}", group.percent(e)),
                        items: e.items.len(),
                    })
                    .collect();
                (!rows.is_empty()).then(|| Table::new(rows).with(Style::rounded()).to_string())
            }
        };
        match table {
            Some(table) => println!("{table}"),
            None => println!("  No bookings."),
        }
    }

    Ok(())
}

/// Render the HTML report and write it to the output directory
#[allow(clippy::too_many_arguments)]
fn cmd_report(
    cfg_dir: &Path,
    ledger_path: Option<&Path>,
    accounts: &[String],
    from: Option<String>,
    to: Option<String>,
    template: &str,
    output: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    let kind: TemplateKind = template.parse()?;
    let (config, ledger) = load(cfg_dir, ledger_path)?;
    let report = build_report(&ledger, accounts, from, to)?;

    let html = render(&report, kind, &config.report, &mut RenderContext::new())?;

    // Determine output path
    let html_path = match output {
        Some(path) => path,
        None => {
            let output_dir = resolve_path(&config.report.output_dir, cfg_dir);
            output_dir.join(format!("{}_{}_{}.html", report.from(), report.till(), kind))
        }
    };
    if let Some(parent) = html_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&html_path, &html)?;
    tracing::info!(path = %html_path.display(), template = %kind, "report written");

    println!("Generated {} report", kind);
    println!("  Range:    {} to {}", report.from(), report.till());
    println!("  Accounts: {}", accounts.join(", "));
    println!("  Saved:    {}", html_path.display());

    if open {
        open_path(&html_path)?;
    }

    Ok(())
}

fn open_path(path: &Path) -> Result<()> {
    // Open with system default viewer
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(path)
            .spawn()?;
    }
    Ok(())
}
