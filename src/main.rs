use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use cardsplit::config::{
    config_dir, load_cards, load_config, load_people, load_purchases, load_state, save_state,
    CARDS_TEMPLATE, CONFIG_TEMPLATE, PEOPLE_TEMPLATE, PURCHASES_TEMPLATE,
};
use cardsplit::error::{LedgerError, Result};
use cardsplit::schedule::{
    due_in, person_schedule, person_totals, project_all, project_installments, total_owed,
    total_scheduled, TrackedInstallment,
};
use cardsplit::{Person, Purchase};

#[derive(Parser)]
#[command(name = "cardsplit")]
#[command(version, about = "Split shared credit card purchases into installments", long_about = None)]
struct Cli {
    /// Path to config directory (default: XDG config dir or ~/.cardsplit)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Logging verbosity: off, error, warn, info, debug, trace (RUST_LOG overrides)
    #[arg(long, global = true, default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with template files
    Init,

    /// List people
    People,

    /// List cards and their billing cycles
    Cards,

    /// List purchases, newest first
    Purchases,

    /// Show the installment schedule of a purchase
    Schedule {
        /// Purchase identifier from purchases.toml
        purchase: String,

        /// Print the schedule as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show installments due in a month
    Due {
        /// Month in YYYY-MM format (default: current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Show every installment of a person
    Person {
        /// Person identifier from people.toml
        person: String,
    },

    /// Show totals scheduled and owed
    Summary,

    /// Mark an installment as paid
    Pay {
        /// Purchase identifier from purchases.toml
        purchase: String,

        /// 1-based installment number
        number: u32,
    },

    /// Mark an installment as not paid
    Unpay {
        /// Purchase identifier from purchases.toml
        purchase: String,

        /// 1-based installment number
        number: u32,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber. RUST_LOG wins over --log-level.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };
    debug!(config_dir = %cfg_dir.display(), "starting");

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::People => cmd_people(&cfg_dir),
        Commands::Cards => cmd_cards(&cfg_dir),
        Commands::Purchases => cmd_purchases(&cfg_dir),
        Commands::Schedule { purchase, json } => cmd_schedule(&cfg_dir, &purchase, json),
        Commands::Due { month } => cmd_due(&cfg_dir, month.as_deref()),
        Commands::Person { person } => cmd_person(&cfg_dir, &person),
        Commands::Summary => cmd_summary(&cfg_dir),
        Commands::Pay { purchase, number } => cmd_set_paid(&cfg_dir, &purchase, number, true),
        Commands::Unpay { purchase, number } => cmd_set_paid(&cfg_dir, &purchase, number, false),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(LedgerError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;
    fs::write(cfg_dir.join("people.toml"), PEOPLE_TEMPLATE)?;
    fs::write(cfg_dir.join("cards.toml"), CARDS_TEMPLATE)?;
    fs::write(cfg_dir.join("purchases.toml"), PURCHASES_TEMPLATE)?;

    println!("Initialized cardsplit config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Add the people sharing your cards:  $EDITOR {}/people.toml",
        cfg_dir.display()
    );
    println!(
        "  2. Add your cards:                     $EDITOR {}/cards.toml",
        cfg_dir.display()
    );
    println!(
        "  3. Record purchases:                   $EDITOR {}/purchases.toml",
        cfg_dir.display()
    );
    println!();
    println!("Then see what is due this month:");
    println!("  cardsplit due");

    Ok(())
}

fn ensure_initialized(cfg_dir: &Path) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(LedgerError::ConfigNotFound(cfg_dir.to_path_buf()));
    }
    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct PersonRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "PHONE")]
    phone: String,
}

#[derive(Tabled)]
struct CardRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "BRAND")]
    brand: String,
    #[tabled(rename = "CLOSES")]
    closing_day: u32,
    #[tabled(rename = "DUE")]
    due_day: u32,
}

#[derive(Tabled)]
struct PurchaseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "PERSON")]
    person: String,
    #[tabled(rename = "STORE")]
    store: String,
    #[tabled(rename = "TOTAL")]
    total: String,
    #[tabled(rename = "PAID")]
    paid: String,
}

#[derive(Tabled)]
struct ScheduleRow {
    #[tabled(rename = "#")]
    number: String,
    #[tabled(rename = "DUE")]
    due_date: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

#[derive(Tabled)]
struct PersonScheduleRow {
    #[tabled(rename = "DUE")]
    due_date: String,
    #[tabled(rename = "STORE")]
    store: String,
    #[tabled(rename = "#")]
    number: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

#[derive(Tabled)]
struct DueRow {
    #[tabled(rename = "DUE")]
    due_date: String,
    #[tabled(rename = "PERSON")]
    person: String,
    #[tabled(rename = "STORE")]
    store: String,
    #[tabled(rename = "#")]
    number: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

#[derive(Tabled)]
struct TotalsRow {
    #[tabled(rename = "PERSON")]
    person: String,
    #[tabled(rename = "TOTAL")]
    total: String,
    #[tabled(rename = "OUTSTANDING")]
    outstanding: String,
}

fn status_label(is_paid: bool) -> String {
    let label = if is_paid { "PAID" } else { "UNPAID" };
    label.to_string()
}

fn person_name(people: &HashMap<String, Person>, person_id: &str) -> String {
    people
        .get(person_id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Insert thousands separators into a string of ASCII digits
fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}

/// Format a money amount with two decimal places and thousands separators
fn format_money(value: Decimal, currency_symbol: &str) -> String {
    let rounded = format!("{:.2}", value.round_dp(2));
    let (whole, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let negative = whole.starts_with('-');
    let digits = whole.trim_start_matches('-');
    let grouped = group_digits(digits);

    if negative {
        format!("-{currency_symbol}{grouped}.{frac}")
    } else {
        format!("{currency_symbol}{grouped}.{frac}")
    }
}

/// Append TOTAL / PAID / OUTSTANDING rows under a rounded table.
///
/// The first `label_columns` columns are merged into one label cell and the
/// next column carries the value; any columns after it are closed off. The
/// value column is widened when a footer value does not fit in it.
fn add_financial_footer(table: &str, label_columns: usize, rows: &[(&str, String)]) -> String {
    let lines: Vec<&str> = table.lines().collect();
    if lines.len() < 4 || rows.is_empty() || label_columns == 0 {
        return table.to_string();
    }

    // Parse the top border to discover column widths
    let Some(inner) = lines[0]
        .strip_prefix('╭')
        .and_then(|s| s.strip_suffix('╮'))
    else {
        return table.to_string();
    };

    let widths: Vec<usize> = inner.split('┬').map(|p| p.chars().count()).collect();
    if widths.len() <= label_columns {
        return table.to_string();
    }

    let label_width = widths[..label_columns].iter().sum::<usize>() + label_columns - 1;
    let widest = rows
        .iter()
        .map(|(_, value)| value.chars().count() + 2)
        .max()
        .unwrap_or(0);
    let extra = widest.saturating_sub(widths[label_columns]);
    let value_width = widths[label_columns] + extra;
    let trailing = &widths[label_columns + 1..];
    let dashes = |ws: &[usize]| -> Vec<String> { ws.iter().map(|w| "─".repeat(*w)).collect() };

    // Char index of the border closing the value column, identical on every line
    let value_end = 1 + widths[..=label_columns].iter().sum::<usize>() + label_columns;
    let body: Vec<String> = lines[..lines.len() - 1]
        .iter()
        .map(|line| widen_column(line, value_end, extra))
        .collect();

    // Bottom border is replaced by the footer
    let mut out = body.join("\n");
    out.push('\n');

    out.push('├');
    out.push_str(&dashes(&widths[..label_columns]).join("┴"));
    out.push('┼');
    out.push_str(&"─".repeat(value_width));
    if trailing.is_empty() {
        out.push('┤');
    } else {
        out.push('┼');
        out.push_str(&dashes(trailing).join("┴"));
        out.push('╯');
    }
    out.push('\n');

    for (idx, (label, value)) in rows.iter().enumerate() {
        out.push_str(&format!(
            "│ {:>left$} │ {:>right$} │\n",
            label,
            value,
            left = label_width - 2,
            right = value_width - 2
        ));
        if idx < rows.len() - 1 {
            out.push_str(&format!(
                "├{}┼{}┤\n",
                "─".repeat(label_width),
                "─".repeat(value_width)
            ));
        }
    }

    out.push_str(&format!(
        "╰{}┴{}╯",
        "─".repeat(label_width),
        "─".repeat(value_width)
    ));

    out
}

/// Pad a table line with `extra` fill chars just before char index `at`
fn widen_column(line: &str, at: usize, extra: usize) -> String {
    if extra == 0 {
        return line.to_string();
    }
    let fill = if line.starts_with('│') { ' ' } else { '─' };
    let mut chars: Vec<char> = line.chars().collect();
    let at = at.min(chars.len());
    chars.splice(at..at, std::iter::repeat(fill).take(extra));
    chars.into_iter().collect()
}

fn footer_rows(installments: &[TrackedInstallment], currency_symbol: &str) -> Vec<(&'static str, String)> {
    let total = total_scheduled(installments);
    let outstanding = total_owed(installments);
    vec![
        ("TOTAL", format_money(total, currency_symbol)),
        ("(-) PAID", format_money(total - outstanding, currency_symbol)),
        ("(=) OUTSTANDING", format_money(outstanding, currency_symbol)),
    ]
}

/// List people
fn cmd_people(cfg_dir: &Path) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    let people = load_people(cfg_dir)?;
    if people.is_empty() {
        println!("No people configured.");
        println!("Add people to: {}/people.toml", cfg_dir.display());
        return Ok(());
    }

    let mut sorted: Vec<_> = people.values().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let rows: Vec<PersonRow> = sorted
        .iter()
        .map(|person| PersonRow {
            id: person.id.clone(),
            name: person.name.clone(),
            phone: person.phone.clone().unwrap_or_default(),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

/// List cards
fn cmd_cards(cfg_dir: &Path) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    let cards = load_cards(cfg_dir)?;
    if cards.is_empty() {
        println!("No cards configured.");
        println!("Add cards to: {}/cards.toml", cfg_dir.display());
        return Ok(());
    }

    let mut sorted: Vec<_> = cards.values().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let rows: Vec<CardRow> = sorted
        .iter()
        .map(|card| CardRow {
            id: card.id.clone(),
            name: card.name.clone(),
            brand: card.brand.clone().unwrap_or_default(),
            closing_day: card.closing_day,
            due_day: card.due_day,
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

/// List purchases, newest first
fn cmd_purchases(cfg_dir: &Path) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    let config = load_config(cfg_dir)?;
    let people = load_people(cfg_dir)?;
    let purchases = load_purchases(cfg_dir)?;
    let state = load_state(cfg_dir)?;

    if purchases.is_empty() {
        println!("No purchases recorded.");
        println!("Add purchases to: {}/purchases.toml", cfg_dir.display());
        return Ok(());
    }

    let mut sorted: Vec<_> = purchases.values().collect();
    sorted.sort_by(|a, b| {
        b.purchase_date
            .cmp(&a.purchase_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    let symbol = &config.display.currency_symbol;
    let rows: Vec<PurchaseRow> = sorted
        .iter()
        .map(|p| PurchaseRow {
            id: p.id.clone(),
            date: p.purchase_date.to_string(),
            person: person_name(&people, &p.person),
            store: p.store.clone(),
            total: format!(
                "{} ({}x)",
                format_money(p.total_amount, symbol),
                p.installments
            ),
            paid: format!("{}/{}", state.paid_count(&p.id), p.installments),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
    println!();
    println!("Total: {} purchases", purchases.len());
    Ok(())
}

fn find_purchase<'a>(purchases: &'a HashMap<String, Purchase>, purchase_id: &str) -> Result<&'a Purchase> {
    purchases
        .get(purchase_id)
        .ok_or_else(|| LedgerError::PurchaseNotFound(purchase_id.to_string()))
}

/// Show the installment schedule of one purchase
fn cmd_schedule(cfg_dir: &Path, purchase_id: &str, json: bool) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    let config = load_config(cfg_dir)?;
    let cards = load_cards(cfg_dir)?;
    let purchases = load_purchases(cfg_dir)?;
    let state = load_state(cfg_dir)?;

    let purchase = find_purchase(&purchases, purchase_id)?;
    let card = cards
        .get(&purchase.card)
        .ok_or_else(|| LedgerError::CardNotFound {
            purchase: purchase.id.clone(),
            card: purchase.card.clone(),
        })?;

    let installments: Vec<TrackedInstallment> =
        project_installments(purchase, card, config.installments.split())?
            .into_iter()
            .map(|installment| TrackedInstallment {
                is_paid: state.is_paid(&installment.purchase_id, installment.installment_number),
                installment,
            })
            .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&installments)?);
        return Ok(());
    }

    let symbol = &config.display.currency_symbol;
    let rows: Vec<ScheduleRow> = installments
        .iter()
        .map(|i| ScheduleRow {
            number: format!(
                "{}/{}",
                i.installment.installment_number, i.installment.total_installments
            ),
            due_date: i.installment.due_date.to_string(),
            amount: format_money(i.installment.amount, symbol),
            status: status_label(i.is_paid),
        })
        .collect();

    println!(
        "{} - {} on {} ({})",
        purchase.id, purchase.store, purchase.purchase_date, card.name
    );
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!(
        "{}",
        add_financial_footer(&table, 2, &footer_rows(&installments, symbol))
    );
    Ok(())
}

/// Parse a YYYY-MM month into its first day
fn parse_month(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{input}-01"), "%Y-%m-%d")
        .map_err(|_| LedgerError::InvalidMonth(input.to_string()))
}

/// Show installments due in a month
fn cmd_due(cfg_dir: &Path, month: Option<&str>) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    let month = match month {
        Some(m) => parse_month(m)?,
        None => chrono::Local::now().date_naive(),
    };

    let config = load_config(cfg_dir)?;
    let people = load_people(cfg_dir)?;
    let cards = load_cards(cfg_dir)?;
    let purchases = load_purchases(cfg_dir)?;
    let state = load_state(cfg_dir)?;

    let all = project_all(&cards, &purchases, &state, config.installments.split())?;
    let due = due_in(&all, month.year(), month.month());
    let label = month.format("%B %Y");

    if due.is_empty() {
        println!("No installments due in {label}.");
        return Ok(());
    }

    let symbol = &config.display.currency_symbol;
    let rows: Vec<DueRow> = due
        .iter()
        .map(|i| DueRow {
            due_date: i.installment.due_date.to_string(),
            person: person_name(&people, &i.installment.person_id),
            store: i.installment.store.clone(),
            number: format!(
                "{}/{}",
                i.installment.installment_number, i.installment.total_installments
            ),
            amount: format_money(i.installment.amount, symbol),
            status: status_label(i.is_paid),
        })
        .collect();

    println!("Due in {label}");
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", add_financial_footer(&table, 4, &footer_rows(&due, symbol)));
    Ok(())
}

/// Show every installment of one person
fn cmd_person(cfg_dir: &Path, person_id: &str) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    let config = load_config(cfg_dir)?;
    let people = load_people(cfg_dir)?;
    let cards = load_cards(cfg_dir)?;
    let purchases = load_purchases(cfg_dir)?;
    let state = load_state(cfg_dir)?;

    let person = people
        .get(person_id)
        .ok_or_else(|| LedgerError::PersonNotFound(person_id.to_string()))?;

    let all = project_all(&cards, &purchases, &state, config.installments.split())?;
    let schedule = person_schedule(&all, person_id);

    println!("{} ({})", person.name, person.id);
    if schedule.is_empty() {
        println!("  No purchases for this person.");
        return Ok(());
    }

    let symbol = &config.display.currency_symbol;
    let rows: Vec<PersonScheduleRow> = schedule
        .iter()
        .map(|i| PersonScheduleRow {
            due_date: i.installment.due_date.to_string(),
            store: i.installment.store.clone(),
            number: format!(
                "{}/{}",
                i.installment.installment_number, i.installment.total_installments
            ),
            amount: format_money(i.installment.amount, symbol),
            status: status_label(i.is_paid),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!(
        "{}",
        add_financial_footer(&table, 3, &footer_rows(&schedule, symbol))
    );
    Ok(())
}

/// Show totals across every purchase
fn cmd_summary(cfg_dir: &Path) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    let config = load_config(cfg_dir)?;
    let people = load_people(cfg_dir)?;
    let cards = load_cards(cfg_dir)?;
    let purchases = load_purchases(cfg_dir)?;
    let state = load_state(cfg_dir)?;

    let all = project_all(&cards, &purchases, &state, config.installments.split())?;
    let symbol = &config.display.currency_symbol;

    println!("Card Split Summary");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("People:           {}", people.len());
    println!("Cards:            {}", cards.len());
    println!("Purchases:        {}", purchases.len());
    println!("Total scheduled:  {}", format_money(total_scheduled(&all), symbol));
    println!("Total owed:       {}", format_money(total_owed(&all), symbol));

    let totals = person_totals(&all);
    if !totals.is_empty() {
        println!();
        let rows: Vec<TotalsRow> = totals
            .iter()
            .map(|t| TotalsRow {
                person: person_name(&people, &t.person_id),
                total: format_money(t.total, symbol),
                outstanding: format_money(t.outstanding, symbol),
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    Ok(())
}

/// Mark an installment as paid or unpaid
fn cmd_set_paid(cfg_dir: &Path, purchase_id: &str, number: u32, paid: bool) -> Result<()> {
    ensure_initialized(cfg_dir)?;

    let purchases = load_purchases(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;

    let purchase = find_purchase(&purchases, purchase_id)?;
    if number == 0 || number > purchase.installments {
        return Err(LedgerError::InvalidInstallmentNumber {
            purchase: purchase.id.clone(),
            number,
            count: purchase.installments,
        });
    }

    let changed = if paid {
        state.mark_paid(&purchase.id, number)
    } else {
        state.mark_unpaid(&purchase.id, number)
    };
    let label = if paid { "paid" } else { "unpaid" };

    if !changed {
        println!(
            "{} installment {}/{} is already {}",
            purchase.id, number, purchase.installments, label
        );
        return Ok(());
    }

    save_state(cfg_dir, &state)?;
    println!(
        "Marked {} installment {}/{} as {}",
        purchase.id, number, purchase.installments, label
    );
    Ok(())
}
