use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::application::{
    AppError, Config, HttpCountingApi, SubmissionWorkflow, catalog_from_env, count_type_from_env,
};
use crate::domain::{
    Catalog, Cents, Receipt, Session, format_cents, format_decimal_comma, is_valid_count,
    parse_cents,
};

/// caehlcettel - cash till counting terminal
#[derive(Parser)]
#[command(name = "caehlcettel")]
#[command(about = "Count a cash till, submit the count and print the receipt")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the denominations the till accepts
    Catalog,

    /// Show the counted total without submitting
    Total {
        /// Counted quantity as <amount>=<quantity>, e.g. "2,00=15" (repeatable)
        #[arg(short, long = "count", value_parser = parse_count_arg)]
        counts: Vec<CountArg>,
    },

    /// Submit a count and trigger the receipt print
    Submit {
        /// Name of the operator who counted
        #[arg(short, long)]
        operator: String,

        /// Counted quantity as <amount>=<quantity>, e.g. "2,00=15" (repeatable)
        #[arg(short, long = "count", value_parser = parse_count_arg)]
        counts: Vec<CountArg>,

        /// Count type tag (defaults to COUNT_TYPE)
        #[arg(short = 't', long)]
        count_type: Option<String>,

        /// Print the JSON body instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Enter quantities one denomination at a time, then submit
    Count {
        /// Name of the operator (prompted for if omitted)
        #[arg(short, long)]
        operator: Option<String>,

        /// Count type tag (defaults to COUNT_TYPE)
        #[arg(short = 't', long)]
        count_type: Option<String>,
    },
}

/// A `--count` argument: denomination face value and the raw quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountArg {
    pub face_value: Cents,
    pub quantity: String,
}

fn parse_count_arg(s: &str) -> Result<CountArg, String> {
    let (amount, quantity) = s
        .split_once('=')
        .ok_or_else(|| format!("expected <amount>=<quantity>, got '{}'", s))?;
    let face_value =
        parse_cents(amount).map_err(|e| format!("invalid amount '{}': {}", amount, e))?;
    Ok(CountArg {
        face_value,
        quantity: quantity.to_string(),
    })
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_logging(self.verbose)?;

        match self.command {
            Commands::Catalog => {
                let catalog = catalog_from_env()?;
                println!("{:>10} {:<18}", "AMOUNT", "PAYLOAD KEY");
                println!("{}", "-".repeat(29));
                for denomination in catalog.denominations() {
                    println!(
                        "{:>10} {:<18}",
                        denomination.label,
                        denomination.payload_key()
                    );
                }
            }

            Commands::Total { counts } => {
                let mut session = Session::new(catalog_from_env()?, count_type_from_env());
                apply_counts(&mut session, &counts)?;
                print_receipt(&Receipt::from_ledger(&session.ledger, Local::now()));
            }

            Commands::Submit {
                operator,
                counts,
                count_type,
                dry_run,
            } => {
                if dry_run {
                    let count_type = count_type.unwrap_or_else(count_type_from_env);
                    let mut session = Session::new(catalog_from_env()?, count_type);
                    session.set_operator(operator);
                    apply_counts(&mut session, &counts)?;
                    let submission = session.submission().ok_or(AppError::MissingOperator)?;
                    println!("{}", serde_json::to_string_pretty(&submission)?);
                    return Ok(());
                }

                let config = Config::from_env()?;
                let count_type = count_type.unwrap_or_else(|| config.count_type.clone());
                let mut session = Session::new(config.catalog.clone(), count_type);
                session.set_operator(operator);
                apply_counts(&mut session, &counts)?;

                print_receipt(&Receipt::from_ledger(&session.ledger, Local::now()));
                submit_session(&config, &session).await?;
            }

            Commands::Count {
                operator,
                count_type,
            } => {
                let config = Config::from_env()?;
                let count_type = count_type.unwrap_or_else(|| config.count_type.clone());
                let mut session = Session::new(config.catalog.clone(), count_type);
                if let Some(operator) = operator {
                    session.set_operator(operator);
                }

                let stdin = io::stdin();
                let mut input = stdin.lock();
                prompt_counts(&mut session, &mut input)?;
                while session.operator().is_none() {
                    match prompt_line(&mut input, "Operator: ")? {
                        Some(name) => session.set_operator(name),
                        None => bail!("No operator name given, nothing was submitted"),
                    }
                }

                println!();
                print_receipt(&Receipt::from_ledger(&session.ledger, Local::now()));
                submit_session(&config, &session).await?;
            }
        }

        Ok(())
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

fn apply_counts(session: &mut Session, counts: &[CountArg]) -> Result<()> {
    for count in counts {
        if session.ledger.catalog().get(count.face_value).is_none() {
            bail!(
                "{} is not a known denomination. Known: {}",
                format_cents(count.face_value),
                known_denominations(session.ledger.catalog())
            );
        }
        if !is_valid_count(&count.quantity) {
            eprintln!(
                "Warning: invalid quantity '{}' for {}, counted as 0",
                count.quantity,
                format_cents(count.face_value)
            );
        }
        session.ledger.set_count(count.face_value, &count.quantity);
    }
    Ok(())
}

fn known_denominations(catalog: &Catalog) -> String {
    catalog
        .denominations()
        .iter()
        .map(|d| d.label.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ask for every denomination in catalog order. The running total is shown
/// through a ledger subscription.
fn prompt_counts(session: &mut Session, input: &mut impl BufRead) -> Result<()> {
    let subscription = session.ledger.subscribe(|change| {
        println!("{:>20} {}", "Summe:", format_decimal_comma(change.total));
    });

    let denominations = session.ledger.catalog().denominations().to_vec();
    for denomination in denominations {
        let prompt = format!("{:>10} x ", denomination.label);
        let Some(raw) = prompt_line(input, &prompt)? else {
            break;
        };
        if !is_valid_count(&raw) {
            eprintln!("  '{}' is not a valid quantity, counted as 0", raw);
        }
        session.ledger.set_count(denomination.face_value, &raw);
    }

    session.ledger.unsubscribe(subscription);
    Ok(())
}

/// Read one trimmed line. `None` on end of input.
fn prompt_line(input: &mut impl BufRead, prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    let read = input.read_line(&mut line).context("Failed to read input")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_receipt(receipt: &Receipt) {
    println!("Count of {}", receipt.timestamp_label());
    println!("{:>10} {:>8} {:>12}", "AMOUNT", "QTY", "SUBTOTAL");
    println!("{}", "-".repeat(32));
    for line in receipt.counted_lines() {
        println!(
            "{:>10} {:>8} {:>12}",
            line.label,
            line.quantity,
            format_decimal_comma(line.subtotal)
        );
    }
    println!("{}", "-".repeat(32));
    println!("{:>10} {:>21}", "Summe", receipt.total_label());
}

async fn submit_session(config: &Config, session: &Session) -> Result<()> {
    let api = HttpCountingApi::new(config)?;
    let mut workflow = SubmissionWorkflow::new(api, Some(config.printer_hostname.clone()));

    match workflow.run(session).await {
        Ok(outcome) => {
            println!();
            println!(
                "Count recorded ({}): {}",
                session.count_type(),
                outcome.record_url
            );
            println!("Receipt sent to printer {}", config.printer_hostname);
            Ok(())
        }
        Err(err) => {
            if err.count_recorded() {
                eprintln!("The count is NOT lost, only the printout failed.");
            }
            Err(err.into())
        }
    }
}
