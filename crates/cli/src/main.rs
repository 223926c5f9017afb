use std::fmt::Display;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use finboard_core::calendar::YearMonth;
use finboard_core::forms::{CardIssuer, InstallmentEdit, NewCardPurchase, NewExpense, PaymentType};
use finboard_core::types::{Row, RowId};
use finboard_db::{connect, StoreConfig};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use finboard_cli::config::DashboardConfig;
use finboard_cli::reports::{apartment, card, expenses, ViewState};

#[derive(Parser)]
#[command(name = "finboard")]
#[command(about = "Personal finance dashboard")]
struct Cli {
    /// Print reports and written rows as JSON.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apartment installments and contract balance.
    Apartment {
        #[command(subcommand)]
        command: Option<ApartmentCommand>,
    },
    /// Credit card purchases.
    Card {
        #[command(subcommand)]
        command: Option<CardCommand>,
    },
    /// Unplanned daily expenses.
    Expenses {
        #[command(subcommand)]
        command: Option<ExpensesCommand>,
    },
}

#[derive(Subcommand)]
enum ApartmentCommand {
    Show,
    /// Overwrite one installment.
    Update {
        #[arg(long)]
        id: String,
        #[arg(long, allow_negative_numbers = true)]
        value: Decimal,
        #[arg(long)]
        installment: String,
        #[arg(long, action = clap::ArgAction::Set)]
        paid: bool,
    },
}

#[derive(Subcommand)]
enum CardCommand {
    List {
        /// Only purchases on this card, by its stored label.
        #[arg(long)]
        card: Option<String>,
        /// Only purchases billed in this invoice month (YYYY-MM).
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Register a purchase.
    Add {
        #[arg(long)]
        card: CardIssuer,
        #[arg(long)]
        purchase_date: Option<NaiveDate>,
        /// Invoice month (YYYY-MM); defaults to the purchase month.
        #[arg(long)]
        invoice_month: Option<YearMonth>,
        #[arg(long)]
        description: String,
        #[arg(long)]
        value: Decimal,
        #[arg(long)]
        installments: bool,
        #[arg(long, default_value_t = 0)]
        installment: u32,
        #[arg(long, default_value_t = 0)]
        total_installments: u32,
        #[arg(long)]
        fixed: bool,
        #[arg(long)]
        forecast: bool,
    },
}

#[derive(Subcommand)]
enum ExpensesCommand {
    List {
        /// Month number; defaults to the current month.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
        /// Defaults to the current year.
        #[arg(long)]
        year: Option<i32>,
    },
    /// Record an expense.
    Add {
        /// Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        description: String,
        #[arg(long, allow_negative_numbers = true)]
        value: Decimal,
        #[arg(long)]
        payment_type: Option<PaymentType>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "finboard=info,finboard_cli=info,finboard_db=info".into());
    let log_json = std::env::var("FINBOARD_LOG_JSON")
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false);

    // Reports go to stdout; logs stay on stderr.
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let dashboard = DashboardConfig::from_env().context("invalid dashboard configuration")?;
    let session = dashboard.session();
    let user = session.require_user()?;
    tracing::info!(user = %user.email, "Session ready");

    let store_config = StoreConfig::from_env().context("invalid table store configuration")?;
    let store = connect(&store_config)?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Apartment { command } => match command.unwrap_or(ApartmentCommand::Show) {
            ApartmentCommand::Show => {
                let report = apartment::build(&store, &dashboard).await;
                emit_report(&report, &report.state, cli.json)
            }
            ApartmentCommand::Update {
                id,
                value,
                installment,
                paid,
            } => {
                let edit = InstallmentEdit {
                    value,
                    installment,
                    status: paid,
                };
                let row = apartment::update_installment(&store, &RowId::new(id), edit).await?;
                emit_row("Installment updated", &row, cli.json)
            }
        },

        Commands::Card { command } => match command.unwrap_or(CardCommand::List {
            card: None,
            month: None,
        }) {
            CardCommand::List { card: label, month } => {
                let filter = card::CardFilter {
                    card: label,
                    invoice_month: month,
                };
                let report = card::build(&store, &filter, today).await;
                emit_report(&report, &report.state, cli.json)
            }
            CardCommand::Add {
                card: issuer,
                purchase_date,
                invoice_month,
                description,
                value,
                installments,
                installment,
                total_installments,
                fixed,
                forecast,
            } => {
                let purchase_date = purchase_date.unwrap_or(today);
                let purchase = NewCardPurchase {
                    card: issuer,
                    purchase_date,
                    invoice_month: invoice_month
                        .unwrap_or_else(|| YearMonth::from_date(purchase_date)),
                    description,
                    installments,
                    installment,
                    total_installments,
                    value,
                    fixed,
                    forecast,
                };
                let row = card::add_purchase(&store, purchase).await?;
                emit_row("Purchase registered", &row, cli.json)
            }
        },

        Commands::Expenses { command } => match command.unwrap_or(ExpensesCommand::List {
            month: None,
            year: None,
        }) {
            ExpensesCommand::List { month, year } => {
                let month = YearMonth::new(
                    year.unwrap_or_else(|| today.year()),
                    month.unwrap_or_else(|| today.month()),
                )?;
                let report = expenses::build(&store, month, dashboard.expense_limit).await;
                emit_report(&report, &report.state, cli.json)
            }
            ExpensesCommand::Add {
                date,
                description,
                value,
                payment_type,
            } => {
                let expense = NewExpense {
                    date: date.unwrap_or(today),
                    description,
                    value,
                    payment_type,
                };
                let row = expenses::add_expense(&store, expense).await?;
                emit_row("Expense recorded", &row, cli.json)
            }
        },
    }
}

/// Print a report; a failed fetch still prints but exits non-zero.
fn emit_report<R>(report: &R, state: &ViewState, json: bool) -> anyhow::Result<ExitCode>
where
    R: Serialize + Display,
{
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(if state.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn emit_row(message: &str, row: &Row, json: bool) -> anyhow::Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(row)?);
    } else {
        let id = RowId::of(row).map(|id| id.to_string()).unwrap_or_default();
        println!("{message} (id {id})");
    }
    Ok(ExitCode::SUCCESS)
}
