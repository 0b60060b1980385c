//! Caixinha - command line front end for the personal finance tracker.
//!
//! Logs in against the Caixinha API, keeps the tokens in the configured
//! storage backend and shows the monthly summary, categories and
//! transactions.

use std::io;

use anyhow::{bail, Context, Result};
use caixinha_core::api::{ApiClient, DEFAULT_RECENT_LIMIT};
use caixinha_core::auth::{Navigation, Session};
use caixinha_core::models::{
    LoginRequest, NewTransaction, RegisterRequest, Totals, Transaction, TransactionFilter, TxType,
};
use caixinha_core::utils::{
    current_month, format_cents, is_valid_date, is_valid_month, normalize_amount, parse_cents,
    today,
};
use caixinha_core::Config;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "caixinha", version, about = "Personal finance tracker")]
struct Cli {
    /// Print API responses as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session tokens
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Log out and forget the stored tokens
    Logout,
    /// Show the logged in user
    Whoami,
    /// Show where tokens are stored and whether a session exists
    Status,
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
    /// Request a password reset email
    ForgotPassword { login: String },
    /// Set a new password from a reset link
    ResetPassword { uid: String, token: String },
    /// Monthly summary
    Summary {
        /// YYYY-MM, defaults to the current month
        #[arg(long)]
        month: Option<String>,
    },
    /// Latest transactions of a month
    Recent {
        #[arg(long)]
        month: Option<String>,
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: u32,
    },
    /// Manage categories
    #[command(subcommand)]
    Categories(CategoryCommand),
    /// Manage transactions
    #[command(subcommand)]
    Transactions(TransactionCommand),
}

#[derive(Subcommand)]
enum CategoryCommand {
    List,
    Add { name: String },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum TransactionCommand {
    List {
        #[arg(long)]
        month: Option<String>,
        /// IN or OUT
        #[arg(long = "type")]
        tx_type: Option<TxType>,
        #[arg(long)]
        category: Option<i64>,
    },
    Add {
        /// IN or OUT
        #[arg(long = "type")]
        tx_type: TxType,
        /// Accepts "1234.56" or "1.234,56"
        #[arg(long)]
        amount: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        category: Option<i64>,
    },
    Delete { id: i64 },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load()?;
    let gateway = config.connect()?;
    info!(api = gateway.base_url(), backend = gateway.store().backend(), "Caixinha starting");

    let session = Session::new(gateway.clone());
    let api = ApiClient::new(gateway);

    match cli.command {
        Command::Login { email } => {
            let email = match email.or_else(|| config.last_email.clone()) {
                Some(email) => email,
                None => prompt("Email: ")?,
            };
            let password = rpassword::prompt_password("Password: ")?;
            let user = session
                .login(&LoginRequest {
                    email: email.clone(),
                    password,
                })
                .await
                .map_err(|e| anyhow::anyhow!("Login failed: {}", e.detail().unwrap_or_else(|| e.to_string())))?;
            config.last_email = Some(email);
            config.save()?;
            println!("Welcome, {}!", user.display_name());
        }
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
        }
        Command::Whoami => {
            require_login(&session, "/auth/me")?;
            match session.current_user().await {
                Some(user) => print_output(cli.json, &user, || {
                    println!("{} <{}> (id {})", user.display_name(), user.email, user.id)
                })?,
                None => bail!("Session expired. Run `caixinha login` again."),
            }
        }
        Command::Status => {
            println!("API:     {}", config.api_base_url);
            println!("Storage: {}", session.store().backend());
            println!(
                "Session: {}",
                if session.is_authenticated() { "logged in" } else { "logged out" }
            );
        }
        Command::Register { username, email } => {
            let password = rpassword::prompt_password("Password: ")?;
            let password2 = rpassword::prompt_password("Repeat password: ")?;
            session
                .register(&RegisterRequest {
                    username,
                    email,
                    password,
                    password2,
                })
                .await
                .context("Registration failed")?;
            println!("Account created. You can now log in.");
        }
        Command::ForgotPassword { login } => {
            session
                .request_password_reset(&login)
                .await
                .context("Could not request password reset")?;
            println!("If the account exists, a reset link is on its way.");
        }
        Command::ResetPassword { uid, token } => {
            let p1 = rpassword::prompt_password("New password: ")?;
            let p2 = rpassword::prompt_password("Repeat new password: ")?;
            session
                .confirm_password_reset(&uid, &token, &p1, &p2)
                .await
                .context("Invalid or expired reset link")?;
            println!("Password changed. Log in with the new password.");
        }
        Command::Summary { month } => {
            require_login(&session, "/")?;
            let month = month_or_current(month)?;
            let summary = api.summary(&month).await?;
            print_output(cli.json, &summary, || {
                println!("Month:          {}", summary.month);
                println!("Income:         {}", summary.income);
                println!("Expense:        {}", summary.expense);
                println!("Month balance:  {}", summary.balance_month);
                println!("Total balance:  {}", summary.balance_total);
                let top = summary.top_expenses(5);
                if !top.is_empty() {
                    println!("\nTop expenses:");
                    for (name, cents) in top {
                        println!("  {:<24} {:>12}", name, format_cents(cents));
                    }
                }
            })?;
        }
        Command::Recent { month, limit } => {
            require_login(&session, "/")?;
            let month = month_or_current(month)?;
            let txs = api.recent_transactions(&month, limit).await?;
            print_output(cli.json, &txs, || print_transactions(&txs))?;
        }
        Command::Categories(cmd) => {
            require_login(&session, "/categories")?;
            match cmd {
                CategoryCommand::List => {
                    let categories = api.categories().await?;
                    print_output(cli.json, &categories, || {
                        if categories.is_empty() {
                            println!("No categories yet");
                        }
                        for c in &categories {
                            println!("{:>5}  {}", c.id, c.name);
                        }
                    })?;
                }
                CategoryCommand::Add { name } => {
                    let category = api.create_category(&name).await?;
                    println!("Created category {} ({})", category.name, category.id);
                }
                CategoryCommand::Delete { id } => {
                    api.delete_category(id).await?;
                    println!("Deleted category {}", id);
                }
            }
        }
        Command::Transactions(cmd) => {
            require_login(&session, "/transactions")?;
            match cmd {
                TransactionCommand::List {
                    month,
                    tx_type,
                    category,
                } => {
                    let mut filter = TransactionFilter::month(month_or_current(month)?);
                    filter.tx_type = tx_type;
                    filter.category = category;
                    let txs = api.transactions(&filter).await?;
                    print_output(cli.json, &txs, || {
                        print_transactions(&txs);
                        let totals = Totals::from_transactions(&txs);
                        println!(
                            "\nIncome {}  Expense {}  Balance {}",
                            format_cents(totals.income),
                            format_cents(totals.expense),
                            format_cents(totals.balance())
                        );
                    })?;
                }
                TransactionCommand::Add {
                    tx_type,
                    amount,
                    date,
                    description,
                    category,
                } => {
                    let amount = normalize_amount(&amount);
                    if parse_cents(&amount).is_none() {
                        bail!("Invalid amount: {}", amount);
                    }
                    let date = date.unwrap_or_else(today);
                    if !is_valid_date(&date) {
                        bail!("Invalid date (expected YYYY-MM-DD): {}", date);
                    }
                    let tx = api
                        .create_transaction(&NewTransaction {
                            tx_type,
                            amount,
                            date,
                            description,
                            category,
                        })
                        .await?;
                    println!("Created transaction {}", tx.id);
                }
                TransactionCommand::Delete { id } => {
                    api.delete_transaction(id).await?;
                    println!("Deleted transaction {}", id);
                }
            }
        }
    }

    Ok(())
}

fn require_login(session: &Session, route: &str) -> Result<()> {
    match session.guard(route) {
        Navigation::Allow => Ok(()),
        Navigation::Redirect { .. } => bail!("Not logged in. Run `caixinha login` first."),
    }
}

fn month_or_current(month: Option<String>) -> Result<String> {
    let month = month.unwrap_or_else(current_month);
    if !is_valid_month(&month) {
        bail!("Invalid month (expected YYYY-MM): {}", month);
    }
    Ok(month)
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;

    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_output<T: Serialize>(json: bool, value: &T, text: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text();
    }
    Ok(())
}

fn print_transactions(txs: &[Transaction]) {
    if txs.is_empty() {
        println!("No transactions");
        return;
    }
    for tx in txs {
        let sign = match tx.tx_type {
            TxType::Income => "+",
            TxType::Expense => "-",
        };
        println!(
            "{:>5}  {}  {}{:>10}  {:<16}  {}",
            tx.id,
            tx.date,
            sign,
            tx.amount,
            tx.category_name.as_deref().unwrap_or("-"),
            tx.description
        );
    }
}
