use chrono::Local;
use clap::{Parser, Subcommand};
use serde::Serialize;

use finance_proxy::client::{format_amount, summarize, ExpenseFilter, FinanceClient, NewExpense};

#[derive(Parser)]
#[command(name = "finance-cli")]
#[command(about = "Command-line client for the finance API via the proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Bearer token from `login` or `register`
    #[arg(short, long, env = "FINANCE_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and print the session token
    Register {
        email: String,
        password: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Log in and print the session token
    Login { email: String, password: String },
    /// List expenses
    List,
    /// Add an expense
    Add {
        amount: f64,
        description: String,
        #[arg(short, long, default_value = "General")]
        category: String,
    },
    /// Replace an expense
    Update {
        id: i64,
        amount: f64,
        description: String,
        #[arg(short, long, default_value = "General")]
        category: String,
    },
    /// Delete an expense
    Delete { id: i64 },
    /// Totals overall, this week, this month, per category and per day
    Summary {
        #[arg(short, long)]
        category: Option<String>,
        /// Inclusive start date, YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,
        /// Inclusive end date, YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut client = FinanceClient::new(&cli.url);
    if let Some(token) = cli.token {
        client = client.with_token(token);
    }

    match cli.command {
        Commands::Register { email, password, name } => {
            let session = client.register(&email, &password, name.as_deref()).await?;
            print_json(&session)?;
        }
        Commands::Login { email, password } => {
            let session = client.login(&email, &password).await?;
            print_json(&session)?;
        }
        Commands::List => {
            let expenses = client.list_expenses().await?;
            print_json(&expenses)?;
        }
        Commands::Add { amount, description, category } => {
            let expense = NewExpense { amount, description, category };
            print_json(&client.create_expense(&expense).await?)?;
        }
        Commands::Update { id, amount, description, category } => {
            let expense = NewExpense { amount, description, category };
            print_json(&client.update_expense(id, &expense).await?)?;
        }
        Commands::Delete { id } => {
            client.delete_expense(id).await?;
            println!("Deleted expense {}", id);
        }
        Commands::Summary { category, from, to } => {
            let filter = ExpenseFilter {
                category,
                start_date: from,
                end_date: to,
            };
            let expenses = client.list_expenses().await?;
            let summary = summarize(&expenses, &filter, Local::now().date_naive());

            println!("Expenses:   {}", summary.count);
            println!("Total:      {}", summary.total_display());
            println!("This week:  {}", format_amount(summary.week_total));
            println!("This month: {}", format_amount(summary.month_total));
            println!("By category:");
            for (category, amount) in &summary.by_category {
                println!("  {:<16} {}", category, format_amount(*amount));
            }
            println!("By day:");
            for (day, amount) in &summary.by_day {
                println!("  {}       {}", day, format_amount(*amount));
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
