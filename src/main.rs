//! Debt Ledger CLI
//!
//! Manages customers, debts and installment payments stored as a JSON
//! snapshot in a data directory.
//!
//! # Usage
//!
//! ```bash
//! debt-ledger add-customer "Jane" --mobile 0712345678
//! debt-ledger add-debt 1 "Invoice #1" 1000
//! debt-ledger pay 1 2 600
//! debt-ledger totals
//! ```
//!
//! # Environment Variables
//!
//! - `LEDGER_DATA_DIR`: directory holding `customers.json` (default `.`)
//! - `LEDGER_CURRENCY`: currency code used for display (default `KES`)
//! - `LEDGER_STRICT`: roll back changes that cannot be saved. Accepts
//!   `1`/`0`, `true`/`false`, `yes`/`no` and `on`/`off`
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use chrono::NaiveDate;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use debt_ledger::report::{
    render_customer, render_customer_line, render_debt_line, render_totals, write_report,
};
use debt_ledger::{
    CustomerId, CustomerMetadata, CustomerPatch, DebtId, Durability, JsonFileStore, Ledger,
    LedgerError, Money, NewDebt, Result,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(
    name = "debt-ledger",
    version,
    about = "Track customers, their debts and installment payments"
)]
struct Cli {
    /// Directory holding the ledger snapshot
    #[arg(long, env = "LEDGER_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Currency code used when displaying amounts
    #[arg(long, env = "LEDGER_CURRENCY", default_value = "KES")]
    currency: String,

    /// Roll back a change if it cannot be saved
    #[arg(
        long,
        env = "LEDGER_STRICT",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a customer
    AddCustomer {
        name: String,
        #[command(flatten)]
        details: DetailArgs,
    },
    /// Edit a customer's name or details. An empty value clears a detail
    UpdateCustomer {
        id: CustomerId,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        details: DetailArgs,
    },
    /// Delete a customer and all their debts
    DeleteCustomer {
        id: CustomerId,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Open a debt for a customer
    AddDebt {
        customer: CustomerId,
        description: String,
        principal: Money,
        /// Issue date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Amount already paid when the debt is opened
        #[arg(long)]
        paid: Option<Money>,
    },
    /// Record an installment payment against a debt
    Pay {
        customer: CustomerId,
        debt: DebtId,
        amount: Money,
    },
    /// Delete a debt and its installments
    DeleteDebt {
        customer: CustomerId,
        debt: DebtId,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// List customers
    List {
        /// Only show customers whose name, shop or mobile number matches
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a customer with their debts and payments
    Show { id: CustomerId },
    /// Show ledger totals
    Totals,
    /// Write a CSV report of every debt
    Report {
        /// Output file (default stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
struct DetailArgs {
    #[arg(long)]
    mobile: Option<String>,
    #[arg(long)]
    invoice: Option<String>,
    #[arg(long)]
    shop: Option<String>,
    #[arg(long)]
    sales_rep: Option<String>,
    #[arg(long)]
    comment: Option<String>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let durability = if cli.strict {
        Durability::Strict
    } else {
        Durability::BestEffort
    };
    let mut ledger = Ledger::open(JsonFileStore::new(cli.data_dir))?.with_durability(durability);
    let currency = cli.currency.as_str();

    match cli.command {
        Command::AddCustomer { name, details } => {
            let metadata = CustomerMetadata {
                mobile_no: details.mobile,
                invoice_no: details.invoice,
                shop_name: details.shop,
                sales_rep: details.sales_rep,
                comment: details.comment,
            };
            let customer = ledger.add_customer(&name, metadata)?;
            println!("Added customer {}: {}", customer.id(), customer.name());
        }
        Command::UpdateCustomer { id, name, details } => {
            let patch = CustomerPatch {
                name,
                mobile_no: details.mobile,
                invoice_no: details.invoice,
                shop_name: details.shop,
                sales_rep: details.sales_rep,
                comment: details.comment,
            };
            let customer = ledger.update_customer(id, patch)?;
            println!("Updated customer {}: {}", customer.id(), customer.name());
        }
        Command::DeleteCustomer { id, yes } => {
            if !yes {
                return Err(LedgerError::Unconfirmed(format!("customer {}", id)));
            }
            ledger.delete_customer(id)?;
            println!("Deleted customer {}", id);
        }
        Command::AddDebt {
            customer,
            description,
            principal,
            date,
            paid,
        } => {
            let new_debt = NewDebt {
                description,
                principal,
                date,
                upfront: paid,
            };
            let debt = ledger.add_debt_with(customer, new_debt)?;
            println!("Added debt {}", render_debt_line(&debt, currency).trim_start());
        }
        Command::Pay {
            customer,
            debt,
            amount,
        } => {
            let debt = ledger.record_installment(customer, debt, amount)?;
            println!(
                "Recorded {} on debt {}",
                amount.format_currency(currency),
                render_debt_line(&debt, currency).trim_start()
            );
        }
        Command::DeleteDebt {
            customer,
            debt,
            yes,
        } => {
            if !yes {
                return Err(LedgerError::Unconfirmed(format!(
                    "debt {} of customer {}",
                    debt, customer
                )));
            }
            ledger.delete_debt(customer, debt)?;
            println!("Deleted debt {} of customer {}", debt, customer);
        }
        Command::List { search } => {
            let customers = ledger.find_customers(search.as_deref().unwrap_or(""));
            if customers.is_empty() {
                println!("No customers found.");
            }
            for customer in customers {
                println!("{}", render_customer_line(customer, currency));
            }
        }
        Command::Show { id } => {
            let customer = ledger
                .customer(id)
                .ok_or(LedgerError::CustomerNotFound(id))?;
            print!("{}", render_customer(customer, currency));
        }
        Command::Totals => {
            print!("{}", render_totals(&ledger.totals(), currency));
        }
        Command::Report { output } => match output {
            Some(path) => {
                let file = File::create(path)?;
                write_report(ledger.customers(), BufWriter::new(file))?;
            }
            None => {
                let stdout = io::stdout();
                let handle = stdout.lock();
                write_report(ledger.customers(), handle)?;
            }
        },
    }

    Ok(())
}
