//! Rendering of ledger state for the command line.
//!
//! Text output is meant for people; the CSV report is meant for spreadsheets
//! and keeps amounts as plain decimals.

use crate::customer::Customer;
use crate::debt::Debt;
use crate::error::Result;
use crate::ledger::Totals;
use std::fmt::Write as _;
use std::io::Write;

/// Writes one CSV row per debt, in customer then debt insertion order.
pub fn write_report<'a, W, I>(customers: I, writer: W) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Customer>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([
        "customer_id",
        "customer",
        "debt_id",
        "description",
        "date",
        "principal",
        "paid",
        "balance",
        "status",
    ])?;

    for customer in customers {
        for debt in customer.debts() {
            csv_writer.write_record([
                customer.id().to_string(),
                customer.name().to_string(),
                debt.id().to_string(),
                debt.description().to_string(),
                debt.date().to_string(),
                debt.principal().to_string(),
                debt.paid_amount().to_string(),
                debt.balance().to_string(),
                debt.status().to_string(),
            ])?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}

/// One line per customer: id, name, debt count and outstanding amount.
pub fn render_customer_line(customer: &Customer, currency: &str) -> String {
    let mut line = format!("{:>4}  {}", customer.id(), customer.name());
    if let Some(shop) = &customer.metadata().shop_name {
        let _ = write!(line, " ({})", shop);
    }
    let _ = write!(
        line,
        "  debts: {}  outstanding: {}",
        customer.debts().len(),
        customer.outstanding().format_currency(currency)
    );
    line
}

pub fn render_debt_line(debt: &Debt, currency: &str) -> String {
    format!(
        "{:>4}  {}  {}  principal {}  paid {}  balance {}  {}",
        debt.id(),
        debt.date(),
        debt.description(),
        debt.principal().format_currency(currency),
        debt.paid_amount().format_currency(currency),
        debt.balance().format_currency(currency),
        debt.status()
    )
}

/// Full details of a customer, their debts and installment history.
pub fn render_customer(customer: &Customer, currency: &str) -> String {
    let mut out = format!("Customer {}: {}\n", customer.id(), customer.name());

    let metadata = customer.metadata();
    let fields = [
        ("Mobile", &metadata.mobile_no),
        ("Invoice", &metadata.invoice_no),
        ("Shop", &metadata.shop_name),
        ("Sales rep", &metadata.sales_rep),
        ("Comment", &metadata.comment),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            let _ = writeln!(out, "  {}: {}", label, value);
        }
    }

    if customer.debts().is_empty() {
        out.push_str("  No debts recorded.\n");
        return out;
    }

    for debt in customer.debts() {
        let _ = writeln!(out, "{}", render_debt_line(debt, currency));
        for installment in debt.installments() {
            let _ = writeln!(
                out,
                "        paid {} on {}",
                installment.amount.format_currency(currency),
                installment.date.format("%Y-%m-%d %H:%M")
            );
        }
    }
    out
}

pub fn render_totals(totals: &Totals, currency: &str) -> String {
    format!(
        "Total customers:   {}\n\
         Debts:             {} ({} unpaid)\n\
         Total principal:   {}\n\
         Total paid:        {}\n\
         Total outstanding: {}\n",
        totals.customer_count,
        totals.debt_count,
        totals.unpaid_debt_count,
        totals.total_principal.format_currency(currency),
        totals.total_paid.format_currency(currency),
        totals.total_outstanding.format_currency(currency)
    )
}
