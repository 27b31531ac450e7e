use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_session, Bucket, InputArgs, OutputFormat};
use crate::error::Result;
use crate::fmt::{amount, count};
use crate::models::Transaction;
use crate::session::Session;
use crate::settings::load_settings;

const DEFAULT_LIMIT: usize = 50;

fn bucket_rows(session: &Session, bucket: Bucket) -> (&'static str, &[Transaction]) {
    let b = session.buckets();
    match bucket {
        Bucket::Raw => ("Raw Data", session.rows()),
        Bucket::Processed => ("Processed Transactions", session.selected()),
        Bucket::Successful => ("Successful Transactions", &b.successful),
        Bucket::Declined => ("Declined Transactions", &b.declined),
        Bucket::Failed => ("Failed Transactions", &b.failed),
        Bucket::Pending => ("Pending Transactions", &b.pending),
    }
}

fn flag(v: Option<bool>) -> &'static str {
    match v {
        Some(true) => "1",
        Some(false) => "0",
        None => "",
    }
}

pub fn format_rows(heading: &str, rows: &[Transaction], limit: usize) -> String {
    if rows.is_empty() {
        return format!("{} (0)\nNo transactions found.", heading.bold());
    }
    let mut table = Table::new();
    table.set_header(vec![
        "TransID", "PaymentDate", "PaidDate", "Company", "Vendor", "Amount", "Currency", "Type", "Flag",
        "Declined", "Paid",
    ]);
    for t in rows.iter().take(limit) {
        let date = |d: Option<chrono::NaiveDateTime>| {
            d.map(|d| d.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default()
        };
        let declined = if t.payment_declined {
            "1".red().to_string()
        } else {
            "0".to_string()
        };
        table.add_row(vec![
            Cell::new(&t.trans_id),
            Cell::new(date(t.payment_date)),
            Cell::new(date(t.paid_date)),
            Cell::new(&t.company_name),
            Cell::new(&t.vendor_name),
            Cell::new(amount(t.amount)).set_alignment(CellAlignment::Right),
            Cell::new(&t.currency),
            Cell::new(t.process_type_description.unwrap_or("—")),
            Cell::new(&t.process_flag),
            Cell::new(declined),
            Cell::new(flag(t.payment_flag)),
        ]);
    }
    let mut out = format!("{} ({})\n{table}", heading.bold(), count(rows.len()));
    if rows.len() > limit {
        out.push_str(&format!("\n… {} more rows (use --limit)", count(rows.len() - limit)));
    }
    out
}

pub fn run(input: &InputArgs, bucket: Bucket, limit: Option<usize>) -> Result<()> {
    let session = open_session(input, &load_settings())?;
    let (heading, rows) = bucket_rows(&session, bucket);
    match input.format {
        OutputFormat::Json => {
            let rows = match limit {
                Some(n) => &rows[..n.min(rows.len())],
                None => rows,
            };
            println!("{}", serde_json::to_string_pretty(rows)?);
        }
        OutputFormat::Table => {
            println!("{}", format_rows(heading, rows, limit.unwrap_or(DEFAULT_LIMIT)));
        }
    }
    Ok(())
}
