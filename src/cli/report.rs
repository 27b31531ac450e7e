use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};
use serde::Serialize;

use crate::classifier::{BucketStat, Summary};
use crate::cli::{open_session, type_filter, InputArgs, OutputFormat};
use crate::error::Result;
use crate::fmt::{amount, count, pct};
use crate::reports::{CompanyCount, GrowthTrend, Matrix, MonthCount, QuarterSummary, TypeShare};
use crate::session::Session;
use crate::settings::load_settings;

fn num(val: impl Into<String>) -> Cell {
    Cell::new(val.into()).set_alignment(CellAlignment::Right)
}

fn title(s: &str) -> String {
    s.bold().to_string()
}

pub(crate) fn emit<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Table => println!("{}", text(data)),
    }
    Ok(())
}

/// Heading naming the selected year, with a zero-state note when the
/// selection is empty.
fn scope_line(session: &Session) -> String {
    let years = session
        .years()
        .iter()
        .map(|y| y.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    match session.year() {
        Some(y) if session.selected().is_empty() => format!(
            "Year: {y} (no transactions; available: {})",
            if years.is_empty() { "none".to_string() } else { years }
        )
        .yellow()
        .to_string(),
        Some(y) => format!("Year: {y}"),
        None => "Year: all".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Formatters
// ---------------------------------------------------------------------------

pub fn format_summary(s: &Summary) -> String {
    let mut totals = Table::new();
    totals.set_header(vec!["Metric", "Value"]);
    totals.add_row(vec![Cell::new("Transactions"), num(count(s.total_count))]);
    totals.add_row(vec![Cell::new("Total amount"), num(amount(s.total_amount))]);
    totals.add_row(vec![Cell::new("Companies"), num(count(s.unique_companies))]);

    let mut buckets = Table::new();
    buckets.set_header(vec!["Bucket", "Count", "%", "Amount"]);
    let rows: [(&str, &BucketStat); 5] = [
        ("Successful", &s.successful),
        ("Declined", &s.declined),
        ("Not declined", &s.not_declined),
        ("Pending", &s.pending),
        ("Failed", &s.failed),
    ];
    for (label, stat) in rows {
        let label = match label {
            "Successful" => label.green().to_string(),
            "Declined" | "Failed" => label.red().to_string(),
            _ => label.to_string(),
        };
        buckets.add_row(vec![
            Cell::new(label),
            num(count(stat.count)),
            num(pct(stat.pct_of_total)),
            num(amount(stat.amount)),
        ]);
    }
    format!(
        "{}\n{totals}\n\n{} ({} rule)\n{buckets}",
        title("Summary"),
        title("Classification"),
        s.rule
    )
}

pub fn format_monthly(months: &[MonthCount]) -> String {
    if months.is_empty() {
        return format!("{}\nNo successful transactions.", title("Monthly Transactions"));
    }
    let mut table = Table::new();
    table.set_header(vec!["Month", "Name", "Count", "Amount"]);
    for m in months {
        table.add_row(vec![
            Cell::new(&m.month),
            Cell::new(&m.month_name),
            num(count(m.count)),
            num(amount(m.amount)),
        ]);
    }
    let total: usize = months.iter().map(|m| m.count).sum();
    table.add_row(vec![Cell::new("Total".bold()), Cell::new(""), num(count(total)), Cell::new("")]);
    format!("{}\n{table}", title("Monthly Transactions"))
}

pub fn format_quarterly(quarters: &[QuarterSummary]) -> String {
    if quarters.is_empty() {
        return format!("{}\nNo successful transactions.", title("Quarterly Transactions"));
    }
    let total: usize = quarters.iter().map(|q| q.count).sum();
    let mut table = Table::new();
    table.set_header(vec!["Year", "Quarter", "Count", "% of year", "Amount"]);
    for q in quarters {
        let year_total: usize = quarters
            .iter()
            .filter(|o| o.year == q.year)
            .map(|o| o.count)
            .sum();
        table.add_row(vec![
            Cell::new(q.year),
            Cell::new(q.quarter),
            num(count(q.count)),
            num(pct(crate::classifier::percentage(q.count as f64, year_total as f64))),
            num(amount(q.amount)),
        ]);
    }
    format!("{}\n{table}\nTotal: {}", title("Quarterly Transactions"), count(total))
}

pub fn format_matrix(heading: &str, row_label: &str, m: &Matrix) -> String {
    if m.is_empty() {
        return format!("{}\nNo successful transactions.", title(heading));
    }
    let mut header = vec![row_label.to_string()];
    header.extend(m.columns.iter().cloned());
    header.push("Total".to_string());

    let mut table = Table::new();
    table.set_header(header);
    for ((label, cells), total) in m.rows.iter().zip(&m.cells).zip(m.row_totals()) {
        let mut row = vec![Cell::new(label)];
        row.extend(cells.iter().map(|c| num(count(*c))));
        row.push(num(count(total).bold().to_string()));
        table.add_row(row);
    }
    let mut footer = vec![Cell::new("Total".bold())];
    let column_totals = m.column_totals();
    footer.extend(column_totals.iter().map(|c| num(count(*c))));
    footer.push(num(count(column_totals.iter().sum())));
    table.add_row(footer);
    format!("{}\n{table}", title(heading))
}

pub fn format_type_share(shares: &[TypeShare]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Process Type", "Count", "%"]);
    for s in shares {
        table.add_row(vec![
            Cell::new(&s.description),
            num(count(s.count)),
            num(pct(s.pct)),
        ]);
    }
    format!("{}\n{table}", title("Distribution of Transaction Types"))
}

pub fn format_growth(g: &GrowthTrend) -> String {
    if g.months.is_empty() {
        return format!("{}\nNo successful transactions.", title("Growth Trend"));
    }
    let mut table = Table::new();
    table.set_header(vec!["Month", "Total", "Types", "Average", "Change", "% Change"]);
    for m in &g.months {
        let change = if m.change < 0.0 {
            format!("{:.0}", m.change).red().to_string()
        } else {
            format!("{:+.0}", m.change).green().to_string()
        };
        table.add_row(vec![
            Cell::new(&m.month),
            num(count(m.total)),
            num(count(m.active_types)),
            num(format!("{:.0}", m.average)),
            num(change),
            num(format!("{:.0}%", m.pct_change)),
        ]);
    }
    format!(
        "{}\n{table}\nMax average: {:.0}  Min average: {:.0}  Mean: {:.2}",
        title("Growth Trend"),
        g.max_average,
        g.min_average,
        g.mean_average
    )
}

pub fn format_companies(companies: &[CompanyCount]) -> String {
    if companies.is_empty() {
        return format!("{}\nNo successful transactions.", title("Top Companies"));
    }
    let mut table = Table::new();
    table.set_header(vec!["#", "Company", "Count", "Amount"]);
    for (i, c) in companies.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&c.company),
            num(count(c.count)),
            num(amount(c.amount)),
        ]);
    }
    format!("{}\n{table}", title("Top Companies"))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn years(input: &InputArgs) -> Result<()> {
    let session = open_session(input, &load_settings())?;
    emit(input.format, session.years(), |years| {
        if years.is_empty() {
            "No dated transactions.".to_string()
        } else {
            years.iter().map(|y| y.to_string()).collect::<Vec<_>>().join("\n")
        }
    })
}

pub fn summary(input: &InputArgs) -> Result<()> {
    let session = open_session(input, &load_settings())?;
    let data = session.summary();
    emit(input.format, data.as_ref(), |s| {
        format!("{}\n{}", scope_line(&session), format_summary(s))
    })
}

pub fn monthly(input: &InputArgs) -> Result<()> {
    let session = open_session(input, &load_settings())?;
    let data = session.monthly_counts();
    emit(input.format, data.as_slice(), |m| {
        format!("{}\n{}", scope_line(&session), format_monthly(m))
    })
}

pub fn quarterly(input: &InputArgs) -> Result<()> {
    let session = open_session(input, &load_settings())?;
    let data = session.quarterly_summary();
    emit(input.format, data.as_slice(), |q| {
        format!("{}\n{}", scope_line(&session), format_quarterly(q))
    })
}

#[derive(Serialize)]
struct TypesView<'a> {
    share: &'a [TypeShare],
    by_month: &'a Matrix,
}

pub fn types(input: &InputArgs, types: &[String]) -> Result<()> {
    let session = open_session(input, &load_settings())?;
    let filter = type_filter(types);
    let share = session.process_type_share(filter);
    let by_month = session.process_type_by_month(filter);
    let view = TypesView {
        share: &share,
        by_month: &by_month,
    };
    emit(input.format, &view, |v| {
        format!(
            "{}\n{}\n\n{}",
            scope_line(&session),
            format_type_share(v.share),
            format_matrix("Monthly Transaction Type Breakdown", "Month", v.by_month)
        )
    })
}

pub fn growth(
    input: &InputArgs,
    types: &[String],
    active_types: Option<crate::reports::ActiveTypeRule>,
) -> Result<()> {
    let settings = load_settings();
    let session = open_session(input, &settings)?;
    let rule = active_types.unwrap_or(settings.active_type_rule);
    let data = session.growth_trend(type_filter(types), rule);
    emit(input.format, data.as_ref(), |g| {
        format!("{}\n{}", scope_line(&session), format_growth(g))
    })
}

pub fn weekly(input: &InputArgs) -> Result<()> {
    let session = open_session(input, &load_settings())?;
    let data = session.weekday_by_process_type();
    emit(input.format, data.as_ref(), |m| {
        format!(
            "{}\n{}",
            scope_line(&session),
            format_matrix("Transaction Types by Day of the Week", "Day", m)
        )
    })
}

pub fn companies(input: &InputArgs, top: Option<usize>) -> Result<()> {
    let settings = load_settings();
    let session = open_session(input, &settings)?;
    let data = session.top_companies(top.unwrap_or(settings.top_companies));
    emit(input.format, data.as_slice(), |c| {
        format!("{}\n{}", scope_line(&session), format_companies(c))
    })
}

#[derive(Serialize)]
struct DashboardView<'a> {
    year: Option<i32>,
    years: &'a [i32],
    summary: &'a Summary,
    monthly: &'a [MonthCount],
    quarterly: &'a [QuarterSummary],
    type_share: &'a [TypeShare],
    types_by_month: &'a Matrix,
    growth: &'a GrowthTrend,
    weekdays: &'a Matrix,
    top_companies: &'a [CompanyCount],
}

/// Every view from one session; views sharing the successful bucket read
/// it once.
pub fn dashboard(input: &InputArgs, types: &[String], top: Option<usize>) -> Result<()> {
    let settings = load_settings();
    let session = open_session(input, &settings)?;
    let filter = type_filter(types);

    let summary = session.summary();
    let monthly = session.monthly_counts();
    let quarterly = session.quarterly_summary();
    let share = session.process_type_share(filter);
    let by_month = session.process_type_by_month(filter);
    let growth = session.growth_trend(filter, settings.active_type_rule);
    let weekdays = session.weekday_by_process_type();
    let companies = session.top_companies(top.unwrap_or(settings.top_companies));

    let view = DashboardView {
        year: session.year(),
        years: session.years(),
        summary: &summary,
        monthly: &monthly,
        quarterly: &quarterly,
        type_share: &share,
        types_by_month: &by_month,
        growth: &growth,
        weekdays: &weekdays,
        top_companies: &companies,
    };
    emit(input.format, &view, |v| {
        [
            scope_line(&session),
            format_summary(v.summary),
            format_monthly(v.monthly),
            format_quarterly(v.quarterly),
            format_type_share(v.type_share),
            format_matrix("Monthly Transaction Type Breakdown", "Month", v.types_by_month),
            format_growth(v.growth),
            format_matrix("Transaction Types by Day of the Week", "Day", v.weekdays),
            format_companies(v.top_companies),
        ]
        .join("\n\n")
    })
}
