use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Datelike;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::classifier::percentage;
use crate::models::Transaction;

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub const QUARTERS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

fn matches_filter(t: &Transaction, types: Option<&[String]>) -> bool {
    match types {
        Some(wanted) => wanted.iter().any(|w| w.eq_ignore_ascii_case(t.type_label())),
        None => true,
    }
}

// ---------------------------------------------------------------------------
// Monthly counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCount {
    /// `YYYY-MM`
    pub month: String,
    pub month_name: String,
    pub count: usize,
    pub amount: f64,
}

/// Count and amount per calendar month of `PaymentDate`, oldest first.
pub fn monthly_counts(rows: &[Transaction]) -> Vec<MonthCount> {
    let mut map: BTreeMap<(i32, u32), MonthCount> = BTreeMap::new();
    for t in rows {
        let Some(date) = t.payment_date else { continue };
        let entry = map.entry((date.year(), date.month())).or_insert_with(|| MonthCount {
            month: date.format("%Y-%m").to_string(),
            month_name: date.format("%B").to_string(),
            count: 0,
            amount: 0.0,
        });
        entry.count += 1;
        entry.amount += t.amount;
    }
    map.into_values().collect()
}

// ---------------------------------------------------------------------------
// Quarterly summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterSummary {
    pub year: i32,
    pub quarter: &'static str,
    pub count: usize,
    pub amount: f64,
}

/// Q1..Q4 for every year present; empty quarters are reported as zero.
pub fn quarterly_summary(rows: &[Transaction]) -> Vec<QuarterSummary> {
    let mut years: BTreeMap<i32, [(usize, f64); 4]> = BTreeMap::new();
    for t in rows {
        let Some(date) = t.payment_date else { continue };
        let quarter = (date.month0() / 3) as usize;
        let slot = &mut years.entry(date.year()).or_default()[quarter];
        slot.0 += 1;
        slot.1 += t.amount;
    }
    years
        .into_iter()
        .flat_map(|(year, quarters)| {
            quarters
                .into_iter()
                .zip(QUARTERS)
                .map(move |((count, amount), quarter)| QuarterSummary {
                    year,
                    quarter,
                    count,
                    amount,
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Count matrices
// ---------------------------------------------------------------------------

/// Row-by-column count table with missing cells filled with zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Matrix {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<usize>>,
}

impl Matrix {
    fn build(rows: Vec<String>, columns: Vec<String>, counts: &HashMap<(String, String), usize>) -> Self {
        let cells = rows
            .iter()
            .map(|r| {
                columns
                    .iter()
                    .map(|c| counts.get(&(r.clone(), c.clone())).copied().unwrap_or(0))
                    .collect()
            })
            .collect();
        Self { rows, columns, cells }
    }

    pub fn get(&self, row: &str, column: &str) -> usize {
        let r = self.rows.iter().position(|x| x == row);
        let c = self.columns.iter().position(|x| x == column);
        match (r, c) {
            (Some(r), Some(c)) => self.cells[r][c],
            _ => 0,
        }
    }

    pub fn row_totals(&self) -> Vec<usize> {
        self.cells.iter().map(|r| r.iter().sum()).collect()
    }

    pub fn column_totals(&self) -> Vec<usize> {
        (0..self.columns.len())
            .map(|c| self.cells.iter().map(|r| r[c]).sum())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Year-month by process type, optionally restricted to some descriptions.
pub fn process_type_by_month(rows: &[Transaction], types: Option<&[String]>) -> Matrix {
    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    let mut months = BTreeSet::new();
    let mut labels = BTreeSet::new();
    for t in rows.iter().filter(|t| matches_filter(t, types)) {
        let Some(date) = t.payment_date else { continue };
        let month = date.format("%Y-%m").to_string();
        months.insert(month.clone());
        labels.insert(t.type_label().to_string());
        *counts.entry((month, t.type_label().to_string())).or_default() += 1;
    }
    Matrix::build(months.into_iter().collect(), labels.into_iter().collect(), &counts)
}

/// Weekday by process type. Rows are always Monday through Sunday.
pub fn weekday_by_process_type(rows: &[Transaction]) -> Matrix {
    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    let mut labels = BTreeSet::new();
    for t in rows {
        let Some(date) = t.payment_date else { continue };
        let day = WEEKDAYS[date.weekday().num_days_from_monday() as usize];
        labels.insert(t.type_label().to_string());
        *counts.entry((day.to_string(), t.type_label().to_string())).or_default() += 1;
    }
    Matrix::build(
        WEEKDAYS.iter().map(|d| d.to_string()).collect(),
        labels.into_iter().collect(),
        &counts,
    )
}

// ---------------------------------------------------------------------------
// Companies and type share
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyCount {
    pub company: String,
    pub count: usize,
    pub amount: f64,
}

/// Companies by transaction count, descending. Ties keep the order in
/// which companies first appear.
pub fn top_companies(rows: &[Transaction], limit: usize) -> Vec<CompanyCount> {
    let mut order: Vec<CompanyCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for t in rows {
        let i = *index.entry(t.company_name.as_str()).or_insert_with(|| {
            order.push(CompanyCount {
                company: t.company_name.clone(),
                count: 0,
                amount: 0.0,
            });
            order.len() - 1
        });
        order[i].count += 1;
        order[i].amount += t.amount;
    }
    order.sort_by(|a, b| b.count.cmp(&a.count));
    order.truncate(limit);
    order
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeShare {
    pub description: String,
    pub count: usize,
    pub pct: f64,
}

/// Share of each process type in the (filtered) set, largest first.
pub fn process_type_share(rows: &[Transaction], types: Option<&[String]>) -> Vec<TypeShare> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut total = 0usize;
    for t in rows.iter().filter(|t| matches_filter(t, types)) {
        *counts.entry(t.type_label()).or_default() += 1;
        total += 1;
    }
    let mut shares: Vec<TypeShare> = counts
        .into_iter()
        .map(|(description, count)| TypeShare {
            description: description.to_string(),
            count,
            pct: percentage(count as f64, total as f64),
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

// ---------------------------------------------------------------------------
// Growth trend
// ---------------------------------------------------------------------------

/// How many process types a month's average is divided by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ActiveTypeRule {
    /// Types with at least one transaction in the month.
    #[default]
    Present,
    /// Every type that appears anywhere in the matrix.
    All,
}

impl ActiveTypeRule {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthMonth {
    pub month: String,
    pub total: usize,
    pub active_types: usize,
    pub average: f64,
    pub change: f64,
    pub pct_change: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GrowthTrend {
    pub months: Vec<GrowthMonth>,
    pub max_average: f64,
    pub min_average: f64,
    pub mean_average: f64,
}

pub fn growth_trend(matrix: &Matrix, rule: ActiveTypeRule) -> GrowthTrend {
    let mut months: Vec<GrowthMonth> = Vec::with_capacity(matrix.rows.len());
    for (month, cells) in matrix.rows.iter().zip(&matrix.cells) {
        let total: usize = cells.iter().sum();
        let active_types = match rule {
            ActiveTypeRule::Present => cells.iter().filter(|&&c| c > 0).count(),
            ActiveTypeRule::All => cells.len(),
        };
        let average = if active_types > 0 {
            (total as f64 / active_types as f64).round_ties_even()
        } else {
            0.0
        };
        let (change, pct_change) = match months.last() {
            Some(prev) => (
                average - prev.average,
                if prev.average != 0.0 {
                    ((average / prev.average - 1.0) * 100.0).round_ties_even()
                } else {
                    0.0
                },
            ),
            None => (0.0, 0.0),
        };
        months.push(GrowthMonth {
            month: month.clone(),
            total,
            active_types,
            average,
            change,
            pct_change,
        });
    }

    if months.is_empty() {
        return GrowthTrend::default();
    }
    let averages = months.iter().map(|m| m.average);
    let max_average = averages.clone().fold(f64::MIN, f64::max);
    let min_average = averages.clone().fold(f64::MAX, f64::min);
    let mean_average = averages.sum::<f64>() / months.len() as f64;
    GrowthTrend {
        months,
        max_average,
        min_average,
        mean_average,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::on;

    fn sample() -> Vec<Transaction> {
        let mut rows = vec![
            on("2024-01-01", 1, "GTB"),  // Monday
            on("2024-01-02", 1, "GTB"),  // Tuesday
            on("2024-01-02", 11, "RTGS"),
            on("2024-02-05", 11, "RTGS"), // Monday
            on("2024-02-06", 4, "NEFT"),
            on("2024-03-10", 1, "GTB"),  // Sunday
        ];
        let mut unmapped = on("2024-03-11", 99, "GTB");
        unmapped.process_type_description = None;
        rows.push(unmapped);
        rows
    }

    #[test]
    fn test_monthly_counts_are_chronological() {
        let rows = vec![
            on("2024-12-01", 1, "GTB"),
            on("2024-02-01", 1, "GTB"),
            on("2023-08-01", 1, "GTB"),
            on("2024-02-15", 1, "GTB"),
        ];
        let months = monthly_counts(&rows);
        let keys: Vec<_> = months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(keys, vec!["2023-08", "2024-02", "2024-12"]);
        assert_eq!(months[1].count, 2);
        assert_eq!(months[1].amount, 200.0);
        assert_eq!(months[1].month_name, "February");
    }

    #[test]
    fn test_quarterly_keeps_empty_quarters() {
        let rows = vec![
            on("2024-01-10", 1, "GTB"),
            on("2024-01-20", 1, "GTB"),
            on("2024-07-04", 1, "GTB"),
        ];
        let q = quarterly_summary(&rows);
        let counts: Vec<_> = q.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![2, 0, 1, 0]);
        let labels: Vec<_> = q.iter().map(|s| s.quarter).collect();
        assert_eq!(labels, vec!["Q1", "Q2", "Q3", "Q4"]);
        assert_eq!(q[1].amount, 0.0);
        assert_eq!(q.iter().map(|s| s.count).sum::<usize>(), rows.len());
    }

    #[test]
    fn test_quarterly_empty_input() {
        assert!(quarterly_summary(&[]).is_empty());
    }

    #[test]
    fn test_process_type_matrix_fills_missing_cells() {
        let m = process_type_by_month(&sample(), None);
        assert_eq!(m.rows, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(m.columns, vec!["GTB", "NEFT", "RTGS", "UNMAPPED"]);
        assert_eq!(m.get("2024-01", "GTB"), 2);
        assert_eq!(m.get("2024-01", "NEFT"), 0);
        assert_eq!(m.get("2024-03", "UNMAPPED"), 1);
    }

    #[test]
    fn test_matrix_row_totals_match_monthly_counts() {
        let rows = sample();
        let m = process_type_by_month(&rows, None);
        let monthly: Vec<_> = monthly_counts(&rows).iter().map(|m| m.count).collect();
        assert_eq!(m.row_totals(), monthly);
    }

    #[test]
    fn test_process_type_filter() {
        let wanted = vec!["rtgs".to_string()];
        let m = process_type_by_month(&sample(), Some(&wanted));
        assert_eq!(m.columns, vec!["RTGS"]);
        assert_eq!(m.rows, vec!["2024-01", "2024-02"]);
    }

    #[test]
    fn test_weekday_matrix_is_monday_first_with_zero_days() {
        let m = weekday_by_process_type(&sample());
        assert_eq!(m.rows, WEEKDAYS.to_vec());
        assert_eq!(m.get("Monday", "GTB"), 1);
        assert_eq!(m.get("Monday", "RTGS"), 1);
        assert_eq!(m.get("Sunday", "GTB"), 1);
        assert_eq!(m.row_totals()[3], 0); // Thursday
        assert_eq!(m.row_totals().iter().sum::<usize>(), 7);
    }

    #[test]
    fn test_weekday_matrix_empty_input_still_lists_days() {
        let m = weekday_by_process_type(&[]);
        assert_eq!(m.rows.len(), 7);
        assert!(m.columns.is_empty());
    }

    #[test]
    fn test_top_companies_stable_ties() {
        let mk = |company: &str| {
            let mut t = on("2024-01-01", 1, "GTB");
            t.company_name = company.to_string();
            t
        };
        let rows = vec![mk("Zeta"), mk("Alpha"), mk("Alpha"), mk("Mid"), mk("Zeta"), mk("Late")];
        let top = top_companies(&rows, 3);
        let names: Vec<_> = top.iter().map(|c| c.company.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(top[0].count, 2);
        assert_eq!(top[0].amount, 200.0);
    }

    #[test]
    fn test_process_type_share() {
        let shares = process_type_share(&sample(), None);
        assert_eq!(shares[0].description, "GTB");
        assert_eq!(shares[0].count, 3);
        let total_pct: f64 = shares.iter().map(|s| s.pct).sum();
        assert!((total_pct - 100.0).abs() < 1e-9);
        assert!(process_type_share(&[], None).is_empty());
    }

    #[test]
    fn test_growth_trend_present_rule() {
        let m = process_type_by_month(&sample(), None);
        let g = growth_trend(&m, ActiveTypeRule::Present);
        let averages: Vec<_> = g.months.iter().map(|m| m.average).collect();
        // Jan: 3 / 2 types, Feb: 2 / 2, Mar: 2 / 2
        assert_eq!(averages, vec![2.0, 1.0, 1.0]);
        assert_eq!(g.months[0].change, 0.0);
        assert_eq!(g.months[0].pct_change, 0.0);
        assert_eq!(g.months[1].change, -1.0);
        assert_eq!(g.months[1].pct_change, -50.0);
        assert_eq!(g.max_average, 2.0);
        assert_eq!(g.min_average, 1.0);
    }

    #[test]
    fn test_growth_trend_all_columns_rule() {
        let m = process_type_by_month(&sample(), None);
        let g = growth_trend(&m, ActiveTypeRule::All);
        assert!(g.months.iter().all(|m| m.active_types == 4));
        // Jan: 3 / 4 = 0.75 rounds to 1
        assert_eq!(g.months[0].average, 1.0);
        assert_eq!(g.months[0].total, 3);
    }

    #[test]
    fn test_growth_trend_empty() {
        let g = growth_trend(&Matrix::default(), ActiveTypeRule::Present);
        assert!(g.months.is_empty());
        assert_eq!(g.mean_average, 0.0);
    }
}
