use std::collections::BTreeSet;

use crate::models::Transaction;

/// Sorted unique years of `PaymentDate`; rows without one are ignored.
pub fn available_years(rows: &[Transaction]) -> Vec<i32> {
    rows.iter()
        .filter_map(Transaction::payment_year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Rows whose `PaymentDate` falls in `year`. `None` keeps every row.
/// A year absent from the data gives an empty selection.
pub fn select_year(rows: &[Transaction], year: Option<i32>) -> Vec<Transaction> {
    match year {
        Some(y) => rows
            .iter()
            .filter(|t| t.payment_year() == Some(y))
            .cloned()
            .collect(),
        None => rows.to_vec(),
    }
}
