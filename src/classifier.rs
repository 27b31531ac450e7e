use std::collections::HashSet;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Transaction;

/// Which predicate defines a successful transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationRule {
    /// Not declined and accepted.
    TwoFlag,
    /// Not declined, paid and accepted.
    #[default]
    ThreeFlag,
}

impl ClassificationRule {
    pub fn key(&self) -> &'static str {
        match self {
            Self::TwoFlag => "two-flag",
            Self::ThreeFlag => "three-flag",
        }
    }

    pub fn requires_payment_flag(&self) -> bool {
        matches!(self, Self::ThreeFlag)
    }

    pub fn is_successful(&self, t: &Transaction) -> bool {
        let base = !t.payment_declined && t.is_accepted();
        match self {
            Self::TwoFlag => base,
            Self::ThreeFlag => base && t.payment_flag == Some(true),
        }
    }
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Buckets {
    pub successful: Vec<Transaction>,
    /// Everything that is not successful.
    pub failed: Vec<Transaction>,
    pub declined: Vec<Transaction>,
    pub not_declined: Vec<Transaction>,
    /// Not declined, not successful.
    pub pending: Vec<Transaction>,
}

pub fn classify(rows: &[Transaction], rule: ClassificationRule) -> Buckets {
    let mut buckets = Buckets::default();
    for t in rows {
        let successful = rule.is_successful(t);
        if successful {
            buckets.successful.push(t.clone());
        } else {
            buckets.failed.push(t.clone());
        }
        if t.payment_declined {
            buckets.declined.push(t.clone());
        } else {
            buckets.not_declined.push(t.clone());
            if !successful {
                buckets.pending.push(t.clone());
            }
        }
    }
    debug!(
        rule = rule.key(),
        successful = buckets.successful.len(),
        declined = buckets.declined.len(),
        pending = buckets.pending.len(),
        "classified transactions"
    );
    buckets
}

// ---------------------------------------------------------------------------
// Summary scalars
// ---------------------------------------------------------------------------

/// Share of `part` in `total` as a percentage; 0 when `total` is 0.
pub fn percentage(part: f64, total: f64) -> f64 {
    if total != 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStat {
    pub count: usize,
    pub amount: f64,
    pub pct_of_total: f64,
}

impl BucketStat {
    fn of(rows: &[Transaction], total: usize) -> Self {
        Self {
            count: rows.len(),
            amount: rows.iter().map(|t| t.amount).sum(),
            pct_of_total: percentage(rows.len() as f64, total as f64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rule: &'static str,
    pub total_count: usize,
    pub total_amount: f64,
    pub unique_companies: usize,
    pub successful: BucketStat,
    pub declined: BucketStat,
    pub not_declined: BucketStat,
    pub pending: BucketStat,
    pub failed: BucketStat,
}

pub fn summarize(rows: &[Transaction], buckets: &Buckets, rule: ClassificationRule) -> Summary {
    let total = rows.len();
    let unique_companies = rows
        .iter()
        .map(|t| t.company_name.as_str())
        .collect::<HashSet<_>>()
        .len();
    Summary {
        rule: rule.key(),
        total_count: total,
        total_amount: rows.iter().map(|t| t.amount).sum(),
        unique_companies,
        successful: BucketStat::of(&buckets.successful, total),
        declined: BucketStat::of(&buckets.declined, total),
        not_declined: BucketStat::of(&buckets.not_declined, total),
        pending: BucketStat::of(&buckets.pending, total),
        failed: BucketStat::of(&buckets.failed, total),
    }
}
