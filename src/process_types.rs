use tracing::{debug, warn};

use crate::models::Transaction;

/// Grouping label for transactions whose code is not in the lookup table.
pub const UNMAPPED_LABEL: &str = "UNMAPPED";

// ---------------------------------------------------------------------------
// Process types: fixed code table of the payment gateway
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessType {
    Gtb,
    AutoPay,
    Draft,
    Neft,
    Nips,
    Cit,
    Own,
    NeftDebit,
    Dit,
    ConfirmCheque,
    Rtgs,
    Atw,
    AgencyBanking,
    Airtime,
}

impl ProcessType {
    pub fn code(&self) -> i64 {
        match self {
            Self::Gtb => 1,
            Self::AutoPay => 2,
            Self::Draft => 3,
            Self::Neft => 4,
            Self::Nips => 5,
            Self::Cit => 6,
            Self::Own => 7,
            Self::NeftDebit => 8,
            Self::Dit => 9,
            Self::ConfirmCheque => 10,
            Self::Rtgs => 11,
            Self::Atw => 12,
            Self::AgencyBanking => 13,
            Self::Airtime => 14,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Gtb => "GTB",
            Self::AutoPay => "AUTOPAY",
            Self::Draft => "DRAFT",
            Self::Neft => "NEFT",
            Self::Nips => "NIPS",
            Self::Cit => "CIT",
            Self::Own => "OWN",
            Self::NeftDebit => "NEFTDEBIT",
            Self::Dit => "DIT",
            Self::ConfirmCheque => "CONFIRMCHEQUE",
            Self::Rtgs => "RTGS",
            Self::Atw => "ATW",
            Self::AgencyBanking => "AGENCYBANKING",
            Self::Airtime => "AIRTIME",
        }
    }
}

pub const ALL_PROCESS_TYPES: &[ProcessType] = &[
    ProcessType::Gtb,
    ProcessType::AutoPay,
    ProcessType::Draft,
    ProcessType::Neft,
    ProcessType::Nips,
    ProcessType::Cit,
    ProcessType::Own,
    ProcessType::NeftDebit,
    ProcessType::Dit,
    ProcessType::ConfirmCheque,
    ProcessType::Rtgs,
    ProcessType::Atw,
    ProcessType::AgencyBanking,
    ProcessType::Airtime,
];

pub fn get_by_code(code: i64) -> Option<ProcessType> {
    ALL_PROCESS_TYPES.iter().find(|p| p.code() == code).copied()
}

pub fn describe(code: Option<i64>) -> Option<&'static str> {
    code.and_then(get_by_code).map(|p| p.description())
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

/// Left-join the code table onto every row. Row count and order are
/// preserved; unmapped codes get no description.
pub fn enrich(mut rows: Vec<Transaction>) -> Vec<Transaction> {
    let mut unmapped = 0usize;
    for row in &mut rows {
        row.process_type_description = describe(row.process_type);
        if row.process_type_description.is_none() {
            unmapped += 1;
        }
    }
    if unmapped > 0 {
        warn!(unmapped, "rows carry a ProcessType outside the code table");
    }
    debug!(rows = rows.len(), "enriched transactions");
    rows
}
