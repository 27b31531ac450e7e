use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use crate::process_types::UNMAPPED_LABEL;

/// Column headers of a GAPS export.
pub mod columns {
    pub const TRANS_ID: &str = "TransID";
    pub const BATCH_ID: &str = "BatchID";
    pub const VENDOR_NAME: &str = "VendorName";
    pub const VENDOR_BANK_NAME: &str = "VendorBankName";
    pub const VENDOR_ACCT_NUMBER: &str = "VendorAcctNumber";
    pub const AMOUNT: &str = "Amount";
    pub const CURRENCY: &str = "Currency";
    pub const CUSTOMER_ACCT_NUMBER: &str = "CustomerAcctNumber";
    pub const COMPANY_NAME: &str = "CompanyName";
    pub const PAYMENT_DATE: &str = "PaymentDate";
    pub const PAID_DATE: &str = "PaidDate";
    pub const PROCESS_FLAG: &str = "ProcessFlag";
    pub const PROCESS_TYPE: &str = "ProcessType";
    pub const PAYMENT_DECLINED: &str = "PaymentDeclined";
    pub const PAYMENT_FLAG: &str = "PaymentFlag";
    pub const REMARKS: &str = "Remarks";

    /// Columns every export must carry. `PaymentFlag` is only required
    /// when the three-flag classification rule is in effect.
    pub const REQUIRED: &[&str] = &[
        TRANS_ID,
        BATCH_ID,
        VENDOR_NAME,
        VENDOR_BANK_NAME,
        VENDOR_ACCT_NUMBER,
        AMOUNT,
        CURRENCY,
        CUSTOMER_ACCT_NUMBER,
        COMPANY_NAME,
        PAYMENT_DATE,
        PAID_DATE,
        PROCESS_FLAG,
        PROCESS_TYPE,
        PAYMENT_DECLINED,
        REMARKS,
    ];
}

/// Status code marking a transaction as accepted by the gateway.
pub const ACCEPTED_FLAG: &str = "A";

/// One row of the export, projected to the analysed column set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    #[serde(rename = "TransID")]
    pub trans_id: String,
    #[serde(rename = "BatchID")]
    pub batch_id: String,
    #[serde(rename = "VendorName")]
    pub vendor_name: String,
    #[serde(rename = "VendorBankName")]
    pub vendor_bank_name: String,
    #[serde(rename = "VendorAcctNumber")]
    pub vendor_acct_number: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "Currency")]
    pub currency: String,
    #[serde(rename = "CustomerAcctNumber")]
    pub customer_acct_number: String,
    #[serde(rename = "CompanyName")]
    pub company_name: String,
    #[serde(rename = "PaymentDate")]
    pub payment_date: Option<NaiveDateTime>,
    #[serde(rename = "PaidDate")]
    pub paid_date: Option<NaiveDateTime>,
    #[serde(rename = "ProcessFlag")]
    pub process_flag: String,
    #[serde(rename = "ProcessType")]
    pub process_type: Option<i64>,
    /// Filled in by the enricher; `None` for codes outside the lookup table.
    #[serde(rename = "ProcessType_Description")]
    pub process_type_description: Option<&'static str>,
    #[serde(rename = "PaymentDeclined")]
    pub payment_declined: bool,
    /// Absent in exports that predate the completion flag.
    #[serde(rename = "PaymentFlag")]
    pub payment_flag: Option<bool>,
    #[serde(rename = "Remarks")]
    pub remarks: String,
}

impl Transaction {
    pub fn is_accepted(&self) -> bool {
        self.process_flag.trim() == ACCEPTED_FLAG
    }

    pub fn payment_year(&self) -> Option<i32> {
        self.payment_date.map(|d| d.year())
    }

    /// Description used as a grouping key; unmapped codes share one bucket.
    pub fn type_label(&self) -> &'static str {
        self.process_type_description.unwrap_or(UNMAPPED_LABEL)
    }
}
