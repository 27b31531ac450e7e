use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{GapsError, Result};
use crate::models::{columns, Transaction};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// One of the two timestamp columns of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum DateColumn {
    #[serde(rename = "PaymentDate")]
    #[value(name = "PaymentDate")]
    PaymentDate,
    #[serde(rename = "PaidDate")]
    #[value(name = "PaidDate")]
    PaidDate,
}

impl DateColumn {
    pub fn header(&self) -> &'static str {
        match self {
            Self::PaymentDate => columns::PAYMENT_DATE,
            Self::PaidDate => columns::PAID_DATE,
        }
    }

    pub fn other(&self) -> DateColumn {
        match self {
            Self::PaymentDate => Self::PaidDate,
            Self::PaidDate => Self::PaymentDate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Column parsed with per-row format inference; the other column
    /// must be ISO-8601.
    pub lenient_column: DateColumn,
    pub require_payment_flag: bool,
}

impl LoadOptions {
    pub fn strict_column(&self) -> DateColumn {
        self.lenient_column.other()
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            lenient_column: DateColumn::PaidDate,
            require_payment_flag: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadProgress {
    Started,
    Finished { rows: usize },
}

pub struct LoadedFile {
    pub rows: Vec<Transaction>,
    /// SHA-256 of the raw bytes, hex encoded.
    pub fingerprint: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a currency amount. Blank is zero; thousands separators, quotes,
/// currency symbols and parenthesized negatives are tolerated.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '"' | '$' | '€' | '£'))
        .collect();
    let s = s.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.trim().parse::<f64>().ok().map(|v| -v);
    }
    s.parse().ok()
}

/// Parse a 0/1 style flag. Spreadsheet exports sometimes write `1.0` or
/// `True`.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}

/// Parse a process type code, accepting float-formatted integers.
pub fn parse_code(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    (f.fract() == 0.0 && f.is_finite()).then_some(f as i64)
}

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const ISO_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%:z",
];

/// Strict ISO-8601. Offsets are dropped, keeping the wall-clock time.
pub fn parse_iso8601(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in ISO_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in ISO_OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.naive_local());
        }
    }
    if let Some(naive) = raw.strip_suffix('Z') {
        return parse_iso8601(naive);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

const MDY_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];
const DMY_SLASH_FORMATS: &[&str] = &["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];
const MDY_SHORT_FORMATS: &[&str] = &["%m/%d/%y %H:%M:%S", "%m/%d/%y %H:%M"];
const YMD_SLASH_FORMATS: &[&str] = &["%Y/%m/%d %H:%M:%S%.f", "%Y/%m/%d %H:%M:%S", "%Y/%m/%d %H:%M"];
const DMY_DOT_FORMATS: &[&str] = &["%d.%m.%Y %H:%M:%S", "%d.%m.%Y %H:%M"];
const DMON_FORMATS: &[&str] = &["%d-%b-%Y %H:%M:%S", "%d-%b-%Y %H:%M", "%d %b %Y %H:%M:%S", "%d %b %Y %H:%M"];
const DMON_SHORT_FORMATS: &[&str] = &["%d-%b-%y %H:%M:%S", "%d-%b-%y %H:%M", "%d %b %y %H:%M:%S", "%d %b %y %H:%M"];

const MDY_DATES: &[&str] = &["%m/%d/%Y", "%d/%m/%Y"];
const MDY_SHORT_DATES: &[&str] = &["%m/%d/%y", "%d/%m/%y"];
const YMD_SLASH_DATES: &[&str] = &["%Y/%m/%d"];
const DMY_DOT_DATES: &[&str] = &["%d.%m.%Y"];
const DMON_DATES: &[&str] = &["%d-%b-%Y", "%d %b %Y"];
const DMON_SHORT_DATES: &[&str] = &["%d-%b-%y", "%d %b %y"];
const MON_DATES: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%b %d %Y"];
const MON_SHORT_DATES: &[&str] = &["%b %d, %y", "%B %d, %y", "%b %d %y"];

enum DateShape {
    Iso,
    Formats {
        datetimes: &'static [&'static [&'static str]],
        dates: &'static [&'static str],
    },
}

fn date_shapes() -> &'static [(Regex, DateShape)] {
    static SHAPES: OnceLock<Vec<(Regex, DateShape)>> = OnceLock::new();
    SHAPES.get_or_init(|| {
        let shape = |pattern: &str, shape: DateShape| {
            (Regex::new(pattern).expect("static date pattern"), shape)
        };
        vec![
            shape(r"^\d{4}-\d{1,2}-\d{1,2}", DateShape::Iso),
            shape(
                r"^\d{1,2}/\d{1,2}/\d{4}",
                DateShape::Formats {
                    // month-first, falling back to day-first when the first
                    // field cannot be a month
                    datetimes: &[MDY_FORMATS, DMY_SLASH_FORMATS],
                    dates: MDY_DATES,
                },
            ),
            shape(
                r"^\d{1,2}/\d{1,2}/\d{2}\b",
                DateShape::Formats { datetimes: &[MDY_SHORT_FORMATS], dates: MDY_SHORT_DATES },
            ),
            shape(
                r"^\d{4}/\d{1,2}/\d{1,2}",
                DateShape::Formats { datetimes: &[YMD_SLASH_FORMATS], dates: YMD_SLASH_DATES },
            ),
            shape(
                r"^\d{1,2}\.\d{1,2}\.\d{4}",
                DateShape::Formats { datetimes: &[DMY_DOT_FORMATS], dates: DMY_DOT_DATES },
            ),
            // chrono's %Y also accepts two digits, so the year width picks
            // the format set
            shape(
                r"^\d{1,2}[- ][A-Za-z]{3}[- ]\d{4}\b",
                DateShape::Formats { datetimes: &[DMON_FORMATS], dates: DMON_DATES },
            ),
            shape(
                r"^\d{1,2}[- ][A-Za-z]{3}[- ]\d{2}\b",
                DateShape::Formats { datetimes: &[DMON_SHORT_FORMATS], dates: DMON_SHORT_DATES },
            ),
            shape(
                r"^[A-Za-z]{3,9} \d{1,2},? \d{4}\b",
                DateShape::Formats { datetimes: &[], dates: MON_DATES },
            ),
            shape(
                r"^[A-Za-z]{3,9} \d{1,2},? \d{2}\b",
                DateShape::Formats { datetimes: &[], dates: MON_SHORT_DATES },
            ),
        ]
    })
}

/// Lenient parser: infers the format of each value independently.
pub fn parse_mixed(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    let (_, shape) = date_shapes().iter().find(|(re, _)| re.is_match(raw))?;
    match shape {
        DateShape::Iso => parse_iso8601(raw),
        DateShape::Formats { datetimes, dates } => {
            for fmt in datetimes.iter().flat_map(|group| group.iter()) {
                if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
                    return Some(dt);
                }
            }
            dates
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }
    }
}

pub fn compute_fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

struct ColumnIndex(HashMap<String, usize>);

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let map = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim_start_matches('\u{feff}').trim().to_string(), i))
            .collect();
        Self(map)
    }

    fn missing(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| !self.0.contains_key(**c))
            .map(|c| c.to_string())
            .collect()
    }

    fn get<'r>(&self, record: &'r csv::StringRecord, column: &str) -> &'r str {
        self.0
            .get(column)
            .and_then(|&i| record.get(i))
            .map(str::trim)
            .unwrap_or("")
    }
}

fn malformed_value(row: usize, column: &str, value: &str) -> GapsError {
    GapsError::MalformedValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn parse_date_cell(
    raw: &str,
    row: usize,
    column: DateColumn,
    opts: &LoadOptions,
) -> Result<Option<NaiveDateTime>> {
    if raw.is_empty() {
        return Ok(None);
    }
    let parsed = if column == opts.lenient_column {
        parse_mixed(raw)
    } else {
        parse_iso8601(raw)
    };
    parsed.map(Some).ok_or_else(|| GapsError::MalformedDate {
        row,
        column: column.header().to_string(),
        value: raw.to_string(),
    })
}

fn parse_record(
    cols: &ColumnIndex,
    record: &csv::StringRecord,
    row: usize,
    opts: &LoadOptions,
) -> Result<Transaction> {
    let text = |column: &str| cols.get(record, column).to_string();

    let raw_amount = cols.get(record, columns::AMOUNT);
    let amount =
        parse_amount(raw_amount).ok_or_else(|| malformed_value(row, columns::AMOUNT, raw_amount))?;

    let raw_type = cols.get(record, columns::PROCESS_TYPE);
    let process_type = if raw_type.is_empty() {
        None
    } else {
        Some(parse_code(raw_type).ok_or_else(|| malformed_value(row, columns::PROCESS_TYPE, raw_type))?)
    };

    let raw_declined = cols.get(record, columns::PAYMENT_DECLINED);
    let payment_declined = parse_flag(raw_declined)
        .ok_or_else(|| malformed_value(row, columns::PAYMENT_DECLINED, raw_declined))?;

    let raw_paid_flag = cols.get(record, columns::PAYMENT_FLAG);
    let payment_flag = if raw_paid_flag.is_empty() {
        None
    } else {
        Some(
            parse_flag(raw_paid_flag)
                .ok_or_else(|| malformed_value(row, columns::PAYMENT_FLAG, raw_paid_flag))?,
        )
    };

    Ok(Transaction {
        trans_id: text(columns::TRANS_ID),
        batch_id: text(columns::BATCH_ID),
        vendor_name: text(columns::VENDOR_NAME),
        vendor_bank_name: text(columns::VENDOR_BANK_NAME),
        vendor_acct_number: text(columns::VENDOR_ACCT_NUMBER),
        amount,
        currency: text(columns::CURRENCY),
        customer_acct_number: text(columns::CUSTOMER_ACCT_NUMBER),
        company_name: text(columns::COMPANY_NAME),
        payment_date: parse_date_cell(
            cols.get(record, columns::PAYMENT_DATE),
            row,
            DateColumn::PaymentDate,
            opts,
        )?,
        paid_date: parse_date_cell(cols.get(record, columns::PAID_DATE), row, DateColumn::PaidDate, opts)?,
        process_flag: text(columns::PROCESS_FLAG),
        process_type,
        process_type_description: None,
        payment_declined,
        payment_flag,
        remarks: text(columns::REMARKS),
    })
}

/// Parse a GAPS CSV export. Fails on the first malformed row; nothing is
/// filtered out.
pub fn load_with_progress(
    data: &[u8],
    opts: &LoadOptions,
    mut on_progress: impl FnMut(LoadProgress),
) -> Result<LoadedFile> {
    on_progress(LoadProgress::Started);
    let fingerprint = compute_fingerprint(data);
    info!(bytes = data.len(), fingerprint = %&fingerprint[..12], "loading transactions");

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let cols = ColumnIndex::from_headers(rdr.headers()?);
    let mut missing = cols.missing(columns::REQUIRED);
    if opts.require_payment_flag {
        missing.extend(cols.missing(&[columns::PAYMENT_FLAG]));
    }
    if !missing.is_empty() {
        return Err(GapsError::MalformedInput { missing });
    }

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(parse_record(&cols, &record, i + 1, opts)?);
    }

    debug!(
        lenient = opts.lenient_column.header(),
        strict = opts.strict_column().header(),
        "parsed date columns"
    );
    info!(rows = rows.len(), "loaded transactions");
    on_progress(LoadProgress::Finished { rows: rows.len() });
    Ok(LoadedFile { rows, fingerprint })
}

pub fn load_bytes(data: &[u8], opts: &LoadOptions) -> Result<LoadedFile> {
    load_with_progress(data, opts, |_| {})
}

pub fn load_file(file_path: &Path, opts: &LoadOptions) -> Result<LoadedFile> {
    let data = std::fs::read(file_path)?;
    load_bytes(&data, opts)
}
