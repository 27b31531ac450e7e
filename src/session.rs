//! The analysis context: one loaded export, the selected year, its
//! classified buckets and memoized aggregates.
//!
//! A `Session` is created when a file is loaded and every view reads from
//! it. Aggregates are cached under the content fingerprint of the file,
//! the operation and its parameters, so asking for the same view twice
//! never recomputes it. Loading a new file clears the cache.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, info};

use crate::classifier::{classify, summarize, Buckets, ClassificationRule, Summary};
use crate::error::Result;
use crate::importer::{self, DateColumn, LoadOptions, LoadProgress};
use crate::models::Transaction;
use crate::process_types::enrich;
use crate::reports::{self, ActiveTypeRule, CompanyCount, GrowthTrend, Matrix, MonthCount, QuarterSummary, TypeShare};
use crate::selector::{available_years, select_year};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub rule: ClassificationRule,
    pub lenient_date_column: DateColumn,
}

impl AnalysisOptions {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            lenient_column: self.lenient_date_column,
            require_payment_flag: self.rule.requires_payment_flag(),
        }
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            rule: ClassificationRule::default(),
            lenient_date_column: LoadOptions::default().lenient_column,
        }
    }
}

// ---------------------------------------------------------------------------
// Report cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub fingerprint: String,
    pub operation: &'static str,
    pub params: String,
}

#[derive(Default)]
pub struct ReportCache {
    entries: RefCell<HashMap<CacheKey, Rc<dyn Any>>>,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl ReportCache {
    pub fn get_or_compute<T: 'static>(&self, key: CacheKey, compute: impl FnOnce() -> T) -> Rc<T> {
        if let Some(entry) = self.entries.borrow().get(&key) {
            if let Ok(value) = Rc::clone(entry).downcast::<T>() {
                self.hits.set(self.hits.get() + 1);
                debug!(operation = key.operation, params = %key.params, "report cache hit");
                return value;
            }
        }
        self.misses.set(self.misses.get() + 1);
        let value = Rc::new(compute());
        self.entries.borrow_mut().insert(key, value.clone());
        value
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits.get(), self.misses.get())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    options: AnalysisOptions,
    fingerprint: String,
    rows: Vec<Transaction>,
    years: Vec<i32>,
    year: Option<i32>,
    selected: Vec<Transaction>,
    buckets: Buckets,
    cache: ReportCache,
}

impl Session {
    pub fn open(data: &[u8], options: AnalysisOptions) -> Result<Session> {
        Self::open_with_progress(data, options, |_| {})
    }

    pub fn open_with_progress(
        data: &[u8],
        options: AnalysisOptions,
        on_progress: impl FnMut(LoadProgress),
    ) -> Result<Session> {
        let mut session = Session {
            options,
            fingerprint: String::new(),
            rows: Vec::new(),
            years: Vec::new(),
            year: None,
            selected: Vec::new(),
            buckets: Buckets::default(),
            cache: ReportCache::default(),
        };
        session.reload_with_progress(data, on_progress)?;
        Ok(session)
    }

    /// Replace the loaded export. Clears the year selection and the cache.
    pub fn reload(&mut self, data: &[u8]) -> Result<()> {
        self.reload_with_progress(data, |_| {})
    }

    pub fn reload_with_progress(
        &mut self,
        data: &[u8],
        on_progress: impl FnMut(LoadProgress),
    ) -> Result<()> {
        let loaded = importer::load_with_progress(data, &self.options.load_options(), on_progress)?;
        self.fingerprint = loaded.fingerprint;
        self.rows = enrich(loaded.rows);
        self.years = available_years(&self.rows);
        self.cache.clear();
        self.select_year(None);
        Ok(())
    }

    pub fn select_year(&mut self, year: Option<i32>) {
        self.year = year;
        self.selected = select_year(&self.rows, year);
        if self.selected.is_empty() && !self.rows.is_empty() {
            info!(year = ?year, "selected year has no transactions");
        }
        self.buckets = classify(&self.selected, self.options.rule);
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn options(&self) -> AnalysisOptions {
        self.options
    }

    /// Every loaded row, enriched, regardless of the year selection.
    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn selected(&self) -> &[Transaction] {
        &self.selected
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn cache(&self) -> &ReportCache {
        &self.cache
    }

    fn key(&self, operation: &'static str, params: String) -> CacheKey {
        CacheKey {
            fingerprint: self.fingerprint.clone(),
            operation,
            params: format!("year={:?};rule={};{params}", self.year, self.options.rule.key()),
        }
    }

    pub fn summary(&self) -> Rc<Summary> {
        self.cache.get_or_compute(self.key("summary", String::new()), || {
            summarize(&self.selected, &self.buckets, self.options.rule)
        })
    }

    pub fn monthly_counts(&self) -> Rc<Vec<MonthCount>> {
        self.cache.get_or_compute(self.key("monthly_counts", String::new()), || {
            reports::monthly_counts(&self.buckets.successful)
        })
    }

    pub fn quarterly_summary(&self) -> Rc<Vec<QuarterSummary>> {
        self.cache.get_or_compute(self.key("quarterly_summary", String::new()), || {
            reports::quarterly_summary(&self.buckets.successful)
        })
    }

    pub fn process_type_by_month(&self, types: Option<&[String]>) -> Rc<Matrix> {
        self.cache.get_or_compute(
            self.key("process_type_by_month", format!("types={types:?}")),
            || reports::process_type_by_month(&self.buckets.successful, types),
        )
    }

    pub fn process_type_share(&self, types: Option<&[String]>) -> Rc<Vec<TypeShare>> {
        self.cache.get_or_compute(
            self.key("process_type_share", format!("types={types:?}")),
            || reports::process_type_share(&self.buckets.successful, types),
        )
    }

    pub fn growth_trend(&self, types: Option<&[String]>, rule: ActiveTypeRule) -> Rc<GrowthTrend> {
        let key = self.key("growth_trend", format!("types={types:?};active={}", rule.key()));
        self.cache.get_or_compute(key, || {
            reports::growth_trend(&self.process_type_by_month(types), rule)
        })
    }

    pub fn weekday_by_process_type(&self) -> Rc<Matrix> {
        self.cache.get_or_compute(self.key("weekday_by_process_type", String::new()), || {
            reports::weekday_by_process_type(&self.buckets.successful)
        })
    }

    pub fn top_companies(&self, limit: usize) -> Rc<Vec<CompanyCount>> {
        self.cache.get_or_compute(self.key("top_companies", format!("limit={limit}")), || {
            reports::top_companies(&self.buckets.successful, limit)
        })
    }
}
