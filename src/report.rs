//! Report assembly
//!
//! One pass over one snapshot. Sections that depend on optional inputs are
//! wrapped in `Section` so a missing inventory sheet or a bad forecast input
//! only blanks that section.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ReportConfig;
use crate::error::{ReportError, ReportResult};
use crate::filter::{date_bounds, filter_by_date, search, DateRange, SearchField};
use crate::forecast::{forecast_month, RevenueForecast};
use crate::inventory::{analyze_inventory, reconcile_backlog, BacklogRow, InventoryReport};
use crate::models::OrderRecord;
use crate::sales::{
    class_totals, sales_stats, top_n, weak_groups, ClassTotals, GroupKey, GroupTotal,
    SkuSalesStats,
};
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Section<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Section::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Section::Available(value) => Some(value),
            Section::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Section::Available(_))
    }
}

impl<T> From<ReportResult<T>> for Section<T> {
    fn from(result: ReportResult<T>) -> Self {
        match result {
            Ok(value) => Section::Available(value),
            Err(e) => Section::unavailable(e.to_string()),
        }
    }
}

/// What the user asked to see
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub today: NaiveDate,
    pub range: DateRange,
    pub search_field: SearchField,
    pub search_term: String,
}

impl ReportRequest {
    /// Month-to-date, no search
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            range: DateRange::month_to_date(today),
            search_field: SearchField::All,
            search_term: String::new(),
        }
    }

    pub fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> ReportResult<Self> {
        self.range = DateRange::new(start, end)?;
        Ok(self)
    }

    pub fn with_search(mut self, field: SearchField, term: impl Into<String>) -> Self {
        self.search_field = field;
        self.search_term = term.into();
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generation: u64,
    pub today: NaiveDate,
    pub range: DateRange,
    /// Earliest and latest order date in the whole snapshot, the span a
    /// date selection can usefully cover
    pub bounds: Option<(NaiveDate, NaiveDate)>,
    pub search_field: SearchField,
    pub search_term: String,
    /// Counts over the date-filtered, searched view
    pub kpis: ClassTotals,
    pub orders: Vec<OrderRecord>,
    pub top_skus: Vec<SkuSalesStats>,
    pub top_customers: Vec<GroupTotal>,
    /// Best sellers over the short trailing window
    pub trending_skus: Vec<SkuSalesStats>,
    /// SKUs at or below the weak threshold over the short window
    pub weak_skus: Vec<GroupTotal>,
    pub inventory: Section<InventoryReport>,
    pub backlog: Section<Vec<BacklogRow>>,
    pub forecast: Section<RevenueForecast>,
}

pub fn build_report(snapshot: &Snapshot, request: &ReportRequest, config: &ReportConfig) -> Report {
    let records: &[OrderRecord] = &snapshot.records;

    let dated = filter_by_date(records, &request.range);
    let view = search(dated, request.search_field, &request.search_term);
    debug!(
        "Filtered view: {} of {} records ({}, search {:?})",
        view.len(),
        records.len(),
        request.range,
        request.search_term
    );

    let mut top_skus = sales_stats(view.iter().copied(), GroupKey::Sku);
    top_skus.truncate(config.top_n);

    let short_window = DateRange::trailing(request.today, config.short_window_days);
    let recent = filter_by_date(records, &short_window);
    let mut trending_skus = sales_stats(recent.iter().copied(), GroupKey::Sku);
    trending_skus.truncate(config.top_n);
    let weak_skus = weak_groups(recent.iter().copied(), GroupKey::Sku, config.weak_sku_threshold);

    let inventory = match snapshot.inventory.as_deref() {
        Some(inv) => Section::Available(analyze_inventory(
            inv,
            records,
            request.today,
            config.long_window_days,
            &config.thresholds(),
        )),
        None => Section::from(Err(ReportError::Unavailable(
            "no inventory snapshot has been fetched".into(),
        ))),
    };

    let backlog = match snapshot.backlog.as_deref() {
        Some(backlog) => Section::Available(reconcile_backlog(backlog, snapshot.inventory.as_deref())),
        None => Section::from(Err(ReportError::Unavailable(
            "no backlog table has been loaded".into(),
        ))),
    };

    let forecast = Section::from(forecast_month(records, request.today, &config.pricing));

    let report = Report {
        generation: snapshot.generation,
        today: request.today,
        range: request.range,
        bounds: date_bounds(records),
        search_field: request.search_field,
        search_term: request.search_term.clone(),
        kpis: class_totals(view.iter().copied()),
        orders: view.iter().map(|r| (*r).clone()).collect(),
        top_skus,
        top_customers: top_n(view.iter().copied(), GroupKey::Customer, config.top_n),
        trending_skus,
        weak_skus,
        inventory,
        backlog,
        forecast,
    };

    info!(
        "Built report for generation {}: {} orders in view, inventory {}, backlog {}",
        report.generation,
        report.orders.len(),
        if report.inventory.is_available() { "available" } else { "unavailable" },
        if report.backlog.is_available() { "available" } else { "unavailable" },
    );
    report
}
