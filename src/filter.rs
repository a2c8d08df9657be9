//! Record filtering: inclusive date ranges and field-scoped search
//!
//! Both filters borrow from the snapshot and preserve input order, so they
//! compose freely: `search(filter_by_date(..), ..)`.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ReportError, ReportResult};
use crate::models::OrderRecord;
use crate::normalize::{normalize_phone, normalize_sku};

/// Display format for order dates (DD/MM/YYYY)
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Inclusive date range with `start <= end` guaranteed by construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ReportResult<Self> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// First day of `today`'s month through `today`
    pub fn month_to_date(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        Self { start, end: today }
    }

    /// The last `days` calendar days ending at `today`, both ends included.
    /// A zero-length window is widened to the single day `today`.
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        let start = today
            .checked_sub_signed(Duration::days(span))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, counting both ends
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format(DISPLAY_DATE_FORMAT),
            self.end.format(DISPLAY_DATE_FORMAT)
        )
    }
}

/// Keep records dated within `range`
pub fn filter_by_date<'a, I>(records: I, range: &DateRange) -> Vec<&'a OrderRecord>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    records
        .into_iter()
        .filter(|r| range.contains(r.order_date))
        .collect()
}

/// Earliest and latest order date, `None` for an empty collection
pub fn date_bounds<'a, I>(records: I) -> Option<(NaiveDate, NaiveDate)>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    records.into_iter().fold(None, |bounds, r| match bounds {
        None => Some((r.order_date, r.order_date)),
        Some((lo, hi)) => Some((lo.min(r.order_date), hi.max(r.order_date))),
    })
}

/// The user's current date selection.
///
/// An invalid selection is rejected and the previous range stays in effect,
/// so the last good filtered view is still available to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    range: DateRange,
}

impl DateFilter {
    pub fn new(range: DateRange) -> Self {
        Self { range }
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn apply(&mut self, start: NaiveDate, end: NaiveDate) -> ReportResult<&DateRange> {
        self.range = DateRange::new(start, end)?;
        Ok(&self.range)
    }

    pub fn filter<'a, I>(&self, records: I) -> Vec<&'a OrderRecord>
    where
        I: IntoIterator<Item = &'a OrderRecord>,
    {
        filter_by_date(records, &self.range)
    }
}

/// Which field a search term is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    #[default]
    All,
    OrderNum,
    Sku,
    CustomerName,
    Phone,
}

impl FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "any" => Ok(SearchField::All),
            "order" | "order_num" => Ok(SearchField::OrderNum),
            "sku" => Ok(SearchField::Sku),
            "customer" | "customer_name" => Ok(SearchField::CustomerName),
            "phone" => Ok(SearchField::Phone),
            other => Err(format!(
                "unknown search field '{}' (expected all, order, sku, customer, phone)",
                other
            )),
        }
    }
}

/// Keep records matching `term` in `field`. An empty term returns the input unchanged.
///
/// Phone and SKU terms are normalized first and matched as substrings of the
/// normalized field; a term that normalizes to nothing matches no record.
/// Everything else is a case-insensitive substring match on the raw text.
pub fn search<'a, I>(records: I, field: SearchField, term: &str) -> Vec<&'a OrderRecord>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let records = records.into_iter();
    if term.trim().is_empty() {
        return records.collect();
    }

    match field {
        SearchField::Phone => {
            let needle = normalize_phone(term);
            if needle.is_empty() {
                return Vec::new();
            }
            records.filter(|r| r.phone.contains(&needle)).collect()
        }
        SearchField::Sku => {
            let needle = normalize_sku(term);
            if needle.is_empty() {
                return Vec::new();
            }
            records.filter(|r| r.sku.contains(&needle)).collect()
        }
        SearchField::OrderNum => {
            let needle = term.to_lowercase();
            records
                .filter(|r| contains_ci(&r.order_num, &needle))
                .collect()
        }
        SearchField::CustomerName => {
            let needle = term.to_lowercase();
            records
                .filter(|r| contains_ci(&r.customer_name, &needle))
                .collect()
        }
        SearchField::All => {
            let needle = term.to_lowercase();
            records.filter(|r| any_field_matches(r, &needle)).collect()
        }
    }
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

fn any_field_matches(record: &OrderRecord, lowered_needle: &str) -> bool {
    let text_fields = [
        record.order_num.as_str(),
        record.customer_name.as_str(),
        record.phone.as_str(),
        record.city.as_str(),
        record.street.as_str(),
        record.house_num.as_str(),
        record.sku.as_str(),
        record.shipping_num.as_str(),
    ];
    if text_fields.iter().any(|f| contains_ci(f, lowered_needle)) {
        return true;
    }

    let derived = [
        record.quantity.to_string(),
        record.order_date.to_string(),
        record.order_date.format(DISPLAY_DATE_FORMAT).to_string(),
    ];
    derived.iter().any(|f| f.contains(lowered_needle))
}
