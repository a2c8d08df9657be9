use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

use crate::normalize::{
    normalize_date, normalize_order_identifier, normalize_phone, normalize_quantity,
    normalize_sku,
};

/// A cell as the source hands it over: text, a number, or nothing at all
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    #[default]
    Missing,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    /// Textual form used by the normalizer. Missing cells read as "".
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            RawValue::Missing => Cow::Borrowed(""),
            RawValue::Bool(b) => Cow::Owned(b.to_string()),
            RawValue::Integer(i) => Cow::Owned(i.to_string()),
            RawValue::Float(f) if f.is_finite() => Cow::Owned(f.to_string()),
            RawValue::Float(_) => Cow::Borrowed(""),
            RawValue::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Integer(i)
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        RawValue::Float(f)
    }
}

/// Raw order row, already mapped from source column names to canonical fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawOrderRow {
    pub order_num: RawValue,
    pub customer_name: RawValue,
    pub phone: RawValue,
    pub city: RawValue,
    pub street: RawValue,
    pub house_num: RawValue,
    pub sku: RawValue,
    pub quantity: RawValue,
    pub shipping_num: RawValue,
    pub order_date: RawValue,
}

/// Order line class, decided solely by whether a shipping number is present
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderClass {
    Regular,
    Installation,
}

/// One normalized line item of one order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRecord {
    pub order_num: String,
    pub customer_name: String,
    pub phone: String,
    pub city: String,
    pub street: String,
    pub house_num: String,
    pub sku: String,
    pub quantity: u64,
    pub shipping_num: String,
    pub order_date: NaiveDate,
}

impl OrderRecord {
    /// Normalize a raw row. Rows whose date can't be parsed yield `None`.
    pub fn from_raw(row: &RawOrderRow) -> Option<Self> {
        let order_date = normalize_date(&row.order_date.as_text())?;

        Some(OrderRecord {
            order_num: normalize_order_identifier(&row.order_num.as_text()),
            customer_name: row.customer_name.as_text().into_owned(),
            phone: normalize_phone(&row.phone.as_text()),
            city: row.city.as_text().into_owned(),
            street: row.street.as_text().into_owned(),
            house_num: row.house_num.as_text().into_owned(),
            sku: normalize_sku(&row.sku.as_text()),
            quantity: normalize_quantity(&row.quantity.as_text()),
            shipping_num: normalize_order_identifier(&row.shipping_num.as_text()),
            order_date,
        })
    }

    pub fn class(&self) -> OrderClass {
        if self.shipping_num.trim().is_empty() {
            OrderClass::Installation
        } else {
            OrderClass::Regular
        }
    }

    pub fn is_installation(&self) -> bool {
        self.class() == OrderClass::Installation
    }
}

/// Raw `(sku, quantity)` row as it comes off the inventory or backlog sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawStockRow {
    pub sku: RawValue,
    pub quantity: RawValue,
}

impl RawStockRow {
    pub fn new(sku: impl Into<RawValue>, quantity: impl Into<RawValue>) -> Self {
        Self {
            sku: sku.into(),
            quantity: quantity.into(),
        }
    }
}

/// Stock count for a single SKU
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryItem {
    pub sku: String,
    pub available_qty: u64,
}

/// The most recently fetched stock counts, one entry per canonical SKU
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventorySnapshot {
    pub snapshot_date: NaiveDate,
    pub items: Vec<InventoryItem>,
}

impl InventorySnapshot {
    /// Build a snapshot, summing duplicate SKUs. Rows without a usable SKU are skipped.
    pub fn from_rows<'a, I>(rows: I, snapshot_date: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a RawStockRow>,
    {
        let items = sum_by_sku(rows)
            .into_iter()
            .map(|(sku, available_qty)| InventoryItem { sku, available_qty })
            .collect();
        Self {
            snapshot_date,
            items,
        }
    }

    pub fn get(&self, sku: &str) -> Option<u64> {
        self.items
            .iter()
            .find(|item| item.sku == sku)
            .map(|item| item.available_qty)
    }

    pub fn total_units(&self) -> u64 {
        self.items
            .iter()
            .fold(0u64, |acc, item| acc.saturating_add(item.available_qty))
    }
}

/// Quantity already sold against stock not yet received, for one SKU
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BacklogItem {
    pub sku: String,
    pub backlog_qty: u64,
}

/// Pre-order backlog; an empty backlog is a normal state
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreOrderBacklog {
    pub items: Vec<BacklogItem>,
}

impl PreOrderBacklog {
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a RawStockRow>,
    {
        let items = sum_by_sku(rows)
            .into_iter()
            .map(|(sku, backlog_qty)| BacklogItem { sku, backlog_qty })
            .collect();
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Sum quantities per canonical SKU, keeping first-occurrence order
fn sum_by_sku<'a, I>(rows: I) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = &'a RawStockRow>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut totals: Vec<(String, u64)> = Vec::new();

    for row in rows {
        let sku = normalize_sku(&row.sku.as_text());
        if sku.is_empty() {
            continue;
        }
        let qty = normalize_quantity(&row.quantity.as_text());
        match index.get(&sku) {
            Some(&i) => totals[i].1 = totals[i].1.saturating_add(qty),
            None => {
                index.insert(sku.clone(), totals.len());
                totals.push((sku, qty));
            }
        }
    }

    totals
}
