//! Report configuration
//!
//! Everything has a default, so an empty JSON object (or no file at all) is a
//! valid configuration. Column mappings name the source's headers for each
//! canonical field; the loader resolves them once per load.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::forecast::Pricing;
use crate::inventory::HealthThresholds;

/// Source header for each canonical order field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderColumns {
    pub order_num: String,
    pub customer_name: String,
    pub phone: String,
    pub city: String,
    pub street: String,
    pub house_num: String,
    pub sku: String,
    pub quantity: String,
    pub shipping_num: String,
    pub order_date: String,
}

impl Default for OrderColumns {
    fn default() -> Self {
        Self {
            order_num: "order_num".into(),
            customer_name: "customer_name".into(),
            phone: "phone".into(),
            city: "city".into(),
            street: "street".into(),
            house_num: "house_num".into(),
            sku: "sku".into(),
            quantity: "quantity".into(),
            shipping_num: "shipping_num".into(),
            order_date: "order_date".into(),
        }
    }
}

impl OrderColumns {
    /// Headers of the Hebrew order spreadsheet
    pub fn hebrew() -> Self {
        Self {
            order_num: "מספר הזמנה".into(),
            customer_name: "שם לקוח".into(),
            phone: "טלפון".into(),
            city: "עיר".into(),
            street: "רחוב".into(),
            house_num: "מספר בית".into(),
            sku: "מק\"ט".into(),
            quantity: "כמות".into(),
            shipping_num: "מספר משלוח".into(),
            order_date: "תאריך".into(),
        }
    }
}

/// Source headers for a `(sku, quantity)` sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockColumns {
    pub sku: String,
    pub quantity: String,
}

impl Default for StockColumns {
    fn default() -> Self {
        Self {
            sku: "sku".into(),
            quantity: "quantity".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub orders: OrderColumns,
    pub inventory: StockColumns,
    pub backlog: StockColumns,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            orders: OrderColumns::default(),
            inventory: StockColumns {
                sku: "sku".into(),
                quantity: "available_qty".into(),
            },
            backlog: StockColumns::default(),
        }
    }
}

impl ColumnMapping {
    pub fn hebrew() -> Self {
        Self {
            orders: OrderColumns::hebrew(),
            inventory: StockColumns {
                sku: "מק\"ט".into(),
                quantity: "מלאי זמין".into(),
            },
            backlog: StockColumns {
                sku: "מק\"ט".into(),
                quantity: "כמות".into(),
            },
        }
    }

    /// Named preset: `english` (the default) or `hebrew`
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "english" | "default" => Some(Self::default()),
            "hebrew" => Some(Self::hebrew()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub columns: ColumnMapping,
    /// Window for trending and weak-SKU views
    pub short_window_days: u32,
    /// Window for sales velocity and dead-stock detection
    pub long_window_days: u32,
    pub critical_days: f64,
    pub low_days: f64,
    /// SKUs selling at most this many units in the short window are "weak"
    pub weak_sku_threshold: u64,
    pub top_n: usize,
    pub pricing: Pricing,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let thresholds = HealthThresholds::default();
        Self {
            columns: ColumnMapping::default(),
            short_window_days: 30,
            long_window_days: 90,
            critical_days: thresholds.critical_days,
            low_days: thresholds.low_days,
            weak_sku_threshold: 5,
            top_n: 10,
            pricing: Pricing::default(),
        }
    }
}

impl ReportConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ReportConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn thresholds(&self) -> HealthThresholds {
        HealthThresholds {
            critical_days: self.critical_days,
            low_days: self.low_days,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.short_window_days == 0 || self.long_window_days == 0 {
            bail!("window lengths must be at least one day");
        }
        if !(self.critical_days >= 0.0 && self.critical_days <= self.low_days) {
            bail!(
                "critical_days ({}) must be non-negative and not above low_days ({})",
                self.critical_days,
                self.low_days
            );
        }
        if !(0.0..=1.0).contains(&self.pricing.commission_rate) {
            bail!("commission_rate must be within [0, 1]");
        }
        Ok(())
    }
}
