//! Inventory health: stock on hand against recent sales velocity
//!
//! Each SKU in the snapshot lands in exactly one of four states, checked in
//! order: Dead (nothing sold in the window), Critical, Low, Healthy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::filter::{filter_by_date, DateRange};
use crate::models::{InventorySnapshot, OrderRecord, PreOrderBacklog};
use crate::sales::{group_totals, GroupKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Dead,
    Critical,
    Low,
    Healthy,
}

impl HealthStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Dead => "Dead",
            HealthStatus::Critical => "Critical",
            HealthStatus::Low => "Low",
            HealthStatus::Healthy => "Healthy",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Projected days of stock left; `Infinite` when nothing is selling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaysOfSupply {
    Finite(f64),
    Infinite,
}

impl fmt::Display for DaysOfSupply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaysOfSupply::Finite(days) => write!(f, "{:.1}", days),
            DaysOfSupply::Infinite => f.write_str("∞"),
        }
    }
}

/// Day thresholds separating Critical / Low / Healthy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthThresholds {
    pub critical_days: f64,
    pub low_days: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            critical_days: 14.0,
            low_days: 45.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryHealth {
    pub sku: String,
    pub available_qty: u64,
    pub window_sales: u64,
    pub daily_velocity: f64,
    pub days_of_supply: DaysOfSupply,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub dead: usize,
    pub critical: usize,
    pub low: usize,
    pub healthy: usize,
}

impl HealthSummary {
    fn count(&mut self, status: HealthStatus) {
        match status {
            HealthStatus::Dead => self.dead += 1,
            HealthStatus::Critical => self.critical += 1,
            HealthStatus::Low => self.low += 1,
            HealthStatus::Healthy => self.healthy += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.dead + self.critical + self.low + self.healthy
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryReport {
    pub snapshot_date: NaiveDate,
    pub window_days: u32,
    pub rows: Vec<InventoryHealth>,
    pub summary: HealthSummary,
    /// SKUs that sold in the window but have no inventory row
    pub unstocked_skus: Vec<String>,
}

/// Velocity, days-of-supply and status for one SKU
pub fn classify(
    available_qty: u64,
    window_sales: u64,
    window_days: u32,
    thresholds: &HealthThresholds,
) -> (f64, DaysOfSupply, HealthStatus) {
    if window_sales == 0 {
        let days = if available_qty > 0 {
            DaysOfSupply::Infinite
        } else {
            DaysOfSupply::Finite(0.0)
        };
        return (0.0, days, HealthStatus::Dead);
    }

    let daily_velocity = window_sales as f64 / f64::from(window_days.max(1));
    let days = available_qty as f64 / daily_velocity;
    let status = if days < thresholds.critical_days {
        HealthStatus::Critical
    } else if days < thresholds.low_days {
        HealthStatus::Low
    } else {
        HealthStatus::Healthy
    };

    (daily_velocity, DaysOfSupply::Finite(days), status)
}

/// Join the snapshot against sales in the trailing `window_days` ending `today`.
///
/// Rows follow snapshot order. SKUs with sales but no stock row are listed in
/// `unstocked_skus` rather than classified.
pub fn analyze_inventory<'a, I>(
    snapshot: &InventorySnapshot,
    records: I,
    today: NaiveDate,
    window_days: u32,
    thresholds: &HealthThresholds,
) -> InventoryReport
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let window = DateRange::trailing(today, window_days);
    let in_window = filter_by_date(records, &window);
    let sales: HashMap<String, u64> = group_totals(in_window, GroupKey::Sku)
        .into_iter()
        .map(|t| (t.key, t.total_quantity))
        .collect();

    let mut summary = HealthSummary::default();
    let rows: Vec<InventoryHealth> = snapshot
        .items
        .iter()
        .map(|item| {
            let window_sales = sales.get(&item.sku).copied().unwrap_or(0);
            let (daily_velocity, days_of_supply, status) =
                classify(item.available_qty, window_sales, window_days, thresholds);
            summary.count(status);
            InventoryHealth {
                sku: item.sku.clone(),
                available_qty: item.available_qty,
                window_sales,
                daily_velocity,
                days_of_supply,
                status,
            }
        })
        .collect();

    let stocked: HashSet<&str> = snapshot.items.iter().map(|i| i.sku.as_str()).collect();
    let mut unstocked_skus: Vec<String> = sales
        .into_iter()
        .filter(|(sku, qty)| *qty > 0 && !sku.is_empty() && !stocked.contains(sku.as_str()))
        .map(|(sku, _)| sku)
        .collect();
    unstocked_skus.sort();

    InventoryReport {
        snapshot_date: snapshot.snapshot_date,
        window_days,
        rows,
        summary,
        unstocked_skus,
    }
}

/// Backlog quantity next to stock on hand, for one SKU
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogRow {
    pub sku: String,
    pub backlog_qty: u64,
    pub available_qty: Option<u64>,
}

/// Backlog table, largest backlog first. `available_qty` is filled in only
/// when an inventory snapshot is at hand.
pub fn reconcile_backlog(
    backlog: &PreOrderBacklog,
    inventory: Option<&InventorySnapshot>,
) -> Vec<BacklogRow> {
    let stock: HashMap<&str, u64> = inventory
        .map(|snap| {
            snap.items
                .iter()
                .map(|i| (i.sku.as_str(), i.available_qty))
                .collect()
        })
        .unwrap_or_default();

    let mut rows: Vec<BacklogRow> = backlog
        .items
        .iter()
        .map(|item| BacklogRow {
            sku: item.sku.clone(),
            backlog_qty: item.backlog_qty,
            available_qty: inventory.map(|_| stock.get(item.sku.as_str()).copied().unwrap_or(0)),
        })
        .collect();

    rows.sort_by(|a, b| b.backlog_qty.cmp(&a.backlog_qty).then_with(|| a.sku.cmp(&b.sku)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InventoryItem, RawOrderRow, RawStockRow, RawValue};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn sale(sku: &str, qty: u64, days_ago: i64) -> OrderRecord {
        let row = RawOrderRow {
            sku: sku.into(),
            quantity: RawValue::Integer(qty as i64),
            shipping_num: "S1".into(),
            order_date: (today() - chrono::Duration::days(days_ago)).to_string().into(),
            ..Default::default()
        };
        OrderRecord::from_raw(&row).unwrap()
    }

    fn snapshot(items: &[(&str, u64)]) -> InventorySnapshot {
        InventorySnapshot {
            snapshot_date: today(),
            items: items
                .iter()
                .map(|(sku, qty)| InventoryItem {
                    sku: sku.to_string(),
                    available_qty: *qty,
                })
                .collect(),
        }
    }

    #[test]
    fn test_dead_regardless_of_stock() {
        let report = analyze_inventory(
            &snapshot(&[("X", 100)]),
            &Vec::<OrderRecord>::new(),
            today(),
            90,
            &HealthThresholds::default(),
        );
        assert_eq!(report.rows[0].status, HealthStatus::Dead);
        assert_eq!(report.rows[0].days_of_supply, DaysOfSupply::Infinite);
    }

    #[test]
    fn test_critical_velocity() {
        let records = vec![sale("Y", 100, 10), sale("Y", 80, 60)];
        let report = analyze_inventory(
            &snapshot(&[("Y", 20)]),
            &records,
            today(),
            90,
            &HealthThresholds::default(),
        );
        let row = &report.rows[0];
        assert_eq!(row.window_sales, 180);
        assert_eq!(row.daily_velocity, 2.0);
        assert_eq!(row.days_of_supply, DaysOfSupply::Finite(10.0));
        assert_eq!(row.status, HealthStatus::Critical);
    }

    #[test]
    fn test_sales_outside_window_ignored() {
        let records = vec![sale("Z", 500, 120)];
        let report = analyze_inventory(
            &snapshot(&[("Z", 5)]),
            &records,
            today(),
            90,
            &HealthThresholds::default(),
        );
        assert_eq!(report.rows[0].status, HealthStatus::Dead);
    }

    #[test]
    fn test_threshold_boundaries() {
        let t = HealthThresholds::default();
        // 90 sold over 90 days = 1/day
        assert_eq!(classify(13, 90, 90, &t).2, HealthStatus::Critical);
        assert_eq!(classify(14, 90, 90, &t).2, HealthStatus::Low);
        assert_eq!(classify(44, 90, 90, &t).2, HealthStatus::Low);
        assert_eq!(classify(45, 90, 90, &t).2, HealthStatus::Healthy);
        assert_eq!(classify(0, 90, 90, &t).2, HealthStatus::Critical);
    }

    #[test]
    fn test_zero_stock_zero_sales_is_dead() {
        let (velocity, days, status) = classify(0, 0, 90, &HealthThresholds::default());
        assert_eq!(velocity, 0.0);
        assert_eq!(days, DaysOfSupply::Finite(0.0));
        assert_eq!(status, HealthStatus::Dead);
    }

    #[test]
    fn test_every_sku_classified_once() {
        let records = vec![
            sale("A", 900, 1),
            sale("B", 90, 1),
            sale("C", 10, 1),
            sale("ONLY SOLD", 3, 1),
        ];
        let snap = snapshot(&[("A", 10), ("B", 30), ("C", 100), ("D", 1)]);
        let report = analyze_inventory(&snap, &records, today(), 90, &HealthThresholds::default());

        assert_eq!(report.rows.len(), snap.items.len());
        assert_eq!(report.summary.total(), snap.items.len());
        let statuses: Vec<HealthStatus> = report.rows.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                HealthStatus::Critical,
                HealthStatus::Low,
                HealthStatus::Healthy,
                HealthStatus::Dead
            ]
        );
        assert_eq!(report.unstocked_skus, vec!["ONLY SOLD".to_string()]);
    }

    #[test]
    fn test_backlog_with_and_without_inventory() {
        let backlog = PreOrderBacklog::from_rows(&vec![
            RawStockRow::new("a", "2"),
            RawStockRow::new("b", "7"),
            RawStockRow::new("A", "1"),
        ]);
        let snap = snapshot(&[("A", 4)]);

        let rows = reconcile_backlog(&backlog, Some(&snap));
        assert_eq!(rows[0].sku, "B");
        assert_eq!(rows[0].available_qty, Some(0));
        assert_eq!(rows[1].sku, "A");
        assert_eq!(rows[1].backlog_qty, 3);
        assert_eq!(rows[1].available_qty, Some(4));

        let bare = reconcile_backlog(&backlog, None);
        assert!(bare.iter().all(|r| r.available_qty.is_none()));
        assert!(reconcile_backlog(&PreOrderBacklog::default(), None).is_empty());
    }
}
