//! Current data snapshot, owned by the caller
//!
//! Orders, inventory and backlog are each replaced wholesale. A report pass
//! takes one `Snapshot` clone up front, so it never sees parts from two
//! different refreshes even if the store moves on meanwhile.

use std::fmt::Display;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{ReportError, ReportResult};
use crate::models::{InventorySnapshot, OrderRecord, PreOrderBacklog};

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Bumped on every successful refresh of any part
    pub generation: u64,
    pub records: Arc<Vec<OrderRecord>>,
    /// `None` until an inventory sheet has been fetched
    pub inventory: Option<Arc<InventorySnapshot>>,
    pub backlog: Option<Arc<PreOrderBacklog>>,
}

impl Snapshot {
    pub fn new(
        records: Vec<OrderRecord>,
        inventory: Option<InventorySnapshot>,
        backlog: Option<PreOrderBacklog>,
    ) -> Self {
        Self {
            generation: 1,
            records: Arc::new(records),
            inventory: inventory.map(Arc::new),
            backlog: backlog.map(Arc::new),
        }
    }
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: Snapshot,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A coherent view of all three parts
    pub fn current(&self) -> Snapshot {
        self.current.clone()
    }

    pub fn generation(&self) -> u64 {
        self.current.generation
    }

    /// Replace the order records with whatever `fetch` returns. On failure the
    /// previous records stay in place.
    pub fn refresh_orders<F, E>(&mut self, fetch: F) -> ReportResult<u64>
    where
        F: FnOnce() -> Result<Vec<OrderRecord>, E>,
        E: Display,
    {
        let records = fetch().map_err(|e| self.upstream_failure("orders", e))?;
        let count = records.len();
        self.current.records = Arc::new(records);
        self.bump("orders", count)
    }

    pub fn refresh_inventory<F, E>(&mut self, fetch: F) -> ReportResult<u64>
    where
        F: FnOnce() -> Result<InventorySnapshot, E>,
        E: Display,
    {
        let inventory = fetch().map_err(|e| self.upstream_failure("inventory", e))?;
        let count = inventory.items.len();
        self.current.inventory = Some(Arc::new(inventory));
        self.bump("inventory", count)
    }

    pub fn refresh_backlog<F, E>(&mut self, fetch: F) -> ReportResult<u64>
    where
        F: FnOnce() -> Result<PreOrderBacklog, E>,
        E: Display,
    {
        let backlog = fetch().map_err(|e| self.upstream_failure("backlog", e))?;
        let count = backlog.items.len();
        self.current.backlog = Some(Arc::new(backlog));
        self.bump("backlog", count)
    }

    fn bump(&mut self, part: &str, count: usize) -> ReportResult<u64> {
        self.current.generation += 1;
        info!(
            "Refreshed {} ({} rows), snapshot generation {}",
            part, count, self.current.generation
        );
        Ok(self.current.generation)
    }

    fn upstream_failure<E: Display>(&self, part: &str, err: E) -> ReportError {
        warn!(
            "Refreshing {} failed, keeping generation {}: {}",
            part, self.current.generation, err
        );
        ReportError::Upstream(format!("{}: {}", part, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BacklogItem, InventoryItem, RawOrderRow};
    use chrono::NaiveDate;

    fn orders(n: usize) -> Vec<OrderRecord> {
        (0..n)
            .map(|i| {
                OrderRecord::from_raw(&RawOrderRow {
                    order_num: format!("{}", i).into(),
                    order_date: "2024-01-01".into(),
                    ..Default::default()
                })
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_refresh_bumps_generation() {
        let mut store = SnapshotStore::new();
        assert_eq!(store.generation(), 0);
        assert!(store.current().inventory.is_none());

        let gen = store.refresh_orders(|| Ok::<_, String>(orders(3))).unwrap();
        assert_eq!(gen, 1);
        assert_eq!(store.current().records.len(), 3);
    }

    #[test]
    fn test_failed_refresh_keeps_previous_data() {
        let mut store = SnapshotStore::new();
        store.refresh_orders(|| Ok::<_, String>(orders(2))).unwrap();

        let err = store
            .refresh_orders(|| Err::<Vec<OrderRecord>, _>("connection reset"))
            .unwrap_err();
        assert!(matches!(err, ReportError::Upstream(ref msg) if msg.contains("connection reset")));
        assert_eq!(store.current().records.len(), 2);
        assert_eq!(store.generation(), 1);
    }

    #[test]
    fn test_held_snapshot_is_not_affected_by_refresh() {
        let mut store = SnapshotStore::new();
        store.refresh_orders(|| Ok::<_, String>(orders(2))).unwrap();
        let held = store.current();

        store.refresh_orders(|| Ok::<_, String>(orders(5))).unwrap();
        store
            .refresh_inventory(|| {
                Ok::<_, String>(InventorySnapshot {
                    snapshot_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    items: vec![InventoryItem {
                        sku: "A".into(),
                        available_qty: 1,
                    }],
                })
            })
            .unwrap();

        assert_eq!(held.records.len(), 2);
        assert!(held.inventory.is_none());
        assert_eq!(held.generation, 1);

        let now = store.current();
        assert_eq!(now.records.len(), 5);
        assert!(now.inventory.is_some());
        assert_eq!(now.generation, 3);
    }

    #[test]
    fn test_inventory_survives_order_refresh() {
        let mut store = SnapshotStore::new();
        store
            .refresh_backlog(|| {
                Ok::<_, String>(PreOrderBacklog {
                    items: vec![BacklogItem {
                        sku: "A".into(),
                        backlog_qty: 4,
                    }],
                })
            })
            .unwrap();
        store.refresh_orders(|| Ok::<_, String>(orders(1))).unwrap();
        assert_eq!(store.current().backlog.unwrap().items.len(), 1);
    }
}
