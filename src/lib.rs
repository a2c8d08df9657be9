//! Order and inventory reporting for a small distribution operation
//!
//! Raw order lines, an inventory sheet and a pre-order backlog go in;
//! filtered views, sales rankings, stock health and a month-end forecast
//! come out. All analytics are pure functions over one `Snapshot`.

pub mod config;
pub mod error;
pub mod filter;
pub mod forecast;
pub mod inventory;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod report;
pub mod sales;
pub mod snapshot;

pub use error::{ReportError, ReportResult};
pub use models::{InventorySnapshot, OrderRecord, PreOrderBacklog};
pub use report::{build_report, Report, ReportRequest, Section};
pub use snapshot::{Snapshot, SnapshotStore};
