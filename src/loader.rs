//! Source loading and column mapping
//!
//! Turns CSV exports (or JSON rows from the order database) into typed raw
//! rows by header name, then normalizes them. Rows with an unparseable date
//! or a malformed CSV line are dropped and counted; nothing aborts the batch
//! except a missing required column or an unreadable source.

use anyhow::Result;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use tracing::{debug, info, warn};

use crate::config::{OrderColumns, StockColumns};
use crate::error::ReportError;
use crate::models::{OrderRecord, RawOrderRow, RawStockRow, RawValue};

/// How many dropped rows get an individual warning before we just count
const MAX_ROW_WARNINGS: usize = 5;

/// Rows that survived normalization and how many didn't
#[derive(Debug, Clone)]
pub struct LoadOutcome<T> {
    pub rows: Vec<T>,
    pub dropped: usize,
}

impl<T> Default for LoadOutcome<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            dropped: 0,
        }
    }
}

/// Resolved header positions, `None` for optional columns the source lacks
struct HeaderIndex {
    headers: Vec<String>,
}

impl HeaderIndex {
    fn new(headers: &StringRecord) -> Self {
        Self {
            headers: headers.iter().map(|h| h.trim().to_string()).collect(),
        }
    }

    fn find(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.find(name)
            .ok_or_else(|| ReportError::MissingColumn(name.to_string()).into())
    }
}

fn cell(record: &StringRecord, idx: Option<usize>) -> RawValue {
    match idx.and_then(|i| record.get(i)) {
        Some(value) if !value.trim().is_empty() => RawValue::Text(value.to_string()),
        _ => RawValue::Missing,
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader)
}

/// Read order rows by header name. Only the date column is required.
pub fn read_order_rows<R: Read>(reader: R, columns: &OrderColumns) -> Result<LoadOutcome<RawOrderRow>> {
    let mut reader = csv_reader(reader);
    let index = HeaderIndex::new(reader.headers()?);

    let order_date = Some(index.require(&columns.order_date)?);
    let order_num = index.find(&columns.order_num);
    let customer_name = index.find(&columns.customer_name);
    let phone = index.find(&columns.phone);
    let city = index.find(&columns.city);
    let street = index.find(&columns.street);
    let house_num = index.find(&columns.house_num);
    let sku = index.find(&columns.sku);
    let quantity = index.find(&columns.quantity);
    let shipping_num = index.find(&columns.shipping_num);

    let mut outcome = LoadOutcome::default();
    for (i, result) in reader.records().enumerate() {
        match result {
            Ok(record) => outcome.rows.push(RawOrderRow {
                order_num: cell(&record, order_num),
                customer_name: cell(&record, customer_name),
                phone: cell(&record, phone),
                city: cell(&record, city),
                street: cell(&record, street),
                house_num: cell(&record, house_num),
                sku: cell(&record, sku),
                quantity: cell(&record, quantity),
                shipping_num: cell(&record, shipping_num),
                order_date: cell(&record, order_date),
            }),
            Err(e) => {
                if outcome.dropped < MAX_ROW_WARNINGS {
                    warn!("Malformed order row {}: {}", i + 1, e);
                }
                outcome.dropped += 1;
            }
        }
    }

    debug!("Read {} raw order rows", outcome.rows.len());
    Ok(outcome)
}

/// Normalize raw rows, dropping those without a usable date
pub fn normalize_orders(rows: &[RawOrderRow]) -> LoadOutcome<OrderRecord> {
    let mut outcome = LoadOutcome::default();

    for (i, row) in rows.iter().enumerate() {
        match OrderRecord::from_raw(row) {
            Some(record) => outcome.rows.push(record),
            None => {
                if outcome.dropped < MAX_ROW_WARNINGS {
                    warn!(
                        "Dropping order row {}: unparseable date {:?}",
                        i + 1,
                        row.order_date.as_text()
                    );
                }
                outcome.dropped += 1;
            }
        }
    }

    outcome
}

/// Read and normalize an order CSV
pub fn load_orders<R: Read>(reader: R, columns: &OrderColumns) -> Result<LoadOutcome<OrderRecord>> {
    let raw = read_order_rows(reader, columns)?;
    let mut outcome = normalize_orders(&raw.rows);
    outcome.dropped += raw.dropped;

    info!(
        "Loaded {} order records ({} dropped)",
        outcome.rows.len(),
        outcome.dropped
    );
    Ok(outcome)
}

/// Read and normalize a JSON array of rows keyed by canonical field names
pub fn load_orders_json<R: Read>(reader: R) -> Result<LoadOutcome<OrderRecord>> {
    let raw: Vec<RawOrderRow> = serde_json::from_reader(reader)?;
    let outcome = normalize_orders(&raw);

    info!(
        "Loaded {} order records from JSON ({} dropped)",
        outcome.rows.len(),
        outcome.dropped
    );
    Ok(outcome)
}

/// Read `(sku, quantity)` rows from an inventory or backlog sheet
pub fn load_stock_rows<R: Read>(reader: R, columns: &StockColumns) -> Result<Vec<RawStockRow>> {
    let mut reader = csv_reader(reader);
    let index = HeaderIndex::new(reader.headers()?);
    let sku = Some(index.require(&columns.sku)?);
    let quantity = Some(index.require(&columns.quantity)?);

    let mut rows = Vec::new();
    let mut malformed = 0usize;
    for (i, result) in reader.records().enumerate() {
        match result {
            Ok(record) => rows.push(RawStockRow {
                sku: cell(&record, sku),
                quantity: cell(&record, quantity),
            }),
            Err(e) => {
                if malformed < MAX_ROW_WARNINGS {
                    warn!("Malformed stock row {}: {}", i + 1, e);
                }
                malformed += 1;
            }
        }
    }

    info!("Read {} stock rows ({} malformed)", rows.len(), malformed);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnMapping;
    use chrono::NaiveDate;

    const ORDERS_CSV: &str = "\
order_num,customer_name,phone,city,street,house_num,sku,quantity,shipping_num,order_date
1001,Dana Levi,050-123-4567,Haifa,Herzl,12,white/black,2,S-1,10/01/2024
1002.0,Yossi Cohen,501234567.0,Tel Aviv,Dizengoff,5,WHITE\\BLACK,abc,,12/01/2024
1003,Avi,052,Eilat,Main,1,red,1,S-3,not a date
";

    #[test]
    fn test_empty_outcome_for_records() {
        let outcome = LoadOutcome::<OrderRecord>::default();
        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.dropped, 0);

        let empty = normalize_orders(&[]);
        assert!(empty.rows.is_empty());
        assert_eq!(empty.dropped, 0);
    }

    #[test]
    fn test_load_orders_csv() {
        let outcome = load_orders(ORDERS_CSV.as_bytes(), &OrderColumns::default()).unwrap();
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.dropped, 1);

        let first = &outcome.rows[0];
        assert_eq!(first.sku, "WHITE BLACK");
        assert_eq!(first.order_date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());

        let second = &outcome.rows[1];
        assert_eq!(second.order_num, "1002");
        assert_eq!(second.sku, first.sku);
        assert_eq!(second.phone, first.phone);
        assert_eq!(second.quantity, 0);
        assert!(second.is_installation());
    }

    #[test]
    fn test_missing_date_column_is_an_error() {
        let csv = "sku,quantity\nA,1\n";
        let err = load_orders(csv.as_bytes(), &OrderColumns::default()).unwrap_err();
        let report_err = err.downcast_ref::<ReportError>().unwrap();
        assert_eq!(report_err, &ReportError::MissingColumn("order_date".to_string()));
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let csv = "order_date,sku\n2024-01-01,a\n";
        let outcome = load_orders(csv.as_bytes(), &OrderColumns::default()).unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].quantity, 0);
        assert!(outcome.rows[0].is_installation());
    }

    #[test]
    fn test_hebrew_headers() {
        let csv = "תאריך,מק\"ט,כמות,מספר משלוח\n05/02/2024,abc/1,3,\n";
        let mapping = ColumnMapping::hebrew();
        let outcome = load_orders(csv.as_bytes(), &mapping.orders).unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].sku, "ABC 1");
        assert_eq!(outcome.rows[0].quantity, 3);
        assert!(outcome.rows[0].is_installation());
    }

    #[test]
    fn test_load_orders_json() {
        let json = r#"[
            {"order_num": 77.0, "phone": 501234567, "sku": "x/y", "quantity": 4, "order_date": "2024-02-01T10:00:00"},
            {"sku": "x", "quantity": 1, "order_date": null}
        ]"#;
        let outcome = load_orders_json(json.as_bytes()).unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(outcome.rows[0].sku, "X Y");
        assert_eq!(outcome.rows[0].order_num, "77");
    }

    #[test]
    fn test_load_stock_rows() {
        let csv = "sku,quantity,location\nA/1,5,shelf\na 1,2,back\n";
        let rows = load_stock_rows(csv.as_bytes(), &StockColumns::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sku, RawValue::Text("A/1".into()));

        let bad = load_stock_rows("code,qty\nA,1\n".as_bytes(), &StockColumns::default());
        assert!(bad.is_err());
    }
}
