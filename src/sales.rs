//! Sales aggregation over any record collection
//!
//! The same functions serve the user's filtered view and the fixed trailing
//! windows; callers pick the collection, these only sum and rank.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{OrderClass, OrderRecord};

/// What to group order lines by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Sku,
    Customer,
}

impl GroupKey {
    fn key_of(self, record: &OrderRecord) -> &str {
        match self {
            GroupKey::Sku => record.sku.as_str(),
            GroupKey::Customer => record.customer_name.trim(),
        }
    }
}

/// Quantity and line count for one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub key: String,
    pub total_quantity: u64,
    pub record_count: usize,
}

/// Per-group aggregate with rank and market share within its window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuSalesStats {
    pub key: String,
    pub total_quantity: u64,
    pub record_count: usize,
    pub rank: usize,
    pub market_share: f64,
}

/// Headline counts split by order class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTotals {
    pub total_lines: usize,
    pub regular_lines: usize,
    pub installation_lines: usize,
    pub regular_qty: u64,
    pub installation_qty: u64,
}

impl ClassTotals {
    pub fn total_qty(&self) -> u64 {
        self.regular_qty.saturating_add(self.installation_qty)
    }
}

pub fn total_quantity<'a, I>(records: I) -> u64
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    records
        .into_iter()
        .fold(0u64, |acc, r| acc.saturating_add(r.quantity))
}

/// Sum quantity per distinct key, in order of first occurrence. Lines whose
/// key is empty (no usable SKU, no customer name) belong to no group.
pub fn group_totals<'a, I>(records: I, key: GroupKey) -> Vec<GroupTotal>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut totals: Vec<GroupTotal> = Vec::new();

    for record in records {
        let k = key.key_of(record);
        if k.is_empty() {
            continue;
        }
        match index.get(k) {
            Some(&i) => {
                totals[i].total_quantity = totals[i].total_quantity.saturating_add(record.quantity);
                totals[i].record_count += 1;
            }
            None => {
                index.insert(k, totals.len());
                totals.push(GroupTotal {
                    key: k.to_string(),
                    total_quantity: record.quantity,
                    record_count: 1,
                });
            }
        }
    }

    totals
}

/// Highest totals first; ties by ascending key
pub fn top_n<'a, I>(records: I, key: GroupKey, n: usize) -> Vec<GroupTotal>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let mut totals = group_totals(records, key);
    sort_descending(&mut totals);
    totals.truncate(n);
    totals
}

/// Lowest totals first; ties by ascending key
pub fn bottom_n<'a, I>(records: I, key: GroupKey, n: usize) -> Vec<GroupTotal>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let mut totals = group_totals(records, key);
    sort_ascending(&mut totals);
    totals.truncate(n);
    totals
}

/// Groups whose total is at or below `threshold`, weakest first
pub fn weak_groups<'a, I>(records: I, key: GroupKey, threshold: u64) -> Vec<GroupTotal>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let mut totals: Vec<GroupTotal> = group_totals(records, key)
        .into_iter()
        .filter(|t| t.total_quantity <= threshold)
        .collect();
    sort_ascending(&mut totals);
    totals
}

/// Percentage share of each group, to one decimal, in input order.
///
/// Rounding uses largest remainders on tenths of a percent, so the shares add
/// up to exactly 100.0 whenever anything was sold. A zero total gives all zeros.
pub fn market_share(totals: &[GroupTotal]) -> Vec<(String, f64)> {
    let sum: u128 = totals.iter().map(|t| u128::from(t.total_quantity)).sum();
    if sum == 0 {
        return totals.iter().map(|t| (t.key.clone(), 0.0)).collect();
    }

    let mut tenths: Vec<u128> = Vec::with_capacity(totals.len());
    let mut remainders: Vec<(usize, u128)> = Vec::with_capacity(totals.len());
    for (i, t) in totals.iter().enumerate() {
        let scaled = u128::from(t.total_quantity) * 1000;
        tenths.push(scaled / sum);
        remainders.push((i, scaled % sum));
    }

    let assigned: u128 = tenths.iter().sum();
    let leftover = 1000u128.saturating_sub(assigned) as usize;
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for &(i, _) in remainders.iter().take(leftover) {
        tenths[i] += 1;
    }

    totals
        .iter()
        .zip(tenths)
        .map(|(t, share)| (t.key.clone(), share as f64 / 10.0))
        .collect()
}

/// Ranked statistics (rank 1 = best seller) with market share
pub fn sales_stats<'a, I>(records: I, key: GroupKey) -> Vec<SkuSalesStats>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let mut totals = group_totals(records, key);
    sort_descending(&mut totals);
    let shares = market_share(&totals);

    totals
        .into_iter()
        .zip(shares)
        .enumerate()
        .map(|(i, (t, (_, share)))| SkuSalesStats {
            key: t.key,
            total_quantity: t.total_quantity,
            record_count: t.record_count,
            rank: i + 1,
            market_share: share,
        })
        .collect()
}

/// Line counts and quantities split into regular shipments and installations
pub fn class_totals<'a, I>(records: I) -> ClassTotals
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    records
        .into_iter()
        .fold(ClassTotals::default(), |mut acc, r| {
            acc.total_lines += 1;
            match r.class() {
                OrderClass::Regular => {
                    acc.regular_lines += 1;
                    acc.regular_qty = acc.regular_qty.saturating_add(r.quantity);
                }
                OrderClass::Installation => {
                    acc.installation_lines += 1;
                    acc.installation_qty = acc.installation_qty.saturating_add(r.quantity);
                }
            }
            acc
        })
}

fn sort_descending(totals: &mut [GroupTotal]) {
    totals.sort_by(|a, b| {
        b.total_quantity
            .cmp(&a.total_quantity)
            .then_with(|| a.key.cmp(&b.key))
    });
}

fn sort_ascending(totals: &mut [GroupTotal]) {
    totals.sort_by(|a, b| {
        a.total_quantity
            .cmp(&b.total_quantity)
            .then_with(|| a.key.cmp(&b.key))
    });
}
