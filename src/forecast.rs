//! Month-end revenue projection from month-to-date package volume

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};
use crate::filter::{filter_by_date, DateRange};
use crate::models::OrderRecord;
use crate::sales::total_quantity;

/// Per-package price and the platform's commission cut
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pricing {
    pub unit_price: f64,
    pub commission_rate: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            unit_price: 30.0,
            commission_rate: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueForecast {
    pub month_to_date_qty: u64,
    pub elapsed_days: u32,
    pub days_in_month: u32,
    pub daily_average: f64,
    pub forecast_qty: f64,
    pub gross_revenue: f64,
    pub net_revenue: f64,
}

/// Linear extrapolation of `month_to_date_qty` over the whole month.
///
/// `elapsed_days` must be at least 1 and the commission rate within [0, 1].
pub fn forecast(
    month_to_date_qty: u64,
    elapsed_days: u32,
    days_in_month: u32,
    pricing: &Pricing,
) -> ReportResult<RevenueForecast> {
    if elapsed_days == 0 {
        return Err(ReportError::InvalidElapsedDays(elapsed_days));
    }
    if !(0.0..=1.0).contains(&pricing.commission_rate) {
        return Err(ReportError::InvalidCommissionRate(pricing.commission_rate));
    }

    let daily_average = month_to_date_qty as f64 / f64::from(elapsed_days);
    let forecast_qty = daily_average * f64::from(days_in_month);
    let gross_revenue = forecast_qty * pricing.unit_price;
    let net_revenue = gross_revenue * (1.0 - pricing.commission_rate);

    Ok(RevenueForecast {
        month_to_date_qty,
        elapsed_days,
        days_in_month,
        daily_average,
        forecast_qty,
        gross_revenue,
        net_revenue,
    })
}

/// Forecast for the month containing `today`, from records dated 1st..=today
pub fn forecast_month<'a, I>(
    records: I,
    today: NaiveDate,
    pricing: &Pricing,
) -> ReportResult<RevenueForecast>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let range = DateRange::month_to_date(today);
    let month_to_date_qty = total_quantity(filter_by_date(records, &range));
    forecast(month_to_date_qty, today.day(), days_in_month(today), pricing)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawOrderRow;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line(qty: &str, day: &str) -> OrderRecord {
        OrderRecord::from_raw(&RawOrderRow {
            sku: "A".into(),
            quantity: qty.into(),
            order_date: day.into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_linear_extrapolation() {
        let pricing = Pricing {
            unit_price: 10.0,
            commission_rate: 0.2,
        };
        let f = forecast(100, 10, 30, &pricing).unwrap();
        assert_eq!(f.daily_average, 10.0);
        assert_eq!(f.forecast_qty, 300.0);
        assert_eq!(f.gross_revenue, 3000.0);
        assert_eq!(f.net_revenue, 2400.0);
    }

    #[test]
    fn test_zero_elapsed_days_rejected() {
        let err = forecast(5, 0, 31, &Pricing::default()).unwrap_err();
        assert_eq!(err, ReportError::InvalidElapsedDays(0));
    }

    #[test]
    fn test_bad_commission_rejected() {
        let pricing = Pricing {
            unit_price: 10.0,
            commission_rate: 1.5,
        };
        assert!(matches!(
            forecast(5, 1, 31, &pricing),
            Err(ReportError::InvalidCommissionRate(_))
        ));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(date(2024, 2, 10)), 29);
        assert_eq!(days_in_month(date(2023, 2, 10)), 28);
        assert_eq!(days_in_month(date(2024, 12, 31)), 31);
        assert_eq!(days_in_month(date(2024, 4, 1)), 30);
    }

    #[test]
    fn test_forecast_month_uses_only_current_month() {
        let records = vec![
            line("10", "2024-04-01"),
            line("20", "2024-04-05"),
            line("99", "2024-03-31"),
            line("50", "2024-04-06"),
        ];
        let f = forecast_month(&records, date(2024, 4, 5), &Pricing::default()).unwrap();
        assert_eq!(f.month_to_date_qty, 30);
        assert_eq!(f.elapsed_days, 5);
        assert_eq!(f.days_in_month, 30);
        assert_eq!(f.forecast_qty, 180.0);
    }

    #[test]
    fn test_first_of_month() {
        let records = vec![line("3", "2024-05-01")];
        let f = forecast_month(&records, date(2024, 5, 1), &Pricing::default()).unwrap();
        assert_eq!(f.elapsed_days, 1);
        assert_eq!(f.forecast_qty, 93.0);
    }
}
