//! Order Report - orders, sales rankings, stock health and forecast
//!
//! Run: ./target/release/order_pulse [section] --orders data/orders.csv \
//!          --inventory data/inventory.csv --backlog data/backlog.csv
//! Sections: all, kpi, orders, sales, customers, trending, inventory, backlog, forecast

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use order_pulse::config::{ColumnMapping, ReportConfig};
use order_pulse::filter::{date_bounds, DateFilter, DateRange, SearchField, DISPLAY_DATE_FORMAT};
use order_pulse::loader::{load_orders, load_orders_json, load_stock_rows};
use order_pulse::normalize::normalize_date;
use order_pulse::{build_report, InventorySnapshot, PreOrderBacklog, Report, ReportRequest, SnapshotStore};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "order_pulse")]
#[command(about = "Order, sales and inventory report")]
struct Args {
    /// Section to print (all, kpi, orders, sales, customers, trending, inventory, backlog, forecast)
    #[arg(default_value = "all")]
    section: String,

    /// Order lines, CSV or a JSON array of rows
    #[arg(long, default_value = "data/orders.csv")]
    orders: PathBuf,

    /// Inventory sheet (CSV)
    #[arg(long)]
    inventory: Option<PathBuf>,

    /// Pre-order backlog table (CSV)
    #[arg(long)]
    backlog: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Column preset (english, hebrew); overrides the config file's mapping
    #[arg(long)]
    columns: Option<String>,

    /// Start date (DD/MM/YYYY or YYYY-MM-DD), defaults to the 1st of the month
    #[arg(long)]
    from: Option<String>,

    /// End date, defaults to today
    #[arg(long)]
    to: Option<String>,

    /// Search term
    #[arg(long)]
    search: Option<String>,

    /// Field to search (all, order, sku, customer, phone)
    #[arg(long, default_value = "all")]
    field: String,

    /// Override today's date
    #[arg(long)]
    today: Option<String>,

    /// Rows per ranking
    #[arg(long)]
    top: Option<usize>,

    /// Print the whole report as JSON
    #[arg(long)]
    json: bool,
}

fn print_section_header(title: &str) {
    println!("\n{}", "═".repeat(80));
    println!("  {}", title);
    println!("{}\n", "═".repeat(80));
}

fn print_subsection(title: &str) {
    println!("\n{}", title);
    println!("{}", "─".repeat(70));
}

fn parse_date_arg(name: &str, raw: &str) -> Result<NaiveDate> {
    match normalize_date(raw) {
        Some(date) => Ok(date),
        None => bail!("--{}: can't read '{}' as a date", name, raw),
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("opening {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ReportConfig::from_path(path)?,
        None => ReportConfig::default(),
    };
    if let Some(preset) = &args.columns {
        config.columns = ColumnMapping::preset(preset)
            .with_context(|| format!("unknown column preset '{}'", preset))?;
    }
    if let Some(top) = args.top {
        config.top_n = top;
    }

    let today = match &args.today {
        Some(raw) => parse_date_arg("today", raw)?,
        None => Local::now().date_naive(),
    };

    let mut store = SnapshotStore::new();

    let orders_path = args.orders.clone();
    let order_columns = config.columns.orders.clone();
    store.refresh_orders(|| -> Result<_> {
        let file = open(&orders_path)?;
        let is_json = orders_path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let outcome = if is_json {
            load_orders_json(file)?
        } else {
            load_orders(file, &order_columns)?
        };
        Ok(outcome.rows)
    })?;

    if let Some(path) = &args.inventory {
        let columns = config.columns.inventory.clone();
        let refreshed = store.refresh_inventory(|| -> Result<_> {
            let rows = load_stock_rows(open(path)?, &columns)?;
            Ok(InventorySnapshot::from_rows(&rows, today))
        });
        if let Err(e) = refreshed {
            warn!("Continuing without inventory: {}", e);
        }
    }

    if let Some(path) = &args.backlog {
        let columns = config.columns.backlog.clone();
        let refreshed = store.refresh_backlog(|| -> Result<_> {
            let rows = load_stock_rows(open(path)?, &columns)?;
            Ok(PreOrderBacklog::from_rows(&rows))
        });
        if let Err(e) = refreshed {
            warn!("Continuing without backlog: {}", e);
        }
    }

    let default_range = DateRange::month_to_date(today);
    let mut date_filter = DateFilter::new(default_range);
    if args.from.is_some() || args.to.is_some() {
        let start = match &args.from {
            Some(raw) => parse_date_arg("from", raw)?,
            None => default_range.start(),
        };
        let end = match &args.to {
            Some(raw) => parse_date_arg("to", raw)?,
            None => today,
        };
        if let Err(e) = date_filter.apply(start, end) {
            warn!("{} - showing {} instead", e, date_filter.range());
        }
    }

    let snapshot = store.current();
    let user_range = args.from.is_some() || args.to.is_some();
    if let Some((first, last)) = date_bounds(snapshot.records.iter()) {
        let range = date_filter.range();
        if user_range && (range.start() < first || range.end() > last) {
            warn!(
                "Selected period {} extends past the data ({} - {})",
                range,
                first.format(DISPLAY_DATE_FORMAT),
                last.format(DISPLAY_DATE_FORMAT)
            );
        }
    }

    let field: SearchField = args.field.parse().map_err(anyhow::Error::msg)?;
    let mut request = ReportRequest::new(today)
        .with_search(field, args.search.clone().unwrap_or_default());
    request.range = *date_filter.range();

    info!(
        "Reporting on generation {} ({} order lines)",
        snapshot.generation,
        snapshot.records.len()
    );
    let report = build_report(&snapshot, &request, &config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{}", "█".repeat(80));
    println!("{}  ORDER REPORT  {}", "█".repeat(32), "█".repeat(32));
    println!("{}\n", "█".repeat(80));
    println!("  Period: {}   Today: {}", report.range, today.format(DISPLAY_DATE_FORMAT));
    match report.bounds {
        Some((first, last)) => println!(
            "  Data:   {} - {}",
            first.format(DISPLAY_DATE_FORMAT),
            last.format(DISPLAY_DATE_FORMAT)
        ),
        None => println!("  Data:   (no order lines)"),
    }
    if !report.search_term.is_empty() {
        println!("  Search: {:?} in {:?}", report.search_term, report.search_field);
    }

    match args.section.as_str() {
        "all" => {
            print_kpis(&report);
            print_sales(&report);
            print_customers(&report);
            print_trending(&report);
            print_inventory(&report);
            print_backlog(&report);
            print_forecast(&report);
        }
        "kpi" => print_kpis(&report),
        "orders" => print_orders(&report),
        "sales" => print_sales(&report),
        "customers" => print_customers(&report),
        "trending" => print_trending(&report),
        "inventory" => print_inventory(&report),
        "backlog" => print_backlog(&report),
        "forecast" => print_forecast(&report),
        _ => {
            println!("Unknown section: {}", args.section);
            println!("Available: all, kpi, orders, sales, customers, trending, inventory, backlog, forecast");
        }
    }

    println!("\n{}", "█".repeat(80));
    Ok(())
}

fn print_kpis(report: &Report) {
    print_section_header("1. HEADLINE NUMBERS");
    let k = &report.kpis;
    println!("  Total Lines:          {:>12}", k.total_lines);
    println!("  Regular Orders:       {:>12}", k.regular_lines);
    println!("  Installations:        {:>12}", k.installation_lines);
    println!("  Regular Packages:     {:>12}", k.regular_qty);
    println!("  Installation Units:   {:>12}", k.installation_qty);
    println!("  Total Units:          {:>12}", k.total_qty());
}

fn print_orders(report: &Report) {
    print_section_header(&format!("ORDER LINES ({} results)", report.orders.len()));
    println!(
        "  {:12} {:20} {:12} {:14} {:18} {:>5} {:12}",
        "Date", "Customer", "Phone", "City", "SKU", "Qty", "Shipping"
    );
    println!("  {}", "─".repeat(100));
    for r in &report.orders {
        println!(
            "  {:12} {:20} {:12} {:14} {:18} {:>5} {:12}",
            r.order_date.format(DISPLAY_DATE_FORMAT).to_string(),
            truncate(&r.customer_name, 20),
            r.phone,
            truncate(&r.city, 14),
            truncate(&r.sku, 18),
            r.quantity,
            if r.shipping_num.is_empty() { "(install)" } else { r.shipping_num.as_str() }
        );
    }
}

fn print_sales(report: &Report) {
    print_section_header("2. TOP SKUs IN PERIOD");
    println!("  {:>4} {:28} {:>10} {:>8} {:>9}", "Rank", "SKU", "Units", "Lines", "Share");
    println!("  {}", "─".repeat(63));
    for s in &report.top_skus {
        println!(
            "  {:>4} {:28} {:>10} {:>8} {:>8.1}%",
            s.rank,
            truncate(&s.key, 28),
            s.total_quantity,
            s.record_count,
            s.market_share
        );
    }
}

fn print_customers(report: &Report) {
    print_section_header("3. TOP CUSTOMERS IN PERIOD");
    println!("  {:32} {:>10} {:>8}", "Customer", "Units", "Lines");
    println!("  {}", "─".repeat(52));
    for c in &report.top_customers {
        println!("  {:32} {:>10} {:>8}", truncate(&c.key, 32), c.total_quantity, c.record_count);
    }
}

fn print_trending(report: &Report) {
    print_section_header("4. TRAILING WINDOW");

    print_subsection("Best Sellers");
    for s in &report.trending_skus {
        println!(
            "  {:>3}. {:28} {:>8} units {:>6.1}%",
            s.rank,
            truncate(&s.key, 28),
            s.total_quantity,
            s.market_share
        );
    }

    print_subsection("Weak SKUs");
    if report.weak_skus.is_empty() {
        println!("  (none)");
    }
    for w in &report.weak_skus {
        println!("  {:28} {:>8} units", truncate(&w.key, 28), w.total_quantity);
    }
}

fn print_inventory(report: &Report) {
    print_section_header("5. INVENTORY HEALTH");
    let inv = match report.inventory.as_option() {
        Some(inv) => inv,
        None => {
            println!("  Inventory analysis unavailable (no snapshot loaded)");
            return;
        }
    };

    println!(
        "  Snapshot: {}   Window: {} days",
        inv.snapshot_date.format(DISPLAY_DATE_FORMAT),
        inv.window_days
    );
    println!(
        "  Dead: {}   Critical: {}   Low: {}   Healthy: {}",
        inv.summary.dead, inv.summary.critical, inv.summary.low, inv.summary.healthy
    );

    print_subsection("By SKU");
    println!(
        "  {:24} {:>9} {:>9} {:>9} {:>10} {:>9}",
        "SKU", "Stock", "Sold", "Per Day", "Days Left", "Status"
    );
    println!("  {}", "─".repeat(76));
    let mut rows: Vec<_> = inv.rows.iter().collect();
    rows.sort_by(|a, b| a.status.cmp(&b.status).then_with(|| a.sku.cmp(&b.sku)));
    for r in rows {
        println!(
            "  {:24} {:>9} {:>9} {:>9.2} {:>10} {:>9}",
            truncate(&r.sku, 24),
            r.available_qty,
            r.window_sales,
            r.daily_velocity,
            r.days_of_supply.to_string(),
            r.status.label()
        );
    }

    if !inv.unstocked_skus.is_empty() {
        print_subsection("Selling But Not In Snapshot");
        for sku in &inv.unstocked_skus {
            println!("  {}", sku);
        }
    }
}

fn print_backlog(report: &Report) {
    print_section_header("6. PRE-ORDER BACKLOG");
    let rows = match report.backlog.as_option() {
        Some(rows) => rows,
        None => {
            println!("  Backlog unavailable (no table loaded)");
            return;
        }
    };
    if rows.is_empty() {
        println!("  No open pre-orders");
        return;
    }

    println!("  {:28} {:>12} {:>12}", "SKU", "Promised", "In Stock");
    println!("  {}", "─".repeat(54));
    for r in rows {
        let stock = r
            .available_qty
            .map(|q| q.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:28} {:>12} {:>12}", truncate(&r.sku, 28), r.backlog_qty, stock);
    }
}

fn print_forecast(report: &Report) {
    print_section_header("7. MONTH-END FORECAST");
    match report.forecast.as_option() {
        Some(f) => {
            println!("  Month-to-date Units:  {:>12}", f.month_to_date_qty);
            println!("  Days Elapsed:         {:>9} / {}", f.elapsed_days, f.days_in_month);
            println!("  Daily Average:        {:>12.2}", f.daily_average);
            println!("  Forecast Units:       {:>12.0}", f.forecast_qty);
            println!("  Gross Revenue:        {:>12.2}", f.gross_revenue);
            println!("  Net Revenue:          {:>12.2}", f.net_revenue);
        }
        None => {
            if let order_pulse::Section::Unavailable { reason } = &report.forecast {
                println!("  Forecast unavailable: {}", reason);
            }
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}
