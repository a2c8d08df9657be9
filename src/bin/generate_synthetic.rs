//! Synthetic data generator for order, inventory and backlog sheets
//!
//! Produces the kind of dirty exports the report has to cope with: SKUs typed
//! with mixed case and slashes, phones with dashes, ".0" float artifacts or a
//! dropped leading zero, quantities like "2.0" or "n/a", a sprinkling of bad
//! dates, and installation lines with no shipping number.
//!
//! Usage:
//!   cargo run --release --bin generate_synthetic -- [OPTIONS]
//!
//! Options:
//!   --orders <N>         Order lines to generate (default: 2000)
//!   --days <N>           Spread orders over the last N days (default: 120)
//!   --today <DATE>       Anchor date, YYYY-MM-DD (default: today)
//!   --install-rate <F>   Share of lines without a shipping number (default: 0.2)
//!   --dirty-rate <F>     Share of cells written in a messy form (default: 0.25)
//!   --seed <N>           Random seed for reproducibility (optional)
//!   --columns <NAME>     Header preset, english or hebrew (default: english)
//!   --out-dir <PATH>     Output directory (default: data)

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::Parser;
use csv::WriterBuilder;
use order_pulse::config::ColumnMapping;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate_synthetic")]
#[command(about = "Generate dirty synthetic order, inventory and backlog CSVs")]
struct Args {
    /// Number of order lines
    #[arg(long, default_value = "2000")]
    orders: usize,

    /// Spread order dates over this many trailing days
    #[arg(long, default_value = "120")]
    days: i64,

    /// Anchor date (YYYY-MM-DD)
    #[arg(long)]
    today: Option<String>,

    /// Probability that a line is an installation (blank shipping number)
    #[arg(long, default_value = "0.2")]
    install_rate: f64,

    /// Probability that a cell is written in a messy form
    #[arg(long, default_value = "0.25")]
    dirty_rate: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Header preset (english, hebrew)
    #[arg(long, default_value = "english")]
    columns: String,

    /// Output directory
    #[arg(long, default_value = "data")]
    out_dir: PathBuf,
}

const SKUS: &[&str] = &[
    "WHITE/BLACK",
    "RED/BLUE",
    "GREEN 500",
    "BOX LARGE",
    "BOX SMALL",
    "CABLE 2M",
    "MOUNT KIT",
    "FILTER PACK",
    "SENSOR V2",
    "HUB PRO",
    "LAMP WARM",
    "LAMP COLD",
];

const FIRST_NAMES: &[&str] = &["Dana", "Yossi", "Noa", "Avi", "Maya", "Eitan", "Tamar", "Omer"];
const LAST_NAMES: &[&str] = &["Levi", "Cohen", "Mizrahi", "Peretz", "Biton", "Friedman"];
const CITIES: &[&str] = &["Tel Aviv", "Haifa", "Jerusalem", "Beer Sheva", "Eilat", "Netanya"];
const STREETS: &[&str] = &["Herzl", "Dizengoff", "Ben Yehuda", "Rothschild", "Jabotinsky"];

/// Popularity weight per SKU so rankings have a clear head and tail
fn sku_weight(index: usize) -> f64 {
    1.0 / (index as f64 + 1.0)
}

fn pick_sku(rng: &mut impl Rng) -> usize {
    let total: f64 = (0..SKUS.len()).map(sku_weight).sum();
    let mut roll = rng.gen::<f64>() * total;
    for i in 0..SKUS.len() {
        roll -= sku_weight(i);
        if roll <= 0.0 {
            return i;
        }
    }
    SKUS.len() - 1
}

/// Same SKU, different spelling
fn messy_sku(sku: &str, rng: &mut impl Rng) -> String {
    match rng.gen_range(0..4) {
        0 => sku.to_lowercase(),
        1 => sku.replace('/', "\\"),
        2 => format!("  {} ", sku.replace(' ', "  ")),
        _ => sku.replace('/', " / "),
    }
}

fn phone(rng: &mut impl Rng) -> String {
    format!("05{}{:07}", rng.gen_range(0..9), rng.gen_range(0..10_000_000u32))
}

/// Same phone, different spelling
fn messy_phone(phone: &str, rng: &mut impl Rng) -> String {
    let digits = &phone[1..];
    match rng.gen_range(0..3) {
        0 => format!("{}.0", digits),
        1 => format!("{}-{}-{}", &phone[..3], &phone[3..6], &phone[6..]),
        _ => format!("({}) {} {}", &phone[..3], &phone[3..6], &phone[6..]),
    }
}

fn messy_quantity(qty: u64, rng: &mut impl Rng) -> String {
    match rng.gen_range(0..5) {
        0 => format!("{}.0", qty),
        1 => format!("{}.7", qty),
        2 => "n/a".to_string(),
        3 => format!("-{}", qty),
        _ => String::new(),
    }
}

fn format_date(date: NaiveDate, rng: &mut impl Rng, dirty_rate: f64) -> String {
    if rng.gen_bool(dirty_rate / 10.0) {
        return ["", "soon", "32/13/2024", "TBD"]
            .choose(rng)
            .map(|s| s.to_string())
            .unwrap_or_default();
    }
    match rng.gen_range(0..4) {
        0 => date.format("%Y-%m-%d").to_string(),
        1 => date.format("%d/%m/%Y").to_string(),
        2 => date.format("%d.%m.%y").to_string(),
        _ => date.format("%Y-%m-%d 00:00:00").to_string(),
    }
}

fn choose<'a>(items: &[&'a str], rng: &mut impl Rng) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn main() -> Result<()> {
    let args = Args::parse();

    if !(0.0..=1.0).contains(&args.install_rate) || !(0.0..=1.0).contains(&args.dirty_rate) {
        bail!("--install-rate and --dirty-rate must be within 0.0 - 1.0");
    }
    let mapping = ColumnMapping::preset(&args.columns)
        .with_context(|| format!("unknown column preset '{}'", args.columns))?;
    let today = match &args.today {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("--today: can't read '{}'", raw))?,
        None => Local::now().date_naive(),
    };

    println!("🔧 Synthetic Data Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Order lines:      {}", args.orders);
    println!("Date span:        {} days up to {}", args.days, today);
    println!("Install rate:     {:.1}%", args.install_rate * 100.0);
    println!("Dirty rate:       {:.1}%", args.dirty_rate * 100.0);
    println!("Columns:          {}", args.columns);
    if let Some(seed) = args.seed {
        println!("Random seed:      {}", seed);
    }
    println!();

    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    std::fs::create_dir_all(&args.out_dir)?;

    // A fixed customer pool so repeat buyers show up in the customer ranking
    let customers: Vec<(String, String)> = (0..(args.orders / 8).max(5))
        .map(|_| {
            let name = format!("{} {}", choose(FIRST_NAMES, &mut rng), choose(LAST_NAMES, &mut rng));
            (name, phone(&mut rng))
        })
        .collect();

    println!("🏭 Generating orders...");
    let orders_path = args.out_dir.join("orders.csv");
    let mut writer = WriterBuilder::new().has_headers(false).from_path(&orders_path)?;
    let c = &mapping.orders;
    writer.write_record([
        &c.order_num,
        &c.customer_name,
        &c.phone,
        &c.city,
        &c.street,
        &c.house_num,
        &c.sku,
        &c.quantity,
        &c.shipping_num,
        &c.order_date,
    ])?;

    let mut sold = vec![0u64; SKUS.len()];
    for i in 0..args.orders {
        let (name, clean_phone) = &customers[rng.gen_range(0..customers.len())];
        let sku_index = pick_sku(&mut rng);
        let qty: u64 = rng.gen_range(1..=4);
        let date = today - Duration::days(rng.gen_range(0..args.days.max(1)));
        let dirty = |rng: &mut StdRng| rng.gen_bool(args.dirty_rate);

        let order_num = if dirty(&mut rng) {
            format!("{}.0", 10_000 + i)
        } else {
            (10_000 + i).to_string()
        };
        let phone_cell = if dirty(&mut rng) {
            messy_phone(clean_phone, &mut rng)
        } else {
            clean_phone.clone()
        };
        let sku_cell = if dirty(&mut rng) {
            messy_sku(SKUS[sku_index], &mut rng)
        } else {
            SKUS[sku_index].to_string()
        };
        let qty_cell = if rng.gen_bool(args.dirty_rate / 5.0) {
            messy_quantity(qty, &mut rng)
        } else {
            sold[sku_index] += qty;
            qty.to_string()
        };
        let shipping = if rng.gen_bool(args.install_rate) {
            String::new()
        } else {
            format!("SH{:06}", rng.gen_range(0..1_000_000))
        };

        writer.write_record([
            order_num,
            name.clone(),
            phone_cell,
            choose(CITIES, &mut rng).to_string(),
            choose(STREETS, &mut rng).to_string(),
            rng.gen_range(1..200).to_string(),
            sku_cell,
            qty_cell,
            shipping,
            format_date(date, &mut rng, args.dirty_rate),
        ])?;
    }
    writer.flush()?;

    // Stock roughly proportional to sales, with a few dead and a few empty shelves
    println!("📦 Generating inventory...");
    let inventory_path = args.out_dir.join("inventory.csv");
    let mut writer = WriterBuilder::new().has_headers(false).from_path(&inventory_path)?;
    writer.write_record([&mapping.inventory.sku, &mapping.inventory.quantity])?;
    for (i, sku) in SKUS.iter().enumerate() {
        let stock = match rng.gen_range(0..10) {
            0 => 0,
            1 => rng.gen_range(1..20) + sold[i] * 2,
            _ => (sold[i] as f64 * rng.gen_range(0.05..0.8)) as u64,
        };
        writer.write_record([sku.to_string(), stock.to_string()])?;
    }
    writer.write_record(["OLD MODEL", "37"])?;
    writer.flush()?;

    println!("📝 Generating backlog...");
    let backlog_path = args.out_dir.join("backlog.csv");
    let mut writer = WriterBuilder::new().has_headers(false).from_path(&backlog_path)?;
    writer.write_record([&mapping.backlog.sku, &mapping.backlog.quantity])?;
    let mut backlog_lines = 0;
    for sku in SKUS.iter() {
        if rng.gen_bool(0.4) {
            for _ in 0..rng.gen_range(1..3) {
                writer.write_record([messy_sku(sku, &mut rng), rng.gen_range(1..15).to_string()])?;
                backlog_lines += 1;
            }
        }
    }
    writer.flush()?;

    println!("\n✅ Generation complete!");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Order lines:       {:>8}  {}", args.orders, orders_path.display());
    println!("Inventory SKUs:    {:>8}  {}", SKUS.len() + 1, inventory_path.display());
    println!("Backlog lines:     {:>8}  {}", backlog_lines, backlog_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_pulse::normalize::{normalize_phone, normalize_sku};

    #[test]
    fn test_messy_phone_normalizes_to_clean_phone() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let clean = phone(&mut rng);
            let messy = messy_phone(&clean, &mut rng);
            assert_eq!(normalize_phone(&messy), normalize_phone(&clean), "{:?} vs {:?}", messy, clean);
        }
    }

    #[test]
    fn test_messy_sku_normalizes_to_clean_sku() {
        let mut rng = StdRng::seed_from_u64(42);
        for sku in SKUS.iter().cycle().take(100) {
            let messy = messy_sku(sku, &mut rng);
            assert_eq!(normalize_sku(&messy), normalize_sku(sku), "{:?} vs {:?}", messy, sku);
        }
    }
}
