//! Writes a demo ledger as `sample_ledger.csv` and `sample_ledger.parquet`.
//!
//! The columns exercise every filter control: `region` and `quantity` are
//! low-cardinality (multi-select), `amount` is numeric (slider), `issued` is a
//! date column stored as text (date range) and `invoice`/`customer` are free
//! text.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Days, NaiveDate};
use parquet::arrow::ArrowWriter;

/// splitmix64, deterministic across runs.
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

struct Ledger {
    invoice: Vec<String>,
    customer: Vec<String>,
    region: Vec<String>,
    quantity: Vec<i64>,
    amount: Vec<f64>,
    issued: Vec<String>,
}

fn generate(rows: usize, rng: &mut Rng) -> Ledger {
    const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
    const CUSTOMERS: [&str; 6] = ["Acme", "Globex", "Initech", "Umbrella", "Hooli", "Stark"];
    let first_day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();

    let mut ledger = Ledger {
        invoice: Vec::with_capacity(rows),
        customer: Vec::with_capacity(rows),
        region: Vec::with_capacity(rows),
        quantity: Vec::with_capacity(rows),
        amount: Vec::with_capacity(rows),
        issued: Vec::with_capacity(rows),
    };
    for i in 0..rows {
        let quantity = 1 + rng.below(5) as i64;
        let unit_price = 20.0 + rng.unit() * 480.0;
        let day = first_day + Days::new(rng.below(365) as u64);

        ledger.invoice.push(format!("INV-{:04}", i + 1));
        ledger
            .customer
            .push(format!("{} {}", CUSTOMERS[rng.below(CUSTOMERS.len())], 100 + rng.below(900)));
        ledger.region.push(REGIONS[rng.below(REGIONS.len())].to_string());
        ledger.quantity.push(quantity);
        ledger.amount.push((unit_price * quantity as f64 * 100.0).round() / 100.0);
        ledger.issued.push(day.format("%Y-%m-%d").to_string());
    }
    ledger
}

fn write_csv(ledger: &Ledger, path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(["invoice", "customer", "region", "quantity", "amount", "issued"])?;
    for i in 0..ledger.invoice.len() {
        let quantity = ledger.quantity[i].to_string();
        let amount = ledger.amount[i].to_string();
        writer.write_record([
            ledger.invoice[i].as_str(),
            ledger.customer[i].as_str(),
            ledger.region[i].as_str(),
            quantity.as_str(),
            amount.as_str(),
            ledger.issued[i].as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(ledger: &Ledger, path: &str) -> Result<()> {
    let text = |values: &[String]| -> ArrayRef {
        Arc::new(StringArray::from(
            values.iter().map(String::as_str).collect::<Vec<_>>(),
        ))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("invoice", DataType::Utf8, false),
        Field::new("customer", DataType::Utf8, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("quantity", DataType::Int64, false),
        Field::new("amount", DataType::Float64, false),
        Field::new("issued", DataType::Utf8, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        text(&ledger.invoice),
        text(&ledger.customer),
        text(&ledger.region),
        Arc::new(Int64Array::from(ledger.quantity.clone())),
        Arc::new(Float64Array::from(ledger.amount.clone())),
        text(&ledger.issued),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = Rng(42);
    let ledger = generate(250, &mut rng);

    write_csv(&ledger, "sample_ledger.csv")?;
    write_parquet(&ledger, "sample_ledger.parquet")?;

    println!(
        "Wrote {} ledger rows to sample_ledger.csv and sample_ledger.parquet",
        ledger.invoice.len()
    );
    Ok(())
}
