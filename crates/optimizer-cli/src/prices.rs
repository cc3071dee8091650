use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use portfolio_core::{PriceRow, PriceTable};

pub fn load_price_table(path: &Path) -> Result<PriceTable> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    parse_price_csv(file).with_context(|| format!("cannot read prices from {}", path.display()))
}

/// Parse closing prices.
/// Expected header: date, then one column per ticker. Empty cells are missing prices.
pub fn parse_price_csv<R: Read>(source: R) -> Result<PriceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let mut columns = headers.iter();
    match columns.next() {
        Some(first) if first.eq_ignore_ascii_case("date") => {}
        Some(first) => bail!("first column must be 'date', found '{first}'"),
        None => bail!("CSV has no header row"),
    }
    let tickers: Vec<String> = columns.map(|t| t.to_uppercase()).collect();

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("malformed record {}", line + 1))?;
        let raw_date = record.get(0).unwrap_or("");
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{raw_date}' in record {}", line + 1))?;

        let closes = record
            .iter()
            .skip(1)
            .map(|cell| {
                if cell.is_empty() {
                    Ok(f64::NAN)
                } else {
                    cell.parse::<f64>()
                        .with_context(|| format!("invalid price '{cell}' on {date}"))
                }
            })
            .collect::<Result<Vec<f64>>>()?;

        rows.push(PriceRow::new(date, closes));
    }

    Ok(PriceTable::new(tickers, rows)?)
}
