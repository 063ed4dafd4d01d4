pub mod rates;
pub mod table;

use std::collections::HashSet;

use tracing::info;

use crate::db::{BankRecord, COL_RANK, COL_USD};
use crate::error::{EtlError, Result};
use crate::extract::TableFragment;
use rates::{ExchangeRates, TargetRates};
use table::{clean_number, parse_rows, RawRow};

/// Source columns: rank, bank name, market cap in US$ billion.
const SOURCE_COLUMNS: usize = 3;

/// Table fragment → typed records with GBP/EUR/INR columns.
///
/// Target rates are resolved before any row is read, so a missing currency
/// fails the run without producing partial output.
pub fn transform(fragment: &TableFragment, rates: &ExchangeRates) -> Result<Vec<BankRecord>> {
    let targets = rates.targets()?;
    let rows = parse_rows(fragment);

    let mut seen = HashSet::with_capacity(rows.len());
    let mut records = Vec::with_capacity(rows.len());
    for raw in &rows {
        let record = to_record(raw, &targets)?;
        if !seen.insert(record.rank) {
            return Err(EtlError::DuplicateRank {
                row: raw.row,
                rank: record.rank,
            });
        }
        records.push(record);
    }

    info!(rows = records.len(), "Transformed bank records");
    Ok(records)
}

fn to_record(raw: &RawRow, targets: &TargetRates) -> Result<BankRecord> {
    let [rank, name, usd] = raw.cells.as_slice() else {
        return Err(EtlError::MalformedRow {
            row: raw.row,
            cells: raw.cells.len(),
            expected: SOURCE_COLUMNS,
        });
    };

    let rank = rank
        .trim()
        .parse::<u32>()
        .map_err(|_| EtlError::Coercion {
            row: raw.row,
            column: COL_RANK,
            value: rank.clone(),
        })?;
    let market_cap_usd = clean_number(usd)
        .filter(|v| *v >= 0.0)
        .ok_or_else(|| EtlError::Coercion {
            row: raw.row,
            column: COL_USD,
            value: usd.clone(),
        })?;

    Ok(BankRecord {
        rank,
        name: name.clone(),
        market_cap_usd,
        market_cap_inr: market_cap_usd * targets.inr,
        market_cap_eur: market_cap_usd * targets.eur,
        market_cap_gbp: market_cap_usd * targets.gbp,
    })
}

// ── Tests ──
