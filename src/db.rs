use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, Row};
use serde::Serialize;

use crate::error::{EtlError, Result};

pub const COL_RANK: &str = "Rank";
pub const COL_NAME: &str = "Bank name";
pub const COL_USD: &str = "Market cap (US$ billion)";
pub const COL_INR: &str = "Market cap (INR Billion)";
pub const COL_EUR: &str = "Market cap (EUR Billion)";
pub const COL_GBP: &str = "Market cap (GBP Billion)";

/// Canonical field names, in CSV header and SQL column order. Existing
/// consumers of the CSV and table read these names, so they stay fixed.
pub const COLUMNS: [&str; 6] = [COL_RANK, COL_NAME, COL_USD, COL_INR, COL_EUR, COL_GBP];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankRecord {
    #[serde(rename = "Rank")]
    pub rank: u32,
    #[serde(rename = "Bank name")]
    pub name: String,
    #[serde(rename = "Market cap (US$ billion)")]
    pub market_cap_usd: f64,
    #[serde(rename = "Market cap (INR Billion)")]
    pub market_cap_inr: f64,
    #[serde(rename = "Market cap (EUR Billion)")]
    pub market_cap_eur: f64,
    #[serde(rename = "Market cap (GBP Billion)")]
    pub market_cap_gbp: f64,
}

impl BankRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(BankRecord {
            rank: row.get(0)?,
            name: row.get(1)?,
            market_cap_usd: row.get(2)?,
            market_cap_inr: row.get(3)?,
            market_cap_eur: row.get(4)?,
            market_cap_gbp: row.get(5)?,
        })
    }
}

/// Quote an identifier for SQLite (`"..."`, embedded quotes doubled).
pub fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn select_columns() -> String {
    COLUMNS.iter().map(|c| ident(c)).collect::<Vec<_>>().join(", ")
}

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    Ok(conn)
}

/// Open a database some earlier load created; never creates a file.
pub fn open_existing(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        return Err(EtlError::MissingDatabase {
            path: path.display().to_string(),
        });
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(conn)
}

/// Drop and recreate `table`, then insert `records`, all in one transaction.
pub fn replace_table(conn: &mut Connection, table: &str, records: &[BankRecord]) -> Result<usize> {
    let table = ident(table);
    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} (
             {}  INTEGER NOT NULL UNIQUE,
             {}  TEXT NOT NULL,
             {}  REAL NOT NULL,
             {}  REAL NOT NULL,
             {}  REAL NOT NULL,
             {}  REAL NOT NULL
         );",
        ident(COL_RANK),
        ident(COL_NAME),
        ident(COL_USD),
        ident(COL_INR),
        ident(COL_EUR),
        ident(COL_GBP),
    ))?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {table} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            select_columns()
        ))?;
        for r in records {
            count += stmt.execute(params![
                r.rank,
                r.name,
                r.market_cap_usd,
                r.market_cap_inr,
                r.market_cap_eur,
                r.market_cap_gbp,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

/// Every stored record, ordered by rank.
pub fn read_all(conn: &Connection, table: &str) -> Result<Vec<BankRecord>> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY {}",
        select_columns(),
        ident(table),
        ident(COL_RANK)
    );
    query_records(conn, &sql, [])
}

pub(crate) fn query_records<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<BankRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, BankRecord::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Tests ──

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(rank: u32, name: &str, usd: f64, inr: f64) -> BankRecord {
        BankRecord {
            rank,
            name: name.to_string(),
            market_cap_usd: usd,
            market_cap_inr: inr,
            market_cap_eur: usd * 0.93,
            market_cap_gbp: usd * 0.8,
        }
    }

    fn sample() -> Vec<BankRecord> {
        vec![
            record(1, "JPMorgan Chase", 432.92, 35910.71),
            record(2, "Bank of America", 231.52, 19204.58),
            record(3, "Industrial and Commercial Bank of China", 194.56, 16138.75),
        ]
    }

    #[test]
    fn round_trip() {
        let mut conn = Connection::open_in_memory().unwrap();
        let records = sample();
        assert_eq!(replace_table(&mut conn, "banks", &records).unwrap(), 3);
        assert_eq!(read_all(&conn, "banks").unwrap(), records);
    }

    #[test]
    fn rerun_replaces_instead_of_appending() {
        let mut conn = Connection::open_in_memory().unwrap();
        replace_table(&mut conn, "banks", &sample()).unwrap();
        replace_table(&mut conn, "banks", &sample()).unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM banks", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn rerun_discards_previous_rows() {
        let mut conn = Connection::open_in_memory().unwrap();
        replace_table(&mut conn, "banks", &sample()).unwrap();
        let smaller = vec![record(1, "Only Bank", 1.0, 83.0)];
        replace_table(&mut conn, "banks", &smaller).unwrap();
        assert_eq!(read_all(&conn, "banks").unwrap(), smaller);
    }

    #[test]
    fn failed_load_keeps_previous_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        replace_table(&mut conn, "banks", &sample()).unwrap();
        // Duplicate rank violates the UNIQUE constraint mid-insert.
        let bad = vec![record(1, "A", 1.0, 1.0), record(1, "B", 2.0, 2.0)];
        assert!(replace_table(&mut conn, "banks", &bad).is_err());
        assert_eq!(read_all(&conn, "banks").unwrap(), sample());
    }

    #[test]
    fn stored_columns_keep_historic_names() {
        let mut conn = Connection::open_in_memory().unwrap();
        replace_table(&mut conn, "banks", &sample()).unwrap();
        let stmt = conn.prepare("SELECT * FROM banks").unwrap();
        assert_eq!(
            stmt.column_names(),
            [
                "Rank",
                "Bank name",
                "Market cap (US$ billion)",
                "Market cap (INR Billion)",
                "Market cap (EUR Billion)",
                "Market cap (GBP Billion)",
            ]
        );
        let inr: f64 = conn
            .query_row(
                "SELECT \"Market cap (INR Billion)\" FROM banks WHERE \"Rank\" = 1",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(inr, 35910.71);
    }

    #[test]
    fn open_existing_never_creates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/banks.db");
        let err = open_existing(&path).unwrap_err();
        assert!(matches!(err, EtlError::MissingDatabase { .. }));
        assert!(!dir.path().join("data").exists());

        let mut conn = connect(&path).unwrap();
        replace_table(&mut conn, "banks", &sample()).unwrap();
        drop(conn);
        let conn = open_existing(&path).unwrap();
        assert_eq!(read_all(&conn, "banks").unwrap().len(), 3);
    }

    #[test]
    fn ident_quotes() {
        assert_eq!(ident("Bank name"), "\"Bank name\"");
        assert_eq!(ident("a\"b"), "\"a\"\"b\"");
    }
}
