use rusqlite::{params, Connection};
use tracing::info;

use crate::db::{self, ident, BankRecord, COL_INR, COL_NAME, COL_RANK, COL_USD};
use crate::error::Result;
use crate::settings::Settings;

/// Results of the three fixed report queries.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResults {
    pub top_by_inr: Vec<BankRecord>,
    /// Mean USD market cap; `None` when the table is empty.
    pub average_usd: Option<f64>,
    pub above_inr_threshold: Vec<BankRecord>,
    pub threshold: f64,
}

/// Largest INR market caps first, ties by bank name, at most `limit` rows.
pub fn top_by_inr(conn: &Connection, table: &str, limit: usize) -> Result<Vec<BankRecord>> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY {} DESC, {} ASC LIMIT ?1",
        db::select_columns(),
        ident(table),
        ident(COL_INR),
        ident(COL_NAME),
    );
    db::query_records(conn, &sql, params![limit as i64])
}

pub fn average_usd(conn: &Connection, table: &str) -> Result<Option<f64>> {
    let sql = format!("SELECT AVG({}) FROM {}", ident(COL_USD), ident(table));
    // AVG over zero rows is NULL.
    let avg: Option<f64> = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(avg)
}

/// Rows with INR market cap strictly above `threshold`, by rank.
pub fn above_inr(conn: &Connection, table: &str, threshold: f64) -> Result<Vec<BankRecord>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} > ?1 ORDER BY {}",
        db::select_columns(),
        ident(table),
        ident(COL_INR),
        ident(COL_RANK),
    );
    db::query_records(conn, &sql, params![threshold])
}

/// Open the stored database, run all three queries, and close it again.
pub fn run_queries(settings: &Settings) -> Result<QueryResults> {
    let conn = db::open_existing(&settings.db_path)?;
    let table = &settings.table_name;
    let results = QueryResults {
        top_by_inr: top_by_inr(&conn, table, settings.top_n)?,
        average_usd: average_usd(&conn, table)?,
        above_inr_threshold: above_inr(&conn, table, settings.inr_threshold)?,
        threshold: settings.inr_threshold,
    };
    info!(
        top = results.top_by_inr.len(),
        above_threshold = results.above_inr_threshold.len(),
        "Queries executed successfully"
    );
    Ok(results)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::replace_table;
    use crate::db::tests::record;

    fn conn_with(records: &[BankRecord]) -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        replace_table(&mut conn, "banks", records).unwrap();
        conn
    }

    #[test]
    fn top_returns_five_in_descending_order() {
        let records: Vec<_> = (1..=8)
            .map(|i| record(i, &format!("Bank {i}"), i as f64, (i * 1000) as f64))
            .collect();
        let top = top_by_inr(&conn_with(&records), "banks", 5).unwrap();
        assert_eq!(top.len(), 5);
        assert!(top.windows(2).all(|w| w[0].market_cap_inr >= w[1].market_cap_inr));
        assert_eq!(top[0].name, "Bank 8");
    }

    #[test]
    fn top_breaks_ties_by_name() {
        let records = vec![
            record(1, "Zeta", 1.0, 500.0),
            record(2, "Alpha", 1.0, 500.0),
            record(3, "Mid", 1.0, 700.0),
        ];
        let top = top_by_inr(&conn_with(&records), "banks", 5).unwrap();
        let names: Vec<&str> = top.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn average_of_base_field() {
        let records = vec![
            record(1, "A", 10.0, 1.0),
            record(2, "B", 20.0, 1.0),
            record(3, "C", 30.0, 1.0),
        ];
        let avg = average_usd(&conn_with(&records), "banks").unwrap();
        assert_eq!(avg, Some(20.0));
    }

    #[test]
    fn average_of_empty_table() {
        assert_eq!(average_usd(&conn_with(&[]), "banks").unwrap(), None);
    }

    #[test]
    fn threshold_is_strict() {
        let records = vec![
            record(1, "A", 1.0, 4000.0),
            record(2, "B", 1.0, 5000.0),
            record(3, "C", 1.0, 6000.0),
        ];
        let rows = above_inr(&conn_with(&records), "banks", 5000.0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].market_cap_inr, 6000.0);
    }

    #[test]
    fn queries_see_latest_load() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            db_path: dir.path().join("banks.db"),
            ..Settings::default()
        };
        let mut conn = db::connect(&settings.db_path).unwrap();
        replace_table(&mut conn, "banks", &[record(1, "Old", 100.0, 9000.0)]).unwrap();
        drop(conn);
        assert_eq!(run_queries(&settings).unwrap().top_by_inr[0].name, "Old");

        let mut conn = db::connect(&settings.db_path).unwrap();
        replace_table(&mut conn, "banks", &[record(1, "New", 50.0, 100.0)]).unwrap();
        drop(conn);
        let results = run_queries(&settings).unwrap();
        assert_eq!(results.top_by_inr[0].name, "New");
        assert_eq!(results.average_usd, Some(50.0));
        assert!(results.above_inr_threshold.is_empty());
    }
}
