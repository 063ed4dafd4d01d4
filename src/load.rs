use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::db::{self, BankRecord};
use crate::error::Result;
use crate::settings::Settings;

/// Write `records` as CSV with the canonical header, replacing `path`.
///
/// Rows go to a sibling `.tmp` file first and are renamed into place, so an
/// interrupted write never leaves a truncated file behind.
pub fn write_csv(path: &Path, records: &[BankRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    let result = (|| -> Result<()> {
        // Header is written explicitly so an empty record set still has one.
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp)?;
        wtr.write_record(db::COLUMNS)?;
        for r in records {
            wtr.serialize(r)?;
        }
        wtr.flush()?;
        Ok(())
    })();
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Persist to the CSV file and the SQLite table. The connection is closed on return.
pub fn load(settings: &Settings, records: &[BankRecord]) -> Result<()> {
    write_csv(&settings.csv_path, records)?;
    info!("Data loaded to CSV file: {}", settings.csv_path.display());

    let mut conn = db::connect(&settings.db_path)?;
    let rows = db::replace_table(&mut conn, &settings.table_name, records)?;
    info!(
        rows,
        table = %settings.table_name,
        "Data loaded to SQLite database: {}",
        settings.db_path.display()
    );
    Ok(())
}
