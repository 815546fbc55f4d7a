//! Header-addressed CSV tables with atomic replacement.

use crate::error::StoreError;
use leadflow_paths::lock_path;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub type Row = BTreeMap<String, String>;

/// In-memory copy of one CSV file. Column order is kept from `headers`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn with_headers(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Rename a column in the header and in every row.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        for header in &mut self.headers {
            if header == from {
                *header = to.to_string();
            }
        }
        for row in &mut self.rows {
            if let Some(value) = row.remove(from) {
                row.insert(to.to_string(), value);
            }
        }
    }

    /// Put the declared columns first, add missing ones with their default and
    /// keep unknown columns after them in their original order.
    pub fn conform(&mut self, declared: &[&str], defaults: &[(&str, &str)]) {
        let default_for = |column: &str| {
            defaults
                .iter()
                .find(|(name, _)| *name == column)
                .map(|(_, value)| *value)
                .unwrap_or("")
        };

        for column in declared {
            if !self.has_column(column) {
                let value = default_for(column);
                for row in &mut self.rows {
                    row.insert(column.to_string(), value.to_string());
                }
            }
        }

        let extras: Vec<String> = self
            .headers
            .iter()
            .filter(|h| !declared.contains(&h.as_str()))
            .cloned()
            .collect();
        self.headers = declared.iter().map(|c| c.to_string()).chain(extras).collect();
    }

    /// Columns not in `declared`, in file order.
    pub fn extra_columns(&self, declared: &[&str]) -> Vec<String> {
        self.headers
            .iter()
            .filter(|h| !declared.contains(&h.as_str()))
            .cloned()
            .collect()
    }
}

/// Value of `column` in `row`, empty when absent.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or("")
}

/// Row to write back for a record decoded from `stored`.
///
/// `previous` is the encoding of `stored` as it was decoded and `fresh` the
/// encoding of the record now. An unchanged record keeps `stored` verbatim.
/// Otherwise only cells whose value changed are replaced, plus the `derived`
/// columns, so unreadable or legacy text in untouched cells survives.
pub fn merge_row(stored: &Row, previous: &Row, fresh: Row, derived: &[&str]) -> Row {
    if *previous == fresh {
        return stored.clone();
    }
    let mut row = stored.clone();
    for (column, value) in fresh {
        if derived.contains(&column.as_str()) || previous.get(&column) != Some(&value) {
            row.insert(column, value);
        }
    }
    row
}

/// Read a table. Returns `None` when the file does not exist.
pub fn read_table(path: &Path) -> Result<Option<Table>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_string()
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(row);
    }

    debug!(path = %path.display(), rows = rows.len(), "loaded table");
    Ok(Some(Table { headers, rows }))
}

/// Read a table, materializing an empty one with `declared` headers when the
/// file is missing.
pub fn read_or_create(
    path: &Path,
    declared: &[&str],
    lock_timeout: Duration,
) -> Result<Table, StoreError> {
    match read_table(path)? {
        Some(table) => Ok(table),
        None => {
            let table = Table::with_headers(declared);
            write_table(path, &table, lock_timeout)?;
            Ok(table)
        }
    }
}

pub fn encode_table(table: &Table) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(table.headers.iter().map(|h| cell(row, h)))?;
    }
    writer
        .into_inner()
        .map_err(|e| StoreError::Io(e.into_error()))
}

/// Serialize and atomically replace `path` while holding its advisory lock.
pub fn write_table(path: &Path, table: &Table, lock_timeout: Duration) -> Result<(), StoreError> {
    let bytes = encode_table(table)?;
    let _lock = acquire_lock(path, lock_timeout)?;
    write_atomic(path, &bytes)?;
    debug!(path = %path.display(), rows = table.rows.len(), "wrote table");
    Ok(())
}

/// Write to a temporary file in the target directory, then rename it over
/// the target. Readers see either the old or the new content.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::NoParent(path.to_path_buf()))?;
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;

    if let Ok(dir) = fs::File::open(parent) {
        let _ = dir.sync_all();
    }
    Ok(())
}

/// Exclusive advisory lock, released on drop.
#[derive(Debug)]
pub struct TableLock {
    path: PathBuf,
}

impl Drop for TableLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Take the advisory lock next to `table`.
///
/// Best-effort: when another holder keeps it past `timeout` this logs a
/// warning and returns `None` so the caller writes anyway.
pub fn acquire_lock(table: &Path, timeout: Duration) -> Result<Option<TableLock>, StoreError> {
    let path = lock_path(table);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let started = Instant::now();
    loop {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => return Ok(Some(TableLock { path })),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if started.elapsed() >= timeout {
                    warn!(
                        lock = %path.display(),
                        "timed out waiting for table lock; writing without it"
                    );
                    return Ok(None);
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(200);

    #[test]
    fn missing_file_is_materialized_with_headers() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("nested").join("t.csv");

        let table = read_or_create(&path, &["a", "b"], TIMEOUT).expect("read");
        assert!(table.rows.is_empty());
        let text = fs::read_to_string(&path).expect("read file");
        assert_eq!(text.trim(), "a,b");
    }

    #[test]
    fn short_rows_and_bom_are_tolerated() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("t.csv");
        fs::write(&path, "\u{feff}a,b,c\n1,2\n,,\n4,5,6\n").expect("write");

        let table = read_table(&path).expect("read").expect("present");
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(cell(&table.rows[0], "c"), "");
        assert_eq!(cell(&table.rows[1], "c"), "6");
    }

    #[test]
    fn merge_keeps_stored_text_of_unchanged_cells() {
        let row = |pairs: &[(&str, &str)]| -> Row {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        let stored = row(&[("fecha", "03/15/2024"), ("notas", "hola"), ("score", "0")]);
        let previous = row(&[("fecha", ""), ("notas", "hola"), ("score", "10")]);

        let untouched = merge_row(&stored, &previous, previous.clone(), &["score"]);
        assert_eq!(untouched, stored);

        let edited = row(&[("fecha", ""), ("notas", "adiós"), ("score", "10")]);
        let merged = merge_row(&stored, &previous, edited, &["score"]);
        assert_eq!(cell(&merged, "fecha"), "03/15/2024");
        assert_eq!(cell(&merged, "notas"), "adiós");
        assert_eq!(cell(&merged, "score"), "10");
    }

    #[test]
    fn conform_orders_declared_then_extras() {
        let mut table = Table {
            headers: vec!["legacy".into(), "b".into()],
            rows: vec![Row::from([
                ("legacy".to_string(), "x".to_string()),
                ("b".to_string(), "2".to_string()),
            ])],
        };
        table.conform(&["a", "b"], &[("a", "0")]);

        assert_eq!(table.headers, vec!["a", "b", "legacy"]);
        assert_eq!(cell(&table.rows[0], "a"), "0");
        assert_eq!(table.extra_columns(&["a", "b"]), vec!["legacy".to_string()]);
    }

    #[test]
    fn unicode_values_survive_a_write() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("t.csv");
        let mut table = Table::with_headers(&["nombre", "nota"]);
        table.rows.push(Row::from([
            ("nombre".to_string(), "José Peña".to_string()),
            ("nota".to_string(), "línea, con coma ✅".to_string()),
        ]));
        write_table(&path, &table, TIMEOUT).expect("write");

        let loaded = read_table(&path).expect("read").expect("present");
        assert_eq!(loaded, table);
        assert!(!lock_path(&path).exists());
    }

    #[test]
    fn held_lock_times_out_without_failing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("t.csv");
        let held = acquire_lock(&path, TIMEOUT).expect("lock").expect("acquired");

        let second = acquire_lock(&path, Duration::from_millis(60)).expect("lock");
        assert!(second.is_none());

        drop(held);
        assert!(acquire_lock(&path, TIMEOUT).expect("lock").is_some());
    }

    #[test]
    fn no_temporary_files_are_left_behind() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("t.csv");
        write_atomic(&path, b"a\n1\n").expect("write");
        write_atomic(&path, b"a\n2\n").expect("write");

        let names: Vec<_> = fs::read_dir(tmp.path())
            .expect("read dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("t.csv")]);
        assert_eq!(fs::read_to_string(&path).expect("read"), "a\n2\n");
    }
}
