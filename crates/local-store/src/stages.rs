//! Optional lookup table listing the stages offered by pickers.

use crate::error::StoreError;
use crate::schema::{STAGE_COLUMNS, migrate_stages, stage_table};
use crate::table::{cell, read_table, write_table};
use leadflow_core::{Stage, normalize_stage};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StageTable {
    path: PathBuf,
    lock_timeout: Duration,
}

impl StageTable {
    /// Open the table, regenerating it from the stage enumeration when
    /// missing and normalizing a legacy layout once.
    pub fn open(path: impl Into<PathBuf>, lock_timeout: Duration) -> Result<Self, StoreError> {
        let table = Self {
            path: path.into(),
            lock_timeout,
        };
        match read_table(&table.path)? {
            None => table.regenerate()?,
            Some(mut existing) => {
                if migrate_stages(&mut existing) {
                    write_table(&table.path, &existing, lock_timeout)?;
                }
            }
        }
        Ok(table)
    }

    /// Stages in display order. Falls back to every stage when the table is
    /// absent or empty.
    pub fn load(&self) -> Result<Vec<Stage>, StoreError> {
        let Some(mut table) = read_table(&self.path)? else {
            return Ok(Stage::ALL.to_vec());
        };
        migrate_stages(&mut table);
        let column = STAGE_COLUMNS[0];
        Ok(table
            .rows
            .iter()
            .map(|row| normalize_stage(cell(row, column)))
            .collect())
    }

    /// Rewrite the table with every stage in enumeration order.
    pub fn regenerate(&self) -> Result<(), StoreError> {
        write_table(&self.path, &stage_table(&Stage::ALL), self.lock_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TIMEOUT: Duration = Duration::from_millis(200);

    #[test]
    fn missing_table_is_generated() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("embudo_etapas.csv");
        let table = StageTable::open(&path, TIMEOUT).expect("open");
        assert_eq!(table.load().expect("load"), Stage::ALL.to_vec());
        assert!(fs::read_to_string(&path).expect("read").starts_with("stage\nAwareness\n"));
    }

    #[test]
    fn legacy_etapa_table_is_rewritten() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("embudo_etapas.csv");
        fs::write(&path, "etapa\nCaptado\nContactado\nPerdido\n").expect("seed");

        let table = StageTable::open(&path, TIMEOUT).expect("open");
        assert_eq!(
            table.load().expect("load"),
            vec![Stage::Awareness, Stage::Contacted, Stage::Lost]
        );
        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            "stage\nAwareness\nContacted\nLost\n"
        );
    }
}
