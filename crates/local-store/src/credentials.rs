//! Staff logins.

use crate::error::StoreError;
use crate::schema::CREDENTIAL_COLUMNS;
use crate::table::{Row, Table, cell, read_or_create, write_table};
use leadflow_core::Credential;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl CredentialStore {
    pub fn open(path: impl Into<PathBuf>, lock_timeout: Duration) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            lock_timeout,
        };
        read_or_create(&store.path, CREDENTIAL_COLUMNS, lock_timeout)?;
        Ok(store)
    }

    pub fn load(&self) -> Result<Vec<Credential>, StoreError> {
        let table = read_or_create(&self.path, CREDENTIAL_COLUMNS, self.lock_timeout)?;
        Ok(table
            .rows
            .iter()
            .filter(|row| !cell(row, "username").trim().is_empty())
            .map(|row| Credential {
                username: cell(row, "username").trim().to_string(),
                display_name: cell(row, "name").to_string(),
                role: cell(row, "role").to_string(),
                password_hash: cell(row, "pass_hash").trim().to_string(),
            })
            .collect())
    }

    /// Case-insensitive lookup.
    pub fn find(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self
            .load()?
            .into_iter()
            .find(|credential| credential.matches_username(username)))
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.load()?.is_empty())
    }

    /// Insert `credential`, or replace the row with the same username.
    /// Returns true when a row was replaced.
    pub fn upsert(&self, credential: Credential) -> Result<bool, StoreError> {
        let mut credentials = self.load()?;
        let replaced = match credentials
            .iter_mut()
            .find(|existing| existing.matches_username(&credential.username))
        {
            Some(existing) => {
                *existing = credential.clone();
                true
            }
            None => {
                credentials.push(credential.clone());
                false
            }
        };

        let mut table = Table::with_headers(CREDENTIAL_COLUMNS);
        table.rows = credentials.iter().map(credential_to_row).collect();
        write_table(&self.path, &table, self.lock_timeout)?;
        info!(username = %credential.username, replaced, "saved credential");
        Ok(replaced)
    }
}

fn credential_to_row(credential: &Credential) -> Row {
    Row::from([
        ("username".to_string(), credential.username.clone()),
        ("name".to_string(), credential.display_name.clone()),
        ("role".to_string(), credential.role.clone()),
        ("pass_hash".to_string(), credential.password_hash.clone()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TIMEOUT: Duration = Duration::from_millis(200);

    #[test]
    fn lookup_is_case_insensitive() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("users.csv");
        fs::write(
            &path,
            "username,name,role,pass_hash\n\
             Nancy,Nancy,Ventas,00ff\n",
        )
        .expect("seed");

        let store = CredentialStore::open(&path, TIMEOUT).expect("open");
        let found = store.find("  NANCY ").expect("find").expect("present");
        assert_eq!(found.display_name, "Nancy");
        assert!(store.find("rosario").expect("find").is_none());
    }

    #[test]
    fn upsert_replaces_by_username() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::open(tmp.path().join("users.csv"), TIMEOUT).expect("open");
        assert!(store.is_empty().expect("empty"));

        let first = Credential::new("favio", "Favio", "Ventas", "uno", "");
        assert!(!store.upsert(first).expect("insert"));
        let second = Credential::new("FAVIO", "Favio R.", "Admin", "dos", "");
        assert!(store.upsert(second).expect("replace"));

        let all = store.load().expect("load");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].role, "Admin");
        assert!(all[0].verify("dos", ""));
    }
}
