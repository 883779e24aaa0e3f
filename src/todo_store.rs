//! Key-value persistence behind the to-do list.
//!
//! The manager only needs a single slot addressed by a fixed key, so the
//! [`TodoStore`] seam is a plain `get`/`set` pair over strings. [`LmdbStore`] is
//! what ships in the app; [`InMemoryStore`] backs tests and hosts that do not
//! want anything on disk.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use lmdb::{Database, DatabaseFlags, Environment, Error as LmdbError, Transaction, WriteFlags};
use log::info;

use crate::app_response::AppResponse;
use crate::config::TodoConfig;

/// Name of the LMDB sub-database holding the list.
const DB_NAME: &str = "todos";

pub trait TodoStore {
    /// Reads the value stored under `key`, `None` when nothing was written yet.
    fn get(&self, key: &str) -> Result<Option<String>, AppResponse>;

    /// Overwrites the value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), AppResponse>;
}

/// LMDB-backed store living in `<db_name>.lmdb`.
pub struct LmdbStore {
    env: Environment,
    db: Database,
    path: String,
}

impl LmdbStore {
    /// Opens the environment described by `config`, creating its directory if needed.
    pub fn open(config: &TodoConfig) -> Result<Self, AppResponse> {
        config.validate()?;

        let path = config.lmdb_dir();
        fs::create_dir_all(&path)?;

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(config.map_size)
            .open(Path::new(&path))?;

        let db = env.create_db(Some(DB_NAME), DatabaseFlags::empty())?;

        info!("LMDB store opened at {}", path);
        Ok(Self { env, db, path })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl TodoStore for LmdbStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppResponse> {
        let txn = self.env.begin_ro_txn()?;

        let value = match txn.get(self.db, &key) {
            Ok(bytes) => Some(String::from_utf8(bytes.to_vec()).map_err(|e| {
                AppResponse::SerializationError(format!("Stored value is not UTF-8: {e}"))
            })?),
            Err(LmdbError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        txn.commit()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db, &key, &value, WriteFlags::empty())?;
        txn.commit()?;
        Ok(())
    }
}

/// Volatile store; contents vanish with the value.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    entries: HashMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one entry, handy for simulating a previous session.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl TodoStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppResponse> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppResponse> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
