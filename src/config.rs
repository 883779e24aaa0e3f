//! Runtime configuration handed over by the host application.
//!
//! The host passes a JSON document to [`crate::create_todo_list`]; only
//! `db_name` is required:
//!
//! ```json
//! { "db_name": "/data/user/0/app/files/todos", "storage_key": "MY_TODO_LIST_1" }
//! ```

use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;

/// Key under which the serialized list is stored unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "MY_TODO_LIST_1";

/// Default LMDB map size (10 MiB). A to-do list with photo URIs stays far below it.
pub const DEFAULT_MAP_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoConfig {
    /// Path prefix of the database; the environment lives in `<db_name>.lmdb`.
    pub db_name: String,

    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

impl TodoConfig {
    pub fn new(db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            storage_key: default_storage_key(),
            map_size: default_map_size(),
        }
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, AppResponse> {
        let config: TodoConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppResponse> {
        if self.db_name.trim().is_empty() {
            return Err(AppResponse::BadRequest("db_name must not be empty".to_string()));
        }
        if self.storage_key.is_empty() {
            return Err(AppResponse::BadRequest("storage_key must not be empty".to_string()));
        }
        if self.map_size == 0 {
            return Err(AppResponse::BadRequest("map_size must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Directory holding the LMDB environment.
    pub fn lmdb_dir(&self) -> String {
        format!("{}.lmdb", self.db_name)
    }
}
