use crate::errors::DbError;
use crate::types::ColumnDefinition;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: &str = "1.0";

/// Everything needed to rebuild one database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: String,
    pub name: String,
    pub saved_at: String,
    pub tables: Vec<TableSnapshot>,
}

/// One table with rows held as canonical raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub rows: Vec<Vec<String>>,
}

impl DatabaseSnapshot {
    pub fn new(name: impl Into<String>, tables: Vec<TableSnapshot>) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            name: name.into(),
            saved_at: chrono::Utc::now()
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string(),
            tables,
        }
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }
}

/// Where databases live between runs. Every save is a full overwrite.
pub trait Storage {
    fn exists(&self, name: &str) -> bool;
    fn load(&self, name: &str) -> Result<Option<DatabaseSnapshot>, DbError>;
    fn save(&mut self, snapshot: &DatabaseSnapshot) -> Result<(), DbError>;
}

/// Stores each database as `<directory>/<name>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    directory: PathBuf,
}

impl JsonFileStorage {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}.json", name))
    }

    fn ensure_directory(&self) -> Result<(), DbError> {
        if !self.directory.exists() {
            fs::create_dir_all(&self.directory).map_err(|e| {
                DbError::FileSystemError(format!(
                    "could not create data directory {}: {}",
                    self.directory.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

impl Storage for JsonFileStorage {
    fn exists(&self, name: &str) -> bool {
        self.file_path(name).is_file()
    }

    fn load(&self, name: &str) -> Result<Option<DatabaseSnapshot>, DbError> {
        let path = self.file_path(name);
        if !path.is_file() {
            return Ok(None);
        }

        let json_content = fs::read_to_string(&path).map_err(|e| {
            DbError::FileSystemError(format!("could not read {}: {}", path.display(), e))
        })?;
        let snapshot: DatabaseSnapshot = serde_json::from_str(&json_content).map_err(|e| {
            DbError::SerializationError(format!("could not parse {}: {}", path.display(), e))
        })?;

        debug!(
            "loaded database '{}' from {} ({} tables)",
            snapshot.name,
            path.display(),
            snapshot.tables.len()
        );
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &DatabaseSnapshot) -> Result<(), DbError> {
        self.ensure_directory()?;

        let path = self.file_path(&snapshot.name);
        let json_content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json_content).map_err(|e| {
            DbError::FileSystemError(format!("could not write {}: {}", path.display(), e))
        })?;

        debug!(
            "saved database '{}' to {} ({} rows)",
            snapshot.name,
            path.display(),
            snapshot.total_rows()
        );
        Ok(())
    }
}

/// Keeps snapshots in memory. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    snapshots: HashMap<String, DatabaseSnapshot>,
    save_count: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, name: &str) -> bool {
        self.snapshots.contains_key(name)
    }

    fn load(&self, name: &str) -> Result<Option<DatabaseSnapshot>, DbError> {
        Ok(self.snapshots.get(name).cloned())
    }

    fn save(&mut self, snapshot: &DatabaseSnapshot) -> Result<(), DbError> {
        self.snapshots
            .insert(snapshot.name.clone(), snapshot.clone());
        self.save_count += 1;
        Ok(())
    }
}
