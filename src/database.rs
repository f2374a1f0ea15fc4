use crate::config::LiteralPolicy;
use crate::errors::DbError;
use crate::storage::{DatabaseSnapshot, Storage, TableSnapshot};
use crate::table::Table;
use crate::types::ColumnDefinition;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Database, table and column names must look like `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(name: &str) -> Result<(), DbError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

/// A named set of tables, kept in creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    name: String,
    tables: Vec<Table>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_table(&self, name: &str) -> Result<&Table, DbError> {
        self.tables
            .iter()
            .find(|t| t.get_name() == name)
            .ok_or_else(|| DbError::table_not_found(name))
    }

    pub fn get_table_mut(&mut self, name: &str) -> Result<&mut Table, DbError> {
        self.tables
            .iter_mut()
            .find(|t| t.get_name() == name)
            .ok_or_else(|| DbError::table_not_found(name))
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.get_name() == name)
    }

    pub fn add_table(&mut self, name: &str, columns: &[ColumnDefinition]) -> Result<(), DbError> {
        validate_identifier(name)?;
        for column in columns {
            validate_identifier(&column.name)?;
        }
        if self.has_table(name) {
            return Err(DbError::table_already_exists(name));
        }

        let table = Table::new(name.to_string(), columns)?;
        self.tables.push(table);
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<Table, DbError> {
        let index = self
            .tables
            .iter()
            .position(|t| t.get_name() == name)
            .ok_or_else(|| DbError::table_not_found(name))?;
        Ok(self.tables.remove(index))
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.get_name().to_string()).collect()
    }

    pub fn snapshot(&self) -> DatabaseSnapshot {
        let tables = self
            .tables
            .iter()
            .map(|table| TableSnapshot {
                name: table.get_name().to_string(),
                columns: table.column_definitions(),
                rows: table.get_all_rows().iter().map(|r| r.raw_values()).collect(),
            })
            .collect();
        DatabaseSnapshot::new(self.name.clone(), tables)
    }

    /// Rebuilds a database; every stored row goes through row construction
    /// again so a tampered file cannot break the type invariants.
    pub fn from_snapshot(
        snapshot: &DatabaseSnapshot,
        policy: LiteralPolicy,
    ) -> Result<Self, DbError> {
        let mut database = Database::new(snapshot.name.clone());
        for table_snapshot in &snapshot.tables {
            database.add_table(&table_snapshot.name, &table_snapshot.columns)?;
            let table = database.get_table_mut(&table_snapshot.name)?;
            for raw_row in &table_snapshot.rows {
                table.insert_raw(raw_row.as_slice(), policy)?;
            }
        }
        Ok(database)
    }
}

/// Owns the loaded databases and the storage they are persisted to.
pub struct DatabaseManager<S: Storage> {
    storage: S,
    databases: HashMap<String, Database>,
    current: Option<String>,
    literal_policy: LiteralPolicy,
}

impl<S: Storage> DatabaseManager<S> {
    pub fn new(storage: S, literal_policy: LiteralPolicy) -> Self {
        Self {
            storage,
            databases: HashMap::new(),
            current: None,
            literal_policy,
        }
    }

    /// Creates and stores an empty database. Does not switch to it.
    pub fn create_database(&mut self, name: &str) -> Result<(), DbError> {
        validate_identifier(name)?;
        if self.databases.contains_key(name) || self.storage.exists(name) {
            return Err(DbError::DatabaseAlreadyExists(name.to_string()));
        }

        let database = Database::new(name);
        self.storage.save(&database.snapshot())?;
        self.databases.insert(name.to_string(), database);
        info!("created database '{}'", name);
        Ok(())
    }

    /// Switches to a loaded database, loading it from storage first if needed.
    /// A loaded database takes the name it was requested under.
    pub fn use_database(&mut self, name: &str) -> Result<(), DbError> {
        validate_identifier(name)?;
        if !self.databases.contains_key(name) {
            let snapshot = self
                .storage
                .load(name)?
                .ok_or_else(|| DbError::DatabaseNotFound(name.to_string()))?;
            let mut database = Database::from_snapshot(&snapshot, self.literal_policy)?;
            if database.name != name {
                warn!(
                    "snapshot for '{}' is named '{}'; keeping '{}'",
                    name, database.name, name
                );
                database.name = name.to_string();
            }
            debug!(
                "loaded database '{}' with tables {:?}",
                name,
                database.table_names()
            );
            self.databases.insert(name.to_string(), database);
        }

        self.current = Some(name.to_string());
        info!("using database '{}'", name);
        Ok(())
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Result<&Database, DbError> {
        self.current
            .as_ref()
            .and_then(|name| self.databases.get(name))
            .ok_or(DbError::NoDatabaseSelected)
    }

    pub fn current_mut(&mut self) -> Result<&mut Database, DbError> {
        match &self.current {
            Some(name) => self
                .databases
                .get_mut(name)
                .ok_or(DbError::NoDatabaseSelected),
            None => Err(DbError::NoDatabaseSelected),
        }
    }

    /// Writes the current database to storage as a full snapshot.
    pub fn persist(&mut self) -> Result<(), DbError> {
        let snapshot = self.current()?.snapshot();
        self.storage.save(&snapshot)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn literal_policy(&self) -> LiteralPolicy {
        self.literal_policy
    }
}
