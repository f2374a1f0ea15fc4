pub mod cli;
pub mod config;
pub mod database;
pub mod errors;
pub mod executor;
pub mod expression;
pub mod parser;
pub mod resolution;
pub mod row;
pub mod storage;
pub mod table;
pub mod tokenizer;
pub mod types;

pub use cli::DatabaseCli;
pub use config::{EngineConfig, LiteralPolicy};
pub use database::{Database, DatabaseManager};
pub use errors::DbError;
pub use executor::{QueryExecutor, QueryResult};
pub use expression::{parse_where, ComparisonOp, Condition, Expression};
pub use parser::{parse_script, parse_sql, Assignment, JoinClause, SqlStatement};
pub use row::Row;
pub use storage::{DatabaseSnapshot, JsonFileStorage, MemoryStorage, Storage};
pub use table::Table;
pub use types::{Column, ColumnDefinition, DataType, Value};
