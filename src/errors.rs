use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DbError {
    // Parser errors
    #[error("Parse Error: {0}")]
    ParseError(String),
    #[error("Unrecognized or unsupported command: {0}")]
    UnrecognizedCommand(String),

    // Database errors
    #[error("Database '{0}' not found")]
    DatabaseNotFound(String),
    #[error("Database '{0}' already exists")]
    DatabaseAlreadyExists(String),
    #[error("No database selected")]
    NoDatabaseSelected,

    // Table errors
    #[error("Table '{0}' not found")]
    TableNotFound(String),
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    // Column errors
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),
    #[error("Column '{0}' is defined more than once")]
    DuplicateColumn(String),
    #[error("Invalid column count: expected {0}, got {1}")]
    InvalidColumnCount(usize, usize), // expected, actual

    // Type errors
    #[error("Invalid literal for {data_type}: '{literal}'")]
    InvalidLiteral { data_type: String, literal: String },
    #[error("Cannot compare values of incompatible types {0} and {1}")]
    IncompatibleTypes(String, String),

    // Resolution errors
    #[error("Invalid join condition: '{0}'")]
    InvalidJoinCondition(String),
    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    // File system errors
    #[error("File system error: {0}")]
    FileSystemError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // General errors
    #[error("Execution error: {0}")]
    ExecutionError(String),
}

impl From<std::io::Error> for DbError {
    fn from(err: std::io::Error) -> Self {
        DbError::FileSystemError(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::SerializationError(err.to_string())
    }
}

// Shorthand constructors for the common cases
impl DbError {
    pub fn parse_error(msg: &str) -> Self {
        DbError::ParseError(msg.to_string())
    }

    pub fn table_not_found(table_name: &str) -> Self {
        DbError::TableNotFound(table_name.to_string())
    }

    pub fn table_already_exists(table_name: &str) -> Self {
        DbError::TableAlreadyExists(table_name.to_string())
    }

    pub fn column_not_found(column_name: &str) -> Self {
        DbError::ColumnNotFound(column_name.to_string())
    }

    pub fn invalid_column_count(expected: usize, actual: usize) -> Self {
        DbError::InvalidColumnCount(expected, actual)
    }

    pub fn invalid_literal(data_type: &str, literal: &str) -> Self {
        DbError::InvalidLiteral {
            data_type: data_type.to_string(),
            literal: literal.to_string(),
        }
    }

    pub fn incompatible_types(left: &str, right: &str) -> Self {
        DbError::IncompatibleTypes(left.to_string(), right.to_string())
    }

    pub fn invalid_join_condition(condition: &str) -> Self {
        DbError::InvalidJoinCondition(condition.to_string())
    }

    pub fn execution_error(msg: &str) -> Self {
        DbError::ExecutionError(msg.to_string())
    }

    /// True for errors raised while turning text into a statement.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, DbError::ParseError(_) | DbError::UnrecognizedCommand(_))
    }
}
