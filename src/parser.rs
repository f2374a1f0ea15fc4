use crate::errors::DbError;
use crate::tokenizer::{split_statements, tokenize, unquote};
use crate::types::{ColumnDefinition, DataType};
use log::warn;

// AST node definitions
#[derive(Debug, Clone, PartialEq)]
pub enum SqlStatement {
    CreateDatabase {
        database_name: String,
    },
    UseDatabase {
        database_name: String,
    },
    CreateTable {
        table_name: String,
        columns: Vec<ColumnDefinition>,
    },
    DropTable {
        table_name: String,
    },
    Insert {
        table_name: String,
        values: Vec<String>,
    },
    Select {
        columns: Vec<String>,
        table_name: String,
        joins: Vec<JoinClause>,
        where_clause: Option<String>,
    },
    Update {
        table_name: String,
        assignments: Vec<Assignment>,
        where_clause: Option<String>,
    },
    Delete {
        table_name: String,
        where_clause: Option<String>,
    },
}

impl SqlStatement {
    /// True for statements that change stored data and must be persisted.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            SqlStatement::CreateTable { .. }
                | SqlStatement::DropTable { .. }
                | SqlStatement::Insert { .. }
                | SqlStatement::Update { .. }
                | SqlStatement::Delete { .. }
        )
    }
}

/// `column = literal` inside an UPDATE's SET list. The literal is kept as
/// raw text with surrounding quotes removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: String,
}

/// `INNER JOIN table ON condition`; the condition is kept as text of the
/// form `left.col = right.col`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table_name: String,
    pub condition: String,
}

/// Parses one statement. A trailing `;` is optional.
pub fn parse_sql(input: &str) -> Result<SqlStatement, DbError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DbError::parse_error("empty statement"));
    }

    let mut tokens = tokenize(trimmed);
    while tokens.last().map(String::as_str) == Some(";") {
        tokens.pop();
    }
    if tokens.is_empty() {
        return Err(DbError::parse_error("empty statement"));
    }

    let upper: Vec<String> = tokens.iter().map(|t| t.to_uppercase()).collect();
    let lead = |i: usize| upper.get(i).map(String::as_str);

    match (lead(0), lead(1)) {
        (Some("CREATE"), Some("DATABASE")) => parse_create_database(&tokens),
        (Some("USE"), Some("DATABASE")) => parse_use_database(&tokens),
        (Some("CREATE"), Some("TABLE")) => parse_create_table(&tokens),
        (Some("DROP"), Some("TABLE")) => parse_drop_table(&tokens),
        (Some("INSERT"), Some("INTO")) => parse_insert(&tokens, &upper),
        (Some("SELECT"), _) => parse_select(&tokens, &upper),
        (Some("UPDATE"), _) => parse_update(&tokens, &upper),
        (Some("DELETE"), Some("FROM")) => parse_delete(&tokens, &upper),
        _ => Err(DbError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// Splits a script on unquoted `;` and parses every statement. Statements
/// that fail to parse are logged and skipped.
pub fn parse_script(content: &str) -> Vec<SqlStatement> {
    split_statements(content)
        .into_iter()
        .filter_map(|statement| match parse_sql(&statement) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("skipping statement '{}': {}", statement, e);
                None
            }
        })
        .collect()
}

// CREATE DATABASE name
fn parse_create_database(tokens: &[String]) -> Result<SqlStatement, DbError> {
    let database_name = name_at(tokens, 2, "CREATE DATABASE requires a database name")?;
    Ok(SqlStatement::CreateDatabase { database_name })
}

// USE DATABASE name
fn parse_use_database(tokens: &[String]) -> Result<SqlStatement, DbError> {
    let database_name = name_at(tokens, 2, "USE DATABASE requires a database name")?;
    Ok(SqlStatement::UseDatabase { database_name })
}

// CREATE TABLE name ( col type [, col type]* )
fn parse_create_table(tokens: &[String]) -> Result<SqlStatement, DbError> {
    let table_name = name_at(tokens, 2, "CREATE TABLE requires a table name")?;

    let open = find_exact(tokens, "(", 3)
        .ok_or_else(|| DbError::parse_error("CREATE TABLE is missing '('"))?;
    let close = find_exact(tokens, ")", open + 1)
        .ok_or_else(|| DbError::parse_error("CREATE TABLE is missing ')'"))?;

    let definition: Vec<&String> = tokens[open + 1..close]
        .iter()
        .filter(|t| t.as_str() != ",")
        .collect();
    if definition.is_empty() {
        return Err(DbError::parse_error("CREATE TABLE requires at least one column"));
    }
    if definition.len() % 2 != 0 {
        return Err(DbError::parse_error(
            "CREATE TABLE columns must be written as 'name TYPE' pairs",
        ));
    }

    let columns = definition
        .chunks(2)
        .map(|pair| {
            let data_type = DataType::from_string(pair[1])?;
            Ok(ColumnDefinition::new(pair[0].clone(), data_type))
        })
        .collect::<Result<Vec<_>, DbError>>()?;

    Ok(SqlStatement::CreateTable {
        table_name,
        columns,
    })
}

// DROP TABLE name
fn parse_drop_table(tokens: &[String]) -> Result<SqlStatement, DbError> {
    let table_name = name_at(tokens, 2, "DROP TABLE requires a table name")?;
    Ok(SqlStatement::DropTable { table_name })
}

// INSERT INTO name VALUES ( v [, v]* )
fn parse_insert(tokens: &[String], upper: &[String]) -> Result<SqlStatement, DbError> {
    let table_name = name_at(tokens, 2, "INSERT INTO requires a table name")?;

    let values_index = find_token(upper, "VALUES", 3)
        .ok_or_else(|| DbError::parse_error("INSERT INTO is missing VALUES"))?;
    let open = values_index + 1;
    if tokens.get(open).map(String::as_str) != Some("(") {
        return Err(DbError::parse_error("INSERT INTO expects '(' after VALUES"));
    }
    let close = find_exact(tokens, ")", open + 1)
        .ok_or_else(|| DbError::parse_error("INSERT INTO is missing ')'"))?;

    let values = tokens[open + 1..close]
        .iter()
        .filter(|t| t.as_str() != ",")
        .map(|t| unquote(t).to_string())
        .collect();

    Ok(SqlStatement::Insert { table_name, values })
}

// SELECT col[,col]* FROM name [INNER JOIN name ON cond]* [WHERE expr]
fn parse_select(tokens: &[String], upper: &[String]) -> Result<SqlStatement, DbError> {
    let from_index = find_token(upper, "FROM", 1)
        .ok_or_else(|| DbError::parse_error("SELECT is missing FROM"))?;

    let columns: Vec<String> = tokens[1..from_index]
        .iter()
        .filter(|t| t.as_str() != ",")
        .cloned()
        .collect();
    if columns.is_empty() {
        return Err(DbError::parse_error("SELECT requires at least one column"));
    }

    let table_name = name_at(tokens, from_index + 1, "SELECT is missing a table after FROM")?;

    let mut joins = Vec::new();
    let mut current = from_index + 2;
    while let Some(inner_index) = find_token(upper, "INNER", current) {
        if upper.get(inner_index + 1).map(String::as_str) != Some("JOIN") {
            return Err(DbError::parse_error("expected JOIN after INNER"));
        }
        let join_table = name_at(tokens, inner_index + 2, "INNER JOIN is missing a table")?;

        let on_index = find_token(upper, "ON", inner_index + 3)
            .ok_or_else(|| DbError::parse_error("INNER JOIN is missing ON"))?;
        let start = on_index + 1;
        let end = [
            find_token(upper, "INNER", start),
            find_token(upper, "WHERE", start),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(tokens.len());
        if start >= end {
            return Err(DbError::parse_error("INNER JOIN is missing a condition"));
        }

        joins.push(JoinClause {
            table_name: join_table,
            condition: tokens[start..end].join(" "),
        });
        current = end;
    }

    let where_clause = parse_where_text(tokens, upper, current)?;

    Ok(SqlStatement::Select {
        columns,
        table_name,
        joins,
        where_clause,
    })
}

// UPDATE name SET col = v [, col = v]* [WHERE expr]
fn parse_update(tokens: &[String], upper: &[String]) -> Result<SqlStatement, DbError> {
    let table_name = name_at(tokens, 1, "UPDATE requires a table name")?;

    let set_index = find_token(upper, "SET", 2)
        .ok_or_else(|| DbError::parse_error("UPDATE is missing SET"))?;
    let end_set = find_token(upper, "WHERE", set_index + 1).unwrap_or(tokens.len());

    let mut assignments = Vec::new();
    let mut i = set_index + 1;
    while i < end_set {
        if i + 1 >= end_set || tokens[i + 1] != "=" {
            return Err(DbError::parse_error("malformed SET clause in UPDATE"));
        }
        if i + 2 >= end_set {
            return Err(DbError::parse_error("missing value in SET clause of UPDATE"));
        }
        assignments.push(Assignment {
            column: tokens[i].clone(),
            value: unquote(&tokens[i + 2]).to_string(),
        });
        i += 3;
        if i < end_set && tokens[i] == "," {
            i += 1;
        }
    }
    if assignments.is_empty() {
        return Err(DbError::parse_error("UPDATE requires at least one assignment"));
    }

    let where_clause = parse_where_text(tokens, upper, set_index + 1)?;

    Ok(SqlStatement::Update {
        table_name,
        assignments,
        where_clause,
    })
}

// DELETE FROM name [WHERE expr]
fn parse_delete(tokens: &[String], upper: &[String]) -> Result<SqlStatement, DbError> {
    let table_name = name_at(tokens, 2, "DELETE FROM requires a table name")?;
    let where_clause = parse_where_text(tokens, upper, 3)?;

    Ok(SqlStatement::Delete {
        table_name,
        where_clause,
    })
}

/// Everything after the first WHERE at or after `start`, joined with single
/// spaces. A WHERE with nothing after it is an error.
fn parse_where_text(
    tokens: &[String],
    upper: &[String],
    start: usize,
) -> Result<Option<String>, DbError> {
    match find_token(upper, "WHERE", start) {
        Some(index) if index + 1 < tokens.len() => Ok(Some(tokens[index + 1..].join(" "))),
        Some(_) => Err(DbError::parse_error("WHERE clause is empty")),
        None => Ok(None),
    }
}

/// First position at or after `start` whose upper-cased token equals `target`.
fn find_token(upper: &[String], target: &str, start: usize) -> Option<usize> {
    upper
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, t)| t.as_str() == target)
        .map(|(i, _)| i)
}

fn find_exact(tokens: &[String], target: &str, start: usize) -> Option<usize> {
    find_token(tokens, target, start)
}

/// A table or database name at `index`; punctuation does not count.
fn name_at(tokens: &[String], index: usize, message: &str) -> Result<String, DbError> {
    match tokens.get(index) {
        Some(t) if !matches!(t.as_str(), "(" | ")" | "," | ";") => Ok(t.clone()),
        _ => Err(DbError::parse_error(message)),
    }
}
