use crate::config::EngineConfig;
use crate::database::DatabaseManager;
use crate::errors::DbError;
use crate::expression::{parse_where, Expression};
use crate::parser::{parse_sql, Assignment, JoinClause, SqlStatement};
use crate::resolution::{projection_tiers, resolve_column, ColumnRef, JOIN_TIERS};
use crate::row::Row;
use crate::storage::{JsonFileStorage, Storage};
use crate::table::Table;
use crate::types::ColumnDefinition;
use log::{debug, info, warn};
use std::io::{self, Write};
use std::time::Instant;

/// Line written after every SELECT result.
pub const RESULT_TERMINATOR: &str = "---";

/// Outcome of one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Status of a statement without tabular output
    Success {
        message: String,
        execution_time_ms: u64,
    },
    /// SELECT output, cells already rendered in display form
    Select {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        execution_time_ms: u64,
    },
}

impl QueryResult {
    fn success(message: String) -> Self {
        QueryResult::Success {
            message,
            execution_time_ms: 0,
        }
    }

    /// Writes a SELECT result as comma-joined lines followed by `---`.
    /// Other results write nothing.
    pub fn write_csv<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if let QueryResult::Select { columns, rows, .. } = self {
            writeln!(out, "{}", columns.join(","))?;
            for row in rows {
                writeln!(out, "{}", row.join(","))?;
            }
            writeln!(out, "{}", RESULT_TERMINATOR)?;
        }
        Ok(())
    }

    pub fn to_csv(&self) -> String {
        let mut buffer = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.write_csv(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    fn set_execution_time(&mut self, elapsed_ms: u64) {
        match self {
            QueryResult::Success {
                execution_time_ms, ..
            }
            | QueryResult::Select {
                execution_time_ms, ..
            } => *execution_time_ms = elapsed_ms,
        }
    }
}

/// Rows produced while a SELECT runs, with one name per value position.
/// Names are bare for a single table and `table.col` once a join is involved.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Runs parsed statements against the databases of a `DatabaseManager`.
pub struct QueryExecutor<S: Storage> {
    manager: DatabaseManager<S>,
    config: EngineConfig,
}

impl QueryExecutor<JsonFileStorage> {
    /// Executor persisting to JSON files under the configured data directory.
    pub fn with_file_storage(config: EngineConfig) -> Self {
        let storage = JsonFileStorage::new(&config.data_directory);
        Self::new(storage, config)
    }
}

impl<S: Storage> QueryExecutor<S> {
    pub fn new(storage: S, config: EngineConfig) -> Self {
        Self {
            manager: DatabaseManager::new(storage, config.literal_policy),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn manager(&self) -> &DatabaseManager<S> {
        &self.manager
    }

    /// Parses and runs one statement.
    pub fn execute_sql(&mut self, sql: &str) -> Result<QueryResult, DbError> {
        let start_time = Instant::now();

        let statement = parse_sql(sql)?;
        let mut result = self.execute_statement(statement)?;

        result.set_execution_time(start_time.elapsed().as_millis() as u64);
        Ok(result)
    }

    /// Runs one statement. Successful mutations are persisted; a failed
    /// save is logged and does not fail the statement.
    pub fn execute_statement(&mut self, statement: SqlStatement) -> Result<QueryResult, DbError> {
        debug!("executing {:?}", statement);
        let mutating = statement.is_mutating();

        let result = match statement {
            SqlStatement::CreateDatabase { database_name } => {
                self.execute_create_database(&database_name)
            }
            SqlStatement::UseDatabase { database_name } => {
                self.execute_use_database(&database_name)
            }
            SqlStatement::CreateTable {
                table_name,
                columns,
            } => self.execute_create_table(&table_name, &columns),
            SqlStatement::DropTable { table_name } => self.execute_drop_table(&table_name),
            SqlStatement::Insert { table_name, values } => {
                self.execute_insert(&table_name, &values)
            }
            SqlStatement::Select {
                columns,
                table_name,
                joins,
                where_clause,
            } => self.execute_select(&columns, &table_name, &joins, where_clause.as_deref()),
            SqlStatement::Update {
                table_name,
                assignments,
                where_clause,
            } => self.execute_update(&table_name, &assignments, where_clause.as_deref()),
            SqlStatement::Delete {
                table_name,
                where_clause,
            } => self.execute_delete(&table_name, where_clause.as_deref()),
        }?;

        if mutating {
            if let Err(e) = self.manager.persist() {
                warn!("could not persist database: {}", e);
            }
        }

        Ok(result)
    }

    /// Table names of the current database.
    pub fn table_names(&self) -> Result<Vec<String>, DbError> {
        Ok(self.manager.current()?.table_names())
    }

    fn execute_create_database(&mut self, name: &str) -> Result<QueryResult, DbError> {
        self.manager.create_database(name)?;
        Ok(QueryResult::success(format!("Database {} created", name)))
    }

    fn execute_use_database(&mut self, name: &str) -> Result<QueryResult, DbError> {
        self.manager.use_database(name)?;
        Ok(QueryResult::success(format!("Using database: {}", name)))
    }

    fn execute_create_table(
        &mut self,
        table_name: &str,
        columns: &[ColumnDefinition],
    ) -> Result<QueryResult, DbError> {
        self.manager.current_mut()?.add_table(table_name, columns)?;
        info!("created table '{}' with {} columns", table_name, columns.len());
        Ok(QueryResult::success(format!("Table {} created", table_name)))
    }

    fn execute_drop_table(&mut self, table_name: &str) -> Result<QueryResult, DbError> {
        let dropped = self.manager.current_mut()?.drop_table(table_name)?;
        info!(
            "dropped table '{}' ({} rows)",
            table_name,
            dropped.row_count()
        );
        Ok(QueryResult::success(format!("Table {} dropped", table_name)))
    }

    fn execute_insert(&mut self, table_name: &str, values: &[String]) -> Result<QueryResult, DbError> {
        let policy = self.config.literal_policy;
        let table = self.manager.current_mut()?.get_table_mut(table_name)?;
        table.insert_raw(values, policy)?;
        Ok(QueryResult::success(format!(
            "Row inserted into {}",
            table_name
        )))
    }

    fn execute_select(
        &self,
        columns: &[String],
        table_name: &str,
        joins: &[JoinClause],
        where_clause: Option<&str>,
    ) -> Result<QueryResult, DbError> {
        let database = self.manager.current()?;
        let main_table = database.get_table(table_name)?;
        let expression = parse_where(where_clause.unwrap_or(""))?;

        let rows = filter_rows(main_table, expression.as_ref())?;
        let column_names = if joins.is_empty() {
            main_table.get_column_names()
        } else {
            qualified_names(main_table)
        };
        let mut row_set = RowSet {
            columns: column_names,
            rows,
        };

        for join in joins {
            let right_table = database.get_table(&join.table_name)?;
            row_set = perform_join(&row_set, right_table, &join.condition)?;
        }

        let indices = project(columns, &row_set.columns)?;
        let header: Vec<String> = indices
            .iter()
            .map(|&i| row_set.columns[i].clone())
            .collect();
        let rows: Vec<Vec<String>> = row_set
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| row.get(i).map(|v| v.display()).unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(QueryResult::Select {
            columns: header,
            rows,
            execution_time_ms: 0,
        })
    }

    fn execute_update(
        &mut self,
        table_name: &str,
        assignments: &[Assignment],
        where_clause: Option<&str>,
    ) -> Result<QueryResult, DbError> {
        let policy = self.config.literal_policy;
        let table = self.manager.current_mut()?.get_table_mut(table_name)?;

        // every SET column must exist before anything changes
        let targets = assignments
            .iter()
            .map(|a| {
                table
                    .column_index(&a.column)
                    .map(|index| (index, a.value.as_str()))
                    .ok_or_else(|| DbError::column_not_found(&a.column))
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        let expression = parse_where(where_clause.unwrap_or(""))?;
        let matching = matching_indices(table, expression.as_ref())?;

        // build all replacement rows first so a bad literal leaves the table untouched
        let mut replacements = Vec::with_capacity(matching.len());
        for &index in &matching {
            let mut raw_values = table.get_all_rows()[index].raw_values();
            for &(column, value) in &targets {
                raw_values[column] = value.to_string();
            }
            let row = Row::from_raw(table.get_schema(), raw_values.as_slice(), policy)?;
            replacements.push((index, row));
        }

        let updated = replacements.len();
        for (index, row) in replacements {
            table.update_row(index, row)?;
        }

        info!("updated {} rows in '{}'", updated, table_name);
        Ok(QueryResult::success(format!(
            "{} rows updated in {}",
            updated, table_name
        )))
    }

    fn execute_delete(
        &mut self,
        table_name: &str,
        where_clause: Option<&str>,
    ) -> Result<QueryResult, DbError> {
        let table = self.manager.current_mut()?.get_table_mut(table_name)?;
        let expression = parse_where(where_clause.unwrap_or(""))?;
        let matching = matching_indices(table, expression.as_ref())?;

        // highest index first so earlier positions stay valid
        for &index in matching.iter().rev() {
            table.delete_row(index)?;
        }

        info!("deleted {} rows from '{}'", matching.len(), table_name);
        Ok(QueryResult::success(format!(
            "{} rows deleted from {}",
            matching.len(),
            table_name
        )))
    }
}

/// Rows of `table` the expression accepts, in table order. No expression
/// keeps every row.
pub fn filter_rows(table: &Table, expression: Option<&Expression>) -> Result<Vec<Row>, DbError> {
    Ok(matching_indices(table, expression)?
        .into_iter()
        .map(|i| table.get_all_rows()[i].clone())
        .collect())
}

/// Ascending positions of the rows the expression accepts.
pub fn matching_indices(
    table: &Table,
    expression: Option<&Expression>,
) -> Result<Vec<usize>, DbError> {
    let Some(expression) = expression else {
        return Ok((0..table.row_count()).collect());
    };

    let mut indices = Vec::new();
    for (index, row) in table.get_all_rows().iter().enumerate() {
        if expression.evaluate(table, row)? {
            indices.push(index);
        }
    }
    Ok(indices)
}

/// Nested-loop equi-join of `left` with `right` on `left.col = right.col`.
///
/// The left column is resolved against the accumulated names (qualified,
/// then bare, then by suffix). The right column must be a column of `right`
/// by exact name. Each match emits the left values followed by the right
/// values.
pub fn perform_join(left: &RowSet, right: &Table, condition: &str) -> Result<RowSet, DbError> {
    let (left_text, right_text) = condition
        .split_once('=')
        .map(|(l, r)| (l.trim(), r.trim()))
        .ok_or_else(|| DbError::invalid_join_condition(condition))?;
    if !left_text.contains('.') || !right_text.contains('.') {
        return Err(DbError::invalid_join_condition(condition));
    }

    let left_ref = ColumnRef::parse(left_text);
    let right_ref = ColumnRef::parse(right_text);

    let left_index = resolve_column(&left.columns, &left_ref, &JOIN_TIERS)
        .ok_or_else(|| DbError::column_not_found(left_text))?;
    let right_index = right
        .column_index(&right_ref.column)
        .ok_or_else(|| DbError::column_not_found(right_text))?;

    let mut rows = Vec::new();
    for left_row in &left.rows {
        let Some(left_value) = left_row.get(left_index) else {
            continue;
        };
        for right_row in right.get_all_rows() {
            let Some(right_value) = right_row.get(right_index) else {
                continue;
            };
            if left_value.equals(right_value)? {
                let values = left_row
                    .values()
                    .iter()
                    .chain(right_row.values())
                    .cloned()
                    .collect();
                rows.push(Row::new(values));
            }
        }
    }

    let mut columns = left.columns.clone();
    columns.extend(qualified_names(right));
    debug!(
        "joined {} with {}: {} rows",
        condition,
        right.get_name(),
        rows.len()
    );

    Ok(RowSet { columns, rows })
}

/// Positions selected by a SELECT list. A lone `*` or `ALL` selects every
/// column in order; any unresolved entry fails the whole projection.
pub fn project(requested: &[String], available: &[String]) -> Result<Vec<usize>, DbError> {
    if let [only] = requested {
        if only == "*" || only == "ALL" {
            return Ok((0..available.len()).collect());
        }
    }

    requested
        .iter()
        .map(|specifier| {
            let target = ColumnRef::parse(specifier);
            resolve_column(available, &target, projection_tiers(&target))
                .ok_or_else(|| DbError::column_not_found(specifier))
        })
        .collect()
}

fn qualified_names(table: &Table) -> Vec<String> {
    table
        .get_columns()
        .iter()
        .map(|c| format!("{}.{}", table.get_name(), c.name))
        .collect()
}
