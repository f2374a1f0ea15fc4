use crate::config::LiteralPolicy;
use crate::errors::DbError;
use crate::row::Row;
use crate::types::{Column, ColumnDefinition, DataType};

/// A named table. Rows and columns are kept in parallel: every column
/// holds exactly one value per row, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
    schema: Vec<DataType>,
}

impl Table {
    pub fn new(name: String, definitions: &[ColumnDefinition]) -> Result<Self, DbError> {
        let mut columns: Vec<Column> = Vec::with_capacity(definitions.len());
        for def in definitions {
            if columns.iter().any(|c| c.name == def.name) {
                return Err(DbError::DuplicateColumn(def.name.clone()));
            }
            columns.push(Column::new(def.name.clone(), def.data_type));
        }
        let schema = columns.iter().map(|c| c.data_type).collect();

        Ok(Self {
            name,
            columns,
            rows: Vec::new(),
            schema,
        })
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn get_all_rows(&self) -> &[Row] {
        &self.rows
    }

    /// Ordered column types.
    pub fn get_schema(&self) -> &[DataType] {
        &self.schema
    }

    pub fn get_column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_definitions(&self) -> Vec<ColumnDefinition> {
        self.columns
            .iter()
            .map(|c| ColumnDefinition::new(c.name.clone(), c.data_type))
            .collect()
    }

    /// Position of the first column titled exactly `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn insert_row(&mut self, row: Row) -> Result<(), DbError> {
        self.check_fits(&row)?;
        for (column, value) in self.columns.iter_mut().zip(row.values()) {
            column.push(value.clone())?;
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builds a row from raw texts against this table's schema and appends it.
    pub fn insert_raw<S: AsRef<str>>(
        &mut self,
        raw_values: &[S],
        policy: LiteralPolicy,
    ) -> Result<(), DbError> {
        let row = Row::from_raw(&self.schema, raw_values, policy)?;
        self.insert_row(row)
    }

    /// Replaces the row at `index` with a freshly built one.
    pub fn update_row(&mut self, index: usize, row: Row) -> Result<(), DbError> {
        self.check_index(index)?;
        self.check_fits(&row)?;
        for (column, value) in self.columns.iter_mut().zip(row.values()) {
            column.set(index, value.clone())?;
        }
        self.rows[index] = row;
        Ok(())
    }

    pub fn delete_row(&mut self, index: usize) -> Result<Row, DbError> {
        self.check_index(index)?;
        for column in &mut self.columns {
            column.remove(index)?;
        }
        Ok(self.rows.remove(index))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn check_index(&self, index: usize) -> Result<(), DbError> {
        if index >= self.rows.len() {
            return Err(DbError::execution_error(&format!(
                "row index {} out of range for table {}",
                index, self.name
            )));
        }
        Ok(())
    }

    fn check_fits(&self, row: &Row) -> Result<(), DbError> {
        if row.len() != self.schema.len() {
            return Err(DbError::invalid_column_count(self.schema.len(), row.len()));
        }
        if !row.fits(&self.schema) {
            return Err(DbError::execution_error(&format!(
                "row does not match the schema of table {}",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn student_table() -> Table {
        let mut table = Table::new(
            "student".into(),
            &[
                ColumnDefinition::new("ID", DataType::Integer),
                ColumnDefinition::new("Name", DataType::Text),
                ColumnDefinition::new("GPA", DataType::Float),
            ],
        )
        .unwrap();
        table.insert_raw(&["1", "Ann", "3.5"], LiteralPolicy::Reject).unwrap();
        table.insert_raw(&["2", "Bo", "3.0"], LiteralPolicy::Reject).unwrap();
        table
    }

    fn assert_aligned(table: &Table) {
        for column in table.get_columns() {
            assert_eq!(column.len(), table.row_count());
        }
        assert_eq!(table.get_columns().len(), table.get_schema().len());
    }

    #[test]
    fn test_table_creation() {
        let table = student_table();
        assert_eq!(table.get_name(), "student");
        assert_eq!(
            table.get_schema(),
            &[DataType::Integer, DataType::Text, DataType::Float]
        );
        assert_eq!(table.get_column_names(), vec!["ID", "Name", "GPA"]);
        assert_eq!(table.row_count(), 2);
        assert_aligned(&table);
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = Table::new(
            "t".into(),
            &[
                ColumnDefinition::new("a", DataType::Integer),
                ColumnDefinition::new("a", DataType::Text),
            ],
        );
        assert_eq!(result, Err(DbError::DuplicateColumn("a".into())));
    }

    #[test]
    fn test_insert_wrong_count_leaves_table_untouched() {
        let mut table = student_table();
        assert!(table.insert_raw(&["3", "Cy"], LiteralPolicy::Reject).is_err());
        assert!(table
            .insert_row(Row::new(vec![Value::Text("x".into()); 3]))
            .is_err());
        assert_eq!(table.row_count(), 2);
        assert_aligned(&table);
    }

    #[test]
    fn test_update_row() {
        let mut table = student_table();
        let row = Row::from_raw(table.get_schema(), &["2", "Bob", "3.2"], LiteralPolicy::Reject)
            .unwrap();
        table.update_row(1, row).unwrap();

        assert_eq!(table.get_all_rows()[1].get(1), Some(&Value::Text("Bob".into())));
        assert_eq!(
            table.find_column("GPA").unwrap().values()[1],
            Value::Float(3.2)
        );
        assert!(table.update_row(9, Row::new(vec![])).is_err());
        assert_aligned(&table);
    }

    #[test]
    fn test_delete_row() {
        let mut table = student_table();
        let removed = table.delete_row(0).unwrap();
        assert_eq!(removed.get(0), Some(&Value::Integer(1)));
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.find_column("ID").unwrap().values(), &[Value::Integer(2)]);
        assert!(table.delete_row(1).is_err());
        assert_aligned(&table);
    }

    #[test]
    fn test_column_index() {
        let table = student_table();
        assert_eq!(table.column_index("Name"), Some(1));
        assert_eq!(table.column_index("name"), None);
        assert_eq!(table.column_index("student.Name"), None);
    }
}
