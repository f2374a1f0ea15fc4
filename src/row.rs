use crate::config::LiteralPolicy;
use crate::errors::DbError;
use crate::types::{DataType, Value};
use log::warn;

/// An immutable snapshot of one row: one value per column, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Wraps already-typed values, e.g. the concatenation produced by a join.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Builds a row from a schema and matching raw texts.
    ///
    /// Under `LiteralPolicy::Reject` an unparsable literal fails the whole
    /// row; under `LiteralPolicy::Substitute` it is replaced by the type's
    /// sentinel value.
    pub fn from_raw<S: AsRef<str>>(
        schema: &[DataType],
        raw_values: &[S],
        policy: LiteralPolicy,
    ) -> Result<Self, DbError> {
        if schema.len() != raw_values.len() {
            return Err(DbError::invalid_column_count(schema.len(), raw_values.len()));
        }

        let mut values = Vec::with_capacity(schema.len());
        for (data_type, raw) in schema.iter().zip(raw_values) {
            let raw = raw.as_ref();
            let value = match Value::parse(*data_type, raw) {
                Ok(value) => value,
                Err(err) => match policy {
                    LiteralPolicy::Reject => return Err(err),
                    LiteralPolicy::Substitute => {
                        warn!("{}; storing sentinel value instead", err);
                        Value::sentinel(*data_type)
                    }
                },
            };
            values.push(value);
        }

        Ok(Self { values })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Canonical raw text of every value, in order.
    pub fn raw_values(&self) -> Vec<String> {
        self.values.iter().map(Value::raw).collect()
    }

    pub fn fits(&self, schema: &[DataType]) -> bool {
        self.values.len() == schema.len()
            && self
                .values
                .iter()
                .zip(schema)
                .all(|(value, data_type)| value.data_type() == *data_type)
    }
}
