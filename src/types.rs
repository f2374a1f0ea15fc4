use crate::errors::DbError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Stand-in values for numeric literals that do not parse.
pub const SENTINEL_INTEGER: i64 = 114514;
pub const SENTINEL_FLOAT: f64 = 114.514;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Float,
    Text,
}

impl DataType {
    /// DDL type names are matched exactly: `INTEGER`, `FLOAT`, `TEXT`.
    pub fn from_string(s: &str) -> Result<Self, DbError> {
        match s {
            "INTEGER" => Ok(DataType::Integer),
            "FLOAT" => Ok(DataType::Float),
            "TEXT" => Ok(DataType::Text),
            _ => Err(DbError::ParseError(format!("Unsupported data type: {}", s))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Text => "TEXT",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed scalar. Values are immutable once built; replacing one means
/// building a new value from raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Builds a value of `data_type` from raw text.
    ///
    /// Numeric text must parse completely (surrounding whitespace is
    /// ignored); non-finite floats are rejected. Text is taken verbatim.
    pub fn parse(data_type: DataType, raw: &str) -> Result<Self, DbError> {
        match data_type {
            DataType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| DbError::invalid_literal(data_type.as_str(), raw)),
            DataType::Float => match raw.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Value::Float(f)),
                _ => Err(DbError::invalid_literal(data_type.as_str(), raw)),
            },
            DataType::Text => Ok(Value::Text(raw.to_string())),
        }
    }

    /// Fallback stored when a numeric literal cannot be parsed under
    /// `LiteralPolicy::Substitute`.
    pub fn sentinel(data_type: DataType) -> Self {
        match data_type {
            DataType::Integer => Value::Integer(SENTINEL_INTEGER),
            DataType::Float => Value::Float(SENTINEL_FLOAT),
            DataType::Text => Value::Text(String::new()),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::Text(_) => DataType::Text,
        }
    }

    /// Canonical stored text; always re-parses to the same value.
    pub fn raw(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
        }
    }

    /// Output form: quoted text, plain integers, floats with two decimals.
    pub fn display(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format!("{:.2}", f),
            Value::Text(s) => format!("'{}'", s),
        }
    }

    /// Text orders lexically against text; numbers order numerically with
    /// an integer promoted to float when the other side is a float. Any
    /// other pairing is an error.
    pub fn compare(&self, other: &Value) -> Result<Ordering, DbError> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
            (Value::Integer(a), Value::Float(b)) => Ok(compare_floats(*a as f64, *b)),
            (Value::Float(a), Value::Integer(b)) => Ok(compare_floats(*a, *b as f64)),
            (Value::Float(a), Value::Float(b)) => Ok(compare_floats(*a, *b)),
            _ => Err(DbError::incompatible_types(
                self.data_type().as_str(),
                other.data_type().as_str(),
            )),
        }
    }

    pub fn equals(&self, other: &Value) -> Result<bool, DbError> {
        Ok(self.compare(other)? == Ordering::Equal)
    }

    pub fn not_equals(&self, other: &Value) -> Result<bool, DbError> {
        Ok(!self.equals(other)?)
    }

    pub fn less_than(&self, other: &Value) -> Result<bool, DbError> {
        Ok(self.compare(other)? == Ordering::Less)
    }

    pub fn greater_than(&self, other: &Value) -> Result<bool, DbError> {
        Ok(self.compare(other)? == Ordering::Greater)
    }

    /// Defined as `!(self > other)`.
    pub fn less_or_equal(&self, other: &Value) -> Result<bool, DbError> {
        Ok(!self.greater_than(other)?)
    }

    /// Defined as `!(self < other)`.
    pub fn greater_or_equal(&self, other: &Value) -> Result<bool, DbError> {
        Ok(!self.less_than(other)?)
    }
}

// Stored floats are always finite, so partial_cmp never yields None.
fn compare_floats(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Name and type of a column as written in `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A table column: name, declared type and the column's values in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: String, data_type: DataType) -> Self {
        Self {
            name,
            data_type,
            values: Vec::new(),
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: Value) -> Result<(), DbError> {
        self.check_type(&value)?;
        self.values.push(value);
        Ok(())
    }

    pub fn set(&mut self, index: usize, value: Value) -> Result<(), DbError> {
        self.check_type(&value)?;
        let slot = self.values.get_mut(index).ok_or_else(|| {
            DbError::execution_error(&format!(
                "row index {} out of range for column {}",
                index, self.name
            ))
        })?;
        *slot = value;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Value, DbError> {
        if index >= self.values.len() {
            return Err(DbError::execution_error(&format!(
                "row index {} out of range for column {}",
                index, self.name
            )));
        }
        Ok(self.values.remove(index))
    }

    fn check_type(&self, value: &Value) -> Result<(), DbError> {
        if value.data_type() != self.data_type {
            return Err(DbError::execution_error(&format!(
                "value of type {} does not match column {} of type {}",
                value.data_type(),
                self.name,
                self.data_type
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(s: &str) -> Value {
        Value::parse(DataType::Integer, s).unwrap()
    }

    fn float(s: &str) -> Value {
        Value::parse(DataType::Float, s).unwrap()
    }

    fn text(s: &str) -> Value {
        Value::parse(DataType::Text, s).unwrap()
    }

    #[test]
    fn test_data_type_names_are_case_sensitive() {
        assert_eq!(DataType::from_string("INTEGER").unwrap(), DataType::Integer);
        assert_eq!(DataType::from_string("FLOAT").unwrap(), DataType::Float);
        assert_eq!(DataType::from_string("TEXT").unwrap(), DataType::Text);
        assert!(DataType::from_string("integer").is_err());
        assert!(DataType::from_string("INT").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_numeric_literals() {
        assert!(Value::parse(DataType::Integer, "abc").is_err());
        assert!(Value::parse(DataType::Integer, "1.5").is_err());
        assert!(Value::parse(DataType::Float, "x1").is_err());
        assert!(Value::parse(DataType::Float, "inf").is_err());
        assert!(matches!(
            Value::parse(DataType::Integer, "12abc"),
            Err(DbError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn test_text_accepts_anything() {
        assert_eq!(text(""), Value::Text(String::new()));
        assert_eq!(text("  a b "), Value::Text("  a b ".into()));
    }

    #[test]
    fn test_integer_display_is_canonical() {
        assert_eq!(int("007").display(), "7");
        assert_eq!(int("+42").display(), "42");
        assert_eq!(int(" -3 ").display(), "-3");

        for _ in 0..200 {
            let n = fastrand::i64(..);
            assert_eq!(int(&n.to_string()).display(), n.to_string());
        }
    }

    #[test]
    fn test_float_display_has_two_decimals() {
        assert_eq!(float("3").display(), "3.00");
        assert_eq!(float("3.14159").display(), "3.14");
        assert_eq!(float("-0.5").display(), "-0.50");

        for _ in 0..200 {
            let f = fastrand::f64() * 1000.0 - 500.0;
            let shown = float(&f.to_string()).display();
            let decimals = shown.split('.').nth(1).unwrap();
            assert_eq!(decimals.len(), 2, "{}", shown);
        }
    }

    #[test]
    fn test_text_display_is_quoted() {
        assert_eq!(text("Ann").display(), "'Ann'");
        assert_eq!(text("Ann").to_string(), "'Ann'");
    }

    #[test]
    fn test_raw_round_trips() {
        for v in [int("-17"), float("2.5"), float("3.0"), text("hi there")] {
            assert_eq!(Value::parse(v.data_type(), &v.raw()).unwrap(), v);
        }
    }

    #[test]
    fn test_integer_float_promotion() {
        assert!(int("3").equals(&float("3.0")).unwrap());
        assert!(float("2.5").less_than(&int("3")).unwrap());
        assert!(int("4").greater_than(&float("3.9")).unwrap());
    }

    #[test]
    fn test_text_vs_number_is_an_error() {
        assert!(matches!(
            text("3").equals(&int("3")),
            Err(DbError::IncompatibleTypes(_, _))
        ));
        assert!(float("1").compare(&text("1")).is_err());
        // the negated operators propagate the error as well
        assert!(text("3").less_or_equal(&int("3")).is_err());
        assert!(int("3").greater_or_equal(&text("3")).is_err());
    }

    #[test]
    fn test_less_or_equal_is_negated_greater_than() {
        let pairs = [
            (int("1"), int("2")),
            (int("2"), int("2")),
            (int("3"), float("2.5")),
            (float("2.0"), int("2")),
            (text("a"), text("b")),
            (text("b"), text("b")),
        ];
        for (a, b) in pairs.iter() {
            assert_eq!(
                a.less_or_equal(b).unwrap(),
                !a.greater_than(b).unwrap()
            );
            assert_eq!(
                a.greater_or_equal(b).unwrap(),
                !a.less_than(b).unwrap()
            );
        }
        assert!(int("2").less_or_equal(&int("2")).unwrap());
        assert!(int("2").greater_or_equal(&int("2")).unwrap());
    }

    #[test]
    fn test_text_compares_lexically() {
        assert!(text("Ann").less_than(&text("Bo")).unwrap());
        assert!(text("10").less_than(&text("9")).unwrap());
        assert!(text("x").not_equals(&text("y")).unwrap());
    }

    #[test]
    fn test_column_push_checks_type() {
        let mut col = Column::new("age".into(), DataType::Integer);
        col.push(int("30")).unwrap();
        assert!(col.push(text("thirty")).is_err());
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn test_column_set_and_remove() {
        let mut col = Column::new("gpa".into(), DataType::Float);
        col.push(float("3.5")).unwrap();
        col.push(float("3.0")).unwrap();

        col.set(1, float("3.9")).unwrap();
        assert_eq!(col.values()[1], float("3.9"));
        assert!(col.set(5, float("1.0")).is_err());
        assert!(col.set(0, int("1")).is_err());

        assert_eq!(col.remove(0).unwrap(), float("3.5"));
        assert_eq!(col.len(), 1);
        assert!(col.remove(3).is_err());
    }
}
