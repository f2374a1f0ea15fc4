use crate::errors::DbError;
use crate::row::Row;
use crate::table::Table;
use crate::tokenizer::unquote;
use crate::types::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    /// Anything else written in operator position. Evaluates to false.
    Unsupported(String),
}

impl ComparisonOp {
    pub fn parse(op: &str) -> Self {
        match op {
            "=" => ComparisonOp::Eq,
            "<>" => ComparisonOp::NotEq,
            "<" => ComparisonOp::Lt,
            ">" => ComparisonOp::Gt,
            "<=" => ComparisonOp::LtEq,
            ">=" => ComparisonOp::GtEq,
            other => ComparisonOp::Unsupported(other.to_string()),
        }
    }

    /// Applies the operator; `None` for an unsupported operator.
    pub fn apply(&self, left: &Value, right: &Value) -> Result<Option<bool>, DbError> {
        let result = match self {
            ComparisonOp::Eq => left.equals(right)?,
            ComparisonOp::NotEq => left.not_equals(right)?,
            ComparisonOp::Lt => left.less_than(right)?,
            ComparisonOp::Gt => left.greater_than(right)?,
            ComparisonOp::LtEq => left.less_or_equal(right)?,
            ComparisonOp::GtEq => left.greater_or_equal(right)?,
            ComparisonOp::Unsupported(_) => return Ok(None),
        };
        Ok(Some(result))
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::GtEq => ">=",
            ComparisonOp::Unsupported(op) => op,
        };
        f.write_str(op)
    }
}

/// `column op literal`, with the literal kept as written.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub op: ComparisonOp,
    pub literal: String,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: ComparisonOp, literal: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            literal: literal.into(),
        }
    }

    /// Evaluates against one row of `table`.
    ///
    /// A `table.` prefix on the column name is ignored. A column that does
    /// not exist makes the condition false. The literal is read as the type
    /// of the row's value, with one layer of quotes removed for text.
    pub fn evaluate(&self, table: &Table, row: &Row) -> Result<bool, DbError> {
        let name = strip_table_prefix(&self.column);
        let Some(row_value) = table.column_index(name).and_then(|index| row.get(index)) else {
            return Ok(false);
        };

        let data_type = row_value.data_type();
        let literal = if data_type.is_numeric() {
            self.literal.as_str()
        } else {
            unquote(&self.literal)
        };
        let comparison_value = Value::parse(data_type, literal)?;

        Ok(self
            .op
            .apply(row_value, &comparison_value)?
            .unwrap_or(false))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.op, self.literal)
    }
}

/// Boolean WHERE tree. Combinators nest to the left so evaluation follows
/// the written order with no precedence between AND and OR.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Condition(Condition),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
}

impl Expression {
    /// Both sides of AND/OR are always evaluated, so a comparison error
    /// anywhere in the tree fails the whole evaluation.
    pub fn evaluate(&self, table: &Table, row: &Row) -> Result<bool, DbError> {
        match self {
            Expression::Condition(condition) => condition.evaluate(table, row),
            Expression::And(left, right) => {
                let left = left.evaluate(table, row)?;
                let right = right.evaluate(table, row)?;
                Ok(left && right)
            }
            Expression::Or(left, right) => {
                let left = left.evaluate(table, row)?;
                let right = right.evaluate(table, row)?;
                Ok(left || right)
            }
        }
    }
}

/// Parses WHERE text of the form `cond ((AND|OR) cond)*`.
///
/// Blank text means no filter. Tokens that show up where AND/OR is
/// expected are skipped. A condition missing its operator or literal is
/// an error.
pub fn parse_where(text: &str) -> Result<Option<Expression>, DbError> {
    let words = split_words(text);
    if words.is_empty() {
        return Ok(None);
    }

    let mut i = 0;
    let mut root = parse_condition(&words, &mut i)?;

    while i < words.len() {
        let combinator = words[i].to_uppercase();
        i += 1;
        match combinator.as_str() {
            "AND" => {
                let right = parse_condition(&words, &mut i)?;
                root = Expression::And(Box::new(root), Box::new(right));
            }
            "OR" => {
                let right = parse_condition(&words, &mut i)?;
                root = Expression::Or(Box::new(root), Box::new(right));
            }
            _ => {}
        }
    }

    Ok(Some(root))
}

fn parse_condition(words: &[String], i: &mut usize) -> Result<Expression, DbError> {
    match words.get(*i..*i + 3) {
        Some([column, op, literal]) => {
            *i += 3;
            Ok(Expression::Condition(Condition::new(
                column.clone(),
                ComparisonOp::parse(op),
                literal.clone(),
            )))
        }
        _ => Err(DbError::parse_error(&format!(
            "incomplete condition in WHERE clause near '{}'",
            words[*i..].join(" ")
        ))),
    }
}

/// Whitespace split that keeps quoted runs, quotes included, as one word.
fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in text.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c == '\'' || c == '"' => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                quote = Some(c);
                current.push(c);
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// Everything after the first `.`, or the whole name when there is none.
pub fn strip_table_prefix(name: &str) -> &str {
    name.split_once('.').map_or(name, |(_, column)| column)
}
