use crate::config::EngineConfig;
use crate::errors::DbError;
use crate::executor::{QueryExecutor, QueryResult};
use crate::parser::parse_script;
use crate::storage::{JsonFileStorage, Storage};
use log::{debug, error};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

pub const PROMPT: &str = "> ";

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// A statement, `;` included
    Sql(String),
    /// List the tables of the current database
    ListTables,
    /// Show the help text
    Help,
    /// Leave the session
    Quit,
}

/// Counts from one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub executed: usize,
    pub failed: usize,
}

/// Interactive and batch front end over a `QueryExecutor`.
pub struct DatabaseCli<S: Storage> {
    executor: QueryExecutor<S>,
}

impl DatabaseCli<JsonFileStorage> {
    pub fn from_config(config: EngineConfig) -> Self {
        Self::new(QueryExecutor::with_file_storage(config))
    }
}

impl<S: Storage> DatabaseCli<S> {
    pub fn new(executor: QueryExecutor<S>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &QueryExecutor<S> {
        &self.executor
    }

    /// Reads statements line by line until EOF or `EXIT;`. Every line must
    /// end with `;`, except the `.` meta commands.
    pub fn run_interactive<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "Entering interactive mode. Type SQL commands followed by a semicolon (;) to execute."
        )?;
        writeln!(out, "Type EXIT; or .quit to leave, .help for help.")?;

        let mut lines = input.lines();
        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;

            match self.parse_command(&line) {
                Ok(None) => continue,
                Ok(Some(CliCommand::Quit)) => {
                    writeln!(out, "Exiting interactive mode.")?;
                    break;
                }
                Ok(Some(command)) => self.execute_command(command, out)?,
                Err(message) => writeln!(out, "{}", message)?,
            }
        }

        Ok(())
    }

    /// Runs a whole script. SELECT results go to `results`, status lines and
    /// errors to `status`. Statements that do not parse are logged and
    /// skipped; a failing statement does not stop the run.
    pub fn run_batch<W: Write, E: Write>(
        &mut self,
        script: &str,
        results: &mut W,
        status: &mut E,
    ) -> io::Result<BatchSummary> {
        let mut summary = BatchSummary::default();

        for statement in parse_script(script) {
            match self.executor.execute_statement(statement) {
                Ok(result @ QueryResult::Select { .. }) => {
                    result.write_csv(results)?;
                    summary.executed += 1;
                }
                Ok(QueryResult::Success { message, .. }) => {
                    writeln!(status, "{}", message)?;
                    summary.executed += 1;
                }
                Err(e) => {
                    error!("statement failed: {}", e);
                    writeln!(status, "Error: {}", e)?;
                    summary.failed += 1;
                }
            }
        }
        results.flush()?;

        debug!(
            "batch finished: {} executed, {} failed",
            summary.executed, summary.failed
        );
        Ok(summary)
    }

    /// Batch mode over files: reads `input`, writes SELECT output to `output`
    /// and status lines to stdout.
    pub fn run_file(&mut self, input: &Path, output: &Path) -> Result<BatchSummary, DbError> {
        let script = fs::read_to_string(input).map_err(|e| {
            DbError::FileSystemError(format!("could not read {}: {}", input.display(), e))
        })?;
        let file = fs::File::create(output).map_err(|e| {
            DbError::FileSystemError(format!("could not create {}: {}", output.display(), e))
        })?;

        let mut results = io::BufWriter::new(file);
        let mut status = io::stdout().lock();
        Ok(self.run_batch(&script, &mut results, &mut status)?)
    }

    /// `Ok(None)` for a blank line; `Err` carries the message to show.
    fn parse_command(&self, line: &str) -> Result<Option<CliCommand>, String> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        if trimmed.starts_with('.') {
            return match trimmed {
                ".help" | ".h" => Ok(Some(CliCommand::Help)),
                ".quit" | ".q" | ".exit" => Ok(Some(CliCommand::Quit)),
                ".tables" | ".t" => Ok(Some(CliCommand::ListTables)),
                _ => Err(format!("Unknown command: {}", trimmed)),
            };
        }

        if trimmed == "EXIT;" || trimmed == "exit;" {
            return Ok(Some(CliCommand::Quit));
        }
        if !trimmed.ends_with(';') {
            return Err("Command must end with a semicolon (;)".to_string());
        }

        Ok(Some(CliCommand::Sql(trimmed.to_string())))
    }

    fn execute_command<W: Write>(&mut self, command: CliCommand, out: &mut W) -> io::Result<()> {
        match command {
            CliCommand::Sql(sql) => match self.executor.execute_sql(&sql) {
                Ok(result @ QueryResult::Select { .. }) => result.write_csv(out),
                Ok(QueryResult::Success { message, .. }) => writeln!(out, "{}", message),
                Err(e) if e.is_parse_error() => {
                    writeln!(out, "Failed to parse command: {}", e)
                }
                Err(e) => writeln!(out, "Error: {}", e),
            },
            CliCommand::ListTables => match self.executor.table_names() {
                Ok(names) if names.is_empty() => writeln!(out, "No tables yet"),
                Ok(names) => {
                    for name in names {
                        writeln!(out, "{}", name)?;
                    }
                    Ok(())
                }
                Err(e) => writeln!(out, "Error: {}", e),
            },
            CliCommand::Help => self.show_help(out),
            CliCommand::Quit => Ok(()),
        }
    }

    fn show_help<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Meta commands:")?;
        writeln!(out, "  .help, .h              show this help")?;
        writeln!(out, "  .tables, .t            list tables of the current database")?;
        writeln!(out, "  .quit, .q, EXIT;       leave")?;
        writeln!(out)?;
        writeln!(out, "Statements (end each with ;):")?;
        writeln!(out, "  CREATE DATABASE name")?;
        writeln!(out, "  USE DATABASE name")?;
        writeln!(out, "  CREATE TABLE name (col TYPE, ...)      TYPE is INTEGER, FLOAT or TEXT")?;
        writeln!(out, "  DROP TABLE name")?;
        writeln!(out, "  INSERT INTO name VALUES (v, ...)")?;
        writeln!(out, "  SELECT cols FROM name [INNER JOIN t ON a.x = t.y]... [WHERE cond]")?;
        writeln!(out, "  UPDATE name SET col = v, ... [WHERE cond]")?;
        writeln!(out, "  DELETE FROM name [WHERE cond]")?;
        writeln!(out)?;
        writeln!(out, "Conditions: col op literal joined by AND / OR, read left to right.")?;
        writeln!(out, "Operators: =, <>, <, >, <=, >=")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::io::Cursor;

    fn memory_cli() -> DatabaseCli<MemoryStorage> {
        DatabaseCli::new(QueryExecutor::new(
            MemoryStorage::new(),
            EngineConfig::default(),
        ))
    }

    const SCRIPT: &str = "
        CREATE DATABASE school;
        USE DATABASE school;
        CREATE TABLE student (ID INTEGER, Name TEXT, GPA FLOAT);
        INSERT INTO student VALUES (1, 'Ann', 3.5);
        INSERT INTO student VALUES (2, 'Bo; Jr', 3.0);
        NONSENSE HERE;
        SELECT Name FROM student WHERE GPA > 3.1;
        SELECT * FROM missing;
        SELECT ID, Name FROM student
    ";

    #[test]
    fn test_run_batch() {
        let mut cli = memory_cli();
        let mut results = Vec::new();
        let mut status = Vec::new();

        let summary = cli.run_batch(SCRIPT, &mut results, &mut status).unwrap();

        assert_eq!(summary, BatchSummary { executed: 7, failed: 1 });
        assert_eq!(
            String::from_utf8(results).unwrap(),
            "Name\n'Ann'\n---\nID,Name\n1,'Ann'\n2,'Bo; Jr'\n---\n"
        );
        let status = String::from_utf8(status).unwrap();
        assert!(status.contains("Table student created"));
        assert!(status.contains("Error: Table 'missing' not found"));
    }

    #[test]
    fn test_parse_command() {
        let cli = memory_cli();
        assert_eq!(cli.parse_command("   "), Ok(None));
        assert_eq!(cli.parse_command(".help"), Ok(Some(CliCommand::Help)));
        assert_eq!(cli.parse_command(".tables"), Ok(Some(CliCommand::ListTables)));
        assert_eq!(cli.parse_command("EXIT;"), Ok(Some(CliCommand::Quit)));
        assert_eq!(cli.parse_command("exit;"), Ok(Some(CliCommand::Quit)));
        assert!(cli.parse_command(".bogus").is_err());
        assert!(cli.parse_command("SELECT * FROM t").is_err());
        assert_eq!(
            cli.parse_command(" SELECT * FROM t; "),
            Ok(Some(CliCommand::Sql("SELECT * FROM t;".into())))
        );
    }

    #[test]
    fn test_interactive_session() {
        let mut cli = memory_cli();
        let input = "CREATE DATABASE d;\n\
                     USE DATABASE d;\n\
                     CREATE TABLE t (a INTEGER)\n\
                     CREATE TABLE t (a INTEGER);\n\
                     INSERT INTO t VALUES (7);\n\
                     .tables\n\
                     SELECT * FROM t;\n\
                     FROB;\n\
                     EXIT;\n\
                     SELECT * FROM never;\n";
        let mut out = Vec::new();

        cli.run_interactive(Cursor::new(input), &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("> Database d created"));
        assert!(out.contains("Command must end with a semicolon (;)"));
        assert!(out.contains("> t\n"));
        assert!(out.contains("a\n7\n---\n"));
        assert!(out.contains("Failed to parse command"));
        assert!(out.ends_with("Exiting interactive mode.\n"));
        assert!(!out.contains("never"));
    }

    #[test]
    fn test_interactive_stops_at_eof() {
        let mut cli = memory_cli();
        let mut out = Vec::new();
        cli.run_interactive(Cursor::new(".tables\n"), &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Error: No database selected"));
        assert!(out.ends_with(PROMPT));
    }

    #[test]
    fn test_run_file() {
        let dir = std::env::temp_dir().join(format!("minidb-cli-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("input.sql");
        let output = dir.join("output.csv");
        fs::write(&input, SCRIPT).unwrap();

        let config = EngineConfig::default().with_data_directory(dir.join("databases"));
        let mut cli = DatabaseCli::from_config(config);
        let summary = cli.run_file(&input, &output).unwrap();

        assert_eq!(summary.failed, 1);
        assert!(fs::read_to_string(&output).unwrap().starts_with("Name\n'Ann'\n---\n"));
        assert!(dir.join("databases").join("school.json").is_file());

        fs::remove_dir_all(&dir).unwrap();
    }
}
