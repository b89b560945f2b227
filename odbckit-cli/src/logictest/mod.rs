//! Discovers and runs sqllogictest-style `.test` suites over a live ODBC
//! connection.
//!
//! Each file runs on a fresh connection. The first failing record aborts
//! the run with a non-zero exit; files that fail to load or declare an
//! unsatisfied `require` are recorded in a skip log printed at the end.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use console::style;
use odbckit_core::{OdbcConnectOptions, OdbcConnection, OdbcRow};

use crate::opt::LogictestOpt;

mod parser;

use parser::{parse, Condition, Record, SortMode, TypeChar};

pub(crate) async fn run(opt: LogictestOpt) -> Result<()> {
    let options: OdbcConnectOptions = opt.conn_str.parse()?;
    println!("ODBC_CONN_STRING: {}", options.display_redacted());

    let files = discover(&opt)?;
    let total = files.len();
    let mut skip_log: Vec<String> = Vec::new();

    for (index, path) in files.iter().enumerate() {
        let display = path.strip_prefix(&opt.suite_dir).unwrap_or(path);
        println!("[{}/{}] {}", index + 1, total, display.display());

        let input = match std::fs::read_to_string(path) {
            Ok(input) => input,
            Err(e) => {
                println!("{}", style("SKIPPED").yellow());
                skip_log.push(format!("{}: {}", path.display(), e));
                continue;
            }
        };
        let records = match parse(&input) {
            Ok(records) => records,
            Err(e) => {
                println!("{}", style("SKIPPED").yellow());
                skip_log.push(format!("{}: {}", path.display(), e));
                continue;
            }
        };

        match run_file(&opt, &options, &records).await {
            FileOutcome::Passed => {
                println!("{}", style("ok").green());
            }
            FileOutcome::Skipped(reason) => {
                println!("{}", style("SKIPPED").yellow());
                skip_log.push(format!("{}: {}", path.display(), reason));
            }
            FileOutcome::Failed(message) => {
                println!("{}", style("ERROR").red());
                bail!("{}: {}", display.display(), message);
            }
        }
    }

    println!("{}", style("SUCCESS").green());
    for entry in skip_log {
        println!("skipped: {}", entry);
    }
    Ok(())
}

/// Collects the files to run, sorted by path.
///
/// With `--test-file` only that file runs. With `--dbms` the dialect's
/// subdirectory of the suite directory is walked, plus the shared
/// `connect.test` and `close.test` liveness files. With neither, only the
/// liveness files run.
fn discover(opt: &LogictestOpt) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if let Some(file) = &opt.test_file {
        files.push(file.clone());
    } else if let Some(dialect) = opt.dbms {
        let suite = opt.suite_dir.join(dialect.name().to_lowercase());
        let pattern = format!("{}/**/*.test", suite.display());
        let matches =
            glob::glob(&pattern).with_context(|| format!("invalid suite pattern `{}`", pattern))?;
        for entry in matches {
            files.push(entry?);
        }
        files.push(opt.suite_dir.join("close.test"));
        files.push(opt.suite_dir.join("connect.test"));
    } else {
        println!("Running connect/close SQLLogic tests");
        files.push(opt.suite_dir.join("close.test"));
        files.push(opt.suite_dir.join("connect.test"));
    }
    files.sort();
    Ok(files)
}

enum FileOutcome {
    Passed,
    Skipped(String),
    Failed(String),
}

async fn run_file(
    opt: &LogictestOpt,
    options: &OdbcConnectOptions,
    records: &[Record],
) -> FileOutcome {
    let dialect_token = opt.dbms.map(|dialect| dialect.name().to_ascii_lowercase());
    let dialect_token = dialect_token.as_deref();

    // Unsatisfied requirements skip the file before connecting
    for record in records {
        if let Record::Require { token } = record {
            if !require_satisfied(token, dialect_token) {
                return FileOutcome::Skipped(format!("requires {}", token));
            }
        }
    }

    let mut conn = match OdbcConnection::connect_with(options).await {
        Ok(conn) => conn,
        Err(e) => return FileOutcome::Failed(format!("connect failed: {}", e)),
    };

    let mut mode_skip = false;
    for record in records {
        match record {
            Record::Require { .. } | Record::HashThreshold { .. } => {}
            Record::Mode { skip } => mode_skip = *skip,
            Record::Halt { conditions } => {
                if !skipped(conditions, dialect_token) {
                    break;
                }
            }
            Record::Statement {
                conditions,
                expect_error,
                sql,
            } => {
                if mode_skip || skipped(conditions, dialect_token) {
                    continue;
                }
                if opt.debug {
                    println!("{}", sql);
                }
                match (conn.execute(sql).await, *expect_error) {
                    (Ok(_), false) | (Err(_), true) => {}
                    (Ok(_), true) => {
                        return FileOutcome::Failed(format!(
                            "statement succeeded but expected an error: {}",
                            sql
                        ));
                    }
                    (Err(e), false) => {
                        return FileOutcome::Failed(format!("statement failed: {}: {}", sql, e));
                    }
                }
            }
            Record::Query {
                conditions,
                types,
                sort,
                label: _,
                sql,
                expected,
            } => {
                if mode_skip || skipped(conditions, dialect_token) {
                    continue;
                }
                if opt.debug {
                    println!("{}", sql);
                }
                let rows = match conn.fetch_all(sql).await {
                    Ok(rows) => rows,
                    Err(e) => return FileOutcome::Failed(format!("query failed: {}: {}", sql, e)),
                };
                let actual = match render_rows(types, &rows) {
                    Ok(actual) => actual,
                    Err(message) => return FileOutcome::Failed(format!("{}: {}", sql, message)),
                };
                if let Err(message) = compare_rendered(*sort, expected, actual) {
                    return FileOutcome::Failed(format!("{}: {}", sql, message));
                }
            }
        }
    }

    if let Err(e) = conn.close().await {
        log::warn!("failed to close connection cleanly: {}", e);
    }
    FileOutcome::Passed
}

fn require_satisfied(token: &str, dialect: Option<&str>) -> bool {
    token == "odbc" || dialect == Some(token)
}

fn skipped(conditions: &[Condition], dialect: Option<&str>) -> bool {
    conditions.iter().any(|condition| match condition {
        Condition::SkipIf(name) => dialect == Some(name.as_str()),
        Condition::OnlyIf(name) => dialect != Some(name.as_str()),
    })
}

/// Renders rows the way expectations are written: one line per row, values
/// tab-separated, `NULL` for SQL NULL, `(empty)` for empty text, reals with
/// three decimal places.
fn render_rows(types: &[TypeChar], rows: &[OdbcRow]) -> Result<Vec<String>, String> {
    rows.iter()
        .map(|row| {
            if row.len() != types.len() {
                return Err(format!(
                    "expected {} columns, got {}",
                    types.len(),
                    row.len()
                ));
            }
            let values = types
                .iter()
                .enumerate()
                .map(|(index, ty)| render_value(row, index, *ty))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(values.join("\t"))
        })
        .collect()
}

fn render_value(row: &OdbcRow, index: usize, ty: TypeChar) -> Result<String, String> {
    match ty {
        TypeChar::Integer => match row.try_get_i64(index) {
            Ok(Some(value)) => Ok(value.to_string()),
            Ok(None) => Ok("NULL".to_string()),
            Err(e) => Err(e.to_string()),
        },
        TypeChar::Real => match row.try_get_f64(index) {
            Ok(Some(value)) => Ok(format!("{:.3}", value)),
            Ok(None) => Ok("NULL".to_string()),
            Err(e) => Err(e.to_string()),
        },
        TypeChar::Text => match row.try_get_str(index) {
            Ok(Some("")) => Ok("(empty)".to_string()),
            Ok(Some(value)) => Ok(value.to_string()),
            Ok(None) => Ok("NULL".to_string()),
            Err(e) => Err(e.to_string()),
        },
    }
}

fn compare_rendered(
    sort: SortMode,
    expected: &[String],
    mut actual: Vec<String>,
) -> Result<(), String> {
    let mut expected: Vec<String> = expected.to_vec();
    match sort {
        SortMode::NoSort => {}
        SortMode::RowSort => {
            expected.sort();
            actual.sort();
        }
        SortMode::ValueSort => {
            expected = split_values(&expected);
            actual = split_values(&actual);
            expected.sort();
            actual.sort();
        }
    }
    if expected != actual {
        return Err(format!(
            "expected rows:\n{}\ngot:\n{}",
            expected.join("\n"),
            actual.join("\n")
        ));
    }
    Ok(())
}

fn split_values(rows: &[String]) -> Vec<String> {
    rows.iter()
        .flat_map(|row| row.split('\t').map(String::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use odbckit_core::Dialect;

    fn lines(rows: &[&str]) -> Vec<String> {
        rows.iter().map(|row| row.to_string()).collect()
    }

    #[test]
    fn test_compare_exact_order_by_default() {
        let expected = lines(&["1", "2"]);
        assert!(compare_rendered(SortMode::NoSort, &expected, lines(&["1", "2"])).is_ok());
        assert!(compare_rendered(SortMode::NoSort, &expected, lines(&["2", "1"])).is_err());
    }

    #[test]
    fn test_compare_rowsort_ignores_order() {
        let expected = lines(&["2\tb", "1\ta"]);
        assert!(compare_rendered(SortMode::RowSort, &expected, lines(&["1\ta", "2\tb"])).is_ok());
    }

    #[test]
    fn test_compare_valuesort_flattens_rows() {
        // 4 values in any arrangement of rows
        assert!(compare_rendered(
            SortMode::ValueSort,
            &lines(&["1\t2", "3\t4"]),
            lines(&["3\t1", "4\t2"])
        )
        .is_ok());
        assert!(compare_rendered(
            SortMode::ValueSort,
            &lines(&["1\t2", "3\t4"]),
            lines(&["1\t2", "3\t5"])
        )
        .is_err());
    }

    #[test]
    fn test_compare_reports_both_sides() {
        let error =
            compare_rendered(SortMode::NoSort, &lines(&["1"]), lines(&["2"])).unwrap_err();
        assert!(error.contains("expected rows"));
        assert!(error.contains('1'));
        assert!(error.contains('2'));
    }

    #[test]
    fn test_require_satisfied() {
        assert!(require_satisfied("odbc", None));
        assert!(require_satisfied("duckdb", Some("duckdb")));
        assert!(!require_satisfied("duckdb", Some("mssql")));
        assert!(!require_satisfied("duckdb", None));
    }

    #[test]
    fn test_conditions_gate_on_dialect() {
        let skip_mssql = [Condition::SkipIf("mssql".to_string())];
        assert!(skipped(&skip_mssql, Some("mssql")));
        assert!(!skipped(&skip_mssql, Some("duckdb")));
        assert!(!skipped(&skip_mssql, None));

        let only_duckdb = [Condition::OnlyIf("duckdb".to_string())];
        assert!(!skipped(&only_duckdb, Some("duckdb")));
        assert!(skipped(&only_duckdb, Some("mssql")));
        assert!(skipped(&only_duckdb, None));
    }

    fn opt_for(dir: &std::path::Path) -> LogictestOpt {
        LogictestOpt {
            dbms: None,
            test_file: None,
            debug: false,
            suite_dir: dir.to_path_buf(),
            conn_str: String::new(),
        }
    }

    #[test]
    fn test_discover_defaults_to_liveness_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = discover(&opt_for(dir.path())).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("close.test"), dir.path().join("connect.test")]
        );
    }

    #[test]
    fn test_discover_walks_the_dialect_suite_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let suite = dir.path().join("duckdb");
        std::fs::create_dir_all(suite.join("nested")).unwrap();
        std::fs::write(suite.join("b.test"), "statement ok\nSELECT 1\n").unwrap();
        std::fs::write(suite.join("a.test"), "statement ok\nSELECT 1\n").unwrap();
        std::fs::write(suite.join("nested/c.test"), "statement ok\nSELECT 1\n").unwrap();
        std::fs::write(suite.join("notes.txt"), "not a test").unwrap();

        let mut opt = opt_for(dir.path());
        opt.dbms = Some(Dialect::DuckDb);
        let files = discover(&opt).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("close.test"),
                dir.path().join("connect.test"),
                suite.join("a.test"),
                suite.join("b.test"),
                suite.join("nested/c.test"),
            ]
        );
    }

    #[test]
    fn test_discover_single_file_override() {
        let dir = tempfile::tempdir().unwrap();
        let mut opt = opt_for(dir.path());
        opt.test_file = Some(dir.path().join("only.test"));
        let files = discover(&opt).unwrap();
        assert_eq!(files, vec![dir.path().join("only.test")]);
    }
}
