//! Parser for sqllogictest-style `.test` files.
//!
//! A file is a sequence of records separated by blank lines. A record is a
//! directive line, optionally preceded by `skipif`/`onlyif` condition lines,
//! followed by its SQL body:
//!
//! ```text
//! statement ok
//! CREATE TABLE t (a INTEGER)
//!
//! query I rowsort
//! SELECT a FROM t
//! ----
//! 1
//! 2
//! ```
//!
//! Query expectations follow the `----` separator, one row per line with
//! values separated by tabs. Lines starting with `#` are comments.

use thiserror::Error;

/// How rows are ordered before comparing them to the expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Compare in the order the server returned them.
    NoSort,
    /// Sort whole rows lexicographically on both sides.
    RowSort,
    /// Flatten to single values, then sort both sides.
    ValueSort,
}

/// Declared type of one result column: `T`ext, `I`nteger or `R`eal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeChar {
    Text,
    Integer,
    Real,
}

/// A condition restricting a record to certain databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Skip the record when running against the named database.
    SkipIf(String),
    /// Skip the record unless running against the named database.
    OnlyIf(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Statement {
        conditions: Vec<Condition>,
        expect_error: bool,
        sql: String,
    },
    Query {
        conditions: Vec<Condition>,
        types: Vec<TypeChar>,
        sort: SortMode,
        label: Option<String>,
        sql: String,
        expected: Vec<String>,
    },
    /// Skip the whole file unless the runner satisfies the token.
    Require { token: String },
    /// Accepted for compatibility; hashed expectations are not produced.
    HashThreshold { threshold: u64 },
    /// Toggle skipping of subsequent records.
    Mode { skip: bool },
    /// Stop executing the file.
    Halt { conditions: Vec<Condition> },
}

#[derive(Debug, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

fn parse_error(index: usize, message: impl Into<String>) -> ParseError {
    ParseError {
        line: index + 1,
        message: message.into(),
    }
}

pub fn parse(input: &str) -> Result<Vec<Record>, ParseError> {
    let lines: Vec<&str> = input.lines().map(|line| line.trim_end_matches('\r')).collect();
    let mut records = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let trimmed = lines[i].trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            i += 1;
            continue;
        }

        let mut conditions = Vec::new();
        while i < lines.len() {
            let mut tokens = lines[i].trim().split_whitespace();
            let condition = match tokens.next() {
                Some("skipif") => Condition::SkipIf(expect_token(&mut tokens, i, "skipif")?),
                Some("onlyif") => Condition::OnlyIf(expect_token(&mut tokens, i, "onlyif")?),
                _ => break,
            };
            conditions.push(condition);
            i += 1;
        }
        if i >= lines.len() {
            return Err(parse_error(lines.len(), "conditions at end of file"));
        }

        let mut tokens = lines[i].trim().split_whitespace();
        let directive = tokens.next().unwrap_or_default();

        match directive {
            "statement" => {
                let expect_error = match tokens.next() {
                    Some("ok") => false,
                    Some("error") => true,
                    _ => {
                        return Err(parse_error(
                            i,
                            "expected `statement ok` or `statement error`",
                        ))
                    }
                };
                let (sql, next) = read_sql_until_blank(&lines, i + 1);
                if sql.is_empty() {
                    return Err(parse_error(i, "statement has no SQL"));
                }
                i = next;
                records.push(Record::Statement {
                    conditions,
                    expect_error,
                    sql,
                });
            }
            "query" => {
                let type_token = tokens
                    .next()
                    .ok_or_else(|| parse_error(i, "`query` needs a type string"))?;
                let types = parse_types(type_token).map_err(|message| parse_error(i, message))?;
                let mut sort = SortMode::NoSort;
                let mut label = None;
                if let Some(token) = tokens.next() {
                    match parse_sort_mode(token) {
                        Some(mode) => {
                            sort = mode;
                            label = tokens.next().map(String::from);
                        }
                        None => label = Some(token.to_string()),
                    }
                }
                i += 1;

                let mut sql_lines = Vec::new();
                let mut saw_separator = false;
                while i < lines.len() {
                    let line = lines[i].trim();
                    if line == "----" {
                        saw_separator = true;
                        i += 1;
                        break;
                    }
                    if line.is_empty() {
                        break;
                    }
                    if !line.starts_with('#') {
                        sql_lines.push(line);
                    }
                    i += 1;
                }
                let sql = sql_lines.join("\n");
                if sql.is_empty() {
                    return Err(parse_error(i, "query has no SQL"));
                }

                let mut expected = Vec::new();
                if saw_separator {
                    while i < lines.len() {
                        if lines[i].trim().is_empty() {
                            break;
                        }
                        expected.push(lines[i].to_string());
                        i += 1;
                    }
                }

                records.push(Record::Query {
                    conditions,
                    types,
                    sort,
                    label,
                    sql,
                    expected,
                });
            }
            "require" => {
                reject_conditions(&conditions, i, "require")?;
                let token = expect_token(&mut tokens, i, "require")?;
                records.push(Record::Require { token });
                i += 1;
            }
            "hash-threshold" => {
                reject_conditions(&conditions, i, "hash-threshold")?;
                let value = expect_token(&mut tokens, i, "hash-threshold")?;
                let threshold = value
                    .parse()
                    .map_err(|_| parse_error(i, format!("invalid threshold `{}`", value)))?;
                records.push(Record::HashThreshold { threshold });
                i += 1;
            }
            "mode" => {
                reject_conditions(&conditions, i, "mode")?;
                let skip = match tokens.next() {
                    Some("skip") => true,
                    Some("unskip") => false,
                    _ => return Err(parse_error(i, "expected `mode skip` or `mode unskip`")),
                };
                records.push(Record::Mode { skip });
                i += 1;
            }
            "halt" => {
                records.push(Record::Halt { conditions });
                i += 1;
            }
            other => {
                return Err(parse_error(i, format!("unknown record type `{}`", other)));
            }
        }
    }

    Ok(records)
}

/// Reads SQL lines up to the next blank line, dropping comment lines.
fn read_sql_until_blank(lines: &[&str], mut i: usize) -> (String, usize) {
    let mut sql_lines = Vec::new();
    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            break;
        }
        if !line.starts_with('#') {
            sql_lines.push(line);
        }
        i += 1;
    }
    (sql_lines.join("\n"), i)
}

fn expect_token(
    tokens: &mut std::str::SplitWhitespace<'_>,
    index: usize,
    directive: &str,
) -> Result<String, ParseError> {
    tokens
        .next()
        .map(|token| token.to_ascii_lowercase())
        .ok_or_else(|| parse_error(index, format!("`{}` needs an argument", directive)))
}

fn reject_conditions(
    conditions: &[Condition],
    index: usize,
    directive: &str,
) -> Result<(), ParseError> {
    if conditions.is_empty() {
        Ok(())
    } else {
        Err(parse_error(
            index,
            format!("`{}` does not take skipif/onlyif conditions", directive),
        ))
    }
}

fn parse_types(token: &str) -> Result<Vec<TypeChar>, String> {
    token
        .chars()
        .map(|c| match c {
            'T' => Ok(TypeChar::Text),
            'I' => Ok(TypeChar::Integer),
            'R' => Ok(TypeChar::Real),
            other => Err(format!("unknown column type `{}` (expected T, I or R)", other)),
        })
        .collect()
}

fn parse_sort_mode(token: &str) -> Option<SortMode> {
    match token {
        "nosort" => Some(SortMode::NoSort),
        "rowsort" => Some(SortMode::RowSort),
        "valuesort" => Some(SortMode::ValueSort),
        _ => None,
    }
}
