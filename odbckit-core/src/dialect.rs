//! Registry of DBMS dialects reachable over ODBC.
//!
//! The connectivity layer itself is dialect-agnostic; the tools built on it
//! need to know which server sits behind the driver to pick the right
//! version probe, DDL shape and parameter quirks.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::Error;

/// A database product with known SQL shapes and driver quirks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    ClickHouse,
    Db2,
    DuckDb,
    Firebird,
    FlightSql,
    MariaDb,
    Mssql,
    MySql,
    Oracle,
    PostgreSql,
    Snowflake,
    Spark,
}

/// Column types used where the toolkit owns the DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    BigInt,
    Integer,
    Decimal { precision: u8, scale: u8 },
    Char { length: u16 },
    Varchar { length: u16 },
    Date,
}

impl Dialect {
    pub const ALL: [Dialect; 12] = [
        Dialect::ClickHouse,
        Dialect::Db2,
        Dialect::DuckDb,
        Dialect::Firebird,
        Dialect::FlightSql,
        Dialect::MariaDb,
        Dialect::Mssql,
        Dialect::MySql,
        Dialect::Oracle,
        Dialect::PostgreSql,
        Dialect::Snowflake,
        Dialect::Spark,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::ClickHouse => "ClickHouse",
            Dialect::Db2 => "DB2",
            Dialect::DuckDb => "DuckDB",
            Dialect::Firebird => "Firebird",
            Dialect::FlightSql => "FlightSQL",
            Dialect::MariaDb => "MariaDB",
            Dialect::Mssql => "MSSQL",
            Dialect::MySql => "MySQL",
            Dialect::Oracle => "Oracle",
            Dialect::PostgreSql => "PostgreSQL",
            Dialect::Snowflake => "Snowflake",
            Dialect::Spark => "Spark",
        }
    }

    /// Maps the `SQL_DBMS_NAME` string reported by a driver to a dialect.
    ///
    /// Drivers decorate the product name in various ways ("DB2/LINUXX8664",
    /// "Firebird 4.0"), so matching is loose.
    pub fn from_dbms_name(name: &str) -> Option<Dialect> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("duckdb") {
            Some(Dialect::DuckDb)
        } else if lower.contains("postgres") {
            Some(Dialect::PostgreSql)
        } else if lower.contains("mariadb") {
            Some(Dialect::MariaDb)
        } else if lower.contains("mysql") {
            Some(Dialect::MySql)
        } else if lower.contains("clickhouse") {
            Some(Dialect::ClickHouse)
        } else if lower.contains("spark") {
            Some(Dialect::Spark)
        } else if lower.contains("flight") {
            Some(Dialect::FlightSql)
        } else if lower.contains("sql server") {
            Some(Dialect::Mssql)
        } else if lower.contains("oracle") {
            Some(Dialect::Oracle)
        } else if lower.starts_with("db2") {
            Some(Dialect::Db2)
        } else if lower.contains("snowflake") {
            Some(Dialect::Snowflake)
        } else if lower.contains("firebird") {
            Some(Dialect::Firebird)
        } else {
            None
        }
    }

    /// The statement that returns the server version as the first column of
    /// the first row.
    pub fn version_sql(&self) -> &'static str {
        match self {
            Dialect::ClickHouse
            | Dialect::DuckDb
            | Dialect::FlightSql
            | Dialect::MariaDb
            | Dialect::MySql
            | Dialect::PostgreSql
            | Dialect::Spark => "SELECT version()",
            Dialect::Mssql => "SELECT @@version",
            Dialect::Oracle => "SELECT * FROM PRODUCT_COMPONENT_VERSION",
            Dialect::Db2 => "SELECT * FROM SYSIBMADM.ENV_INST_INFO",
            Dialect::Snowflake => "SELECT current_version()",
            Dialect::Firebird => {
                "SELECT rdb$get_context('SYSTEM', 'ENGINE_VERSION') as version FROM rdb$database"
            }
        }
    }

    /// Whether `CREATE DATABASE` / `DROP DATABASE` are available to reset a
    /// scratch database over a plain connection.
    pub fn supports_create_database(&self) -> bool {
        matches!(
            self,
            Dialect::MariaDb | Dialect::Mssql | Dialect::MySql | Dialect::PostgreSql
        )
    }

    /// Whether the driver rejects binding decimals as doubles, requiring
    /// pre-formatted text instead.
    pub fn binds_decimal_as_text(&self) -> bool {
        matches!(self, Dialect::MariaDb | Dialect::Mssql | Dialect::MySql)
    }

    /// Upper bound on an inline VARCHAR length, where the server has one.
    pub fn max_varchar_len(&self) -> Option<u16> {
        match self {
            Dialect::Mssql => Some(8000),
            _ => None,
        }
    }

    pub fn sql_type(&self, ty: SqlType) -> String {
        match ty {
            SqlType::BigInt => match self {
                Dialect::Oracle => "NUMBER(19)".to_string(),
                _ => "BIGINT".to_string(),
            },
            SqlType::Integer => match self {
                Dialect::Oracle => "NUMBER(10)".to_string(),
                _ => "INTEGER".to_string(),
            },
            SqlType::Decimal { precision, scale } => match self {
                Dialect::Oracle => format!("NUMBER({}, {})", precision, scale),
                _ => format!("DECIMAL({}, {})", precision, scale),
            },
            SqlType::Char { length } => format!("CHAR({})", length),
            SqlType::Varchar { length } => {
                let length = match self.max_varchar_len() {
                    Some(max) => length.min(max),
                    None => length,
                };
                match self {
                    Dialect::Oracle => format!("VARCHAR2({})", length),
                    _ => format!("VARCHAR({})", length),
                }
            }
            SqlType::Date => "DATE".to_string(),
        }
    }

    pub fn create_table_sql(&self, table: &str, columns: &[(&str, SqlType)]) -> String {
        let columns = columns
            .iter()
            .map(|(name, ty)| format!("{} {}", name, self.sql_type(*ty)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({})", table, columns)
    }

    pub fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE {}", table)
    }

    /// A query returning a positive count in the first column when the table
    /// exists.
    pub fn table_exists_sql(&self, table: &str) -> String {
        match self {
            Dialect::Oracle => format!(
                "SELECT COUNT(*) FROM USER_TABLES WHERE TABLE_NAME = '{}'",
                table.to_uppercase()
            ),
            _ => format!(
                "SELECT COUNT(*) FROM information_schema.tables WHERE LOWER(table_name) = '{}'",
                table.to_lowercase()
            ),
        }
    }

    /// A single-row insert with one marker per column.
    pub fn insert_sql(&self, table: &str, columns: &[(&str, SqlType)]) -> String {
        format!("INSERT INTO {} VALUES ({})", table, self.values_tuple(columns))
    }

    /// A multi-row insert carrying `rows` tuples of markers.
    pub fn multi_insert_sql(
        &self,
        table: &str,
        columns: &[(&str, SqlType)],
        rows: usize,
    ) -> String {
        let tuple = format!("({})", self.values_tuple(columns));
        match self {
            // Oracle has no multi-VALUES form
            Dialect::Oracle => {
                let mut sql = String::from("INSERT ALL");
                for _ in 0..rows {
                    sql.push_str(" INTO ");
                    sql.push_str(table);
                    sql.push_str(" VALUES ");
                    sql.push_str(&tuple);
                }
                sql.push_str(" SELECT 1 FROM DUAL");
                sql
            }
            _ => format!("INSERT INTO {} VALUES {}", table, vec![tuple; rows].join(", ")),
        }
    }

    /// Selects the single row at `offset` in `order_by` order.
    pub fn select_one_at_offset_sql(&self, table: &str, order_by: &str, offset: usize) -> String {
        match self {
            Dialect::Db2 | Dialect::Mssql | Dialect::Oracle => format!(
                "SELECT * FROM {} ORDER BY {} OFFSET {} ROWS FETCH NEXT 1 ROWS ONLY",
                table, order_by, offset
            ),
            _ => format!(
                "SELECT * FROM {} ORDER BY {} LIMIT 1 OFFSET {}",
                table, order_by, offset
            ),
        }
    }

    fn values_tuple(&self, columns: &[(&str, SqlType)]) -> String {
        columns
            .iter()
            .map(|(_, ty)| self.parameter_marker(*ty))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Dates are bound as ISO text; Oracle needs an explicit conversion
    /// around the marker.
    fn parameter_marker(&self, ty: SqlType) -> &'static str {
        match (self, ty) {
            (Dialect::Oracle, SqlType::Date) => "TO_DATE(?, 'YYYY-MM-DD')",
            _ => "?",
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::ALL
            .iter()
            .copied()
            .find(|dialect| dialect.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnsupportedDbms(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_every_canonical_name() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.name().parse::<Dialect>().unwrap(), dialect);
            assert_eq!(
                dialect.name().to_lowercase().parse::<Dialect>().unwrap(),
                dialect
            );
        }
    }

    #[test]
    fn test_rejects_unknown_names() {
        let error = "access".parse::<Dialect>().unwrap_err();
        assert!(matches!(error, Error::UnsupportedDbms(name) if name == "access"));
    }

    #[test]
    fn test_maps_reported_dbms_names() {
        assert_eq!(
            Dialect::from_dbms_name("Microsoft SQL Server"),
            Some(Dialect::Mssql)
        );
        assert_eq!(Dialect::from_dbms_name("DB2/LINUXX8664"), Some(Dialect::Db2));
        assert_eq!(Dialect::from_dbms_name("Firebird 4.0"), Some(Dialect::Firebird));
        assert_eq!(Dialect::from_dbms_name("MariaDB"), Some(Dialect::MariaDb));
        assert_eq!(Dialect::from_dbms_name("MySQL"), Some(Dialect::MySql));
        assert_eq!(Dialect::from_dbms_name("PostgreSQL"), Some(Dialect::PostgreSql));
        assert_eq!(Dialect::from_dbms_name("DuckDB"), Some(Dialect::DuckDb));
        assert_eq!(Dialect::from_dbms_name("SomethingElse"), None);
    }

    #[test]
    fn test_version_probes() {
        assert_eq!(Dialect::DuckDb.version_sql(), "SELECT version()");
        assert_eq!(Dialect::Mssql.version_sql(), "SELECT @@version");
        assert_eq!(
            Dialect::Oracle.version_sql(),
            "SELECT * FROM PRODUCT_COMPONENT_VERSION"
        );
        assert_eq!(Dialect::Snowflake.version_sql(), "SELECT current_version()");
    }

    #[test]
    fn test_create_database_allowlist() {
        for dialect in Dialect::ALL {
            let expected = matches!(
                dialect,
                Dialect::MariaDb | Dialect::Mssql | Dialect::MySql | Dialect::PostgreSql
            );
            assert_eq!(dialect.supports_create_database(), expected);
        }
    }

    #[test]
    fn test_column_types_per_dialect() {
        assert_eq!(Dialect::DuckDb.sql_type(SqlType::BigInt), "BIGINT");
        assert_eq!(Dialect::Oracle.sql_type(SqlType::BigInt), "NUMBER(19)");
        assert_eq!(
            Dialect::Oracle.sql_type(SqlType::Decimal { precision: 15, scale: 2 }),
            "NUMBER(15, 2)"
        );
        assert_eq!(
            Dialect::PostgreSql.sql_type(SqlType::Varchar { length: 44 }),
            "VARCHAR(44)"
        );
        assert_eq!(
            Dialect::Oracle.sql_type(SqlType::Varchar { length: 44 }),
            "VARCHAR2(44)"
        );
    }

    #[test]
    fn test_mssql_caps_varchar_length() {
        assert_eq!(
            Dialect::Mssql.sql_type(SqlType::Varchar { length: 9000 }),
            "VARCHAR(8000)"
        );
        assert_eq!(
            Dialect::PostgreSql.sql_type(SqlType::Varchar { length: 9000 }),
            "VARCHAR(9000)"
        );
    }

    #[test]
    fn test_insert_sql_wraps_oracle_dates() {
        let columns: &[(&str, SqlType)] = &[
            ("ID", SqlType::BigInt),
            ("SHIPPED", SqlType::Date),
        ];
        assert_eq!(
            Dialect::PostgreSql.insert_sql("T", columns),
            "INSERT INTO T VALUES (?, ?)"
        );
        assert_eq!(
            Dialect::Oracle.insert_sql("T", columns),
            "INSERT INTO T VALUES (?, TO_DATE(?, 'YYYY-MM-DD'))"
        );
    }

    #[test]
    fn test_multi_insert_shapes() {
        let columns: &[(&str, SqlType)] = &[("A", SqlType::Integer)];
        assert_eq!(
            Dialect::MySql.multi_insert_sql("T", columns, 3),
            "INSERT INTO T VALUES (?), (?), (?)"
        );
        assert_eq!(
            Dialect::Oracle.multi_insert_sql("T", columns, 2),
            "INSERT ALL INTO T VALUES (?) INTO T VALUES (?) SELECT 1 FROM DUAL"
        );
    }

    #[test]
    fn test_offset_sample_shapes() {
        assert_eq!(
            Dialect::DuckDb.select_one_at_offset_sql("T", "A", 4096),
            "SELECT * FROM T ORDER BY A LIMIT 1 OFFSET 4096"
        );
        assert_eq!(
            Dialect::Mssql.select_one_at_offset_sql("T", "A", 4096),
            "SELECT * FROM T ORDER BY A OFFSET 4096 ROWS FETCH NEXT 1 ROWS ONLY"
        );
    }

    #[test]
    fn test_table_exists_shapes() {
        assert_eq!(
            Dialect::Oracle.table_exists_sql("lineitem"),
            "SELECT COUNT(*) FROM USER_TABLES WHERE TABLE_NAME = 'LINEITEM'"
        );
        assert_eq!(
            Dialect::DuckDb.table_exists_sql("LINEITEM"),
            "SELECT COUNT(*) FROM information_schema.tables WHERE LOWER(table_name) = 'lineitem'"
        );
    }
}
