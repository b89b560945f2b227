//! Connection options for an ODBC data source.

use std::fmt::{self, Debug, Formatter};
use std::str::FromStr;

use crate::error::Error;

/// Options which can be used to configure how an ODBC connection is opened.
///
/// Accepted input forms:
///
/// - `DSN=MyDataSource;UID=user;PWD=secret` (raw ODBC connection string)
/// - `Driver={PostgreSQL UNICODE};Server=localhost;Database=test`
/// - `FILEDSN=/path/to/file.dsn`
/// - `MyDataSource` (bare data source name, expanded to `DSN=MyDataSource`)
///
/// Each form may carry an `odbc:` scheme prefix, which is stripped.
#[derive(Clone)]
pub struct OdbcConnectOptions {
    pub(crate) conn_str: String,
}

impl OdbcConnectOptions {
    /// The connection string that will be passed to the driver manager.
    pub fn connection_string(&self) -> &str {
        &self.conn_str
    }

    /// The connection string with password attribute values masked, suitable
    /// for echoing to logs and terminals.
    pub fn display_redacted(&self) -> String {
        let redacted: Vec<String> = split_attributes(&self.conn_str)
            .into_iter()
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment.split_once('=') {
                Some((key, _)) if is_password_key(key.trim()) => format!("{}=***", key),
                _ => segment.to_string(),
            })
            .collect();
        let mut out = redacted.join(";");
        if self.conn_str.ends_with(';') {
            out.push(';');
        }
        out
    }
}

impl Debug for OdbcConnectOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdbcConnectOptions")
            .field("conn_str", &"<redacted>")
            .finish()
    }
}

impl FromStr for OdbcConnectOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut trimmed = s.trim();
        if let Some(rest) = trimmed.strip_prefix("odbc:") {
            trimmed = rest;
        }
        if trimmed.is_empty() {
            return Err(Error::Configuration("ODBC connection string is empty".into()));
        }
        // A bare word is a DSN name, everything else is passed through as-is
        let conn_str = if trimmed.contains('=') {
            trimmed.to_string()
        } else {
            format!("DSN={}", trimmed)
        };
        Ok(Self { conn_str })
    }
}

/// Splits on `;`, honoring ODBC brace escaping so that a `;` inside a
/// `{...}` attribute value does not end the segment.
fn split_attributes(s: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, byte) in s.bytes().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => {
                segments.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&s[start..]);
    segments
}

fn is_password_key(key: &str) -> bool {
    key.eq_ignore_ascii_case("pwd") || key.eq_ignore_ascii_case("password")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_raw_connection_string() {
        let options: OdbcConnectOptions = "DSN=test;UID=user".parse().unwrap();
        assert_eq!(options.connection_string(), "DSN=test;UID=user");
    }

    #[test]
    fn test_strips_odbc_prefix() {
        let options: OdbcConnectOptions = "odbc:Driver={SQLite3};Database=:memory:"
            .parse()
            .unwrap();
        assert_eq!(
            options.connection_string(),
            "Driver={SQLite3};Database=:memory:"
        );
    }

    #[test]
    fn test_expands_bare_dsn_name() {
        let options: OdbcConnectOptions = "MyDataSource".parse().unwrap();
        assert_eq!(options.connection_string(), "DSN=MyDataSource");

        let options: OdbcConnectOptions = "odbc:MyDataSource".parse().unwrap();
        assert_eq!(options.connection_string(), "DSN=MyDataSource");
    }

    #[test]
    fn test_rejects_empty_connection_string() {
        assert!("".parse::<OdbcConnectOptions>().is_err());
        assert!("odbc:".parse::<OdbcConnectOptions>().is_err());
        assert!("   ".parse::<OdbcConnectOptions>().is_err());
    }

    #[test]
    fn test_debug_never_reveals_connection_string() {
        let options: OdbcConnectOptions = "DSN=test;PWD=hunter2".parse().unwrap();
        let debugged = format!("{:?}", options);
        assert!(!debugged.contains("hunter2"));
        assert!(debugged.contains("<redacted>"));
    }

    #[test]
    fn test_display_redacted_masks_passwords() {
        let options: OdbcConnectOptions = "DSN=test;UID=user;PWD=hunter2".parse().unwrap();
        assert_eq!(options.display_redacted(), "DSN=test;UID=user;PWD=***");

        let options: OdbcConnectOptions = "Server=db;Password=hunter2;Port=5432"
            .parse()
            .unwrap();
        assert_eq!(options.display_redacted(), "Server=db;Password=***;Port=5432");
    }

    #[test]
    fn test_display_redacted_keeps_braced_values_whole() {
        let options: OdbcConnectOptions = "Driver={My;Driver};PWD={p;w};UID=user"
            .parse()
            .unwrap();
        assert_eq!(
            options.display_redacted(),
            "Driver={My;Driver};PWD=***;UID=user"
        );
    }

    #[test]
    fn test_display_redacted_keeps_trailing_separator() {
        let options: OdbcConnectOptions = "Driver={DuckDB Driver};".parse().unwrap();
        assert_eq!(options.display_redacted(), "Driver={DuckDB Driver};");
    }
}
