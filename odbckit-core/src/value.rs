//! Values fetched from result rows.
//!
//! Every cell is fetched from the driver as text where possible, with a
//! binary fallback for types the driver refuses to render as text. Typed
//! access parses that fetched representation on demand.

use std::fmt::{self, Display, Formatter};

use crate::error::BoxDynError;
use crate::type_info::OdbcTypeInfo;

/// A single cell of a result row.
#[derive(Debug, Clone)]
pub struct OdbcValue {
    pub(crate) type_info: OdbcTypeInfo,
    pub(crate) data: Option<Vec<u8>>,
    pub(crate) binary: bool,
}

impl OdbcValue {
    pub fn type_info(&self) -> &OdbcTypeInfo {
        &self.type_info
    }

    pub fn is_null(&self) -> bool {
        self.data.is_none()
    }

    /// The raw bytes the driver produced for this cell, or `None` for NULL.
    pub fn bytes(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Whether the cell was fetched through the binary fallback path.
    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn text(&self) -> Result<Option<&str>, BoxDynError> {
        match &self.data {
            None => Ok(None),
            Some(bytes) => Ok(Some(std::str::from_utf8(bytes)?)),
        }
    }

    pub fn int(&self) -> Result<Option<i64>, BoxDynError> {
        let text = match self.text()? {
            None => return Ok(None),
            Some(text) => text.trim(),
        };
        if let Ok(value) = text.parse::<i64>() {
            return Ok(Some(value));
        }
        // Some drivers render integer-valued decimals as "42.000"
        let value: f64 = text.parse()?;
        if value.fract() != 0.0 {
            return Err(format!("cannot decode {:?} as an integer", text).into());
        }
        Ok(Some(value as i64))
    }

    pub fn double(&self) -> Result<Option<f64>, BoxDynError> {
        match self.text()? {
            None => Ok(None),
            Some(text) => Ok(Some(text.trim().parse()?)),
        }
    }

    pub fn boolean(&self) -> Result<Option<bool>, BoxDynError> {
        let text = match self.text()? {
            None => return Ok(None),
            Some(text) => text.trim(),
        };
        match text {
            "0" | "false" | "FALSE" | "False" => Ok(Some(false)),
            "1" | "true" | "TRUE" | "True" => Ok(Some(true)),
            other => match other.parse::<i64>() {
                Ok(value) => Ok(Some(value != 0)),
                Err(_) => Err(format!("cannot decode {:?} as a boolean", other).into()),
            },
        }
    }
}

impl Display for OdbcValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.data {
            None => f.write_str("NULL"),
            Some(bytes) if self.binary => write!(f, "X'{}'", hex::encode(bytes)),
            Some(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_value(text: &str) -> OdbcValue {
        OdbcValue {
            type_info: OdbcTypeInfo::VARCHAR,
            data: Some(text.as_bytes().to_vec()),
            binary: false,
        }
    }

    fn null_value() -> OdbcValue {
        OdbcValue {
            type_info: OdbcTypeInfo::VARCHAR,
            data: None,
            binary: false,
        }
    }

    #[test]
    fn test_decodes_integers() {
        assert_eq!(text_value("42").int().unwrap(), Some(42));
        assert_eq!(text_value("-7").int().unwrap(), Some(-7));
        assert_eq!(null_value().int().unwrap(), None);
    }

    #[test]
    fn test_decodes_decimal_rendered_integers() {
        assert_eq!(text_value("42.000").int().unwrap(), Some(42));
        assert!(text_value("42.5").int().is_err());
        assert!(text_value("forty-two").int().is_err());
    }

    #[test]
    fn test_decodes_doubles() {
        assert_eq!(text_value("1.25").double().unwrap(), Some(1.25));
        assert_eq!(text_value(" 3 ").double().unwrap(), Some(3.0));
        assert_eq!(null_value().double().unwrap(), None);
    }

    #[test]
    fn test_decodes_booleans() {
        assert_eq!(text_value("1").boolean().unwrap(), Some(true));
        assert_eq!(text_value("0").boolean().unwrap(), Some(false));
        assert_eq!(text_value("true").boolean().unwrap(), Some(true));
        assert_eq!(text_value("FALSE").boolean().unwrap(), Some(false));
        assert!(text_value("yes").boolean().is_err());
    }

    #[test]
    fn test_displays_null_text_and_binary() {
        assert_eq!(null_value().to_string(), "NULL");
        assert_eq!(text_value("hello").to_string(), "hello");

        let binary = OdbcValue {
            type_info: OdbcTypeInfo::new(odbc_api::DataType::Varbinary { length: None }),
            data: Some(vec![0xde, 0xad]),
            binary: true,
        };
        assert_eq!(binary.to_string(), "X'dead'");
    }
}
