//! Positional parameter values for `?` placeholders.

use chrono::{NaiveDate, NaiveDateTime};

/// A single value bound to a parameter marker.
///
/// ODBC binds these through the driver's input parameter conversion, so a
/// handful of wire shapes covers every SQL type: integers, doubles, text
/// and raw bytes. Dates and timestamps travel as ISO-8601 text, which every
/// supported driver accepts for its date types.
#[derive(Debug, Clone, PartialEq)]
pub enum OdbcArgumentValue {
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Null,
}

/// An ordered collection of values for the parameter markers of one
/// statement execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OdbcArguments {
    pub(crate) values: Vec<OdbcArgumentValue>,
}

impl OdbcArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: impl Into<OdbcArgumentValue>) {
        self.values.push(value.into());
    }

    pub fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

macro_rules! impl_into_int_argument {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for OdbcArgumentValue {
                fn from(value: $ty) -> Self {
                    OdbcArgumentValue::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_into_int_argument!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for OdbcArgumentValue {
    fn from(value: bool) -> Self {
        OdbcArgumentValue::Int(i64::from(value))
    }
}

impl From<f32> for OdbcArgumentValue {
    fn from(value: f32) -> Self {
        OdbcArgumentValue::Double(f64::from(value))
    }
}

impl From<f64> for OdbcArgumentValue {
    fn from(value: f64) -> Self {
        OdbcArgumentValue::Double(value)
    }
}

impl From<&str> for OdbcArgumentValue {
    fn from(value: &str) -> Self {
        OdbcArgumentValue::Text(value.to_string())
    }
}

impl From<String> for OdbcArgumentValue {
    fn from(value: String) -> Self {
        OdbcArgumentValue::Text(value)
    }
}

impl From<&[u8]> for OdbcArgumentValue {
    fn from(value: &[u8]) -> Self {
        OdbcArgumentValue::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for OdbcArgumentValue {
    fn from(value: Vec<u8>) -> Self {
        OdbcArgumentValue::Bytes(value)
    }
}

impl From<NaiveDate> for OdbcArgumentValue {
    fn from(value: NaiveDate) -> Self {
        OdbcArgumentValue::Text(value.format("%Y-%m-%d").to_string())
    }
}

impl From<NaiveDateTime> for OdbcArgumentValue {
    fn from(value: NaiveDateTime) -> Self {
        OdbcArgumentValue::Text(value.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    }
}

impl<T> From<Option<T>> for OdbcArgumentValue
where
    T: Into<OdbcArgumentValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => OdbcArgumentValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_values_in_order() {
        let mut args = OdbcArguments::new();
        args.add(1i64);
        args.add("two");
        args.add(3.0f64);
        assert_eq!(
            args.values,
            vec![
                OdbcArgumentValue::Int(1),
                OdbcArgumentValue::Text("two".to_string()),
                OdbcArgumentValue::Double(3.0),
            ]
        );
    }

    #[test]
    fn test_none_becomes_null() {
        let mut args = OdbcArguments::new();
        args.add(Option::<String>::None);
        args.add(Some(5i32));
        assert_eq!(
            args.values,
            vec![OdbcArgumentValue::Null, OdbcArgumentValue::Int(5)]
        );
    }

    #[test]
    fn test_dates_travel_as_iso_text() {
        let date = NaiveDate::from_ymd_opt(1994, 3, 17).unwrap();
        assert_eq!(
            OdbcArgumentValue::from(date),
            OdbcArgumentValue::Text("1994-03-17".to_string())
        );
    }

    #[test]
    fn test_bool_travels_as_int() {
        assert_eq!(OdbcArgumentValue::from(true), OdbcArgumentValue::Int(1));
        assert_eq!(OdbcArgumentValue::from(false), OdbcArgumentValue::Int(0));
    }
}
