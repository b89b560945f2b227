//! A row of output from a query.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use crate::column::OdbcColumn;
use crate::error::{BoxDynError, Error};
use crate::value::OdbcValue;

/// A single row from a result set.
///
/// Column metadata is shared between all rows of the same result set.
#[derive(Debug, Clone)]
pub struct OdbcRow {
    pub(crate) columns: Arc<[OdbcColumn]>,
    pub(crate) values: Vec<OdbcValue>,
}

/// A type that can index into a row, either by position or by column name.
pub trait RowIndex {
    fn index(&self, row: &OdbcRow) -> Result<usize, Error>;
}

impl RowIndex for usize {
    fn index(&self, row: &OdbcRow) -> Result<usize, Error> {
        if *self >= row.values.len() {
            return Err(Error::ColumnIndexOutOfBounds {
                index: *self,
                len: row.values.len(),
            });
        }
        Ok(*self)
    }
}

impl RowIndex for &str {
    fn index(&self, row: &OdbcRow) -> Result<usize, Error> {
        if let Some(position) = row.columns.iter().position(|column| column.name == *self) {
            return Ok(position);
        }
        // Fall back for drivers that upper-case or lower-case identifiers
        row.columns
            .iter()
            .position(|column| column.name.eq_ignore_ascii_case(self))
            .ok_or_else(|| Error::ColumnNotFound((*self).into()))
    }
}

impl OdbcRow {
    pub fn columns(&self) -> &[OdbcColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw value at the given index.
    pub fn try_get<I: RowIndex>(&self, index: I) -> Result<&OdbcValue, Error> {
        let position = index.index(self)?;
        Ok(&self.values[position])
    }

    pub fn is_null<I: RowIndex>(&self, index: I) -> Result<bool, Error> {
        Ok(self.try_get(index)?.is_null())
    }

    pub fn try_get_str<I: RowIndex>(&self, index: I) -> Result<Option<&str>, Error> {
        let position = index.index(self)?;
        self.values[position]
            .text()
            .map_err(|source| self.decode_error(position, source))
    }

    pub fn try_get_i64<I: RowIndex>(&self, index: I) -> Result<Option<i64>, Error> {
        let position = index.index(self)?;
        self.values[position]
            .int()
            .map_err(|source| self.decode_error(position, source))
    }

    pub fn try_get_f64<I: RowIndex>(&self, index: I) -> Result<Option<f64>, Error> {
        let position = index.index(self)?;
        self.values[position]
            .double()
            .map_err(|source| self.decode_error(position, source))
    }

    pub fn try_get_bool<I: RowIndex>(&self, index: I) -> Result<Option<bool>, Error> {
        let position = index.index(self)?;
        self.values[position]
            .boolean()
            .map_err(|source| self.decode_error(position, source))
    }

    fn decode_error(&self, position: usize, source: BoxDynError) -> Error {
        let index = self
            .columns
            .get(position)
            .map(|column| column.name.clone())
            .unwrap_or_else(|| position.to_string());
        Error::ColumnDecode { index, source }
    }
}

/// Renders the row as a parenthesized tuple, the way an interactive SQL
/// client would echo it.
impl Display for OdbcRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            Display::fmt(value, f)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_info::OdbcTypeInfo;

    fn create_test_row() -> OdbcRow {
        let columns: Arc<[OdbcColumn]> = Arc::from(vec![
            OdbcColumn {
                name: "id".to_string(),
                type_info: OdbcTypeInfo::BIGINT,
                ordinal: 0,
            },
            OdbcColumn {
                name: "Name".to_string(),
                type_info: OdbcTypeInfo::VARCHAR,
                ordinal: 1,
            },
            OdbcColumn {
                name: "score".to_string(),
                type_info: OdbcTypeInfo::DOUBLE,
                ordinal: 2,
            },
        ]);
        let values = vec![
            OdbcValue {
                type_info: OdbcTypeInfo::BIGINT,
                data: Some(b"7".to_vec()),
                binary: false,
            },
            OdbcValue {
                type_info: OdbcTypeInfo::VARCHAR,
                data: Some(b"alice".to_vec()),
                binary: false,
            },
            OdbcValue {
                type_info: OdbcTypeInfo::DOUBLE,
                data: None,
                binary: false,
            },
        ];
        OdbcRow { columns, values }
    }

    #[test]
    fn test_exact_column_match() {
        let row = create_test_row();
        assert_eq!(row.try_get_i64("id").unwrap(), Some(7));
    }

    #[test]
    fn test_case_insensitive_column_match() {
        let row = create_test_row();
        assert_eq!(row.try_get_str("name").unwrap(), Some("alice"));
        assert_eq!(row.try_get_str("NAME").unwrap(), Some("alice"));
    }

    #[test]
    fn test_exact_match_wins_over_case_insensitive() {
        let row = create_test_row();
        // "Name" matches the second column exactly even though "name"
        // would also match it case-insensitively
        assert_eq!(row.try_get("Name").unwrap().text().unwrap(), Some("alice"));
    }

    #[test]
    fn test_column_not_found() {
        let row = create_test_row();
        let error = row.try_get_str("missing").unwrap_err();
        assert!(matches!(error, Error::ColumnNotFound(name) if name == "missing"));
    }

    #[test]
    fn test_index_out_of_bounds() {
        let row = create_test_row();
        let error = row.try_get(3usize).unwrap_err();
        assert!(matches!(
            error,
            Error::ColumnIndexOutOfBounds { index: 3, len: 3 }
        ));
    }

    #[test]
    fn test_positional_access_and_null() {
        let row = create_test_row();
        assert_eq!(row.try_get_i64(0usize).unwrap(), Some(7));
        assert!(!row.is_null(0usize).unwrap());
        assert!(row.is_null(2usize).unwrap());
        assert_eq!(row.try_get_f64("score").unwrap(), None);
    }

    #[test]
    fn test_columns_method() {
        let row = create_test_row();
        assert_eq!(row.len(), 3);
        assert_eq!(row.columns()[1].name(), "Name");
        assert_eq!(row.columns()[1].ordinal(), 1);
    }

    #[test]
    fn test_display_renders_a_tuple() {
        let row = create_test_row();
        assert_eq!(row.to_string(), "(7, alice, NULL)");
    }
}
