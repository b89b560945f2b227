//! Column type information as reported by the ODBC driver.

use std::fmt::{self, Display, Formatter};

use odbc_api::DataType;

/// Type information for an ODBC result column, wrapping the SQL data type
/// the driver describes the column with.
#[derive(Debug, Clone, PartialEq)]
pub struct OdbcTypeInfo {
    data_type: DataType,
}

impl OdbcTypeInfo {
    pub const INTEGER: OdbcTypeInfo = OdbcTypeInfo::new(DataType::Integer);
    pub const BIGINT: OdbcTypeInfo = OdbcTypeInfo::new(DataType::BigInt);
    pub const DOUBLE: OdbcTypeInfo = OdbcTypeInfo::new(DataType::Double);
    pub const VARCHAR: OdbcTypeInfo = OdbcTypeInfo::new(DataType::Varchar { length: None });

    pub const fn new(data_type: DataType) -> Self {
        Self { data_type }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// The canonical SQL name of the type, without length or precision.
    pub fn name(&self) -> &'static str {
        data_type_name(&self.data_type)
    }

    /// Whether values of this type carry raw bytes rather than text.
    pub fn is_binary(&self) -> bool {
        matches!(
            self.data_type,
            DataType::Binary { .. } | DataType::Varbinary { .. } | DataType::LongVarbinary { .. }
        )
    }
}

impl Display for OdbcTypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

fn data_type_name(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Unknown => "UNKNOWN",
        DataType::Char { .. } => "CHAR",
        DataType::WChar { .. } => "NCHAR",
        DataType::Numeric { .. } => "NUMERIC",
        DataType::Decimal { .. } => "DECIMAL",
        DataType::Integer => "INTEGER",
        DataType::SmallInt => "SMALLINT",
        DataType::Float { .. } => "FLOAT",
        DataType::Real => "REAL",
        DataType::Double => "DOUBLE",
        DataType::Varchar { .. } => "VARCHAR",
        DataType::WVarchar { .. } => "NVARCHAR",
        DataType::LongVarchar { .. } => "TEXT",
        DataType::WLongVarchar { .. } => "NTEXT",
        DataType::Date => "DATE",
        DataType::Time { .. } => "TIME",
        DataType::Timestamp { .. } => "TIMESTAMP",
        DataType::BigInt => "BIGINT",
        DataType::TinyInt => "TINYINT",
        DataType::Bit => "BOOLEAN",
        DataType::Varbinary { .. } => "VARBINARY",
        DataType::Binary { .. } => "BINARY",
        DataType::LongVarbinary { .. } => "BLOB",
        DataType::Other { .. } => "OTHER",
    }
}
