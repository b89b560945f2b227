use crate::type_info::OdbcTypeInfo;

/// Metadata for a single column of a result set.
#[derive(Debug, Clone)]
pub struct OdbcColumn {
    pub(crate) name: String,
    pub(crate) type_info: OdbcTypeInfo,
    pub(crate) ordinal: usize,
}

impl OdbcColumn {
    /// The column name reported by the driver, or `colN` when the driver
    /// reports a name that is not valid UTF-8.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_info(&self) -> &OdbcTypeInfo {
        &self.type_info
    }

    /// Zero-based position of the column in the result set.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}
