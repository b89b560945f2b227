/// The outcome of a statement execution that does not return rows.
#[derive(Debug, Default)]
pub struct OdbcQueryResult {
    pub(crate) rows_affected: u64,
}

impl OdbcQueryResult {
    /// Number of rows inserted, updated or deleted, as reported by the
    /// driver. Zero when the driver does not report a count.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }
}

impl Extend<OdbcQueryResult> for OdbcQueryResult {
    fn extend<T: IntoIterator<Item = OdbcQueryResult>>(&mut self, iter: T) {
        for result in iter {
            self.rows_affected += result.rows_affected;
        }
    }
}
