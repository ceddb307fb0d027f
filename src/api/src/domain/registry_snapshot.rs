/// Every row read from a registry file, plus how many rows had to be skipped
/// because they did not fit the header.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySnapshot<T> {
    pub records: Vec<T>,
    pub malformed_rows: usize,
}

impl<T> RegistrySnapshot<T> {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            malformed_rows: 0,
        }
    }

    /// Rows in the file, well formed or not.
    pub fn historic_total(&self) -> usize {
        self.records.len() + self.malformed_rows
    }
}

impl<T> Default for RegistrySnapshot<T> {
    fn default() -> Self {
        Self::empty()
    }
}
