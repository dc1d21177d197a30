use thiserror::Error;

use crate::{table::Table, TaxType};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required columns missing: {}. Please check your file.", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Checks that every column required for `tax_type` is present in the normalized `table`.
pub fn check_required_columns(table: &Table, tax_type: TaxType) -> Result<(), ValidationError> {
    let missing: Vec<String> = tax_type
        .required_columns()
        .into_iter()
        .filter(|c| !table.has_column(c))
        .map(String::from)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingColumns(missing))
    }
}
