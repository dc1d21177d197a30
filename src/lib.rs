use std::fmt;

use anyhow::Error;
use log::{info, warn};

pub mod charts;
pub mod compliance;
pub mod dates;
pub mod export;
pub mod filter;
pub mod loader;
pub mod report;
pub mod table;
pub mod validate;

use charts::ChartSet;
use filter::RecordFilter;
use table::{HeaderMap, Table};

pub type Result<T> = std::result::Result<T, Error>;

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TaxType {
    Hiburan,
    MakanMinum,
}

impl TaxType {
    /// Normalized column names that must be present before computing.
    pub fn required_columns(&self) -> Vec<&'static str> {
        let mut required = vec![compliance::TMT_COLUMN, "NAMA OP", "NM UNIT"];
        if *self == TaxType::Hiburan {
            required.push("KLASIFIKASI");
        }
        required
    }
}

impl fmt::Display for TaxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaxType::Hiburan => "HIBURAN",
            TaxType::MakanMinum => "MAKAN MINUM",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub tax_type: TaxType,
    pub year: i32,
    pub table: Table,
    pub payment_columns: Vec<String>,
}

impl Dashboard {
    /// Fails only when required columns are missing, in which case nothing is computed.
    pub fn build(mut table: Table, tax_type: TaxType, year: i32) -> Result<Self> {
        let headers = HeaderMap::normalize(&mut table);
        validate::check_required_columns(&table, tax_type)?;

        let assessment = compliance::compute(&table, year);
        let mut table = assessment.table;
        headers.apply_display_names(&mut table);
        let payment_columns: Vec<String> = assessment
            .payment_columns
            .iter()
            .map(|c| headers.display_name(c))
            .collect();

        if payment_columns.is_empty() {
            warn!("no monthly payment columns found for {year}");
        } else {
            info!("found {} payment columns for {year}", payment_columns.len());
        }
        info!("computed compliance for {} taxpayers", table.len());

        Ok(Self {
            tax_type,
            year,
            table,
            payment_columns,
        })
    }

    pub fn has_payment_columns(&self) -> bool {
        !self.payment_columns.is_empty()
    }

    pub fn filtered(&self, filter: &RecordFilter) -> Table {
        if filter.is_empty() {
            self.table.clone()
        } else {
            filter.apply(&self.table)
        }
    }

    pub fn charts(&self, table: &Table) -> ChartSet {
        ChartSet::from_table(table, &self.payment_columns)
    }
}
