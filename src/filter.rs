use std::collections::BTreeSet;

use log::{debug, warn};

use crate::table::{Cell, Table};

pub const UNIT_COLUMN: &str = "Nm Unit";
pub const KLASIFIKASI_COLUMN: &str = "Klasifikasi";
pub const STATUS_COLUMN: &str = "Status";

/// Unit choice meaning "no unit filter".
pub const ALL_UNITS: &str = "Semua";

/// Row selection over the display-named output table. All active filters must match.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub unit: Option<String>,
    pub klasifikasi: Vec<String>,
    pub status: Vec<String>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.unit().is_none() && self.klasifikasi.is_empty() && self.status.is_empty()
    }

    fn unit(&self) -> Option<&str> {
        self.unit.as_deref().filter(|u| *u != ALL_UNITS)
    }

    pub fn apply(&self, table: &Table) -> Table {
        let mut predicates: Vec<(usize, Vec<&str>)> = Vec::new();

        if let Some(unit) = self.unit() {
            match table.column_index(UNIT_COLUMN) {
                Some(index) => predicates.push((index, vec![unit])),
                None => warn!("column {UNIT_COLUMN} not found, unit filter ignored"),
            }
        }
        for (column, values) in [
            (KLASIFIKASI_COLUMN, &self.klasifikasi),
            (STATUS_COLUMN, &self.status),
        ] {
            if values.is_empty() {
                continue;
            }
            match table.column_index(column) {
                Some(index) => {
                    predicates.push((index, values.iter().map(String::as_str).collect()))
                }
                None => warn!("column {column} not found, filter ignored"),
            }
        }

        let filtered = table.retain_rows(|row| {
            predicates.iter().all(|(index, accepted)| {
                row.get(*index)
                    .is_some_and(|cell| matches_any(cell, accepted))
            })
        });
        debug!("filter kept {} of {} rows", filtered.len(), table.len());
        filtered
    }
}

fn matches_any(cell: &Cell, accepted: &[&str]) -> bool {
    if cell.is_empty() {
        return false;
    }
    let value = cell.to_string();
    accepted.iter().any(|a| *a == value)
}

pub fn filter_options(table: &Table, column: &str) -> Vec<String> {
    table
        .column(column)
        .filter(|c| !c.is_empty())
        .map(Cell::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
