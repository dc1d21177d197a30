use std::{
    io::{Read, Seek},
    path::Path,
};

use anyhow::{Context, Error};
use calamine::{open_workbook, Data, Reader, Xlsx};
use log::info;

use crate::{
    dates,
    table::{Cell, Table},
    Result,
};

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Sheet names of the workbook at `file_path`. A CSV file has none.
pub fn sheet_names<P: AsRef<Path>>(file_path: P) -> Result<Vec<String>> {
    let path = file_path.as_ref();
    if is_csv(path) {
        return Ok(Vec::new());
    }
    let spreadsheet: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;
    Ok(spreadsheet.sheet_names())
}

/// Loads one sheet (the first when `sheet` is `None`) as a table keyed by its header row.
pub fn load_table<P: AsRef<Path>>(file_path: P, sheet: Option<&str>) -> Result<Table> {
    let path = file_path.as_ref();
    let table = if is_csv(path) {
        let rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        read_csv(rdr)?
    } else {
        let mut spreadsheet: Xlsx<_> = open_workbook(path)
            .with_context(|| format!("failed to open workbook {}", path.display()))?;
        read_sheet(&mut spreadsheet, sheet)?
    };
    info!(
        "loaded {} rows and {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

pub fn read_sheet<RS: Read + Seek>(workbook: &mut Xlsx<RS>, sheet: Option<&str>) -> Result<Table> {
    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .into_iter()
            .next()
            .context("workbook has no sheets")?,
    };
    let Ok(range) = workbook.worksheet_range(&sheet_name) else {
        return Err(Error::msg(format!("missing sheet {sheet_name}")));
    };

    let mut rows = range.rows();
    let headers = rows
        .next()
        .with_context(|| format!("sheet {sheet_name} has no header row"))?;
    let mut table = Table::new(
        headers
            .iter()
            .enumerate()
            .map(|(pos, h)| header_name(pos, h))
            .collect(),
    );
    for r in rows {
        table.push_row(r.iter().map(to_cell).collect());
    }
    Ok(table)
}

pub fn read_csv<R: Read>(mut rdr: csv::Reader<R>) -> Result<Table> {
    let headers = rdr.headers().context("failed to read CSV header")?;
    let mut table = Table::new(
        headers
            .iter()
            .enumerate()
            .map(|(pos, h)| header_name(pos, &Data::String(h.to_string())))
            .collect(),
    );
    for record in rdr.records() {
        let record = record?;
        table.push_row(
            record
                .iter()
                .map(|field| to_cell(&Data::String(field.to_string())))
                .collect(),
        );
    }
    Ok(table)
}

fn header_name(pos: usize, header: &Data) -> String {
    match to_cell(header) {
        Cell::Empty => format!("Unnamed: {pos}"),
        cell => cell.to_string(),
    }
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => {
            dates::from_excel_serial(dt.as_f64()).map_or(Cell::Number(dt.as_f64()), Cell::Date)
        }
        Data::DateTimeIso(s) => {
            dates::parse_date(s).map_or_else(|| Cell::Text(s.clone()), Cell::Date)
        }
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
