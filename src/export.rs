use std::path::Path;

use rust_xlsxwriter::{
    Chart, ChartFormat, ChartMarker, ChartSolidFill, ChartType, Format, Workbook, Worksheet,
};

use crate::{
    charts::ChartSet,
    dates,
    table::{Cell, Table},
    Result, TaxType,
};

pub const DATA_SHEET: &str = "Data";
pub const CHART_SHEET: &str = "Grafik";

const DATE_NUM_FORMAT: &str = "yyyy-mm-dd";
const TOP_TAXPAYERS_COLOR: u32 = 0xA0CED9;

pub fn default_file_name(tax_type: TaxType, year: i32) -> String {
    format!("dashboard_SAFE_{tax_type}_{year}.xlsx")
}

pub fn write_xlsx(table: &Table, charts: &ChartSet) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    write_data_sheet(workbook.add_worksheet(), table)?;
    write_chart_sheet(workbook.add_worksheet(), charts)?;
    Ok(workbook.save_to_buffer()?)
}

pub fn save_xlsx<P: AsRef<Path>>(file_path: P, table: &Table, charts: &ChartSet) -> Result<()> {
    let payload = write_xlsx(table, charts)?;
    std::fs::write(&file_path, payload)?;
    println!(
        "The dashboard was written as XLSX to file {}",
        file_path.as_ref().to_string_lossy()
    );
    Ok(())
}

fn write_data_sheet(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    worksheet.set_name(DATA_SHEET)?;
    let header = Format::new().set_bold();
    let date = Format::new().set_num_format(DATE_NUM_FORMAT);

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header)?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row32 = row_idx as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col16 = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Number(n) => {
                    worksheet.write_number(row32, col16, *n)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(row32, col16, s)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(row32, col16, *b)?;
                }
                Cell::Date(d) => {
                    worksheet.write_number_with_format(
                        row32,
                        col16,
                        dates::to_excel_serial(*d),
                        &date,
                    )?;
                }
            }
        }
    }
    Ok(())
}

/// Writes each chart's data as a two-column block and plots it beside the block.
fn write_chart_sheet(worksheet: &mut Worksheet, charts: &ChartSet) -> Result<()> {
    worksheet.set_name(CHART_SHEET)?;
    let header = Format::new().set_bold();

    // Trend in columns A:B, top taxpayers in D:E, distribution in G:H.
    let trend: Vec<(String, f64)> = charts
        .monthly_trend
        .iter()
        .map(|m| (m.column.clone(), m.total))
        .collect();
    let titles = ("Bulan", "Total Pembayaran");
    if let Some(last_row) = write_block(worksheet, 0, titles, &trend, &header)? {
        let mut chart = Chart::new(ChartType::Line);
        chart
            .add_series()
            .set_name("Total Pembayaran")
            .set_categories((CHART_SHEET, 1, 0, last_row, 0))
            .set_values((CHART_SHEET, 1, 1, last_row, 1))
            .set_marker(ChartMarker::new().set_automatic());
        chart.title().set_name("Total Pembayaran Pajak per Bulan");
        chart.legend().set_hidden();
        worksheet.insert_chart(1, 9, &chart)?;
    }

    let top: Vec<(String, f64)> = charts
        .top_taxpayers
        .iter()
        .map(|t| (t.name.clone(), t.total))
        .collect();
    let titles = ("Nama Op", "Total Pembayaran");
    if let Some(last_row) = write_block(worksheet, 3, titles, &top, &header)? {
        let mut chart = Chart::new(ChartType::Column);
        chart
            .add_series()
            .set_name("Total Pembayaran")
            .set_categories((CHART_SHEET, 1, 3, last_row, 3))
            .set_values((CHART_SHEET, 1, 4, last_row, 4))
            .set_format(
                ChartFormat::new()
                    .set_solid_fill(ChartSolidFill::new().set_color(TOP_TAXPAYERS_COLOR)),
            );
        chart.title().set_name("Top 20 WP");
        chart.legend().set_hidden();
        worksheet.insert_chart(17, 9, &chart)?;
    }

    let distribution: Vec<(String, f64)> = charts
        .tier_distribution
        .iter()
        .map(|t| (t.tier.clone(), t.count as f64))
        .collect();
    let titles = ("Klasifikasi", "Jumlah");
    if let Some(last_row) = write_block(worksheet, 6, titles, &distribution, &header)? {
        let mut chart = Chart::new(ChartType::Doughnut);
        chart
            .add_series()
            .set_name("Jumlah")
            .set_categories((CHART_SHEET, 1, 6, last_row, 6))
            .set_values((CHART_SHEET, 1, 7, last_row, 7));
        chart.title().set_name("Distribusi Kepatuhan");
        worksheet.insert_chart(33, 9, &chart)?;
    }
    Ok(())
}

/// Returns the last data row written, or `None` when `rows` is empty.
fn write_block(
    worksheet: &mut Worksheet,
    first_col: u16,
    titles: (&str, &str),
    rows: &[(String, f64)],
    header: &Format,
) -> Result<Option<u32>> {
    if rows.is_empty() {
        return Ok(None);
    }
    worksheet.write_string_with_format(0, first_col, titles.0, header)?;
    worksheet.write_string_with_format(0, first_col + 1, titles.1, header)?;
    for (i, (label, value)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        worksheet.write_string(row, first_col, label)?;
        worksheet.write_number(row, first_col + 1, *value)?;
    }
    Ok(Some(rows.len() as u32))
}

pub fn write_detail_as_csv<P: AsRef<Path>>(table: &Table, file_path: P) -> Result<()> {
    let mut wtr = csv::Writer::from_path(&file_path)?;
    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(Cell::to_string))?;
    }
    wtr.flush()?;
    println!(
        "The compliance detail was written as CSV to file {}",
        file_path.as_ref().to_string_lossy()
    );
    Ok(())
}
