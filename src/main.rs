use std::path::PathBuf;

use clap::Parser;
use kepatuhan_pajak::{
    export::{default_file_name, save_xlsx, write_detail_as_csv},
    filter::RecordFilter,
    loader::{load_table, sheet_names},
    report::{print_dashboard, print_filter_options},
    Dashboard, Result, TaxType, MAX_YEAR, MIN_YEAR,
};

/// Tax compliance dashboard: computes how regularly each taxpayer paid during a fiscal
/// year and classifies it as Kurang Patuh, Cukup Patuh or Patuh.
#[derive(Parser, Debug)]
#[command(name = "kepatuhan", version, about)]
struct Args {
    /// Workbook (.xlsx) or CSV file with one row per taxpayer.
    input: PathBuf,

    /// Sheet to read; defaults to the first sheet.
    #[arg(long, value_name = "NAME")]
    sheet: Option<String>,

    /// Print the workbook's sheet names and exit.
    #[arg(long, default_value_t = false)]
    list_sheets: bool,

    /// Tax type; HIBURAN additionally requires a KLASIFIKASI column.
    #[arg(long, value_enum, default_value_t = TaxType::Hiburan)]
    tax_type: TaxType,

    /// Fiscal year to evaluate.
    #[arg(
        long,
        default_value_t = 2024,
        value_parser = clap::value_parser!(i32).range(i64::from(MIN_YEAR)..=i64::from(MAX_YEAR))
    )]
    year: i32,

    /// Keep only taxpayers of this unit (UPPPD). "Semua" keeps all units.
    #[arg(long, value_name = "NAME")]
    unit: Option<String>,

    /// Keep only these classifications (when the sheet has a Klasifikasi column).
    #[arg(long, num_args = 1.., value_name = "VALUE")]
    klasifikasi: Vec<String>,

    /// Keep only these taxpayer statuses (when the sheet has a Status column).
    #[arg(long, num_args = 1.., value_name = "VALUE")]
    status: Vec<String>,

    /// Print the values accepted by --unit, --klasifikasi and --status, then exit.
    #[arg(long, default_value_t = false)]
    list_filters: bool,

    /// Number of rows to preview.
    #[arg(long, default_value_t = 30)]
    preview: usize,

    /// Output workbook; defaults to dashboard_SAFE_<TAX TYPE>_<YEAR>.xlsx.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Do not write the output workbook.
    #[arg(long, default_value_t = false)]
    no_export: bool,

    /// Also write the filtered table as CSV.
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list_sheets {
        for name in sheet_names(&args.input)? {
            println!("{name}");
        }
        return Ok(());
    }

    let table = load_table(&args.input, args.sheet.as_deref())?;
    let dashboard = Dashboard::build(table, args.tax_type, args.year)?;

    if args.list_filters {
        print_filter_options(&dashboard.table);
        return Ok(());
    }

    let filter = RecordFilter {
        unit: args.unit,
        klasifikasi: args.klasifikasi,
        status: args.status,
    };
    let table = dashboard.filtered(&filter);
    let charts = dashboard.charts(&table);

    println!("Data processed and filtered successfully.");
    print_dashboard(&dashboard, &table, &charts, args.preview);

    if !args.no_export {
        let output = args
            .output
            .unwrap_or_else(|| PathBuf::from(default_file_name(args.tax_type, args.year)));
        save_xlsx(&output, &table, &charts)?;
    }
    if let Some(csv_path) = args.csv {
        write_detail_as_csv(&table, csv_path)?;
    }

    Ok(())
}
