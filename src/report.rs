use crate::{
    charts::ChartSet,
    filter::{filter_options, KLASIFIKASI_COLUMN, STATUS_COLUMN, UNIT_COLUMN},
    table::{Cell, Table},
    Dashboard,
};

fn preview_cell(cell: &Cell) -> String {
    match cell {
        Cell::Number(n) if n.fract() != 0. => format!("{n:.2}"),
        other => other.to_string(),
    }
}

fn format_line<'a>(cells: impl Iterator<Item = &'a String>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn print_preview(table: &Table, limit: usize) {
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .take(limit)
        .map(|r| r.iter().map(preview_cell).collect())
        .collect();
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter()
                .map(|r| r.get(i).map_or(0, |c| c.chars().count()))
                .fold(name.chars().count(), usize::max)
        })
        .collect();

    println!("{}", format_line(table.columns.iter(), &widths));
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for r in &rows {
        println!("{}", format_line(r.iter(), &widths));
    }
    if table.len() > limit {
        println!("... {} more rows", table.len() - limit);
    }
}

pub fn print_dashboard(dashboard: &Dashboard, table: &Table, charts: &ChartSet, preview: usize) {
    println!(
        "\n=== KEPATUHAN PAJAK {} {} ({} of {} rows) ===\n",
        dashboard.tax_type,
        dashboard.year,
        table.len(),
        dashboard.table.len()
    );
    print_preview(table, preview);

    println!("\n=== TREN PEMBAYARAN PAJAK PER BULAN ===\n");
    if dashboard.has_payment_columns() {
        println!("Payment columns found: {}\n", dashboard.payment_columns.join(", "));
        for m in &charts.monthly_trend {
            println!("{:<20} {:>18.2}", m.column, m.total);
        }
    } else {
        println!("No valid monthly payment columns were found.");
    }

    println!("\n=== TOP 20 WP BERDASARKAN TOTAL PEMBAYARAN ===\n");
    for (rank, t) in charts.top_taxpayers.iter().enumerate() {
        println!("{:>2}. {:<40} {:>18.2}", rank + 1, t.name, t.total);
    }

    println!("\n=== DISTRIBUSI KEPATUHAN ===\n");
    let total: usize = charts.tier_distribution.iter().map(|t| t.count).sum();
    for t in &charts.tier_distribution {
        println!(
            "{:<14} {:>6} ({:.1}%)",
            t.tier,
            t.count,
            t.count as f64 / total.max(1) as f64 * 100.
        );
    }
}

pub fn print_filter_options(table: &Table) {
    for column in [UNIT_COLUMN, KLASIFIKASI_COLUMN, STATUS_COLUMN] {
        if !table.has_column(column) {
            continue;
        }
        println!("{column}:");
        for value in filter_options(table, column) {
            println!("  {value}");
        }
    }
}
