use std::fmt;

use log::debug;
use time::Date;

use crate::{
    dates,
    table::{Cell, Table},
};

pub const TMT_COLUMN: &str = "TMT";

pub const TOTAL_PAYMENT: &str = "Total Pembayaran";
pub const ACTIVE_MONTHS: &str = "Bulan Aktif";
pub const MONTHS_PAID: &str = "Bulan Pembayaran";
pub const AVERAGE_PAYMENT: &str = "Rata-Rata Pembayaran";
pub const COMPLIANCE_PERCENT: &str = "Kepatuhan (%)";
pub const COMPLIANCE_TIER: &str = "Klasifikasi Kepatuhan";

/// Derived columns in the order they are appended to every record.
pub const DERIVED_COLUMNS: [&str; 6] = [
    TOTAL_PAYMENT,
    ACTIVE_MONTHS,
    MONTHS_PAID,
    AVERAGE_PAYMENT,
    COMPLIANCE_PERCENT,
    COMPLIANCE_TIER,
];

/// Tokens marking pre-aggregated columns that carry the year but are not monthly payments.
/// Matched against the lowercased column name.
pub const EXCLUDED_KEYWORDS: &[&str] =
    &["total", "rata", "jumlah", "average", "avg", "bulan bayar"];

const LOW_COMPLIANCE_MAX: f64 = 33.333;
const MODERATE_COMPLIANCE_MAX: f64 = 66.666;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComplianceTier {
    KurangPatuh,
    CukupPatuh,
    Patuh,
}

impl ComplianceTier {
    pub const ALL: [ComplianceTier; 3] = [
        ComplianceTier::KurangPatuh,
        ComplianceTier::CukupPatuh,
        ComplianceTier::Patuh,
    ];

    pub fn from_percent(percent: f64) -> Self {
        if percent <= LOW_COMPLIANCE_MAX {
            ComplianceTier::KurangPatuh
        } else if percent <= MODERATE_COMPLIANCE_MAX {
            ComplianceTier::CukupPatuh
        } else {
            ComplianceTier::Patuh
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComplianceTier::KurangPatuh => "Kurang Patuh",
            ComplianceTier::CukupPatuh => "Cukup Patuh",
            ComplianceTier::Patuh => "Patuh",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for ComplianceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceMetrics {
    pub total_payment: f64,
    pub active_months: u32,
    pub months_paid: u32,
    pub average_payment: f64,
    pub compliance_percent: f64,
    pub tier: ComplianceTier,
}

impl ComplianceMetrics {
    pub fn new(tmt: Option<Date>, payments: &[Option<f64>], year: i32) -> Self {
        let total_payment: f64 = payments.iter().flatten().sum();
        let months_paid = payments.iter().flatten().filter(|p| **p > 0.).count() as u32;
        let active_months = active_months(tmt, year);
        let average_payment = total_payment / f64::from(months_paid.max(1));
        let compliance_percent = f64::from(months_paid) / f64::from(active_months.max(1)) * 100.;
        Self {
            total_payment,
            active_months,
            months_paid,
            average_payment,
            compliance_percent,
            tier: ComplianceTier::from_percent(compliance_percent),
        }
    }

    fn into_cells(self) -> [Cell; 6] {
        [
            Cell::Number(self.total_payment),
            Cell::Number(f64::from(self.active_months)),
            Cell::Number(f64::from(self.months_paid)),
            Cell::Number(self.average_payment),
            Cell::Number(self.compliance_percent),
            Cell::Text(self.tier.label().to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub table: Table,
    pub payment_columns: Vec<String>,
}

/// Number of months of `year` during which a taxpayer registered on `tmt` was active.
pub fn active_months(tmt: Option<Date>, year: i32) -> u32 {
    match tmt {
        None => 0,
        Some(d) if d.year() < year => 12,
        Some(d) if d.year() > year => 0,
        Some(d) => 12 - u32::from(u8::from(d.month())) + 1,
    }
}

pub fn is_payment_column(column: &str, year: i32) -> bool {
    let lower = column.to_lowercase();
    column.contains(&year.to_string()) && !EXCLUDED_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Payment columns of `table` ordered by the date in their header.
/// Headers without a readable date come first, in sheet order.
pub fn payment_columns(table: &Table, year: i32) -> Vec<String> {
    let mut columns: Vec<(Option<Date>, &String)> = table
        .columns
        .iter()
        .filter(|c| is_payment_column(c, year))
        .map(|c| (dates::parse_date(c), c))
        .collect();
    columns.sort_by_key(|(date, _)| *date);
    columns.into_iter().map(|(_, c)| c.clone()).collect()
}

pub fn registration_date(cell: &Cell) -> Option<Date> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => dates::parse_date(s),
        Cell::Number(n) => dates::from_excel_serial(*n),
        Cell::Empty | Cell::Bool(_) => None,
    }
}

/// Appends the six derived compliance columns to every record of `table`.
///
/// Rows are neither dropped nor reordered, and nothing in the table can make this fail:
/// missing dates, missing amounts and zero denominators all fall back to defined values.
pub fn compute(table: &Table, year: i32) -> Assessment {
    let payment_columns = payment_columns(table, year);
    debug!("payment columns for {year}: {payment_columns:?}");

    let tmt_index = table.column_index(TMT_COLUMN);
    let payment_indices: Vec<usize> = payment_columns
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();

    let mut derived: [Vec<Cell>; 6] = Default::default();
    for row in &table.rows {
        let tmt = tmt_index
            .and_then(|i| row.get(i))
            .and_then(registration_date);
        let payments: Vec<Option<f64>> = payment_indices
            .iter()
            .map(|i| row.get(*i).and_then(Cell::as_amount))
            .collect();
        let metrics = ComplianceMetrics::new(tmt, &payments, year);
        for (column, cell) in derived.iter_mut().zip(metrics.into_cells()) {
            column.push(cell);
        }
    }

    let mut augmented = table.clone();
    for (name, values) in DERIVED_COLUMNS.iter().zip(derived) {
        augmented.set_column(name, values);
    }
    Assessment {
        table: augmented,
        payment_columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use time::macros::date;

    fn table(columns: &[&str], rows: Vec<Vec<Cell>>) -> Table {
        let mut t = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for r in rows {
            t.push_row(r);
        }
        t
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn derived(assessment: &Assessment, row: usize, column: &str) -> Cell {
        let index = assessment.table.column_index(column).unwrap();
        assessment.table.rows[row][index].clone()
    }

    fn number(assessment: &Assessment, row: usize, column: &str) -> f64 {
        match derived(assessment, row, column) {
            Cell::Number(n) => n,
            other => panic!("expected number in {column}, got {other:?}"),
        }
    }

    #[test]
    fn test_full_year_registrant_paying_two_months() {
        let t = table(
            &["TMT", "NAMA OP", "NM UNIT", "JAN-2024", "FEB-2024", "MAR-2024"],
            vec![vec![
                Cell::Date(date!(2023 - 05 - 01)),
                text("Resto A"),
                text("UPPPD 1"),
                Cell::Number(100.),
                Cell::Number(0.),
                Cell::Number(100.),
            ]],
        );
        let a = compute(&t, 2024);
        assert_eq!(number(&a, 0, ACTIVE_MONTHS), 12.);
        assert_eq!(number(&a, 0, MONTHS_PAID), 2.);
        assert_eq!(number(&a, 0, TOTAL_PAYMENT), 200.);
        assert_eq!(number(&a, 0, AVERAGE_PAYMENT), 100.);
        assert!((number(&a, 0, COMPLIANCE_PERCENT) - 16.667).abs() < 1e-3);
        assert_eq!(derived(&a, 0, COMPLIANCE_TIER), text("Kurang Patuh"));
    }

    #[test]
    fn test_mid_year_registrant_paying_every_active_month() {
        let months = ["JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC"];
        let mut columns = vec!["TMT".to_string()];
        columns.extend(months.iter().map(|m| format!("{m}-2024")));
        let mut t = Table::new(columns);
        let mut row = vec![text("2024-06-01")];
        row.extend(months.iter().map(|_| Cell::Number(50.)));
        t.push_row(row);

        let a = compute(&t, 2024);
        assert_eq!(number(&a, 0, ACTIVE_MONTHS), 7.);
        assert_eq!(number(&a, 0, MONTHS_PAID), 7.);
        assert_eq!(number(&a, 0, COMPLIANCE_PERCENT), 100.);
        assert_eq!(derived(&a, 0, COMPLIANCE_TIER), text("Patuh"));
    }

    #[test]
    fn test_unparseable_tmt_uses_guarded_denominator() {
        let t = table(
            &["TMT", "JAN-2024", "FEB-2024"],
            vec![vec![text("unknown"), Cell::Number(10.), Cell::Empty]],
        );
        let a = compute(&t, 2024);
        assert_eq!(number(&a, 0, ACTIVE_MONTHS), 0.);
        assert_eq!(number(&a, 0, MONTHS_PAID), 1.);
        assert_eq!(number(&a, 0, COMPLIANCE_PERCENT), 100.);
        assert_eq!(derived(&a, 0, COMPLIANCE_TIER), text("Patuh"));
    }

    #[test]
    fn test_no_payment_columns_degenerates_to_low_compliance() {
        let t = table(
            &["TMT", "JAN-2023"],
            vec![
                vec![Cell::Date(date!(2020 - 01 - 01)), Cell::Number(10.)],
                vec![Cell::Empty, Cell::Number(10.)],
            ],
        );
        let a = compute(&t, 2024);
        assert!(a.payment_columns.is_empty());
        for row in 0..2 {
            assert_eq!(number(&a, row, TOTAL_PAYMENT), 0.);
            assert_eq!(number(&a, row, MONTHS_PAID), 0.);
            assert_eq!(number(&a, row, AVERAGE_PAYMENT), 0.);
            assert_eq!(number(&a, row, COMPLIANCE_PERCENT), 0.);
            assert_eq!(derived(&a, row, COMPLIANCE_TIER), text("Kurang Patuh"));
        }
    }

    #[test]
    fn test_aggregate_columns_are_excluded() {
        assert!(!is_payment_column("Total 2024", 2024));
        assert!(!is_payment_column("RATA-RATA 2024", 2024));
        assert!(!is_payment_column("JUMLAH BULAN BAYAR 2024", 2024));
        assert!(!is_payment_column("AVG 2024", 2024));
        assert!(!is_payment_column("JAN-2023", 2024));
        assert!(is_payment_column("JAN-2024", 2024));

        let t = table(&["TMT", "JAN-2024", "Total 2024"], vec![]);
        assert_eq!(payment_columns(&t, 2024), vec!["JAN-2024"]);
    }

    #[test]
    fn test_payment_columns_sorted_with_unparseable_first() {
        let t = table(
            &["MAR-2024", "X 2024", "JAN-2024", "Y 2024", "FEB-2024"],
            vec![],
        );
        assert_eq!(
            payment_columns(&t, 2024),
            vec!["X 2024", "Y 2024", "JAN-2024", "FEB-2024", "MAR-2024"]
        );
    }

    #[test]
    fn test_active_months_bounds() {
        assert_eq!(active_months(None, 2024), 0);
        assert_eq!(active_months(Some(date!(2019 - 07 - 15)), 2024), 12);
        assert_eq!(active_months(Some(date!(2025 - 01 - 01)), 2024), 0);
        assert_eq!(active_months(Some(date!(2024 - 01 - 31)), 2024), 12);
        assert_eq!(active_months(Some(date!(2024 - 12 - 01)), 2024), 1);
    }

    #[test]
    fn test_tier_thresholds_are_inclusive_upper_bounds() {
        assert_eq!(ComplianceTier::from_percent(0.), ComplianceTier::KurangPatuh);
        assert_eq!(ComplianceTier::from_percent(33.333), ComplianceTier::KurangPatuh);
        assert_eq!(ComplianceTier::from_percent(33.334), ComplianceTier::CukupPatuh);
        assert_eq!(ComplianceTier::from_percent(66.666), ComplianceTier::CukupPatuh);
        assert_eq!(ComplianceTier::from_percent(66.667), ComplianceTier::Patuh);
        assert_eq!(ComplianceTier::from_percent(400.), ComplianceTier::Patuh);
        assert_eq!(ComplianceTier::from_label("Cukup Patuh"), Some(ComplianceTier::CukupPatuh));
    }

    #[test]
    fn test_negative_and_missing_payments() {
        let t = table(
            &["TMT", "JAN-2024", "FEB-2024", "MAR-2024"],
            vec![vec![
                Cell::Date(date!(2024 - 01 - 01)),
                Cell::Number(-50.),
                Cell::Empty,
                text("150"),
            ]],
        );
        let a = compute(&t, 2024);
        assert_eq!(number(&a, 0, TOTAL_PAYMENT), 100.);
        assert_eq!(number(&a, 0, MONTHS_PAID), 1.);
        assert_eq!(number(&a, 0, AVERAGE_PAYMENT), 100.);
    }

    #[test]
    fn test_rows_and_columns_preserved_and_deterministic() {
        let t = table(
            &["TMT", "NAMA OP", "JAN-2024"],
            vec![
                vec![text("2024-03-01"), text("B"), Cell::Number(5.)],
                vec![Cell::Empty, text("A"), Cell::Empty],
                vec![text("2030-01-01"), text("C"), Cell::Number(1.)],
            ],
        );
        let a = compute(&t, 2024);
        assert_eq!(a.table.len(), t.len());
        let mut expected: Vec<String> = t.columns.clone();
        expected.extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));
        assert_eq!(a.table.columns, expected);
        for (before, after) in t.rows.iter().zip(&a.table.rows) {
            assert_eq!(&after[..before.len()], before.as_slice());
        }
        for row in 0..a.table.len() {
            let active = number(&a, row, ACTIVE_MONTHS);
            let paid = number(&a, row, MONTHS_PAID);
            assert!((0. ..=12.).contains(&active));
            assert!(paid <= a.payment_columns.len() as f64);
        }
        assert_eq!(compute(&t, 2024), a);
    }

    #[test]
    fn test_numeric_tmt_is_an_excel_serial() {
        let t = table(
            &["TMT", "JAN-2024"],
            vec![
                vec![Cell::Number(45383.), Cell::Number(10.)],
                vec![Cell::Number(312_345_678_901_000.), Cell::Number(10.)],
                vec![Cell::Number(-3.), Cell::Number(10.)],
            ],
        );
        assert_eq!(registration_date(&t.rows[0][0]), Some(date!(2024 - 04 - 01)));
        let a = compute(&t, 2024);
        assert_eq!(number(&a, 0, ACTIVE_MONTHS), 9.);
        assert_eq!(number(&a, 1, ACTIVE_MONTHS), 0.);
        assert_eq!(number(&a, 2, ACTIVE_MONTHS), 0.);
    }

    #[test]
    fn test_nan_text_payment_counts_as_missing() {
        let t = table(
            &["TMT", "JAN-2024", "FEB-2024", "MAR-2024"],
            vec![vec![
                Cell::Date(date!(2023 - 01 - 01)),
                Cell::Number(100.),
                text("nan"),
                text("inf"),
            ]],
        );
        let a = compute(&t, 2024);
        assert_eq!(number(&a, 0, TOTAL_PAYMENT), 100.);
        assert_eq!(number(&a, 0, MONTHS_PAID), 1.);
        assert_eq!(number(&a, 0, AVERAGE_PAYMENT), 100.);
    }

    #[test]
    fn test_short_rows_are_read_as_blanks() {
        let t = Table {
            columns: vec!["TMT".into(), "JAN-2024".into(), "FEB-2024".into()],
            rows: vec![vec![Cell::Date(date!(2024 - 01 - 01)), Cell::Number(5.)], vec![]],
        };
        let a = compute(&t, 2024);
        assert_eq!(number(&a, 0, TOTAL_PAYMENT), 5.);
        assert_eq!(number(&a, 0, MONTHS_PAID), 1.);
        assert_eq!(number(&a, 1, TOTAL_PAYMENT), 0.);
        assert_eq!(number(&a, 1, ACTIVE_MONTHS), 0.);
    }

    #[test]
    fn test_missing_tmt_column_is_absorbed() {
        let t = table(&["JAN-2024"], vec![vec![Cell::Number(1.)]]);
        let a = compute(&t, 2024);
        assert_eq!(number(&a, 0, ACTIVE_MONTHS), 0.);
        assert_eq!(number(&a, 0, COMPLIANCE_PERCENT), 100.);
    }
}
