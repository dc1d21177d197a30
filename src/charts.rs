use std::collections::BTreeMap;

use time::Date;

use crate::{
    compliance::{ComplianceTier, COMPLIANCE_TIER, TOTAL_PAYMENT},
    dates,
    table::{Cell, Table},
};

pub const NAME_COLUMN: &str = "Nama Op";
pub const TOP_TAXPAYERS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTotal {
    pub column: String,
    pub month: Option<Date>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxpayerTotal {
    pub name: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierCount {
    pub tier: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSet {
    pub monthly_trend: Vec<MonthlyTotal>,
    pub top_taxpayers: Vec<TaxpayerTotal>,
    pub tier_distribution: Vec<TierCount>,
}

impl ChartSet {
    pub fn from_table(table: &Table, payment_columns: &[String]) -> Self {
        Self {
            monthly_trend: monthly_trend(table, payment_columns),
            top_taxpayers: top_taxpayers(table, TOP_TAXPAYERS),
            tier_distribution: tier_distribution(table),
        }
    }
}

fn column_sum<'a>(cells: impl Iterator<Item = &'a Cell>) -> f64 {
    cells.filter_map(Cell::as_amount).sum()
}

/// Sum of every payment column across rows, ordered by month. Unreadable months go last.
pub fn monthly_trend(table: &Table, payment_columns: &[String]) -> Vec<MonthlyTotal> {
    let mut trend: Vec<MonthlyTotal> = payment_columns
        .iter()
        .map(|c| MonthlyTotal {
            column: c.clone(),
            month: dates::parse_date(c),
            total: column_sum(table.column(c)),
        })
        .collect();
    trend.sort_by_key(|m| (m.month.is_none(), m.month));
    trend
}

/// Taxpayers with the largest summed total payment, largest first.
pub fn top_taxpayers(table: &Table, limit: usize) -> Vec<TaxpayerTotal> {
    let (Some(name_index), Some(total_index)) = (
        table.column_index(NAME_COLUMN),
        table.column_index(TOTAL_PAYMENT),
    ) else {
        return Vec::new();
    };

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for row in &table.rows {
        let Some(name) = row.get(name_index).filter(|c| !c.is_empty()) else {
            continue;
        };
        let total = row.get(total_index).and_then(Cell::as_amount);
        *totals.entry(name.to_string()).or_default() += total.unwrap_or(0.);
    }

    let mut ranked: Vec<TaxpayerTotal> = totals
        .into_iter()
        .map(|(name, total)| TaxpayerTotal { name, total })
        .collect();
    ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
    ranked.truncate(limit);
    ranked
}

pub fn tier_distribution(table: &Table) -> Vec<TierCount> {
    let mut counts: BTreeMap<(Option<ComplianceTier>, String), usize> = BTreeMap::new();
    for cell in table.column(COMPLIANCE_TIER).filter(|c| !c.is_empty()) {
        let label = cell.to_string();
        *counts
            .entry((ComplianceTier::from_label(&label), label))
            .or_default() += 1;
    }

    let mut distribution: Vec<TierCount> = counts
        .into_iter()
        .map(|((_, tier), count)| TierCount { tier, count })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count));
    distribution
}
