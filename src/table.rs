use std::{collections::HashMap, fmt};

use time::Date;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Date(Date),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Numeric reading of the cell used for payment amounts.
    ///
    /// Text is accepted when it holds a plain finite number, so `nan` and `inf` markers
    /// count as missing. Dates and blanks have no amount.
    pub fn as_amount(&self) -> Option<f64> {
        let amount = match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::Bool(b) => Some(if *b { 1. } else { 0. }),
            Cell::Empty | Cell::Date(_) => None,
        };
        amount.filter(|n| n.is_finite())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) if n.fract() == 0. && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Bool(b) => f.write_str(if *b { "True" } else { "False" }),
            Cell::Date(d) => write!(f, "{}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding or cutting it to the column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Cell> + 'a {
        let index = self.column_index(name);
        self.rows
            .iter()
            .filter_map(move |row| index.and_then(|i| row.get(i)))
    }

    /// Overwrites the column in place when it exists, otherwise appends it.
    ///
    /// `values` must hold one cell per row. Short rows are padded first.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        let index = self.column_index(name).unwrap_or_else(|| {
            self.columns.push(name.to_string());
            self.columns.len() - 1
        });
        let width = self.columns.len();
        for (row, value) in self.rows.iter_mut().zip(values) {
            if row.len() < width {
                row.resize(width, Cell::Empty);
            }
            row[index] = value;
        }
    }

    pub fn retain_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Cell]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| keep(r.as_slice()))
                .cloned()
                .collect(),
        }
    }
}

/// Normalized header name to the spelling found in the sheet.
#[derive(Debug, Default, Clone)]
pub struct HeaderMap {
    original: HashMap<String, String>,
}

impl HeaderMap {
    /// Uppercases and trims every header of `table`, remembering the original spelling.
    pub fn normalize(table: &mut Table) -> Self {
        let mut original = HashMap::new();
        for column in table.columns.iter_mut() {
            let normalized = column.to_uppercase().trim().to_string();
            original.insert(normalized.clone(), std::mem::replace(column, normalized));
        }
        Self { original }
    }

    pub fn original(&self, normalized: &str) -> Option<&str> {
        self.original.get(normalized).map(String::as_str)
    }

    /// Name shown to users: the original spelling (or `name` itself when it was added
    /// after loading) title-cased and trimmed.
    pub fn display_name(&self, name: &str) -> String {
        title_case(self.original(name).unwrap_or(name))
            .trim()
            .to_string()
    }

    pub fn apply_display_names(&self, table: &mut Table) {
        for column in table.columns.iter_mut() {
            *column = self.display_name(column);
        }
    }
}

/// Uppercases the first letter of every run of letters and lowercases the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}
