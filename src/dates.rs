use time::{
    format_description::BorrowedFormatItem,
    macros::{date, format_description},
    Date, Duration, Month, PrimitiveDateTime,
};

const EXCEL_EPOCH: Date = date!(1899 - 12 - 30);
// Serial of 10000-01-01, one past the last date Excel can hold.
const EXCEL_SERIAL_LIMIT: f64 = 2_958_466.;

static ISO_DATE_FMT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
static ISO_DATETIME_FMT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
static ISO_T_DATETIME_FMT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
static XLSX_DATE_FMT: &[BorrowedFormatItem] =
    format_description!("[month padding:none]/[day padding:none]/[year]");

const MONTH_NAMES: &[(&str, Month)] = &[
    ("jan", Month::January),
    ("januari", Month::January),
    ("january", Month::January),
    ("feb", Month::February),
    ("februari", Month::February),
    ("pebruari", Month::February),
    ("february", Month::February),
    ("mar", Month::March),
    ("maret", Month::March),
    ("march", Month::March),
    ("apr", Month::April),
    ("april", Month::April),
    ("mei", Month::May),
    ("may", Month::May),
    ("jun", Month::June),
    ("juni", Month::June),
    ("june", Month::June),
    ("jul", Month::July),
    ("juli", Month::July),
    ("july", Month::July),
    ("agu", Month::August),
    ("agt", Month::August),
    ("ags", Month::August),
    ("aug", Month::August),
    ("agustus", Month::August),
    ("august", Month::August),
    ("sep", Month::September),
    ("sept", Month::September),
    ("september", Month::September),
    ("okt", Month::October),
    ("oct", Month::October),
    ("oktober", Month::October),
    ("october", Month::October),
    ("nov", Month::November),
    ("nop", Month::November),
    ("november", Month::November),
    ("nopember", Month::November),
    ("des", Month::December),
    ("dec", Month::December),
    ("desember", Month::December),
    ("december", Month::December),
];

/// Parses the date forms found in registration cells and payment headers.
///
/// Returns `None` rather than an error: callers treat unparseable dates as absent.
pub fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Date::parse(raw, &ISO_DATE_FMT)
        .or_else(|_| PrimitiveDateTime::parse(raw, &ISO_DATETIME_FMT).map(|dt| dt.date()))
        .or_else(|_| PrimitiveDateTime::parse(raw, &ISO_T_DATETIME_FMT).map(|dt| dt.date()))
        .or_else(|_| Date::parse(raw, &XLSX_DATE_FMT))
        .ok()
        .or_else(|| parse_tokens(raw))
}

/// Year plus month (name or number) plus optional day, in any order,
/// e.g. `JAN-2024`, `Januari 2024`, `2024-01`, `2024`.
fn parse_tokens(raw: &str) -> Option<Date> {
    let mut year: Option<i32> = None;
    let mut month_name: Option<Month> = None;
    let mut numbers: Vec<u8> = Vec::new();

    for token in raw
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        if token.chars().all(|c| c.is_ascii_digit()) {
            match token.len() {
                4 if year.is_none() => year = Some(token.parse().ok()?),
                1 | 2 => numbers.push(token.parse().ok()?),
                _ => return None,
            }
        } else {
            let lower = token.to_lowercase();
            let (_, month) = MONTH_NAMES.iter().find(|(name, _)| *name == lower)?;
            if month_name.replace(*month).is_some() {
                return None;
            }
        }
    }

    let year = year?;
    let (month, day) = match (month_name, numbers.as_slice()) {
        (Some(m), []) => (m, 1),
        (Some(m), [d]) => (m, *d),
        (None, []) => (Month::January, 1),
        (None, [m]) => (Month::try_from(*m).ok()?, 1),
        (None, [m, d]) => (Month::try_from(*m).ok()?, *d),
        _ => return None,
    };
    Date::from_calendar_date(year, month, day).ok()
}

/// Converts an Excel serial (1900 date system) to its calendar date, ignoring the time part.
pub fn from_excel_serial(serial: f64) -> Option<Date> {
    if !(1. ..EXCEL_SERIAL_LIMIT).contains(&serial) {
        return None;
    }
    EXCEL_EPOCH.checked_add(Duration::days(serial.floor() as i64))
}

pub fn to_excel_serial(date: Date) -> f64 {
    (date - EXCEL_EPOCH).whole_days() as f64
}
