use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{MetricsError, Result};
use crate::importer::{excel_serial_to_datetime, Column, ColumnIndex, Table};
use crate::models::{AccountRecord, CellValue, RawRow};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Coerces raw rows into [`AccountRecord`]s.
pub struct RecordNormalizer<'a> {
    columns: &'a ColumnIndex,
    date_formats: &'a [String],
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(columns: &'a ColumnIndex, date_formats: &'a [String]) -> Self {
        Self { columns, date_formats }
    }

    pub fn normalize(&self, row: &RawRow) -> Result<AccountRecord> {
        let c = self.columns;
        Ok(AccountRecord {
            account_code: code(cell(row, &c.account_code)?),
            customer_id: code(cell(row, &c.customer_id)?),
            customer_name: code(cell(row, &c.customer_name)?),
            customer_type_code: code(cell(row, &c.customer_type_code)?),
            birth_date: self.parse_birth_date(cell(row, &c.birth_date)?),
            detail_type_code: code(cell(row, &c.detail_type_code)?),
            account_status: match &c.account_status {
                Some(col) => Some(code(cell(row, col)?)),
                None => None,
            },
        })
    }

    /// Normalize every row, stopping at the first row that cannot be read.
    pub fn normalize_all(&self, table: &Table) -> Result<Vec<AccountRecord>> {
        table.rows.iter().map(|row| self.normalize(row)).collect()
    }

    pub fn parse_birth_date(&self, value: &CellValue) -> Option<NaiveDate> {
        match value {
            CellValue::Date(d) => Some(*d),
            CellValue::DateTime(dt) => Some(dt.date()),
            CellValue::Int(i) => parse_numeric_date(*i as f64),
            CellValue::Float(f) => parse_numeric_date(*f),
            CellValue::Text(s) => parse_date_text(s.trim(), self.date_formats),
            CellValue::Empty | CellValue::Bool(_) | CellValue::Error(_) => None,
        }
    }
}

fn cell<'r>(row: &'r RawRow, column: &Column) -> Result<&'r CellValue> {
    row.cells.get(column.index).ok_or_else(|| MetricsError::MissingField {
        row: row.number,
        column: column.name.clone(),
    })
}

/// Trimmed string form. Text that spells an integral decimal (`100.0`, as
/// pandas writes integer columns with gaps) is read as the integer, matching
/// what a numeric workbook cell gives.
fn code(value: &CellValue) -> String {
    let text = value.to_text();
    let s = text.trim();
    if let Some((int, frac)) = s.split_once('.') {
        let digits = int.strip_prefix('-').unwrap_or(int);
        if !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && !frac.is_empty()
            && frac.bytes().all(|b| b == b'0')
        {
            return int.to_string();
        }
    }
    s.to_string()
}

/// `YYYYMMDD` integers first, then Excel serial day numbers.
fn parse_numeric_date(n: f64) -> Option<NaiveDate> {
    if n.fract() == 0.0 && (10_000_101.0..=99_991_231.0).contains(&n) {
        return NaiveDate::parse_from_str(&format!("{}", n as i64), "%Y%m%d").ok();
    }
    excel_serial_to_datetime(n).map(|dt| dt.date())
}

pub fn parse_date_text(s: &str, formats: &[String]) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .map(|dt| dt.date())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}
