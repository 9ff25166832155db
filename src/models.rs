use chrono::{NaiveDate, NaiveDateTime};

/// A single cell as read from the source sheet, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Error(String),
}

impl CellValue {
    /// String form used for code comparisons. Integral floats drop the
    /// fractional part so `421101.0` reads as `421101`.
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty | Self::Error(_) => String::new(),
            Self::Text(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", *f as i64)
                } else {
                    f.to_string()
                }
            }
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// One data row of the source table. Row numbers are 1-based and count the
/// header, so they match what a spreadsheet shows.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub number: usize,
    pub cells: Vec<CellValue>,
}

/// Canonical, typed form of one input row.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub account_code: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_type_code: String,
    pub birth_date: Option<NaiveDate>,
    pub detail_type_code: String,
    /// Only read when the status-aware variant is requested.
    pub account_status: Option<String>,
}

/// An [`AccountRecord`] with the fields derived once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: AccountRecord,
    pub age: Option<i32>,
    pub is_active: Option<bool>,
}
