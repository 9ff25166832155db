use std::path::Path;

use crate::criteria::Variant;
use crate::error::{MetricsError, Result};
use crate::models::{CellValue, RawRow};
use crate::settings::ColumnNames;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn excel_serial_to_datetime(serial: f64) -> Option<chrono::NaiveDateTime> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    if !serial.is_finite() || !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    base.checked_add_signed(chrono::Duration::milliseconds(millis))
}

fn is_blank(cells: &[CellValue]) -> bool {
    cells.iter().all(|c| match c {
        CellValue::Empty => true,
        CellValue::Text(s) => s.trim().is_empty(),
        _ => false,
    })
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// The whole source sheet held in memory: trimmed headers plus data rows.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub sheet: Option<String>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Every name in `names` that has no matching header, in the given order.
    pub fn missing_columns(&self, names: &[&str]) -> Vec<String> {
        names
            .iter()
            .filter(|n| self.column_index(n).is_none())
            .map(|n| n.to_string())
            .collect()
    }
}

/// Positions of the required columns inside a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnIndex {
    pub account_code: Column,
    pub customer_id: Column,
    pub customer_name: Column,
    pub customer_type_code: Column,
    pub birth_date: Column,
    pub detail_type_code: Column,
    pub account_status: Option<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub index: usize,
}

impl ColumnIndex {
    /// Resolve all required columns, failing with the full list of missing
    /// headers if any are absent.
    pub fn resolve(table: &Table, names: &ColumnNames, variant: Variant) -> Result<Self> {
        let missing = table.missing_columns(&names.required(variant));
        if !missing.is_empty() {
            return Err(MetricsError::MissingColumns(missing));
        }
        let col = |name: &str| -> Result<Column> {
            let index = table
                .column_index(name)
                .ok_or_else(|| MetricsError::MissingColumns(vec![name.to_string()]))?;
            Ok(Column { name: name.to_string(), index })
        };
        Ok(Self {
            account_code: col(&names.account_code)?,
            customer_id: col(&names.customer_id)?,
            customer_name: col(&names.customer_name)?,
            customer_type_code: col(&names.customer_type_code)?,
            birth_date: col(&names.birth_date)?,
            detail_type_code: col(&names.detail_type_code)?,
            account_status: match variant {
                Variant::StatusAware => Some(col(&names.account_status)?),
                Variant::Base => None,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Source kinds: enum dispatch on the file extension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceKind {
    Csv,
    #[cfg(feature = "xlsx")]
    Workbook,
}

impl SourceKind {
    pub fn for_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            #[cfg(feature = "xlsx")]
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Workbook),
            _ => Err(MetricsError::UnsupportedFile(path.display().to_string())),
        }
    }

    #[allow(unused_variables)]
    pub fn load(&self, path: &Path, sheet: Option<&str>) -> Result<Table> {
        match self {
            Self::Csv => load_csv(path),
            #[cfg(feature = "xlsx")]
            Self::Workbook => load_workbook(path, sheet),
        }
    }
}

/// Read the whole source file into memory.
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let kind = SourceKind::for_path(path)?;
    let table = kind.load(path, sheet)?;
    log::info!(
        "loaded {} rows from {}{}",
        table.rows.len(),
        path.display(),
        table.sheet.as_deref().map(|s| format!(" [{s}]")).unwrap_or_default()
    );
    Ok(table)
}

/// Sheet names of a workbook; a CSV file has none.
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    match SourceKind::for_path(path)? {
        SourceKind::Csv => Ok(Vec::new()),
        #[cfg(feature = "xlsx")]
        SourceKind::Workbook => {
            use calamine::Reader;
            let workbook = calamine::open_workbook_auto(path)
                .map_err(|e| MetricsError::Workbook(format!("Failed to open workbook: {e}")))?;
            Ok(workbook.sheet_names().to_vec())
        }
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(MetricsError::EmptySheet);
    }

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let cells: Vec<CellValue> = record
            .iter()
            .map(|f| {
                if f.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(f.to_string())
                }
            })
            .collect();
        if is_blank(&cells) {
            continue;
        }
        rows.push(RawRow { number: i + 2, cells });
    }
    Ok(Table { headers, rows, sheet: None })
}

// ---------------------------------------------------------------------------
// Workbooks (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
fn cell_from_data(data: &calamine::Data) -> CellValue {
    use calamine::Data;
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match excel_serial_to_datetime(dt.as_f64()) {
            Some(ndt) if ndt.time() == chrono::NaiveTime::MIN => CellValue::Date(ndt.date()),
            Some(ndt) => CellValue::DateTime(ndt),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
        _ => CellValue::Empty,
    }
}

#[cfg(feature = "xlsx")]
fn load_workbook(path: &Path, sheet: Option<&str>) -> Result<Table> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| MetricsError::Workbook(format!("Failed to open workbook: {e}")))?;
    let available = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(s) => {
            if !available.iter().any(|n| n == s) {
                return Err(MetricsError::UnknownSheet { name: s.to_string(), available });
            }
            s.to_string()
        }
        None => available.first().cloned().ok_or(MetricsError::EmptySheet)?,
    };
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| MetricsError::Workbook(format!("Failed to read sheet '{name}': {e}")))?;

    let mut iter = range.rows();
    let header_row = iter.next().ok_or(MetricsError::EmptySheet)?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|c| cell_from_data(c).to_text().trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(MetricsError::EmptySheet);
    }

    let mut rows = Vec::new();
    for (i, row) in iter.enumerate() {
        let cells: Vec<CellValue> = row.iter().map(cell_from_data).collect();
        if is_blank(&cells) {
            continue;
        }
        rows.push(RawRow { number: i + 2, cells });
    }
    Ok(Table { headers, rows, sheet: Some(name) })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Acctcd,Customer_No,Customer_Name,Cust_TypeCode,Birthday,Cust_DetailTypeCode";

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_excel_serial_to_datetime() {
        let dt = excel_serial_to_datetime(45667.0).unwrap();
        assert_eq!(dt.date(), chrono::NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        let noon = excel_serial_to_datetime(45667.5).unwrap();
        assert_eq!(noon.format("%H:%M").to_string(), "12:00");
        assert!(excel_serial_to_datetime(-1.0).is_none());
        assert!(excel_serial_to_datetime(20000101.0).is_none());
    }

    #[test]
    fn test_source_kind_by_extension() {
        assert_eq!(SourceKind::for_path(Path::new("a.CSV")).unwrap(), SourceKind::Csv);
        assert!(matches!(
            SourceKind::for_path(Path::new("a.txt")),
            Err(MetricsError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn test_load_csv_trims_headers_and_skips_blank_rows() {
        let dir = tempfile::tempdir().unwrap();
        let content = "\
 Acctcd ,Customer_No,Customer_Name,Cust_TypeCode,Birthday,Cust_DetailTypeCode
421101,C1,An,100,2000-01-01,104
,,,,,
421101,C2,Binh,200,,104
";
        let path = write_csv(dir.path(), "accounts.csv", content);
        let table = load_table(&path, None).unwrap();
        assert_eq!(table.headers[0], "Acctcd");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].number, 2);
        assert_eq!(table.rows[1].number, 4);
        assert_eq!(table.rows[1].cells[4], CellValue::Empty);
    }

    #[test]
    fn test_resolve_reports_every_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "a.csv", "Acctcd,Customer_Name,Cust_TypeCode\n1,x,100\n");
        let table = load_table(&path, None).unwrap();
        let err = ColumnIndex::resolve(&table, &ColumnNames::default(), Variant::Base).unwrap_err();
        match err {
            MetricsError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["Customer_No", "Birthday", "Cust_DetailTypeCode"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_status_column_only_for_status_aware() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "a.csv", &format!("{HEADER}\n421101,C1,An,100,,104\n"));
        let table = load_table(&path, None).unwrap();
        let names = ColumnNames::default();
        let idx = ColumnIndex::resolve(&table, &names, Variant::Base).unwrap();
        assert!(idx.account_status.is_none());
        assert_eq!(idx.birth_date.index, 4);
        let err = ColumnIndex::resolve(&table, &names, Variant::StatusAware).unwrap_err();
        assert_eq!(err.to_string(), "Missing required columns: Acct_Status");
    }

    #[test]
    fn test_sheet_names_empty_for_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "a.csv", &format!("{HEADER}\n"));
        assert!(sheet_names(&path).unwrap().is_empty());
    }
}

#[cfg(all(test, feature = "xlsx"))]
mod workbook_tests {
    use super::*;
    use calamine::{CellErrorType, Data, ExcelDateTime, ExcelDateTimeType};
    use chrono::NaiveDate;

    fn fixture() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/accounts.xlsx")
    }

    fn excel_date(serial: f64) -> Data {
        Data::DateTime(ExcelDateTime::new(serial, ExcelDateTimeType::DateTime, false))
    }

    #[test]
    fn test_cell_from_data_dates() {
        assert_eq!(
            cell_from_data(&excel_date(36526.0)),
            CellValue::Date(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
        );
        let with_time = cell_from_data(&excel_date(36526.75));
        match with_time {
            CellValue::DateTime(dt) => assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2000-01-01 18:00"),
            other => panic!("unexpected cell: {other:?}"),
        }
    }

    #[test]
    fn test_cell_from_data_scalars() {
        assert_eq!(cell_from_data(&Data::Float(421101.0)).to_text(), "421101");
        assert_eq!(cell_from_data(&Data::Int(104)), CellValue::Int(104));
        assert_eq!(cell_from_data(&Data::String(" 100 ".into())), CellValue::Text(" 100 ".into()));
        assert_eq!(cell_from_data(&Data::Empty), CellValue::Empty);
        let err = cell_from_data(&Data::Error(CellErrorType::NA));
        assert!(matches!(err, CellValue::Error(_)));
        assert_eq!(err.to_text(), "");
    }

    #[test]
    fn test_workbook_first_sheet_by_default() {
        let path = fixture();
        assert_eq!(SourceKind::for_path(&path).unwrap(), SourceKind::Workbook);
        let table = SourceKind::Workbook.load(&path, None).unwrap();
        assert_eq!(table.sheet.as_deref(), Some("Accounts"));
        assert_eq!(table.headers[0], "Acctcd");
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].number, 2);
        assert_eq!(table.rows[0].cells[0].to_text(), "421101");
        assert_eq!(
            table.rows[0].cells[4],
            CellValue::Date(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
        );
        assert_eq!(table.rows[2].cells[4], CellValue::Empty);
    }

    #[test]
    fn test_workbook_sheet_selection() {
        let path = fixture();
        assert_eq!(sheet_names(&path).unwrap(), vec!["Accounts", "Blank"]);
        let table = load_table(&path, Some("Accounts")).unwrap();
        assert_eq!(table.rows.len(), 3);

        match load_table(&path, Some("Missing")).unwrap_err() {
            MetricsError::UnknownSheet { name, available } => {
                assert_eq!(name, "Missing");
                assert_eq!(available, vec!["Accounts", "Blank"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(load_table(&path, Some("Blank")), Err(MetricsError::EmptySheet)));
    }
}
