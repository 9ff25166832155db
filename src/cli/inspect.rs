use std::io::IsTerminal;
use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::criteria::Variant;
use crate::error::{MetricsError, Result};
use crate::fmt::count;
use crate::importer::{load_table, sheet_names, ColumnIndex};
use crate::normalizer::RecordNormalizer;

pub fn run(
    config: Option<&Path>,
    file: &Path,
    sheet: Option<&str>,
    variant: Option<Variant>,
    rows: usize,
) -> Result<()> {
    let settings = super::settings(config)?;
    let variant = variant.unwrap_or(settings.variant);
    let sheet = sheet.or(settings.sheet.as_deref());
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    println!("File:      {}", file.display());
    let sheets = sheet_names(file)?;
    if !sheets.is_empty() {
        println!("Sheets:    {}", sheets.join(", "));
    }

    let table = load_table(file, sheet)?;
    if let Some(name) = &table.sheet {
        println!("Sheet:     {name}");
    }
    println!("Records:   {}", count(table.rows.len()));
    println!("Variant:   {}", variant.key());

    let required = settings.columns.required(variant);
    let mut columns = Table::new();
    columns.set_header(vec!["Column", "Status"]);
    for name in &required {
        let status = match table.column_index(name) {
            Some(i) => format!("found (#{})", i + 1).green().to_string(),
            None => "missing".red().bold().to_string(),
        };
        columns.add_row(vec![Cell::new(name), Cell::new(status)]);
    }
    println!("\n{columns}");

    let missing = table.missing_columns(&required);
    if !missing.is_empty() {
        return Err(MetricsError::MissingColumns(missing));
    }

    if rows > 0 && !table.rows.is_empty() {
        let index = ColumnIndex::resolve(&table, &settings.columns, variant)?;
        let normalizer = RecordNormalizer::new(&index, &settings.date_formats);
        let mut preview = Table::new();
        preview.set_header(required.clone());
        for row in table.rows.iter().take(rows) {
            let r = normalizer.normalize(row)?;
            let mut cells = vec![
                r.account_code,
                r.customer_id,
                r.customer_name,
                r.customer_type_code,
                r.birth_date.map(|d| d.to_string()).unwrap_or_default(),
                r.detail_type_code,
            ];
            cells.extend(r.account_status);
            preview.add_row(cells);
        }
        println!("\nFirst {} rows (normalized)\n{preview}", rows.min(table.rows.len()));
    }
    Ok(())
}
