use std::io::IsTerminal;
use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};
use serde::Serialize;

use super::OutputFormat;
use crate::criteria::Variant;
use crate::error::{MetricsError, Result};
use crate::fmt::count;
use crate::importer::load_table;
use crate::reports::{self, MetricsReport, Pairing};

pub struct ReportArgs<'a> {
    pub file: &'a Path,
    pub sheet: Option<&'a str>,
    pub variant: Option<Variant>,
    pub as_of: Option<&'a str>,
    pub format: OutputFormat,
    pub output: Option<&'a Path>,
}

pub fn run(config: Option<&Path>, args: ReportArgs) -> Result<()> {
    let settings = super::settings(config)?;
    let variant = args.variant.unwrap_or(settings.variant);
    let reference_date = super::parse_as_of(args.as_of)?;
    let sheet = args.sheet.or(settings.sheet.as_deref());

    let table = load_table(args.file, sheet)?;
    let report = reports::generate(&table, &settings, variant, reference_date)?;

    if args.output.is_some() || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }
    let rendered = match args.format {
        OutputFormat::Text => render_text(&report),
        OutputFormat::Json => render_json(&report)?,
        OutputFormat::Csv => render_csv(&report)?,
    };

    match args.output {
        Some(path) => {
            std::fs::write(path, format!("{rendered}\n"))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

pub fn render_text(report: &MetricsReport) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Count"]);
    for m in &report.metrics {
        table.add_row(vec![
            Cell::new(&m.label),
            Cell::new(count(m.value)).set_alignment(CellAlignment::Right),
        ]);
    }

    let mut out = format!(
        "{}\nAs of {}  |  {} records  |  {} definitions\n{table}",
        "Portfolio Metrics".bold(),
        report.reference_date,
        count(report.total_records),
        report.variant.key()
    );
    for p in report.pairings() {
        out.push_str(&format!(
            "\n{} {}  ({} {})",
            p.label.trim().green().bold(),
            count(p.value),
            p.companion_label.trim(),
            count(p.companion_value)
        ));
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a MetricsReport,
    pairings: Vec<Pairing>,
}

pub fn render_json(report: &MetricsReport) -> Result<String> {
    let doc = JsonReport {
        report,
        pairings: report.pairings(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn render_csv(report: &MetricsReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["key", "label", "value"])?;
    for m in &report.metrics {
        let value = m.value.to_string();
        wtr.write_record([m.id.key(), m.label.as_str(), value.as_str()])?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| MetricsError::Other(format!("Failed to write CSV: {e}")))?;
    let s = String::from_utf8(bytes).map_err(|e| MetricsError::Other(e.to_string()))?;
    Ok(s.trim_end().to_string())
}
