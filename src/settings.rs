use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::criteria::Variant;
use crate::error::{MetricsError, Result};

/// Header names of the source columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub account_code: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_type_code: String,
    pub birth_date: String,
    pub detail_type_code: String,
    pub account_status: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            account_code: "Acctcd".to_string(),
            customer_id: "Customer_No".to_string(),
            customer_name: "Customer_Name".to_string(),
            customer_type_code: "Cust_TypeCode".to_string(),
            birth_date: "Birthday".to_string(),
            detail_type_code: "Cust_DetailTypeCode".to_string(),
            account_status: "Acct_Status".to_string(),
        }
    }
}

impl ColumnNames {
    /// Required headers in display order. The status column is only required
    /// by the status-aware variant.
    pub fn required(&self, variant: Variant) -> Vec<&str> {
        let mut cols = vec![
            self.account_code.as_str(),
            self.customer_id.as_str(),
            self.customer_name.as_str(),
            self.customer_type_code.as_str(),
            self.birth_date.as_str(),
            self.detail_type_code.as_str(),
        ];
        if variant == Variant::StatusAware {
            cols.push(self.account_status.as_str());
        }
        cols
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub columns: ColumnNames,
    /// Worksheet to read; the first sheet when unset.
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
    #[serde(default)]
    pub variant: Variant,
}

fn default_date_formats() -> Vec<String> {
    [
        "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y%m%d",
    ]
        .iter()
        .map(|f| f.to_string())
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            sheet: None,
            date_formats: default_date_formats(),
            variant: Variant::default(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("portfolio-metrics")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Load settings from `path`, or from the default location when `None`.
/// A missing default file yields defaults; a missing explicit file is an error.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (settings_path(), false),
    };
    if !path.exists() {
        if explicit {
            return Err(MetricsError::Settings(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = serde_json::from_str(&content)
        .map_err(|e| MetricsError::Settings(format!("{}: {e}", path.display())))?;
    log::debug!("loaded settings from {}", path.display());
    Ok(settings)
}

pub fn save_settings(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| MetricsError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}
