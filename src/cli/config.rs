use std::path::Path;

use crate::error::{MetricsError, Result};
use crate::settings::{save_settings, settings_path, Settings};

pub fn show(config: Option<&Path>) -> Result<()> {
    let settings = super::settings(config)?;
    let path = config.map(Path::to_path_buf).unwrap_or_else(settings_path);
    let source = if path.exists() { "" } else { " (not found, using defaults)" };
    eprintln!("Settings: {}{source}", path.display());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

pub fn init(config: Option<&Path>, force: bool) -> Result<()> {
    let path = config.map(Path::to_path_buf).unwrap_or_else(settings_path);
    if path.exists() && !force {
        return Err(MetricsError::Settings(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    save_settings(&Settings::default(), &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
