mod ledger_file;
mod settings;

pub use ledger_file::{AccountEntry, ItemEntry, LedgerFile, RawValue, TransactionEntry};
pub use settings::{Config, LedgerSettings, ReportSettings};

use crate::error::{ReportError, Result};
use crate::ledger::Ledger;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.accreport/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "accreport") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.accreport/
    let home = dirs_home().ok_or_else(|| {
        ReportError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".accreport"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve a configured path: `~/` expands to home, relative paths are taken
/// relative to the config directory.
pub fn resolve_path(path: &str, config_dir: &Path) -> PathBuf {
    let expanded = expand_path(path);
    if expanded.is_absolute() {
        expanded
    } else {
        config_dir.join(expanded)
    }
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(ReportError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| ReportError::ConfigParse { path, source: e })
}

/// Load the ledger file named by the config (or `override_path`).
pub fn load_ledger(config_dir: &Path, config: &Config, override_path: Option<&Path>) -> Result<Ledger> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => resolve_path(&config.ledger.path, config_dir),
    };
    if !path.exists() {
        return Err(ReportError::ConfigFileNotFound(path));
    }
    tracing::debug!(path = %path.display(), "loading ledger");
    let content = fs::read_to_string(&path)?;
    let file: LedgerFile =
        toml::from_str(&content).map_err(|e| ReportError::ConfigParse { path, source: e })?;
    file.into_ledger()
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[report]
title = "Accounting Report"
currency_symbol = "€"
chart_limit = 8              # max slices per pie chart
chart_remainder = "omit"     # "omit" drops the long tail, "aggregate" sums it into "..."
output_dir = "output"        # relative to this directory, or absolute / ~/...

[ledger]
path = "ledger.toml"
"#;

/// Template content for ledger.toml
pub const LEDGER_TEMPLATE: &str = r#"# Accounts are identified by their full path. Parents are created
# automatically. Types: asset, liability, profit, expense, unknown.

[[accounts]]
path = "Assets/Bank"
type = "asset"

[[accounts]]
path = "Income/Salary"
type = "profit"

[[accounts]]
path = "Expenses/Food"
type = "expense"

[[accounts]]
path = "Expenses/Rent"
type = "expense"

# Every transaction splits into items; balanced transactions sum to zero.
# Values are numbers or expressions like "12,50 + 3".

[[transactions]]
date = "2024-03-01"
descr = "Salary March"

[[transactions.items]]
account = "Assets/Bank"
value = 2500

[[transactions.items]]
account = "Income/Salary"
value = -2500

[[transactions]]
date = "2024-03-03"
descr = "Rent March"

[[transactions.items]]
account = "Expenses/Rent"
value = 900
descr = "Flat"

[[transactions.items]]
account = "Assets/Bank"
value = -900

[[transactions]]
date = "2024-03-09"
descr = "Supermarket"

[[transactions.items]]
account = "Expenses/Food"
value = "42,10 + 7,90"
descr = "Weekly shopping"

[[transactions.items]]
account = "Assets/Bank"
value = -50
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ChartRemainder;

    #[test]
    fn test_templates_parse() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.report.chart_limit, 8);
        assert_eq!(config.report.chart_remainder, ChartRemainder::Omit);
        assert_eq!(config.ledger.path, "ledger.toml");

        let ledger: LedgerFile = toml::from_str(LEDGER_TEMPLATE).unwrap();
        let ledger = ledger.into_ledger().unwrap();
        assert_eq!(ledger.transactions().len(), 3);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.report.title, "Accounting Report");
        assert_eq!(config.report.output_dir, "output");
    }

    #[test]
    fn test_resolve_path_relative_to_config_dir() {
        let dir = Path::new("/tmp/accreport-cfg");
        assert_eq!(resolve_path("ledger.toml", dir), dir.join("ledger.toml"));
        assert_eq!(resolve_path("/var/ledger.toml", dir), PathBuf::from("/var/ledger.toml"));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            load_config(dir.path()),
            Err(ReportError::ConfigFileNotFound(_))
        ));
    }
}
