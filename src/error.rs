use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Config directory not found at {0}. Run 'accreport init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Account '{0}' not found in ledger")]
    UnknownAccount(String),

    #[error("Invalid account name '{0}': names must be non-empty and must not contain '/'")]
    InvalidAccountName(String),

    #[error("Account '{path}' already exists with type {existing}")]
    AccountTypeConflict { path: String, existing: String },

    #[error("Invalid value '{expr}': {reason}")]
    InvalidValue { expr: String, reason: String },

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD (e.g., 2024-03-01)")]
    InvalidDate(String),

    #[error("Invalid date range: {from} is after {till}")]
    InvalidRange { from: String, till: String },

    #[error("Unknown {kind} '{value}'. Use one of: {expected}")]
    InvalidChoice {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("No accounts selected. Use --account <path> to select accounts for the report.")]
    NoAccounts,

    #[error("Report could not be generated (group '{group}'): {reason}")]
    Render { group: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
