use serde::{Deserialize, Serialize};

use crate::report::ChartRemainder;

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub ledger: LedgerSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReportSettings {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    /// Maximum number of slices per pie chart.
    #[serde(default = "default_chart_limit")]
    pub chart_limit: usize,
    #[serde(default)]
    pub chart_remainder: ChartRemainder,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            currency_symbol: default_currency_symbol(),
            chart_limit: default_chart_limit(),
            chart_remainder: ChartRemainder::default(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LedgerSettings {
    /// Ledger file, relative to the config directory unless absolute.
    #[serde(default = "default_ledger_path")]
    pub path: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

fn default_title() -> String {
    "Accounting Report".to_string()
}

fn default_currency_symbol() -> String {
    "€".to_string()
}

fn default_chart_limit() -> usize {
    8
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_ledger_path() -> String {
    "ledger.toml".to_string()
}
