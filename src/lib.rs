pub mod config;
pub mod error;
pub mod html;
pub mod ledger;
pub mod report;

pub use config::{Config, LedgerSettings, ReportSettings};
pub use error::{ReportError, Result};
pub use html::{render, RenderContext, TemplateKind};
pub use ledger::{AccountId, AccountType, Interval, ItemFilter, Ledger};
pub use report::{ChartRemainder, DatasetView, Report, ReportDataset, ReportEntry, ReportGroup};
