use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::dataset::ReportEntry;

/// Slice colors, cycled in entry order.
const PALETTE: [(u8, u8, u8); 8] = [
    (151, 187, 205),
    (220, 220, 220),
    (200, 180, 180),
    (250, 180, 180),
    (180, 210, 160),
    (240, 210, 140),
    (190, 170, 220),
    (160, 200, 200),
];

/// One pie slice as handed to the client-side chart script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    /// Absolute entry value.
    pub number: f64,
    pub name: String,
    pub color: String,
}

/// Project entries onto pie slices, keeping count and order.
pub fn project(entries: &[ReportEntry<'_>]) -> Vec<ChartSlice> {
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let (r, g, b) = PALETTE[idx % PALETTE.len()];
            ChartSlice {
                number: entry.value.abs().to_f64().unwrap_or(0.0),
                name: entry.label.clone(),
                color: format!("rgb({r},{g},{b})"),
            }
        })
        .collect()
}
