use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;
use crate::ledger::{Account, ItemView, Period, Transaction};

/// Label of the synthetic entry that collects the long tail of a chart.
pub const REMAINDER_LABEL: &str = "...";

/// A single item contribution underlying an entry.
#[derive(Debug, Clone)]
pub struct LineItem<'a> {
    pub transaction: &'a Transaction,
    pub account: &'a Account,
    pub descr: &'a str,
    pub value: Decimal,
    /// Value with the account type's display sign applied.
    pub value_derived: Decimal,
}

impl<'a> From<ItemView<'a>> for LineItem<'a> {
    fn from(view: ItemView<'a>) -> Self {
        Self {
            transaction: view.transaction,
            account: view.account,
            descr: &view.item.descr,
            value: view.value(),
            value_derived: view.value_derived(),
        }
    }
}

/// An aggregated line of a group.
#[derive(Debug, Clone)]
pub struct ReportEntry<'a> {
    pub label: String,
    pub value: Decimal,
    pub items: Vec<LineItem<'a>>,
}

impl<'a> ReportEntry<'a> {
    pub fn new(label: impl Into<String>, value: Decimal, items: Vec<LineItem<'a>>) -> Self {
        Self {
            label: label.into(),
            value,
            items,
        }
    }

    /// Share of `sum` in percent, rounded to one decimal. Zero when `sum` is
    /// zero.
    pub fn percent(&self, sum: Decimal) -> f64 {
        percent_of(self.value, sum)
    }
}

impl fmt::Display for ReportEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label, self.value)
    }
}

pub fn percent_of(value: Decimal, sum: Decimal) -> f64 {
    if sum.is_zero() {
        return 0.0;
    }
    value
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|v| v.checked_div(sum))
        .map(|pct| pct.round_dp(1))
        .and_then(|pct| pct.to_f64())
        .unwrap_or(0.0)
}

/// Numeric attribute entries can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Value,
    Percent,
}

impl FromStr for SortKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value" => Ok(SortKey::Value),
            "percent" => Ok(SortKey::Percent),
            _ => Err(ReportError::InvalidChoice {
                kind: "sort attribute",
                value: s.to_string(),
                expected: "value, percent",
            }),
        }
    }
}

/// What happens to entries beyond the chart limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartRemainder {
    /// Drop the long tail.
    #[default]
    Omit,
    /// Keep `limit - 1` entries and fold the rest into a `...` entry.
    Aggregate,
}

/// A bucket of entries sharing a period (or category).
#[derive(Debug, Clone)]
pub struct ReportGroup<'a> {
    pub label: String,
    pub period: Option<Period>,
    entries: Vec<ReportEntry<'a>>,
    /// Net income of the group; set by the by-type dataset only.
    pub balance: Option<Decimal>,
}

impl<'a> ReportGroup<'a> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            period: None,
            entries: Vec::new(),
            balance: None,
        }
    }

    pub fn for_period(period: Period) -> Self {
        Self {
            period: Some(period),
            ..Self::new(period.label())
        }
    }

    pub fn push(&mut self, entry: ReportEntry<'a>) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ReportEntry<'a>] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReportEntry<'a>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entry values, zero-valued entries included.
    pub fn sum(&self) -> Decimal {
        self.entries.iter().map(|e| e.value).sum()
    }

    /// Same as [`ReportGroup::sum`]; the name templates use in a child context.
    pub fn value(&self) -> Decimal {
        self.sum()
    }

    pub fn percent(&self, entry: &ReportEntry<'_>) -> f64 {
        entry.percent(self.sum())
    }

    /// Entries to display: everything with a nonzero value.
    pub fn visible(&self) -> impl Iterator<Item = &ReportEntry<'a>> {
        self.entries.iter().filter(|e| !e.value.is_zero())
    }

    pub fn series(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    /// Stable in-place sort; ties keep insertion order in both directions.
    pub fn sort_by(&mut self, key: SortKey, reverse: bool) {
        let sum = self.sum();
        self.entries
            .sort_by(|a, b| compare_entries(a, b, key, reverse, sum));
    }

    /// Sorted view of the entries, leaving the group untouched.
    pub fn sorted_by(&self, key: SortKey, reverse: bool) -> Vec<&ReportEntry<'a>> {
        let sum = self.sum();
        let mut refs: Vec<&ReportEntry<'a>> = self.entries.iter().collect();
        refs.sort_by(|a, b| compare_entries(a, b, key, reverse, sum));
        refs
    }

    /// The largest nonzero entries by absolute value for chart display,
    /// descending. `limit == 0` means no limit.
    pub fn top(&self, limit: usize, remainder: ChartRemainder) -> Vec<ReportEntry<'a>> {
        let mut ranked: Vec<&ReportEntry<'a>> = self.visible().collect();
        ranked.sort_by(|a, b| b.value.abs().cmp(&a.value.abs()));

        if limit == 0 || ranked.len() <= limit {
            return ranked.into_iter().cloned().collect();
        }

        match remainder {
            ChartRemainder::Omit => ranked.into_iter().take(limit).cloned().collect(),
            ChartRemainder::Aggregate => {
                let keep = limit.saturating_sub(1);
                let rest: Decimal = ranked[keep..].iter().map(|e| e.value).sum();
                let mut top: Vec<ReportEntry<'a>> =
                    ranked[..keep].iter().map(|e| (*e).clone()).collect();
                if !rest.is_zero() {
                    top.push(ReportEntry::new(REMAINDER_LABEL, rest, Vec::new()));
                }
                top
            }
        }
    }
}

fn compare_entries(
    a: &ReportEntry<'_>,
    b: &ReportEntry<'_>,
    key: SortKey,
    reverse: bool,
    sum: Decimal,
) -> Ordering {
    let ordering = match key {
        SortKey::Value => a.value.cmp(&b.value),
        SortKey::Percent => a.percent(sum).total_cmp(&b.percent(sum)),
    };
    if reverse {
        ordering.reverse()
    } else {
        ordering
    }
}

impl<'g, 'a> IntoIterator for &'g ReportGroup<'a> {
    type Item = &'g ReportEntry<'a>;
    type IntoIter = std::slice::Iter<'g, ReportEntry<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for ReportGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Groups of a report, in period order.
#[derive(Debug, Clone, Default)]
pub struct ReportDataset<'a> {
    groups: Vec<ReportGroup<'a>>,
}

impl<'a> ReportDataset<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_group(&mut self, group: ReportGroup<'a>) {
        self.groups.push(group);
    }

    /// Append an entry to the most recently added group.
    pub fn push_entry(&mut self, entry: ReportEntry<'a>) -> Result<(), ReportError> {
        match self.groups.last_mut() {
            Some(group) => {
                group.push(entry);
                Ok(())
            }
            None => Err(ReportError::Render {
                group: String::new(),
                reason: format!("entry '{}' added before any group", entry.label),
            }),
        }
    }

    pub fn groups(&self) -> &[ReportGroup<'a>] {
        &self.groups
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReportGroup<'a>> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Entry labels of the first group.
    pub fn series(&self) -> Vec<&str> {
        self.groups.first().map(ReportGroup::series).unwrap_or_default()
    }
}

impl<'g, 'a> IntoIterator for &'g ReportDataset<'a> {
    type Item = &'g ReportGroup<'a>;
    type IntoIter = std::slice::Iter<'g, ReportGroup<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}
