use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::ledger::{Interval, ItemFilter, ItemView, Ledger, Period};

/// Items bucketed by the period their transaction date falls in.
///
/// Every period of the requested range has a bucket, even when no item
/// lands in it.
#[derive(Debug, Clone)]
pub struct ItemGrouping<'a> {
    interval: Interval,
    groups: BTreeMap<Period, Vec<ItemView<'a>>>,
}

impl<'a> ItemGrouping<'a> {
    pub fn by_date_range(from: NaiveDate, till: NaiveDate, interval: Interval) -> Self {
        let groups = interval
            .steps(from, till)
            .into_iter()
            .map(|start| (Period::containing(start, interval), Vec::new()))
            .collect();
        Self { interval, groups }
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn add(&mut self, view: ItemView<'a>) {
        let key = Period::containing(view.date(), self.interval);
        self.groups.entry(key).or_default().push(view);
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Periods in chronological order.
    pub fn periods(&self) -> Vec<Period> {
        self.groups.keys().copied().collect()
    }

    /// Items of `period`, optionally restricted by `filter`, in insertion
    /// order.
    pub fn items(
        &self,
        ledger: &Ledger,
        period: &Period,
        filter: Option<&ItemFilter>,
    ) -> Vec<ItemView<'a>> {
        self.groups
            .get(period)
            .map(|views| {
                views
                    .iter()
                    .filter(|v| filter.map_or(true, |f| f.accepts(ledger, v)))
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl<'a> Extend<ItemView<'a>> for ItemGrouping<'a> {
    fn extend<I: IntoIterator<Item = ItemView<'a>>>(&mut self, iter: I) {
        for view in iter {
            self.add(view);
        }
    }
}
