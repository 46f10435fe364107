//! Report datasets: items of selected accounts in a date range, grouped by
//! period and aggregated per account or account type.

mod chart;
mod dataset;
mod grouping;

pub use chart::{project, ChartSlice};
pub use dataset::{
    percent_of, ChartRemainder, LineItem, ReportDataset, ReportEntry, ReportGroup, SortKey,
    REMAINDER_LABEL,
};
pub use grouping::ItemGrouping;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::error::{ReportError, Result};
use crate::ledger::{AccountId, AccountType, Interval, ItemFilter, ItemView, Ledger};

/// Account types of the by-type dataset, in display order.
pub const TYPE_ORDER: [AccountType; 4] = [
    AccountType::Asset,
    AccountType::Liability,
    AccountType::Profit,
    AccountType::Expense,
];

/// Which aggregation a dataset uses for its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatasetView {
    /// One entry per selected account, children folded in.
    #[default]
    Accounts,
    /// One entry per selected account and each of its descendants.
    Expanded,
    /// One entry per account type, values sign-normalized.
    Types,
}

impl DatasetView {
    pub const NAMES: &'static str = "accounts, expanded, types";
}

impl fmt::Display for DatasetView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetView::Accounts => write!(f, "accounts"),
            DatasetView::Expanded => write!(f, "expanded"),
            DatasetView::Types => write!(f, "types"),
        }
    }
}

impl FromStr for DatasetView {
    type Err = ReportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accounts" | "account" => Ok(DatasetView::Accounts),
            "expanded" => Ok(DatasetView::Expanded),
            "types" | "type" => Ok(DatasetView::Types),
            _ => Err(ReportError::InvalidChoice {
                kind: "view",
                value: s.to_string(),
                expected: DatasetView::NAMES,
            }),
        }
    }
}

/// A report over selected accounts of a ledger within `from..=till`.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    ledger: &'a Ledger,
    accounts: Vec<AccountId>,
    from: NaiveDate,
    till: NaiveDate,
}

impl<'a> Report<'a> {
    pub fn new(ledger: &'a Ledger, from: NaiveDate, till: NaiveDate) -> Result<Self> {
        let mut report = Self {
            ledger,
            accounts: Vec::new(),
            from,
            till,
        };
        report.set_range(from, till)?;
        Ok(report)
    }

    pub fn ledger(&self) -> &'a Ledger {
        self.ledger
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn till(&self) -> NaiveDate {
        self.till
    }

    pub fn set_range(&mut self, from: NaiveDate, till: NaiveDate) -> Result<()> {
        if from > till {
            return Err(ReportError::InvalidRange {
                from: from.to_string(),
                till: till.to_string(),
            });
        }
        self.from = from;
        self.till = till;
        Ok(())
    }

    pub fn add_account(&mut self, account: AccountId) {
        if !self.accounts.contains(&account) {
            self.accounts.push(account);
        }
    }

    pub fn remove_account(&mut self, account: AccountId) {
        self.accounts.retain(|&a| a != account);
    }

    pub fn accounts(&self) -> &[AccountId] {
        &self.accounts
    }

    fn filter(&self) -> ItemFilter {
        ItemFilter::AccountsAndChildren(self.accounts.clone())
            .and(ItemFilter::DateRange(self.from, self.till))
    }

    /// Items of the selected accounts (and their children) inside the range,
    /// in transaction order.
    pub fn items(&self) -> Vec<ItemView<'a>> {
        let filter = self.filter();
        let ledger: &'a Ledger = self.ledger;
        ledger
            .items()
            .filter(|v| filter.accepts(ledger, v))
            .collect()
    }

    fn grouping(&self, interval: Interval) -> ItemGrouping<'a> {
        let mut grouping = ItemGrouping::by_date_range(self.from, self.till, interval);
        grouping.extend(self.items());
        grouping
    }

    pub fn dataset(&self, view: DatasetView, interval: Interval) -> ReportDataset<'a> {
        match view {
            DatasetView::Accounts => self.dataset_by_account(interval),
            DatasetView::Expanded => self.dataset_expanded(interval),
            DatasetView::Types => self.dataset_by_type(interval),
        }
    }

    /// Items grouped by selected account per period, sum of values per
    /// entry. Items of a selected child account only count for that child.
    pub fn dataset_by_account(&self, interval: Interval) -> ReportDataset<'a> {
        let grouping = self.grouping(interval);
        let filters: Vec<(AccountId, ItemFilter)> = self
            .accounts
            .iter()
            .map(|&acc| {
                let selected_children: Vec<AccountId> = self
                    .accounts
                    .iter()
                    .copied()
                    .filter(|&other| self.ledger.is_descendant(other, acc))
                    .collect();
                let filter = ItemFilter::AccountsAndChildren(vec![acc])
                    .and(ItemFilter::NotAccountsAndChildren(selected_children));
                (acc, filter)
            })
            .collect();

        let mut dataset = ReportDataset::new();
        for period in grouping.periods() {
            let mut group = ReportGroup::for_period(period);
            for (acc, filter) in &filters {
                let items = grouping.items(self.ledger, &period, Some(filter));
                group.push(entry_from_items(
                    self.ledger.account(*acc).fullname(),
                    items,
                    |v| v.value(),
                ));
            }
            dataset.push_group(group);
        }
        tracing::debug!(groups = dataset.len(), %interval, "dataset by account built");
        dataset
    }

    /// Like [`Report::dataset_by_account`] but with one entry for every
    /// selected account and each of its descendants, counting only items
    /// booked directly on that account.
    pub fn dataset_expanded(&self, interval: Interval) -> ReportDataset<'a> {
        let grouping = self.grouping(interval);
        let mut all_accounts: Vec<AccountId> = Vec::new();
        for &acc in &self.accounts {
            for id in std::iter::once(acc).chain(self.ledger.descendants(acc)) {
                if !all_accounts.contains(&id) {
                    all_accounts.push(id);
                }
            }
        }

        let mut dataset = ReportDataset::new();
        for period in grouping.periods() {
            let mut group = ReportGroup::for_period(period);
            for &acc in &all_accounts {
                let filter = ItemFilter::Accounts(vec![acc]);
                let items = grouping.items(self.ledger, &period, Some(&filter));
                group.push(entry_from_items(
                    self.ledger.account(acc).fullname(),
                    items,
                    |v| v.value(),
                ));
            }
            dataset.push_group(group);
        }
        tracing::debug!(groups = dataset.len(), %interval, "expanded dataset built");
        dataset
    }

    /// Items grouped by account type per period. Entry values sum the
    /// sign-normalized item values; the group balance is income minus
    /// spending.
    pub fn dataset_by_type(&self, interval: Interval) -> ReportDataset<'a> {
        let grouping = self.grouping(interval);
        let mut dataset = ReportDataset::new();
        for period in grouping.periods() {
            let mut group = ReportGroup::for_period(period);
            let mut balance = Decimal::ZERO;
            for kind in TYPE_ORDER {
                let filter = ItemFilter::AccountTypes(vec![kind]);
                let items = grouping.items(self.ledger, &period, Some(&filter));
                let entry = entry_from_items(kind.label(), items, |v| v.value_derived());
                match kind {
                    AccountType::Profit => balance += entry.value,
                    AccountType::Expense => balance -= entry.value,
                    _ => {}
                }
                group.push(entry);
            }
            group.balance = Some(balance);
            dataset.push_group(group);
        }
        tracing::debug!(groups = dataset.len(), %interval, "dataset by type built");
        dataset
    }

    pub fn dataset_monthly(&self) -> ReportDataset<'a> {
        self.dataset_by_account(Interval::Monthly)
    }

    pub fn dataset_monthly_expanded(&self) -> ReportDataset<'a> {
        self.dataset_expanded(Interval::Monthly)
    }

    pub fn dataset_monthly_types(&self) -> ReportDataset<'a> {
        self.dataset_by_type(Interval::Monthly)
    }
}

fn entry_from_items<'a>(
    label: &str,
    mut items: Vec<ItemView<'a>>,
    value: impl Fn(&ItemView<'a>) -> Decimal,
) -> ReportEntry<'a> {
    items.sort_by_key(|v| v.date());
    let sum = items.iter().map(&value).sum();
    ReportEntry::new(label, sum, items.into_iter().map(LineItem::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::fixtures::sample_ledger;
    use crate::ledger::{parse_date, Transaction};
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn report<'a>(ledger: &'a Ledger, from: &str, till: &str, accounts: &[&str]) -> Report<'a> {
        let mut report = Report::new(ledger, date(from), date(till)).unwrap();
        for acc in accounts {
            report.add_account(ledger.lookup(acc).unwrap());
        }
        report
    }

    fn descrs(report: &Report<'_>) -> BTreeSet<String> {
        report.items().iter().map(|v| v.item.descr.clone()).collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_items_single_day() {
        let ledger = sample_ledger();
        assert!(descrs(&report(&ledger, "2018-03-08", "2018-03-08", &["Root/Test"])).is_empty());
        assert_eq!(
            descrs(&report(&ledger, "2018-03-08", "2018-03-08", &["Root/Foo"])),
            set(&["AAA"])
        );
        assert_eq!(
            descrs(&report(&ledger, "2018-03-09", "2018-03-16", &["Root/Foo"])),
            set(&["EEE", "GGG"])
        );
        assert_eq!(
            descrs(&report(&ledger, "2018-03-08", "2018-04-01", &["Root/Foo", "Root/Bar"])),
            set(&["AAA", "BBB", "EEE", "FFF", "GGG", "HHH", "III"])
        );
    }

    #[test]
    fn test_items_include_children() {
        let ledger = sample_ledger();
        assert_eq!(
            descrs(&report(&ledger, "2018-03-08", "2018-04-01", &["Root"])),
            set(&["AAA", "BBB", "CCC", "DDD", "EEE", "FFF", "GGG", "HHH", "III", "JJJ"])
        );
    }

    #[test]
    fn test_invalid_range() {
        let ledger = sample_ledger();
        assert!(matches!(
            Report::new(&ledger, date("2018-04-01"), date("2018-03-01")),
            Err(ReportError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_add_and_remove_account() {
        let ledger = sample_ledger();
        let mut r = report(&ledger, "2018-03-01", "2018-03-31", &["Root/Foo", "Root/Foo"]);
        assert_eq!(r.accounts().len(), 1);
        r.remove_account(ledger.lookup("Root/Foo").unwrap());
        assert!(r.items().is_empty());
    }

    #[test]
    fn test_dataset_monthly_sums() {
        let ledger = sample_ledger();
        let r = report(&ledger, "2018-03-01", "2018-06-30", &["Root/Foo", "Root/Bar"]);
        let ds = r.dataset_monthly();
        let labels: Vec<_> = ds.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Mar 18", "Apr 18", "May 18", "Jun 18"]);
        assert_eq!(ds.series(), vec!["Root/Foo", "Root/Bar"]);

        let march = &ds.groups()[0];
        assert_eq!(march.entries()[0].value, dec!(9.5));
        assert_eq!(march.entries()[1].value, dec!(-9.5));
        assert_eq!(march.sum(), Decimal::ZERO);

        let may = &ds.groups()[2];
        assert!(may.iter().all(|e| e.value.is_zero() && e.items.is_empty()));
        assert_eq!(may.visible().count(), 0);

        let june_foo = &ds.groups()[3].entries()[0];
        assert_eq!(june_foo.value, dec!(12));
        let descrs: Vec<&str> = june_foo.items.iter().map(|i| i.descr).collect();
        assert_eq!(descrs, vec!["KKK", "MMM"]);
        assert_eq!(june_foo.items[0].transaction.descr, "six");
    }

    #[test]
    fn test_dataset_monthly_no_double_count() {
        let ledger = sample_ledger();
        let r = report(&ledger, "2018-03-01", "2018-03-31", &["Root", "Root/Foo"]);
        let ds = r.dataset_monthly();
        let march = &ds.groups()[0];
        // Root keeps Bar, Test and its own item; Foo is reported separately
        assert_eq!(march.entries()[0].label, "Root");
        assert_eq!(march.entries()[0].value, dec!(-9.5));
        assert_eq!(march.entries()[1].value, dec!(9.5));
        let item_count: usize = march.iter().map(|e| e.items.len()).sum();
        assert_eq!(item_count, 8);
    }

    #[test]
    fn test_dataset_expanded() {
        let ledger = sample_ledger();
        let r = report(&ledger, "2018-03-01", "2018-03-31", &["Root"]);
        let ds = r.dataset_monthly_expanded();
        assert_eq!(ds.series(), vec!["Root", "Root/Foo", "Root/Bar", "Root/Test"]);
        let values: Vec<_> = ds.groups()[0].iter().map(|e| e.value).collect();
        assert_eq!(values, vec![dec!(-2), dec!(9.5), dec!(-9.5), dec!(2)]);
    }

    #[test]
    fn test_dataset_types_balance() {
        let ledger = sample_ledger();
        let r = report(&ledger, "2018-04-01", "2018-04-30", &["Root"]);
        let ds = r.dataset_monthly_types();
        let april = &ds.groups()[0];
        assert_eq!(april.series(), vec!["Asset", "Liability", "Profit", "Expense"]);

        // five: Foo (expense) +5, Test (profit) -5
        let profit = &april.entries()[2];
        assert_eq!(profit.value, dec!(5));
        assert_eq!(profit.items[0].value, dec!(-5));
        assert_eq!(profit.items[0].value_derived, dec!(5));
        assert_eq!(profit.items[0].account.fullname(), "Root/Test");
        assert_eq!(april.entries()[3].value, dec!(5));
        assert_eq!(april.balance, Some(Decimal::ZERO));
    }

    #[test]
    fn test_dataset_types_net_income() {
        let mut ledger = Ledger::new();
        let bank = ledger.add_account("Bank", AccountType::Asset).unwrap();
        let salary = ledger.add_account("Salary", AccountType::Profit).unwrap();
        let food = ledger.add_account("Food", AccountType::Expense).unwrap();
        let mut push = |descr: &str, from: AccountId, to: AccountId, value: Decimal| {
            let mut t = Transaction::new(date("2024-03-10"), descr);
            t.items.push(crate::ledger::Item {
                descr: String::new(),
                value,
                confirmed: true,
                account: to,
            });
            t.items.push(crate::ledger::Item {
                descr: String::new(),
                value: -value,
                confirmed: true,
                account: from,
            });
            ledger.add_transaction(t).unwrap();
        };
        push("salary", salary, bank, dec!(2500));
        push("food", bank, food, dec!(300));

        let mut r = Report::new(&ledger, date("2024-03-01"), date("2024-03-31")).unwrap();
        for id in [bank, salary, food] {
            r.add_account(id);
        }
        let ds = r.dataset_monthly_types();
        let march = &ds.groups()[0];
        assert_eq!(march.entries()[0].value, dec!(2200));
        assert_eq!(march.entries()[2].value, dec!(2500));
        assert_eq!(march.entries()[3].value, dec!(300));
        assert_eq!(march.balance, Some(dec!(2200)));
    }

    #[test]
    fn test_dataset_deterministic() {
        let ledger = sample_ledger();
        let r = report(&ledger, "2018-01-01", "2018-12-31", &["Root/Foo", "Root/Bar"]);
        let shape = |ds: &ReportDataset<'_>| {
            ds.iter()
                .map(|g| {
                    let entries: Vec<_> = g
                        .iter()
                        .map(|e| (e.label.clone(), e.value, e.items.len()))
                        .collect();
                    (g.label.clone(), entries)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&r.dataset_monthly()), shape(&r.dataset_monthly()));
        assert_eq!(r.dataset_monthly().len(), 12);
    }

    #[test]
    fn test_dataset_view_from_str() {
        assert_eq!("types".parse::<DatasetView>().unwrap(), DatasetView::Types);
        assert!("pie".parse::<DatasetView>().is_err());
    }
}
