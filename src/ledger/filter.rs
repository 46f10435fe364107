use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{AccountId, AccountType, ItemView, Ledger};

/// Predicate over ledger items. Filters compose with [`ItemFilter::and`] and
/// [`ItemFilter::or`]; combined filters short-circuit left to right.
#[derive(Debug, Clone)]
pub enum ItemFilter {
    All,
    DateFrom(NaiveDate),
    DateTill(NaiveDate),
    DateRange(NaiveDate, NaiveDate),
    /// Items booked exactly on one of the accounts.
    Accounts(Vec<AccountId>),
    /// Items booked on one of the accounts or any of their (grand)children.
    AccountsAndChildren(Vec<AccountId>),
    /// Inverse of `AccountsAndChildren`.
    NotAccountsAndChildren(Vec<AccountId>),
    AccountTypes(Vec<AccountType>),
    EqualValue(Decimal),
    /// Case-insensitive match on item or transaction description.
    DescrContains(String),
    And(Box<ItemFilter>, Box<ItemFilter>),
    Or(Box<ItemFilter>, Box<ItemFilter>),
}

impl ItemFilter {
    pub fn and(self, other: ItemFilter) -> ItemFilter {
        ItemFilter::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: ItemFilter) -> ItemFilter {
        ItemFilter::Or(Box::new(self), Box::new(other))
    }

    pub fn accepts(&self, ledger: &Ledger, view: &ItemView<'_>) -> bool {
        match self {
            ItemFilter::All => true,
            ItemFilter::DateFrom(from) => view.date() >= *from,
            ItemFilter::DateTill(till) => view.date() <= *till,
            ItemFilter::DateRange(from, till) => *from <= view.date() && view.date() <= *till,
            ItemFilter::Accounts(accounts) => accounts.contains(&view.item.account),
            ItemFilter::AccountsAndChildren(accounts) => accounts
                .iter()
                .any(|&acc| ledger.is_self_or_descendant(view.item.account, acc)),
            ItemFilter::NotAccountsAndChildren(accounts) => !accounts
                .iter()
                .any(|&acc| ledger.is_self_or_descendant(view.item.account, acc)),
            ItemFilter::AccountTypes(types) => types.contains(&view.account.kind()),
            ItemFilter::EqualValue(value) => view.item.value == *value,
            ItemFilter::DescrContains(needle) => {
                let needle = needle.to_lowercase();
                view.item.descr.to_lowercase().contains(&needle)
                    || view.transaction.descr.to_lowercase().contains(&needle)
            }
            ItemFilter::And(lhs, rhs) => lhs.accepts(ledger, view) && rhs.accepts(ledger, view),
            ItemFilter::Or(lhs, rhs) => lhs.accepts(ledger, view) || rhs.accepts(ledger, view),
        }
    }
}
