//! Read-only ledger snapshot: an account tree plus dated transactions whose
//! items are booked on accounts.

mod filter;
pub mod period;
pub mod value;

pub use filter::ItemFilter;
pub use period::{parse_date, Interval, Period};
pub use value::{check_value, parse_value, quantize, MAX_ABS_VALUE};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ReportError, Result};

/// Separator between account names in a full account path.
pub const SEPARATOR: char = '/';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Unknown,
    /// Money is received from it (salary, interest).
    Profit,
    /// Money is spent on it.
    Expense,
    /// Cash or bank account.
    Asset,
    /// Credit card, loan.
    Liability,
}

impl AccountType {
    pub const NAMES: &'static str = "unknown, profit, expense, asset, liability";

    pub fn label(self) -> &'static str {
        match self {
            AccountType::Unknown => "Unknown",
            AccountType::Profit => "Profit",
            AccountType::Expense => "Expense",
            AccountType::Asset => "Asset",
            AccountType::Liability => "Liability",
        }
    }

    /// Sign applied to raw item values for display: income and debt read
    /// positive.
    pub fn display_sign(self) -> Decimal {
        match self {
            AccountType::Profit | AccountType::Liability => Decimal::NEGATIVE_ONE,
            _ => Decimal::ONE,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AccountType {
    type Err = ReportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown" => Ok(AccountType::Unknown),
            "profit" | "income" => Ok(AccountType::Profit),
            "expense" => Ok(AccountType::Expense),
            "asset" => Ok(AccountType::Asset),
            "liability" => Ok(AccountType::Liability),
            _ => Err(ReportError::InvalidChoice {
                kind: "account type",
                value: s.to_string(),
                expected: AccountType::NAMES,
            }),
        }
    }
}

/// Index of an account inside its [`Ledger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(usize);

#[derive(Debug, Clone)]
pub struct Account {
    id: AccountId,
    name: String,
    fullname: String,
    kind: AccountType,
    parent: Option<AccountId>,
    children: Vec<AccountId>,
}

impl Account {
    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path from the root account, e.g. `Expenses/Food/Groceries`.
    pub fn fullname(&self) -> &str {
        &self.fullname
    }

    pub fn kind(&self) -> AccountType {
        self.kind
    }

    pub fn parent(&self) -> Option<AccountId> {
        self.parent
    }

    pub fn children(&self) -> &[AccountId] {
        &self.children
    }
}

#[derive(Debug, Clone)]
pub struct Item {
    pub descr: String,
    pub value: Decimal,
    pub confirmed: bool,
    pub account: AccountId,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub date: NaiveDate,
    pub descr: String,
    pub items: Vec<Item>,
}

impl Transaction {
    pub fn new(date: NaiveDate, descr: impl Into<String>) -> Self {
        Self {
            date,
            descr: descr.into(),
            items: Vec::new(),
        }
    }

    /// Sum of all item values; zero for a balanced transaction.
    pub fn balance(&self) -> Decimal {
        self.items.iter().map(|i| i.value).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.balance().is_zero()
    }
}

/// An item together with the transaction and account it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ItemView<'a> {
    pub transaction: &'a Transaction,
    pub item: &'a Item,
    pub account: &'a Account,
}

impl<'a> ItemView<'a> {
    pub fn date(&self) -> NaiveDate {
        self.transaction.date
    }

    pub fn value(&self) -> Decimal {
        self.item.value
    }

    /// Value with the display sign of the item's account type applied.
    pub fn value_derived(&self) -> Decimal {
        self.item.value * self.account.kind.display_sign()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    accounts: Vec<Account>,
    roots: Vec<AccountId>,
    by_name: HashMap<String, AccountId>,
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the account at `path`, creating missing parents as `Unknown`.
    ///
    /// Re-adding an existing path upgrades an `Unknown` type; any other type
    /// mismatch is an error.
    pub fn add_account(&mut self, path: &str, kind: AccountType) -> Result<AccountId> {
        let names: Vec<&str> = path.split(SEPARATOR).map(str::trim).collect();
        if names.iter().any(|n| n.is_empty()) {
            return Err(ReportError::InvalidAccountName(path.to_string()));
        }

        let mut parent: Option<AccountId> = None;
        let mut fullname = String::new();
        for (depth, name) in names.iter().enumerate() {
            if !fullname.is_empty() {
                fullname.push(SEPARATOR);
            }
            fullname.push_str(name);
            let is_leaf = depth == names.len() - 1;

            let id = match self.by_name.get(&fullname) {
                Some(&id) => id,
                None => {
                    let id = AccountId(self.accounts.len());
                    self.accounts.push(Account {
                        id,
                        name: name.to_string(),
                        fullname: fullname.clone(),
                        kind: AccountType::Unknown,
                        parent,
                        children: Vec::new(),
                    });
                    match parent {
                        Some(p) => self.accounts[p.0].children.push(id),
                        None => self.roots.push(id),
                    }
                    self.by_name.insert(fullname.clone(), id);
                    id
                }
            };

            if is_leaf && kind != AccountType::Unknown {
                let account = &mut self.accounts[id.0];
                match account.kind {
                    AccountType::Unknown => account.kind = kind,
                    existing if existing != kind => {
                        return Err(ReportError::AccountTypeConflict {
                            path: fullname,
                            existing: existing.to_string(),
                        })
                    }
                    _ => {}
                }
            }
            parent = Some(id);
        }

        parent.ok_or_else(|| ReportError::InvalidAccountName(path.to_string()))
    }

    /// Insert a transaction, keeping transactions ordered by date.
    /// Transactions with equal dates keep their insertion order.
    ///
    /// Item values must stay within [`MAX_ABS_VALUE`], so sums over items
    /// cannot overflow.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<()> {
        for item in &transaction.items {
            if item.account.0 >= self.accounts.len() {
                return Err(ReportError::UnknownAccount(format!("#{}", item.account.0)));
            }
            check_value(item.value, &item.value.to_string())?;
        }
        let pos = self
            .transactions
            .partition_point(|t| t.date <= transaction.date);
        self.transactions.insert(pos, transaction);
        Ok(())
    }

    pub fn account(&self, id: AccountId) -> &Account {
        &self.accounts[id.0]
    }

    pub fn find(&self, fullname: &str) -> Option<&Account> {
        let key = fullname.trim().trim_matches(SEPARATOR);
        self.by_name.get(key).map(|&id| self.account(id))
    }

    pub fn lookup(&self, fullname: &str) -> Result<AccountId> {
        self.find(fullname)
            .map(Account::id)
            .ok_or_else(|| ReportError::UnknownAccount(fullname.to_string()))
    }

    /// Accounts in depth-first order.
    pub fn accounts(&self) -> Vec<&Account> {
        let mut out = Vec::with_capacity(self.accounts.len());
        for &root in &self.roots {
            out.push(self.account(root));
            out.extend(self.descendants(root).into_iter().map(|id| self.account(id)));
        }
        out
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// (Grand)children of `id` in depth-first order, excluding `id`.
    pub fn descendants(&self, id: AccountId) -> Vec<AccountId> {
        let mut out = Vec::new();
        for &child in &self.account(id).children {
            out.push(child);
            out.extend(self.descendants(child));
        }
        out
    }

    /// True when `descendant` is a (grand)child of `ancestor`.
    pub fn is_descendant(&self, descendant: AccountId, ancestor: AccountId) -> bool {
        let mut current = self.account(descendant).parent;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.account(id).parent;
        }
        false
    }

    pub fn is_self_or_descendant(&self, account: AccountId, ancestor: AccountId) -> bool {
        account == ancestor || self.is_descendant(account, ancestor)
    }

    /// All items in transaction order.
    pub fn items(&self) -> impl Iterator<Item = ItemView<'_>> {
        self.transactions.iter().flat_map(move |transaction| {
            transaction.items.iter().map(move |item| ItemView {
                transaction,
                item,
                account: self.account(item.account),
            })
        })
    }

    /// Items accepted by `filter`, in transaction order.
    pub fn filter_items<'a>(
        &'a self,
        filter: &'a ItemFilter,
    ) -> impl Iterator<Item = ItemView<'a>> + 'a {
        self.items().filter(move |view| filter.accepts(self, view))
    }

    pub fn item_count(&self, account: AccountId) -> usize {
        self.items().filter(|v| v.account.id == account).count()
    }
}
