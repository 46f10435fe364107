//! On-disk ledger format (`ledger.toml`).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::ledger::{check_value, parse_value, AccountType, Item, Ledger, Transaction};

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct LedgerFile {
    #[serde(default)]
    pub accounts: Vec<AccountEntry>,
    #[serde(default)]
    pub transactions: Vec<TransactionEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AccountEntry {
    /// Full path, e.g. "Expenses/Food"
    pub path: String,
    #[serde(default, rename = "type")]
    pub kind: AccountType,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TransactionEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub descr: String,
    #[serde(default)]
    pub items: Vec<ItemEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ItemEntry {
    pub account: String,
    pub value: RawValue,
    #[serde(default)]
    pub descr: String,
    #[serde(default)]
    pub confirmed: bool,
}

/// Item value as written in the file: a plain number or an arithmetic
/// expression such as `"12,50 + 3"`.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum RawValue {
    Integer(i64),
    Float(f64),
    Expr(String),
}

impl RawValue {
    pub fn to_decimal(&self) -> Result<Decimal> {
        match self {
            RawValue::Integer(n) => check_value(Decimal::from(*n), &n.to_string()),
            RawValue::Float(f) => {
                let value = Decimal::try_from(*f).map_err(|e| ReportError::InvalidValue {
                    expr: f.to_string(),
                    reason: e.to_string(),
                })?;
                check_value(value, &f.to_string())
            }
            RawValue::Expr(expr) => parse_value(expr),
        }
    }
}

impl LedgerFile {
    /// Build the in-memory ledger. Accounts referenced only by items are
    /// created on the fly with type `Unknown`.
    pub fn into_ledger(self) -> Result<Ledger> {
        let mut ledger = Ledger::new();
        for entry in &self.accounts {
            ledger.add_account(&entry.path, entry.kind)?;
        }

        for entry in self.transactions {
            let mut transaction = Transaction::new(entry.date, entry.descr);
            for item in entry.items {
                let account = match ledger.find(&item.account) {
                    Some(account) => account.id(),
                    None => ledger.add_account(&item.account, AccountType::Unknown)?,
                };
                transaction.items.push(Item {
                    descr: item.descr,
                    value: item.value.to_decimal()?,
                    confirmed: item.confirmed,
                    account,
                });
            }
            if !transaction.is_balanced() {
                tracing::warn!(
                    date = %transaction.date,
                    descr = %transaction.descr,
                    balance = %transaction.balance(),
                    "unbalanced transaction"
                );
            }
            ledger.add_transaction(transaction)?;
        }

        tracing::debug!(
            accounts = ledger.accounts().len(),
            transactions = ledger.transactions().len(),
            "ledger loaded"
        );
        Ok(ledger)
    }
}
