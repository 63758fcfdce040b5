//! View-model reads over the loader cache.
//!
//! Each view takes whatever the registry currently holds, runs it through
//! the matching adapter and drops records that fail. "Nothing fetched yet"
//! and "fetched zero records" both come back as an empty result; `skipped`
//! tells callers how many records were lost in adaptation.

use crate::adapters::{self, Adapted};
use crate::errors::AdaptError;
use crate::loader::{LoaderRegistry, names};
use crate::models::{
    Account, AccountKind, CurrencyBalance, CurrencyInfo, Identity, PaymentMethod,
    SimpleBeneficiary, StoredBeneficiary, Transaction,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

const RECENT_TRANSACTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewResult<T> {
    pub data: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    /// Records dropped because they could not be adapted.
    pub skipped: usize,
}

impl<T> ViewResult<T> {
    fn empty() -> Self {
        Self {
            data: Vec::new(),
            loading: false,
            error: None,
            skipped: 0,
        }
    }

    fn from_adapted(adapted: Adapted<T>) -> Self {
        Self {
            skipped: adapted.failures.len(),
            data: adapted.items,
            loading: false,
            error: None,
        }
    }

    fn retain(mut self, keep: impl Fn(&T) -> bool) -> Self {
        self.data.retain(|item| keep(item));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountWithBalances {
    pub account: Option<Account>,
    pub balances: Vec<CurrencyBalance>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub accounts: Vec<Account>,
    pub balances: Vec<CurrencyBalance>,
    pub recent_transactions: Vec<Transaction>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Money in and out over a set of transactions. Expenses are positive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionStats {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub transaction_count: usize,
}

impl TransactionStats {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        transactions.iter().fold(Self::default(), |mut acc, t| {
            if t.amount > Decimal::ZERO {
                acc.total_income += t.amount;
            } else {
                acc.total_expenses += t.amount.abs();
            }
            acc.transaction_count += 1;
            acc
        })
    }
}

/// Newest first; undated transactions go last, keeping backend order.
fn newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Borrowing facade over a registry snapshot.
#[derive(Clone, Copy)]
pub struct Views<'a> {
    registry: &'a LoaderRegistry,
}

impl<'a> Views<'a> {
    pub fn new(registry: &'a LoaderRegistry) -> Self {
        Self { registry }
    }

    fn collection<T>(
        &self,
        loader: &str,
        what: &'static str,
        adapt: impl Fn(&Value) -> Result<T, AdaptError>,
    ) -> ViewResult<T> {
        match self.registry.get(loader) {
            Some(Value::Array(records)) => {
                ViewResult::from_adapted(adapters::adapt_all(what, &records, adapt))
            }
            Some(other) => {
                debug!(loader, kind = %json_kind(&other), "loader value is not a list");
                ViewResult::empty()
            }
            None => {
                debug!(loader, "no data from backend yet");
                ViewResult::empty()
            }
        }
    }

    pub fn accounts(&self) -> ViewResult<Account> {
        self.collection(names::BANK_ACCOUNTS, "accounts", adapters::adapt_account)
    }

    /// Balances, optionally only those of one account.
    pub fn balances(&self, account_id: Option<&str>) -> ViewResult<CurrencyBalance> {
        let all = self.collection(names::BANK_ACCOUNTS, "balances", adapters::adapt_balance);
        match account_id {
            Some(id) => all.retain(|b| b.account_id == id),
            None => all,
        }
    }

    /// Transactions, optionally only those linked to one account.
    /// Unlinked transactions carry an empty `account_id` and never match a
    /// filter.
    pub fn transactions(&self, account_id: Option<&str>) -> ViewResult<Transaction> {
        let all = self.collection(
            names::BANK_TRANSACTIONS,
            "transactions",
            adapters::adapt_transaction,
        );
        match account_id {
            Some(id) => all.retain(|t| t.account_id == id),
            None => all,
        }
    }

    /// Transactions in one currency, newest first.
    pub fn transactions_by_currency(
        &self,
        account_id: Option<&str>,
        currency: &str,
    ) -> ViewResult<Transaction> {
        let mut view = self
            .transactions(account_id)
            .retain(|t| t.currency.eq_ignore_ascii_case(currency));
        newest_first(&mut view.data);
        view
    }

    /// Transactions dated within `[start, end]`, newest first. Undated
    /// transactions never match.
    pub fn transactions_between(
        &self,
        account_id: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ViewResult<Transaction> {
        let mut view = self
            .transactions(account_id)
            .retain(|t| t.date.is_some_and(|d| d >= start && d <= end));
        newest_first(&mut view.data);
        view
    }

    /// The `limit` most recent transactions.
    pub fn recent_transactions(&self, account_id: Option<&str>, limit: usize) -> Vec<Transaction> {
        let mut data = self.transactions(account_id).data;
        newest_first(&mut data);
        data.truncate(limit);
        data
    }

    pub fn transaction_stats(&self, account_id: Option<&str>) -> TransactionStats {
        TransactionStats::from_transactions(&self.transactions(account_id).data)
    }

    /// First account of the given kind.
    pub fn account_by_kind(&self, kind: &AccountKind) -> Option<Account> {
        self.accounts().data.into_iter().find(|a| &a.kind == kind)
    }

    /// Balances above zero.
    pub fn active_balances(&self, account_id: Option<&str>) -> ViewResult<CurrencyBalance> {
        self.balances(account_id).retain(|b| b.balance > Decimal::ZERO)
    }

    /// Plain sum of balances across currencies, without conversion.
    pub fn account_value(&self, account_id: &str) -> Decimal {
        self.balances(Some(account_id))
            .data
            .iter()
            .map(|b| b.balance)
            .sum()
    }

    pub fn currencies(&self) -> ViewResult<CurrencyInfo> {
        self.collection(names::CURRENCIES, "currencies", adapters::adapt_currency)
    }

    pub fn beneficiaries(&self) -> ViewResult<SimpleBeneficiary> {
        self.collection(names::BENEFICIARIES, "beneficiaries", adapters::adapt_beneficiary)
    }

    pub fn stored_beneficiaries(&self) -> ViewResult<StoredBeneficiary> {
        self.collection(
            names::BENEFICIARIES,
            "stored beneficiaries",
            adapters::adapt_stored_beneficiary,
        )
    }

    pub fn payment_methods(&self) -> ViewResult<PaymentMethod> {
        self.collection(
            names::PAYMENT_METHODS,
            "payment methods",
            adapters::adapt_payment_method,
        )
    }

    /// The signed-in identity, if loaded and well-formed.
    pub fn identity(&self) -> Option<Identity> {
        let raw = self.registry.get(names::IDENTITY)?;
        adapters::adapt_identity(&raw)
            .map_err(|e| debug!(%e, "identity not usable"))
            .ok()
    }

    pub fn account_with_balances(&self, account_id: &str) -> AccountWithBalances {
        let account = self
            .accounts()
            .data
            .into_iter()
            .find(|a| a.id == account_id);
        AccountWithBalances {
            account,
            balances: self.balances(Some(account_id)).data,
            loading: false,
            error: None,
        }
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard {
            accounts: self.accounts().data,
            balances: self.balances(None).data,
            recent_transactions: self.recent_transactions(None, RECENT_TRANSACTIONS),
            loading: false,
            error: None,
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn registry_with_snapshot() -> LoaderRegistry {
        let reg = LoaderRegistry::with_defaults();
        reg.set(
            names::BANK_ACCOUNTS,
            &json!({"npa_identity_bankaccounts": [
                {"id": "acc-1", "type_char": "N", "balance": "100",
                 "transactioncurrency": {"currency_code": "EUR", "currency_txt": "Euro"}},
                {"id": "acc-2", "type_char": "G", "balance": "50.25", "available_balance": "40",
                 "transactioncurrency": {"currency_code": "GBP", "currency_txt": "Pound"}},
                null
            ]}),
        )
        .unwrap();
        reg.set(
            names::BANK_TRANSACTIONS,
            &json!({"npa_identity_banktransactions": [
                {"id": "t1", "type_txt": "Deposit", "request_amount": "-10",
                 "identitybankaccount": {"id": "acc-1"}},
                {"id": "t2", "type_txt": "Transfer", "request_amount": "5",
                 "identitybankaccount": {"id": "acc-2"}},
                {"id": "t3", "type_txt": "Deposit", "request_amount": "1"},
                {"id": "t4", "request_amount": "not money"}
            ]}),
        )
        .unwrap();
        reg
    }

    #[test]
    fn missing_loader_data_is_an_empty_result() {
        let reg = LoaderRegistry::with_defaults();
        let views = Views::new(&reg);
        assert_eq!(
            views.accounts(),
            ViewResult {
                data: vec![],
                loading: false,
                error: None,
                skipped: 0
            }
        );

        reg.set(names::CURRENCIES, &json!({"npa_transactioncurrencies": []}))
            .unwrap();
        assert_eq!(views.currencies(), ViewResult::empty());
        assert!(views.identity().is_none());
    }

    #[test]
    fn bad_records_are_counted_not_hidden() {
        let reg = registry_with_snapshot();
        let views = Views::new(&reg);
        let accounts = views.accounts();
        assert_eq!(accounts.data.len(), 2);
        assert_eq!(accounts.skipped, 1);

        let txs = views.transactions(None);
        assert_eq!(txs.data.len(), 3);
        assert_eq!(txs.skipped, 1);
    }

    #[test]
    fn balances_filter_by_account() {
        let reg = registry_with_snapshot();
        let views = Views::new(&reg);
        let only = views.balances(Some("acc-2"));
        assert_eq!(only.data.len(), 1);
        assert!(only.data.iter().all(|b| b.account_id == "acc-2"));
        assert_eq!(only.data[0].available, dec!(40));
        assert!(views.balances(Some("nope")).data.is_empty());
        assert_eq!(views.balances(None).data.len(), 2);
    }

    #[test]
    fn unlinked_transactions_are_not_redistributed() {
        let reg = registry_with_snapshot();
        let views = Views::new(&reg);
        let acc1 = views.transactions(Some("acc-1"));
        assert_eq!(acc1.data.len(), 1);
        assert_eq!(acc1.data[0].amount, dec!(10));
        let acc2 = views.transactions(Some("acc-2"));
        assert_eq!(acc2.data[0].amount, dec!(-5));
        let unlinked: Vec<_> = views
            .transactions(None)
            .data
            .into_iter()
            .filter(|t| t.account_id.is_empty())
            .collect();
        assert_eq!(unlinked.len(), 1);
    }

    #[test]
    fn account_with_balances_and_dashboard() {
        let reg = registry_with_snapshot();
        let views = Views::new(&reg);
        let combined = views.account_with_balances("acc-1");
        assert_eq!(combined.account.unwrap().name, "Numbered Account");
        assert_eq!(combined.balances.len(), 1);

        let dash = views.dashboard();
        assert_eq!(dash.accounts.len(), 2);
        assert_eq!(dash.recent_transactions.len(), 3);
        assert!(!dash.loading);
    }

    fn dated_registry() -> LoaderRegistry {
        let reg = LoaderRegistry::with_defaults();
        let txs: Vec<Value> = (1..=7)
            .map(|day| {
                let kind = if day % 2 == 0 { "Transfer" } else { "Deposit" };
                let currency = if day < 4 { "EUR" } else { "USD" };
                json!({
                    "id": format!("t{day}"),
                    "type_txt": kind,
                    "request_amount": format!("{day}0"),
                    "created_at": format!("2024-03-0{day}T10:00:00Z"),
                    "identitybankaccount": {"id": "acc-1"},
                    "transactioncurrency": {"currency_code": currency}
                })
            })
            .chain([json!({"id": "undated", "type_txt": "Deposit", "request_amount": "1",
                           "identitybankaccount": {"id": "acc-1"}})])
            .collect();
        reg.set(
            names::BANK_TRANSACTIONS,
            &json!({"npa_identity_banktransactions": txs}),
        )
        .unwrap();
        reg
    }

    fn ids(txs: &[Transaction]) -> Vec<&str> {
        txs.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn dashboard_shows_the_newest_five() {
        let reg = dated_registry();
        let dash = Views::new(&reg).dashboard();
        assert_eq!(ids(&dash.recent_transactions), ["t7", "t6", "t5", "t4", "t3"]);
    }

    #[test]
    fn currency_and_date_range_filters() {
        let reg = dated_registry();
        let views = Views::new(&reg);

        let eur = views.transactions_by_currency(Some("acc-1"), "eur");
        assert_eq!(ids(&eur.data), ["t3", "t2", "t1"]);
        assert!(views.transactions_by_currency(Some("acc-2"), "EUR").data.is_empty());

        let start: DateTime<Utc> = "2024-03-02T00:00:00Z".parse().unwrap();
        let end: DateTime<Utc> = "2024-03-04T10:00:00Z".parse().unwrap();
        let ranged = views.transactions_between(None, start, end);
        assert_eq!(ids(&ranged.data), ["t4", "t3", "t2"]);
    }

    #[test]
    fn stats_split_income_and_expenses() {
        let reg = dated_registry();
        let stats = Views::new(&reg).transaction_stats(Some("acc-1"));
        // deposits 10 + 30 + 50 + 70 + 1, transfers 20 + 40 + 60
        assert_eq!(stats.total_income, dec!(161));
        assert_eq!(stats.total_expenses, dec!(120));
        assert_eq!(stats.transaction_count, 8);
        assert_eq!(TransactionStats::from_transactions(&[]), TransactionStats::default());
    }

    #[test]
    fn account_lookups_and_active_balances() {
        let reg = registry_with_snapshot();
        let views = Views::new(&reg);
        assert_eq!(views.account_by_kind(&AccountKind::GbBased).unwrap().id, "acc-2");
        assert!(views.account_by_kind(&AccountKind::Unknown("Z".into())).is_none());
        assert_eq!(views.account_value("acc-2"), dec!(50.25));
        assert_eq!(views.account_value("nope"), Decimal::ZERO);

        reg.set(
            names::BANK_ACCOUNTS,
            &json!({"npa_identity_bankaccounts": [
                {"id": "z", "type_char": "N", "balance": "0",
                 "transactioncurrency": {"currency_code": "CHF"}},
                {"id": "p", "type_char": "N", "balance": "3",
                 "transactioncurrency": {"currency_code": "CHF"}}
            ]}),
        )
        .unwrap();
        let active = views.active_balances(None);
        assert_eq!(active.skipped, 0);
        assert_eq!(active.data.len(), 1);
        assert_eq!(active.data[0].account_id, "p");
    }

    #[test]
    fn non_list_loader_value_reads_as_empty() {
        let reg = LoaderRegistry::with_defaults();
        reg.set(names::PAYMENT_METHODS, &json!({"npa_transactionmethods": {"id": "m"}}))
            .unwrap();
        assert!(Views::new(&reg).payment_methods().data.is_empty());
    }

    #[test]
    fn beneficiaries_both_shapes() {
        let reg = LoaderRegistry::with_defaults();
        reg.set(
            names::BENEFICIARIES,
            &json!({"npa_identity": {"beneficiaries": [
                {"id": "b1", "firstname_txt": "Ada", "lastname_txt": "L", "created_at": 1}
            ]}}),
        )
        .unwrap();
        let views = Views::new(&reg);
        assert_eq!(views.beneficiaries().data[0].name, "Ada L");
        assert!(views.stored_beneficiaries().data[0].created_at.is_some());
    }
}
