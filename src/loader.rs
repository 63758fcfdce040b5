//! Named, cached GraphQL loaders.
//!
//! A [`LoaderRegistry`] is built once at start-up and shared by `Arc`.
//! Each loader binds a name to a query, an optional clean function that
//! digs the interesting part out of the response, and an optional socket
//! event that triggers a refetch.

use crate::client::GraphqlTransport;
use crate::errors::ClientError;
use crate::queries;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Pulls the useful payload out of a raw `data` object.
pub type CleanFn = fn(&Value) -> Option<Value>;

pub mod names {
    pub const IS_LOGGED_IN: &str = "nomopay_is_logged_in";
    pub const USER_SETTINGS: &str = "nomopay_get_user_settings";
    pub const IDENTITY: &str = "nomopay_get_npa_identity";
    pub const BANK_ACCOUNTS: &str = "nomopay_get_npa_identity_bankaccounts";
    pub const BANK_TRANSACTIONS: &str = "nomopay_get_npa_identity_banktransactions";
    pub const CURRENCIES: &str = "nomopay_get_npa_currencies";
    pub const BENEFICIARIES: &str = "get_npa_beneficiaries";
    pub const PAYMENT_METHODS: &str = "nomopay_get_npa_payment_methods";
}

pub mod events {
    pub const IDENTITY_CHANGED: &str = "npaidentity_changed";
    pub const BANK_ACCOUNT_CHANGED: &str = "npaidentitybankaccount_changed";
    pub const BANK_TRANSACTION_CHANGED: &str = "npaidentitybanktransaction_changed";
    pub const BENEFICIARY_CHANGED: &str = "npabeneficiary_changed";
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoaderOptions {
    pub clean: Option<CleanFn>,
    pub reload_on: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Inserted,
    Replaced,
}

#[derive(Debug, Clone)]
struct Loader {
    query: &'static str,
    options: LoaderOptions,
    value: Option<Value>,
    last_error: Option<String>,
    fetched_at: Option<DateTime<Utc>>,
}

/// Read-only status of one loader, for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderStatus {
    pub name: String,
    pub has_value: bool,
    pub last_error: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub reload_on: Option<&'static str>,
}

#[derive(Debug, Default)]
pub struct LoaderRegistry {
    loaders: RwLock<HashMap<String, Loader>>,
}

fn field(data: &Value, key: &str) -> Option<Value> {
    data.get(key).filter(|v| !v.is_null()).cloned()
}

fn clean_user_settings(data: &Value) -> Option<Value> {
    field(data, "user_settings")
}

fn clean_identity(data: &Value) -> Option<Value> {
    field(data, "npa_identity")
}

fn clean_bank_accounts(data: &Value) -> Option<Value> {
    field(data, "npa_identity_bankaccounts")
}

fn clean_bank_transactions(data: &Value) -> Option<Value> {
    field(data, "npa_identity_banktransactions")
        .or_else(|| field(data, "npa_banktransactions"))
        .or_else(|| data.get("npa_identity").and_then(|i| field(i, "banktransactions")))
        .or_else(|| Some(Value::Array(Vec::new())))
}

fn clean_currencies(data: &Value) -> Option<Value> {
    field(data, "npa_transactioncurrencies")
}

fn clean_beneficiaries(data: &Value) -> Option<Value> {
    data.get("npa_identity")
        .and_then(|i| field(i, "beneficiaries"))
        .or_else(|| Some(Value::Array(Vec::new())))
}

fn clean_payment_methods(data: &Value) -> Option<Value> {
    field(data, "npa_transactionmethods")
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the portal's standard loaders defined.
    pub fn with_defaults() -> Self {
        let reg = Self::new();
        let opts = |clean: CleanFn, reload_on: Option<&'static str>| LoaderOptions {
            clean: Some(clean),
            reload_on,
        };

        reg.define(names::IS_LOGGED_IN, queries::IS_LOGGED_IN, LoaderOptions::default());
        reg.define(
            names::USER_SETTINGS,
            queries::USER_SETTINGS,
            opts(clean_user_settings, None),
        );
        reg.define(
            names::IDENTITY,
            queries::NPA_IDENTITY,
            opts(clean_identity, Some(events::IDENTITY_CHANGED)),
        );
        reg.define(
            names::BANK_ACCOUNTS,
            queries::NPA_IDENTITY_BANK_ACCOUNTS,
            opts(clean_bank_accounts, Some(events::BANK_ACCOUNT_CHANGED)),
        );
        reg.define(
            names::BANK_TRANSACTIONS,
            queries::NPA_IDENTITY_BANK_TRANSACTIONS,
            opts(clean_bank_transactions, Some(events::BANK_TRANSACTION_CHANGED)),
        );
        reg.define(
            names::CURRENCIES,
            queries::NPA_TRANSACTION_CURRENCIES,
            opts(clean_currencies, None),
        );
        reg.define(
            names::BENEFICIARIES,
            queries::NPA_BENEFICIARIES,
            opts(clean_beneficiaries, Some(events::BENEFICIARY_CHANGED)),
        );
        reg.define(
            names::PAYMENT_METHODS,
            queries::NPA_TRANSACTION_METHODS,
            opts(clean_payment_methods, None),
        );
        info!(loaders = reg.len(), "loader registry initialised");
        reg
    }

    /// Bind `name` to a query. Defining an existing name replaces its
    /// query and options but keeps the cached value.
    pub fn define(&self, name: &str, query: &'static str, options: LoaderOptions) -> Registration {
        let mut loaders = self.loaders.write();
        match loaders.get_mut(name) {
            Some(existing) => {
                existing.query = query;
                existing.options = options;
                debug!(loader = name, "loader redefined");
                Registration::Replaced
            }
            None => {
                loaders.insert(
                    name.to_string(),
                    Loader {
                        query,
                        options,
                        value: None,
                        last_error: None,
                        fetched_at: None,
                    },
                );
                debug!(loader = name, "loader defined");
                Registration::Inserted
            }
        }
    }

    pub fn len(&self) -> usize {
        self.loaders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.read().is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loaders.read().contains_key(name)
    }

    /// Current cleaned value. `None` covers unknown loaders, loaders not
    /// fetched yet and loaders whose clean function found nothing.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.loaders.read().get(name).and_then(|l| l.value.clone())
    }

    /// Store a raw `data` object for `name`, running its clean function.
    pub fn set(&self, name: &str, data: &Value) -> Result<(), ClientError> {
        let mut loaders = self.loaders.write();
        let loader = loaders
            .get_mut(name)
            .ok_or_else(|| ClientError::UnknownLoader(name.to_string()))?;
        loader.value = match loader.options.clean {
            Some(clean) => clean(data),
            None => Some(data.clone()),
        };
        loader.last_error = None;
        loader.fetched_at = Some(Utc::now());
        Ok(())
    }

    /// Fetch `name` from the backend and cache the cleaned result. On
    /// failure the previous value stays and the error is recorded.
    pub async fn refresh(
        &self,
        name: &str,
        transport: &dyn GraphqlTransport,
    ) -> Result<(), ClientError> {
        let query = self
            .loaders
            .read()
            .get(name)
            .map(|l| l.query)
            .ok_or_else(|| ClientError::UnknownLoader(name.to_string()))?;

        match transport.execute(query, Value::Object(Default::default())).await {
            Ok(data) => {
                self.set(name, &data)?;
                debug!(loader = name, "loader refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(loader = name, %e, "loader fetch failed");
                if let Some(loader) = self.loaders.write().get_mut(name) {
                    loader.last_error = Some(e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Refresh every loader, in name order.
    pub async fn refresh_all(
        &self,
        transport: &dyn GraphqlTransport,
    ) -> Vec<(String, Result<(), ClientError>)> {
        let mut out = Vec::new();
        for name in self.names() {
            let res = self.refresh(&name, transport).await;
            out.push((name, res));
        }
        out
    }

    /// Loaders bound to a socket event, in name order.
    pub fn loaders_for_event(&self, event: &str) -> Vec<String> {
        let mut bound: Vec<String> = self
            .loaders
            .read()
            .iter()
            .filter(|(_, l)| l.options.reload_on == Some(event))
            .map(|(name, _)| name.clone())
            .collect();
        bound.sort();
        bound
    }

    /// Refetch everything bound to `event`. Returns how many loaders were
    /// refreshed successfully; unknown events are a no-op.
    pub async fn handle_event(&self, event: &str, transport: &dyn GraphqlTransport) -> usize {
        let mut refreshed = 0;
        for name in self.loaders_for_event(event) {
            if self.refresh(&name, transport).await.is_ok() {
                refreshed += 1;
            }
        }
        if refreshed > 0 {
            info!(event, refreshed, "reloaded on socket event");
        }
        refreshed
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loaders.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn status(&self) -> Vec<LoaderStatus> {
        let loaders = self.loaders.read();
        let mut out: Vec<LoaderStatus> = loaders
            .iter()
            .map(|(name, l)| LoaderStatus {
                name: name.clone(),
                has_value: l.value.is_some(),
                last_error: l.last_error.clone(),
                fetched_at: l.fetched_at,
                reload_on: l.options.reload_on,
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}
