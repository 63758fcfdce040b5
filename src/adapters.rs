//! Field adapters: one raw backend record in, one view-model out.
//!
//! Adapters are pure. They never panic on bad input and never read the
//! clock; a record that cannot be mapped yields an [`AdaptError`] and
//! [`adapt_all`] turns a batch into the good items plus a failure count.

use crate::currency;
use crate::errors::AdaptError;
use crate::models::{
    Account, AccountCurrency, AccountKind, AccountStatus, Address, BankDetails,
    BeneficiarySummary, ChartData, Country, CurrencyBalance, CurrencyInfo, Identity,
    IdentityAddress, PaymentMethod, SimpleBeneficiary, StoredBeneficiary, Transaction,
    TransactionKind, TransactionStatus,
};
use crate::raw::Record;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::warn;

const DEFAULT_ACCOUNT_CURRENCY: &str = "EUR";
const DEFAULT_TRANSACTION_CURRENCY: &str = "USD";

/// Output of a batch mapping: what survived and what was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Adapted<T> {
    pub items: Vec<T>,
    pub failures: Vec<(usize, AdaptError)>,
}

impl<T> Adapted<T> {
    pub fn total(&self) -> usize {
        self.items.len() + self.failures.len()
    }
}

/// Run `adapt` over every record, logging each dropped one by index.
pub fn adapt_all<T>(
    what: &'static str,
    records: &[Value],
    adapt: impl Fn(&Value) -> Result<T, AdaptError>,
) -> Adapted<T> {
    let mut items = Vec::with_capacity(records.len());
    let mut failures = Vec::new();
    for (idx, raw) in records.iter().enumerate() {
        match adapt(raw) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!(what, index = idx, %e, "dropping record");
                failures.push((idx, e));
            }
        }
    }
    let adapted = Adapted { items, failures };
    if !adapted.failures.is_empty() {
        warn!(
            what,
            failed = adapted.failures.len(),
            total = adapted.total(),
            "{} of {} records failed to adapt",
            adapted.failures.len(),
            adapted.total()
        );
    }
    adapted
}

// ---------------------------------------------------------------- accounts

/// Resolve the account kind from the first discriminator the record carries.
fn account_kind(rec: &Record<'_>) -> AccountKind {
    if let Some(code) = rec.first_text(&["type_char", "accounttype_char", "account_type"]) {
        return AccountKind::from_code(&code).unwrap_or(AccountKind::Unknown(code));
    }
    // legacy records: no discriminator, only a free-text name
    match rec.text("name") {
        Some(name) if name.to_lowercase().contains("numbered") => AccountKind::Numbered,
        _ => AccountKind::GbBased,
    }
}

/// `CHAB **** 3123` style masking of an account id.
pub fn mask_account_number(kind: &AccountKind, id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    match kind.number_prefix() {
        Some(prefix) => {
            let head: String = chars.iter().take(2).collect::<String>().to_uppercase();
            format!("{prefix}{head} **** {tail}")
        }
        None => format!("**** {tail}"),
    }
}

fn currency_info(rec: &Record<'_>) -> Result<CurrencyInfo, AdaptError> {
    let code = rec.require_text("currency_code")?;
    Ok(CurrencyInfo {
        name: rec.text("currency_txt").unwrap_or_else(|| code.clone()),
        symbol: currency::symbol(&code),
        decimals: currency::decimals(&code),
        code,
    })
}

pub fn adapt_account(raw: &Value) -> Result<Account, AdaptError> {
    let rec = Record::new(Some(raw))?;
    let id = rec.require_text("id")?;
    let kind = account_kind(&rec);
    let balance = rec.decimal_or_zero("balance")?;

    // a partial currency block leaves the account on the default currency
    let currency = rec.child("transactioncurrency");
    let info = currency.and_then(|cur| currency_info(&cur).ok());
    let code = info
        .as_ref()
        .map(|i| i.code.clone())
        .unwrap_or_else(|| DEFAULT_ACCOUNT_CURRENCY.to_string());
    let available_currencies = info
        .into_iter()
        .map(|i| AccountCurrency {
            code: i.code,
            name: i.name,
            symbol: i.symbol,
            balance: Decimal::ZERO,
            exchange_rate: Decimal::ONE,
        })
        .collect();

    Ok(Account {
        name: kind.display_name().to_string(),
        account_number: mask_account_number(&kind, &id),
        currency: code,
        kind,
        balance,
        available_currencies,
        chart: ChartData::default(),
        last_updated: rec.timestamp("created_at")?,
        status: AccountStatus::Active,
        id,
    })
}

pub fn adapt_balance(raw: &Value) -> Result<CurrencyBalance, AdaptError> {
    let rec = Record::new(Some(raw))?;
    let id = rec.require_text("id")?;
    let currency = rec
        .child("transactioncurrency")
        .ok_or(AdaptError::MissingField("transactioncurrency"))?;
    let balance = rec.decimal_or_zero("balance")?;
    let available = rec.decimal("available_balance")?.unwrap_or(balance);

    Ok(CurrencyBalance {
        id: format!("balance-{id}"),
        account_id: id,
        currency: currency_info(&currency)?,
        balance,
        available,
        pending: Decimal::ZERO,
    })
}

// ------------------------------------------------------------ transactions

fn transaction_kind(rec: &Record<'_>) -> TransactionKind {
    if let Some(kind) = rec.text("type_txt").and_then(|t| TransactionKind::from_text(&t)) {
        return kind;
    }
    match rec.text("type_char") {
        Some(code) => TransactionKind::from_code(&code),
        None => TransactionKind::Funds,
    }
}

fn beneficiary_name(rec: &Record<'_>) -> String {
    format!(
        "{} {}",
        rec.text_or_empty("firstname_txt"),
        rec.text_or_empty("lastname_txt")
    )
    .trim()
    .to_string()
}

pub fn adapt_transaction(raw: &Value) -> Result<Transaction, AdaptError> {
    let rec = Record::new(Some(raw))?;
    let id = rec.require_text("id")?;
    let kind = transaction_kind(&rec);
    let amount = kind.signed(rec.decimal_or_zero("request_amount")?);

    let beneficiary = rec.child("beneficiary").map(|b| BeneficiarySummary {
        name: beneficiary_name(&b),
        account: b.first_text(&["accountnumber_txt", "beneficiary_bankaccountnumber_txt"]),
    });

    Ok(Transaction {
        id,
        account_id: rec
            .child("identitybankaccount")
            .and_then(|a| a.text("id"))
            .unwrap_or_default(),
        date: rec.timestamp("created_at")?,
        description: rec.text("type_txt").unwrap_or_else(|| "Transaction".into()),
        amount,
        currency: rec
            .child("transactioncurrency")
            .and_then(|c| c.text("currency_code"))
            .unwrap_or_else(|| DEFAULT_TRANSACTION_CURRENCY.to_string()),
        kind,
        status: TransactionStatus::from_text(&rec.text_or_empty("status_txt")),
        reference: rec.text("reference_code"),
        beneficiary,
    })
}

pub fn adapt_currency(raw: &Value) -> Result<CurrencyInfo, AdaptError> {
    currency_info(&Record::new(Some(raw))?)
}

// ----------------------------------------------------------- beneficiaries

/// The `addresses` entry flagged current, else the first one.
fn current_address<'a>(rec: &Record<'a>) -> Option<Record<'a>> {
    let addresses: Vec<Record<'a>> = rec
        .list("addresses")
        .iter()
        .filter_map(|a| Record::new(Some(a)).ok())
        .collect();
    addresses
        .iter()
        .find(|a| a.flag("is_current"))
        .or_else(|| addresses.first())
        .copied()
}

fn personal_address(addr: &Record<'_>) -> Address {
    Address {
        line1: addr.text_or_empty("address_line1"),
        line2: addr.text("address_line2"),
        city: addr.text_or_empty("address_city"),
        state: addr.text("address_state"),
        country: addr.text_or_empty("address_country_code"),
        postal_code: addr.text_or_empty("address_zipcode"),
    }
}

/// Bank block whose fields share a prefix, e.g. `beneficiary_bank…`.
fn bank_details(rec: &Record<'_>, prefix: &str, name_key: &str) -> BankDetails {
    let field = |suffix: &str| rec.text_or_empty(&format!("{prefix}{suffix}"));
    BankDetails {
        name: rec.text_or_empty(name_key),
        account_number: field("accountnumber_txt"),
        swift_code: field("swiftcode_txt"),
        iban: field("iban_txt"),
        bic: field("bic_txt"),
        sort_branch_code: field("sortbranchcode_txt"),
        address: Address {
            line1: field("address_line1"),
            line2: rec.text(&format!("{prefix}address_line2")),
            city: field("address_city"),
            state: rec.text(&format!("{prefix}address_state")),
            country: field("address_country"),
            postal_code: field("address_zipcode"),
        },
    }
}

pub fn adapt_beneficiary(raw: &Value) -> Result<SimpleBeneficiary, AdaptError> {
    let rec = Record::new(Some(raw))?;
    let id = rec.require_text("id")?;
    let full_name = beneficiary_name(&rec);
    let name = if full_name.is_empty() {
        rec.text_or_empty("accountholder_txt")
    } else {
        full_name
    };

    Ok(SimpleBeneficiary {
        id,
        name,
        bank_name: rec
            .first_text(&["beneficiary_bankname_txt", "regular_bankname_txt"])
            .unwrap_or_default(),
        account_number: rec
            .first_text(&["beneficiary_bankaccountnumber_txt", "accountnumber_txt"])
            .unwrap_or_default(),
        iban: rec.text_or_empty("beneficiary_bankiban_txt"),
        swift_code: rec
            .first_text(&["beneficiary_bankswiftcode_txt", "regular_bankswiftcode_txt"])
            .unwrap_or_default(),
        address: current_address(&rec).map(|a| personal_address(&a)),
    })
}

pub fn adapt_stored_beneficiary(raw: &Value) -> Result<StoredBeneficiary, AdaptError> {
    let rec = Record::new(Some(raw))?;
    let id = rec.require_text("id")?;
    let created_at = rec.timestamp("created_at")?;
    let updated_at = rec.timestamp("updated_at")?.or(created_at);

    Ok(StoredBeneficiary {
        id,
        currency_id: rec
            .first_text(&["transactioncurrency_id"])
            .or_else(|| rec.child("transactioncurrency").and_then(|c| c.text("id")))
            .unwrap_or_default(),
        email: rec.text_or_empty("email_txt"),
        firstname: rec.text_or_empty("firstname_txt"),
        middlename: rec.text("middlename_txt"),
        lastname: rec.text_or_empty("lastname_txt"),
        account_holder: rec.text_or_empty("accountholder_txt"),
        personal_address: current_address(&rec)
            .map(|a| personal_address(&a))
            .unwrap_or_default(),
        bank: bank_details(&rec, "beneficiary_bank", "beneficiary_bankname_txt"),
        intermediate_bank: bank_details(&rec, "intermediate_bank", "intermediate_bankname_txt"),
        created_at,
        updated_at,
    })
}

// --------------------------------------------------------- identity & misc

pub fn adapt_identity(raw: &Value) -> Result<Identity, AdaptError> {
    let rec = Record::new(Some(raw))?;
    let id = rec.require_text("id")?;
    let account = rec
        .child("v1_account")
        .ok_or(AdaptError::MissingField("v1_account"))?;
    let details = account
        .child("details")
        .ok_or(AdaptError::MissingField("details"))?;
    let personal = details.child("info_personal");
    let personal_text = |key: &str| personal.and_then(|p| p.text(key));

    let personal_address = details
        .child("info_address")
        .filter(|a| a.text("city").is_some())
        .map(|a| IdentityAddress {
            line1: a.text_or_empty("street"),
            line2: a.text("building_number"),
            city: a.text_or_empty("city"),
            state: a.text_or_empty("state"),
            country: a
                .child("residence_country")
                .map(|c| Country {
                    id: c.text_or_empty("id"),
                    name: c.text_or_empty("name"),
                    iso: c.text_or_empty("iso"),
                })
                .unwrap_or_default(),
            zipcode: a.text_or_empty("zipcode"),
        });

    Ok(Identity {
        id,
        email: details.text_or_empty("email"),
        firstname: personal_text("firstname").unwrap_or_default(),
        lastname: personal_text("lastname").unwrap_or_default(),
        date_of_birth: personal_text("date_of_birth"),
        phone_number: details.text("phone"),
        username: account.text("user_name"),
        member_key: account.text("member_key"),
        personal_address,
    })
}

pub fn adapt_payment_method(raw: &Value) -> Result<PaymentMethod, AdaptError> {
    let rec = Record::new(Some(raw))?;
    Ok(PaymentMethod {
        id: rec.require_text("id")?,
        code: rec.text_or_empty("method_code"),
        name: rec
            .first_text(&["method_txt", "method_code"])
            .unwrap_or_default(),
        type_char: rec.text_or_empty("type_char"),
        account_type: rec.text_or_empty("account_type"),
        is_active: rec.flag("is_active"),
        is_local: rec.flag("is_local"),
        is_international: rec.flag("is_intl"),
        currency_id: rec.text_or_empty("transactioncurrency_id"),
    })
}
