//! View-model types: the backend-shape-independent records the UI renders.
//!
//! Every value here is rebuilt from scratch on each backend push; nothing is
//! persisted and nothing holds a reference back into the raw response.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account flavour, resolved once from the raw discriminator.
///
/// `Unknown` keeps the raw value so an unexpected backend code is visible
/// instead of silently becoming one of the known kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Numbered,
    GbBased,
    Unknown(String),
}

impl AccountKind {
    /// Map one discriminator value. `None` means "not a value we know".
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "N" | "n" | "numbered" | "numberAccount" => Some(AccountKind::Numbered),
            "G" | "g" | "gb_based" | "gbbasedAccount" => Some(AccountKind::GbBased),
            _ => None,
        }
    }

    /// Label shown on account cards.
    pub fn display_name(&self) -> &'static str {
        match self {
            AccountKind::Numbered => "Numbered Account",
            AccountKind::GbBased => "GB Based Account",
            AccountKind::Unknown(_) => "Account",
        }
    }

    /// Two-letter prefix of the masked account number.
    pub fn number_prefix(&self) -> Option<&'static str> {
        match self {
            AccountKind::Numbered => Some("CH"),
            AccountKind::GbBased => Some("GB"),
            AccountKind::Unknown(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Frozen,
}

/// Small label/value series drawn on an account card.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<Decimal>,
}

/// One currency held by an account, as listed on the account card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountCurrency {
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub balance: Decimal,
    pub exchange_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub account_number: String,
    pub kind: AccountKind,
    pub balance: Decimal,
    /// Primary currency code.
    pub currency: String,
    pub available_currencies: Vec<AccountCurrency>,
    pub chart: ChartData,
    pub last_updated: Option<DateTime<Utc>>,
    pub status: AccountStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyInfo {
    pub code: String,
    pub name: String,
    pub symbol: String,
    /// Minor units shown after the decimal point.
    pub decimals: u32,
}

/// Balance of one account in one currency.
///
/// `account_id` is a plain foreign key. `available <= balance` is expected
/// but never checked; backend values pass through as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyBalance {
    pub id: String,
    pub account_id: String,
    pub currency: CurrencyInfo,
    pub balance: Decimal,
    pub available: Decimal,
    pub pending: Decimal,
}

/// Serialised as `Funds` / `Transfer` / `Exchange`, the same labels the CSV
/// export writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Funds,
    Transfer,
    Exchange,
    Unknown(String),
}

impl TransactionKind {
    /// Free-text classification on `type_txt`. Order matters: a text that
    /// mentions both "deposit" and "transfer" is Funds.
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.to_lowercase();
        if text.contains("deposit") || text.contains("fund") {
            Some(TransactionKind::Funds)
        } else if text.contains("transfer") || text.contains("withdrawal") {
            Some(TransactionKind::Transfer)
        } else if text.contains("exchange") || text.contains("conversion") {
            Some(TransactionKind::Exchange)
        } else {
            None
        }
    }

    /// Single-character backend code.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "C" | "D" => TransactionKind::Funds,
            "W" | "T" => TransactionKind::Transfer,
            "E" => TransactionKind::Exchange,
            _ => TransactionKind::Unknown(code.to_string()),
        }
    }

    /// Display-sign convention: funds in are positive, outgoing transfers
    /// negative. Not a ledger rule.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Funds => amount.abs(),
            TransactionKind::Transfer if amount > Decimal::ZERO => -amount,
            _ => amount,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TransactionKind::Funds => "Funds",
            TransactionKind::Transfer => "Transfer",
            TransactionKind::Exchange => "Exchange",
            TransactionKind::Unknown(code) => code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

impl TransactionStatus {
    /// Substring match on the backend's free-text status.
    pub fn from_text(text: &str) -> Self {
        let text = text.to_lowercase();
        if ["complete", "success", "settled"].iter().any(|s| text.contains(s)) {
            TransactionStatus::Completed
        } else if ["fail", "error", "reject"].iter().any(|s| text.contains(s)) {
            TransactionStatus::Failed
        } else {
            TransactionStatus::Pending
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
        }
    }
}

/// Counterparty summary embedded in a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeneficiarySummary {
    pub name: String,
    pub account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: String,
    /// Empty when the backend did not link the transaction to an account.
    pub account_id: String,
    pub date: Option<DateTime<Utc>>,
    pub description: String,
    /// Signed per [`TransactionKind::signed`].
    pub amount: Decimal,
    pub currency: String,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub reference: Option<String>,
    pub beneficiary: Option<BeneficiarySummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleBeneficiary {
    pub id: String,
    pub name: String,
    pub bank_name: String,
    pub account_number: String,
    pub iban: String,
    pub swift_code: String,
    pub address: Option<Address>,
}

/// Bank coordinates as they appear on the beneficiary form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BankDetails {
    pub name: String,
    pub account_number: String,
    pub swift_code: String,
    pub iban: String,
    pub bic: String,
    pub sort_branch_code: String,
    pub address: Address,
}

/// Full beneficiary record, shaped like the edit form, plus timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBeneficiary {
    pub id: String,
    pub currency_id: String,
    pub email: String,
    pub firstname: String,
    pub middlename: Option<String>,
    pub lastname: String,
    pub account_holder: String,
    pub personal_address: Address,
    pub bank: BankDetails,
    pub intermediate_bank: BankDetails,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Country {
    pub id: String,
    pub name: String,
    pub iso: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: Country,
    pub zipcode: String,
}

/// The signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub date_of_birth: Option<String>,
    pub phone_number: Option<String>,
    pub username: Option<String>,
    pub member_key: Option<String>,
    pub personal_address: Option<IdentityAddress>,
}

/// A deposit / withdrawal rail offered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethod {
    pub id: String,
    pub code: String,
    pub name: String,
    pub type_char: String,
    pub account_type: String,
    pub is_active: bool,
    pub is_local: bool,
    pub is_international: bool,
    pub currency_id: String,
}
