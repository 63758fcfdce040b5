//! Mutations: documents, typed variables and the calls that send them.
//!
//! Every call returns the backend's [`MutationOutcome`]; only transport
//! problems are `Err`.

use crate::client::{GraphqlTransport, MutationOutcome, mutate};
use crate::errors::ClientError;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

macro_rules! envelope {
    () => {
        " { result error } }"
    };
}

pub const CREATE_NPA_IDENTITY: &str = concat!(
    "mutation($email: String!, $first_name: String!, $middle_name: String, ",
    "$last_name: String!, $date_of_birth: String!, $phone_number: String!, ",
    "$address_detail: String, $address_detail2: String, $address_city: String, ",
    "$address_zipcode: String, $address_countystate: String, $country_code: String!, ",
    "$nationality: String, $is_crypto_use: Boolean, $countries_send_funds_to: [String], ",
    "$average_monthly_outgoing: String!, $is_political_exposed_person: Boolean!, ",
    "$political_exposed_person_case: String) { ",
    "create_npa_identity(email: $email, first_name: $first_name, ",
    "middle_name: $middle_name, last_name: $last_name, date_of_birth: $date_of_birth, ",
    "phone_number: $phone_number, address_detail: $address_detail, ",
    "address_detail2: $address_detail2, address_city: $address_city, ",
    "address_zipcode: $address_zipcode, address_countystate: $address_countystate, ",
    "country_code: $country_code, nationality: $nationality, ",
    "is_crypto_use: $is_crypto_use, countries_send_funds_to: $countries_send_funds_to, ",
    "average_monthly_outgoing: $average_monthly_outgoing, ",
    "is_political_exposed_person: $is_political_exposed_person, ",
    "political_exposed_person_case: $political_exposed_person_case)",
    envelope!()
);

pub const CREATE_IDENTITY_BANK_ACCOUNT: &str = concat!(
    "mutation($account_type: String!) { ",
    "create_npa_identity_bank_account(account_type: $account_type)",
    envelope!()
);

pub const CREATE_DEPOSIT: &str = concat!(
    "mutation($bankaccount_id: String!, $transactionmethod_id: String!, $amount: Float!) { ",
    "create_deposit(bankaccount_id: $bankaccount_id, ",
    "transactionmethod_id: $transactionmethod_id, amount: $amount)",
    envelope!()
);

pub const CREATE_EXTERNAL_TRANSFER: &str = concat!(
    "mutation($bankaccount_id: String!, $beneficiary_id: String!, ",
    "$transactioncurrency_id: String!, $amount: Float!) { ",
    "create_external_transfer(bankaccount_id: $bankaccount_id, ",
    "beneficiary_id: $beneficiary_id, transactioncurrency_id: $transactioncurrency_id, ",
    "amount: $amount)",
    envelope!()
);

pub const CREATE_INTERNAL_TRANSFER: &str = concat!(
    "mutation($bankaccount_id: String!, $receiver_identity_id: String!, ",
    "$transactioncurrency_id: String!, $amount: Float!) { ",
    "create_internal_transfer(bankaccount_id: $bankaccount_id, ",
    "receiver_identity_id: $receiver_identity_id, ",
    "transactioncurrency_id: $transactioncurrency_id, amount: $amount)",
    envelope!()
);

macro_rules! beneficiary_params {
    () => {
        concat!(
            "$transactioncurrency_id: String!, $email: String!, $firstname: String!, ",
            "$middlename: String, $lastname: String!, ",
            "$personal_address_line1: String!, $personal_address_line2: String, ",
            "$personal_address_countrycode: String!, $personal_address_city: String!, ",
            "$personal_address_state: String, $personal_address_zipcode: String!, ",
            "$beneficiary_bank_name: String, $beneficiary_bank_accountnumber: String, ",
            "$beneficiary_bank_swiftcode: String, $beneficiary_bank_iban: String, ",
            "$beneficiary_bank_bic: String, $beneficiary_bank_sortbranchcode: String, ",
            "$beneficiary_bank_address_line1: String!, $beneficiary_bank_address_line2: String, ",
            "$beneficiary_bank_address_countrycode: String!, ",
            "$beneficiary_bank_address_city: String!, $beneficiary_bank_address_state: String, ",
            "$beneficiary_bank_address_zipcode: String!, ",
            "$intermediate_bank_name: String, $intermediate_bank_swiftcode: String, ",
            "$intermediate_bank_address_line1: String, $intermediate_bank_address_line2: String, ",
            "$intermediate_bank_address_countrycode: String, ",
            "$intermediate_bank_address_city: String, $intermediate_bank_address_state: String, ",
            "$intermediate_bank_address_zipcode: String"
        )
    };
}

macro_rules! beneficiary_args {
    () => {
        concat!(
            "transactioncurrency_id: $transactioncurrency_id, email: $email, ",
            "firstname: $firstname, middlename: $middlename, lastname: $lastname, ",
            "personal_address_line1: $personal_address_line1, ",
            "personal_address_line2: $personal_address_line2, ",
            "personal_address_countrycode: $personal_address_countrycode, ",
            "personal_address_city: $personal_address_city, ",
            "personal_address_state: $personal_address_state, ",
            "personal_address_zipcode: $personal_address_zipcode, ",
            "beneficiary_bank_name: $beneficiary_bank_name, ",
            "beneficiary_bank_accountnumber: $beneficiary_bank_accountnumber, ",
            "beneficiary_bank_swiftcode: $beneficiary_bank_swiftcode, ",
            "beneficiary_bank_iban: $beneficiary_bank_iban, ",
            "beneficiary_bank_bic: $beneficiary_bank_bic, ",
            "beneficiary_bank_sortbranchcode: $beneficiary_bank_sortbranchcode, ",
            "beneficiary_bank_address_line1: $beneficiary_bank_address_line1, ",
            "beneficiary_bank_address_line2: $beneficiary_bank_address_line2, ",
            "beneficiary_bank_address_countrycode: $beneficiary_bank_address_countrycode, ",
            "beneficiary_bank_address_city: $beneficiary_bank_address_city, ",
            "beneficiary_bank_address_state: $beneficiary_bank_address_state, ",
            "beneficiary_bank_address_zipcode: $beneficiary_bank_address_zipcode, ",
            "intermediate_bank_name: $intermediate_bank_name, ",
            "intermediate_bank_swiftcode: $intermediate_bank_swiftcode, ",
            "intermediate_bank_address_line1: $intermediate_bank_address_line1, ",
            "intermediate_bank_address_line2: $intermediate_bank_address_line2, ",
            "intermediate_bank_address_countrycode: $intermediate_bank_address_countrycode, ",
            "intermediate_bank_address_city: $intermediate_bank_address_city, ",
            "intermediate_bank_address_state: $intermediate_bank_address_state, ",
            "intermediate_bank_address_zipcode: $intermediate_bank_address_zipcode"
        )
    };
}

pub const CREATE_BENEFICIARY: &str = concat!(
    "mutation CreateNpaBeneficiary(",
    beneficiary_params!(),
    ") { create_npa_beneficiary(",
    beneficiary_args!(),
    ")",
    envelope!()
);

pub const UPDATE_BENEFICIARY: &str = concat!(
    "mutation UpdateNpaBeneficiary($id: String!, ",
    beneficiary_params!(),
    ") { update_npa_beneficiary(id: $id, ",
    beneficiary_args!(),
    ")",
    envelope!()
);

pub const DELETE_BENEFICIARY: &str = concat!(
    "mutation DeleteNpaBeneficiary($id: String!) { delete_npa_beneficiary(id: $id)",
    envelope!()
);

pub const CREATE_BENEFICIARY_ADDRESS: &str = concat!(
    "mutation($beneficiary_id: String!, $personal_address_line1: String!, ",
    "$personal_address_line2: String, $personal_address_countrycode: String!, ",
    "$personal_address_city: String!, $personal_address_state: String, ",
    "$personal_address_zipcode: String!) { ",
    "create_npa_beneficiary_address(beneficiary_id: $beneficiary_id, ",
    "personal_address_line1: $personal_address_line1, ",
    "personal_address_line2: $personal_address_line2, ",
    "personal_address_countrycode: $personal_address_countrycode, ",
    "personal_address_city: $personal_address_city, ",
    "personal_address_state: $personal_address_state, ",
    "personal_address_zipcode: $personal_address_zipcode)",
    envelope!()
);

pub const CREATE_FX_CONVERSION: &str = concat!(
    "mutation($source_currency_id: String!, $destination_currency_id: String!, ",
    "$source_amount: Float!) { ",
    "create_fx_conversion(source_currency_id: $source_currency_id, ",
    "destination_currency_id: $destination_currency_id, source_amount: $source_amount)",
    envelope!()
);

pub const ACCEPT_OR_CANCEL_FX_CONVERSION: &str = concat!(
    "mutation($action: String!, $banktransaction_id: String!) { ",
    "accept_or_cancel_fx_conversion(action: $action, banktransaction_id: $banktransaction_id)",
    envelope!()
);

pub const REFRESH_IDENTITY_DATA: &str = concat!("mutation { refresh_identity_data", envelope!());

pub const MARK_DEPOSIT_AS_PAID: &str = concat!(
    "mutation($banktransaction_id: String!) { ",
    "mark_deposit_as_paid(banktransaction_id: $banktransaction_id)",
    envelope!()
);

pub const VERIFY_EMAIL: &str = concat!(
    "mutation($email: String!, $otp: String) { verify_email(email: $email, otp: $otp)",
    envelope!()
);

pub const CLAIM_IDENTITY: &str = concat!(
    "mutation($identity_id: String!) { claim_npa_identity(identity_id: $identity_id)",
    envelope!()
);

pub const CREATE_EBOARDING_SESSION: &str =
    concat!("mutation { create_npa_eboarding_session", envelope!());

// ------------------------------------------------------------- variables

/// Onboarding data for a new banking identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateIdentityRequest {
    pub email: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    /// `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub phone_number: String,
    pub address_detail: Option<String>,
    pub address_detail2: Option<String>,
    pub address_city: Option<String>,
    pub address_zipcode: Option<String>,
    pub address_countystate: Option<String>,
    pub country_code: String,
    pub nationality: Option<String>,
    pub is_crypto_use: Option<bool>,
    pub countries_send_funds_to: Vec<String>,
    pub average_monthly_outgoing: String,
    pub is_political_exposed_person: bool,
    /// Only meaningful when `is_political_exposed_person` is set.
    pub political_exposed_person_case: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositRequest {
    pub bankaccount_id: String,
    pub transactionmethod_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExternalTransferRequest {
    pub bankaccount_id: String,
    pub beneficiary_id: String,
    pub transactioncurrency_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct InternalTransferRequest {
    pub bankaccount_id: String,
    pub receiver_identity_id: String,
    pub transactioncurrency_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct FxConversionRequest {
    pub source_currency_id: String,
    pub destination_currency_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub source_amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FxDecision {
    Accept,
    Cancel,
}

#[derive(Debug, Clone, Serialize)]
pub struct BeneficiaryAddressRequest {
    pub beneficiary_id: String,
    pub personal_address_line1: String,
    pub personal_address_line2: Option<String>,
    pub personal_address_countrycode: String,
    pub personal_address_city: String,
    pub personal_address_state: Option<String>,
    pub personal_address_zipcode: String,
}

/// The beneficiary create/edit form. Optional fields serialise as `null`
/// when absent; run [`BeneficiaryForm::normalized`] to turn empty strings
/// into `None` before sending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BeneficiaryForm {
    pub transactioncurrency_id: String,
    pub email: String,
    pub firstname: String,
    pub middlename: Option<String>,
    pub lastname: String,
    pub personal_address_line1: String,
    pub personal_address_line2: Option<String>,
    pub personal_address_countrycode: String,
    pub personal_address_city: String,
    pub personal_address_state: Option<String>,
    pub personal_address_zipcode: String,
    pub beneficiary_bank_name: Option<String>,
    pub beneficiary_bank_accountnumber: Option<String>,
    pub beneficiary_bank_swiftcode: Option<String>,
    pub beneficiary_bank_iban: Option<String>,
    pub beneficiary_bank_bic: Option<String>,
    pub beneficiary_bank_sortbranchcode: Option<String>,
    pub beneficiary_bank_address_line1: String,
    pub beneficiary_bank_address_line2: Option<String>,
    pub beneficiary_bank_address_countrycode: String,
    pub beneficiary_bank_address_city: String,
    pub beneficiary_bank_address_state: Option<String>,
    pub beneficiary_bank_address_zipcode: String,
    pub intermediate_bank_name: Option<String>,
    pub intermediate_bank_swiftcode: Option<String>,
    pub intermediate_bank_address_line1: Option<String>,
    pub intermediate_bank_address_line2: Option<String>,
    pub intermediate_bank_address_countrycode: Option<String>,
    pub intermediate_bank_address_city: Option<String>,
    pub intermediate_bank_address_state: Option<String>,
    pub intermediate_bank_address_zipcode: Option<String>,
}

#[derive(Serialize)]
struct WithId<'a, T> {
    id: &'a str,
    #[serde(flatten)]
    inner: &'a T,
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"));
static IBAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}\d{2}[A-Z0-9]+$").expect("static regex"));
static SWIFT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{6}[A-Z0-9]{2,5}$").expect("static regex"));

fn blank_to_none(field: &mut Option<String>) {
    if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
        *field = None;
    }
}

/// `personal_address_city` -> `Personal Address City`.
fn field_label(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl BeneficiaryForm {
    /// Copy with every blank optional field set to `None`.
    pub fn normalized(&self) -> Self {
        let mut form = self.clone();
        for field in [
            &mut form.middlename,
            &mut form.personal_address_line2,
            &mut form.personal_address_state,
            &mut form.beneficiary_bank_name,
            &mut form.beneficiary_bank_accountnumber,
            &mut form.beneficiary_bank_swiftcode,
            &mut form.beneficiary_bank_iban,
            &mut form.beneficiary_bank_bic,
            &mut form.beneficiary_bank_sortbranchcode,
            &mut form.beneficiary_bank_address_line2,
            &mut form.beneficiary_bank_address_state,
            &mut form.intermediate_bank_name,
            &mut form.intermediate_bank_swiftcode,
            &mut form.intermediate_bank_address_line1,
            &mut form.intermediate_bank_address_line2,
            &mut form.intermediate_bank_address_countrycode,
            &mut form.intermediate_bank_address_city,
            &mut form.intermediate_bank_address_state,
            &mut form.intermediate_bank_address_zipcode,
        ] {
            blank_to_none(field);
        }
        form
    }

    /// Per-field problems, keyed by field name. Empty means valid.
    pub fn validate(&self) -> BTreeMap<&'static str, String> {
        let mut errors = BTreeMap::new();
        let required = [
            ("transactioncurrency_id", &self.transactioncurrency_id),
            ("email", &self.email),
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("personal_address_line1", &self.personal_address_line1),
            ("personal_address_countrycode", &self.personal_address_countrycode),
            ("personal_address_city", &self.personal_address_city),
            ("personal_address_zipcode", &self.personal_address_zipcode),
            ("beneficiary_bank_address_line1", &self.beneficiary_bank_address_line1),
            (
                "beneficiary_bank_address_countrycode",
                &self.beneficiary_bank_address_countrycode,
            ),
            ("beneficiary_bank_address_city", &self.beneficiary_bank_address_city),
            ("beneficiary_bank_address_zipcode", &self.beneficiary_bank_address_zipcode),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.insert(field, format!("{} is required", field_label(field)));
            }
        }

        if !self.email.is_empty() && !EMAIL_RE.is_match(&self.email) {
            errors.insert("email", "Invalid email format".to_string());
        }
        if let Some(iban) = self.beneficiary_bank_iban.as_deref().filter(|s| !s.is_empty()) {
            if !IBAN_RE.is_match(iban) {
                errors.insert("beneficiary_bank_iban", "Invalid IBAN format".to_string());
            }
        }
        if let Some(swift) = self
            .beneficiary_bank_swiftcode
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            if !SWIFT_RE.is_match(swift) {
                errors.insert(
                    "beneficiary_bank_swiftcode",
                    "Invalid SWIFT/BIC format".to_string(),
                );
            }
        }
        errors
    }
}

// ------------------------------------------------------------------ calls

pub async fn create_identity(
    transport: &dyn GraphqlTransport,
    req: &CreateIdentityRequest,
) -> Result<MutationOutcome, ClientError> {
    mutate(transport, CREATE_NPA_IDENTITY, "create_npa_identity", req).await
}

pub async fn create_identity_bank_account(
    transport: &dyn GraphqlTransport,
    account_type: &str,
) -> Result<MutationOutcome, ClientError> {
    #[derive(Serialize)]
    struct Vars<'a> {
        account_type: &'a str,
    }
    mutate(
        transport,
        CREATE_IDENTITY_BANK_ACCOUNT,
        "create_npa_identity_bank_account",
        &Vars { account_type },
    )
    .await
}

pub async fn create_deposit(
    transport: &dyn GraphqlTransport,
    req: &DepositRequest,
) -> Result<MutationOutcome, ClientError> {
    mutate(transport, CREATE_DEPOSIT, "create_deposit", req).await
}

pub async fn create_external_transfer(
    transport: &dyn GraphqlTransport,
    req: &ExternalTransferRequest,
) -> Result<MutationOutcome, ClientError> {
    mutate(transport, CREATE_EXTERNAL_TRANSFER, "create_external_transfer", req).await
}

pub async fn create_internal_transfer(
    transport: &dyn GraphqlTransport,
    req: &InternalTransferRequest,
) -> Result<MutationOutcome, ClientError> {
    mutate(transport, CREATE_INTERNAL_TRANSFER, "create_internal_transfer", req).await
}

/// Sends the normalised form.
pub async fn create_beneficiary(
    transport: &dyn GraphqlTransport,
    form: &BeneficiaryForm,
) -> Result<MutationOutcome, ClientError> {
    mutate(
        transport,
        CREATE_BENEFICIARY,
        "create_npa_beneficiary",
        &form.normalized(),
    )
    .await
}

pub async fn update_beneficiary(
    transport: &dyn GraphqlTransport,
    id: &str,
    form: &BeneficiaryForm,
) -> Result<MutationOutcome, ClientError> {
    let form = form.normalized();
    mutate(
        transport,
        UPDATE_BENEFICIARY,
        "update_npa_beneficiary",
        &WithId { id, inner: &form },
    )
    .await
}

pub async fn delete_beneficiary(
    transport: &dyn GraphqlTransport,
    id: &str,
) -> Result<MutationOutcome, ClientError> {
    #[derive(Serialize)]
    struct Vars<'a> {
        id: &'a str,
    }
    mutate(transport, DELETE_BENEFICIARY, "delete_npa_beneficiary", &Vars { id }).await
}

pub async fn create_beneficiary_address(
    transport: &dyn GraphqlTransport,
    req: &BeneficiaryAddressRequest,
) -> Result<MutationOutcome, ClientError> {
    mutate(
        transport,
        CREATE_BENEFICIARY_ADDRESS,
        "create_npa_beneficiary_address",
        req,
    )
    .await
}

pub async fn create_fx_conversion(
    transport: &dyn GraphqlTransport,
    req: &FxConversionRequest,
) -> Result<MutationOutcome, ClientError> {
    mutate(transport, CREATE_FX_CONVERSION, "create_fx_conversion", req).await
}

pub async fn accept_or_cancel_fx_conversion(
    transport: &dyn GraphqlTransport,
    action: FxDecision,
    banktransaction_id: &str,
) -> Result<MutationOutcome, ClientError> {
    #[derive(Serialize)]
    struct Vars<'a> {
        action: FxDecision,
        banktransaction_id: &'a str,
    }
    mutate(
        transport,
        ACCEPT_OR_CANCEL_FX_CONVERSION,
        "accept_or_cancel_fx_conversion",
        &Vars {
            action,
            banktransaction_id,
        },
    )
    .await
}

pub async fn refresh_identity_data(
    transport: &dyn GraphqlTransport,
) -> Result<MutationOutcome, ClientError> {
    mutate(
        transport,
        REFRESH_IDENTITY_DATA,
        "refresh_identity_data",
        &serde_json::json!({}),
    )
    .await
}

pub async fn mark_deposit_as_paid(
    transport: &dyn GraphqlTransport,
    banktransaction_id: &str,
) -> Result<MutationOutcome, ClientError> {
    #[derive(Serialize)]
    struct Vars<'a> {
        banktransaction_id: &'a str,
    }
    mutate(
        transport,
        MARK_DEPOSIT_AS_PAID,
        "mark_deposit_as_paid",
        &Vars { banktransaction_id },
    )
    .await
}

pub async fn verify_email(
    transport: &dyn GraphqlTransport,
    email: &str,
    otp: Option<&str>,
) -> Result<MutationOutcome, ClientError> {
    #[derive(Serialize)]
    struct Vars<'a> {
        email: &'a str,
        otp: Option<&'a str>,
    }
    mutate(transport, VERIFY_EMAIL, "verify_email", &Vars { email, otp }).await
}

pub async fn claim_identity(
    transport: &dyn GraphqlTransport,
    identity_id: &str,
) -> Result<MutationOutcome, ClientError> {
    #[derive(Serialize)]
    struct Vars<'a> {
        identity_id: &'a str,
    }
    mutate(transport, CLAIM_IDENTITY, "claim_npa_identity", &Vars { identity_id }).await
}

pub async fn create_eboarding_session(
    transport: &dyn GraphqlTransport,
) -> Result<MutationOutcome, ClientError> {
    mutate(
        transport,
        CREATE_EBOARDING_SESSION,
        "create_npa_eboarding_session",
        &serde_json::json!({}),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockTransport;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    fn valid_form() -> BeneficiaryForm {
        BeneficiaryForm {
            transactioncurrency_id: "cur-eur".into(),
            email: "jane@example.com".into(),
            firstname: "Jane".into(),
            lastname: "Doe".into(),
            personal_address_line1: "1 Main St".into(),
            personal_address_countrycode: "DE".into(),
            personal_address_city: "Berlin".into(),
            personal_address_zipcode: "10115".into(),
            beneficiary_bank_address_line1: "2 Bank St".into(),
            beneficiary_bank_address_countrycode: "DE".into(),
            beneficiary_bank_address_city: "Frankfurt".into(),
            beneficiary_bank_address_zipcode: "60311".into(),
            beneficiary_bank_iban: Some("DE89370400440532013000".into()),
            beneficiary_bank_swiftcode: Some("COBADEFFXXX".into()),
            middlename: Some(String::new()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_form_has_no_errors() {
        assert!(valid_form().validate().is_empty());
    }

    #[test]
    fn missing_and_malformed_fields_are_reported() {
        let mut form = valid_form();
        form.firstname.clear();
        form.personal_address_city = "  ".into();
        form.email = "not-an-email".into();
        form.beneficiary_bank_iban = Some("de89 3704".into());
        form.beneficiary_bank_swiftcode = Some("COBA".into());

        let errors = form.validate();
        assert_eq!(errors["firstname"], "Firstname is required");
        assert_eq!(errors["personal_address_city"], "Personal Address City is required");
        assert_eq!(errors["email"], "Invalid email format");
        assert_eq!(errors["beneficiary_bank_iban"], "Invalid IBAN format");
        assert_eq!(errors["beneficiary_bank_swiftcode"], "Invalid SWIFT/BIC format");
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn normalisation_nulls_blank_optionals() {
        let form = valid_form().normalized();
        assert_eq!(form.middlename, None);
        let vars = serde_json::to_value(&form).unwrap();
        assert_eq!(vars["middlename"], Value::Null);
        assert_eq!(vars["intermediate_bank_name"], Value::Null);
        assert_eq!(vars["beneficiary_bank_iban"], json!("DE89370400440532013000"));
    }

    #[tokio::test]
    async fn update_sends_id_alongside_form() {
        let transport = MockTransport::default();
        transport.respond(
            UPDATE_BENEFICIARY,
            json!({"update_npa_beneficiary": {"result": true, "error": null}}),
        );
        let outcome = update_beneficiary(&transport, "b-7", &valid_form()).await.unwrap();
        assert!(outcome.is_ok());
        let (_, vars) = transport.calls.lock()[0].clone();
        assert_eq!(vars["id"], json!("b-7"));
        assert_eq!(vars["firstname"], json!("Jane"));
        assert_eq!(vars["middlename"], Value::Null);
    }

    #[tokio::test]
    async fn transfer_rejection_surfaces_as_outcome() {
        let transport = MockTransport::default();
        transport.respond(
            CREATE_EXTERNAL_TRANSFER,
            json!({"create_external_transfer": {"result": null, "error": "limit exceeded"}}),
        );
        let req = ExternalTransferRequest {
            bankaccount_id: "a1".into(),
            beneficiary_id: "b1".into(),
            transactioncurrency_id: "c1".into(),
            amount: dec!(100.25),
        };
        let outcome = create_external_transfer(&transport, &req).await.unwrap();
        assert_eq!(outcome.error.as_deref(), Some("limit exceeded"));
        // Float! on the wire
        let (_, vars) = transport.calls.lock()[0].clone();
        assert_eq!(vars["amount"], json!(100.25));
    }

    #[tokio::test]
    async fn create_identity_sends_onboarding_fields() {
        let transport = MockTransport::default();
        transport.respond(
            CREATE_NPA_IDENTITY,
            json!({"create_npa_identity": {"result": "id-1", "error": null}}),
        );
        let req = CreateIdentityRequest {
            email: "jane@example.com".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            date_of_birth: "1990-04-01".into(),
            phone_number: "+4930123".into(),
            country_code: "DE".into(),
            countries_send_funds_to: vec!["FR".into(), "CH".into()],
            average_monthly_outgoing: "1000-5000".into(),
            is_political_exposed_person: false,
            ..Default::default()
        };

        let outcome = create_identity(&transport, &req).await.unwrap();
        assert!(outcome.is_ok());
        assert_eq!(outcome.result, Some(json!("id-1")));

        let (doc, vars) = transport.calls.lock()[0].clone();
        assert!(doc.contains("create_npa_identity(email: $email"));
        assert_eq!(vars["first_name"], json!("Jane"));
        assert_eq!(vars["middle_name"], Value::Null);
        assert_eq!(vars["countries_send_funds_to"], json!(["FR", "CH"]));
        assert_eq!(vars["is_political_exposed_person"], json!(false));
    }

    #[tokio::test]
    async fn fx_decision_serialises_lowercase() {
        let transport = MockTransport::default();
        transport.respond(
            ACCEPT_OR_CANCEL_FX_CONVERSION,
            json!({"accept_or_cancel_fx_conversion": {"result": "ok"}}),
        );
        accept_or_cancel_fx_conversion(&transport, FxDecision::Accept, "tx-9")
            .await
            .unwrap();
        let (_, vars) = transport.calls.lock()[0].clone();
        assert_eq!(vars, json!({"action": "accept", "banktransaction_id": "tx-9"}));
    }

    #[test]
    fn documents_embed_the_envelope() {
        for doc in [
            CREATE_NPA_IDENTITY,
            CREATE_BENEFICIARY,
            UPDATE_BENEFICIARY,
            DELETE_BENEFICIARY,
            CREATE_DEPOSIT,
        ] {
            assert!(doc.ends_with("{ result error } }"), "{doc}");
        }
        assert!(UPDATE_BENEFICIARY.contains("update_npa_beneficiary(id: $id, transactioncurrency_id"));
    }
}
