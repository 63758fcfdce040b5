//! GraphQL query documents. The field selections are what the backend is
//! expected to serve; a field it drops simply arrives as null.

macro_rules! country_fields {
    () => {
        "id name iso"
    };
}

macro_rules! v1_account_fields {
    () => {
        concat!(
            "id created_at user_name is_vooone member_key ",
            "details { id email phone iban ",
            "info_personal { firstname lastname date_of_birth nationality_country { ",
            country_fields!(),
            " } } ",
            "info_address { city state residence_country { ",
            country_fields!(),
            " } zipcode street building_number } }"
        )
    };
}

macro_rules! identity_fields {
    () => {
        concat!("id created_at v1_account { ", v1_account_fields!(), " }")
    };
}

macro_rules! currency_fields {
    () => {
        "id is_active currency_code currency_txt"
    };
}

macro_rules! bank_account_fields {
    () => {
        concat!(
            "id created_at type_char account_type transactioncurrency { ",
            currency_fields!(),
            " } balance available_balance"
        )
    };
}

macro_rules! beneficiary_fields {
    () => {
        concat!(
            "id created_at accountholder_txt accountnumber_txt routingnumber_txt ",
            "regular_bankname_txt regular_bankswiftcode_txt regular_bankaddress_line1 ",
            "regular_bankaddress_line2 regular_bankaddress_zipcode regular_bankaddress_city ",
            "regular_bankaddress_state regular_bankaddress_country ",
            "intermediate_bankname_txt intermediate_bankswiftcode_txt ",
            "intermediate_bankaddress_line1 intermediate_bankaddress_line2 ",
            "intermediate_bankaddress_zipcode intermediate_bankaddress_city ",
            "intermediate_bankaddress_state intermediate_bankaddress_country ",
            "beneficiary_bankname_txt beneficiary_bankaccountnumber_txt ",
            "beneficiary_bankswiftcode_txt beneficiary_bankiban_txt beneficiary_bankbic_txt ",
            "beneficiary_banksortbranchcode_txt beneficiary_bankaddress_line1 ",
            "beneficiary_bankaddress_line2 beneficiary_bankaddress_zipcode ",
            "beneficiary_bankaddress_city beneficiary_bankaddress_state ",
            "beneficiary_bankaddress_country ",
            "firstname_txt middlename_txt lastname_txt email_txt ",
            "addresses { id created_at address_line1 address_line2 address_country_code ",
            "address_city address_state address_zipcode is_current beneficiary_id }"
        )
    };
}

macro_rules! document_fields {
    () => {
        "id created_at file_name file_url mime_type identitybanktransaction_id"
    };
}

macro_rules! bank_transaction_fields {
    () => {
        concat!(
            "id created_at updated_at settled_at status_txt request_amount settle_amount ",
            "fee_amount reference_code type_char type_txt ",
            "identitybankaccount { ",
            bank_account_fields!(),
            " } transactioncurrency { ",
            currency_fields!(),
            " } beneficiary { ",
            beneficiary_fields!(),
            " } documents { ",
            document_fields!(),
            " }"
        )
    };
}

macro_rules! tx_method_fields {
    () => {
        concat!(
            "id is_active is_local is_intl type_char account_type method_code method_txt ",
            "transactioncurrency_id"
        )
    };
}

pub const IS_LOGGED_IN: &str = "{ is_logged_in }";

pub const NPA_IDENTITY: &str = concat!("{ npa_identity { ", identity_fields!(), " } }");

pub const NPA_IDENTITY_BANK_ACCOUNTS: &str =
    concat!("{ npa_identity_bankaccounts { ", bank_account_fields!(), " } }");

pub const NPA_IDENTITY_BANK_TRANSACTIONS: &str =
    concat!("{ npa_identity_banktransactions { ", bank_transaction_fields!(), " } }");

pub const NPA_TRANSACTION_CURRENCIES: &str =
    concat!("{ npa_transactioncurrencies { ", currency_fields!(), " } }");

pub const NPA_TRANSACTION_METHODS: &str =
    concat!("{ npa_transactionmethods { ", tx_method_fields!(), " } }");

pub const NPA_BENEFICIARIES: &str =
    concat!("{ npa_identity { beneficiaries { ", beneficiary_fields!(), " } } }");

pub const USER_SETTINGS: &str = "{ user_settings }";


#[cfg(test)]
mod tests {
    use super::*;

    fn balanced(doc: &str) -> bool {
        let mut depth = 0i32;
        for c in doc.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return false;
            }
        }
        depth == 0
    }

    #[test]
    fn documents_have_balanced_braces() {
        for doc in [
            IS_LOGGED_IN,
            NPA_IDENTITY,
            NPA_IDENTITY_BANK_ACCOUNTS,
            NPA_IDENTITY_BANK_TRANSACTIONS,
            NPA_TRANSACTION_CURRENCIES,
            NPA_TRANSACTION_METHODS,
            NPA_BENEFICIARIES,
            USER_SETTINGS,
        ] {
            assert!(balanced(doc), "unbalanced: {doc}");
        }
    }

    #[test]
    fn transactions_select_linkage_and_currency() {
        assert!(NPA_IDENTITY_BANK_TRANSACTIONS.contains("identitybankaccount { id created_at type_char"));
        assert!(NPA_IDENTITY_BANK_TRANSACTIONS.contains("transactioncurrency { id is_active"));
        assert!(NPA_BENEFICIARIES.starts_with("{ npa_identity { beneficiaries {"));
    }
}
