//! CSV export of adapted transactions.

use crate::currency;
use crate::errors::Result;
use crate::models::Transaction;
use csv::WriterBuilder;
use std::io::Write;

const HEADER: [&str; 9] = [
    "id",
    "account_id",
    "date",
    "description",
    "amount",
    "currency",
    "display",
    "kind",
    "status",
];

/// Write one row per transaction. Amounts are rounded to the currency's
/// minor unit and also given in display form (`-€12.50`); missing dates are
/// left blank.
pub fn write_transactions<W: Write>(transactions: &[Transaction], sink: W) -> Result<usize> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(sink);
    wtr.write_record(HEADER)?;

    for tx in transactions {
        let dp = currency::decimals(&tx.currency);
        wtr.write_record([
            tx.id.clone(),
            tx.account_id.clone(),
            tx.date.map(|d| d.to_rfc3339()).unwrap_or_default(),
            tx.description.clone(),
            format!("{:.*}", dp as usize, tx.amount.round_dp(dp)),
            tx.currency.clone(),
            currency::format_amount(tx.amount, &tx.currency),
            tx.kind.label().to_string(),
            tx.status.label().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(transactions.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TransactionKind, TransactionStatus};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn tx(id: &str, amount: rust_decimal::Decimal, currency: &str) -> Transaction {
        Transaction {
            id: id.into(),
            account_id: "acc-1".into(),
            date: None,
            description: "Deposit, March".into(),
            amount,
            currency: currency.into(),
            kind: TransactionKind::Funds,
            status: TransactionStatus::Completed,
            reference: None,
            beneficiary: None,
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let mut with_date = tx("t1", dec!(12.5), "EUR");
        with_date.date = Some(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap());
        let rows = vec![with_date, tx("t2", dec!(1500.4), "JPY")];

        let mut out = Vec::new();
        assert_eq!(write_transactions(&rows, &mut out).unwrap(), 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "id,account_id,date,description,amount,currency,display,kind,status"
        );
        assert_eq!(
            lines[1],
            "t1,acc-1,2024-03-01T09:30:00+00:00,\"Deposit, March\",12.50,EUR,€12.50,Funds,completed"
        );
        assert_eq!(
            lines[2],
            "t2,acc-1,,\"Deposit, March\",1500,JPY,\"¥1,500\",Funds,completed"
        );
    }

    #[test]
    fn empty_input_writes_only_header() {
        let mut out = Vec::new();
        assert_eq!(write_transactions(&[], &mut out).unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
