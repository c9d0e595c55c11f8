use std::sync::Arc;

use chrono::{TimeZone, Utc};

use super::*;
use crate::accounts::{AccountResolver, LedgerAccount};
use crate::errors::Error;
use crate::ledger::{LedgerResponse, MockLedgerClient};
use crate::transactions::{Direction, TransactionRecord};

fn record(amount: i64) -> TransactionRecord {
    TransactionRecord {
        account_id: "black-1".to_string(),
        external_transaction_id: "tx-1".to_string(),
        amount_minor_units: amount,
        occurred_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        currency_code: 980,
        merchant_category_code: 5812,
        description: "Lunch".to_string(),
        comment: "team".to_string(),
        counterparty_iban: "UA0000".to_string(),
        counterparty_name: "Cafe".to_string(),
    }
}

fn setup(options: SubmitterOptions) -> (MockLedgerClient, TransactionSubmitter) {
    let ledger = MockLedgerClient::new(vec![
        LedgerAccount::new("1", "Cash", ""),
        LedgerAccount::new("2", "Mono black", "fbs.mono:black-1"),
    ]);
    let client: Arc<dyn crate::ledger::LedgerClient> = Arc::new(ledger.clone());
    let resolver = Arc::new(AccountResolver::new(client.clone()));
    (ledger, TransactionSubmitter::new(client, resolver, options))
}

#[tokio::test]
async fn test_zero_amount_is_rejected_without_network() {
    let (ledger, submitter) = setup(SubmitterOptions::default());
    let err = submitter.submit(&record(0)).await.unwrap_err();
    assert!(matches!(err, Error::ZeroAmountRejected { ref transaction_id } if transaction_id == "tx-1"));
    assert_eq!(ledger.list_calls(), 0);
    assert_eq!(ledger.store_calls(), 0);
}

#[tokio::test]
async fn test_negative_amount_submits_withdrawal() {
    let (ledger, submitter) = setup(SubmitterOptions::default());
    submitter.submit(&record(-12345)).await.unwrap();

    let stored = ledger.stored();
    assert_eq!(stored.len(), 1);
    let split = &stored[0].transactions[0];
    assert_eq!(split.transaction_type, Direction::Withdrawal);
    assert_eq!(split.amount, "123.45");
    assert_eq!(split.source_id.as_deref(), Some("2"));
    assert_eq!(split.source_name.as_deref(), Some("Mono black"));
    assert!(split.destination_id.is_none());
}

#[tokio::test]
async fn test_positive_amount_submits_deposit() {
    let (ledger, submitter) = setup(SubmitterOptions::default());
    submitter.submit(&record(67800)).await.unwrap();

    let split = &ledger.stored()[0].transactions[0];
    assert_eq!(split.transaction_type, Direction::Deposit);
    assert_eq!(split.amount, "678.00");
    assert_eq!(split.destination_id.as_deref(), Some("2"));
    assert_eq!(split.destination_name.as_deref(), Some("Mono black"));
    assert!(split.source_id.is_none());
}

#[tokio::test]
async fn test_notes_contain_every_field_verbatim() {
    let (ledger, submitter) = setup(SubmitterOptions::default());
    let r = record(-100);
    submitter.submit(&r).await.unwrap();

    let notes = ledger.stored()[0].transactions[0].notes.clone();
    for value in [
        "5812",
        r.comment.as_str(),
        r.description.as_str(),
        r.counterparty_iban.as_str(),
        r.counterparty_name.as_str(),
        "UAH",
    ] {
        assert!(notes.contains(value), "notes missing {value}: {notes}");
    }
    let mcc = notes.find("MCC:").unwrap();
    let comment = notes.find("Comment:").unwrap();
    let currency = notes.find("Currency code:").unwrap();
    assert!(mcc < comment && comment < currency);
}

#[tokio::test]
async fn test_missing_mapping_never_submits() {
    let (ledger, submitter) = setup(SubmitterOptions::default());
    let mut r = record(-100);
    r.account_id = "unmapped".to_string();

    let err = submitter.submit(&r).await.unwrap_err();
    assert!(matches!(err, Error::AccountMappingNotFound(_)));
    assert_eq!(ledger.store_calls(), 0);
}

#[tokio::test]
async fn test_ledger_unavailable_aborts_submission() {
    let (ledger, submitter) = setup(SubmitterOptions::default());
    ledger.fail_accounts(Some("timeout"));

    let err = submitter.submit(&record(-100)).await.unwrap_err();
    assert!(matches!(err, Error::LedgerApiUnavailable(_)));
    assert_eq!(ledger.store_calls(), 0);
}

#[tokio::test]
async fn test_tolerated_status_counts_as_success() {
    let (ledger, submitter) = setup(SubmitterOptions::default());
    ledger.push_response(LedgerResponse::new(422, "{\"message\":\"duplicate\"}"));
    assert!(submitter.submit(&record(-100)).await.is_ok());
    assert_eq!(ledger.store_calls(), 1);

    // Any other 4xx still fails and keeps the body.
    ledger.push_response(LedgerResponse::new(400, "{\"message\":\"invalid\"}"));
    assert!(matches!(
        submitter.submit(&record(-100)).await,
        Err(Error::SubmissionFailed { status: 400, ref body }) if body.contains("invalid")
    ));
}

#[tokio::test]
async fn test_other_statuses_fail_with_status_and_body() {
    let (ledger, submitter) = setup(SubmitterOptions::default());
    ledger.push_response(LedgerResponse::new(500, "server error"));

    match submitter.submit(&record(-100)).await {
        Err(Error::SubmissionFailed { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "server error");
        }
        other => panic!("expected submission failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_tolerance_can_be_disabled() {
    let (ledger, submitter) = setup(SubmitterOptions {
        tolerated_status: None,
        ..SubmitterOptions::default()
    });
    ledger.push_response(LedgerResponse::new(422, ""));
    assert!(matches!(
        submitter.submit(&record(-100)).await,
        Err(Error::SubmissionFailed { status: 422, .. })
    ));
}

#[tokio::test]
async fn test_each_submission_builds_a_fresh_payload() {
    let (ledger, submitter) = setup(SubmitterOptions {
        error_if_duplicate_hash: true,
        ..SubmitterOptions::default()
    });
    submitter.submit(&record(-100)).await.unwrap();
    submitter.submit(&record(200)).await.unwrap();

    let stored = ledger.stored();
    assert_eq!(stored.len(), 2);
    assert!(stored[0].error_if_duplicate_hash);
    assert_eq!(stored[0].transactions[0].amount, "1.00");
    assert_eq!(stored[1].transactions[0].amount, "2.00");
    assert_eq!(ledger.list_calls(), 2);
}
