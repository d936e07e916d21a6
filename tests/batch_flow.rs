//! Integration tests for the two-phase approve + batch transfer flow

mod common;

use common::*;
use rust_decimal_macros::dec;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tron_payroll_sdk::abi::{self, APPROVE, BATCH_TRANSFER};
use tron_payroll_sdk::address::parse_address;
use tron_payroll_sdk::payments::PaymentRecord;
use tron_payroll_sdk::transaction::{BatchState, BatchTransfer, ChainContext};
use tron_payroll_sdk::types::{TransactionIntent, TransactionOutcome};
use tron_payroll_sdk::Error;

fn payroll() -> TransactionIntent {
    TransactionIntent::batch(
        4,
        vec!["0xAA".into(), "0xBB".into()],
        vec![1_500_000, 2_250_000],
    )
}

#[tokio::test]
async fn test_batch_success_records_once() {
    let status = Arc::new(
        ScriptedStatus::default()
            .with("tx1", vec![TransactionOutcome::Pending, TransactionOutcome::Success])
            .with("tx2", vec![TransactionOutcome::Success]),
    );
    let flow = BatchTransfer::new(settings(), driver(status.clone()));
    let node = FakeNode::default();
    let wallet = FakeWallet::connected();
    let recorder = MemoryRecorder::default();
    let ctx = ChainContext {
        wallet: Some(&wallet),
        submitter: &node,
        recorder: &recorder,
    };

    let tx_id = flow.execute(&ctx, &payroll()).await.unwrap();

    assert_eq!(tx_id.as_deref(), Some("tx2"));
    assert_eq!(node.selectors(), vec![APPROVE, BATCH_TRANSFER]);
    assert_eq!(wallet.signed.load(Ordering::SeqCst), 2);
    assert_eq!(status.calls_for("tx1"), 2);
    assert_eq!(status.calls_for("tx2"), 1);

    let builds = node.builds.lock().unwrap().clone();
    let s = settings();
    // Approval goes to the token with the batch contract as spender
    assert_eq!(builds[0].0, s.token);
    assert_eq!(builds[0].1, abi::approve_call(&s.batch_contract, 3_750_000));
    assert_eq!(builds[1].0, s.batch_contract);
    let recipients = vec![parse_address("0xAA").unwrap(), parse_address("0xBB").unwrap()];
    assert_eq!(
        builds[1].1,
        abi::batch_transfer_call(&recipients, &[1_500_000, 2_250_000])
    );

    let records = recorder.records.lock().unwrap().clone();
    assert_eq!(
        records,
        vec![PaymentRecord::Batch {
            group_id: 4,
            transaction_hash: "tx2".into(),
            recipients_count: 2,
            total_amount: dec!(3.75),
        }]
    );
    assert_eq!(flow.state(), BatchState::Idle);
}

#[tokio::test]
async fn test_reverted_approval_stops_before_batch() {
    let status = Arc::new(ScriptedStatus::default().with(
        "tx1",
        vec![TransactionOutcome::Reverted {
            reason: "Insufficient balance".into(),
        }],
    ));
    let flow = BatchTransfer::new(settings(), driver(status.clone()));
    let node = FakeNode::default();
    let wallet = FakeWallet::connected();
    let recorder = MemoryRecorder::default();
    let ctx = ChainContext {
        wallet: Some(&wallet),
        submitter: &node,
        recorder: &recorder,
    };

    let err = flow.execute(&ctx, &payroll()).await.unwrap_err();

    match &err {
        Error::Reverted { tx_id, reason } => {
            assert_eq!(tx_id, "tx1");
            assert_eq!(reason, "Insufficient balance");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(node.selectors(), vec![APPROVE]);
    assert_eq!(wallet.signed.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.count(), 0);
    assert_eq!(flow.state(), BatchState::Idle);
}

#[tokio::test]
async fn test_unconfirmed_approval_reports_not_found() {
    let status = Arc::new(ScriptedStatus::default());
    let flow = BatchTransfer::new(settings(), driver(status.clone()));
    let node = FakeNode::default();
    let wallet = FakeWallet::connected();
    let recorder = MemoryRecorder::default();
    let ctx = ChainContext {
        wallet: Some(&wallet),
        submitter: &node,
        recorder: &recorder,
    };

    let err = flow.execute(&ctx, &payroll()).await.unwrap_err();

    assert_eq!(err.to_string(), "transaction not found");
    assert_eq!(status.calls_for("tx1"), 10);
    assert_eq!(node.build_count(), 1);
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn test_failed_batch_after_approval() {
    let status = Arc::new(
        ScriptedStatus::default()
            .with("tx1", vec![TransactionOutcome::Success])
            .with(
                "tx2",
                vec![TransactionOutcome::Error {
                    message: "unknown status: OUT_OF_ENERGY".into(),
                }],
            ),
    );
    let flow = BatchTransfer::new(settings(), driver(status));
    let node = FakeNode::default();
    let wallet = FakeWallet::connected();
    let recorder = MemoryRecorder::default();
    let ctx = ChainContext {
        wallet: Some(&wallet),
        submitter: &node,
        recorder: &recorder,
    };

    let err = flow.execute(&ctx, &payroll()).await.unwrap_err();

    assert!(matches!(err, Error::Transaction(_)));
    assert_eq!(node.selectors(), vec![APPROVE, BATCH_TRANSFER]);
    assert_eq!(recorder.count(), 0);
    assert_eq!(flow.state(), BatchState::Idle);
}

#[tokio::test]
async fn test_batch_without_wallet_is_a_noop() {
    let flow = BatchTransfer::new(settings(), driver(Arc::new(ScriptedStatus::default())));
    let node = FakeNode::default();
    let recorder = MemoryRecorder::default();
    let ctx = ChainContext {
        wallet: None,
        submitter: &node,
        recorder: &recorder,
    };

    let result = tokio_test::assert_ok!(flow.execute(&ctx, &payroll()).await);
    assert_eq!(result, None);
    assert_eq!(node.build_count(), 0);
}

#[tokio::test]
async fn test_invalid_recipient_resets_state() {
    let flow = BatchTransfer::new(settings(), driver(Arc::new(ScriptedStatus::default())));
    let node = FakeNode::default();
    let wallet = FakeWallet::connected();
    let recorder = MemoryRecorder::default();
    let ctx = ChainContext {
        wallet: Some(&wallet),
        submitter: &node,
        recorder: &recorder,
    };
    let intent = TransactionIntent::batch(4, vec!["not-an-address".into()], vec![1]);

    let err = flow.execute(&ctx, &intent).await.unwrap_err();
    assert!(matches!(err, Error::Address(_)));
    assert_eq!(node.build_count(), 0);
    assert_eq!(flow.state(), BatchState::Idle);
}

#[tokio::test]
async fn test_unrecordable_total_fails_before_approval() {
    // Each amount fits a decimal but the 18-decimal total does not
    let each = 50_000_000_000_000_000_000_000_000_000u128;
    let status = Arc::new(
        ScriptedStatus::default()
            .with("tx1", vec![TransactionOutcome::Success])
            .with("tx2", vec![TransactionOutcome::Success]),
    );
    let mut wei = settings();
    wei.decimals = 18;
    let flow = BatchTransfer::new(wei, driver(status.clone()));
    let node = FakeNode::default();
    let wallet = FakeWallet::connected();
    let recorder = MemoryRecorder::default();
    let ctx = ChainContext {
        wallet: Some(&wallet),
        submitter: &node,
        recorder: &recorder,
    };
    let intent = TransactionIntent::batch(4, vec!["0xAA".into(), "0xBB".into()], vec![each, each]);

    let err = flow.execute(&ctx, &intent).await.unwrap_err();

    assert!(matches!(err, Error::Amount(_)));
    assert_eq!(node.build_count(), 0);
    assert_eq!(node.broadcasts.load(Ordering::SeqCst), 0);
    assert_eq!(status.calls.lock().unwrap().len(), 0);
    assert_eq!(flow.state(), BatchState::Idle);
}
