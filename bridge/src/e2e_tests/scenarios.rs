// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::harness::{poll_until, Phase, PollConfig};
use crate::dispatch::{BridgeDispatchService, DispatchConfig};
use crate::error::{BridgeError, ValidationError};
use crate::registry::RegistryEvent;
use crate::test_utils::{
    init_for_testing, simulated_setup, test_accounts, usdc_transaction, USDC_POLYGON,
};
use crate::transaction::BridgeTransaction;
use crate::types::RequestHash;
use ethers::types::{Address as EthAddress, U256};
use std::sync::Arc;

#[tokio::test]
async fn test_valid_usdc_transfer_estimates_positive_gas() {
    init_for_testing();
    let setup = simulated_setup().await;
    let tx = usdc_transaction("100", 137);

    let valid = setup.service.validate(&tx).unwrap();
    assert_eq!(valid.target_chain_id, 137);
    assert_eq!(valid.amount, U256::exp10(20));

    let estimate = setup.service.estimate_gas(&tx).await.unwrap();
    assert!(estimate.estimated > U256::zero());
    assert!(setup.service.validate_transaction(&tx).await);
}

#[tokio::test]
async fn test_zero_amount_is_invalid() {
    let setup = simulated_setup().await;
    let err = setup
        .service
        .validate(&usdc_transaction("0", 137))
        .unwrap_err();
    assert!(matches!(err, ValidationError::InvalidAmount(_)), "{err:?}");
}

#[tokio::test]
async fn test_unlisted_chain_is_unsupported() {
    let setup = simulated_setup().await;
    assert_eq!(
        setup
            .service
            .validate(&usdc_transaction("100", 999999))
            .unwrap_err(),
        ValidationError::UnsupportedChain(999999)
    );
}

#[tokio::test]
async fn test_validation_reports_first_failing_field() {
    let setup = simulated_setup().await;
    let everything_wrong = BridgeTransaction::new("0xnot-an-address", "-1", 999999);
    assert!(matches!(
        setup.service.validate(&everything_wrong),
        Err(ValidationError::InvalidAddress(_))
    ));
    let bad_amount_and_chain = BridgeTransaction::new(USDC_POLYGON, "abc", 999999);
    assert!(matches!(
        setup.service.validate(&bad_amount_and_chain),
        Err(ValidationError::InvalidAmount(_))
    ));
}

#[tokio::test]
async fn test_unauthorized_caller_cannot_submit() {
    let setup = simulated_setup().await;
    let outsider = BridgeDispatchService::new(
        setup.chain.connect(test_accounts().user),
        DispatchConfig::default(),
        setup.metrics.clone(),
    );
    let err = outsider
        .initiate_bridge_transaction(&usdc_transaction("100", 137))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BridgeError::SubmissionFailed("Not authorized AI agent".to_string())
    );
    assert!(!setup
        .chain
        .events()
        .await
        .iter()
        .any(|e| matches!(e, RegistryEvent::BridgeRequestInitiated { .. })));
}

#[tokio::test]
async fn test_duplicate_submission_in_same_block_window() {
    let setup = simulated_setup().await;
    let tx = usdc_transaction("100", 137);

    let first = setup.service.initiate_bridge_transaction(&tx).await;
    let second = setup.service.initiate_bridge_transaction(&tx).await;
    assert!(first.is_ok(), "{first:?}");
    assert_eq!(
        second.unwrap_err(),
        BridgeError::SubmissionFailed("Transaction already processed".to_string())
    );

    // A later block gets a different request hash
    setup.chain.advance_time(12).await;
    let third = setup.service.submit_bridge_transaction(&tx).await.unwrap();
    assert_ne!(third.submission_hash, first.unwrap());
}

#[tokio::test]
async fn test_deauthorized_agent_fails_after_passing_validation() {
    let setup = simulated_setup().await;
    let tx = usdc_transaction("100", 137);
    assert!(setup.service.validate_transaction(&tx).await);

    setup
        .chain
        .set_ai_agent_authorization(test_accounts().agent, false)
        .await
        .unwrap();
    assert_eq!(
        setup.service.initiate_bridge_transaction(&tx).await.unwrap_err(),
        BridgeError::SubmissionFailed("Not authorized AI agent".to_string())
    );
    assert!(!setup.service.validate_transaction(&tx).await);
}

#[tokio::test]
async fn test_owner_only_administration() {
    let setup = simulated_setup().await;
    let accounts = test_accounts();
    let agent_handle = setup.chain.connect(accounts.agent);

    let err = agent_handle
        .set_ai_agent_authorization(accounts.user, true)
        .await
        .unwrap_err();
    assert!(err.is_revert());
    assert!(!setup.chain.is_authorized(accounts.user).await);

    let err = setup
        .chain
        .update_bridge_interface(EthAddress::zero())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "execution reverted: Invalid interface address");

    // After moving the interface, the old one can no longer settle requests
    let submission = setup
        .service
        .submit_bridge_transaction(&usdc_transaction("1", 80002))
        .await
        .unwrap();
    let new_interface = EthAddress::repeat_byte(0x0e);
    setup
        .chain
        .update_bridge_interface(new_interface)
        .await
        .unwrap();
    assert!(setup
        .chain
        .connect(accounts.bridge_interface)
        .complete_bridge_transaction(submission.request_hash)
        .await
        .is_err());
    setup
        .chain
        .connect(new_interface)
        .complete_bridge_transaction(submission.request_hash)
        .await
        .unwrap();
    assert!(setup
        .service
        .is_transaction_processed(submission.request_hash)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_unknown_request_reads_unprocessed() {
    let setup = simulated_setup().await;
    assert!(!setup
        .service
        .is_transaction_processed(RequestHash::from([0x5a; 32]))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_background_settlement_is_observed() {
    init_for_testing();
    let setup = Arc::new(simulated_setup().await);

    let submitter = {
        let setup = setup.clone();
        tokio::spawn(async move {
            setup
                .service
                .submit_bridge_transaction(&usdc_transaction("42", 1))
                .await
        })
    };
    let request_hash = poll_until(
        Phase::Submission,
        "bridge request event",
        PollConfig::fast(),
        || {
            let chain = setup.chain.clone();
            async move {
                Ok(chain.events().await.iter().find_map(|e| match e {
                    RegistryEvent::BridgeRequestInitiated { request_hash, .. } => {
                        Some(*request_hash)
                    }
                    _ => None,
                }))
            }
        },
    )
    .await
    .unwrap();
    let submission = submitter.await.unwrap().unwrap();
    assert_eq!(submission.request_hash, request_hash);

    let settler = {
        let setup = setup.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            setup.settle(request_hash).await;
        })
    };
    poll_until(
        Phase::Settlement,
        "request processed",
        PollConfig::fast(),
        || {
            let service = setup.service.clone();
            async move {
                let processed = service.is_transaction_processed(request_hash).await?;
                Ok(processed.then_some(()))
            }
        },
    )
    .await
    .unwrap();
    settler.await.unwrap();

    // Processed never reverts to unprocessed
    for _ in 0..3 {
        assert!(setup
            .service
            .is_transaction_processed(request_hash)
            .await
            .unwrap());
    }
}
