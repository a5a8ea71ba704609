//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::sync::Arc;

use assert_matches::assert_matches;
use rand::rngs::OsRng;
use wabisabi_credentials::{
    CredentialClient, CredentialConfig, CredentialError, CredentialIssuer, IssuerSecretKey,
    RegistrationRequest, RegistrationResponse, Transcript,
};

const LABEL: &[u8] = b"registration-test";

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn setup(config: CredentialConfig) -> (CredentialIssuer, CredentialClient<OsRng>) {
    init_logger();
    let issuer = CredentialIssuer::new(IssuerSecretKey::generate(&mut OsRng), config);
    let client = CredentialClient::new(*issuer.parameters(), config, OsRng);
    (issuer, client)
}

/// Builds, sends and handles one request, returning the request for inspection.
fn round_trip(
    issuer: &CredentialIssuer,
    client: &mut CredentialClient<OsRng>,
) -> Result<RegistrationRequest, CredentialError> {
    let mut client_transcript = Transcript::new(LABEL);
    let request = client.build(&mut client_transcript)?;
    let response = issuer.handle_request(&request, &mut Transcript::new(LABEL), &mut OsRng)?;
    client.handle_response(&response, &mut client_transcript)?;
    Ok(request)
}

fn held_amounts(client: &CredentialClient<OsRng>) -> Vec<u64> {
    let mut amounts: Vec<u64> = client.credentials().iter().map(|c| c.amount()).collect();
    amounts.sort_unstable();
    amounts
}

#[test]
fn end_to_end_scenario() {
    let (issuer, mut client) = setup(CredentialConfig::default());

    client.create_request_for_zero_amount().unwrap();
    let request = round_trip(&issuer, &mut client).unwrap();
    assert!(request.is_null_request());
    assert_eq!(held_amounts(&client), vec![0, 0]);

    client.request_credential_for(1).unwrap();
    client.request_credential_for(9).unwrap();
    let request = round_trip(&issuer, &mut client).unwrap();
    assert_eq!(request.delta, 10);
    assert_eq!(request.presented.len(), 2);
    assert_eq!(held_amounts(&client), vec![1, 9]);
    assert_eq!(issuer.balance(), 10);

    let held = client.credentials().to_vec();
    client.present_credentials(&held).unwrap();
    client.request_credential_for(1).unwrap();
    client.request_credential_for(8).unwrap();
    let request = round_trip(&issuer, &mut client).unwrap();
    assert_eq!(request.delta, -1);
    assert_eq!(held_amounts(&client), vec![1, 8]);
    assert_eq!(client.balance(), 9);
    assert_eq!(issuer.balance(), 9);

    for credential in &held {
        assert!(issuer.is_serial_number_used(&credential.serial_number()));
    }
}

#[test]
fn completeness_with_three_credentials() {
    let config = CredentialConfig::new(3, 32, u32::MAX.into()).unwrap();
    let (issuer, mut client) = setup(config);
    round_trip(&issuer, &mut client).unwrap();

    for amounts in [[5i64, 0, 7], [12, 0, 0], [3, 4, 5]] {
        let before = client.balance();
        let held = client
            .credentials()
            .iter()
            .filter(|c| c.amount() > 0)
            .cloned()
            .collect::<Vec<_>>();
        client.present_credentials(&held).unwrap();
        for amount in amounts {
            client.request_credential_for(amount).unwrap();
        }
        let request = round_trip(&issuer, &mut client).unwrap();
        let requested: i64 = amounts.iter().sum();
        assert_eq!(request.delta, requested - before as i64);
        assert_eq!(client.balance(), requested as u64);
        assert_eq!(client.credentials().len(), 3);
    }
}

#[test]
fn double_spend_is_rejected() {
    let (issuer, mut client) = setup(CredentialConfig::default());
    round_trip(&issuer, &mut client).unwrap();
    client.request_credential_for(4).unwrap();
    round_trip(&issuer, &mut client).unwrap();

    let held = client.credentials().to_vec();
    client.present_credentials(&held).unwrap();
    let mut transcript = Transcript::new(LABEL);
    let request = client.build(&mut transcript).unwrap();
    issuer
        .handle_request(&request, &mut Transcript::new(LABEL), &mut OsRng)
        .unwrap();

    // Replaying the same request presents the same serial numbers.
    assert_matches!(
        issuer.handle_request(&request, &mut Transcript::new(LABEL), &mut OsRng),
        Err(CredentialError::SerialNumberAlreadyUsed)
    );
}

#[test]
fn concurrent_double_spend_has_one_winner() {
    let (issuer, mut client) = setup(CredentialConfig::default());
    round_trip(&issuer, &mut client).unwrap();

    // Present the same zero credentials from two independently built requests.
    let held = client.credentials().to_vec();
    let requests: Vec<RegistrationRequest> = (0..2)
        .map(|_| {
            client.present_credentials(&held).unwrap();
            client.request_credential_for(0).unwrap();
            client.build(&mut Transcript::new(LABEL)).unwrap()
        })
        .collect();
    assert_ne!(requests[0].presented, requests[1].presented);

    let issuer = Arc::new(issuer);
    let results: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let issuer = Arc::clone(&issuer);
            std::thread::spawn(move || {
                issuer.handle_request(&request, &mut Transcript::new(LABEL), &mut OsRng)
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(CredentialError::SerialNumberAlreadyUsed))));
}

#[test]
fn null_requests_give_distinct_credentials() {
    let (issuer, mut alice) = setup(CredentialConfig::default());
    let mut bob = CredentialClient::new(*issuer.parameters(), *issuer.config(), OsRng);
    round_trip(&issuer, &mut alice).unwrap();
    round_trip(&issuer, &mut bob).unwrap();

    assert_eq!(alice.credentials().len(), 2);
    assert_eq!(bob.credentials().len(), 2);
    for a in alice.credentials() {
        assert_eq!(a.amount(), 0);
        for b in bob.credentials() {
            assert_ne!(a, b);
            assert_ne!(a.serial_number(), b.serial_number());
        }
    }
    assert_ne!(alice.credentials()[0], alice.credentials()[1]);
}

#[test]
fn arity_is_enforced() {
    let (issuer, mut client) = setup(CredentialConfig::default());
    round_trip(&issuer, &mut client).unwrap();
    client.request_credential_for(3).unwrap();
    let request = client.build(&mut Transcript::new(LABEL)).unwrap();

    let mut fewer_presented = request.clone();
    fewer_presented.presented.pop();
    assert_matches!(
        issuer.handle_request(&fewer_presented, &mut Transcript::new(LABEL), &mut OsRng),
        Err(CredentialError::InvalidNumberOfPresentedCredentials)
    );

    let mut more_requested = request.clone();
    more_requested.requested.push(request.requested[0].clone());
    assert_matches!(
        issuer.handle_request(&more_requested, &mut Transcript::new(LABEL), &mut OsRng),
        Err(CredentialError::InvalidNumberOfRequestedCredentials)
    );

    let mut short_range_proof = request.clone();
    short_range_proof.requested[1].bit_commitments.pop();
    assert_matches!(
        issuer.handle_request(&short_range_proof, &mut Transcript::new(LABEL), &mut OsRng),
        Err(CredentialError::InvalidBitCommitment)
    );

    // None of the rejections consumed the serial numbers.
    issuer
        .handle_request(&request, &mut Transcript::new(LABEL), &mut OsRng)
        .unwrap();
}

#[test]
fn lying_about_delta_is_rejected() {
    let (issuer, mut client) = setup(CredentialConfig::default());
    round_trip(&issuer, &mut client).unwrap();
    client.request_credential_for(3).unwrap();
    let mut request = client.build(&mut Transcript::new(LABEL)).unwrap();
    request.delta = 2;
    assert_matches!(
        issuer.handle_request(&request, &mut Transcript::new(LABEL), &mut OsRng),
        Err(CredentialError::CoordinatorReceivedInvalidProofs)
    );
    assert_eq!(issuer.balance(), 0);
}

#[test]
fn negative_balance_is_rejected() {
    let key = IssuerSecretKey::generate(&mut OsRng);
    let config = CredentialConfig::default();
    let depositing = CredentialIssuer::new(key.clone(), config);
    // Same key, but it never saw the deposit.
    let spending = CredentialIssuer::new(key, config);

    let mut client = CredentialClient::new(*depositing.parameters(), config, OsRng);
    round_trip(&depositing, &mut client).unwrap();
    client.request_credential_for(3).unwrap();
    round_trip(&depositing, &mut client).unwrap();

    let held = client.credentials().to_vec();
    client.present_credentials(&held).unwrap();
    let request = client.build(&mut Transcript::new(LABEL)).unwrap();
    assert_eq!(request.delta, -3);

    assert_matches!(
        spending.handle_request(&request, &mut Transcript::new(LABEL), &mut OsRng),
        Err(CredentialError::NegativeBalance)
    );
    assert_eq!(spending.balance(), 0);
    for credential in &held {
        assert!(!spending.is_serial_number_used(&credential.serial_number()));
    }

    depositing
        .handle_request(&request, &mut Transcript::new(LABEL), &mut OsRng)
        .unwrap();
    assert_eq!(depositing.balance(), 0);
}

#[test]
fn credentials_from_another_issuer_are_rejected() {
    let (issuer, mut client) = setup(CredentialConfig::default());
    round_trip(&issuer, &mut client).unwrap();
    let other = CredentialIssuer::new(IssuerSecretKey::generate(&mut OsRng), *issuer.config());

    client.request_credential_for(1).unwrap();
    let request = client.build(&mut Transcript::new(LABEL)).unwrap();
    assert_matches!(
        other.handle_request(&request, &mut Transcript::new(LABEL), &mut OsRng),
        Err(CredentialError::CoordinatorReceivedInvalidProofs)
    );
}

#[test]
fn out_of_range_amounts_fail_closed() {
    let config = CredentialConfig::new(2, 8, 255).unwrap();
    let (issuer, mut client) = setup(config);
    round_trip(&issuer, &mut client).unwrap();

    assert_matches!(
        client.request_credential_for(256),
        Err(CredentialError::AmountOutOfRange)
    );
    assert_matches!(
        client.request_credential_for(-1),
        Err(CredentialError::AmountOutOfRange)
    );
    client.request_credential_for(255).unwrap();
    round_trip(&issuer, &mut client).unwrap();
    assert_eq!(client.balance(), 255);
}

#[test]
fn bad_response_leaves_client_unchanged() {
    let (issuer, mut client) = setup(CredentialConfig::default());
    round_trip(&issuer, &mut client).unwrap();
    let before = client.credentials().to_vec();

    client.request_credential_for(6).unwrap();
    let mut transcript = Transcript::new(LABEL);
    let request = client.build(&mut transcript).unwrap();
    let response = issuer
        .handle_request(&request, &mut Transcript::new(LABEL), &mut OsRng)
        .unwrap();

    let mut missing = response.clone();
    missing.issued_macs.pop();
    assert_matches!(
        client.handle_response(&missing, &mut transcript),
        Err(CredentialError::IssuedCredentialNumberMismatch)
    );

    let mut swapped = response.clone();
    swapped.issued_macs.swap(0, 1);
    assert_matches!(
        client.handle_response(&swapped, &mut transcript),
        Err(CredentialError::ClientReceivedInvalidProofs)
    );

    let mut reordered = response.clone();
    reordered.proofs.reverse();
    assert_matches!(
        client.handle_response(&reordered, &mut transcript),
        Err(CredentialError::ClientReceivedInvalidProofs)
    );
    assert_eq!(client.credentials(), &before[..]);

    // The original response still applies.
    let issued = client.handle_response(&response, &mut transcript).unwrap();
    assert_eq!(issued.len(), 2);
    assert_eq!(client.balance(), 6);
}

#[test]
fn presenting_unknown_credentials() {
    let (issuer, mut alice) = setup(CredentialConfig::default());
    let mut bob = CredentialClient::new(*issuer.parameters(), *issuer.config(), OsRng);
    round_trip(&issuer, &mut alice).unwrap();
    round_trip(&issuer, &mut bob).unwrap();

    assert_matches!(
        alice.present_credentials(&bob.credentials()[..1]),
        Err(CredentialError::UnknownCredential)
    );

    // Presenting twice is a no-op.
    let mine = alice.credentials()[..1].to_vec();
    alice.present_credentials(&mine).unwrap();
    alice.present_credentials(&mine).unwrap();
    let request = alice.build(&mut Transcript::new(LABEL)).unwrap();
    assert_eq!(request.presented.len(), 2);
    assert_ne!(request.presented[0].S, request.presented[1].S);
}

#[test]
fn wire_messages_survive_serialization() {
    let (issuer, mut client) = setup(CredentialConfig::default());
    round_trip(&issuer, &mut client).unwrap();
    client.request_credential_for(2).unwrap();

    let mut transcript = Transcript::new(LABEL);
    let request = client.build(&mut transcript).unwrap();
    let bytes = bincode::serialize(&request).unwrap();
    let request: RegistrationRequest = bincode::deserialize(&bytes).unwrap();

    let response = issuer
        .handle_request(&request, &mut Transcript::new(LABEL), &mut OsRng)
        .unwrap();
    let bytes = bincode::serialize(&response).unwrap();
    let response: RegistrationResponse = bincode::deserialize(&bytes).unwrap();

    client.handle_response(&response, &mut transcript).unwrap();
    assert_eq!(client.balance(), 2);
}

#[test]
fn transcripts_must_match() {
    let (issuer, mut client) = setup(CredentialConfig::default());
    let request = client.build(&mut Transcript::new(LABEL)).unwrap();
    assert_matches!(
        issuer.handle_request(&request, &mut Transcript::new(b"other round"), &mut OsRng),
        Err(CredentialError::CoordinatorReceivedInvalidProofs)
    );
}
