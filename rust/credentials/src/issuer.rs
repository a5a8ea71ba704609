//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::traits::IsIdentity;
use rand_core::{CryptoRng, RngCore};
use zkproofs::{prove, verify, Instance, Transcript};

use crate::config::CredentialConfig;
use crate::credentials::{IssuerParameters, IssuerSecretKey, Mac};
use crate::errors::CredentialError;
use crate::messages::{commit_request, commit_response, RegistrationRequest, RegistrationResponse};
use crate::proof_system;

#[derive(Default)]
struct IssuerState {
    used_serial_numbers: HashSet<CompressedRistretto>,
    balance: i64,
}

/// The coordinator's side of the registration protocol.
///
/// Requests may be handled concurrently from many threads. Verification and issuance run without
/// holding any lock; only the final check-and-record of serial numbers and balance is serialized.
pub struct CredentialIssuer {
    key: IssuerSecretKey,
    parameters: IssuerParameters,
    config: CredentialConfig,
    state: Mutex<IssuerState>,
}

impl CredentialIssuer {
    pub fn new(key: IssuerSecretKey, config: CredentialConfig) -> Self {
        let parameters = key.parameters();
        Self {
            key,
            parameters,
            config,
            state: Mutex::default(),
        }
    }

    pub fn parameters(&self) -> &IssuerParameters {
        &self.parameters
    }

    pub fn config(&self) -> &CredentialConfig {
        &self.config
    }

    /// The sum of all accepted deltas.
    pub fn balance(&self) -> i64 {
        self.lock_state().balance
    }

    pub fn is_serial_number_used(&self, serial_number: &CompressedRistretto) -> bool {
        self.lock_state()
            .used_serial_numbers
            .contains(serial_number)
    }

    fn lock_state(&self) -> MutexGuard<'_, IssuerState> {
        self.state.lock().expect("not poisoned")
    }

    /// Verifies a request and issues the requested credentials.
    ///
    /// Nothing is recorded unless the request is accepted: a rejected request leaves the set of
    /// used serial numbers, the balance and `transcript` untouched.
    pub fn handle_request<R: RngCore + CryptoRng>(
        &self,
        request: &RegistrationRequest,
        transcript: &mut Transcript,
        rng: &mut R,
    ) -> Result<RegistrationResponse, CredentialError> {
        let mut transcript_copy = transcript.clone();
        let result = self.handle_request_impl(request, &mut transcript_copy, rng);
        match &result {
            Ok(_) => log::info!(
                "accepted registration request: delta {}, {} presented, {} requested",
                request.delta,
                request.presented.len(),
                request.requested.len(),
            ),
            Err(e) => log::warn!("rejected registration request: {e}"),
        }
        if result.is_ok() {
            *transcript = transcript_copy;
        }
        result
    }

    fn handle_request_impl<R: RngCore + CryptoRng>(
        &self,
        request: &RegistrationRequest,
        transcript: &mut Transcript,
        rng: &mut R,
    ) -> Result<RegistrationResponse, CredentialError> {
        let n = self.config.number_of_credentials();
        let is_null = request.is_null_request();

        if request.requested.len() != n {
            return Err(CredentialError::InvalidNumberOfRequestedCredentials);
        }
        if is_null {
            if request.delta != 0 {
                return Err(CredentialError::InvalidNumberOfPresentedCredentials);
            }
        } else if request.presented.len() != n {
            return Err(CredentialError::InvalidNumberOfPresentedCredentials);
        }
        if !self.config.is_amount_in_range(request.delta.unsigned_abs()) {
            return Err(CredentialError::AmountOutOfRange);
        }

        let width = self.config.range_proof_width() as usize;
        for issuance in &request.requested {
            let expected_bits = if is_null { 0 } else { width };
            if issuance.bit_commitments.len() != expected_bits
                || issuance.bit_commitments.iter().any(|b| b.is_identity())
            {
                return Err(CredentialError::InvalidBitCommitment);
            }
        }

        commit_request(transcript, n, is_null, request.delta);
        let instances: Vec<Instance> = if is_null {
            request
                .requested
                .iter()
                .map(|issuance| proof_system::zero_proof_instance(issuance.ma))
                .collect()
        } else {
            let show = request.presented.iter().map(|presentation| {
                proof_system::show_credential_instance(
                    presentation,
                    presentation.compute_Z(&self.key),
                    &self.parameters,
                )
            });
            let range = request.requested.iter().map(|issuance| {
                proof_system::range_proof_instance(issuance.ma, &issuance.bit_commitments)
            });
            let balance = proof_system::balance_instance(
                request.delta,
                &request.presented,
                request.requested.iter().map(|issuance| &issuance.ma),
            );
            show.chain(range).chain([balance]).collect()
        };
        verify(transcript, &instances, &request.proofs)
            .map_err(|_| CredentialError::CoordinatorReceivedInvalidProofs)?;

        let issued_macs: Vec<Mac> = request
            .requested
            .iter()
            .map(|issuance| self.key.mac(issuance.ma, &mut *rng))
            .collect();
        commit_response(transcript, &issued_macs);
        let knowledge: Vec<_> = issued_macs
            .iter()
            .zip(&request.requested)
            .map(|(mac, issuance)| {
                proof_system::issuer_parameters_knowledge(&self.key, mac, issuance.ma)
            })
            .collect();
        let proofs = prove(transcript, &knowledge, rng)
            .map_err(|_| CredentialError::ProofCreationFailed)?;

        let serial_numbers: Vec<CompressedRistretto> = request
            .presented
            .iter()
            .map(|presentation| presentation.S.compress())
            .collect();
        {
            let mut state = self.lock_state();
            let mut seen = HashSet::with_capacity(serial_numbers.len());
            for serial_number in &serial_numbers {
                if !seen.insert(*serial_number) || state.used_serial_numbers.contains(serial_number)
                {
                    return Err(CredentialError::SerialNumberAlreadyUsed);
                }
            }
            let balance = state
                .balance
                .checked_add(request.delta)
                .filter(|balance| *balance >= 0)
                .ok_or(CredentialError::NegativeBalance)?;

            state.used_serial_numbers.extend(serial_numbers);
            state.balance = balance;
        }

        Ok(RegistrationResponse { issued_macs, proofs })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use curve25519_dalek::ristretto::RistrettoPoint;
    use curve25519_dalek::scalar::Scalar;
    use curve25519_dalek::traits::Identity;
    use rand::rngs::OsRng;

    use super::*;
    use crate::attributes::Attribute;
    use crate::client::CredentialClient;
    use crate::generators::Generators;
    use crate::messages::IssuanceRequest;

    fn issuer() -> CredentialIssuer {
        CredentialIssuer::new(
            IssuerSecretKey::generate(&mut OsRng),
            CredentialConfig::default(),
        )
    }

    fn null_request(n: usize) -> RegistrationRequest {
        let attributes: Vec<_> = (0..n).map(|_| Attribute::new(0, &mut OsRng)).collect();
        let mut transcript = Transcript::new(b"test");
        commit_request(&mut transcript, n, true, 0);
        let knowledge: Vec<_> = attributes
            .iter()
            .map(proof_system::zero_proof_knowledge)
            .collect();
        RegistrationRequest {
            delta: 0,
            presented: vec![],
            requested: attributes
                .iter()
                .map(|a| IssuanceRequest {
                    ma: a.commitment(),
                    bit_commitments: vec![],
                })
                .collect(),
            proofs: prove(&mut transcript, &knowledge, &mut OsRng).unwrap(),
        }
    }

    #[test]
    fn accepts_null_request() {
        let issuer = issuer();
        let response = issuer
            .handle_request(&null_request(2), &mut Transcript::new(b"test"), &mut OsRng)
            .unwrap();
        assert_eq!(response.issued_macs.len(), 2);
        assert_eq!(response.proofs.len(), 2);
        assert_eq!(issuer.balance(), 0);
    }

    #[test]
    fn null_request_with_wrong_arity() {
        let issuer = issuer();
        assert_matches!(
            issuer.handle_request(&null_request(3), &mut Transcript::new(b"test"), &mut OsRng),
            Err(CredentialError::InvalidNumberOfRequestedCredentials)
        );
    }

    #[test]
    fn null_request_with_nonzero_delta() {
        let issuer = issuer();
        let mut request = null_request(2);
        request.delta = 5;
        assert_matches!(
            issuer.handle_request(&request, &mut Transcript::new(b"test"), &mut OsRng),
            Err(CredentialError::InvalidNumberOfPresentedCredentials)
        );
    }

    #[test]
    fn null_request_with_bit_commitments() {
        let issuer = issuer();
        let mut request = null_request(2);
        request.requested[0].bit_commitments = vec![RistrettoPoint::random(&mut OsRng)];
        assert_matches!(
            issuer.handle_request(&request, &mut Transcript::new(b"test"), &mut OsRng),
            Err(CredentialError::InvalidBitCommitment)
        );
    }

    #[test]
    fn identity_bit_commitment_is_rejected_before_proofs() {
        let issuer = issuer();
        let width = issuer.config().range_proof_width() as usize;
        let mut request = null_request(2);
        request.presented = vec![
            crate::credentials::CredentialPresentation {
                Ca: RistrettoPoint::identity(),
                Cx0: RistrettoPoint::identity(),
                Cx1: RistrettoPoint::identity(),
                CV: RistrettoPoint::identity(),
                S: RistrettoPoint::identity(),
            };
            2
        ];
        for issuance in &mut request.requested {
            issuance.bit_commitments = vec![RistrettoPoint::random(&mut OsRng); width];
        }
        request.requested[1].bit_commitments[7] = RistrettoPoint::identity();
        assert_matches!(
            issuer.handle_request(&request, &mut Transcript::new(b"test"), &mut OsRng),
            Err(CredentialError::InvalidBitCommitment)
        );
    }

    #[test]
    fn rejected_request_leaves_transcript_untouched() {
        let issuer = issuer();
        let mut request = null_request(2);
        request.proofs.swap(0, 1);

        let mut transcript = Transcript::new(b"test");
        let mut untouched = transcript.clone();
        assert_matches!(
            issuer.handle_request(&request, &mut transcript, &mut OsRng),
            Err(CredentialError::CoordinatorReceivedInvalidProofs)
        );
        let (mut actual, mut expected) = ([0u8; 32], [0u8; 32]);
        transcript.challenge_bytes(b"check", &mut actual);
        untouched.challenge_bytes(b"check", &mut expected);
        assert_eq!(actual, expected);
    }

    #[test]
    fn commitment_to_negative_amount_cannot_mint() {
        let issuer = issuer();
        let mut client = CredentialClient::new(*issuer.parameters(), *issuer.config(), OsRng);
        let mut transcript = Transcript::new(b"test");
        let request = client.build(&mut transcript).unwrap();
        let response = issuer
            .handle_request(&request, &mut Transcript::new(b"test"), &mut OsRng)
            .unwrap();
        client.handle_response(&response, &mut transcript).unwrap();
        let zeros = client.credentials().to_vec();

        client.request_credential_for(11).unwrap();
        let mut request = client.build(&mut Transcript::new(b"test")).unwrap();
        assert_eq!(request.delta, 11);

        // Swap the zero-value request for a commitment to -1 whose bit commitments claim zero
        // bits, and declare one unit less.
        let g = Generators::get();
        let width = issuer.config().range_proof_width() as usize;
        let mut bit_commitments = Vec::with_capacity(width);
        for i in 0..width {
            let s = Scalar::random(&mut OsRng);
            bit_commitments.push(if i == 0 { -g.G_g + s * g.G_h } else { s * g.G_h });
        }
        request.requested[1] = IssuanceRequest {
            ma: -g.G_g + Scalar::random(&mut OsRng) * g.G_h,
            bit_commitments,
        };
        request.delta = 10;

        assert_matches!(
            issuer.handle_request(&request, &mut Transcript::new(b"test"), &mut OsRng),
            Err(CredentialError::CoordinatorReceivedInvalidProofs)
        );
        assert_eq!(issuer.balance(), 0);
        for credential in &zeros {
            assert!(!issuer.is_serial_number_used(&credential.serial_number()));
        }
    }

    #[test]
    fn tampered_proofs_are_rejected() {
        let issuer = issuer();
        let mut request = null_request(2);
        request.proofs.swap(0, 1);
        assert_matches!(
            issuer.handle_request(&request, &mut Transcript::new(b"test"), &mut OsRng),
            Err(CredentialError::CoordinatorReceivedInvalidProofs)
        );

        let mut request = null_request(2);
        request.proofs.pop();
        assert_matches!(
            issuer.handle_request(&request, &mut Transcript::new(b"test"), &mut OsRng),
            Err(CredentialError::CoordinatorReceivedInvalidProofs)
        );
    }

    #[test]
    fn delta_out_of_range() {
        let issuer = issuer();
        let mut request = null_request(2);
        request.presented = vec![request_presentation(); 2];
        request.delta = i64::MIN;
        assert_matches!(
            issuer.handle_request(&request, &mut Transcript::new(b"test"), &mut OsRng),
            Err(CredentialError::AmountOutOfRange)
        );
    }

    fn request_presentation() -> crate::credentials::CredentialPresentation {
        let p = RistrettoPoint::random(&mut OsRng);
        crate::credentials::CredentialPresentation {
            Ca: p,
            Cx0: p,
            Cx1: p,
            CV: p,
            S: p,
        }
    }
}
