//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use rand_core::{CryptoRng, RngCore};
use zkproofs::{prove, verify, Knowledge, Transcript};

use crate::attributes::Attribute;
use crate::config::CredentialConfig;
use crate::credentials::{Credential, CredentialPresentation, IssuerParameters};
use crate::errors::CredentialError;
use crate::messages::{
    commit_request, commit_response, IssuanceRequest, RegistrationRequest, RegistrationResponse,
};
use crate::proof_system;

type RealRequestParts = (Vec<CredentialPresentation>, Vec<IssuanceRequest>, Vec<Knowledge>);

/// What is needed to check the issuer's response to the last built request.
struct PendingValidation {
    presented: Vec<Credential>,
    requested: Vec<Attribute>,
}

/// The client's side of the registration protocol.
///
/// Amounts and credentials are queued with [`request_credential_for`] and
/// [`present_credentials`], turned into a request by [`build`], and exchanged for new credentials
/// by [`handle_response`]. The set of held credentials only changes in `handle_response`, and
/// only after the issuer's proofs verify.
///
/// A client is meant to drive one registration at a time and is not `Sync`-shared.
///
/// [`request_credential_for`]: CredentialClient::request_credential_for
/// [`present_credentials`]: CredentialClient::present_credentials
/// [`build`]: CredentialClient::build
/// [`handle_response`]: CredentialClient::handle_response
pub struct CredentialClient<R> {
    parameters: IssuerParameters,
    config: CredentialConfig,
    rng: R,
    credentials: Vec<Credential>,
    requested_amounts: Vec<u64>,
    to_present: Vec<Credential>,
    pending: Option<PendingValidation>,
}

impl<R: RngCore + CryptoRng> CredentialClient<R> {
    pub fn new(parameters: IssuerParameters, config: CredentialConfig, rng: R) -> Self {
        Self {
            parameters,
            config,
            rng,
            credentials: Vec::new(),
            requested_amounts: Vec::new(),
            to_present: Vec::new(),
            pending: None,
        }
    }

    /// The credentials currently held.
    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    /// The total amount of the held credentials.
    pub fn balance(&self) -> u64 {
        self.credentials.iter().map(Credential::amount).sum()
    }

    pub fn request_credential_for(&mut self, amount: i64) -> Result<(), CredentialError> {
        let amount = u64::try_from(amount).map_err(|_| CredentialError::AmountOutOfRange)?;
        if !self.config.is_amount_in_range(amount) {
            return Err(CredentialError::AmountOutOfRange);
        }
        if self.requested_amounts.len() >= self.config.number_of_credentials() {
            return Err(CredentialError::InvalidNumberOfRequestedCredentials);
        }
        self.requested_amounts.push(amount);
        Ok(())
    }

    /// Queues held credentials to be presented in the next request.
    ///
    /// Credentials that are already queued are skipped. Either all credentials are queued or,
    /// on error, none are.
    pub fn present_credentials(&mut self, credentials: &[Credential]) -> Result<(), CredentialError> {
        let mut queued = self.to_present.clone();
        for credential in credentials {
            if !self.credentials.contains(credential) {
                return Err(CredentialError::UnknownCredential);
            }
            if !queued.contains(credential) {
                queued.push(credential.clone());
            }
        }
        if queued.len() > self.config.number_of_credentials() {
            return Err(CredentialError::InvalidNumberOfPresentedCredentials);
        }
        self.to_present = queued;
        Ok(())
    }

    /// Queues a null request: zero-value credentials only, nothing presented.
    pub fn create_request_for_zero_amount(&mut self) -> Result<(), CredentialError> {
        if !self.to_present.is_empty() {
            return Err(CredentialError::InvalidNumberOfPresentedCredentials);
        }
        if !self.requested_amounts.is_empty() {
            return Err(CredentialError::InvalidNumberOfRequestedCredentials);
        }
        self.requested_amounts = vec![0; self.config.number_of_credentials()];
        Ok(())
    }

    /// Builds a request from the queued amounts and credentials.
    ///
    /// Requested amounts are padded with zeros. Unless this is a null request, presentations are
    /// padded with held zero-value credentials. On success the queues are emptied and the request
    /// awaits [`handle_response`](Self::handle_response).
    pub fn build(&mut self, transcript: &mut Transcript) -> Result<RegistrationRequest, CredentialError> {
        let n = self.config.number_of_credentials();
        let mut amounts = self.requested_amounts.clone();
        amounts.resize(n, 0);

        let is_null = self.to_present.is_empty() && amounts.iter().all(|amount| *amount == 0);
        let mut presented = self.to_present.clone();
        if !is_null {
            let zeros = self
                .credentials
                .iter()
                .filter(|c| c.amount() == 0 && !presented.contains(c))
                .take(n - presented.len())
                .cloned()
                .collect::<Vec<_>>();
            presented.extend(zeros);
            if presented.len() < n {
                return Err(CredentialError::NotEnoughZeroCredentialsToFillRequest);
            }
        }

        let requested_sum: i128 = amounts.iter().map(|a| i128::from(*a)).sum();
        let presented_sum: i128 = presented.iter().map(|c| i128::from(c.amount())).sum();
        let delta = i64::try_from(requested_sum - presented_sum)
            .ok()
            .filter(|delta| self.config.is_amount_in_range(delta.unsigned_abs()))
            .ok_or(CredentialError::AmountOutOfRange)?;

        let requested: Vec<Attribute> = amounts
            .iter()
            .map(|amount| Attribute::new(*amount, &mut self.rng))
            .collect();

        let mut transcript_copy = transcript.clone();
        commit_request(&mut transcript_copy, n, is_null, delta);

        let (presentations, issuance_requests, knowledge) = if is_null {
            let issuance_requests = requested
                .iter()
                .map(|attribute| IssuanceRequest {
                    ma: attribute.commitment(),
                    bit_commitments: vec![],
                })
                .collect();
            let knowledge = requested
                .iter()
                .map(proof_system::zero_proof_knowledge)
                .collect();
            (vec![], issuance_requests, knowledge)
        } else {
            self.real_request_knowledge(delta, &presented, &requested)?
        };

        let proofs = prove(&mut transcript_copy, &knowledge, &mut self.rng)
            .map_err(|_| CredentialError::ProofCreationFailed)?;

        *transcript = transcript_copy;
        self.requested_amounts.clear();
        self.to_present.clear();
        self.pending = Some(PendingValidation {
            presented,
            requested,
        });
        log::debug!("built registration request with delta {delta} (null: {is_null})");

        Ok(RegistrationRequest {
            delta,
            presented: presentations,
            requested: issuance_requests,
            proofs,
        })
    }

    fn real_request_knowledge(
        &mut self,
        delta: i64,
        presented: &[Credential],
        requested: &[Attribute],
    ) -> Result<RealRequestParts, CredentialError> {
        let width = self.config.range_proof_width();
        let presentations: Vec<_> = presented
            .iter()
            .map(|credential| {
                let (presentation, z) = credential.present(&mut self.rng);
                (presentation, z, credential.clone())
            })
            .collect();

        let mut knowledge: Vec<Knowledge> = presentations
            .iter()
            .map(|(presentation, z, credential)| {
                proof_system::show_credential_knowledge(presentation, *z, credential, &self.parameters)
            })
            .collect();

        let mut issuance_requests = Vec::with_capacity(requested.len());
        for attribute in requested {
            let (bit_commitments, range_knowledge) =
                proof_system::range_proof_knowledge(attribute, width, &mut self.rng)?;
            issuance_requests.push(IssuanceRequest {
                ma: attribute.commitment(),
                bit_commitments,
            });
            knowledge.push(range_knowledge);
        }

        knowledge.push(proof_system::balance_knowledge(delta, &presentations, requested));
        let presentations = presentations
            .into_iter()
            .map(|(presentation, _, _)| presentation)
            .collect();
        Ok((presentations, issuance_requests, knowledge))
    }

    /// Checks the issuer's response and takes ownership of the new credentials.
    ///
    /// `transcript` must be the one passed to [`build`](Self::build). On any error the held
    /// credentials, the pending request and the transcript are left as they were.
    pub fn handle_response(
        &mut self,
        response: &RegistrationResponse,
        transcript: &mut Transcript,
    ) -> Result<Vec<Credential>, CredentialError> {
        let pending = self.pending.as_ref().ok_or(CredentialError::NoPendingRequest)?;
        if response.issued_macs.len() != pending.requested.len() {
            return Err(CredentialError::IssuedCredentialNumberMismatch);
        }

        let mut transcript_copy = transcript.clone();
        commit_response(&mut transcript_copy, &response.issued_macs);
        let instances: Vec<_> = response
            .issued_macs
            .iter()
            .zip(&pending.requested)
            .map(|(mac, attribute)| {
                proof_system::issuer_parameters_instance(&self.parameters, mac, attribute.commitment())
            })
            .collect();
        if let Err(e) = verify(&mut transcript_copy, &instances, &response.proofs) {
            log::warn!("issuer response failed to verify: {e}");
            return Err(CredentialError::ClientReceivedInvalidProofs);
        }

        let issued: Vec<Credential> = response
            .issued_macs
            .iter()
            .zip(&pending.requested)
            .map(|(mac, attribute)| Credential::new(attribute, *mac))
            .collect();

        *transcript = transcript_copy;
        self.credentials
            .retain(|credential| !pending.presented.contains(credential));
        self.credentials.extend(issued.iter().cloned());
        self.pending = None;
        log::debug!(
            "received {} credentials, now holding {}",
            issued.len(),
            self.credentials.len()
        );
        Ok(issued)
    }
}
